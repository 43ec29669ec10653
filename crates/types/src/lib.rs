pub mod qname;
pub mod sax;

pub use qname::QName;
pub use sax::{Attribute, Attributes, ContentHandler, RecordingHandler, SaxError, SaxEvent};
