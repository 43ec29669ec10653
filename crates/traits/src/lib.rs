pub mod command;
pub mod resource;

pub use command::{Command, CommandError, Filter, Outcome, SharedCommand};
pub use resource::{InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData};
