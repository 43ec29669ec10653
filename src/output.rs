//! XML serialisation of template output.

use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use xchain_types::{Attributes, ContentHandler, QName, SaxError};

/// Writes output events as XML through a `quick_xml::Writer`.
///
/// Namespace declarations are emitted wherever an element or attribute uses
/// a namespace that is not bound in scope, so the output is
/// namespace-well-formed even when the producer never reports prefix
/// mappings. Attributes in a namespace but without a prefix get one
/// (`ns1`, `ns2`, ...).
pub struct XmlWriter<W: Write + Send> {
    writer: Writer<W>,
    /// Bindings declared on each open element.
    scopes: Vec<Vec<(String, String)>>,
    /// Mappings reported ahead of the next start tag.
    pending: Vec<(String, String)>,
    /// A start tag held back until we know whether the element is empty.
    open_tag: Option<BytesStart<'static>>,
    generated: usize,
}

impl<W: Write + Send> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: Writer::new(out),
            scopes: Vec::new(),
            pending: Vec::new(),
            open_tag: None,
            generated: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), SaxError> {
        self.writer
            .write_event(event)
            .map_err(|e| SaxError::Handler(e.to_string()))
    }

    fn flush_start(&mut self) -> Result<(), SaxError> {
        match self.open_tag.take() {
            Some(start) => self.emit(Event::Start(start)),
            None => Ok(()),
        }
    }

    /// The URI `prefix` is bound to, looking at `declared` before the open elements.
    fn lookup<'a>(&'a self, prefix: &str, declared: &'a [(String, String)]) -> Option<&'a str> {
        declared
            .iter()
            .rev()
            .chain(self.scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// A non-empty prefix currently bound to `uri`.
    fn visible_prefix(&self, uri: &str, declared: &[(String, String)]) -> Option<String> {
        declared
            .iter()
            .rev()
            .chain(self.scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
            .filter(|(p, u)| !p.is_empty() && u == uri)
            .map(|(p, _)| p)
            .find(|p| self.lookup(p, declared) == Some(uri))
            .cloned()
    }

    fn declare_element(&self, name: &QName, declared: &mut Vec<(String, String)>) {
        let prefix = name.prefix().unwrap_or("");
        let bound = self.lookup(prefix, declared).unwrap_or("") == name.namespace();
        if !bound {
            declared.push((prefix.to_string(), name.namespace().to_string()));
        }
    }

    /// The name an attribute is written under, declaring its namespace if needed.
    fn attribute_name(&mut self, name: &QName, declared: &mut Vec<(String, String)>) -> String {
        let uri = name.namespace();
        if uri.is_empty() {
            return name.local_name().to_string();
        }
        if let Some(prefix) = name.prefix() {
            if self.lookup(prefix, declared) == Some(uri) {
                return name.qualified_name();
            }
            if !declared.iter().any(|(p, _)| p == prefix) {
                declared.push((prefix.to_string(), uri.to_string()));
                return name.qualified_name();
            }
        }
        if let Some(prefix) = self.visible_prefix(uri, declared) {
            return format!("{}:{}", prefix, name.local_name());
        }
        let prefix = loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if self.lookup(&candidate, declared).is_none() {
                break candidate;
            }
        };
        let qualified = format!("{}:{}", prefix, name.local_name());
        declared.push((prefix, uri.to_string()));
        qualified
    }
}

impl<W: Write + Send> ContentHandler for XmlWriter<W> {
    fn start_document(&mut self) -> Result<(), SaxError> {
        self.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn end_document(&mut self) -> Result<(), SaxError> {
        self.flush_start()?;
        let out = self.writer.get_mut();
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|e| SaxError::Handler(e.to_string()))
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), SaxError> {
        self.pending.push((prefix.to_string(), uri.to_string()));
        Ok(())
    }

    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<(), SaxError> {
        self.flush_start()?;

        let mut declared = std::mem::take(&mut self.pending);
        self.declare_element(name, &mut declared);
        let mut written = Vec::with_capacity(attributes.len());
        for attribute in attributes.iter() {
            let value = escape_attribute(&attribute.value)?;
            written.push((self.attribute_name(&attribute.name, &mut declared), value));
        }

        let mut start = BytesStart::new(name.qualified_name());
        for (prefix, uri) in &declared {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", prefix)
            };
            let value = escape_attribute(uri)?;
            start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
        }
        for (key, value) in &written {
            start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
        }

        self.open_tag = Some(start);
        self.scopes.push(declared);
        Ok(())
    }

    fn end_element(&mut self, name: &QName) -> Result<(), SaxError> {
        if self.scopes.pop().is_none() {
            return Err(SaxError::Unbalanced {
                expected: "no open element".to_string(),
                found: name.qualified_name(),
            });
        }
        match self.open_tag.take() {
            Some(start) => self.emit(Event::Empty(start)),
            None => self.emit(Event::End(BytesEnd::new(name.qualified_name()))),
        }
    }

    fn characters(&mut self, text: &str) -> Result<(), SaxError> {
        self.flush_start()?;
        check_chars(text)?;
        let escaped = partial_escape(text).replace('\r', "&#13;");
        self.emit(Event::Text(BytesText::from_escaped(escaped)))
    }
}

/// XML 1.0 has no way to write the C0 controls other than tab, LF and CR.
fn check_chars(text: &str) -> Result<(), SaxError> {
    match text
        .chars()
        .find(|&c| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r'))
    {
        Some(c) => Err(SaxError::Handler(format!(
            "character U+{:04X} cannot be written in XML",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// Whitespace is written as character references so attribute value
/// normalisation does not turn it into spaces.
fn escape_attribute(value: &str) -> Result<String, SaxError> {
    check_chars(value)?;
    Ok(escape(value)
        .replace('\t', "&#9;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;"))
}
