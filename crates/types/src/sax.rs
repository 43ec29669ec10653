//! The SAX-style output contract.
//!
//! Templates push events into a `ContentHandler` supplied by the caller.
//! The handler's lifecycle belongs to the caller; commands only call into it.

use crate::qname::QName;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaxError {
    #[error("Output handler failed: {0}")]
    Handler(String),

    #[error("Unbalanced output: expected end of '{expected}', got '{found}'")]
    Unbalanced { expected: String, found: String },

    #[error("No content handler installed")]
    NoHandler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// Ordered attribute list of a start-element event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, replacing an earlier one with the same name.
    pub fn add(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.items.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.items.push(Attribute { name, value }),
        }
    }

    pub fn get(&self, name: &QName) -> Option<&str> {
        self.items
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub trait ContentHandler: Send {
    fn start_document(&mut self) -> Result<(), SaxError> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), SaxError> {
        Ok(())
    }

    fn start_prefix_mapping(&mut self, _prefix: &str, _uri: &str) -> Result<(), SaxError> {
        Ok(())
    }

    fn end_prefix_mapping(&mut self, _prefix: &str) -> Result<(), SaxError> {
        Ok(())
    }

    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<(), SaxError>;

    fn end_element(&mut self, name: &QName) -> Result<(), SaxError>;

    fn characters(&mut self, text: &str) -> Result<(), SaxError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    StartDocument,
    EndDocument,
    StartElement(QName, Attributes),
    EndElement(QName),
    Characters(String),
}

/// A handler that records every event into a shared buffer. The buffer is
/// shared so the events can be read after the handler has been moved into a
/// context.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<SaxEvent>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SaxEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: SaxEvent) -> Result<(), SaxError> {
        self.events
            .lock()
            .map_err(|_| SaxError::Handler("event buffer lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

impl ContentHandler for RecordingHandler {
    fn start_document(&mut self) -> Result<(), SaxError> {
        self.push(SaxEvent::StartDocument)
    }

    fn end_document(&mut self) -> Result<(), SaxError> {
        self.push(SaxEvent::EndDocument)
    }

    fn start_element(&mut self, name: &QName, attributes: &Attributes) -> Result<(), SaxError> {
        self.push(SaxEvent::StartElement(name.clone(), attributes.clone()))
    }

    fn end_element(&mut self, name: &QName) -> Result<(), SaxError> {
        self.push(SaxEvent::EndElement(name.clone()))
    }

    fn characters(&mut self, text: &str) -> Result<(), SaxError> {
        self.push(SaxEvent::Characters(text.to_string()))
    }
}
