//! Journal-writing commands for exercising execution order in tests.

use std::sync::{Arc, Mutex};
use xchain_context::Context;
use xchain_traits::{Command, CommandError, Filter, Outcome};

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Continue,
    Stop,
    Fail(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub enum PostBehavior {
    Pass,
    Handle,
    Fail,
}

/// Writes `exec:<name>` when executed and `post:<name>:<error>` when
/// post-processed.
#[derive(Debug)]
pub struct Probe {
    name: &'static str,
    journal: Journal,
    behavior: Behavior,
    post: Option<PostBehavior>,
}

impl Probe {
    pub fn command(name: &'static str, journal: &Journal, behavior: Behavior) -> Self {
        Self {
            name,
            journal: journal.clone(),
            behavior,
            post: None,
        }
    }

    pub fn filter(
        name: &'static str,
        journal: &Journal,
        behavior: Behavior,
        post: PostBehavior,
    ) -> Self {
        Self {
            name,
            journal: journal.clone(),
            behavior,
            post: Some(post),
        }
    }
}

impl Command for Probe {
    fn execute(&self, _context: &mut Context) -> Result<Outcome, CommandError> {
        self.journal.record(format!("exec:{}", self.name));
        match self.behavior {
            Behavior::Continue => Ok(Outcome::Continue),
            Behavior::Stop => Ok(Outcome::Stop),
            Behavior::Fail(message) => Err(CommandError::failed(message)),
        }
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        self.post.map(|_| self as &dyn Filter)
    }
}

impl Filter for Probe {
    fn post_process(
        &self,
        _context: &mut Context,
        error: Option<&CommandError>,
    ) -> Result<bool, CommandError> {
        let seen = match error {
            Some(CommandError::Failed(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => "none".to_string(),
        };
        self.journal.record(format!("post:{}:{}", self.name, seen));
        match self.post {
            Some(PostBehavior::Handle) => Ok(true),
            Some(PostBehavior::Fail) => Err(CommandError::failed("cleanup failed")),
            _ => Ok(false),
        }
    }
}
