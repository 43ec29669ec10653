//! Nesting bookkeeping for reentrant commands.
//!
//! Filter lists and templates are shared between requests and may be
//! re-entered recursively within one request. Their per-invocation state is
//! kept here, on the context of the invocation, in strict LIFO order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one command instance across the contexts that execute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExecutionState {
    PreExecute,
    Executed,
    PostProcessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOutputState {
    PreStart,
    Started,
    Ended,
}

/// State of one active template invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFrame {
    commands: Vec<CommandExecutionState>,
    elements: Vec<ElementOutputState>,
}

impl TemplateFrame {
    pub fn new(command_count: usize, element_count: usize) -> Self {
        Self {
            commands: vec![CommandExecutionState::PreExecute; command_count],
            elements: vec![ElementOutputState::PreStart; element_count],
        }
    }

    pub fn command_state(&self, index: usize) -> Option<CommandExecutionState> {
        self.commands.get(index).copied()
    }

    pub fn set_command_state(&mut self, index: usize, state: CommandExecutionState) {
        if let Some(slot) = self.commands.get_mut(index) {
            *slot = state;
        }
    }

    pub fn element_state(&self, index: usize) -> Option<ElementOutputState> {
        self.elements.get(index).copied()
    }

    pub fn set_element_state(&mut self, index: usize, state: ElementOutputState) {
        if let Some(slot) = self.elements.get_mut(index) {
            *slot = state;
        }
    }

    pub fn command_states(&self) -> &[CommandExecutionState] {
        &self.commands
    }

    pub fn element_states(&self) -> &[ElementOutputState] {
        &self.elements
    }
}

#[derive(Debug, Default)]
pub struct ExecutionStack {
    cursors: HashMap<InstanceId, Vec<usize>>,
    templates: Vec<TemplateFrame>,
}

impl ExecutionStack {
    /// Records how many children an execution of `owner` entered.
    pub fn push_cursor(&mut self, owner: InstanceId, entered: usize) {
        self.cursors.entry(owner).or_default().push(entered);
    }

    /// Removes the most recent cursor of `owner`.
    pub fn pop_cursor(&mut self, owner: InstanceId) -> Option<usize> {
        let stack = self.cursors.get_mut(&owner)?;
        let cursor = stack.pop();
        if stack.is_empty() {
            self.cursors.remove(&owner);
        }
        cursor
    }

    pub fn open_cursors(&self, owner: InstanceId) -> usize {
        self.cursors.get(&owner).map_or(0, Vec::len)
    }

    /// Pushes a fresh template frame and returns the new depth.
    pub fn push_template(&mut self, command_count: usize, element_count: usize) -> usize {
        self.templates
            .push(TemplateFrame::new(command_count, element_count));
        self.templates.len()
    }

    pub fn pop_template(&mut self) -> Option<TemplateFrame> {
        self.templates.pop()
    }

    pub fn template_depth(&self) -> usize {
        self.templates.len()
    }

    pub fn current_template(&self) -> Option<&TemplateFrame> {
        self.templates.last()
    }

    pub fn current_template_mut(&mut self) -> Option<&mut TemplateFrame> {
        self.templates.last_mut()
    }
}
