//! Templates: commands that emit output events around their children.
//!
//! A template body is a tree of text, elements and child commands. While a
//! template runs, the context carries one `TemplateFrame` per active
//! invocation recording which children were executed and which elements were
//! started, so that a handled failure can still be unwound and the output
//! closed cleanly, and so that a template can be re-entered recursively.

use crate::expr::ValueExpr;
use crate::qname::dynamic_qname;
use crate::run::post_process_quietly;
use xchain_context::{CommandExecutionState, Context, ElementOutputState, Scope};
use xchain_traits::{Command, CommandError, Outcome, SharedCommand};
use xchain_types::{Attributes, QName};

/// How an element or attribute name is obtained.
#[derive(Debug, Clone)]
pub enum NameSpec {
    Static(QName),
    Dynamic {
        name: ValueExpr,
        namespace: Option<ValueExpr>,
    },
}

impl NameSpec {
    fn resolve(&self, context: &Context, include_default_prefix: bool) -> Result<QName, CommandError> {
        match self {
            NameSpec::Static(name) => Ok(name.clone()),
            NameSpec::Dynamic { name, namespace } => {
                dynamic_qname(context, name, namespace.as_ref(), include_default_prefix)
            }
        }
    }
}

impl From<QName> for NameSpec {
    fn from(name: QName) -> Self {
        NameSpec::Static(name)
    }
}

#[derive(Debug, Clone)]
pub struct AttributeTemplate {
    pub name: NameSpec,
    pub value: ValueExpr,
}

#[derive(Debug, Clone)]
pub struct ElementTemplate {
    pub name: NameSpec,
    pub attributes: Vec<AttributeTemplate>,
    pub body: Vec<TemplateNode>,
}

impl ElementTemplate {
    pub fn new(name: impl Into<NameSpec>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<NameSpec>, value: ValueExpr) -> Self {
        self.attributes.push(AttributeTemplate {
            name: name.into(),
            value,
        });
        self
    }

    pub fn child(mut self, node: TemplateNode) -> Self {
        self.body.push(node);
        self
    }
}

/// A node of a template body as it is written.
#[derive(Debug, Clone)]
pub enum TemplateNode {
    Text(ValueExpr),
    Element(ElementTemplate),
    Command(SharedCommand),
}

/// The compiled body, with commands and elements numbered in document order.
#[derive(Debug)]
enum Node {
    Text(ValueExpr),
    Element {
        index: usize,
        name: NameSpec,
        attributes: Vec<AttributeTemplate>,
        body: Vec<Node>,
    },
    Command(usize),
}

fn compile(
    nodes: Vec<TemplateNode>,
    commands: &mut Vec<SharedCommand>,
    element_count: &mut usize,
) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            TemplateNode::Text(text) => Node::Text(text),
            TemplateNode::Command(command) => {
                commands.push(command);
                Node::Command(commands.len() - 1)
            }
            TemplateNode::Element(element) => {
                let index = *element_count;
                *element_count += 1;
                Node::Element {
                    index,
                    name: element.name,
                    attributes: element.attributes,
                    body: compile(element.body, commands, element_count),
                }
            }
        })
        .collect()
}

/// Per-invocation walk state, local to one `execute` call.
#[derive(Default)]
struct Walk {
    executed: Vec<usize>,
    open: Vec<(usize, QName)>,
}

#[derive(Debug)]
pub struct TemplateCommand {
    body: Vec<Node>,
    commands: Vec<SharedCommand>,
    element_count: usize,
}

impl TemplateCommand {
    pub fn new(body: Vec<TemplateNode>) -> Self {
        let mut commands = Vec::new();
        let mut element_count = 0;
        let body = compile(body, &mut commands, &mut element_count);
        Self {
            body,
            commands,
            element_count,
        }
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Post-processes the children at `indices` in reverse. Only children
    /// still marked executed are visited; each is marked post-processed
    /// whether or not its cleanup succeeds.
    pub fn post_process_children(
        &self,
        context: &mut Context,
        error: Option<&CommandError>,
        indices: &[usize],
    ) -> bool {
        let mut handled = false;
        for &index in indices.iter().rev() {
            let state = context
                .execution()
                .current_template()
                .and_then(|frame| frame.command_state(index));
            if state != Some(CommandExecutionState::Executed) {
                continue;
            }
            if let Some(filter) = self.commands[index].as_filter() {
                handled |= post_process_quietly(filter, context, error);
            }
            mark_command(context, index, CommandExecutionState::PostProcessed);
        }
        handled
    }

    /// Like `post_process_children`, but with no error outstanding a pending
    /// output error counts as handled so that callers stop and pick it up
    /// from the context.
    pub fn virtual_post_process(
        &self,
        context: &mut Context,
        error: Option<&CommandError>,
        indices: &[usize],
    ) -> bool {
        let handled = self.post_process_children(context, error, indices);
        if error.is_none() && context.has_pending_output_error() {
            return true;
        }
        handled
    }

    /// Executes the children at `indices` in order, marking each executed
    /// just before it runs. Stops at the first child that stops.
    pub fn execute_children(
        &self,
        context: &mut Context,
        indices: &[usize],
    ) -> Result<Outcome, CommandError> {
        for &index in indices {
            let command = self
                .commands
                .get(index)
                .ok_or_else(|| CommandError::failed(format!("no child command at index {}", index)))?;
            mark_command(context, index, CommandExecutionState::Executed);
            if command.execute(context)?.is_stop() {
                return Ok(Outcome::Stop);
            }
        }
        Ok(Outcome::Continue)
    }

    fn run(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        let mut walk = Walk::default();
        let forward = self.execute_nodes(&self.body, context, &mut walk);
        let (outcome, failure) = match forward {
            Ok(outcome) => (outcome, None),
            Err(err) => (Outcome::Continue, Some(err)),
        };

        let handled = self.virtual_post_process(context, failure.as_ref(), &walk.executed);

        match failure {
            Some(err) if !handled => Err(err),
            Some(err) => {
                log::debug!("Template error handled, closing open elements: {}", err);
                self.close_open_elements(context, &walk.open)?;
                Ok(Outcome::Continue)
            }
            None if context.has_pending_output_error() => Ok(Outcome::Stop),
            None => Ok(outcome),
        }
    }

    fn execute_nodes(
        &self,
        nodes: &[Node],
        context: &mut Context,
        walk: &mut Walk,
    ) -> Result<Outcome, CommandError> {
        for node in nodes {
            match node {
                Node::Text(text) => {
                    if let Some(text) = text.evaluate(context) {
                        context.content_handler()?.characters(&text)?;
                    }
                }
                Node::Command(index) => {
                    mark_command(context, *index, CommandExecutionState::Executed);
                    walk.executed.push(*index);
                    if self.commands[*index].execute(context)?.is_stop() {
                        return Ok(Outcome::Stop);
                    }
                }
                Node::Element {
                    index,
                    name,
                    attributes,
                    body,
                } => {
                    let qname = name.resolve(context, true)?;
                    let mut attrs = Attributes::new();
                    for attribute in attributes {
                        let attr_name = attribute.name.resolve(context, false)?;
                        if let Some(value) = attribute.value.evaluate(context) {
                            attrs.add(attr_name, value);
                        }
                    }

                    context.content_handler()?.start_element(&qname, &attrs)?;
                    mark_element(context, *index, ElementOutputState::Started);
                    walk.open.push((*index, qname.clone()));

                    let outcome = self.execute_nodes(body, context, walk)?;

                    context.content_handler()?.end_element(&qname)?;
                    mark_element(context, *index, ElementOutputState::Ended);
                    walk.open.pop();

                    if outcome.is_stop() {
                        return Ok(Outcome::Stop);
                    }
                }
            }
        }
        Ok(Outcome::Continue)
    }

    fn close_open_elements(
        &self,
        context: &mut Context,
        open: &[(usize, QName)],
    ) -> Result<(), CommandError> {
        for (index, name) in open.iter().rev() {
            let state = context
                .execution()
                .current_template()
                .and_then(|frame| frame.element_state(*index));
            if state == Some(ElementOutputState::Started) {
                context.content_handler()?.end_element(name)?;
                mark_element(context, *index, ElementOutputState::Ended);
            }
        }
        Ok(())
    }
}

impl Command for TemplateCommand {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        let outermost = context.execution().template_depth() == 0;
        let opens_scope = !context.is_open(Scope::Execution);
        if opens_scope {
            context.start_scope(Scope::Execution);
        }
        context
            .execution_mut()
            .push_template(self.commands.len(), self.element_count);

        let result = self.run(context);

        context.execution_mut().pop_template();
        let ended = if opens_scope {
            context.end_scope(Scope::Execution)
        } else {
            Ok(())
        };
        if outermost {
            if let Some(output_error) = context.take_output_error() {
                return Err(output_error.into());
            }
        }
        let outcome = result?;
        ended?;
        Ok(outcome)
    }
}

fn mark_command(context: &mut Context, index: usize, state: CommandExecutionState) {
    if let Some(frame) = context.execution_mut().current_template_mut() {
        frame.set_command_state(index, state);
    }
}

fn mark_element(context: &mut Context, index: usize, state: ElementOutputState) {
    if let Some(frame) = context.execution_mut().current_template_mut() {
        frame.set_element_state(index, state);
    }
}
