// Reactive dispatcher: control ids -> output -> handler, evaluated synchronously per event

use crate::controls::{ControlRegistry, ControlValue};
use crate::error::{DashError, Result};
use crate::ir::{OutputId, OutputValue};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Maps the rule's input values (in declaration order) to new output content
pub type Handler = Box<dyn Fn(&[ControlValue]) -> anyhow::Result<OutputValue> + Send + Sync>;

/// Current value of every declared control
pub type ControlState = HashMap<String, ControlValue>;

struct Rule {
    output: OutputId,
    inputs: Vec<String>,
    handler: Handler,
}

/// Failure of one dispatch: either the event itself was bad, or a handler failed
#[derive(Debug)]
pub enum DispatchError {
    Rejected(DashError),
    Handler {
        output: OutputId,
        source: anyhow::Error,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Rejected(e) => write!(f, "{}", e),
            DispatchError::Handler { output, source } => {
                write!(f, "Failed to update {}: {:#}", output, source)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<DashError> for DispatchError {
    fn from(e: DashError) -> Self {
        DispatchError::Rejected(e)
    }
}

pub struct Dispatcher {
    registry: ControlRegistry,
    rules: Vec<Rule>,
    state: ControlState,
}

impl Dispatcher {
    /// Start from the registry's declared defaults
    pub fn new(registry: ControlRegistry) -> Self {
        let state = default_state(&registry);
        Self {
            registry,
            rules: Vec::new(),
            state,
        }
    }

    /// Put every control back to its declared default
    pub fn reset(&mut self) {
        self.state = default_state(&self.registry);
    }

    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Outputs with a rule, in registration order
    pub fn outputs(&self) -> impl Iterator<Item = &OutputId> {
        self.rules.iter().map(|r| &r.output)
    }

    /// Declare that `output` is recomputed by `handler` whenever any of `inputs` changes
    pub fn register<F>(&mut self, output: OutputId, inputs: &[&str], handler: F) -> Result<()>
    where
        F: Fn(&[ControlValue]) -> anyhow::Result<OutputValue> + Send + Sync + 'static,
    {
        for input in inputs {
            if !self.registry.contains(input) {
                return Err(DashError::UndeclaredControl(input.to_string()));
            }
        }
        if self.rules.iter().any(|r| r.output == output) {
            return Err(DashError::DuplicateOutput(output.to_string()));
        }

        self.rules.push(Rule {
            output,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Page load: the page draws every control at its default, so the
    /// state is reset to match before every rule is evaluated.
    pub fn initial(&mut self) -> std::result::Result<Vec<(OutputId, OutputValue)>, DispatchError> {
        self.reset();
        self.rules.iter().map(|rule| self.run(rule)).collect()
    }

    /// Apply one change event and recompute each dependent output exactly once.
    ///
    /// The whole event is validated before any value is stored, so a rejected
    /// event leaves the state untouched.
    pub fn apply(
        &mut self,
        changes: &[(String, ControlValue)],
    ) -> std::result::Result<Vec<(OutputId, OutputValue)>, DispatchError> {
        for (id, value) in changes {
            self.registry.validate(id, value)?;
        }

        let mut changed = HashSet::new();
        for (id, value) in changes {
            if self.state.get(id) != Some(value) {
                changed.insert(id.as_str());
            }
            self.state.insert(id.clone(), value.clone());
        }

        let mut outputs = Vec::new();
        for rule in &self.rules {
            if rule.inputs.iter().any(|i| changed.contains(i.as_str())) {
                outputs.push(self.run(rule)?);
            }
        }
        debug!(
            "Event changed {} control(s), recomputed {} output(s)",
            changed.len(),
            outputs.len()
        );
        Ok(outputs)
    }

    fn run(&self, rule: &Rule) -> std::result::Result<(OutputId, OutputValue), DispatchError> {
        let values: Vec<ControlValue> = rule
            .inputs
            .iter()
            .map(|id| self.state.get(id).cloned().unwrap_or(ControlValue::Empty))
            .collect();
        debug!("Recomputing {}", rule.output);
        let value = (rule.handler)(&values).map_err(|source| DispatchError::Handler {
            output: rule.output.clone(),
            source,
        })?;
        Ok((rule.output.clone(), value))
    }
}

fn default_state(registry: &ControlRegistry) -> ControlState {
    registry
        .iter()
        .map(|c| (c.id.clone(), c.default.clone()))
        .collect()
}
