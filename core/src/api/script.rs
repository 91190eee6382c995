//! Compiled scripts and their run reports.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Error, ExecutionOptions};
use crate::evaluator::{EvalError, EvaluatorOptions};
use crate::node::{Node, Processed};
use crate::scope::MathData;

/// A parsed script: one tree per statement, in source order.
///
/// A compiled script holds no reference to any scope and no interior
/// mutability, so one instance can be run against many scopes, including
/// from several threads at once.
///
/// # Example
///
/// ```
/// use radmath_core::api::{Engine, EngineOptions};
/// use radmath_core::scope::memory::{ArrayField, MemoryScope};
///
/// let engine = Engine::new(EngineOptions::default());
/// let script = engine.compile("SNR = DBZ - 5; FLAG = DBZ > 20").unwrap();
///
/// let mut scope = MemoryScope::new();
/// scope.add_field(ArrayField::new("DBZ", vec![10.0, -9999.0, 40.0])).unwrap();
///
/// let report = script.run(&mut scope);
/// assert!(report.is_success());
/// assert_eq!(scope.array("FLAG").unwrap().values(), &[0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledScript {
    statements: Vec<Node>,
    options: ExecutionOptions,
}

impl CompiledScript {
    /// Build a script from trees constructed directly. Every tree must be a
    /// statement.
    pub fn from_statements(
        statements: Vec<Node>,
        options: &ExecutionOptions,
    ) -> Result<Self, Error> {
        if let Some(bad) = statements
            .iter()
            .find(|node| !matches!(node, Node::Assignment(_) | Node::Conditional(_)))
        {
            return Err(Error::Api(format!("'{}' is not a statement", bad)));
        }
        Ok(Self {
            statements,
            options: options.clone(),
        })
    }

    pub fn statements(&self) -> &[Node] {
        &self.statements
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Every field read by the script that no earlier statement produces:
    /// the inputs a scope must supply.
    pub fn inputs(&self) -> Vec<String> {
        let mut produced: Vec<String> = Vec::new();
        let mut inputs: Vec<String> = Vec::new();
        for statement in &self.statements {
            for name in statement.inputs() {
                if !produced.contains(&name) && !inputs.contains(&name) {
                    inputs.push(name);
                }
            }
            for name in statement.outputs() {
                if !produced.contains(&name) {
                    produced.push(name);
                }
            }
        }
        inputs
    }

    /// Every name the script writes, in first-write order.
    pub fn outputs(&self) -> Vec<String> {
        let mut outputs: Vec<String> = Vec::new();
        for name in self.statements.iter().flat_map(Node::outputs) {
            if !outputs.contains(&name) {
                outputs.push(name);
            }
        }
        outputs
    }

    /// Run every statement against `data` with the options the script was
    /// compiled with.
    pub fn run(&self, data: &mut dyn MathData) -> RunReport {
        self.run_with(data, &self.options)
    }

    /// Run every statement against `data`.
    ///
    /// A failing statement leaves its target untouched and, unless
    /// `stop_on_error` is set, the remaining statements still run. A
    /// resource error always stops the run.
    pub fn run_with(&self, data: &mut dyn MathData, options: &ExecutionOptions) -> RunReport {
        let evaluator_options = EvaluatorOptions::from(options);
        let mut report = RunReport::default();
        for statement in &self.statements {
            let outcome = statement.process_with(data, evaluator_options);
            let stop = match &outcome {
                Ok(processed) => {
                    debug!(statement = %statement, produced = ?processed.names(), "statement done");
                    false
                }
                Err(e) if e.is_resource_exceeded() => {
                    warn!(statement = %statement, error = %e, "resource limit reached, stopping");
                    true
                }
                Err(_) => options.stop_on_error,
            };
            report.statements.push(StatementReport {
                statement: statement.to_string(),
                outcome,
            });
            if stop {
                report.stopped_early = report.statements.len() < self.statements.len();
                break;
            }
        }
        report
    }
}

impl fmt::Display for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementReport {
    /// The statement, printed.
    pub statement: String,
    pub outcome: Result<Processed, EvalError>,
}

/// Outcome of running a whole script against one scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub statements: Vec<StatementReport>,
    /// Set when statements were skipped after a failure.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.stopped_early && self.statements.iter().all(|s| s.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &EvalError)> {
        self.statements
            .iter()
            .filter_map(|s| s.outcome.as_ref().err().map(|e| (s.statement.as_str(), e)))
    }

    /// Names produced by the successful statements, in order.
    pub fn produced(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok())
            .flat_map(|p| p.names())
            .collect()
    }

    /// The first failure as a public error, if any.
    pub fn into_result(self) -> Result<Vec<Processed>, Error> {
        self.statements
            .into_iter()
            .map(|s| s.outcome.map_err(Error::from))
            .collect()
    }
}
