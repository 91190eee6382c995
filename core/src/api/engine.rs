//! The script compilation engine.

use tracing::debug;

use super::{CompiledScript, EngineOptions, Error, ParseOptions};
use crate::function_def::{FunctionDef, builtin_functions};
use crate::node::Node;
use crate::parser;

/// Compiles scripts with a fixed set of default options.
///
/// The engine holds no scope state; compiled scripts are independent of
/// the engine that produced them.
///
/// # Example
///
/// ```
/// use radmath_core::api::{Engine, EngineOptions};
///
/// let engine = Engine::new(EngineOptions::default());
/// let script = engine.compile("A = B * 2; C = abs(A)").unwrap();
/// assert_eq!(script.statements().len(), 2);
/// assert_eq!(script.inputs(), vec!["B"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compile a script of `;`-separated statements.
    pub fn compile(&self, source: &str) -> Result<CompiledScript, Error> {
        self.compile_with(source, &self.options.default_parse_options)
    }

    pub fn compile_with(&self, source: &str, options: &ParseOptions) -> Result<CompiledScript, Error> {
        let statements = parser::parse_with_max_depth(source, options.max_depth)?;
        debug!(statements = statements.len(), "compiled script");
        CompiledScript::from_statements(statements, &self.options.default_execution_options)
    }

    /// Compile a single value-producing expression, such as `DBZ - 5`.
    pub fn compile_expression(&self, source: &str) -> Result<Node, Error> {
        let node = parser::parse_expression(source)?;
        if matches!(node, Node::Assignment(_) | Node::Conditional(_)) {
            return Err(Error::Api(format!("'{}' is a statement, not an expression", node)));
        }
        Ok(node)
    }

    /// Help entries for the built-in operators.
    pub fn builtin_functions(&self) -> &'static [FunctionDef] {
        builtin_functions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ExecutionOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_reports_diagnostics() {
        let engine = Engine::default();
        let err = engine.compile("A = B +").unwrap_err();
        let Error::Compilation { diagnostics, .. } = err else {
            panic!("expected compilation error");
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("P001"));
    }

    #[test]
    fn test_compile_uses_default_execution_options() {
        let engine = Engine::new(EngineOptions {
            default_execution_options: ExecutionOptions {
                max_depth: 7,
                stop_on_error: true,
            },
            ..Default::default()
        });
        let script = engine.compile("A = 1").unwrap();
        assert_eq!(script.options().max_depth, 7);
        assert!(script.options().stop_on_error);
    }

    #[test]
    fn test_compile_respects_parse_depth() {
        let engine = Engine::default();
        let source = "A = abs(abs(abs(B)))";
        assert!(engine.compile(source).is_ok());
        let err = engine
            .compile_with(source, &ParseOptions { max_depth: 2 })
            .unwrap_err();
        assert!(matches!(err, Error::Compilation { .. }));
    }

    #[test]
    fn test_inputs_and_outputs() {
        let engine = Engine::default();
        let script = engine
            .compile("SNR = DBZ - NOISE; FLAG = SNR > 3; if (FLAG == 1) then OUT = VEL")
            .unwrap();
        assert_eq!(script.inputs(), vec!["DBZ", "NOISE", "VEL"]);
        assert_eq!(script.outputs(), vec!["SNR", "FLAG", "OUT"]);
    }

    #[test]
    fn test_compile_expression() {
        let engine = Engine::default();
        let node = engine.compile_expression("DBZ - 5").unwrap();
        assert_eq!(node.to_string(), "DBZ - 5");
        assert!(engine.compile_expression("A = 1").is_err());
    }
}
