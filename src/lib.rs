//! Radmath - field arithmetic for gridded and radar data
//!
//! # Overview
//!
//! Radmath evaluates small scripts of named-field arithmetic against host
//! data. A script is a list of `;`-separated statements:
//!
//! ```text
//! SNR = DBZ - 5;
//! FLAG = DBZ > 20 && VEL != missing;
//! if (FLAG == 1) then CLEAN = DBZ else CLEAN = missing
//! ```
//!
//! Every field is an array of values with a per-field missing sentinel.
//! Missing data flows through every operator instead of raising errors.
//!
//! # Quick Start
//!
//! ```
//! use radmath::{Engine, MathData, MathLoopData};
//! use radmath::scope::memory::{ArrayField, MemoryScope};
//!
//! let engine = Engine::default();
//! let script = engine.compile("SNR = DBZ - 5; FLAG = DBZ > 20").unwrap();
//!
//! let mut scope = MemoryScope::new();
//! scope
//!     .add_field(ArrayField::new("DBZ", vec![10.0, -9999.0, 40.0]))
//!     .unwrap();
//!
//! let report = script.run(&mut scope);
//! assert!(report.is_success());
//! assert_eq!(
//!     scope.array("FLAG").unwrap().to_options(),
//!     vec![Some(0.0), Some(0.0), Some(1.0)]
//! );
//! assert_eq!(scope.data("SNR").and_then(|f| f.get_val(1)), None);
//! ```
//!
//! # Host Data
//!
//! Scripts run against anything implementing [`MathData`]. The bundled
//! [`scope::memory::MemoryScope`] keeps fields in vectors and dispatches
//! user functions to closures registered in a
//! [`scope::memory::UserFunctions`] table.

// Re-export public API from radmath_core
pub use radmath_core::api::{
    CompiledScript, Diagnostic, Engine, EngineOptions, Error, ExecutionOptions, ParseOptions,
    RelatedInfo, RunReport, StatementReport,
};

// Re-export the data model and tree types
pub use radmath_core::function_def::{self, FunctionDef, builtin_functions};
pub use radmath_core::leaf::{self, LeafContent};
pub use radmath_core::node::{self, Node, Processed};
pub use radmath_core::scope::{self, FieldId, MathData, MathLoopData, Synched};
pub use radmath_core::special::{self, MathUserData, SpecialUserData};

// Re-export errors
pub use radmath_core::evaluator::EvalError;

// Error rendering
mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
