//! Public API for compiling and running scripts.
//!
//! A script is compiled once by an [`Engine`] into a [`CompiledScript`],
//! then run against any number of scopes. Each run returns a [`RunReport`]
//! with one outcome per statement; a failing statement never stops the
//! statements after it unless [`ExecutionOptions::stop_on_error`] is set.
//!
//! # Example
//!
//! ```
//! use radmath_core::api::{Engine, EngineOptions};
//! use radmath_core::scope::memory::{ArrayField, MemoryScope};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let script = engine.compile("B = A + 2; C = NOPE * 2; D = B").unwrap();
//!
//! let mut scope = MemoryScope::new();
//! scope.add_field(ArrayField::new("A", vec![1.0, -9999.0, 3.0])).unwrap();
//!
//! let report = script.run(&mut scope);
//! assert_eq!(report.failures().count(), 1);
//! assert_eq!(report.produced(), vec!["B", "D"]);
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod script;

pub use engine::Engine;
pub use error::{Diagnostic, Error, RelatedInfo};
pub use options::{EngineOptions, ExecutionOptions, ParseOptions};
pub use script::{CompiledScript, RunReport, StatementReport};
