//! Field-expression evaluation engine.
//!
//! Scripts such as `SNR = DBZ - 5; FLAG = DBZ > 20` are compiled once into
//! expression trees and then evaluated point by point against any number of
//! data scopes (a ray, a sweep, a volume). Missing data is a first-class
//! value that flows through every operator; the host application supplies
//! its own storage through [`scope::MathData`] and its own functions
//! through the user-function hooks.

pub mod api;
pub mod evaluator;
pub mod function_def;
pub mod leaf;
pub mod node;
pub mod parser;
pub mod scope;
pub mod special;

pub use api::{CompiledScript, Engine, EngineOptions, Error, ExecutionOptions, RunReport};
pub use evaluator::EvalError;
pub use leaf::LeafContent;
pub use node::{Node, Processed};
pub use scope::{FieldId, MathData, MathLoopData, Synched};
pub use special::{MathUserData, SpecialUserData};
