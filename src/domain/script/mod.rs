//! Embedded scripting: a small statement language evaluated against the
//! bound variables of the active model.

pub mod ast;
pub mod engine;
pub mod eval;
pub mod parser;
pub mod value;

pub use engine::{ScriptReport, execute, execute_file};
