//! GLR parser engine.

mod engine;
mod error;
mod options;
mod parser;
mod recover;
mod reuse;
mod stack;
mod trace;

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod stack_tests;

pub use error::{CancelReason, EditError, ParseError};
pub use options::ParseOptions;
pub use parser::Parser;
pub use trace::{NoopTracer, PrintTracer, Recovery, Tracer, Verbosity};
