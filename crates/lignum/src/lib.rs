//! Lignum: table-driven, incremental, error-tolerant parsing.
//!
//! # Example
//!
//! ```
//! use lignum::{Grammar, Rule};
//!
//! let grammar = Grammar::new("parens")
//!     .rule("expr", Rule::seq([Rule::string("("), Rule::sym("number"), Rule::string(")")]))
//!     .rule("number", Rule::pattern(r"\d+"));
//!
//! let language = lignum::compile_grammar(&grammar).expect("grammar is valid");
//! let tree = lignum::parse(&language, "(42)").expect("not cancelled");
//! assert_eq!(tree.to_sexp(), "(expr (number))");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]


pub use lignum_runtime::{
    CancelReason, EditError, ExternalScanner, ExternalToken, GrammarLoadError, InputEdit, Language,
    Node, NoopTracer, ParseError, ParseOptions, Parser, Point, PrintTracer, Recovery, ScanContext,
    ScannerState, SymbolId, Tracer, Tree, TreeCursor, TreeEdit, ValidExternals, Verbosity,
};

#[cfg(feature = "generate")]
pub use lignum_core::{Grammar, Rule};
#[cfg(feature = "generate")]
pub use lignum_generate::{GenerateError, GenerateOptions};

/// Errors from building a language out of a grammar description.
#[cfg(feature = "generate")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("grammar generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("generated table failed to load: {0}")]
    Load(#[from] GrammarLoadError),
}

/// Load a grammar table produced by the generator.
pub fn load_grammar(bytes: &[u8]) -> Result<Language, GrammarLoadError> {
    Language::load(bytes)
}

/// Generate the table for `grammar` and load it.
#[cfg(feature = "generate")]
pub fn compile_grammar(grammar: &Grammar) -> Result<Language, Error> {
    let bytes = lignum_generate::generate(grammar)?;
    Ok(Language::load(&bytes)?)
}

/// Parse `text` with default options. Fails only when cancelled.
pub fn parse(language: &Language, text: &str) -> Result<Tree, ParseError> {
    Parser::new(language).parse(text)
}

/// Parse text pulled chunk by chunk from `read`, see [`Parser::parse_with`].
pub fn parse_with<T, F>(language: &Language, read: F) -> Result<Tree, ParseError>
where
    T: AsRef<[u8]>,
    F: FnMut(usize) -> T,
{
    Parser::new(language).parse_with(read)
}

/// Apply `edits` to `tree` and parse `text`, the edited text, reusing what
/// the edits left intact.
pub fn reparse(tree: &Tree, edits: &[InputEdit], text: &str) -> Result<Tree, ParseError> {
    let edit = tree.edit(edits)?;
    Parser::new(tree.language()).reparse(&edit, text)
}
