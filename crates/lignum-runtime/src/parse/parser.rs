//! Public parser entry points.

use crate::language::Language;
use crate::tree::{Tree, TreeEdit};

use super::engine::Engine;
use super::error::{EditError, ParseError};
use super::options::ParseOptions;
use super::reuse::Reuse;
use super::trace::{NoopTracer, Tracer};

/// Parser bound to one [`Language`].
///
/// A parser holds no per-parse state; it can be reused for any number of
/// parses, one at a time.
#[derive(Clone, Debug)]
pub struct Parser {
    language: Language,
    options: ParseOptions,
}

impl Parser {
    pub fn new(language: &Language) -> Self {
        Self {
            language: language.clone(),
            options: ParseOptions::default(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse `text` from scratch. Syntax errors become ERROR and MISSING
    /// nodes; only cancellation fails.
    pub fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        self.parse_bytes(text.as_bytes())
    }

    pub fn parse_bytes(&self, text: &[u8]) -> Result<Tree, ParseError> {
        self.run(text, None, &mut NoopTracer)
    }

    /// Parse text pulled from `read`, called with the offset of the next
    /// chunk until it returns an empty one.
    pub fn parse_with<T, F>(&self, mut read: F) -> Result<Tree, ParseError>
    where
        T: AsRef<[u8]>,
        F: FnMut(usize) -> T,
    {
        let mut text = Vec::new();
        loop {
            let chunk = read(text.len());
            let chunk = chunk.as_ref();
            if chunk.is_empty() {
                break;
            }
            text.extend_from_slice(chunk);
        }
        self.parse_bytes(&text)
    }

    /// Parse with parser instrumentation.
    pub fn parse_with_tracer<T: Tracer>(&self, text: &str, tracer: &mut T) -> Result<Tree, ParseError> {
        self.run(text.as_bytes(), None, tracer)
    }

    /// Parse `text`, the result of applying `edit` to the text of its tree,
    /// reusing unchanged subtrees. The tree equals a full parse of `text`.
    pub fn reparse(&self, edit: &TreeEdit, text: &str) -> Result<Tree, ParseError> {
        self.reparse_with_tracer(edit, text, &mut NoopTracer)
    }

    pub fn reparse_with_tracer<T: Tracer>(
        &self,
        edit: &TreeEdit,
        text: &str,
        tracer: &mut T,
    ) -> Result<Tree, ParseError> {
        if !edit.tree().language().same_tables(&self.language) {
            return Err(EditError::LanguageMismatch.into());
        }
        if text.len() != edit.new_len() {
            return Err(EditError::LengthMismatch {
                expected: edit.new_len(),
                actual: text.len(),
            }
            .into());
        }
        let reuse = self.options.incremental.then(|| Reuse::new(edit));
        self.run(text.as_bytes(), reuse, tracer)
    }

    fn run<T: Tracer>(&self, text: &[u8], reuse: Option<Reuse<'_>>, tracer: &mut T) -> Result<Tree, ParseError> {
        let engine = Engine::new(&self.language, text, &self.options, tracer, reuse);
        match engine.run() {
            Ok(tree) => Ok(tree),
            Err(reason) => {
                tracing::debug!(%reason, "parse cancelled");
                Err(ParseError::Cancelled(reason))
            }
        }
    }
}
