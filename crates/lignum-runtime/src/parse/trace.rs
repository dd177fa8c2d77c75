//! Tracing infrastructure for debugging parser execution.
//!
//! # Design: Zero-Cost Abstraction
//!
//! The tracer is a zero-cost abstraction. When `NoopTracer` is used:
//! - All trait methods are `#[inline(always)]` empty functions
//! - The compiler eliminates all tracer calls and their arguments
//! - No tracing-related state exists in the parser's stack or versions
//!
//! `PrintTracer` collects human-readable lines, resolving symbol names from
//! the language it was created for.

use lignum_table::{StateId, SymbolId};

use crate::language::Language;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Default: forks, merges, recoveries and acceptance.
    #[default]
    Default,
    /// Verbose: also tokens, shifts, reductions and reused subtrees.
    Verbose,
    /// Very verbose: token lines include the token text.
    VeryVerbose,
}

/// Error recovery strategy chosen when every version failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// A zero-width token was inserted.
    Missing(SymbolId),
    /// The lookahead was skipped into an ERROR node.
    Skip { bytes: usize },
    /// Finished subtrees were popped into an ERROR node.
    Pop { trees: usize },
    /// End of input was reached with no viable strategy; the whole stack
    /// became an ERROR root.
    Wrap,
}

/// Tracer trait for parser instrumentation.
///
/// All methods receive raw data (ids, offsets) the parser already has.
/// Name resolution and formatting happen in the tracer implementation.
///
/// Each method is called at a specific point during a parse:
/// - `trace_lex` - after a token is produced by the lexer
/// - `trace_shift` - after a version shifts a token
/// - `trace_reduce` - after a version reduces a production
/// - `trace_fork` - when a lookahead has several actions
/// - `trace_merge` - after versions with equal stacks are packed
/// - `trace_recover` - after an error recovery strategy is applied
/// - `trace_reuse` - when a subtree of the previous tree is reused
/// - `trace_accept` - when the parse completes
pub trait Tracer {
    /// Called after lexing a token spanning `start..end` (padding excluded).
    fn trace_lex(&mut self, symbol: SymbolId, start: usize, end: usize);

    /// Called after version `version` shifts `symbol` into `state`.
    fn trace_shift(&mut self, version: usize, symbol: SymbolId, state: StateId);

    /// Called after version `version` reduces `child_count` children into
    /// `symbol` and moves to `state`.
    fn trace_reduce(&mut self, version: usize, symbol: SymbolId, child_count: usize, state: StateId);

    /// Called when `symbol` has `count` actions for version `version`.
    fn trace_fork(&mut self, version: usize, symbol: SymbolId, count: usize);

    /// Called after merging, with the number of versions kept and dropped.
    fn trace_merge(&mut self, kept: usize, dropped: usize);

    /// Called after a recovery strategy is applied at `position`.
    fn trace_recover(&mut self, recovery: Recovery, position: usize);

    /// Called when an old subtree spanning `start..end` is reused.
    fn trace_reuse(&mut self, symbol: SymbolId, start: usize, end: usize);

    /// Called once the final tree is chosen.
    fn trace_accept(&mut self, error_cost: u32);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_lex(&mut self, _symbol: SymbolId, _start: usize, _end: usize) {}

    #[inline(always)]
    fn trace_shift(&mut self, _version: usize, _symbol: SymbolId, _state: StateId) {}

    #[inline(always)]
    fn trace_reduce(&mut self, _version: usize, _symbol: SymbolId, _child_count: usize, _state: StateId) {}

    #[inline(always)]
    fn trace_fork(&mut self, _version: usize, _symbol: SymbolId, _count: usize) {}

    #[inline(always)]
    fn trace_merge(&mut self, _kept: usize, _dropped: usize) {}

    #[inline(always)]
    fn trace_recover(&mut self, _recovery: Recovery, _position: usize) {}

    #[inline(always)]
    fn trace_reuse(&mut self, _symbol: SymbolId, _start: usize, _end: usize) {}

    #[inline(always)]
    fn trace_accept(&mut self, _error_cost: u32) {}
}

/// Tracer that collects a parse trace for debugging.
pub struct PrintTracer<'s> {
    /// Source text for token display.
    source: &'s [u8],
    language: Language,
    verbosity: Verbosity,
    /// Collected trace lines.
    lines: Vec<String>,
}

impl<'s> PrintTracer<'s> {
    pub fn new(source: &'s str, language: &Language, verbosity: Verbosity) -> Self {
        Self {
            source: source.as_bytes(),
            language: language.clone(),
            verbosity,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn name(&self, symbol: SymbolId) -> String {
        self.language.table().display_symbol(symbol)
    }

    fn verbose(&self) -> bool {
        self.verbosity != Verbosity::Default
    }

    fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.source.len());
        let start = start.min(end);
        String::from_utf8_lossy(&self.source[start..end]).escape_debug().to_string()
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_lex(&mut self, symbol: SymbolId, start: usize, end: usize) {
        match self.verbosity {
            Verbosity::Default => {}
            Verbosity::Verbose => {
                let line = format!("lex {} [{start}..{end})", self.name(symbol));
                self.lines.push(line);
            }
            Verbosity::VeryVerbose => {
                let line = format!(
                    "lex {} [{start}..{end}) \"{}\"",
                    self.name(symbol),
                    self.text(start, end)
                );
                self.lines.push(line);
            }
        }
    }

    fn trace_shift(&mut self, version: usize, symbol: SymbolId, state: StateId) {
        if self.verbose() {
            let line = format!("  shift #{version} {} -> {state}", self.name(symbol));
            self.lines.push(line);
        }
    }

    fn trace_reduce(&mut self, version: usize, symbol: SymbolId, child_count: usize, state: StateId) {
        if self.verbose() {
            let line = format!(
                "  reduce #{version} {}/{child_count} -> {state}",
                self.name(symbol)
            );
            self.lines.push(line);
        }
    }

    fn trace_fork(&mut self, version: usize, symbol: SymbolId, count: usize) {
        let line = format!("  fork #{version} on {} x{count}", self.name(symbol));
        self.lines.push(line);
    }

    fn trace_merge(&mut self, kept: usize, dropped: usize) {
        self.lines.push(format!("  merge kept {kept} dropped {dropped}"));
    }

    fn trace_recover(&mut self, recovery: Recovery, position: usize) {
        let line = match recovery {
            Recovery::Missing(symbol) => {
                format!("recover missing {} at {position}", self.name(symbol))
            }
            Recovery::Skip { bytes } => format!("recover skip {bytes} bytes at {position}"),
            Recovery::Pop { trees } => format!("recover pop {trees} trees at {position}"),
            Recovery::Wrap => format!("recover wrap at {position}"),
        };
        self.lines.push(line);
    }

    fn trace_reuse(&mut self, symbol: SymbolId, start: usize, end: usize) {
        if self.verbose() {
            let line = format!("reuse {} [{start}..{end})", self.name(symbol));
            self.lines.push(line);
        }
    }

    fn trace_accept(&mut self, error_cost: u32) {
        self.lines.push(format!("accept cost {error_cost}"));
    }
}
