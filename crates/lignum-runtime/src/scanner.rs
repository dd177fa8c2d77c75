//! External scanner interface.
//!
//! Grammars declare context-sensitive tokens (indentation, heredocs, string
//! interpolation) as externals. The lexer hands those to an
//! [`ExternalScanner`] before trying its own DFAs. Scanner state is an
//! explicit byte blob owned by each parse version, so scanners stay reentrant
//! and the parser can fork and restore them freely.

use std::cell::Cell;

/// Hand-written tokenizer for a grammar's external tokens.
pub trait ExternalScanner: Send + Sync {
    /// Try to recognize one of the `valid` external tokens at the context's
    /// position.
    ///
    /// Returning `None` means no token; any changes to `state` are then
    /// discarded. The token spans from the last [`ScanContext::skip`] to the
    /// last [`ScanContext::mark_end`] (or the current position if `mark_end`
    /// was never called).
    fn scan(
        &self,
        ctx: &mut ScanContext<'_>,
        valid: &ValidExternals,
        state: &mut ScannerState,
    ) -> Option<ExternalToken>;
}

/// Serialized scanner state carried between tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScannerState(Vec<u8>);

impl ScannerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }

    pub fn set(&mut self, bytes: impl Into<Vec<u8>>) {
        self.0 = bytes.into();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// External token recognized by a scanner, by external index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalToken {
    pub index: usize,
}

impl ExternalToken {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

/// Which external tokens the parser accepts at the current position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidExternals {
    valid: Vec<bool>,
}

impl ValidExternals {
    pub(crate) fn new(valid: Vec<bool>) -> Self {
        Self { valid }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    pub fn any(&self) -> bool {
        self.valid.iter().any(|&v| v)
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Character-level view of the text for a scanner.
pub struct ScanContext<'a> {
    text: &'a [u8],
    position: usize,
    token_start: usize,
    end: Option<usize>,
    /// One past the furthest byte looked at; `text.len() + 1` once EOF was seen.
    examined: Cell<usize>,
}

impl<'a> ScanContext<'a> {
    pub(crate) fn new(text: &'a [u8], position: usize) -> Self {
        Self {
            text,
            position,
            token_start: position,
            end: None,
            examined: Cell::new(position),
        }
    }

    /// Character at the current position, `None` at end of input.
    pub fn lookahead(&self) -> Option<char> {
        match decode_char(self.text, self.position) {
            Some((c, len)) => {
                self.touch(self.position + len);
                Some(c)
            }
            None => {
                self.touch(self.text.len() + 1);
                None
            }
        }
    }

    /// Consume the current character into the token.
    pub fn advance(&mut self) {
        if let Some((_, len)) = decode_char(self.text, self.position) {
            self.position += len;
            self.touch(self.position);
        }
    }

    /// Consume the current character as whitespace before the token.
    pub fn skip(&mut self) {
        self.advance();
        self.token_start = self.position;
    }

    /// Mark the current position as the end of the token.
    pub fn mark_end(&mut self) {
        self.end = Some(self.position);
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.lookahead().is_none()
    }

    /// Column of the current position in bytes.
    pub fn column(&self) -> usize {
        let line_start = self.text[..self.position]
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        self.position - line_start
    }

    fn touch(&self, offset: usize) {
        if offset > self.examined.get() {
            self.examined.set(offset);
        }
    }

    pub(crate) fn token_start(&self) -> usize {
        self.token_start
    }

    pub(crate) fn token_end(&self) -> usize {
        self.end.unwrap_or(self.position).max(self.token_start)
    }

    pub(crate) fn examined(&self) -> usize {
        self.examined.get()
    }
}

/// Decode the UTF-8 character at `offset`. Invalid bytes decode as U+FFFD
/// with length 1.
pub(crate) fn decode_char(text: &[u8], offset: usize) -> Option<(char, usize)> {
    let first = *text.get(offset)?;
    let len = match first {
        0x00..=0x7f => return Some((first as char, 1)),
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Some((char::REPLACEMENT_CHARACTER, 1)),
    };
    let bytes = text.get(offset..offset + len);
    match bytes.and_then(|b| std::str::from_utf8(b).ok()) {
        Some(s) => s.chars().next().map(|c| (c, len)),
        None => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}
