//! Table-driven lexer.
//!
//! The lexer is stateless apart from the scanner blob the parser threads
//! through it. Every token records how far the lexer looked ahead, so the
//! incremental reparser can tell whether an edit could change it.

use lignum_table::{END, ERROR, LexModeId, Matcher, SymbolId};
use regex_automata::dfa::Automaton;
use regex_automata::{Anchored, Input};

use crate::language::{Dfa, Language};
use crate::scanner::{ScanContext, ScannerState, ValidExternals, decode_char};

/// Lex mode recorded on tokens lexed for several parse states at once.
pub(crate) const NO_LEX_MODE: LexModeId = LexModeId::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub symbol: SymbolId,
    /// Skipped separator bytes before the token.
    pub padding: usize,
    pub size: usize,
    /// Bytes examined from the start of the padding. At least `padding + size`,
    /// one more than the remaining text if end of input was observed.
    pub lookahead: usize,
    pub lex_mode: LexModeId,
    /// Produced by the external scanner.
    pub external: bool,
    /// The external scanner was consulted, whether or not it produced the token.
    pub scanned: bool,
}

impl Token {
    pub fn is_end(&self) -> bool {
        self.symbol == END
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    symbol: SymbolId,
    len: usize,
    literal: bool,
    precedence: i32,
    keyword: bool,
}

impl Candidate {
    /// Longest match, then literal over pattern, then declared precedence.
    /// Equal candidates keep the earlier declaration.
    fn beats(&self, other: &Candidate) -> bool {
        (self.len, self.literal, self.precedence) > (other.len, other.literal, other.precedence)
    }
}

pub(crate) struct Lexer<'a> {
    language: &'a Language,
    text: &'a [u8],
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, text: &'a [u8]) -> Self {
        Self { language, text }
    }

    /// Lex the token starting at `position` for the given lex modes.
    ///
    /// Never fails: unmatched input yields a one-character `ERROR` token and
    /// the end of input yields a zero-size `END` token. With `use_scanner`
    /// unset the external scanner is not consulted.
    pub fn next_token(
        &self,
        position: usize,
        modes: &[LexModeId],
        state: &mut ScannerState,
        use_scanner: bool,
    ) -> Token {
        let table = self.language.table();
        let data = table.data();

        let mut valid: Vec<SymbolId> = Vec::new();
        for &mode in modes {
            valid.extend_from_slice(&data.lex_modes[mode as usize].terminals);
        }
        valid.sort_unstable();
        valid.dedup();
        let lex_mode = match modes {
            [mode] => *mode,
            _ => NO_LEX_MODE,
        };

        let mut examined = position;
        let mut scanned = false;
        if use_scanner {
            if let Some(mut token) =
                self.scan_external(position, &valid, state, &mut examined, &mut scanned)
            {
                token.lex_mode = lex_mode;
                return token;
            }
        }

        let start = self.skip_separators(position, &mut examined);
        let padding = start - position;
        if start >= self.text.len() {
            examined = examined.max(self.text.len() + 1);
            return Token {
                symbol: END,
                padding,
                size: 0,
                lookahead: examined - position,
                lex_mode,
                external: false,
                scanned,
            };
        }

        let allow_immediate = padding == 0;
        let is_valid = |symbol: SymbolId| valid.binary_search(&symbol).is_ok() || table.is_extra(symbol);
        let best = self
            .longest_match(start, allow_immediate, is_valid, &mut examined)
            .or_else(|| self.longest_match(start, allow_immediate, |_| true, &mut examined));

        let (symbol, size) = match best {
            Some(candidate) => (candidate.symbol, candidate.len),
            None => (ERROR, decode_char(self.text, start).map_or(1, |(_, len)| len)),
        };
        examined = examined.max(start + size);

        Token {
            symbol,
            padding,
            size,
            lookahead: examined - position,
            lex_mode,
            external: false,
            scanned,
        }
    }

    fn scan_external(
        &self,
        position: usize,
        valid: &[SymbolId],
        state: &mut ScannerState,
        examined: &mut usize,
        scanned: &mut bool,
    ) -> Option<Token> {
        let scanner = self.language.scanner()?;
        let table = self.language.table();
        let externals = &table.data().externals;
        let flags = externals
            .iter()
            .map(|&symbol| valid.binary_search(&symbol).is_ok() || table.is_extra(symbol))
            .collect();
        let valid_externals = ValidExternals::new(flags);
        if !valid_externals.any() {
            return None;
        }

        *scanned = true;
        let saved = state.clone();
        let mut ctx = ScanContext::new(self.text, position);
        let result = scanner.scan(&mut ctx, &valid_externals, state);
        *examined = (*examined).max(ctx.examined());

        match result {
            Some(token) if valid_externals.contains(token.index) => {
                let start = ctx.token_start();
                let end = ctx.token_end();
                *examined = (*examined).max(end);
                Some(Token {
                    symbol: externals[token.index],
                    padding: start - position,
                    size: end - start,
                    lookahead: *examined - position,
                    lex_mode: NO_LEX_MODE,
                    external: true,
                    scanned: true,
                })
            }
            _ => {
                *state = saved;
                None
            }
        }
    }

    fn skip_separators(&self, mut offset: usize, examined: &mut usize) -> usize {
        let separators = &self.language.table().data().separators;
        loop {
            let len = separators
                .iter()
                .map(|matcher| self.match_len(matcher, offset, examined))
                .max()
                .unwrap_or(0);
            if len == 0 {
                return offset;
            }
            offset += len;
        }
    }

    fn longest_match(
        &self,
        start: usize,
        allow_immediate: bool,
        accept: impl Fn(SymbolId) -> bool,
        examined: &mut usize,
    ) -> Option<Candidate> {
        let table = self.language.table();
        let data = table.data();

        let mut best: Option<Candidate> = None;
        for lexeme in &data.lexemes {
            if !accept(lexeme.symbol) || (lexeme.immediate && !allow_immediate) {
                continue;
            }
            let len = self.match_len(&lexeme.matcher, start, examined);
            if len == 0 {
                continue;
            }
            let candidate = Candidate {
                symbol: lexeme.symbol,
                len,
                literal: lexeme.matcher.is_literal(),
                precedence: lexeme.precedence,
                keyword: lexeme.keyword,
            };
            if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                best = Some(candidate);
            }
        }

        // A keyword that is only a prefix of a longer word is not a keyword.
        let chosen = best?;
        if !chosen.keyword {
            return Some(chosen);
        }
        let Some(word) = data.word.and_then(|w| table.lexeme(w)) else {
            return Some(chosen);
        };
        let len = self.match_len(&word.matcher, start, examined);
        if len > chosen.len {
            return Some(Candidate {
                symbol: word.symbol,
                len,
                literal: word.matcher.is_literal(),
                precedence: word.precedence,
                keyword: false,
            });
        }
        Some(chosen)
    }

    fn match_len(&self, matcher: &Matcher, start: usize, examined: &mut usize) -> usize {
        match matcher {
            Matcher::Literal(literal) => literal_len(literal.as_bytes(), self.text, start, examined),
            Matcher::Pattern { dfa, .. } => dfa_len(self.language.dfa(*dfa), self.text, start, examined),
        }
    }
}

fn touch(examined: &mut usize, offset: usize) {
    if offset > *examined {
        *examined = offset;
    }
}

fn literal_len(literal: &[u8], text: &[u8], start: usize, examined: &mut usize) -> usize {
    for (i, &expected) in literal.iter().enumerate() {
        let offset = start + i;
        let Some(&actual) = text.get(offset) else {
            touch(examined, text.len() + 1);
            return 0;
        };
        touch(examined, offset + 1);
        if actual != expected {
            return 0;
        }
    }
    literal.len()
}

/// Longest match of an anchored DFA at `start`.
///
/// Steps the DFA byte by byte instead of calling a search routine, because
/// the reparser needs to know exactly how far the automaton read.
fn dfa_len(dfa: &Dfa, text: &[u8], start: usize, examined: &mut usize) -> usize {
    let input = Input::new(text).range(start..).anchored(Anchored::Yes);
    let Ok(mut state) = dfa.start_state_forward(&input) else {
        return 0;
    };

    // Matches are reported one byte late: entering a match state after
    // consuming byte `i` means `text[start..start + i]` matched.
    let mut last = 0;
    for (i, &byte) in text[start..].iter().enumerate() {
        state = dfa.next_state(state, byte);
        touch(examined, start + i + 1);
        if dfa.is_special_state(state) {
            if dfa.is_match_state(state) {
                last = i;
            } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                return last;
            }
        }
    }

    touch(examined, text.len() + 1);
    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        last = text.len() - start;
    }
    last
}
