//! Errors raised while turning a grammar into tables.

use lignum_table::EmitError;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("grammar has no rules")]
    EmptyGrammar,
    #[error("undefined symbol `{name}` referenced from `{rule}`")]
    UndefinedSymbol { name: String, rule: String },
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("token `{0}` matches the empty string")]
    EmptyToken(String),
    #[error("unsupported extra `{0}`: extras must be patterns, strings or lexical rules")]
    UnsupportedExtra(String),
    #[error("unsupported external `{0}`: externals must be symbols or strings")]
    UnsupportedExternal(String),
    #[error("alias `{0}` must wrap a single symbol")]
    UnsupportedAlias(String),
    #[error("`{0}` cannot appear inside a token")]
    UnsupportedTokenRule(String),
    #[error("unknown precedence `{0}`")]
    UnknownPrecedence(String),
    #[error("word token `{0}` must be a lexical rule")]
    InvalidWord(String),
    #[error("rule `{rule}` expands to more than {limit} alternatives")]
    TooManyAlternatives { rule: String, limit: usize },
    #[error("too many symbols: {0} (max 65535)")]
    TooManySymbols(usize),
    #[error("too many parse states: {0}")]
    TooManyStates(usize),
    #[error(transparent)]
    Emit(#[from] EmitError),
}
