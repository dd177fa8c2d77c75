//! JSON deserialization for `grammar.json` files.
//!
//! The format uses internally-tagged enums with a `type` field, e.g.
//! `{ "type": "SEQ", "members": [...] }`.

use indexmap::IndexMap;
use serde::Deserialize;

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

/// Error during grammar decoding.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("binary decode error: {0}")]
    Binary(#[source] postcard::Error),
}

impl Grammar {
    /// Parse grammar from JSON string.
    ///
    /// A missing `extras` key means whitespace extras (`/\s/`), matching the
    /// grammar DSL default. An explicit empty list disables extras.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: RawGrammar = serde_json::from_str(json).map_err(GrammarError::Json)?;
        Ok(raw.into_grammar())
    }
}

#[derive(Debug, Deserialize)]
struct RawGrammar {
    name: String,
    rules: IndexMap<String, RawRule>,
    #[serde(default = "default_extras")]
    extras: Vec<RawRule>,
    #[serde(default)]
    precedences: Vec<Vec<RawPrecedenceEntry>>,
    #[serde(default)]
    conflicts: Vec<Vec<String>>,
    #[serde(default)]
    externals: Vec<RawRule>,
    #[serde(default, rename = "inline")]
    inline_rules: Vec<String>,
    #[serde(default)]
    supertypes: Vec<String>,
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    reserved: IndexMap<String, Vec<RawRule>>,
    #[serde(default)]
    inherits: Option<String>,
}

fn default_extras() -> Vec<RawRule> {
    vec![RawRule::PATTERN {
        value: r"\s".to_owned(),
        flags: None,
    }]
}

impl RawGrammar {
    fn into_grammar(self) -> Grammar {
        fn rules(raw: Vec<RawRule>) -> Vec<Rule> {
            raw.into_iter().map(RawRule::into_rule).collect()
        }

        // IndexMap keeps definition order, so the start rule stays first.
        Grammar {
            name: self.name,
            rules: self
                .rules
                .into_iter()
                .map(|(name, rule)| (name, rule.into_rule()))
                .collect(),
            extras: rules(self.extras),
            precedences: self
                .precedences
                .into_iter()
                .map(|level| level.into_iter().map(RawPrecedenceEntry::into_entry).collect())
                .collect(),
            conflicts: self.conflicts,
            externals: rules(self.externals),
            inline: self.inline_rules,
            supertypes: self.supertypes,
            word: self.word,
            reserved: self
                .reserved
                .into_iter()
                .map(|(context, words)| (context, rules(words)))
                .collect(),
            inherits: self.inherits,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
enum RawRule {
    BLANK,
    STRING {
        value: String,
    },
    PATTERN {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    SYMBOL {
        name: String,
    },
    SEQ {
        members: Vec<RawRule>,
    },
    CHOICE {
        members: Vec<RawRule>,
    },
    REPEAT {
        content: Box<RawRule>,
    },
    REPEAT1 {
        content: Box<RawRule>,
    },
    FIELD {
        name: String,
        content: Box<RawRule>,
    },
    ALIAS {
        content: Box<RawRule>,
        value: String,
        named: bool,
    },
    TOKEN {
        content: Box<RawRule>,
    },
    IMMEDIATE_TOKEN {
        content: Box<RawRule>,
    },
    PREC {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_LEFT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_RIGHT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_DYNAMIC {
        value: i32,
        content: Box<RawRule>,
    },
    RESERVED {
        context_name: String,
        content: Box<RawRule>,
    },
}

impl RawRule {
    fn into_rule(self) -> Rule {
        #[allow(clippy::boxed_local)]
        fn inner(content: Box<RawRule>) -> Box<Rule> {
            Box::new(content.into_rule())
        }

        match self {
            Self::BLANK => Rule::Blank,
            Self::STRING { value } => Rule::String(value),
            Self::PATTERN { value, flags } => Rule::Pattern { value, flags },
            Self::SYMBOL { name } => Rule::Symbol(name),
            Self::SEQ { members } => Rule::Seq(members.into_iter().map(Self::into_rule).collect()),
            Self::CHOICE { members } => {
                Rule::Choice(members.into_iter().map(Self::into_rule).collect())
            }
            Self::REPEAT { content } => Rule::Repeat(inner(content)),
            Self::REPEAT1 { content } => Rule::Repeat1(inner(content)),
            Self::FIELD { name, content } => Rule::Field {
                name,
                content: inner(content),
            },
            Self::ALIAS {
                content,
                value,
                named,
            } => Rule::Alias {
                content: inner(content),
                value,
                named,
            },
            Self::TOKEN { content } => Rule::Token(inner(content)),
            Self::IMMEDIATE_TOKEN { content } => Rule::ImmediateToken(inner(content)),
            Self::PREC { value, content } => Rule::Prec {
                value: value.into(),
                content: inner(content),
            },
            Self::PREC_LEFT { value, content } => Rule::PrecLeft {
                value: value.into(),
                content: inner(content),
            },
            Self::PREC_RIGHT { value, content } => Rule::PrecRight {
                value: value.into(),
                content: inner(content),
            },
            Self::PREC_DYNAMIC { value, content } => Rule::PrecDynamic {
                value,
                content: inner(content),
            },
            Self::RESERVED {
                context_name,
                content,
            } => Rule::Reserved {
                context_name,
                content: inner(content),
            },
        }
    }
}

/// Precedence is either an integer or a level name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrecedence {
    Integer(i32),
    Name(String),
}

impl From<RawPrecedence> for Precedence {
    fn from(raw: RawPrecedence) -> Self {
        match raw {
            RawPrecedence::Integer(n) => Precedence::Integer(n),
            RawPrecedence::Name(s) => Precedence::Name(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms)]
enum RawPrecedenceEntry {
    STRING { value: String },
    SYMBOL { name: String },
}

impl RawPrecedenceEntry {
    fn into_entry(self) -> PrecedenceEntry {
        match self {
            Self::STRING { value } => PrecedenceEntry::Name(value),
            Self::SYMBOL { name } => PrecedenceEntry::Symbol(name),
        }
    }
}
