//! Grammar description consumed by the table generator.
//!
//! Mirrors the shape of a `grammar.json` file. Rule order matters: the first
//! entry of [`Grammar::rules`] is the start rule, and terminals are numbered
//! in the order the generator first meets them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    /// Becomes the table name and `Language::name`.
    pub name: String,
    pub rules: Vec<(String, Rule)>,
    /// Tokens allowed between any two tokens. Bare patterns and strings are
    /// skipped as padding, symbol references are kept in the tree.
    #[serde(default)]
    pub extras: Vec<Rule>,
    /// Named precedence levels, highest first within each list.
    #[serde(default)]
    pub precedences: Vec<Vec<PrecedenceEntry>>,
    /// Rule groups whose LR conflicts are expected and left to the GLR engine.
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,
    /// Tokens produced by an external scanner, in scanner index order.
    #[serde(default)]
    pub externals: Vec<Rule>,
    /// Rules spliced into their parents.
    #[serde(default)]
    pub inline: Vec<String>,
    /// Hidden rules that only group alternatives.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Token that keyword literals yield to on a longer match.
    #[serde(default)]
    pub word: Option<String>,
    /// Parsed for completeness; the generator does not enforce them.
    #[serde(default)]
    pub reserved: Vec<(String, Vec<Rule>)>,
    #[serde(default)]
    pub inherits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    /// Matches nothing.
    Blank,
    /// Anonymous literal terminal.
    String(String),
    /// Regex terminal. `flags: Some("i")` makes it case-insensitive.
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    Symbol(String),
    Seq(Vec<Rule>),
    /// Unresolved overlaps between members fork at parse time.
    Choice(Vec<Rule>),
    /// Lowered to a hidden left-recursive helper rule.
    Repeat(Box<Rule>),
    Repeat1(Box<Rule>),
    /// Labels the child produced by `content`.
    Field { name: String, content: Box<Rule> },
    /// Renames the node produced by `content`; `named` controls visibility
    /// in s-expressions.
    Alias {
        content: Box<Rule>,
        value: String,
        named: bool,
    },
    /// Collapses `content` into a single terminal.
    Token(Box<Rule>),
    /// Like `Token`, but only valid without leading padding.
    ImmediateToken(Box<Rule>),
    /// Static precedence for conflict resolution and lexer ties.
    Prec {
        value: Precedence,
        content: Box<Rule>,
    },
    PrecLeft {
        value: Precedence,
        content: Box<Rule>,
    },
    PrecRight {
        value: Precedence,
        content: Box<Rule>,
    },
    /// Runtime tie-break between GLR versions that reach the same state.
    PrecDynamic { value: i32, content: Box<Rule> },
    Reserved {
        context_name: String,
        content: Box<Rule>,
    },
}

/// Either a literal level or a name looked up in [`Grammar::precedences`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precedence {
    Integer(i32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecedenceEntry {
    Name(String),
    Symbol(String),
}

impl Grammar {
    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.rules.first().map(|(n, _)| n.as_str())
    }
}
