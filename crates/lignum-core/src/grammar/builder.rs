//! Builder DSL mirroring the `grammar.js` helper functions.
//!
//! ```
//! use lignum_core::{Grammar, Rule};
//!
//! let grammar = Grammar::new("parens")
//!     .rule("expr", Rule::seq([Rule::string("("), Rule::sym("number"), Rule::string(")")]))
//!     .rule("number", Rule::pattern(r"\d+"));
//! assert_eq!(grammar.start_rule(), Some("expr"));
//! ```

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

impl Rule {
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn pattern(value: impl Into<String>) -> Self {
        Self::Pattern {
            value: value.into(),
            flags: None,
        }
    }

    /// Pattern with regex flags (only `i` is honored).
    pub fn pattern_with_flags(value: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::Pattern {
            value: value.into(),
            flags: Some(flags.into()),
        }
    }

    pub fn seq(members: impl IntoIterator<Item = Rule>) -> Self {
        Self::Seq(members.into_iter().collect())
    }

    pub fn choice(members: impl IntoIterator<Item = Rule>) -> Self {
        Self::Choice(members.into_iter().collect())
    }

    /// `optional(x)` is `choice(x, blank)`.
    pub fn optional(content: Rule) -> Self {
        Self::Choice(vec![content, Self::Blank])
    }

    pub fn repeat(content: Rule) -> Self {
        Self::Repeat(Box::new(content))
    }

    pub fn repeat1(content: Rule) -> Self {
        Self::Repeat1(Box::new(content))
    }

    pub fn field(name: impl Into<String>, content: Rule) -> Self {
        Self::Field {
            name: name.into(),
            content: Box::new(content),
        }
    }

    pub fn alias(content: Rule, value: impl Into<String>, named: bool) -> Self {
        Self::Alias {
            content: Box::new(content),
            value: value.into(),
            named,
        }
    }

    pub fn token(content: Rule) -> Self {
        Self::Token(Box::new(content))
    }

    pub fn immediate_token(content: Rule) -> Self {
        Self::ImmediateToken(Box::new(content))
    }

    pub fn prec(value: impl Into<Precedence>, content: Rule) -> Self {
        Self::Prec {
            value: value.into(),
            content: Box::new(content),
        }
    }

    pub fn prec_left(value: impl Into<Precedence>, content: Rule) -> Self {
        Self::PrecLeft {
            value: value.into(),
            content: Box::new(content),
        }
    }

    pub fn prec_right(value: impl Into<Precedence>, content: Rule) -> Self {
        Self::PrecRight {
            value: value.into(),
            content: Box::new(content),
        }
    }

    pub fn prec_dynamic(value: i32, content: Rule) -> Self {
        Self::PrecDynamic {
            value,
            content: Box::new(content),
        }
    }

    /// `sep1(x, ",")`: one or more `x` separated by `sep`.
    pub fn sep1(content: Rule, separator: Rule) -> Self {
        Self::seq([
            content.clone(),
            Self::repeat(Self::seq([separator, content])),
        ])
    }
}

impl From<i32> for Precedence {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Precedence {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

impl Grammar {
    /// Empty grammar with whitespace extras, like the `grammar()` DSL default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            extras: vec![Rule::pattern(r"\s")],
            precedences: Vec::new(),
            conflicts: Vec::new(),
            externals: Vec::new(),
            inline: Vec::new(),
            supertypes: Vec::new(),
            word: None,
            reserved: Vec::new(),
            inherits: None,
        }
    }

    /// Append a rule. The first rule added is the start rule.
    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// Replace the extras list.
    pub fn extras(mut self, extras: impl IntoIterator<Item = Rule>) -> Self {
        self.extras = extras.into_iter().collect();
        self
    }

    pub fn external(mut self, token: Rule) -> Self {
        self.externals.push(token);
        self
    }

    pub fn word(mut self, name: impl Into<String>) -> Self {
        self.word = Some(name.into());
        self
    }

    pub fn conflict(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.conflicts
            .push(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn inline(mut self, name: impl Into<String>) -> Self {
        self.inline.push(name.into());
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    /// Declare one precedence ordering, highest level first.
    pub fn precedence_levels(mut self, levels: impl IntoIterator<Item = PrecedenceEntry>) -> Self {
        self.precedences.push(levels.into_iter().collect());
        self
    }
}
