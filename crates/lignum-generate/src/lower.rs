//! Lowering of grammar rules into flat productions and token definitions.
//!
//! Rules whose body is purely lexical (strings, patterns, `token(...)`) become
//! terminals. Every other rule becomes a nonterminal whose body is expanded
//! into a list of alternatives, each a flat sequence of steps. Repetitions
//! introduce hidden left-recursive auxiliary nonterminals.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use lignum_core::{Grammar, Interner, Name, Precedence, PrecedenceEntry, Rule};

use crate::dfa;
use crate::{GenerateError, GenerateOptions};

/// Name of the augmented start nonterminal.
pub(crate) const START: &str = "_start";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SymRef {
    Terminal(usize),
    External(usize),
    NonTerminal(usize),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TokenPattern {
    Literal(String),
    Regex(String),
}

impl TokenPattern {
    pub fn regex(&self) -> String {
        match self {
            Self::Literal(text) => regex_syntax::escape(text),
            Self::Regex(source) => source.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TerminalDef {
    pub name: String,
    pub named: bool,
    pub visible: bool,
    pub pattern: TokenPattern,
    pub precedence: i32,
    pub immediate: bool,
    pub keyword: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct ExternalDef {
    pub name: String,
    pub named: bool,
    pub visible: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct NonTerminalDef {
    pub name: String,
    pub visible: bool,
    pub auxiliary: bool,
    /// Grammar rule this nonterminal was produced from.
    pub origin: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FlatStep {
    pub symbol: SymRef,
    pub field: Option<usize>,
    pub alias: Option<usize>,
    pub precedence: i32,
    pub assoc: Assoc,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FlatProduction {
    pub lhs: usize,
    pub steps: Vec<FlatStep>,
    pub dynamic_precedence: i32,
}

/// Grammar after lowering. Production 0 is `_start -> <first rule>`.
#[derive(Debug)]
pub(crate) struct LoweredGrammar {
    pub name: String,
    pub terminals: Vec<TerminalDef>,
    pub externals: Vec<ExternalDef>,
    pub nonterminals: Vec<NonTerminalDef>,
    pub aliases: Vec<(String, bool)>,
    pub fields: Vec<String>,
    pub productions: Vec<FlatProduction>,
    pub separators: Vec<TokenPattern>,
    pub extras: Vec<SymRef>,
    pub word: Option<usize>,
    pub expected_conflicts: Vec<Vec<String>>,
}

pub(crate) fn lower(
    grammar: &Grammar,
    options: &GenerateOptions,
) -> Result<LoweredGrammar, GenerateError> {
    if grammar.rules.is_empty() {
        return Err(GenerateError::EmptyGrammar);
    }

    let mut lowerer = Lowerer::new(grammar, options);
    lowerer.declare_externals()?;
    lowerer.declare_rules()?;
    let (separators, extras) = lowerer.lower_extras()?;
    lowerer.lower_rules()?;
    lowerer.add_start();
    let word = lowerer.mark_keywords()?;

    Ok(LoweredGrammar {
        name: grammar.name.clone(),
        terminals: lowerer.terminals,
        externals: lowerer.externals,
        nonterminals: lowerer.nonterminals,
        aliases: lowerer.aliases.into_iter().collect(),
        fields: lowerer.fields.into_iter().collect(),
        productions: lowerer.productions,
        separators,
        extras,
        word,
        expected_conflicts: grammar.conflicts.clone(),
    })
}

fn is_lexical(rule: &Rule) -> bool {
    match rule {
        Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_) | Rule::ImmediateToken(_) => true,
        Rule::Prec { content, .. } | Rule::PrecLeft { content, .. } | Rule::PrecRight { content, .. } => {
            is_lexical(content)
        }
        _ => false,
    }
}

fn precedence_levels(lists: &[Vec<PrecedenceEntry>]) -> HashMap<String, i32> {
    let mut levels = HashMap::new();
    for list in lists {
        let len = list.len();
        for (i, entry) in list.iter().enumerate() {
            if let PrecedenceEntry::Name(name) = entry {
                levels.entry(name.clone()).or_insert((len - i) as i32);
            }
        }
    }
    levels
}

fn strongest(a: i32, b: i32) -> i32 {
    if b.abs() > a.abs() { b } else { a }
}

struct TokenShape {
    pattern: TokenPattern,
    precedence: i32,
    immediate: bool,
}

/// Lowering state inherited from enclosing rule wrappers.
#[derive(Clone, Copy, Debug, Default)]
struct Context {
    field: Option<usize>,
    alias: Option<usize>,
    precedence: i32,
    assoc: Assoc,
}

impl Context {
    fn step(self, symbol: SymRef) -> FlatStep {
        FlatStep {
            symbol,
            field: self.field,
            alias: self.alias,
            precedence: self.precedence,
            assoc: self.assoc,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Alt {
    steps: Vec<FlatStep>,
    dynamic_precedence: i32,
}

impl Alt {
    fn single(step: FlatStep) -> Self {
        Self {
            steps: vec![step],
            dynamic_precedence: 0,
        }
    }

    fn concat(&self, other: &Alt) -> Alt {
        let mut steps = Vec::with_capacity(self.steps.len() + other.steps.len());
        steps.extend(self.steps.iter().cloned());
        steps.extend(other.steps.iter().cloned());
        Alt {
            steps,
            dynamic_precedence: strongest(self.dynamic_precedence, other.dynamic_precedence),
        }
    }
}

/// Per-rule counters for generated names.
struct Scope {
    name: String,
    tokens: usize,
    repeats: usize,
}

struct Lowerer<'g> {
    grammar: &'g Grammar,
    max_alternatives: usize,
    interner: Interner,
    refs: HashMap<Name, SymRef>,
    levels: HashMap<String, i32>,
    hidden_rules: HashSet<&'g str>,
    terminals: Vec<TerminalDef>,
    token_keys: HashMap<(TokenPattern, bool), usize>,
    externals: Vec<ExternalDef>,
    external_literals: HashMap<String, usize>,
    nonterminals: Vec<NonTerminalDef>,
    aliases: IndexSet<(String, bool)>,
    fields: IndexSet<String>,
    productions: Vec<FlatProduction>,
    seen: HashSet<FlatProduction>,
}

impl<'g> Lowerer<'g> {
    fn new(grammar: &'g Grammar, options: &GenerateOptions) -> Self {
        let hidden_rules = grammar
            .inline
            .iter()
            .chain(&grammar.supertypes)
            .map(String::as_str)
            .collect();

        Self {
            grammar,
            max_alternatives: options.max_alternatives,
            interner: Interner::new(),
            refs: HashMap::new(),
            levels: precedence_levels(&grammar.precedences),
            hidden_rules,
            terminals: Vec::new(),
            token_keys: HashMap::new(),
            externals: Vec::new(),
            external_literals: HashMap::new(),
            nonterminals: Vec::new(),
            aliases: IndexSet::new(),
            fields: IndexSet::new(),
            productions: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<SymRef> {
        self.interner
            .get(name)
            .and_then(|n| self.refs.get(&n).copied())
    }

    fn bind(&mut self, name: &str, symbol: SymRef) -> bool {
        let n = self.interner.intern(name);
        if self.refs.contains_key(&n) {
            return false;
        }
        self.refs.insert(n, symbol);
        true
    }

    fn resolve(&self, precedence: &Precedence) -> Result<i32, GenerateError> {
        match precedence {
            Precedence::Integer(value) => Ok(*value),
            Precedence::Name(name) => self
                .levels
                .get(name)
                .copied()
                .ok_or_else(|| GenerateError::UnknownPrecedence(name.clone())),
        }
    }

    fn declare_externals(&mut self) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        for rule in &grammar.externals {
            let index = self.externals.len();
            match rule {
                Rule::Symbol(name) => {
                    self.externals.push(ExternalDef {
                        name: name.clone(),
                        named: true,
                        visible: !name.starts_with('_'),
                    });
                    self.bind(name, SymRef::External(index));
                }
                Rule::String(text) => {
                    self.externals.push(ExternalDef {
                        name: text.clone(),
                        named: false,
                        visible: true,
                    });
                    self.external_literals.insert(text.clone(), index);
                }
                other => return Err(GenerateError::UnsupportedExternal(format!("{other:?}"))),
            }
        }
        Ok(())
    }

    /// Assign every rule to a terminal or nonterminal, in declaration order.
    fn declare_rules(&mut self) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        for (name, body) in &grammar.rules {
            if self.lookup(name).is_some() {
                continue;
            }
            if is_lexical(body) {
                let shape = self.token_shape(name, body)?;
                let index = self.push_terminal(TerminalDef {
                    name: name.clone(),
                    named: true,
                    visible: !name.starts_with('_'),
                    pattern: shape.pattern,
                    precedence: shape.precedence,
                    immediate: shape.immediate,
                    keyword: false,
                });
                self.bind(name, SymRef::Terminal(index));
            } else {
                let index = self.nonterminals.len();
                let hidden = name.starts_with('_') || self.hidden_rules.contains(name.as_str());
                self.nonterminals.push(NonTerminalDef {
                    name: name.clone(),
                    visible: !hidden,
                    auxiliary: false,
                    origin: name.clone(),
                });
                self.bind(name, SymRef::NonTerminal(index));
            }
        }
        Ok(())
    }

    fn lower_extras(&mut self) -> Result<(Vec<TokenPattern>, Vec<SymRef>), GenerateError> {
        let mut separators = Vec::new();
        let mut extras = Vec::new();

        let grammar = self.grammar;
        for rule in &grammar.extras {
            match rule {
                Rule::Symbol(name) => match self.lookup(name) {
                    Some(symbol @ (SymRef::Terminal(_) | SymRef::External(_))) => {
                        if !extras.contains(&symbol) {
                            extras.push(symbol);
                        }
                    }
                    Some(SymRef::NonTerminal(_)) => {
                        return Err(GenerateError::UnsupportedExtra(name.clone()));
                    }
                    None => {
                        return Err(GenerateError::UndefinedSymbol {
                            name: name.clone(),
                            rule: "extras".to_string(),
                        });
                    }
                },
                lexical if is_lexical(lexical) => {
                    let shape = self.token_shape("extras", lexical)?;
                    if !separators.contains(&shape.pattern) {
                        separators.push(shape.pattern);
                    }
                }
                other => return Err(GenerateError::UnsupportedExtra(format!("{other:?}"))),
            }
        }

        Ok((separators, extras))
    }

    fn lower_rules(&mut self) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        let mut lowered = HashSet::new();
        for (name, body) in &grammar.rules {
            let Some(SymRef::NonTerminal(lhs)) = self.lookup(name) else {
                continue;
            };
            if !lowered.insert(lhs) {
                continue;
            }
            let mut scope = Scope {
                name: name.clone(),
                tokens: 0,
                repeats: 0,
            };
            let alts = self.flatten(&mut scope, body, Context::default())?;
            for alt in alts {
                self.add_production(lhs, alt);
            }
        }
        Ok(())
    }

    fn add_start(&mut self) {
        // The start rule always resolves: every rule was bound in `declare_rules`.
        let grammar = self.grammar;
        let Some(start) = grammar.start_rule().and_then(|name| self.lookup(name)) else {
            return;
        };
        let lhs = self.nonterminals.len();
        self.nonterminals.push(NonTerminalDef {
            name: START.to_string(),
            visible: false,
            auxiliary: true,
            origin: START.to_string(),
        });
        self.productions.insert(
            0,
            FlatProduction {
                lhs,
                steps: vec![Context::default().step(start)],
                dynamic_precedence: 0,
            },
        );
    }

    /// Mark anonymous literals that the word token also matches.
    fn mark_keywords(&mut self) -> Result<Option<usize>, GenerateError> {
        let grammar = self.grammar;
        let Some(word) = &grammar.word else {
            return Ok(None);
        };
        let Some(SymRef::Terminal(index)) = self.lookup(word) else {
            return Err(GenerateError::InvalidWord(word.clone()));
        };

        let word_dfa = dfa::compile(&self.terminals[index].pattern.regex())?;
        for terminal in &mut self.terminals {
            if terminal.named || terminal.immediate {
                continue;
            }
            if let TokenPattern::Literal(text) = &terminal.pattern {
                terminal.keyword = dfa::matches_fully(&word_dfa, text.as_bytes());
            }
        }
        Ok(Some(index))
    }

    fn push_terminal(&mut self, terminal: TerminalDef) -> usize {
        self.terminals.push(terminal);
        self.terminals.len() - 1
    }

    fn add_production(&mut self, lhs: usize, alt: Alt) {
        let production = FlatProduction {
            lhs,
            steps: alt.steps,
            dynamic_precedence: alt.dynamic_precedence,
        };
        if self.seen.insert(production.clone()) {
            self.productions.push(production);
        }
    }

    fn check_alternatives(&self, scope: &Scope, count: usize) -> Result<(), GenerateError> {
        if count > self.max_alternatives {
            return Err(GenerateError::TooManyAlternatives {
                rule: scope.name.clone(),
                limit: self.max_alternatives,
            });
        }
        Ok(())
    }

    fn flatten(
        &mut self,
        scope: &mut Scope,
        rule: &Rule,
        ctx: Context,
    ) -> Result<Vec<Alt>, GenerateError> {
        match rule {
            Rule::Blank => Ok(vec![Alt::default()]),
            Rule::Symbol(name) => {
                let symbol = self.lookup(name).ok_or_else(|| GenerateError::UndefinedSymbol {
                    name: name.clone(),
                    rule: scope.name.clone(),
                })?;
                Ok(vec![Alt::single(ctx.step(symbol))])
            }
            Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_) | Rule::ImmediateToken(_) => {
                let symbol = self.anonymous_token(scope, rule)?;
                Ok(vec![Alt::single(ctx.step(symbol))])
            }
            Rule::Seq(members) => {
                let mut acc = vec![Alt::default()];
                for member in members {
                    let alts = self.flatten(scope, member, ctx)?;
                    self.check_alternatives(scope, acc.len().saturating_mul(alts.len()))?;
                    acc = acc
                        .iter()
                        .flat_map(|prefix| alts.iter().map(move |suffix| prefix.concat(suffix)))
                        .collect();
                }
                Ok(acc)
            }
            Rule::Choice(members) => {
                let mut out: Vec<Alt> = Vec::new();
                for member in members {
                    for alt in self.flatten(scope, member, ctx)? {
                        if !out.contains(&alt) {
                            out.push(alt);
                        }
                    }
                    self.check_alternatives(scope, out.len())?;
                }
                Ok(out)
            }
            Rule::Repeat(content) => {
                let aux = self.repeat_aux(scope, content, ctx)?;
                Ok(vec![Alt::default(), Alt::single(ctx.step(aux))])
            }
            Rule::Repeat1(content) => {
                let aux = self.repeat_aux(scope, content, ctx)?;
                Ok(vec![Alt::single(ctx.step(aux))])
            }
            Rule::Field { name, content } => {
                let (field, _) = self.fields.insert_full(name.clone());
                let inner = Context {
                    field: Some(field),
                    ..ctx
                };
                self.flatten(scope, content, inner)
            }
            Rule::Alias {
                content,
                value,
                named,
            } => {
                let (alias, _) = self.aliases.insert_full((value.clone(), *named));
                let inner = Context {
                    alias: Some(alias),
                    ..ctx
                };
                let alts = self.flatten(scope, content, inner)?;
                if alts.iter().any(|alt| alt.steps.len() > 1) {
                    return Err(GenerateError::UnsupportedAlias(value.clone()));
                }
                Ok(alts)
            }
            Rule::Prec { value, content } => {
                let inner = Context {
                    precedence: self.resolve(value)?,
                    assoc: Assoc::None,
                    ..ctx
                };
                self.flatten(scope, content, inner)
            }
            Rule::PrecLeft { value, content } => {
                let inner = Context {
                    precedence: self.resolve(value)?,
                    assoc: Assoc::Left,
                    ..ctx
                };
                self.flatten(scope, content, inner)
            }
            Rule::PrecRight { value, content } => {
                let inner = Context {
                    precedence: self.resolve(value)?,
                    assoc: Assoc::Right,
                    ..ctx
                };
                self.flatten(scope, content, inner)
            }
            Rule::PrecDynamic { value, content } => {
                let mut alts = self.flatten(scope, content, ctx)?;
                for alt in &mut alts {
                    alt.dynamic_precedence = strongest(*value, alt.dynamic_precedence);
                }
                Ok(alts)
            }
            Rule::Reserved { content, .. } => self.flatten(scope, content, ctx),
        }
    }

    /// Create `aux -> aux content | content` and return `aux`.
    fn repeat_aux(
        &mut self,
        scope: &mut Scope,
        content: &Rule,
        ctx: Context,
    ) -> Result<SymRef, GenerateError> {
        scope.repeats += 1;
        let index = self.nonterminals.len();
        self.nonterminals.push(NonTerminalDef {
            name: format!("{}_repeat{}", scope.name, scope.repeats),
            visible: false,
            auxiliary: true,
            origin: scope.name.clone(),
        });
        let aux = SymRef::NonTerminal(index);

        let inner = Context {
            field: None,
            alias: None,
            ..ctx
        };
        let recursive = inner.step(aux);
        for alt in self.flatten(scope, content, inner)? {
            // `aux -> aux` would be a unit cycle.
            if !alt.steps.is_empty() {
                let mut steps = Vec::with_capacity(alt.steps.len() + 1);
                steps.push(recursive.clone());
                steps.extend(alt.steps.iter().cloned());
                self.add_production(
                    index,
                    Alt {
                        steps,
                        dynamic_precedence: alt.dynamic_precedence,
                    },
                );
            }
            self.add_production(index, alt);
        }
        Ok(aux)
    }

    fn anonymous_token(&mut self, scope: &mut Scope, rule: &Rule) -> Result<SymRef, GenerateError> {
        let shape = self.token_shape(&scope.name, rule)?;

        if let TokenPattern::Literal(text) = &shape.pattern {
            if !shape.immediate {
                if let Some(&index) = self.external_literals.get(text) {
                    return Ok(SymRef::External(index));
                }
            }
        }

        let key = (shape.pattern.clone(), shape.immediate);
        if let Some(&index) = self.token_keys.get(&key) {
            return Ok(SymRef::Terminal(index));
        }

        let (name, named, visible) = match &shape.pattern {
            TokenPattern::Literal(text) => (text.clone(), false, true),
            TokenPattern::Regex(_) => {
                scope.tokens += 1;
                (format!("{}_token{}", scope.name, scope.tokens), true, false)
            }
        };
        let index = self.push_terminal(TerminalDef {
            name,
            named,
            visible,
            pattern: shape.pattern,
            precedence: shape.precedence,
            immediate: shape.immediate,
            keyword: false,
        });
        self.token_keys.insert(key, index);
        Ok(SymRef::Terminal(index))
    }

    fn token_shape(&self, owner: &str, rule: &Rule) -> Result<TokenShape, GenerateError> {
        let mut precedence = None;
        let mut immediate = false;
        let mut current = rule;
        loop {
            match current {
                Rule::Prec { value, content }
                | Rule::PrecLeft { value, content }
                | Rule::PrecRight { value, content } => {
                    if precedence.is_none() {
                        precedence = Some(self.resolve(value)?);
                    }
                    current = content;
                }
                Rule::Token(content) => current = content,
                Rule::ImmediateToken(content) => {
                    immediate = true;
                    current = content;
                }
                _ => break,
            }
        }

        let pattern = match current {
            Rule::String(text) => TokenPattern::Literal(text.clone()),
            other => TokenPattern::Regex(self.token_regex(other)?),
        };

        match &pattern {
            TokenPattern::Literal(text) if text.is_empty() => {
                return Err(GenerateError::EmptyToken(owner.to_string()));
            }
            TokenPattern::Literal(_) => {}
            TokenPattern::Regex(source) => {
                if dfa::matches_empty(&dfa::compile(source)?) {
                    return Err(GenerateError::EmptyToken(owner.to_string()));
                }
            }
        }

        Ok(TokenShape {
            pattern,
            precedence: precedence.unwrap_or(0),
            immediate,
        })
    }

    fn token_regex(&self, rule: &Rule) -> Result<String, GenerateError> {
        Ok(match rule {
            Rule::Blank => String::new(),
            Rule::String(text) => regex_syntax::escape(text),
            Rule::Pattern { value, flags } => {
                if flags.as_deref().is_some_and(|f| f.contains('i')) {
                    format!("(?i:{value})")
                } else {
                    format!("(?:{value})")
                }
            }
            Rule::Seq(members) => members
                .iter()
                .map(|m| self.token_regex(m))
                .collect::<Result<Vec<_>, _>>()?
                .concat(),
            Rule::Choice(members) => {
                let parts = members
                    .iter()
                    .map(|m| self.token_regex(m))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("(?:{})", parts.join("|"))
            }
            Rule::Repeat(content) => format!("(?:{})*", self.token_regex(content)?),
            Rule::Repeat1(content) => format!("(?:{})+", self.token_regex(content)?),
            Rule::Token(content)
            | Rule::ImmediateToken(content)
            | Rule::Prec { content, .. }
            | Rule::PrecLeft { content, .. }
            | Rule::PrecRight { content, .. }
            | Rule::PrecDynamic { content, .. }
            | Rule::Reserved { content, .. } => self.token_regex(content)?,
            Rule::Symbol(name) => return Err(GenerateError::UnsupportedTokenRule(name.clone())),
            Rule::Field { name, .. } => {
                return Err(GenerateError::UnsupportedTokenRule(format!("field `{name}`")));
            }
            Rule::Alias { value, .. } => {
                return Err(GenerateError::UnsupportedTokenRule(format!("alias `{value}`")));
            }
        })
    }
}
