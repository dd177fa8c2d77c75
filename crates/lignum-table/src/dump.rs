//! Human-readable grammar table listing.

use std::fmt::Write as _;

use super::data::{Action, Matcher, SymbolId, SymbolKind};
use super::table::GrammarTable;

impl GrammarTable {
    /// Render every section of the table as text.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let data = self.data();
        let name = |id: SymbolId| self.display_symbol(id);

        let _ = writeln!(out, "grammar {} (abi {})", data.name, self.header().version);

        out.push_str("\n[symbols]\n");
        for (id, info) in data.symbols.iter().enumerate() {
            let kind = match info.kind {
                SymbolKind::End => "end",
                SymbolKind::Error => "error",
                SymbolKind::Terminal => "terminal",
                SymbolKind::External => "external",
                SymbolKind::NonTerminal => "nonterminal",
                SymbolKind::Auxiliary => "auxiliary",
                SymbolKind::Alias => "alias",
            };
            let hidden = if info.visible { "" } else { " hidden" };
            let _ = writeln!(out, "{id:>3} {} {kind}{hidden}", name(id as SymbolId));
        }

        if !data.fields.is_empty() {
            out.push_str("\n[fields]\n");
            for (id, field) in data.fields.iter().enumerate() {
                let _ = writeln!(out, "{id:>3} {field}");
            }
        }

        out.push_str("\n[lexemes]\n");
        for lexeme in &data.lexemes {
            let _ = write!(out, "{} = {}", name(lexeme.symbol), display_matcher(&lexeme.matcher));
            if lexeme.precedence != 0 {
                let _ = write!(out, " prec={}", lexeme.precedence);
            }
            if lexeme.immediate {
                out.push_str(" immediate");
            }
            if lexeme.keyword {
                out.push_str(" keyword");
            }
            out.push('\n');
        }

        if !data.separators.is_empty() || !data.extras.is_empty() {
            out.push_str("\n[extras]\n");
            for sep in &data.separators {
                let _ = writeln!(out, "skip {}", display_matcher(sep));
            }
            for &extra in &data.extras {
                let _ = writeln!(out, "keep {}", name(extra));
            }
        }

        if let Some(word) = data.word {
            let _ = writeln!(out, "\n[word]\n{}", name(word));
        }

        if !data.externals.is_empty() {
            out.push_str("\n[externals]\n");
            for (i, &ext) in data.externals.iter().enumerate() {
                let _ = writeln!(out, "{i:>3} {}", name(ext));
            }
        }

        out.push_str("\n[productions]\n");
        for (i, p) in data.productions.iter().enumerate() {
            let _ = write!(out, "{i:>3} {} ->", name(p.lhs));
            if p.steps.is_empty() {
                out.push_str(" ε");
            }
            for step in &p.steps {
                out.push(' ');
                if let Some(field) = step.field.and_then(|f| self.field_name(f)) {
                    let _ = write!(out, "{field}:");
                }
                out.push_str(&name(step.symbol));
                if let Some(alias) = step.alias {
                    let _ = write!(out, "@{}", name(alias));
                }
            }
            if p.dynamic_precedence != 0 {
                let _ = write!(out, " dyn={}", p.dynamic_precedence);
            }
            out.push('\n');
        }

        out.push_str("\n[lex modes]\n");
        for (i, mode) in data.lex_modes.iter().enumerate() {
            let terminals: Vec<_> = mode.terminals.iter().map(|&t| name(t)).collect();
            let listed = if terminals.is_empty() {
                "-".to_owned()
            } else {
                terminals.join(" ")
            };
            let _ = writeln!(out, "{i:>3} {listed}");
        }

        out.push_str("\n[states]\n");
        for (i, state) in data.states.iter().enumerate() {
            let start = if i as u32 == data.start_state { " start" } else { "" };
            let _ = writeln!(out, "{i:>3} mode={}{start}", state.lex_mode);
            for entry in &state.actions {
                let actions: Vec<_> = entry.actions.iter().map(display_action).collect();
                let _ = writeln!(out, "      {} {}", name(entry.symbol), actions.join(" | "));
            }
            for &(symbol, target) in &state.gotos {
                let _ = writeln!(out, "      {} goto {target}", name(symbol));
            }
        }

        out
    }

    /// Symbol name as shown in dumps: anonymous symbols are quoted.
    pub fn display_symbol(&self, id: SymbolId) -> String {
        match self.data().symbols.get(id as usize) {
            Some(info) if info.named => info.name.clone(),
            Some(info) => format!("{:?}", info.name),
            None => format!("#{id}"),
        }
    }
}

fn display_matcher(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Literal(text) => format!("{text:?}"),
        Matcher::Pattern { source, .. } => format!("/{source}/"),
    }
}

fn display_action(action: &Action) -> String {
    match action {
        Action::Shift(state) => format!("shift {state}"),
        Action::ShiftExtra => "extra".to_owned(),
        Action::Reduce(production) => format!("reduce {production}"),
        Action::Accept => "accept".to_owned(),
    }
}
