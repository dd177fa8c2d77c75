//! Table-driven lexing.

mod lexer;


pub(crate) use lexer::{Lexer, NO_LEX_MODE, Token};
