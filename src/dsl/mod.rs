//! Netlist language for describing single-source DC circuits.
//!
//! The netlist is line-oriented and human-editable. Every component has two
//! terminals, each named by a wire; terminals sharing a wire name are
//! electrically the same point.
//!
//! # Grammar Overview
//!
//! ```text
//! circuit     = { line }
//! line        = comment | directive | component | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = ".source" name | ".join" wire wire
//! component   = [keyword] name wire wire [value] { param } [state]
//!
//! keyword     = "BATTERY" | "RESISTOR" | "BULB" | "LAMP" | "SWITCH" | "AMMETER" | "VOLTMETER"
//! wire        = identifier | number | "GND"
//! param       = ("r" | "v" | "i" | "p") '=' (value | "auto")
//! state       = "on" | "off" | "closed" | "open"
//! value       = number [unit_suffix]
//!
//! number      = ['-'|'+'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! identifier  = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! # Component Types
//!
//! Without a keyword the kind comes from the name: multi-character prefixes
//! are tried first, then the first letter.
//!
//! | Prefix | Kind | Bare value sets |
//! |--------|------|-----------------|
//! | B, V | Battery | voltage |
//! | R | Resistor | resistance |
//! | BULB, LAMP, L | Bulb | resistance |
//! | SW, S | Switch | - |
//! | AM, A | Ammeter | resistance |
//! | VM, M | Voltmeter | resistance |
//!
//! # Example
//!
//! ```text
//! # Divider with one fixed drop
//! .source B1
//! B1  top  0    9
//! R1  top  mid  100
//! R2  mid  0    v=3
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a netlist string into an AST.
pub fn parse(input: &str) -> Result<CircuitAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a netlist file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<CircuitAst> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::KirchhoffError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
