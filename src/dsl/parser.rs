//! Parser for the netlist language.

use std::collections::HashMap;

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::components::{ComponentKind, Quantity};
use crate::error::{KirchhoffError, Result};

/// Number of terminals every component has.
const TERMINALS: usize = 2;

/// Parser for netlists.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<CircuitAst> {
        let mut ast = CircuitAst::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => {
                    let component = self.parse_component()?;
                    ast.components.push(component);
                }
                _ => {
                    return Err(KirchhoffError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(KirchhoffError::parse(
                        self.current.line,
                        format!("unexpected trailing token: {:?}", self.current.text),
                    ));
                }
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(KirchhoffError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    /// A wire name may be an identifier (`mid`) or a bare number (`0`).
    fn expect_wire_name(&mut self) -> Result<String> {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Number => {
                let text = normalize_wire(&self.current.text);
                self.advance()?;
                Ok(text)
            }
            _ => Err(KirchhoffError::parse(
                self.current.line,
                format!("expected wire name, got {:?}", self.current.kind),
            )),
        }
    }

    fn parse_directive(&mut self, ast: &mut CircuitAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".source" => {
                let name = self.expect(TokenKind::Identifier)?;
                if let Some(previous) = ast.source.replace(name.text) {
                    return Err(KirchhoffError::parse(
                        line,
                        format!("source already set to '{}'", previous),
                    ));
                }
            }
            ".join" => {
                let a = self.expect_wire_name()?;
                let b = self.expect_wire_name()?;
                ast.joins.push((a, b));
            }
            _ => {
                return Err(KirchhoffError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    fn parse_component(&mut self) -> Result<ComponentDef> {
        let first_token = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        // Full keywords first: `BULB L1 a b` names the component L1.
        let (kind, name) = if let Some(kind) = ComponentKind::from_keyword(&first_token) {
            let actual_name = self.expect(TokenKind::Identifier)?.text;
            (kind, actual_name)
        } else if let Some(kind) = ComponentKind::from_name_prefix(&first_token) {
            (kind, first_token)
        } else {
            let first_char = first_token.chars().next().unwrap_or('?');
            let kind = ComponentKind::from_prefix(first_char).ok_or_else(|| {
                KirchhoffError::UnknownComponentType {
                    component_type: first_token.clone(),
                    line,
                }
            })?;
            (kind, first_token)
        };

        let mut nodes = Vec::with_capacity(TERMINALS);
        while nodes.len() < TERMINALS {
            match self.current.kind {
                TokenKind::Identifier | TokenKind::Number => nodes.push(self.expect_wire_name()?),
                _ => {
                    return Err(KirchhoffError::invalid_component(
                        &name,
                        line,
                        format!("expected {} nodes, got {}", TERMINALS, nodes.len()),
                    ));
                }
            }
        }

        let mut value = None;
        let mut state = None;
        let mut params = HashMap::new();

        while self.current.kind != TokenKind::Newline && self.current.kind != TokenKind::Eof {
            let text = self.current.text.clone();
            match self.current.kind {
                TokenKind::Number => {
                    self.advance()?;
                    let v = parse_value(&text).ok_or_else(|| {
                        KirchhoffError::invalid_component(&name, line, format!("invalid number: {}", text))
                    })?;
                    if value.replace(v).is_some() {
                        return Err(KirchhoffError::invalid_component(
                            &name,
                            line,
                            "more than one bare value",
                        ));
                    }
                }
                TokenKind::Identifier => {
                    self.advance()?;

                    // param=value syntax
                    if self.current.kind == TokenKind::Equals {
                        self.advance()?;
                        let (quantity, param) = self.parse_param(&name, &text)?;
                        params.insert(quantity, param);
                        continue;
                    }

                    state = match text.to_lowercase().as_str() {
                        "on" | "closed" => Some(true),
                        "off" | "open" => Some(false),
                        _ => {
                            return Err(KirchhoffError::invalid_component(
                                &name,
                                line,
                                format!("unexpected token '{}'", text),
                            ));
                        }
                    };
                }
                _ => {
                    return Err(KirchhoffError::parse(
                        line,
                        format!("unexpected token: {:?}", text),
                    ));
                }
            }
        }

        Ok(ComponentDef {
            kind,
            name,
            nodes,
            value,
            state,
            params,
            line,
        })
    }

    fn parse_param(&mut self, component: &str, key: &str) -> Result<(Quantity, ParamValue)> {
        let invalid = |message: String| KirchhoffError::InvalidParameter {
            component: component.to_string(),
            param: key.to_string(),
            message,
        };

        let quantity =
            Quantity::from_key(key).ok_or_else(|| invalid("unknown quantity".to_string()))?;

        let text = self.current.text.clone();
        let param = match self.current.kind {
            TokenKind::Identifier if text.eq_ignore_ascii_case("auto") => ParamValue::Automatic,
            TokenKind::Number => parse_value(&text)
                .map(ParamValue::Fixed)
                .ok_or_else(|| invalid(format!("invalid number: {}", text)))?,
            _ => return Err(invalid(format!("expected a value or 'auto', got {:?}", text))),
        };
        self.advance()?;

        Ok((quantity, param))
    }
}

/// `GND` is an alias of wire `0`.
fn normalize_wire(name: &str) -> String {
    if name.eq_ignore_ascii_case("gnd") {
        "0".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<CircuitAst> {
        super::super::parse(input)
    }

    #[test]
    fn test_parse_resistor() {
        let ast = parse("R1 in out 10k").unwrap();
        assert_eq!(ast.components.len(), 1);
        let r1 = &ast.components[0];
        assert_eq!(r1.kind, ComponentKind::Resistor);
        assert_eq!(r1.name, "R1");
        assert_eq!(r1.nodes, vec!["in", "out"]);
        assert_eq!(r1.value, Some(10_000.0));
    }

    #[test]
    fn test_parse_params_and_auto() {
        let ast = parse("R2 mid GND v=3 i=auto").unwrap();
        let r2 = &ast.components[0];
        assert_eq!(r2.nodes, vec!["mid", "0"]);
        assert_eq!(r2.params[&Quantity::Voltage], ParamValue::Fixed(3.0));
        assert_eq!(r2.params[&Quantity::Current], ParamValue::Automatic);
    }

    #[test]
    fn test_parse_kind_prefixes() {
        let ast = parse("BULB1 a b\nVM1 b c\nSW1 c d on\nBATTERY main d a 9").unwrap();
        let kinds: Vec<_> = ast.components.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Bulb,
                ComponentKind::Voltmeter,
                ComponentKind::Switch,
                ComponentKind::Battery,
            ]
        );
        assert_eq!(ast.components[2].state, Some(true));
        assert_eq!(ast.components[3].name, "main");
    }

    #[test]
    fn test_parse_directives() {
        let ast = parse(".source B2\n.join a b\nB1 x y 1\nB2 a 0 9").unwrap();
        assert_eq!(ast.source.as_deref(), Some("B2"));
        assert_eq!(ast.joins, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_parse_with_comments() {
        let ast = parse("# Divider\nR1 in out 1k ; inline comment\n\n").unwrap();
        assert_eq!(ast.components.len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse("R1 a"),
            Err(KirchhoffError::InvalidComponent { .. })
        ));
        assert!(matches!(
            parse("X1 a b"),
            Err(KirchhoffError::UnknownComponentType { .. })
        ));
        assert!(matches!(
            parse("R1 a b q=4"),
            Err(KirchhoffError::InvalidParameter { .. })
        ));
        assert!(matches!(
            parse(".model D1 D"),
            Err(KirchhoffError::ParseError { .. })
        ));
    }
}
