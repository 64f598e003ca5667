use super::lexer::{tokenize, Token, TokenKind};
use crate::tree::{is_range_operator, FilterCondition, FilterGroup, FilterNode, Join};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error at position {pos}: '#)' without a matching '#('")]
    UnmatchedClose { pos: usize },

    #[error("Parse error at position {pos}: group already joined with {expected}, found {found}")]
    MixedJoin {
        expected: Join,
        found: Join,
        pos: usize,
    },

    #[error("Parse error at position {pos}: expected a join before the next condition")]
    MissingJoin { pos: usize },

    #[error("Parse error at position {pos}: join must follow a condition or group")]
    LeadingJoin { pos: usize },

    #[error("Parse error at position {pos}: column '{field}' has no operator")]
    MissingOperator { field: String, pos: usize },

    #[error("Parse error at position {pos}: value without a column")]
    UnexpectedValue { pos: usize },

    #[error("Parse error at position {pos}: '#to' after non-range operator '{operator}'")]
    UnexpectedRangeBound { operator: String, pos: usize },
}

/// Builds a filter tree from a text pattern.
///
/// In-progress tails are accepted: selector markers and `##` are skipped,
/// the last condition may lack a value and open groups need not be closed.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: tokenize(input),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<Arc<FilterGroup>, ParseError> {
        let root = self.parse_group(0)?;
        Ok(Arc::new(root))
    }

    fn parse_group(&mut self, depth: usize) -> Result<FilterGroup, ParseError> {
        let mut nodes: Vec<FilterNode> = Vec::new();
        let mut join: Option<Join> = None;
        let mut expect_join = false;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Selector | TokenKind::Confirm => {
                    self.advance();
                }
                TokenKind::Close => {
                    if depth == 0 {
                        return Err(ParseError::UnmatchedClose { pos: token.start });
                    }
                    self.advance();
                    break;
                }
                TokenKind::Join(found) => {
                    if nodes.is_empty() || !expect_join {
                        return Err(ParseError::LeadingJoin { pos: token.start });
                    }
                    match join {
                        Some(expected) if expected != found => {
                            return Err(ParseError::MixedJoin {
                                expected,
                                found,
                                pos: token.start,
                            });
                        }
                        _ => join = Some(found),
                    }
                    self.advance();
                    expect_join = false;
                }
                TokenKind::Open => {
                    if expect_join {
                        return Err(ParseError::MissingJoin { pos: token.start });
                    }
                    self.advance();
                    let group = self.parse_group(depth + 1)?;
                    nodes.push(group.into());
                    expect_join = true;
                }
                TokenKind::Word(_) => {
                    if expect_join {
                        return Err(ParseError::MissingJoin { pos: token.start });
                    }
                    let condition = self.parse_condition()?;
                    nodes.push(condition.into());
                    expect_join = true;
                }
                TokenKind::Literal(_) | TokenKind::To => {
                    return Err(ParseError::UnexpectedValue { pos: token.start });
                }
            }
        }

        Ok(FilterGroup::new(join.unwrap_or_default(), nodes))
    }

    fn parse_condition(&mut self) -> Result<FilterCondition, ParseError> {
        let (field, field_pos) = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(name),
                start,
                ..
            }) => (name.to_string(), start),
            Some(token) => return Err(ParseError::UnexpectedValue { pos: token.start }),
            None => return Err(ParseError::UnexpectedValue { pos: self.input.len() }),
        };
        self.advance();

        self.skip_selectors();
        let operator = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(op),
                ..
            }) => op.to_string(),
            _ => {
                return Err(ParseError::MissingOperator {
                    field,
                    pos: field_pos,
                })
            }
        };
        self.advance();

        let mut condition = FilterCondition::new(field, operator);
        condition.value = self.parse_value();

        if let Some(token) = self.peek().filter(|t| t.kind == TokenKind::To) {
            if !is_range_operator(&condition.operator) {
                return Err(ParseError::UnexpectedRangeBound {
                    operator: condition.operator,
                    pos: token.start,
                });
            }
            self.advance();
            condition.value_to = self.parse_value();
        }

        Ok(condition)
    }

    /// Consecutive words form one value; inner spacing is kept. A `#word`
    /// after the operator belongs to the value, as it does for step-back.
    fn parse_value(&mut self) -> Option<String> {
        let first = self.peek().filter(is_value_word)?;
        let mut last = first;
        self.advance();
        while let Some(token) = self.peek().filter(is_value_word) {
            last = token;
            self.advance();
        }
        Some(self.input[first.start..last.end].to_string())
    }

    fn skip_selectors(&mut self) {
        while self.peek().is_some_and(|t| t.kind == TokenKind::Selector) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

fn is_value_word(token: &Token<'_>) -> bool {
    matches!(token.kind, TokenKind::Literal(_) | TokenKind::Word(_))
}

pub fn parse(input: &str) -> Result<Arc<FilterGroup>, ParseError> {
    Parser::new(input).parse()
}
