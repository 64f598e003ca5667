//! Tokenizer for the `#`-token text pattern.
//!
//! Lexing is total: any input produces a token list, unknown shapes fall back
//! to literals. Spans are byte offsets into the input so callers can cut the
//! original text without re-rendering it.

use crate::tree::Join;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// A lone `#`: a selector is about to open.
    Selector,
    /// `##`, either standalone or glued to the end of the previous word.
    Confirm,
    Open,
    Close,
    Join(Join),
    /// `#to`, separating the two bounds of a range.
    To,
    /// `#<ident>`: a column or an operator, depending on position.
    Word(&'a str),
    Literal(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    pub fn is_structural(&self) -> bool {
        !matches!(self.kind, TokenKind::Literal(_))
    }
}

const CONFIRM: &str = "##";
const CLOSE: &str = "#)";

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Tokens split off the end of the current word, last one first.
    pending: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            pending: Vec::new(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn next_word(&mut self) -> Option<(usize, &'a str)> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += len;
        Some((start, &rest[..len]))
    }

    /// Split a trailing `##` and any `#)` glued before it off `word`.
    fn split_suffixes(&mut self, start: usize, word: &'a str) -> &'a str {
        let mut head = word;
        if head != CONFIRM {
            if let Some(rest) = head.strip_suffix(CONFIRM) {
                self.pending.push(Token {
                    kind: TokenKind::Confirm,
                    start: start + rest.len(),
                    end: start + head.len(),
                });
                head = rest;
            }
        }
        while head.len() > CLOSE.len() {
            let Some(rest) = head.strip_suffix(CLOSE) else {
                break;
            };
            self.pending.push(Token {
                kind: TokenKind::Close,
                start: start + rest.len(),
                end: start + head.len(),
            });
            head = rest;
        }
        head
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.pop() {
            return Some(token);
        }

        let (start, word) = self.next_word()?;
        let head = self.split_suffixes(start, word);
        Some(Token {
            kind: classify(head),
            start,
            end: start + head.len(),
        })
    }
}

fn classify(word: &str) -> TokenKind<'_> {
    if word == CONFIRM {
        return TokenKind::Confirm;
    }
    let Some(name) = word.strip_prefix('#') else {
        return TokenKind::Literal(word);
    };
    match name {
        "" => TokenKind::Selector,
        "(" => TokenKind::Open,
        ")" => TokenKind::Close,
        _ if name.eq_ignore_ascii_case("to") => TokenKind::To,
        _ => match Join::parse(name) {
            Some(join) => TokenKind::Join(join),
            None => TokenKind::Word(name),
        },
    }
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_confirmed_condition() {
        assert_eq!(
            kinds("#name #contains aspirin##"),
            vec![
                TokenKind::Word("name"),
                TokenKind::Word("contains"),
                TokenKind::Literal("aspirin"),
                TokenKind::Confirm,
            ]
        );
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            kinds("#( #a #inRange 1 #TO 2 #) #Or #"),
            vec![
                TokenKind::Open,
                TokenKind::Word("a"),
                TokenKind::Word("inRange"),
                TokenKind::Literal("1"),
                TokenKind::To,
                TokenKind::Literal("2"),
                TokenKind::Close,
                TokenKind::Join(Join::Or),
                TokenKind::Selector,
            ]
        );
    }

    #[test]
    fn test_glued_close_and_confirm() {
        let tokens = tokenize("1 #)##");
        assert_eq!(tokens[1].kind, TokenKind::Close);
        assert_eq!((tokens[1].start, tokens[1].end), (2, 4));
        assert_eq!(tokens[2].kind, TokenKind::Confirm);
        assert_eq!((tokens[2].start, tokens[2].end), (4, 6));
    }

    #[test]
    fn test_glued_repeated_close() {
        assert_eq!(
            kinds("1#)#)##"),
            vec![
                TokenKind::Literal("1"),
                TokenKind::Close,
                TokenKind::Close,
                TokenKind::Confirm,
            ]
        );
    }

    #[test]
    fn test_spans_point_into_input() {
        let input = "  #name   #contains  big  pill##";
        for token in tokenize(input) {
            let text = &input[token.start..token.end];
            match token.kind {
                TokenKind::Literal(s) => assert_eq!(text, s),
                TokenKind::Word(s) => assert_eq!(&text[1..], s),
                TokenKind::Confirm => assert_eq!(text, "##"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_empty_and_plain() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("plain text").iter().all(|t| !t.is_structural()));
    }
}
