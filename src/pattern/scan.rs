use super::lexer::{Lexer, TokenKind};
use crate::tree::Join;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActiveJoin {
    /// Number of `#(` still open at the end of the text.
    pub depth: usize,
    /// Last join typed inside the innermost open group, if any.
    pub join: Option<Join>,
}

/// Scan a pattern for the nesting depth at its end and the join in effect
/// there. Used to preselect a join when the join selector opens mid-pattern.
///
/// Never fails: unmatched `#)` is ignored and unterminated groups just leave
/// the depth above zero.
pub fn active_group_join(text: &str) -> ActiveJoin {
    // One slot per open level, slot 0 is the top level.
    let mut joins: Vec<Option<Join>> = vec![None];

    for token in Lexer::new(text) {
        match token.kind {
            TokenKind::Open => joins.push(None),
            TokenKind::Close => {
                if joins.len() > 1 {
                    joins.pop();
                }
            }
            TokenKind::Join(join) => {
                if let Some(slot) = joins.last_mut() {
                    *slot = Some(join);
                }
            }
            _ => {}
        }
    }

    ActiveJoin {
        depth: joins.len() - 1,
        join: joins.last().copied().flatten(),
    }
}
