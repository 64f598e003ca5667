//! Editing state of a pattern, inferred from its tail.
//!
//! The text is first folded into logical units (a column, an operator, a whole
//! value, a join, ...) and the last few units decide which step of the
//! forward grammar the user is at:
//!
//! ```text
//! column -> operator -> value [-> #to -> value] -> (## | join -> column ...) -> #)* -> ##
//! ```

use super::lexer::{Lexer, TokenKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Open,
    Close,
    Join,
    Column,
    Operator,
    /// One or more literal words forming a single value.
    Value,
    To,
    Selector,
    Confirm,
}

/// A logical unit of the pattern and the byte offset where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub kind: UnitKind,
    pub start: usize,
}

/// Fold the token stream into units, resolving `#<ident>` words into columns
/// or operators by position.
pub fn units(text: &str) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();

    for token in Lexer::new(text) {
        let previous = units.last().map(|u| u.kind);
        let kind = match token.kind {
            TokenKind::Selector => UnitKind::Selector,
            TokenKind::Confirm => UnitKind::Confirm,
            TokenKind::Open => UnitKind::Open,
            TokenKind::Close => UnitKind::Close,
            TokenKind::Join(_) => UnitKind::Join,
            TokenKind::To => UnitKind::To,
            TokenKind::Word(_) => match previous {
                Some(UnitKind::Column) => UnitKind::Operator,
                Some(UnitKind::Operator | UnitKind::To | UnitKind::Value) => UnitKind::Value,
                _ => UnitKind::Column,
            },
            TokenKind::Literal(_) => UnitKind::Value,
        };

        // Consecutive words of one value stay a single unit.
        if kind == UnitKind::Value && previous == Some(UnitKind::Value) {
            continue;
        }
        units.push(Unit {
            kind,
            start: token.start,
        });
    }

    units
}

/// Nesting depth is not part of the state; `active_group_join` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternState {
    /// Only a selector marker, nothing chosen yet.
    Empty,
    /// A column is chosen, the operator is not.
    ColumnOnly,
    /// Column and operator are chosen, the value is empty.
    ColumnOperator,
    /// A value is being typed.
    ValueEntered,
    /// `#to` was typed, the second bound is empty.
    RangeAwaitingSecond,
    /// Both bounds are present and the pattern is confirmed.
    RangeComplete,
    /// A join was chosen and the next column selector is open.
    JoinPending,
    /// A group was opened and its first column selector is open.
    GroupOpen,
    /// The last condition's value is confirmed.
    Confirmed,
    /// One or more groups were closed and the pattern confirmed.
    GroupClosed,
}

/// A recognized tail: the state plus the unit a backspace removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tail {
    pub state: PatternState,
    /// Byte offset at which the removed unit starts.
    pub cut: usize,
    /// Whether the pattern ended in a selector marker.
    pub selector: bool,
}

impl PatternState {
    /// Infer the editing state from the end of `text`. Returns `None` for
    /// plain text and for tails that do not match a known step.
    ///
    /// `is_range_confirmed` comes from the tree: it tells whether a trailing
    /// value after `#to` is a completed second bound.
    pub fn infer(text: &str, is_range_confirmed: bool) -> Option<Self> {
        infer_tail(text, is_range_confirmed).map(|tail| tail.state)
    }

    /// Whether the state is a complete, confirmed expression.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed | Self::RangeComplete | Self::GroupClosed)
    }
}

pub(crate) fn infer_tail(text: &str, is_range_confirmed: bool) -> Option<Tail> {
    let units = units(text);
    if units.iter().all(|u| u.kind == UnitKind::Value) {
        return None;
    }
    let (last, rest) = units.split_last()?;
    let kind_at = |from_end: usize| -> Option<UnitKind> {
        rest.len()
            .checked_sub(from_end)
            .and_then(|i| rest.get(i))
            .map(|u| u.kind)
    };

    let tail = |state, cut| Tail {
        state,
        cut,
        selector: false,
    };

    match last.kind {
        UnitKind::Confirm => {
            let before = rest.last()?;
            match before.kind {
                UnitKind::Value => {
                    if is_range_confirmed && kind_at(2) == Some(UnitKind::To) {
                        return Some(tail(PatternState::RangeComplete, before.start));
                    }
                    let value = first_value_after_operator(rest)?;
                    Some(tail(PatternState::Confirmed, value.start))
                }
                UnitKind::Close => Some(tail(PatternState::GroupClosed, before.start)),
                _ => None,
            }
        }
        UnitKind::Selector => {
            let Some(before) = rest.last() else {
                return Some(Tail {
                    state: PatternState::Empty,
                    cut: last.start,
                    selector: true,
                });
            };
            let state = match before.kind {
                UnitKind::Join => PatternState::JoinPending,
                UnitKind::Column => PatternState::ColumnOnly,
                UnitKind::Operator => PatternState::ColumnOperator,
                UnitKind::Open => PatternState::GroupOpen,
                _ => return None,
            };
            Some(Tail {
                state,
                cut: before.start,
                selector: true,
            })
        }
        UnitKind::Value => Some(tail(PatternState::ValueEntered, last.start)),
        UnitKind::To => Some(tail(PatternState::RangeAwaitingSecond, last.start)),
        UnitKind::Operator => Some(tail(PatternState::ColumnOperator, last.start)),
        UnitKind::Column => Some(tail(PatternState::ColumnOnly, last.start)),
        UnitKind::Open | UnitKind::Close | UnitKind::Join => None,
    }
}

/// Walk back over the value (and any `#to` bound) ending `units` and return
/// the first value unit, provided an operator precedes it.
fn first_value_after_operator(units: &[Unit]) -> Option<&Unit> {
    let mut first = None;
    for unit in units.iter().rev() {
        match unit.kind {
            UnitKind::Value | UnitKind::To => first = Some(unit),
            UnitKind::Operator => return first.filter(|u| u.kind == UnitKind::Value),
            _ => return None,
        }
    }
    None
}
