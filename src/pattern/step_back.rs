//! Structural backspace: remove the last logical unit of a pattern.

use super::state::{infer_tail, units, PatternState, Tail, UnitKind};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBack {
    /// Whether a structural unit was removed. When false the caller falls
    /// back to character-level editing.
    pub handled: bool,
    pub next_value: String,
    /// The result is deliberately left mid-edit: keep the editor open.
    pub next_carry: bool,
}

impl StepBack {
    fn unhandled(text: &str) -> Self {
        Self {
            handled: false,
            next_value: text.to_string(),
            next_carry: false,
        }
    }

    fn edited(next_value: String, next_carry: bool) -> Self {
        if next_value.trim().is_empty() {
            return Self {
                handled: true,
                next_value: String::new(),
                next_carry: false,
            };
        }
        Self {
            handled: true,
            next_value,
            next_carry,
        }
    }
}

/// Undo one step of the pattern's forward grammar from its tail.
///
/// `is_range_confirmed` tells whether a value after `#to` is a finished
/// second bound; it comes from the tree and is not re-derived from text.
pub fn step_back_pattern_value(text: &str, is_range_confirmed: bool) -> StepBack {
    let Some(tail) = infer_tail(text, is_range_confirmed) else {
        return StepBack::unhandled(text);
    };

    let result = transition(text, tail);
    if result.handled {
        debug!(
            state = ?tail.state,
            from = text,
            to = %result.next_value,
            carry = result.next_carry,
            "stepped back"
        );
    }
    result
}

fn transition(text: &str, tail: Tail) -> StepBack {
    let prefix = &text[..tail.cut];

    match tail.state {
        PatternState::Empty | PatternState::ValueEntered => StepBack::unhandled(text),

        // Drop `##` and the value, keep `#col #op ` (or `... #to `) as typed.
        PatternState::Confirmed | PatternState::RangeComplete => {
            StepBack::edited(prefix.to_string(), true)
        }

        PatternState::RangeAwaitingSecond => StepBack::edited(prefix.trim_end().to_string(), true),

        PatternState::JoinPending => {
            let kept = prefix.trim_end();
            if ends_with_unit(kept, UnitKind::Close) {
                StepBack::edited(format!("{kept}##"), true)
            } else {
                StepBack::edited(kept.to_string(), true)
            }
        }

        PatternState::GroupClosed => {
            let kept = prefix.trim_end();
            match last_unit(kept) {
                Some(UnitKind::Close | UnitKind::Value) => {
                    StepBack::edited(format!("{kept}##"), true)
                }
                Some(_) => StepBack::edited(format!("{kept} #"), true),
                None => StepBack::edited(String::new(), false),
            }
        }

        PatternState::ColumnOnly | PatternState::ColumnOperator | PatternState::GroupOpen => {
            let kept = prefix.trim_end();
            if kept.is_empty() {
                // The column selector stays open if one was open.
                let next = if tail.selector { "#" } else { "" };
                return StepBack {
                    handled: true,
                    next_value: next.to_string(),
                    next_carry: false,
                };
            }
            StepBack::edited(format!("{kept} #"), true)
        }
    }
}

fn last_unit(text: &str) -> Option<UnitKind> {
    units(text).last().map(|u| u.kind)
}

fn ends_with_unit(text: &str, kind: UnitKind) -> bool {
    last_unit(text) == Some(kind)
}
