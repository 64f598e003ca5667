//! Filter-expression mini-language behind a keystroke-driven search bar.
//!
//! A filter exists as a `#`-token text pattern and as a tree of conditions
//! and groups. [`tree`] holds the tree and its path-addressed persistent
//! edits; [`pattern`] works on the text: parsing, formatting, the join
//! scanner and structural backspace.

pub mod pattern;
pub mod tree;

pub use pattern::{
    active_group_join, format_pattern, parse, step_back_pattern_value, ActiveJoin, ParseError,
    PatternState, StepBack,
};
pub use tree::{FilterColumn, FilterCondition, FilterGroup, FilterNode, Join};
