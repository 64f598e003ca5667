pub mod format;
pub mod lexer;
pub mod parser;
pub mod scan;
pub mod state;
pub mod step_back;

pub use format::format_pattern;
pub use parser::{parse, ParseError};
pub use scan::{active_group_join, ActiveJoin};
pub use state::PatternState;
pub use step_back::{step_back_pattern_value, StepBack};
