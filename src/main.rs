use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use filterbar::tree::{self, ColumnType, FilterColumn, FilterGroup, Join, ValueField};
use filterbar::{
    active_group_join, format_pattern, parse, step_back_pattern_value, PatternState, StepBack,
};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filterbar", about = "Edit and inspect search-bar filter patterns")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "FILTERBAR_LOG",
        default_value = "warn",
        help = "Log filter directive"
    )]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tree for a pattern as YAML
    Parse { pattern: String },

    /// Render a YAML tree (file or stdin) back into a pattern
    Format {
        file: Option<PathBuf>,

        #[arg(long, help = "Append the confirmation marker")]
        confirmed: bool,
    },

    /// Remove the last logical unit of a pattern
    StepBack {
        pattern: String,

        #[arg(long, help = "The trailing value is a completed range bound")]
        range_confirmed: bool,
    },

    /// Show nesting depth and active join at the end of a pattern
    ActiveJoin { pattern: String },

    /// Apply a structural edit to the node at a path
    Edit {
        #[command(subcommand)]
        action: EditAction,
    },
}

#[derive(Args)]
struct EditTarget {
    pattern: String,

    #[arg(
        long,
        value_parser = parse_node_path,
        help = "Dot-separated child indices, omit for the root"
    )]
    path: Option<NodePath>,

    #[arg(long, help = "Append the confirmation marker to the result")]
    confirmed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodePath(Vec<usize>);

/// Step-back result plus the state the edited pattern is left in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepBackReport {
    #[serde(flatten)]
    result: StepBack,
    state: Option<PatternState>,
    confirmed: bool,
}

impl StepBackReport {
    fn new(pattern: &str, range_confirmed: bool) -> Self {
        let result = step_back_pattern_value(pattern, range_confirmed);
        let state = PatternState::infer(&result.next_value, range_confirmed);
        Self {
            confirmed: state.is_some_and(|s| s.is_confirmed()),
            state,
            result,
        }
    }
}

#[derive(Subcommand)]
enum EditAction {
    SetValue {
        #[command(flatten)]
        target: EditTarget,
        value: String,
    },
    SetValueTo {
        #[command(flatten)]
        target: EditTarget,
        value: String,
    },
    SetColumn {
        #[command(flatten)]
        target: EditTarget,
        field: String,
        #[arg(long = "type", default_value = "text", value_parser = parse_column_type)]
        kind: ColumnType,
    },
    SetOperator {
        #[command(flatten)]
        target: EditTarget,
        operator: String,
    },
    SetJoin {
        #[command(flatten)]
        target: EditTarget,
        #[arg(value_parser = parse_join)]
        join: Join,
    },
    Remove {
        #[command(flatten)]
        target: EditTarget,
    },
    Unwrap {
        #[command(flatten)]
        target: EditTarget,
    },
}

impl EditAction {
    fn target(&self) -> &EditTarget {
        match self {
            Self::SetValue { target, .. }
            | Self::SetValueTo { target, .. }
            | Self::SetColumn { target, .. }
            | Self::SetOperator { target, .. }
            | Self::SetJoin { target, .. }
            | Self::Remove { target }
            | Self::Unwrap { target } => target,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Parse { pattern } => {
            let root = parse(&pattern)?;
            print_yaml(&*root)?;
            Ok(ExitCode::from(0))
        }
        Command::Format { file, confirmed } => {
            let root = read_tree(file.as_ref())?;
            println!("{}", format_pattern(&root, confirmed));
            Ok(ExitCode::from(0))
        }
        Command::StepBack {
            pattern,
            range_confirmed,
        } => {
            let report = StepBackReport::new(&pattern, range_confirmed);
            print_yaml(&report)?;
            Ok(exit_code(report.result.handled))
        }
        Command::ActiveJoin { pattern } => {
            print_yaml(&active_group_join(&pattern))?;
            Ok(ExitCode::from(0))
        }
        Command::Edit { action } => run_edit(&action),
    }
}

fn run_edit(action: &EditAction) -> Result<ExitCode> {
    let target = action.target();
    let root = parse(&target.pattern)?;
    let path = target.path.as_ref().map(|p| p.0.as_slice()).unwrap_or_default();

    let next = match action {
        EditAction::SetValue { value, .. } => {
            tree::update_group_condition_value(&root, path, ValueField::Value, value)
        }
        EditAction::SetValueTo { value, .. } => {
            tree::update_group_condition_value(&root, path, ValueField::ValueTo, value)
        }
        EditAction::SetColumn { field, kind, .. } => {
            let column = FilterColumn::new(field.as_str(), *kind);
            tree::update_group_condition_column(&root, path, &column)
        }
        EditAction::SetOperator { operator, .. } => {
            tree::update_group_condition_operator(&root, path, operator)
        }
        EditAction::SetJoin { join, .. } => tree::update_group_join_at_path(&root, path, *join),
        EditAction::Remove { .. } => tree::remove_group_node_at_path(&root, path),
        EditAction::Unwrap { .. } => tree::unwrap_group_at_path(&root, path),
    };

    let changed = !Arc::ptr_eq(&root, &next);
    debug!(?path, changed, "edit applied");
    println!("{}", format_pattern(&next, target.confirmed));
    Ok(exit_code(changed))
}

fn read_tree(file: Option<&PathBuf>) -> Result<FilterGroup> {
    let source = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read tree from stdin")?;
            buf
        }
    };
    serde_yaml::from_str(&source).context("invalid filter tree")
}

fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).context("failed to serialize output")?;
    print!("{}", yaml);
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}

fn parse_node_path(s: &str) -> Result<NodePath, String> {
    if s.trim().is_empty() {
        return Ok(NodePath::default());
    }
    s.split('.')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid path segment '{}'", part))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(NodePath)
}

fn parse_column_type(s: &str) -> Result<ColumnType, String> {
    ColumnType::parse(s).ok_or_else(|| format!("unknown column type '{}'", s))
}

fn parse_join(s: &str) -> Result<Join, String> {
    Join::parse(s).ok_or_else(|| format!("unknown join '{}', expected AND or OR", s))
}
