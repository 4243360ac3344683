use clap::{Arg, ArgAction, Command};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod completion;
mod config;
mod connection;
mod workspace;

use cli::{Cli, WorkspaceSource};
use commands::inspect::rows_footer;
use commands::CatalogPrinter;
use workspace::Workspace;

const DEFAULT_CONFIG: &str = "workspace.toml";

fn main() -> anyhow::Result<()> {
    let matches = Command::new("schema-prompt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Schema and table completion over plugin-backed connections")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Workspace file declaring connections and schemas")
                .default_value(DEFAULT_CONFIG),
        )
        .arg(
            Arg::new("search-path")
                .long("search-path")
                .value_name("SCHEMAS")
                .help("Comma separated search path, overrides the workspace file"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Validate connections, print the report and exit"),
        )
        .arg(
            Arg::new("suggest")
                .long("suggest")
                .value_name("PREFIX")
                .help("Print suggestions matching PREFIX and exit")
                .num_args(0..=1)
                .default_missing_value(""),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Raise log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .get_matches();

    init_tracing(matches.get_count("verbose"));

    let source = WorkspaceSource {
        config_path: matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG)),
        search_path: matches
            .get_one::<String>("search-path")
            .map(|s| cli::parse_search_path(s)),
        colored: std::io::stdout().is_terminal(),
    };

    if matches.get_flag("check") {
        return run_check(&source);
    }

    if let Some(prefix) = matches.get_one::<String>("suggest") {
        return run_suggest(&source, prefix);
    }

    let mut cli = Cli::new(source)?;
    cli.run()?;

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("schema_prompt={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate only; exit status 1 when any connection was rejected
fn run_check(source: &WorkspaceSource) -> anyhow::Result<()> {
    let settings = source.read_settings()?;
    let workspace = Workspace::load(&settings, None);

    cli::print_warning(&workspace, source.colored);
    let live = workspace.connections().len();
    println!("{}", CatalogPrinter::new().connections_table(&workspace));
    println!("{}", rows_footer(live));

    if !workspace.failures().is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_suggest(source: &WorkspaceSource, prefix: &str) -> anyhow::Result<()> {
    let settings = source.read_settings()?;
    let workspace = Workspace::load(&settings, None);

    let warning = workspace.validation_warning(std::io::stderr().is_terminal());
    if !warning.is_empty() {
        eprintln!("{}", warning);
    }

    let suggestions = completion::matching_suggestions(
        completion::build_suggestions(workspace.metadata(), workspace.connections()),
        prefix,
        workspace.max_completions(),
    );

    println!("{}", CatalogPrinter::new().suggestions_table(&suggestions));
    println!("{}", rows_footer(suggestions.len()));
    Ok(())
}
