mod commands;
mod memory_connector;
mod session;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{Filter, FilterType, PartialSearchState};
use tracing_subscriber::EnvFilter;

use crate::{
    commands::{parse_filter_arg, parse_sort_arg, Command},
    memory_connector::MemoryConnector,
    session::Session,
    settings::{load_settings, Settings},
};

#[derive(Parser, Debug)]
#[command(about = "Drive a search session against a local JSON document set")]
struct Cli {
    #[arg(long, default_value = "search.toml")]
    config: PathBuf,
    /// Overrides the documents file named in the settings.
    #[arg(long)]
    documents: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run one search and print the resulting page.
    Search {
        term: Option<String>,
        /// Repeatable `field=value`.
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
        #[arg(long, default_value = "all")]
        filter_type: FilterType,
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        size: Option<u64>,
        /// `field` or `field:asc|desc`.
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print autocomplete results and suggestions for a partial term.
    Suggest { term: String },
    /// Read commands from stdin, one per line.
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(documents) = cli.documents {
        settings.documents = documents;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let connector = MemoryConnector::load(&settings.documents)?;

    match cli.command {
        CliCommand::Search {
            term,
            filters,
            filter_type,
            page,
            size,
            sort,
        } => {
            let initial_state = search_request(term, &filters, filter_type, page, size, sort)?;
            let session = Session::start(&settings, connector, initial_state, true)?;
            session.print_first_page().await?;
            session.tear_down();
        }
        CliCommand::Suggest { term } => {
            let session = start_idle(&settings, connector)?;
            session.run(Command::Suggest(term)).await?;
            session.tear_down();
        }
        CliCommand::Repl => {
            let session = start_idle(&settings, connector)?;
            session.repl().await?;
            session.tear_down();
        }
    }

    Ok(())
}

fn start_idle(settings: &Settings, connector: MemoryConnector) -> Result<Session> {
    Session::start(settings, connector, PartialSearchState::default(), false)
}

fn search_request(
    term: Option<String>,
    filters: &[String],
    filter_type: FilterType,
    page: Option<u64>,
    size: Option<u64>,
    sort: Option<String>,
) -> Result<PartialSearchState> {
    let filters = filters
        .iter()
        .map(|raw| {
            let (field, value) = parse_filter_arg(raw)?;
            Ok(Filter::new(field, vec![value], filter_type))
        })
        .collect::<Result<Vec<_>>>()?;
    let (sort_field, sort_direction) = match sort {
        Some(raw) => {
            let (field, direction) = parse_sort_arg(&raw)?;
            (Some(field), Some(direction))
        }
        None => (None, None),
    };

    Ok(PartialSearchState {
        search_term: term,
        current: page,
        results_per_page: size,
        filters: (!filters.is_empty()).then_some(filters),
        sort_field,
        sort_direction,
        ..PartialSearchState::default()
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
