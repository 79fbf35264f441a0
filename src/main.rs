//! Flight search shell.
//!
//! A line-oriented front end for the search controller. Each input line is
//! either new query text or a `:command`; the screen is re-rendered whenever
//! the published state changes.
//!
//! # Commands
//!
//! - any text: replace the search query (an empty line clears it)
//! - `:select N`: pick suggestion `N`
//! - `:code XXX`: pick an airport by IATA code
//! - `:fav N`: toggle the route to destination `N`
//! - `:route DEP DEST`: toggle an explicit route
//! - `:unfav N`: remove favorite `N`
//! - `:clear`: reset the search
//! - `:quit`: exit

#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use clap::Parser;
use flight_search::app::{handle_event, Event, SearchController};
use flight_search::storage::Stores;
use flight_search::{initialize, ui, Config, FlightSearchError, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Airport autocomplete, ranked destinations and favorite routes
#[derive(Parser, Debug)]
#[command(name = "flight-search", version)]
#[command(about = "Search airports, browse destinations and keep favorite routes", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the store and trace file (overrides the config file)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Seed file used when the store has no airports (overrides the config file)
    #[arg(long, value_name = "FILE")]
    airports: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` (overrides the config file)
    #[arg(long, value_name = "LEVEL")]
    trace_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(airports) = self.airports {
            config.airports_file = Some(airports);
        }
        if let Some(level) = self.trace_level {
            config.trace_level = Some(level);
        }
        Ok(config.expanded())
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Intent(Event),
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Command::Intent(Event::QueryChanged(line.to_string())));
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();
    let row = |args: &[&str]| -> std::result::Result<usize, String> {
        match args {
            [index] => index.parse().map_err(|_| format!("not a row number: {index}")),
            _ => Err(format!(":{name} takes one row number")),
        }
    };

    let event = match name {
        "select" => Event::SelectSuggestion(row(&args)?),
        "code" => match args.as_slice() {
            [code] => Event::SelectCode((*code).to_string()),
            _ => return Err(":code takes one IATA code".to_string()),
        },
        "fav" => Event::ToggleDestination(row(&args)?),
        "route" => match args.as_slice() {
            [departure, destination] => Event::ToggleFavorite {
                departure_code: (*departure).to_string(),
                destination_code: (*destination).to_string(),
            },
            _ => return Err(":route takes a departure and a destination code".to_string()),
        },
        "unfav" => Event::RemoveFavorite(row(&args)?),
        "clear" => Event::ClearSearch,
        "help" => return Ok(Command::Help),
        "quit" | "q" => return Ok(Command::Quit),
        other => return Err(format!("unknown command :{other} (try :help)")),
    };
    Ok(Command::Intent(event))
}

const HELP: &str = "\
text          search airports (empty line clears)
:select N     pick suggestion N
:code XXX     pick airport by code
:fav N        toggle favorite to destination N
:route A B    toggle favorite route A -> B
:unfav N      remove favorite N
:clear        reset search
:quit         exit";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    flight_search::observability::init_tracing(&config);

    let storage = initialize(&config)?;
    tracing::info!(store = %storage.file_path().display(), "store opened");

    let controller = SearchController::new(Stores::from_backend(storage))?;
    controller.start();

    let mut updates = controller.subscribe();
    let renderer = tokio::spawn(async move {
        loop {
            let screen = ui::render(&updates.borrow_and_update());
            println!("{screen}");
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(line.trim_end()) {
            Ok(Command::Intent(event)) => match handle_event(&controller, &event) {
                Ok(()) => {}
                Err(FlightSearchError::InvalidSelection(message)) => eprintln!("{message}"),
                Err(e) => return Err(e),
            },
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Err(message) => eprintln!("{message}"),
        }
    }

    if let Err(e) = controller.flush().await {
        tracing::warn!(error = %e, "pending writes not confirmed");
    }
    controller.shutdown();
    renderer.abort();
    tracing::info!("exiting");
    Ok(())
}
