//! CLI definition and command dispatch for cinedex.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the engine.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (`--data-dir`, `--config`)
//! 2. Environment variables (`CINEDEX_DATA_DIR`, `CINEDEX_SEMANTIC_ENABLED`, `CINEDEX_CONFIG`)
//! 3. Config file (`~/.cinedex/config.yaml` or the path from `--config`)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::ui::{color, format, table, ColorMode, MessageType, Progress, ProgressMode, Style};

use cinedex_core::{
    CatalogConfig, CatalogEngine, CatalogError, IndexHealth, IndexWrite, Movie, MovieFields,
    MutationOutcome, SemanticSearchOutcome,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Crates whose logs the CLI shows.
const LOG_TARGETS: &[&str] = &["cinedex_core", "cinedex_db", "cinedex_model", "cinedex_cli"];

/// cinedex – movie catalog with semantic search
#[derive(Parser, Debug)]
#[command(name = "cinedex")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "CINEDEX_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, global = true, env = "CINEDEX_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.cinedex/config.yaml)
    #[arg(long, global = true, env = "CINEDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the database and the vector index
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, env = "CINEDEX_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// Fields of a movie, as given on the command line.
#[derive(Args, Debug)]
pub struct MovieArgs {
    /// Title
    #[arg(long)]
    pub title: String,

    /// Release year (free text)
    #[arg(long)]
    pub year: String,

    /// Director
    #[arg(long, default_value = "")]
    pub director: String,

    /// Actors, comma-separated
    #[arg(long, default_value = "")]
    pub actors: String,

    /// Plot description
    #[arg(long, default_value = "")]
    pub description: String,
}

impl From<MovieArgs> for MovieFields {
    fn from(args: MovieArgs) -> Self {
        MovieFields::new(args.title, args.year)
            .with_director(args.director)
            .with_actors(args.actors)
            .with_description(args.description)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every movie in the catalog
    #[command(after_help = r#"EXAMPLES:
    # List all movies
    cinedex list

    # As JSON, for scripting
    cinedex list --json | jq '.[].title'
"#)]
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show a single movie
    #[command(after_help = r#"EXAMPLES:
    cinedex get 7
    cinedex get 7 --json
"#)]
    Get {
        /// Movie id
        id: i64,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Add a movie and index it for semantic search
    #[command(after_help = r#"EXAMPLES:
    cinedex add --title Inception --year 2010 \
        --director "Christopher Nolan" \
        --actors "Leonardo DiCaprio, Elliot Page" \
        --description "A thief steals secrets through shared dreams."
"#)]
    Add {
        #[command(flatten)]
        movie: MovieArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Replace every field of a movie (omitted fields become empty)
    #[command(after_help = r#"EXAMPLES:
    cinedex update 7 --title Inception --year 2010 --director "Christopher Nolan"
"#)]
    Update {
        /// Movie id
        id: i64,

        #[command(flatten)]
        movie: MovieArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete a movie
    Delete {
        /// Movie id
        id: i64,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete every movie and clear the semantic index
    #[command(name = "delete-all")]
    DeleteAll {
        /// Confirm deletion of the whole catalog
        #[arg(long)]
        yes: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find movies by meaning (at most 10, nearest first)
    #[command(after_help = r#"EXAMPLES:
    cinedex search "heist inside dreams"
    cinedex search "space horror" --json
"#)]
    Search {
        /// Free-text query
        query: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find movies whose title, director, actors or description contain a string
    #[command(name = "search-text", after_help = r#"EXAMPLES:
    cinedex search-text Nolan
"#)]
    SearchText {
        /// Literal substring
        query: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the semantic index from the catalog
    #[command(after_help = r#"EXAMPLES:
    # After changing the embedding model, or when `cinedex status` reports drift
    cinedex reindex
"#)]
    Reindex {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show record and index counts and index availability
    #[command(after_help = r#"EXAMPLES:
    cinedex status
    cinedex status --json | jq '.index.health'
"#)]
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// JSON payload for update and delete, and for get of a missing movie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationJson {
    id: i64,
    outcome: MutationOutcome,
}

// ============================================================================
// Run function
// ============================================================================

/// Run the CLI application.
///
/// Parses command-line arguments, resolves configuration, creates a
/// `CatalogEngine`, and dispatches to the appropriate command handler.
///
/// # Returns
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on error.
/// A movie that does not exist is not an error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays parseable.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, log_level))
        .collect::<Vec<_>>()
        .join(",");

    let style = Style::new(cli.color).with_quiet(cli.quiet);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_ansi(style.colors_enabled())
        .with_writer(std::io::stderr)
        .init();

    let engine = match load_config(&cli).and_then(CatalogEngine::from_config) {
        Ok(engine) => engine,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your config at ~/.cinedex/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to initialize cinedex",
                    Some(&format!("{:#}", e)),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("Using database {}", engine.database_path().display());

    let result = match cli.command {
        Command::List { json } => handle_list(&style, &engine, json),
        Command::Get { id, json } => handle_get(&style, &engine, id, json),
        Command::Add { movie, json } => handle_add(&style, &engine, movie.into(), json),
        Command::Update { id, movie, json } => handle_update(&style, &engine, id, movie.into(), json),
        Command::Delete { id, json } => handle_delete(&style, &engine, id, json),
        Command::DeleteAll { yes, json } => handle_delete_all(&style, &engine, yes, json),
        Command::Search { query, json } => handle_search(&style, &engine, &query, json),
        Command::SearchText { query, json } => handle_search_text(&style, &engine, &query, json),
        Command::Reindex { json } => handle_reindex(&style, &engine, json),
        Command::Status { json } => handle_status(&style, &engine, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style.message(MessageType::Err, &e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Config file, then environment, then `--data-dir`.
fn load_config(cli: &Cli) -> anyhow::Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_path(path)?,
        None => CatalogConfig::load_default()?,
    };
    config.apply_env_overrides();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CatalogError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_movie(style: &Style, movie: &Movie) {
    println!(
        "{} {} ({})",
        style.movie_id(movie.id),
        style.section(&movie.fields.title),
        movie.fields.year
    );
    println!("  {}", style.key_value("Director", &movie.fields.director));
    println!("  {}", style.key_value("Actors", &movie.fields.actors));
    println!("  {}", style.key_value("Description", &movie.fields.description));
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_list(style: &Style, engine: &CatalogEngine, json: bool) -> Result<(), CatalogError> {
    let movies = engine.list_all()?;

    if json {
        return print_json(&movies);
    }

    if movies.is_empty() {
        style.print(MessageType::Info, "The catalog is empty.");
        style.print(MessageType::Hint, "Add one with `cinedex add --title <TITLE> --year <YEAR>`");
        return Ok(());
    }

    println!("{}", table::render_movies_table(&movies, color::terminal_width()));
    if !style.is_quiet() {
        println!();
        println!("{}", format::count_noun(movies.len(), "movie"));
    }
    Ok(())
}

fn handle_get(style: &Style, engine: &CatalogEngine, id: i64, json: bool) -> Result<(), CatalogError> {
    let movie = engine.get(id)?;

    if json {
        return match &movie {
            Some(movie) => print_json(movie),
            None => print_json(&MutationJson {
                id,
                outcome: MutationOutcome::NotFound,
            }),
        };
    }

    match movie {
        Some(movie) => print_movie(style, &movie),
        None => println!(
            "{}",
            style.message(MessageType::Skip, &format!("Movie {} not found", style.movie_id(id)))
        ),
    }
    Ok(())
}

fn handle_add(
    style: &Style,
    engine: &CatalogEngine,
    fields: MovieFields,
    json: bool,
) -> Result<(), CatalogError> {
    let id = engine.create(&fields)?;
    let movie = Movie { id, fields };

    if json {
        return print_json(&movie);
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Added movie {} \"{}\" ({})",
                style.movie_id(id),
                movie.fields.title,
                movie.fields.year
            )
        )
    );
    Ok(())
}

fn handle_update(
    style: &Style,
    engine: &CatalogEngine,
    id: i64,
    fields: MovieFields,
    json: bool,
) -> Result<(), CatalogError> {
    let outcome = engine.replace(id, &fields)?;

    if json {
        return print_json(&MutationJson { id, outcome });
    }

    match outcome {
        MutationOutcome::Applied => println!(
            "{}",
            style.message(MessageType::Ok, &format!("Updated movie {}", style.movie_id(id)))
        ),
        MutationOutcome::NotFound => println!(
            "{}",
            style.message(MessageType::Skip, &format!("Movie {} not found", style.movie_id(id)))
        ),
    }
    Ok(())
}

fn handle_delete(style: &Style, engine: &CatalogEngine, id: i64, json: bool) -> Result<(), CatalogError> {
    let outcome = engine.delete(id)?;

    if json {
        return print_json(&MutationJson { id, outcome });
    }

    match outcome {
        MutationOutcome::Applied => println!(
            "{}",
            style.message(MessageType::Ok, &format!("Deleted movie {}", style.movie_id(id)))
        ),
        MutationOutcome::NotFound => println!(
            "{}",
            style.message(MessageType::Skip, &format!("Movie {} not found", style.movie_id(id)))
        ),
    }
    Ok(())
}

fn handle_delete_all(
    style: &Style,
    engine: &CatalogEngine,
    yes: bool,
    json: bool,
) -> Result<(), CatalogError> {
    if !yes {
        return Err(CatalogError::Other(anyhow::anyhow!(
            "Refusing to delete the whole catalog without --yes"
        )));
    }

    let result = engine.delete_all()?;

    if json {
        return print_json(&result);
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("Deleted {}", format::count_noun(result.deleted, "movie"))
        )
    );
    match result.index {
        IndexWrite::Applied => {}
        IndexWrite::Skipped => style.print(
            MessageType::Info,
            "Semantic index is unavailable and was left untouched",
        ),
        IndexWrite::Failed => {
            println!(
                "{}",
                style.message(MessageType::Warn, "Failed to clear the semantic index")
            );
            style.print(MessageType::Hint, "Run `cinedex reindex` to rebuild it");
        }
    }
    Ok(())
}

fn handle_search(
    style: &Style,
    engine: &CatalogEngine,
    query: &str,
    json: bool,
) -> Result<(), CatalogError> {
    // The first semantic query loads the embedding model.
    let progress = Progress::spinner("Searching...", ProgressMode::detect(style.is_quiet(), json));
    let outcome = engine.search_semantic(query);
    progress.finish_clear();

    if json {
        print_json(&outcome)?;
    }

    match outcome {
        SemanticSearchOutcome::Results(hits) => {
            if json {
                return Ok(());
            }
            if hits.is_empty() {
                style.print(MessageType::Info, &format!("No matches for \"{}\"", query));
            } else {
                println!("{}", table::render_search_table(&hits));
            }
            Ok(())
        }
        SemanticSearchOutcome::Disabled { reason } => {
            if !json {
                println!(
                    "{}",
                    style.message(MessageType::Warn, "Semantic search is unavailable")
                );
                println!("{}", style.message_detail("Reason", &reason));
                style.print(MessageType::Hint, "Use `cinedex search-text` for substring search");
            }
            Ok(())
        }
        SemanticSearchOutcome::Failed { error } => Err(CatalogError::Other(anyhow::anyhow!(
            "Semantic search failed: {}",
            error
        ))),
    }
}

fn handle_search_text(
    style: &Style,
    engine: &CatalogEngine,
    query: &str,
    json: bool,
) -> Result<(), CatalogError> {
    let movies = engine.search_text(query)?;

    if json {
        return print_json(&movies);
    }

    if movies.is_empty() {
        style.print(MessageType::Info, &format!("No movies contain \"{}\"", query));
    } else {
        println!("{}", table::render_movies_table(&movies, color::terminal_width()));
    }
    Ok(())
}

fn handle_reindex(style: &Style, engine: &CatalogEngine, json: bool) -> Result<(), CatalogError> {
    let progress = Progress::spinner(
        "Rebuilding semantic index...",
        ProgressMode::detect(style.is_quiet(), json),
    );
    let result = engine.reindex();
    progress.finish_clear();
    let report = result?;

    if json {
        return print_json(&report);
    }

    let headline = format!("Rebuilt collection '{}'", report.collection);
    if report.is_complete() {
        println!("{}", style.message(MessageType::Ok, &headline));
    } else {
        println!(
            "{}",
            style.message(MessageType::Warn, &format!("{} with errors", headline))
        );
    }

    println!(
        "{}",
        style.message_detail(
            "Indexed",
            &format!(
                "{}/{}",
                format::format_thousands(report.records_indexed),
                format::count_noun(report.records_total, "movie")
            )
        )
    );
    println!("{}", style.message_detail("Model", &report.model_id));
    println!("{}", style.message_detail("Backend", &report.backend));
    println!("{}", style.message_detail("Batches", &report.batches.to_string()));
    println!(
        "{}",
        style.message_detail("Started", &format::format_timestamp(report.started_at))
    );
    println!(
        "{}",
        style.message_detail("Duration", &format::format_duration_ms(report.duration_ms))
    );

    if report.recreated {
        style.print(
            MessageType::Info,
            "The previous collection was incompatible and has been recreated",
        );
    }
    for error in &report.errors {
        println!("{}", style.list_item("-", error));
    }
    Ok(())
}

fn handle_status(style: &Style, engine: &CatalogEngine, json: bool) -> Result<(), CatalogError> {
    let status = engine.status()?;

    if json {
        return print_json(&status);
    }

    println!("{}", style.section("CATALOG"));
    println!();
    println!(
        "  {}",
        style.key_value("Database", &status.database_path.display().to_string())
    );
    println!(
        "  {}",
        style.key_value("Movies", &format::format_thousands(status.record_count))
    );
    println!();

    let index = &status.index;
    println!("{}", style.section("SEMANTIC INDEX"));
    println!();
    println!("  {}", style.key_value("Health", &style.health(&index.health)));
    println!("  {}", style.key_value("Backend", &index.backend));
    println!("  {}", style.key_value("Collection", &index.collection));
    println!(
        "  {}",
        style.key_value("Path", &index.index_path.display().to_string())
    );
    println!("  {}", style.key_value("Model", &index.model_id));
    if let Some(metric) = &index.metric {
        println!("  {}", style.key_value("Metric", metric));
    }
    if let Some(entries) = index.entry_count {
        println!("  {}", style.key_value("Entries", &format::format_thousands(entries)));
    }
    if let Some(drift) = status.drift().filter(|d| *d != 0) {
        println!("  {}", style.key_value("Drift", &format!("{:+}", drift)));
    }
    if let Some(reason) = &index.reason {
        println!("  {}", style.key_value("Reason", reason));
    }

    if matches!(index.health, IndexHealth::Drifted | IndexHealth::Unavailable) {
        println!();
        style.print(
            MessageType::Hint,
            "Run `cinedex reindex` to rebuild the index from the catalog",
        );
    }
    Ok(())
}
