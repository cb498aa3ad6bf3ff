//! Bucketview CLI application entry point
//!
//! This is the main executable for browsing and editing a local nested-bucket
//! store. Locations are given as path expressions:
//!
//! ```bash
//! # Show the root and the buckets below it
//! bucketview
//!
//! # Open a bucket, selecting a value, with two extra pages loaded
//! bucketview browse '"users" / 0x00ff - "alice"' --grow-after 2
//!
//! # Edit the store
//! bucketview mkbucket '"users" / "admins"'
//! bucketview put '"users" / "admins" - "root"' '{"uid": 0}'
//! bucketview rm '"users" / "admins"'
//!
//! # Print the API URL and route for a location
//! bucketview url '"users" - "alice"'
//! ```
//!
//! # Configuration
//!
//! Settings are read from the user's config directory
//! (`~/.config/bucketview/config.toml` on Linux); a default file is written on
//! first run. Log output is controlled by `BUCKETVIEW_LOG_LEVEL`.

use bucketview::{
    ViewerError,
    api::{BrowseQuery, Browser, Cursor},
    browse::{BrowseSession, Location},
    cli::{Cli, Commands},
    config::ViewerConfig,
    db::Database,
    key::Key,
    output, path,
    window::Direction,
};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

type Result<T> = std::result::Result<T, ViewerError>;

fn init_tracing_subscriber() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(format!(
            "{}_LOG_LEVEL",
            env!("CARGO_PKG_NAME").to_uppercase()
        )))
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}

/// Parse an expression that must name a value
fn value_location(expression: &str) -> Result<(path::KeyPath, Key)> {
    let (path, value) = path::unmarshal(expression)?;
    let value = value.ok_or_else(|| {
        ViewerError::InvalidInput(format!("{expression} names a bucket, not a value"))
    })?;
    Ok((path, value))
}

fn handle_browse_command(
    db: &Database,
    config: &ViewerConfig,
    expression: Option<&str>,
    levels: Option<usize>,
    grow: (usize, usize),
    quiet: bool,
) -> Result<()> {
    let session = BrowseSession::new(config.session_config());
    let mut browser = Browser::new(db, session);
    match expression {
        Some(expression) => browser.load_from_expression(expression)?,
        None => browser.reload(),
    }

    let deepest = browser.session().levels().len().saturating_sub(1);
    let (before, after) = grow;
    for (direction, pages) in [(Direction::Before, before), (Direction::After, after)] {
        for _ in 0..pages {
            if !browser.scroll_near(deepest, direction) {
                break;
            }
        }
    }

    info!(location = %browser.session().location(), "browsing");
    let window_size = levels.unwrap_or(config.visible_levels).max(1);
    print!(
        "{}",
        output::render_session(browser.session(), window_size, quiet)
    );
    Ok(())
}

fn handle_show_command(db: &Database, expression: &str, hex: bool) -> Result<()> {
    let (path, key) = value_location(expression)?;
    let entry = db
        .get(&path, &key)?
        .ok_or_else(|| ViewerError::InvalidInput(format!("{expression} does not exist")))?;
    let value = entry.value().ok_or_else(|| {
        ViewerError::InvalidInput(format!("{expression} is a bucket, not a value"))
    })?;
    println!("{}", output::value_text(value, hex));
    Ok(())
}

fn handle_mkbucket_command(db: &Database, expression: &str, quiet: bool) -> Result<()> {
    let (path, value) = path::unmarshal(expression)?;
    if value.is_some() {
        return Err(ViewerError::InvalidInput(format!(
            "{expression} names a value, not a bucket"
        )));
    }
    db.create_bucket(&path)?;
    info!(%path, "bucket created");
    if !quiet {
        println!("Created bucket {path}");
    }
    Ok(())
}

fn handle_put_command(
    db: &Database,
    expression: &str,
    value: &str,
    hex: bool,
    quiet: bool,
) -> Result<()> {
    let (path, key) = value_location(expression)?;
    let bytes = if hex {
        Key::from_hex(value)?.to_canonical_bytes()
    } else {
        value.as_bytes().to_vec()
    };
    db.put(&path, &key, bytes)?;
    info!(location = %path::marshal(&path, Some(&key)), "value stored");
    if !quiet {
        println!("Stored {}", path::marshal(&path, Some(&key)));
    }
    Ok(())
}

fn handle_rm_command(db: &Database, expression: &str, quiet: bool) -> Result<()> {
    let (path, value) = path::unmarshal(expression)?;
    let (parent, key) = match value {
        Some(key) => (path, key),
        None => {
            let Some(key) = path.keys().last().cloned() else {
                return Err(ViewerError::InvalidInput("cannot remove the root".into()));
            };
            (path.prefix(path.len() - 1), key)
        }
    };

    let removed = db.delete(&parent, &key)?;
    info!(removed, "delete requested");
    if !quiet {
        if removed {
            println!("Removed {expression}");
        } else {
            println!("{expression} does not exist");
        }
    }
    Ok(())
}

fn handle_url_command(expression: &str, prefix: &str) -> Result<()> {
    let location = Location::from_expression(expression)?;
    let query = BrowseQuery::new(location.path.clone(), location.value.clone().map(Cursor::From));
    println!("{}", query.url(prefix));
    println!("{}", location.to_route());
    Ok(())
}

fn run() -> Result<()> {
    let config = ViewerConfig::load()?;
    let cli = Cli::parse_args();
    let quiet = cli.quiet || config.quiet;
    let command = cli.get_command();

    match &command {
        Commands::Fmt { expression } => {
            let (path, value) = path::unmarshal(expression)?;
            println!("{}", path::marshal(&path, value.as_ref()));
            return Ok(());
        }
        Commands::Url { expression, prefix } => return handle_url_command(expression, prefix),
        _ => {}
    }

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => config.database_path()?,
    };
    let page_size = cli.page_size.unwrap_or(config.page_size);
    let db = Database::open(&db_path)?.with_page_size(page_size);
    info!(path = %db_path.display(), page_size, "store opened");

    match command {
        Commands::Browse {
            expression,
            levels,
            grow_after,
            grow_before,
        } => handle_browse_command(
            &db,
            &config,
            expression.as_deref(),
            levels,
            (grow_before, grow_after),
            quiet,
        ),
        Commands::Show { expression, hex } => handle_show_command(&db, &expression, hex),
        Commands::MkBucket { expression } => handle_mkbucket_command(&db, &expression, quiet),
        Commands::Put {
            expression,
            value,
            hex,
        } => handle_put_command(&db, &expression, &value, hex, quiet),
        Commands::Rm { expression } => handle_rm_command(&db, &expression, quiet),
        Commands::Fmt { .. } | Commands::Url { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    init_tracing_subscriber();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", output::error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}
