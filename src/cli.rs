//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for bucketview using the `clap` crate.
//! Every command addresses its target with a path expression such as
//! `"users" / 0x00ff - "alice"`.
//!
//! # Commands
//!
//! - **browse**: Print the visible levels around a location (default)
//! - **show**: Print a single value
//! - **mkbucket** / **put** / **rm**: Edit the local store
//! - **fmt**: Normalize an expression
//! - **url**: Print the Browse API URL and route for an expression
//!
//! # Examples
//!
//! ```
//! use bucketview::cli::{Cli, Commands};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["bucketview", "-q", "show", r#""a" - "b""#]);
//! assert!(cli.quiet);
//! assert!(matches!(cli.get_command(), Commands::Show { .. }));
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bucketview")]
#[command(about = "Browse and edit a nested-bucket key-value store", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Store directory (overrides config)
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Entries per page (overrides config)
    #[arg(long = "page-size", value_name = "N", global = true)]
    pub page_size: Option<usize>,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the visible levels around a location (default)
    #[command(visible_alias = "b")]
    Browse {
        /// Location to open; the root when omitted
        #[arg(value_name = "EXPR")]
        expression: Option<String>,

        /// Number of levels shown at once (overrides config)
        #[arg(short = 'l', long = "levels", value_name = "N")]
        levels: Option<usize>,

        /// Load this many extra pages after the deepest level's first page
        #[arg(long = "grow-after", value_name = "N", default_value_t = 0)]
        grow_after: usize,

        /// Load this many extra pages before the deepest level's first page
        #[arg(long = "grow-before", value_name = "N", default_value_t = 0)]
        grow_before: usize,
    },

    /// Print a single value
    Show {
        /// Value to print, e.g. `"bucket" - "key"`
        #[arg(value_name = "EXPR")]
        expression: String,

        /// Print raw hex instead of the pretty form
        #[arg(long = "hex")]
        hex: bool,
    },

    /// Create a bucket and any missing parents
    #[command(name = "mkbucket")]
    MkBucket {
        #[arg(value_name = "EXPR")]
        expression: String,
    },

    /// Store a value
    Put {
        /// Value location, e.g. `"bucket" - "key"`
        #[arg(value_name = "EXPR")]
        expression: String,

        /// Value to store
        #[arg(value_name = "VALUE")]
        value: String,

        /// Interpret VALUE as hex-encoded bytes
        #[arg(long = "hex")]
        hex: bool,
    },

    /// Remove a value or a bucket with everything below it
    #[command(visible_alias = "del")]
    Rm {
        #[arg(value_name = "EXPR")]
        expression: String,
    },

    /// Normalize an expression
    Fmt {
        #[arg(value_name = "EXPR")]
        expression: String,
    },

    /// Print the Browse API URL and the route for an expression
    Url {
        #[arg(value_name = "EXPR")]
        expression: String,

        /// Prefix the API is mounted under
        #[arg(long = "prefix", value_name = "PREFIX", default_value = "/api/")]
        prefix: String,
    },
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to browsing the root if none specified
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Browse {
            expression: None,
            levels: None,
            grow_after: 0,
            grow_before: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_browse() {
        let cli = Cli::parse_from(["bucketview"]);
        assert_eq!(
            cli.get_command(),
            Commands::Browse {
                expression: None,
                levels: None,
                grow_after: 0,
                grow_before: 0,
            }
        );
    }

    #[test]
    fn test_browse_arguments() {
        let cli = Cli::parse_from([
            "bucketview",
            "--db",
            "/tmp/store",
            "b",
            r#""a" / "b""#,
            "--levels",
            "2",
            "--grow-after",
            "3",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/store")));
        let Commands::Browse {
            expression,
            levels,
            grow_after,
            ..
        } = cli.get_command()
        else {
            panic!("expected browse");
        };
        assert_eq!(expression.as_deref(), Some(r#""a" / "b""#));
        assert_eq!(levels, Some(2));
        assert_eq!(grow_after, 3);
    }

    #[test]
    fn test_put_with_hex_value() {
        let cli = Cli::parse_from(["bucketview", "put", r#""a" - "k""#, "00ff", "--hex"]);
        assert_eq!(
            cli.get_command(),
            Commands::Put {
                expression: r#""a" - "k""#.into(),
                value: "00ff".into(),
                hex: true,
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bucketview", "mkbucket", r#""a""#, "-q", "--page-size", "5"]);
        assert!(cli.quiet);
        assert_eq!(cli.page_size, Some(5));
    }
}
