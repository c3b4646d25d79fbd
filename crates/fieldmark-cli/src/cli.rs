//! Command-line arguments.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fieldmark_core::{Config, Result};
use fieldmark_search::ALL_COLLECTIONS;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "fieldmark.toml";

/// Fieldmark CLI - index and search the demo collections
#[derive(Parser, Debug)]
#[command(name = "fieldmark", version)]
#[command(about = "Index, export and search Typesense-style collections", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, env = "FIELDMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Collections a command applies to.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CollectionArgs {
    /// Collection name, repeatable; `all` selects every collection
    #[arg(short = 'c', long = "collection", default_value = ALL_COLLECTIONS)]
    pub collections: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sync collections with the demo data
    Index {
        #[command(flatten)]
        collections: CollectionArgs,

        /// Remove every document before indexing
        #[arg(long)]
        truncate: bool,
    },
    /// Print collection documents as JSON lines
    Export {
        #[command(flatten)]
        collections: CollectionArgs,
    },
    /// Run a full-text query against one collection
    Search {
        /// Collection name
        #[arg(short = 'c', long = "collection")]
        collection: String,

        /// Query text; empty matches everything
        #[arg(short, long, default_value = "")]
        query: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Hits per page (1, 2, 5, 10, 20, 50 or 100)
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
    /// Print compiled schemas and search parameters
    Schema {
        #[command(flatten)]
        collections: CollectionArgs,
    },
    /// Drop collections
    Delete {
        #[command(flatten)]
        collections: CollectionArgs,
    },
}

impl Cli {
    /// Resolve the configuration.
    ///
    /// An explicit `--config` file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] in `dir` is used when present, otherwise the
    /// defaults. Environment overrides are applied last.
    pub fn load_config(&self, dir: &Path) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => {
                let fallback = dir.join(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Config::load(&fallback)?
                } else {
                    Config::default()
                }
            }
        };
        config.with_env_overrides()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fieldmark").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_collections_default_to_all() {
        let cli = parse(&["export"]);
        let Command::Export { collections } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(collections.collections, vec!["all"]);
    }

    #[test]
    fn test_repeated_collections() {
        let cli = parse(&["-v", "index", "-c", "content", "--collection", "media", "--truncate"]);
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Command::Index {
                collections: CollectionArgs {
                    collections: vec!["content".to_string(), "media".to_string()],
                },
                truncate: true,
            }
        );
    }

    #[test]
    fn test_search_arguments() {
        let cli = parse(&["search", "-c", "media", "-q", "harbour", "--page", "2", "--page-size", "5"]);
        assert_eq!(
            cli.command,
            Command::Search {
                collection: "media".to_string(),
                query: "harbour".to_string(),
                page: 2,
                page_size: 5,
            }
        );
    }

    #[test]
    fn test_search_requires_collection() {
        let argv = ["fieldmark", "search", "-q", "x"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[backend]\napi_key = \"secret\"\nport = 9000\n").unwrap();

        let mut cli = parse(&["schema"]);
        cli.config = Some(path);
        let config = cli.load_config(dir.path()).unwrap();
        assert_eq!(config.backend.port, 9000);
    }

    #[test]
    fn test_default_config_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[backend]\nhost = \"search.internal\"\n",
        )
        .unwrap();

        let mut cli = parse(&["schema"]);
        cli.config = None;
        let config = cli.load_config(dir.path()).unwrap();
        assert_eq!(config.backend.host, "search.internal");
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = parse(&["schema"]);
        cli.config = Some(dir.path().join("absent.toml"));
        assert!(cli.load_config(dir.path()).is_err());
    }
}
