//! CLI module - Command-line interface for Foodgram
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve {
        /// Override `server.port` from the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Insert tags that do not exist yet (by slug)
    LoadTags {
        /// JSON array of `{name, color, slug}`; the built-in set when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Import ingredients from a JSON array of `{name, measurement_unit}`
    LoadIngredients {
        file: PathBuf,
    },

    /// Register a user account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_tags() {
        let cli = Cli::try_parse_from(["foodgram", "load-tags", "--file", "tags.json"]).unwrap();
        match cli.command {
            Some(Commands::LoadTags { file }) => assert_eq!(file, Some(PathBuf::from("tags.json"))),
            _ => panic!("expected load-tags"),
        }
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::try_parse_from(["foodgram", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(9000) })));

        let cli = Cli::try_parse_from(["foodgram"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_create_user_requires_password() {
        assert!(
            Cli::try_parse_from([
                "foodgram",
                "create-user",
                "--email",
                "a@b.co",
                "--username",
                "cook"
            ])
            .is_err()
        );
    }
}
