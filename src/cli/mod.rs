//! CLI module - administrative command-line interface for odsp-auth
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// odsp-auth - API-key users and roles
#[derive(Parser)]
#[command(name = "odsp-auth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config.toml (defaults to the standard search paths)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init,

    /// Create the users table and seed the bootstrap administrator
    Setup,

    /// Check a username/key pair and print the user's role
    Verify {
        username: String,
        key: String,
    },

    /// Create a user and print its API key
    #[command(alias = "add")]
    CreateUser {
        username: String,
        /// One of: admin, data_scientist, user
        role: String,
        /// Use this key instead of generating one
        #[arg(long)]
        key: Option<String>,
    },

    /// Delete a user
    #[command(alias = "rm")]
    DeleteUser { username: String },

    /// Replace a user's API key and print the new one
    #[command(alias = "rotate")]
    IssueKey {
        username: String,
        /// Use this key instead of generating one
        #[arg(long)]
        key: Option<String>,
    },

    /// Change a user's role
    UpdateRole {
        username: String,
        /// One of: admin, data_scientist, user
        role: String,
    },

    /// List all users and their roles
    #[command(alias = "ls")]
    ListUsers {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub use commands::*;
