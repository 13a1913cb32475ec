//! CLI command definitions for external-properties
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;
pub mod migrate;

use crate::format::OutputFormat;
use crate::types::DefaultPolicy;
use clap::{Args, Parser, Subcommand};
use migrate::MigrateArgs;
use std::path::PathBuf;

/// Resolve external properties across a hierarchy of configuration units
#[derive(Parser, Debug)]
#[command(name = "external-properties", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the workspace manifest (default: ./external-properties.yaml)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Qualified name of the unit to resolve from (default: the root unit)
    #[arg(short, long, global = true, value_name = "UNIT")]
    pub unit: Option<String>,

    /// Home directory for override locations (overrides manifest and environment)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Override location policy: hierarchical or flat (overrides manifest)
    #[arg(long, global = true, value_name = "POLICY")]
    pub policy: Option<DefaultPolicy>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", global = true, value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the resolvers consulted from the unit up to the root (default)
    Resolvers,

    /// List properties defined by the unit's resolvers
    Properties(PropertiesArgs),

    /// Print the value of a property
    Get(GetArgs),

    /// Check whether a property is defined (exit status 1 when it is not)
    Exists(ExistsArgs),

    /// Move override files from the deprecated location to the current one
    Migrate(MigrateArgs),
}

/// Arguments for the properties subcommand
#[derive(Args, Debug)]
pub struct PropertiesArgs {
    /// Include everything visible from ancestors, with shadowing applied
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Property name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Value to print when the property is not defined
    #[arg(short, long, value_name = "VALUE")]
    pub default: Option<String>,
}

/// Arguments for the exists subcommand
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Property name
    #[arg(value_name = "NAME")]
    pub name: String,
}
