// ABOUTME: CLI argument parsing and command routing for repoterm
//
// Provides command-line interface for:
// - Interactive terminal bound to a repository (shell)
// - One-shot command execution (exec)
// - Access token management (auth)

pub mod auth;
pub mod exec;
pub mod shell;
pub mod util;

use clap::{Parser, Subcommand, ValueEnum};

/// Terminal whose file commands are mirrored to a GitHub repository
#[derive(Parser)]
#[command(name = "repoterm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for commands
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a repository and read commands from stdin
    Shell(ShellArgs),

    /// Connect to a repository and run a single command
    Exec(ExecArgs),

    /// Manage the stored access token
    #[command(subcommand)]
    Auth(AuthCommand),
}

/// Arguments for the shell command
#[derive(clap::Args)]
pub struct ShellArgs {
    /// Repository (owner/repo or full URL)
    pub repo: String,

    /// Access token (defaults to $REPOTERM_TOKEN, $GITHUB_TOKEN, then the keychain)
    #[arg(long)]
    pub token: Option<String>,
}

/// Arguments for the exec command
#[derive(clap::Args)]
pub struct ExecArgs {
    /// Repository (owner/repo or full URL)
    pub repo: String,

    /// Command line to run, e.g. `pip install requests`. Put it after `--`
    /// when it contains words starting with `-`.
    #[arg(required = true, num_args = 1..)]
    pub line: Vec<String>,

    /// Access token (defaults to $REPOTERM_TOKEN, $GITHUB_TOKEN, then the keychain)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Store a GitHub personal access token in the system keychain
    Login {
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Show which token would be used
    Status,
}
