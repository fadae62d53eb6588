// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The command line stands in for a remote caller: each subcommand maps to
//! one engine operation, and units are printed to the local console.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `tfengine`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfengine",
    version,
    about = "Run the engine command and stream its output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to an engine config file (TOML). Built-in defaults when omitted.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TG_ENGINE_LOG_LEVEL` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: EngineCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EngineCommand {
    /// Acknowledge engine initialisation.
    Init,
    /// Run the engine command once.
    Run(RunArgs),
    /// Acknowledge engine shutdown.
    Shutdown,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Directory the command runs in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub working_dir: PathBuf,

    /// Extra environment variable, `KEY=VALUE`. May be repeated.
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Attach the command to a pseudo-terminal.
    #[arg(long)]
    pub pty: bool,

    /// How streamed units are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Arguments passed to the command.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Mirror characters to the local stdout/stderr.
    Text,
    /// One JSON object per unit on stdout.
    Json,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_collects_env_pairs_and_trailing_args() {
        let args = CliArgs::try_parse_from([
            "tfengine", "run", "-e", "TF_LOG=debug", "--env", "EMPTY=", "--pty", "--", "plan",
            "-input=false",
        ])
        .unwrap();

        let EngineCommand::Run(run) = args.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(
            run.env,
            vec![
                ("TF_LOG".to_string(), "debug".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
        assert!(run.pty);
        assert_eq!(run.args, vec!["plan", "-input=false"]);
        assert_eq!(run.format, OutputFormat::Text);
    }

    #[test]
    fn env_pair_without_key_is_rejected() {
        assert!(parse_env_pair("=value").is_err());
        assert!(parse_env_pair("novalue").is_err());
        assert_eq!(
            parse_env_pair("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
    }
}
