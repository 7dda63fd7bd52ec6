//! CLI command definitions for the `webpost` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod check;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run HTTP form scenarios against websites.
#[derive(Parser)]
#[command(name = "webpost", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except warnings and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for run event detail, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory searched for scenario files (overrides `scenarios_dir`).
    #[arg(long, global = true, env = "WEBPOST_SCENARIOS_DIR")]
    pub scenarios_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `[server] port`).
        #[arg(short, long, env = "WEBPOST_PORT")]
        port: Option<u16>,

        /// Host to bind to (defaults to `[server] host`).
        #[arg(long, env = "WEBPOST_HOST")]
        host: Option<String>,
    },

    /// Run a scenario once and print its outcome.
    Run {
        /// Scenario id (file name without extension).
        scenario_id: String,

        /// Input variable, repeatable.
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,

        /// Inline secret, repeatable.
        #[arg(long = "secret", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        secrets: Vec<(String, String)>,

        /// Secret provider: `inline` (default) or `env`.
        #[arg(long)]
        secret_ref: Option<String>,
    },

    /// Load a scenario file and list its steps.
    Check {
        /// Scenario id (file name without extension).
        scenario_id: String,
    },
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_value("empty=").unwrap().1, "");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_run_command_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "webpost", "--json", "run", "login", "--var", "user=alice", "--var", "lang=ja",
            "--secret", "password=pw", "--secret-ref", "inline",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Run { scenario_id, vars, secrets, secret_ref } = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(scenario_id, "login");
        assert_eq!(vars.len(), 2);
        assert_eq!(secrets, vec![("password".to_string(), "pw".to_string())]);
        assert_eq!(secret_ref.as_deref(), Some("inline"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["webpost", "check", "login", "-vv", "--quiet"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }
}
