//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::report::ReportFormat;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Consultdesk - team diagnostics for people-management consulting
///
/// Builds org charts, DISC and climate summaries and executive reports
/// from the consulting backend, and serves them over HTTP together with
/// client-access provisioning.
///
/// Examples:
///   consultdesk serve --bind 0.0.0.0:3001
///   consultdesk org-chart 6f1c...
///   consultdesk report 6f1c... --format html -o relatorio.html
///   consultdesk --snapshot demos/snapshot.json climate p1
///   consultdesk portfolio
///   consultdesk init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .consultdesk.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the backing store
    #[arg(long, value_name = "URL", env = "SUPABASE_URL", global = true)]
    pub backend_url: Option<String>,

    /// Public (anon) API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true, global = true)]
    pub anon_key: Option<String>,

    /// Service-role API key, required for provisioning
    #[arg(
        long,
        env = "SUPABASE_SERVICE_ROLE_KEY",
        hide_env_values = true,
        global = true
    )]
    pub service_role_key: Option<String>,

    /// Serve data from a JSON snapshot instead of the backing store
    #[arg(long, value_name = "FILE", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Backend request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "ADDR", env = "CONSULTDESK_BIND")]
        bind: Option<String>,

        /// Allowed CORS origin ("*" for any)
        #[arg(long, value_name = "ORIGIN")]
        cors_origin: Option<String>,
    },

    /// Print the org chart of a project's company
    OrgChart {
        /// Project id
        project: String,

        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Summarize the team's DISC profiles for a project
    Disc {
        /// Project id
        project: String,

        #[arg(long)]
        json: bool,
    },

    /// Summarize a project's climate survey
    Climate {
        /// Project id
        project: String,

        #[arg(long)]
        json: bool,
    },

    /// Generate the executive report of a project
    Report {
        /// Project id
        project: String,

        /// Output format (markdown, json, html)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ReportFormat>,

        /// Output file path for the report
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Consultancy-wide counters: projects, diagnoses, climate mean
    Portfolio {
        #[arg(long)]
        json: bool,
    },

    /// Create a client login linked to a company
    Provision {
        #[arg(long)]
        email: String,

        #[arg(long, env = "CONSULTDESK_CLIENT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        name: String,

        /// Company id
        #[arg(long)]
        company: String,
    },

    /// Generate a default .consultdesk.toml configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Command::InitConfig { .. } = self.command {
            return Ok(());
        }

        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref snapshot) = self.snapshot {
            if !snapshot.is_file() {
                return Err(format!("Snapshot file does not exist: {}", snapshot.display()));
            }
        }

        match self.command {
            Command::Serve { bind: Some(ref bind), .. } => {
                if bind.parse::<SocketAddr>().is_err() {
                    return Err(format!("Invalid bind address: {}", bind));
                }
            }
            Command::Provision {
                ref email,
                ref password,
                ..
            } => {
                if !email.contains('@') {
                    return Err(format!("Invalid email address: {}", email));
                }
                if password.is_empty() {
                    return Err("Password must not be empty".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a config file that asks for verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            backend_url: Some("https://demo.supabase.co".to_string()),
            anon_key: None,
            service_role_key: None,
            snapshot: None,
            timeout: None,
            verbose: false,
            quiet: false,
        }
    }

    fn climate() -> Command {
        Command::Climate {
            project: "p1".to_string(),
            json: false,
        }
    }

    #[test]
    fn test_parse_subcommand_with_global_flags() {
        let args = Args::try_parse_from([
            "consultdesk",
            "report",
            "p1",
            "--format",
            "html",
            "--verbose",
            "--timeout",
            "10",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.timeout, Some(10));
        assert_eq!(
            args.command,
            Command::Report {
                project: "p1".to_string(),
                format: Some(ReportFormat::Html),
                output: None,
            }
        );
    }

    #[test]
    fn test_parse_portfolio() {
        let args = Args::try_parse_from(["consultdesk", "portfolio", "--json"]).unwrap();
        assert_eq!(args.command, Command::Portfolio { json: true });
        assert!(make_args(args.command).validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(climate());
        args.backend_url = Some("demo.supabase.co".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(climate());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bind_address() {
        let args = make_args(Command::Serve {
            bind: Some("localhost".to_string()),
            cors_origin: None,
        });
        assert!(args.validate().is_err());

        let args = make_args(Command::Serve {
            bind: Some("127.0.0.1:3001".to_string()),
            cors_origin: None,
        });
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_snapshot() {
        let mut args = make_args(climate());
        args.snapshot = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_backend_checks() {
        let mut args = make_args(Command::InitConfig { force: false });
        args.backend_url = Some("nonsense".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(climate());
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
