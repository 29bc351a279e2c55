use clap::{Parser, Subcommand};

use crate::commands;
use crate::commands::classify::OutputFormat;
use crate::commands::completion::Shell;

/// PhotoGuard CLI - photo moderation service
#[derive(Parser, Debug)]
#[command(name = "photoguardctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the moderation HTTP service
    Serve {
        /// Service configuration file (YAML)
        #[arg(short, long, env = "PHOTOGUARD_CONFIG")]
        config: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Classify a detector response offline
    ///
    /// Accepts `{"ModerationLabels": [...]}` or a bare label array.
    Classify {
        /// Labels file (JSON)
        file: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the SHA-256 digest of an API key for `api_key_hash`
    HashKey {
        /// Key to hash (read from stdin if omitted)
        key: Option<String>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Serve { config, port, host } => {
                commands::serve::execute(config.as_deref(), port, host.as_deref()).await
            }
            Commands::Classify { file, output } => commands::classify::execute(&file, output).await,
            Commands::HashKey { key } => commands::hash_key::execute(key.as_deref()),
            Commands::Completion { shell } => commands::completion::execute(shell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["photoguardctl", "serve", "--port", "9000", "--host", "127.0.0.1"])
            .unwrap();
        match cli.command {
            Commands::Serve { port, host, .. } => {
                assert_eq!(port, Some(9000));
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_classify_json_output() {
        let cli = Cli::try_parse_from(["photoguardctl", "classify", "labels.json", "-o", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Classify { output: OutputFormat::Json, .. }
        ));
    }
}
