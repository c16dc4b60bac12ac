//! Command-line interface definitions for the news locator.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The API key can be provided via flag or environment variable.

use clap::Parser;

/// Command-line arguments for one collection + analysis run.
///
/// # Examples
///
/// ```sh
/// # Run with built-in defaults, key from the environment
/// DEEPSEEK_API_KEY=sk-... news_locator
///
/// # Custom config and artifact directories
/// news_locator -c config.yaml -d ./data -o ./output
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the raw collection artifact
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Output directory for the analysis artifact
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional path to a config.yaml file (built-in defaults otherwise)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Classifier API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_locator"]);
        assert_eq!(cli.data_dir, "data");
        assert_eq!(cli.output_dir, "output");
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_locator",
            "--data-dir",
            "./d",
            "--output-dir",
            "./o",
            "--config",
            "config.yaml",
            "--api-key",
            "sk-test",
        ]);

        assert_eq!(cli.data_dir, "./d");
        assert_eq!(cli.output_dir, "./o");
        assert_eq!(cli.config.as_deref(), Some("config.yaml"));
        assert_eq!(cli.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["news_locator", "-d", "/tmp/d", "-o", "/tmp/o"]);
        assert_eq!(cli.data_dir, "/tmp/d");
        assert_eq!(cli.output_dir, "/tmp/o");
    }
}
