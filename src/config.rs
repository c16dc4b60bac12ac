//! Run configuration: YAML loading, defaults, and validation.
//!
//! Configuration is passed explicitly into each component at construction;
//! there is no ambient global config object. The file is optional — every
//! field has a default mirroring the production deployment — and
//! [`LocatorConfig::validate`] enforces the fatal rules before the run does
//! any I/O.
//!
//! # Example config.yaml
//!
//! ```yaml
//! max_articles_per_feed: 5
//! inter_source_delay_secs: 5
//! inter_batch_delay_secs: 2
//! batch_size: 3
//! max_attempts: 3
//! model: deepseek-chat
//! api_base_url: https://api.deepseek.com/v1
//! feeds:
//!   - name: fox_news
//!     url: https://moxie.foxnews.com/google-publisher/us.xml
//! ```

use crate::errors::ConfigError;
use serde::Deserialize;
use tracing::info;
use url::Url;

/// One configured feed source: a fixed label plus its endpoint URL.
///
/// The label becomes the `source` field of every Article the feed yields.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    /// Source identifier, e.g. `fox_news`.
    pub name: String,
    /// RSS or Atom endpoint URL.
    pub url: String,
}

/// Full configuration surface of one run.
#[derive(Debug, Clone, Deserialize)]
pub struct LocatorConfig {
    /// Feed sources, collected in this order.
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSpec>,

    /// Per-feed cap: keep only the N most recent entries of each feed.
    #[serde(default = "default_max_articles")]
    pub max_articles_per_feed: usize,

    /// Pause between feed sources, in seconds.
    #[serde(default = "default_inter_source_delay")]
    pub inter_source_delay_secs: u64,

    /// Pause between classification batches, in seconds.
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_secs: u64,

    /// Articles per classification request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempt ceiling shared by feed fetches and classification calls.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Classifier model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible chat-completion endpoint.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_feeds() -> Vec<FeedSpec> {
    vec![FeedSpec {
        name: "fox_news".to_string(),
        url: "https://moxie.foxnews.com/google-publisher/us.xml".to_string(),
    }]
}

fn default_max_articles() -> usize {
    5
}

fn default_inter_source_delay() -> u64 {
    5
}

fn default_inter_batch_delay() -> u64 {
    2
}

fn default_batch_size() -> usize {
    3
}

fn default_max_attempts() -> usize {
    3
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            max_articles_per_feed: default_max_articles(),
            inter_source_delay_secs: default_inter_source_delay(),
            inter_batch_delay_secs: default_inter_batch_delay(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            model: default_model(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl LocatorConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: LocatorConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        info!(path, feeds = config.feeds.len(), "Loaded configuration");
        Ok(config)
    }

    /// Enforce the fatal configuration rules.
    ///
    /// Called once at startup, before any network or filesystem I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }
        for feed in &self.feeds {
            if let Err(source) = Url::parse(&feed.url) {
                return Err(ConfigError::BadFeedUrl {
                    name: feed.name.clone(),
                    url: feed.url.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_deployment() {
        let config = LocatorConfig::default();
        assert_eq!(config.max_articles_per_feed, 5);
        assert_eq!(config.inter_source_delay_secs, 5);
        assert_eq!(config.inter_batch_delay_secs, 2);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.api_base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].name, "fox_news");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
batch_size: 4
feeds:
  - name: bbc
    url: https://feeds.bbci.co.uk/news/rss.xml
"#;
        let config: LocatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.max_articles_per_feed, 5);
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].name, "bbc");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = LocatorConfig {
            batch_size: 0,
            ..LocatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroBatchSize)
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = LocatorConfig {
            max_attempts: 0,
            ..LocatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroAttempts)));
    }

    #[test]
    fn test_empty_feed_list_rejected() {
        let config = LocatorConfig {
            feeds: vec![],
            ..LocatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoFeeds)));
    }

    #[test]
    fn test_bad_feed_url_rejected() {
        let config = LocatorConfig {
            feeds: vec![FeedSpec {
                name: "broken".to_string(),
                url: "not a url".to_string(),
            }],
            ..LocatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadFeedUrl { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "inter_batch_delay_secs: 0").unwrap();
        let config = LocatorConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.inter_batch_delay_secs, 0);
        assert_eq!(config.batch_size, 3);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = LocatorConfig::load("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
