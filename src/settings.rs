use std::env;

use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::bot::DEFAULT_TRIGGER;
use crate::error::SettingsError;

const DEFAULT_CONFIG_FILE: &str = "auction_bot";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_poll_limit")]
    pub poll_limit: usize,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_trigger() -> String {
    DEFAULT_TRIGGER.to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_poll_limit() -> usize {
    100
}

impl Settings {
    /// Optional `auction_bot.toml` (or `$AUCTION_CONFIG`), then `AUCTION_*`
    /// variables, then `BOT_TOKEN`.
    pub fn load() -> Result<Self, SettingsError> {
        let file = env::var("AUCTION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(&file, None, env::var("BOT_TOKEN").ok())
    }

    /// `vars` replaces the process environment when given.
    fn from_sources(
        file: &str,
        vars: Option<Map<String, String>>,
        bot_token: Option<String>,
    ) -> Result<Self, SettingsError> {
        let cfg = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("AUCTION")
                    .try_parsing(true)
                    .source(vars),
            )
            .set_override_option("bot_token", bot_token)?
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// The token is only needed to talk to Telegram.
    pub fn require_token(&self) -> Result<&str, SettingsError> {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SettingsError::MissingToken)
    }

    pub fn bot_url(&self) -> Result<String, SettingsError> {
        let token = self.require_token()?;
        Ok(format!("{}/bot{}", self.api_base.trim_end_matches('/'), token))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_api_base(),
            trigger: default_trigger(),
            poll_timeout_secs: default_poll_timeout(),
            poll_limit: default_poll_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_an_error() {
        let s = Settings::default();
        assert!(matches!(s.require_token(), Err(SettingsError::MissingToken)));
        let s = Settings {
            bot_token: Some("   ".into()),
            ..Settings::default()
        };
        assert!(matches!(s.require_token(), Err(SettingsError::MissingToken)));
    }

    #[test]
    fn bot_url_joins_base_and_token() {
        let s = Settings {
            bot_token: Some("123:abc".into()),
            api_base: "http://localhost:8081/".into(),
            ..Settings::default()
        };
        assert_eq!(s.bot_url().unwrap(), "http://localhost:8081/bot123:abc");
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg = Config::builder()
            .set_override("trigger", "Лот")
            .unwrap()
            .build()
            .unwrap();
        let s: Settings = cfg.try_deserialize().unwrap();
        assert_eq!(s.trigger, "Лот");
        assert_eq!(s.api_base, "https://api.telegram.org");
        assert_eq!(s.poll_timeout_secs, 30);
        assert!(s.bot_token.is_none());
    }

    fn write_config(name: &str, body: &str) -> String {
        let path = env::temp_dir().join(format!("{}_{}.toml", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn vars(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn bot_token_wins_over_file_and_prefixed_env() {
        let file = write_config(
            "auction_bot_token_order",
            "bot_token = \"from-file\"\ntrigger = \"Файл\"\npoll_limit = 5\n",
        );
        let s = Settings::from_sources(
            &file,
            vars(&[("AUCTION_TRIGGER", "Лот"), ("AUCTION_BOT_TOKEN", "from-env")]),
            Some("from-var".into()),
        )
        .unwrap();
        assert_eq!(s.require_token().unwrap(), "from-var");
        assert_eq!(s.trigger, "Лот");
        assert_eq!(s.poll_limit, 5);
        std::fs::remove_file(&file).unwrap();
    }

    #[test]
    fn prefixed_env_overrides_file() {
        let file = write_config(
            "auction_bot_env_order",
            "bot_token = \"from-file\"\npoll_timeout_secs = 50\n",
        );
        let s = Settings::from_sources(
            &file,
            vars(&[("AUCTION_BOT_TOKEN", "from-env"), ("AUCTION_POLL_TIMEOUT_SECS", "5")]),
            None,
        )
        .unwrap();
        assert_eq!(s.require_token().unwrap(), "from-env");
        assert_eq!(s.poll_timeout_secs, 5);
        std::fs::remove_file(&file).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let s = Settings::from_sources("no_such_auction_bot_config", vars(&[]), None).unwrap();
        assert_eq!(s.trigger, DEFAULT_TRIGGER);
        assert_eq!(s.poll_limit, 100);
        assert!(matches!(s.require_token(), Err(SettingsError::MissingToken)));
    }
}
