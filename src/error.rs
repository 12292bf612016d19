use thiserror::Error;

/// Rejections of a query command. The message is what the user sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("⚠️ Примеры:\n`{keyword} С7-00076132`\n`{keyword} С7-00076132 3ч`")]
    Usage { keyword: String },
    #[error("⚠️ Используйте: `30м`, `2ч`, `1д`")]
    InvalidDuration { token: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}
