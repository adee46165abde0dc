//! Process configuration, read once at startup from the environment
//! (and from a `.env` file in the working directory, when present).

use crate::v1beta::{API_BASE, rest};
use thiserror::Error;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const API_BASE_VAR: &str = "GEMINI_API_BASE";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            api_key: var(API_KEY_VAR).ok_or(Error::MissingApiKey)?,
            model: var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: var(API_BASE_VAR).unwrap_or_else(|| API_BASE.to_string()),
        })
    }

    pub fn client(&self) -> rest::Client {
        rest::Client::new(self.api_key.as_str(), self.model.as_str())
            .with_api_base(self.api_base.as_str())
    }
}
