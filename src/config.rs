//! Client configuration.

use std::env::VarError;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_MAX_ROUNDS: usize = 10;

pub const MODEL_VAR: &str = "FNCLIENT_MODEL";
pub const MAX_ROUNDS_VAR: &str = "FNCLIENT_MAX_ROUNDS";
pub const PARALLEL_TOOL_CALLS_VAR: &str = "FNCLIENT_PARALLEL_TOOL_CALLS";

/// Settings for one [`FunctionClient`](crate::FunctionClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Endpoint requests allowed per `send_message` before giving up.
    pub max_rounds: usize,
    /// Run the tool calls of one turn concurrently.
    pub parallel_tool_calls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            parallel_tool_calls: false,
        }
    }
}

impl ClientConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = parallel;
        self
    }

    /// Reads `FNCLIENT_MODEL`, `FNCLIENT_MAX_ROUNDS` and
    /// `FNCLIENT_PARALLEL_TOOL_CALLS`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Like [`from_env`](Self::from_env), but reads each variable through
    /// `lookup`. Only the three `FNCLIENT_*` keys are requested.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let mut vars = Vec::new();
        for key in [MODEL_VAR, MAX_ROUNDS_VAR, PARALLEL_TOOL_CALLS_VAR] {
            match lookup(key) {
                Ok(value) => vars.push((key, value)),
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(raw)) => {
                    return Err(ClientError::Config(format!("{key}={raw:?}: not valid unicode")));
                }
            }
        }
        Self::from_vars(vars)
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value = value.as_ref().trim();
            match key.as_ref() {
                MODEL_VAR => config.model = value.to_owned(),
                MAX_ROUNDS_VAR => {
                    config.max_rounds = value.parse().map_err(|e| {
                        ClientError::Config(format!("{MAX_ROUNDS_VAR}={value:?}: {e}"))
                    })?;
                }
                PARALLEL_TOOL_CALLS_VAR => {
                    config.parallel_tool_calls = parse_flag(value).ok_or_else(|| {
                        ClientError::Config(format!(
                            "{PARALLEL_TOOL_CALLS_VAR}={value:?}: expected a boolean"
                        ))
                    })?;
                }
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.model.trim().is_empty() {
            return Err(ClientError::Config("model must not be empty".into()));
        }
        if self.max_rounds == 0 {
            return Err(ClientError::Config("max_rounds must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
