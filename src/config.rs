use std::time::Duration;

use crate::error::{Result, ShellError};

/// Prompt written before every read.
pub const PROMPT: &str = ": ";

const DEFAULT_MAX_JOBS: usize = 100;
const DEFAULT_EXIT_GRACE: Duration = Duration::from_millis(1000);

/// Startup settings. There is no config file; everything comes from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: &'static str,
    /// Upper bound on concurrently tracked background jobs.
    pub max_background_jobs: usize,
    /// How long `exit` lets terminated background jobs clean up before killing them.
    pub exit_grace: Duration,
    /// When set, `cmd < in > out` runs this program instead of `cmd`.
    pub multi_redirect_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: PROMPT,
            max_background_jobs: DEFAULT_MAX_JOBS,
            exit_grace: DEFAULT_EXIT_GRACE,
            multi_redirect_filter: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        if let Some(raw) = get("SMALLSH_MAX_JOBS") {
            config.max_background_jobs = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ShellError::Config {
                        key: "SMALLSH_MAX_JOBS",
                        value: raw,
                    });
                }
            };
        }

        if let Some(raw) = get("SMALLSH_EXIT_GRACE_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| ShellError::Config {
                key: "SMALLSH_EXIT_GRACE_MS",
                value: raw.clone(),
            })?;
            config.exit_grace = Duration::from_millis(millis);
        }

        config.multi_redirect_filter = get("SMALLSH_MULTI_REDIRECT_FILTER").map(|p| p.trim().to_string());

        Ok(config)
    }
}
