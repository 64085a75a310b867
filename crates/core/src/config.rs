use std::{path::PathBuf, time::Duration};

use crate::error::{MockviewError, Result};

pub const BACKEND_URL_ENV: &str = "MOCKVIEW_BACKEND_URL";
pub const TIMEOUT_ENV: &str = "MOCKVIEW_TIMEOUT_SECS";

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Read the backend location from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(BACKEND_URL_ENV) {
            let url = url.trim().trim_end_matches('/');
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MockviewError::validation(format!(
                    "{BACKEND_URL_ENV} must be an http(s) URL, got {url:?}"
                )));
            }
            config.backend_url = url.to_string();
        }

        if let Some(secs) = lookup(TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                MockviewError::validation(format!("{TIMEOUT_ENV} must be a whole number of seconds"))
            })?;
            config.request_timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }
}

#[derive(Clone, Debug)]
pub struct InterviewConfig {
    /// Per-question answer window
    pub question_duration: Duration,
    /// Upper bound on waiting for the last chunks after a recording is stopped
    pub finalize_timeout: Duration,
    pub minutes_per_managerial_question: u32,
    pub coding_question_count: u32,
    pub coding_timer_secs: u32,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_secs(120),
            finalize_timeout: Duration::from_secs(3),
            minutes_per_managerial_question: 4,
            coding_question_count: 5,
            coding_timer_secs: 8 * 4 * 60,
        }
    }
}

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("mockview")
}

pub fn get_store_path() -> PathBuf {
    get_root_data_dir().join("session.json")
}
