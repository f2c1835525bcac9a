//! Client configuration - endpoints, browser headers, polling policy

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VerifierError, VerifierResult};

/// Session-creation endpoint
pub const DEFAULT_START_URL: &str = "https://weryfikator.mobywatel.gov.pl/web/api/verifications";

/// Data-pull endpoint, `{session_uuid}` is substituted per session
pub const DEFAULT_DATA_PULL_URL: &str =
    "https://weryfikator.mobywatel.gov.pl/web/api/verifications/{session_uuid}/data/encrypt-and-get";

/// Placeholder in the data-pull URL template
pub const SESSION_PLACEHOLDER: &str = "{session_uuid}";

/// Headers sent by the official verification web page
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Host", "weryfikator.mobywatel.gov.pl"),
    (
        "User-Agent",
        "Mozilla/5.0 (X11; Linux x86_64; rv:139.0) Gecko/20100101 Firefox/139.0",
    ),
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate, br, zstd"),
    ("Content-Type", "application/json"),
    ("Origin", "https://weryfikator.mobywatel.gov.pl"),
    ("Connection", "keep-alive"),
    ("Referer", "https://weryfikator.mobywatel.gov.pl/verification-process"),
];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub transport: TransportConfig,
    pub polling: PollPolicy,
}

impl VerifierConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> VerifierResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: VerifierConfig =
            serde_json::from_str(&json).map_err(|e| VerifierError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VerifierResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VerifierError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> VerifierResult<()> {
        self.transport.validate()?;
        self.polling.validate()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub start_url: String,
    /// Must contain `{session_uuid}`
    pub data_pull_url: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            data_pull_url: DEFAULT_DATA_PULL_URL.to_string(),
            timeout_secs: 10,
            headers: BROWSER_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl TransportConfig {
    /// Transport pointed at another server, e.g. a test double
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            start_url: format!("{}/web/api/verifications", base),
            data_pull_url: format!(
                "{}/web/api/verifications/{}/data/encrypt-and-get",
                base, SESSION_PLACEHOLDER
            ),
            headers: BTreeMap::new(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Data-pull URL for a session
    pub fn data_pull_url_for(&self, session_id: &Uuid) -> String {
        self.data_pull_url.replace(SESSION_PLACEHOLDER, &session_id.to_string())
    }

    pub fn validate(&self) -> VerifierResult<()> {
        if self.timeout_secs == 0 {
            return Err(VerifierError::Config("timeout_secs must be positive".into()));
        }

        if !self.data_pull_url.contains(SESSION_PLACEHOLDER) {
            return Err(VerifierError::Config(format!(
                "data_pull_url must contain {}",
                SESSION_PLACEHOLDER
            )));
        }

        Ok(())
    }
}

/// Caller-level retry loop: fixed interval, hard deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay before each data-pull attempt (seconds)
    pub interval_secs: u64,
    /// Give up after this long (seconds)
    pub max_wait_secs: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_wait_secs: 180,
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// Number of data-pull attempts that fit in the window
    pub fn max_attempts(&self) -> u64 {
        if self.interval_secs == 0 {
            return 0;
        }
        self.max_wait_secs / self.interval_secs
    }

    pub fn validate(&self) -> VerifierResult<()> {
        if self.interval_secs == 0 {
            return Err(VerifierError::Config("interval_secs must be positive".into()));
        }

        if self.interval_secs > self.max_wait_secs {
            return Err(VerifierError::Config(format!(
                "interval_secs ({}) exceeds max_wait_secs ({})",
                self.interval_secs, self.max_wait_secs
            )));
        }

        Ok(())
    }
}
