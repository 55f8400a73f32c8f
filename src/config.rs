use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ConsoleError, ConsoleResult};

pub const BOOTSTRAP_ELEMENT_ID: &str = "repair-console-bootstrap";

const MIN_INTERVAL_MS: u32 = 100;
const MAX_BACKOFF_EXPONENT: u32 = 6;

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    api_base: Option<String>,
    push_path: Option<String>,
    push_enabled: Option<bool>,
    poll_interval_ms: Option<u32>,
    notification_ttl_ms: Option<u32>,
    reconnect_base_delay_ms: Option<u32>,
    reconnect_max_delay_ms: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RootBootstrap {
    #[serde(default)]
    config: FileConfig,
    #[serde(default)]
    repos: BTreeMap<String, RepoInfo>,
    #[serde(default)]
    examples: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub push_path: String,
    pub push_enabled: bool,
    pub poll_interval_ms: u32,
    pub notification_ttl_ms: u32,
    pub reconnect_base_delay_ms: u32,
    pub reconnect_max_delay_ms: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            push_path: "/ws".to_string(),
            push_enabled: true,
            poll_interval_ms: 2_000,
            notification_ttl_ms: 5_000,
            reconnect_base_delay_ms: 500,
            reconnect_max_delay_ms: 15_000,
        }
    }
}

impl ConsoleConfig {
    fn apply_file(&mut self, file_cfg: FileConfig) {
        if let Some(base) = file_cfg.api_base {
            self.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(path) = file_cfg.push_path.filter(|path| !path.trim().is_empty()) {
            self.push_path = path.trim().to_string();
        }
        set_opt(&mut self.push_enabled, file_cfg.push_enabled);
        set_opt_u32_min(
            &mut self.poll_interval_ms,
            file_cfg.poll_interval_ms,
            MIN_INTERVAL_MS,
        );
        set_opt_u32_min(
            &mut self.notification_ttl_ms,
            file_cfg.notification_ttl_ms,
            MIN_INTERVAL_MS,
        );
        set_opt_u32_min(
            &mut self.reconnect_base_delay_ms,
            file_cfg.reconnect_base_delay_ms,
            MIN_INTERVAL_MS,
        );
        set_opt_u32_min(
            &mut self.reconnect_max_delay_ms,
            file_cfg.reconnect_max_delay_ms,
            MIN_INTERVAL_MS,
        );
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            self.reconnect_max_delay_ms = self.reconnect_base_delay_ms;
        }
    }

    /// Prefixes an absolute endpoint path with the configured API base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Absolute WebSocket URL for the push channel, given the page's location.
    pub fn push_socket_url(&self, page_protocol: &str, page_host: &str) -> String {
        let path = self.push_path.as_str();
        if path.starts_with("ws://") || path.starts_with("wss://") {
            return path.to_string();
        }
        let scheme = if page_protocol.trim_end_matches(':') == "https" {
            "wss"
        } else {
            "ws"
        };
        format!("{scheme}://{page_host}{}", self.endpoint(path))
    }

    /// Delay before reconnect attempt `attempt` (zero-based) of the push socket.
    pub fn reconnect_delay_ms(&self, attempt: u32) -> u32 {
        let multiplier = 2_u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT));
        self.reconnect_base_delay_ms
            .saturating_mul(multiplier)
            .min(self.reconnect_max_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct RepoInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub stars: String,
}

/// Repositories the backend accepts, plus sample instance ids per repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoCatalog {
    pub repos: BTreeMap<String, RepoInfo>,
    pub examples: BTreeMap<String, Vec<String>>,
}

impl RepoCatalog {
    pub fn display_name(&self, repo_key: &str) -> String {
        self.repos
            .get(repo_key)
            .map(|info| info.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(repo_key)
            .to_string()
    }

    pub fn description(&self, repo_key: &str) -> Option<String> {
        let info = self.repos.get(repo_key)?;
        let stars = info.stars.trim();
        if stars.is_empty() {
            Some(info.description.clone())
        } else {
            Some(format!("{} ({stars} ⭐)", info.description))
        }
    }

    /// All examples for one repository.
    pub fn examples_for(&self, repo_key: &str) -> Vec<ExampleIssue> {
        self.examples
            .get(repo_key)
            .map(|ids| {
                ids.iter()
                    .map(|id| ExampleIssue::new(repo_key, id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first example of every repository that has one.
    pub fn default_examples(&self) -> Vec<ExampleIssue> {
        self.examples
            .iter()
            .filter_map(|(repo_key, ids)| ids.first().map(|id| ExampleIssue::new(repo_key, id)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleIssue {
    pub repo_key: String,
    pub instance_id: String,
}

impl ExampleIssue {
    fn new(repo_key: &str, instance_id: &str) -> Self {
        Self {
            repo_key: repo_key.to_string(),
            instance_id: instance_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsoleBootstrap {
    pub config: ConsoleConfig,
    pub catalog: RepoCatalog,
}

impl ConsoleBootstrap {
    pub fn from_json(raw: &str) -> ConsoleResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let root: RootBootstrap =
            serde_json::from_str(raw).map_err(|err| ConsoleError::Config(err.to_string()))?;
        let RootBootstrap {
            config: file_cfg,
            repos,
            examples,
        } = root;

        let mut config = ConsoleConfig::default();
        config.apply_file(file_cfg);

        Ok(Self {
            config,
            catalog: RepoCatalog { repos, examples },
        })
    }

    /// Like [`ConsoleBootstrap::from_json`], but logs and falls back to defaults.
    pub fn load_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match Self::from_json(raw) {
            Ok(bootstrap) => bootstrap,
            Err(err) => {
                tracing::warn!("ignoring console bootstrap: {err}");
                Self::default()
            }
        }
    }
}

fn set_opt<T>(dst: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *dst = v;
    }
}

fn set_opt_u32_min(dst: &mut u32, value: Option<u32>, min: u32) {
    if let Some(v) = value {
        *dst = v.max(min);
    }
}
