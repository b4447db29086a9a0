use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the REST paths are appended to, e.g. `http://localhost:8000`
    /// or a deployed prefix such as `https://host/api`
    pub base_url: String,
    /// Per-request timeout; expiry surfaces as a network error
    pub timeout: Duration,
    /// Page size used when `refresh()` walks the list endpoint
    pub page_size: u32,
    /// How long a notice stays visible
    pub notice_ttl: Duration,
    /// Maximum notices kept at once
    pub notice_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout: Duration::from_secs(10),
            page_size: shared_types::DEFAULT_LIST_LIMIT,
            notice_ttl: Duration::from_millis(4000),
            notice_limit: 5,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let page_size = env_parse(&lookup, "SCRIPTS_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(anyhow::anyhow!(
                "Invalid SCRIPTS_PAGE_SIZE=0. Expected at least 1"
            ));
        }

        Ok(Self {
            base_url: lookup("SCRIPTS_API_BASE")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(env_parse(
                &lookup,
                "SCRIPTS_API_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            page_size,
            notice_ttl: Duration::from_millis(env_parse(
                &lookup,
                "SCRIPTS_NOTICE_TTL_MS",
                defaults.notice_ttl.as_millis() as u64,
            )?),
            notice_limit: env_parse(&lookup, "SCRIPTS_NOTICE_LIMIT", defaults.notice_limit)?,
        })
    }
}

fn env_parse<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(default),
    }
}
