use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the REST server binds
    pub addr: String,
    /// Path prefix all routes are nested under ("" for none, e.g. "/api")
    pub base_path: String,
    /// Browser origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Serve `POST /import-url`; when off the route answers 501
    pub import_enabled: bool,
    /// Upper bound for fetching a page during URL import
    pub import_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            base_path: String::new(),
            cors_origins: Vec::new(),
            import_enabled: true,
            import_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. `from_env` reads the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            addr: lookup("SCRIPTS_SERVER_ADDR").unwrap_or(defaults.addr),
            base_path: normalize_base_path(
                &lookup("SCRIPTS_BASE_PATH").unwrap_or(defaults.base_path),
            )?,
            cors_origins: lookup("SCRIPTS_CORS_ORIGINS")
                .map(|raw| parse_csv(&raw))
                .unwrap_or(defaults.cors_origins),
            import_enabled: parse_flag(&lookup, "SCRIPTS_IMPORT_ENABLED", defaults.import_enabled),
            import_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SCRIPTS_IMPORT_TIMEOUT_SECS",
                defaults.import_timeout.as_secs(),
            )?),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
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

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let normalized = v.trim().to_ascii_lowercase();
            normalized != "0" && normalized != "false" && normalized != "no"
        })
        .unwrap_or(default)
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// `"api/"`, `"/api"` and `"/api/"` all become `"/api"`; `""` and `"/"` mean no prefix.
pub fn normalize_base_path(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(char::is_whitespace) || trimmed.contains(['?', '#', '{', '}']) {
        return Err(anyhow::anyhow!(
            "Invalid SCRIPTS_BASE_PATH '{raw}'. Expected a plain path prefix like /api"
        ));
    }
    Ok(format!("/{trimmed}"))
}

/// Nearest `.env` in `start` or one of its ancestors, so running from
/// `script-server/` still picks up a workspace-root file.
pub fn find_env_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())
}
