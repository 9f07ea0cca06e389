use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::NotifeedConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "notifeed.toml",
    "notifeed.yaml",
    "notifeed.yml",
    "notifeed.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<NotifeedConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./notifeed.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/notifeed/notifeed.{toml,yaml,yml,json}` (user-global)
///
/// Returns `NotifeedConfig::default()` if no config file is found.
pub fn discover_and_load() -> NotifeedConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    NotifeedConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/notifeed/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "notifeed").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory (`~/.local/share/notifeed/` on Linux).
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "notifeed").map(|d| d.data_dir().to_path_buf())
}

/// Directory for watermark files: the configured one, else
/// `<data_dir>/watermarks`, else `./watermarks`.
pub fn watermark_dir(config: &NotifeedConfig) -> PathBuf {
    config.persistence.dir.clone().unwrap_or_else(|| {
        data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("watermarks")
    })
}

/// Apply `GITHUB_TOKEN`, `NOTIFEED_BIND`, `NOTIFEED_PORT` and
/// `NOTIFEED_PERSIST` from the process environment.
pub fn apply_env_overrides(config: &mut NotifeedConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with a custom lookup, for tests.
pub fn apply_env_overrides_with(
    config: &mut NotifeedConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
        config.github.token = Some(Secret::new(token));
    }
    if let Some(bind) = lookup("NOTIFEED_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("NOTIFEED_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid NOTIFEED_PORT"),
        }
    }
    if let Some(persist) = lookup("NOTIFEED_PERSIST") {
        config.persistence.enabled = matches!(
            persist.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<NotifeedConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
