//! Configuration validation.
//!
//! Checks a loaded [`NotifeedConfig`] for values that would make the proxy
//! fail at runtime or behave surprisingly, and reports them as diagnostics.

use std::net::IpAddr;

use secrecy::ExposeSecret;

use crate::schema::{MAX_PER_PAGE, NotifeedConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "github.token"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics of the given severity.
    pub fn of(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

pub fn validate(config: &NotifeedConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match config.github.token.as_ref().map(|t| t.expose_secret()) {
        None => result.push(
            Severity::Error,
            "github.token",
            "no GitHub token configured (set GITHUB_TOKEN)",
        ),
        Some(token) if token.trim().is_empty() => {
            result.push(Severity::Error, "github.token", "GitHub token is empty")
        },
        Some(token) if token.contains("${") => result.push(
            Severity::Error,
            "github.token",
            "GitHub token contains an unresolved ${...} placeholder",
        ),
        Some(_) => {},
    }

    if let Err(e) = url::Url::parse(&config.github.api_url) {
        result.push(
            Severity::Error,
            "github.api_url",
            format!("invalid URL {:?}: {e}", config.github.api_url),
        );
    }

    if config.github.per_page == 0 || config.github.per_page > MAX_PER_PAGE {
        result.push(
            Severity::Warning,
            "github.per_page",
            format!(
                "{} is outside 1..={MAX_PER_PAGE}, using {}",
                config.github.per_page,
                config.github.page_size()
            ),
        );
    }

    if config.github.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "github.timeout_secs",
            "timeout must be at least one second",
        );
    }

    if config.server.port == 0 {
        result.push(Severity::Error, "server.port", "port must be non-zero");
    }

    match config.server.bind.parse::<IpAddr>() {
        Ok(ip) if !ip.is_loopback() => result.push(
            Severity::Warning,
            "server.bind",
            format!(
                "binding to {ip} exposes your notifications without authentication"
            ),
        ),
        Ok(_) => {},
        Err(_) => result.push(
            Severity::Info,
            "server.bind",
            format!("{:?} is not an IP address, resolving as a host name", config.server.bind),
        ),
    }

    if config.feed.max_entries == Some(0) {
        result.push(
            Severity::Warning,
            "feed.max_entries",
            "a cap of 0 keeps no history: only new notifications are ever shown",
        );
    }

    result
}
