//! Semantic checks on a parsed [`BridgeConfig`].
//!
//! Parsing already rejects malformed files; this catches configs that parse
//! but cannot work (bad URLs, duplicate chat ids) and flags suspicious but
//! harmless entries as warnings.

use std::collections::HashSet;

use secrecy::ExposeSecret;

use crate::schema::BridgeConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "url", "duplicate", "unused", "security", "relay"
    pub category: &'static str,
    /// Dotted path, e.g. "groups[2].alias"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.category, self.path, self.message
        )
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

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a parsed config.
pub fn validate(config: &BridgeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_ws_url(&mut result, "bot.url", &config.bot.url);
    check_ws_url(&mut result, "hub.url", &config.hub.url);

    if config.hub.secret_key.expose_secret().is_empty() {
        result.push(
            Severity::Warning,
            "security",
            "hub.secret_key",
            "secret key is empty; the hub will likely reject the register request",
        );
    }

    if config.relay.reconnect_delay_secs == 0 {
        result.push(
            Severity::Error,
            "relay",
            "relay.reconnect_delay_secs",
            "reconnect delay must be at least one second",
        );
    }

    let mut seen = HashSet::new();
    for (i, group) in config.groups.iter().enumerate() {
        let path = format!("groups[{i}]");
        if !seen.insert(group.id) {
            result.push(
                Severity::Error,
                "duplicate",
                format!("{path}.id"),
                format!("group {} is configured more than once", group.id),
            );
        }
        if !group.listen && !group.post {
            result.push(
                Severity::Warning,
                "unused",
                path.clone(),
                format!("group {} has neither listen nor post enabled", group.id),
            );
        }
        if group.alias.is_some() && !group.listen {
            result.push(
                Severity::Warning,
                "unused",
                format!("{path}.alias"),
                "alias is only used for listened groups",
            );
        }
    }

    let mut seen = HashSet::new();
    for (i, friend) in config.friends.iter().enumerate() {
        let path = format!("friends[{i}]");
        if !seen.insert(friend.id) {
            result.push(
                Severity::Error,
                "duplicate",
                format!("{path}.id"),
                format!("friend {} is configured more than once", friend.id),
            );
        }
        if !friend.listen && !friend.post {
            result.push(
                Severity::Warning,
                "unused",
                path,
                format!("friend {} has neither listen nor post enabled", friend.id),
            );
        }
    }

    result
}

fn check_ws_url(result: &mut ValidationResult, path: &str, raw: &str) {
    if raw.trim().is_empty() {
        result.push(Severity::Error, "url", path, "URL is required");
        return;
    }
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => {},
        Ok(url) => result.push(
            Severity::Error,
            "url",
            path,
            format!("expected a ws:// or wss:// URL, got scheme `{}`", url.scheme()),
        ),
        Err(e) => result.push(Severity::Error, "url", path, format!("invalid URL: {e}")),
    }
}
