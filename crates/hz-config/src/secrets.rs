//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (`settings.token_env`).
//! - Binaries call [`resolve_secrets`] once at startup and pass the result
//!   into constructors; no other code reads these env vars.
//! - `Debug` redacts values; errors mention the variable NAME only.

use anyhow::{bail, Result};

use crate::{HortConfig, SourceKind};

/// Secrets resolved from the environment.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Bearer token for the settings API. `None` when no `token_env` is
    /// configured.
    pub settings_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "settings_token",
                &self.settings_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Resolve from the process environment.
pub fn resolve_secrets(cfg: &HortConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(cfg, |name| std::env::var(name).ok())
}

/// Resolve with an explicit lookup (tests pass a map instead of touching the
/// process environment).
///
/// # Errors
/// `SECRETS_MISSING` when `settings.source=http` names a `token_env` that is
/// unset or blank. A memory source never needs a token.
pub fn resolve_secrets_with<F>(cfg: &HortConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var_name) = cfg
        .settings
        .token_env
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return Ok(ResolvedSecrets::default());
    };

    let value = lookup(var_name).filter(|v| !v.trim().is_empty());

    if value.is_none() && cfg.settings.source == SourceKind::Http {
        bail!(
            "SECRETS_MISSING: required env var '{}' (settings api token) is not set or empty",
            var_name
        );
    }

    Ok(ResolvedSecrets {
        settings_token: value,
    })
}
