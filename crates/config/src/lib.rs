//! Process-wide settings for the scent cache.
//!
//! A [`Config`] is resolved once at startup and handed by reference to the
//! path resolver and file store. It carries two values that never change for
//! the lifetime of the process:
//!
//! - the **cache root**, `{temp dir}/scent-{user}` unless configured, and
//! - the **task identifier**, a namespace for everything one run produces,
//!   defaulting to the local month/day/hour (`MMDDHH`).
//!
//! `root` and `task_ident` are layered with [figment], later sources winning:
//!
//! 1. `scent.toml` in the platform config directory (keys `root`, `user`,
//!    `task_ident`),
//! 2. `SCENT_ROOT`,
//! 3. `SCENT_TASK_IDENT`, read verbatim.
//!
//! The user name comes from the first non-empty of `SCENT_USER`, `USER`, the
//! file's `user` and `USERNAME`. Environment values are read verbatim: figment
//! would parse `USER=1000` or `031514` as numbers.

pub mod clock;
pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default task identifier.
pub const TASK_IDENT_ENV: &str = "SCENT_TASK_IDENT";
/// Environment variable overriding the user the cache root is named after.
pub const USER_ENV: &str = "SCENT_USER";
/// Prefix of every other scent environment variable.
const ENV_PREFIX: &str = "SCENT_";
/// Prefix of the cache root directory name inside the temp directory.
const ROOT_PREFIX: &str = "scent-";

/// Raw settings as they come out of figment.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    root: Option<PathBuf>,
    user: Option<String>,
    task_ident: Option<String>,
}

/// Resolved cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    root: PathBuf,
    task_ident: String,
}
impl Config {
    /// Build a configuration from explicit values, bypassing every source.
    pub fn new(root: impl Into<PathBuf>, task_ident: impl Into<String>) -> Self {
        Self { root: root.into(), task_ident: task_ident.into() }
    }

    /// Resolve the configuration from the default sources.
    pub fn load() -> Result<Self> {
        Self::from_figment(&Self::figment())
    }

    /// The default layering of configuration sources.
    pub fn figment() -> Figment {
        let mut figment = Figment::new();
        if let Some(file) = config_file() {
            // Missing files are an empty provider, not an error.
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).only(&["root"]))
    }

    /// Resolve the configuration from an arbitrary figment.
    ///
    /// The user and task identifier environment variables are consulted here
    /// rather than through figment, which would parse `USER=1000` as a number
    /// and strip the leading zero from an identifier such as `031514`.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract().or_raise(|| ErrorKind::Provider)?;
        let root = match settings.root {
            Some(root) if !root.is_absolute() => exn::bail!(ErrorKind::InvalidRoot(root)),
            Some(root) => root,
            None => resolve_cache_root(&current_user(settings.user)?),
        };
        let task_ident = task_ident_override()
            .or(settings.task_ident.filter(|ident| !ident.is_empty()))
            .unwrap_or_else(default_task_ident);
        tracing::debug!(root = %root.display(), task_ident = %task_ident, "Resolved cache configuration");
        Ok(Self { root, task_ident })
    }

    /// The cache root every artifact is written beneath.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The task identifier namespacing the current run.
    pub fn task_ident(&self) -> &str {
        &self.task_ident
    }
}

/// `{system temp dir}/scent-{user}`.
pub fn resolve_cache_root(user: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{ROOT_PREFIX}{user}"))
}

/// The task identifier used when none is configured: local time at hour
/// granularity, so every run within the same hour shares a namespace.
pub fn default_task_ident() -> String {
    clock::hourly_ident(clock::now())
}

/// A non-empty `SCENT_TASK_IDENT`, if set.
pub fn task_ident_override() -> Option<String> {
    env_var(TASK_IDENT_ENV)
}

/// `SCENT_USER`, then `USER`, then the configured `user`, then `USERNAME`.
fn current_user(configured: Option<String>) -> Result<String> {
    let candidates = [env_var(USER_ENV), env_var("USER"), configured, env_var("USERNAME")];
    match candidates.into_iter().flatten().find(|user| !user.is_empty()) {
        Some(user) => Ok(user),
        None => exn::bail!(ErrorKind::MissingUser),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "scent").map(|dirs| dirs.config_dir().join("scent.toml"))
}
