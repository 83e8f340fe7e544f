//! Toolchain configuration files.
//!
//! Stratum reads toolchain settings from two locations:
//! - Global: `~/.stratum/toolchain.toml` - per-machine defaults
//! - Project: `.stratum/toolchain.toml` - project-specific overrides
//!
//! Project config takes precedence over global config. The commands named
//! here are used opaquely; Stratum never probes what kind of compiler they are.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Toolchain configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Compiler, archiver and linker settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// C-family compiler, also the link driver for C-family programs
    pub cxx: Option<PathBuf>,

    /// Fortran compiler, also the link driver for Fortran programs
    pub fc: Option<PathBuf>,

    /// Archiver
    pub ar: Option<PathBuf>,

    /// C-family compile flags
    pub cflags: Vec<String>,

    /// Fortran compile flags
    pub fflags: Vec<String>,

    /// Flags for every executable link
    pub ldflags: Vec<String>,

    /// Flags that turn a link into a shared-object link
    pub shared_flags: Vec<String>,

    /// Archiver operation flags
    pub ar_flags: Vec<String>,

    /// Trailing libraries for every executable link (e.g. `-lgfortran`)
    pub libs: Vec<String>,

    /// Wrap archives in `--start-group`/`--end-group` when linking
    pub group_archives: Option<bool>,

    /// Parallel actions; defaults to the number of CPUs
    pub jobs: Option<usize>,
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load toolchain configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load toolchain config from {}: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        let other = other.toolchain;
        let this = &mut self.toolchain;

        if other.cxx.is_some() {
            this.cxx = other.cxx;
        }
        if other.fc.is_some() {
            this.fc = other.fc;
        }
        if other.ar.is_some() {
            this.ar = other.ar;
        }
        if !other.cflags.is_empty() {
            this.cflags = other.cflags;
        }
        if !other.fflags.is_empty() {
            this.fflags = other.fflags;
        }
        if !other.ldflags.is_empty() {
            this.ldflags = other.ldflags;
        }
        if !other.shared_flags.is_empty() {
            this.shared_flags = other.shared_flags;
        }
        if !other.ar_flags.is_empty() {
            this.ar_flags = other.ar_flags;
        }
        if !other.libs.is_empty() {
            this.libs = other.libs;
        }
        if other.group_archives.is_some() {
            this.group_archives = other.group_archives;
        }
        if other.jobs.is_some() {
            this.jobs = other.jobs;
        }
    }

    /// Apply `CXX`, `FC` and `AR` from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cxx) = lookup("CXX").filter(|v| !v.is_empty()) {
            self.toolchain.cxx = Some(PathBuf::from(cxx));
        }
        if let Some(fc) = lookup("FC").filter(|v| !v.is_empty()) {
            self.toolchain.fc = Some(PathBuf::from(fc));
        }
        if let Some(ar) = lookup("AR").filter(|v| !v.is_empty()) {
            self.toolchain.ar = Some(PathBuf::from(ar));
        }
    }
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Environment (`CXX`, `FC`, `AR`)
/// 2. Project config (.stratum/toolchain.toml)
/// 3. Global config (~/.stratum/toolchain.toml)
/// 4. Defaults
///
/// A broken global file is logged and skipped; a broken project file is an
/// error.
pub fn load_toolchain_config(
    global_path: Option<&Path>,
    project_path: &Path,
) -> Result<ToolchainConfig> {
    let mut config = ToolchainConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ToolchainConfig::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(ToolchainConfig::load(project_path)?);
    }
    config.apply_env(|key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global stratum config directory (~/.stratum).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stratum"))
}

/// Get the project toolchain config path (.stratum/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".stratum").join("toolchain.toml")
}
