//! Implementation of `stratum install` and its parts.
//!
//! Every step builds what it installs first and stops at the first failure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::{Aggregate, BuildError};
use crate::core::{ArtifactId, Workspace};
use crate::ops::stratum_build::{build, BuildOptions};
use crate::util::fs::{copy_into, ensure_dir, set_mode};
use crate::util::process::ProcessBuilder;
use crate::util::GlobalContext;

/// Options for the install commands.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Install prefix, overriding `[install].prefix`
    pub prefix: Option<PathBuf>,

    /// Number of parallel jobs for the prerequisite build
    pub jobs: Option<usize>,

    /// Verbose output
    pub verbose: bool,
}

impl InstallOptions {
    fn build_options(&self, agg: Aggregate) -> BuildOptions {
        BuildOptions {
            target: agg.name().to_string(),
            jobs: self.jobs,
            verbose: self.verbose,
        }
    }
}

fn install_dir(prefix: &Path, sub: &str) -> Result<PathBuf> {
    let dir = prefix.join(sub);
    ensure_dir(&dir).map_err(|e| BuildError::InstallTarget {
        path: dir.clone(),
        message: format!("{:#}", e),
    })?;
    Ok(dir)
}

fn install_file(src: &Path, dir: &Path) -> Result<PathBuf> {
    let dst = copy_into(src, dir).map_err(|e| BuildError::InstallTarget {
        path: dir.to_path_buf(),
        message: format!("{:#}", e),
    })?;
    tracing::info!("installed {}", dst.display());
    Ok(dst)
}

/// Build every program and copy the executables into `<prefix>/bin`.
pub fn install_bin(
    ws: &Workspace,
    gctx: &GlobalContext,
    opts: &InstallOptions,
) -> Result<Vec<PathBuf>> {
    build(ws, gctx, &opts.build_options(Aggregate::Programs))?;

    let bin = install_dir(&ws.install_prefix(opts.prefix.as_deref()), "bin")?;
    let plan = ws.plan();
    plan.programs()
        .chain(plan.fortran_programs())
        .map(|program| {
            let exe = ws.abs(&ws.resolver().path(&ArtifactId::executable(program)));
            install_file(&exe, &bin)
        })
        .collect()
}

/// Build every library and copy the archives into `<prefix>/lib`.
pub fn install_lib(
    ws: &Workspace,
    gctx: &GlobalContext,
    opts: &InstallOptions,
) -> Result<Vec<PathBuf>> {
    build(ws, gctx, &opts.build_options(Aggregate::Libraries))?;

    let lib = install_dir(&ws.install_prefix(opts.prefix.as_deref()), "lib")?;
    ws.plan()
        .libraries()
        .map(|library| {
            let archive = ArtifactId::archive(&library.module, &library.name);
            let dst = install_file(&ws.abs(&ws.resolver().path(&archive)), &lib)?;
            set_mode(&dst, 0o644).map_err(|e| BuildError::InstallTarget {
                path: dst.clone(),
                message: format!("{:#}", e),
            })?;
            Ok(dst)
        })
        .collect()
}

/// Header installation is not provided; succeeds without copying.
pub fn install_include(ws: &Workspace, opts: &InstallOptions) -> Result<()> {
    let include = ws.install_prefix(opts.prefix.as_deref()).join("include");
    tracing::info!(
        "header installation is not provided; nothing copied to {}",
        include.display()
    );
    Ok(())
}

/// Install programs, then run the post-install hook.
pub fn install(ws: &Workspace, gctx: &GlobalContext, opts: &InstallOptions) -> Result<()> {
    install_bin(ws, gctx, opts)?;

    let hook = &ws.manifest().install.post_install_hook;
    if let Some((program, args)) = hook.split_first() {
        tracing::info!("running post-install hook `{}`", hook.join(" "));
        let prefix = ws.install_prefix(opts.prefix.as_deref());
        ProcessBuilder::new(program)
            .args(args)
            .env("STRATUM_INSTALL_PREFIX", prefix.display().to_string())
            .cwd(ws.root())
            .exec_and_check()
            .context("post-install hook failed")?;
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::{BuildMode, MANIFEST_NAME};
    use std::fs;
    use tempfile::TempDir;

    fn workspace(dir: &Path, hook: &str) -> Workspace {
        fs::write(
            dir.join(MANIFEST_NAME),
            format!(
                "[project]\nname = \"demo\"\nmodules = []\n\n[install]\npost_install_hook = {}\n",
                hook
            ),
        )
        .unwrap();
        Workspace::load(&dir.join(MANIFEST_NAME), BuildMode::Project).unwrap()
    }

    #[test]
    fn test_install_bin_creates_prefix() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path(), "[]");
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let opts = InstallOptions {
            prefix: Some(tmp.path().join("deep/prefix")),
            ..Default::default()
        };

        let installed = install_bin(&ws, &gctx, &opts).unwrap();
        assert!(installed.is_empty());
        assert!(tmp.path().join("deep/prefix/bin").is_dir());
        // Idempotent
        install_bin(&ws, &gctx, &opts).unwrap();
    }

    #[test]
    fn test_install_runs_hook_after_bin() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(
            tmp.path(),
            r#"["sh", "-c", "test -d \"$STRATUM_INSTALL_PREFIX/bin\" && touch hook-ran"]"#,
        );
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        install(&ws, &gctx, &InstallOptions::default()).unwrap();
        assert!(tmp.path().join("hook-ran").exists());
    }

    #[test]
    fn test_failing_hook_fails_install() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path(), r#"["sh", "-c", "exit 4"]"#);
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let err = install(&ws, &gctx, &InstallOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("post-install hook failed"));
    }

    #[test]
    fn test_install_include_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path(), "[]");
        install_include(&ws, &InstallOptions::default()).unwrap();
        assert!(!tmp.path().join("install/include").exists());
    }

    #[test]
    fn test_unwritable_prefix() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(tmp.path(), "[]");
        let gctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        // A file where the prefix directory should be
        fs::write(tmp.path().join("blocked"), "").unwrap();
        let opts = InstallOptions {
            prefix: Some(tmp.path().join("blocked")),
            ..Default::default()
        };

        let err = install_lib(&ws, &gctx, &opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InstallTarget { .. })
        ));
    }
}
