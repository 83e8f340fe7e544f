//! Implementation of `stratum package`.
//!
//! Produces `<project>-<tag>.tgz` next to the project directory, holding
//! every declared source and header plus the build-control files.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, HeaderMode};

use crate::builder::BuildError;
use crate::core::{ArtifactId, Language, Workspace};
use crate::util::fs::walk_files;
use crate::util::paths::{normalize_relative, to_slash};

/// Options for the package command.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Archive tag; defaults to today's date as `YYMMDD`
    pub tag: Option<String>,
}

/// Current local date as `YYMMDD`.
pub fn date_tag() -> String {
    chrono::Local::now().format("%y%m%d").to_string()
}

/// `<project>-<tag>.tgz`
pub fn archive_name(project: &str, tag: &str) -> String {
    format!("{}-{}.tgz", project, tag)
}

/// Every file that goes into the distribution, relative to the root,
/// sorted and de-duplicated.
pub fn constituents(ws: &Workspace) -> Result<Vec<PathBuf>> {
    let plan = ws.plan();
    let resolver = ws.resolver();

    // Generated files with a rule are build outputs, not distribution inputs
    let outputs: BTreeSet<PathBuf> = plan
        .generated()
        .filter(|(_, rule)| rule.is_some())
        .map(|(file, _)| resolver.path(&ArtifactId::generated(file)))
        .collect();

    let mut files = BTreeSet::new();
    for header in plan.headers() {
        files.insert(resolver.path(&ArtifactId::header(header)));
    }
    for (unit, has_header) in plan.units() {
        files.insert(resolver.path(&ArtifactId::source(unit, Language::C)));
        if has_header {
            files.insert(resolver.path(&ArtifactId::header(unit)));
        }
    }
    for unit in plan.fortran_units().chain(plan.fortran_programs()) {
        files.insert(resolver.path(&ArtifactId::source(unit, Language::Fortran)));
    }
    for program in plan.programs().chain(plan.test_programs()) {
        files.insert(resolver.path(&ArtifactId::source(program, Language::C)));
    }
    for (file, rule) in plan.generated() {
        if rule.is_none() {
            files.insert(resolver.path(&ArtifactId::generated(file)));
        }
    }
    files.extend(ws.control_files().iter().cloned());

    for extra in &ws.manifest().dist.extra {
        let rel = normalize_relative(Path::new(&extra.replace('\\', "/")))
            .filter(|rel| !rel.as_os_str().is_empty())
            .ok_or_else(|| BuildError::Packaging {
                path: PathBuf::from(extra),
                message: "extra entry must name a path inside the project".to_string(),
            })?;
        let abs = ws.abs(&rel);
        if abs.is_dir() {
            files.extend(walk_files(ws.root(), &abs)?);
        } else {
            files.insert(rel);
        }
    }

    let mut files: Vec<PathBuf> = files.difference(&outputs).cloned().collect();
    files.sort();
    Ok(files)
}

/// Write the distribution archive and return its path.
pub fn package(ws: &Workspace, opts: &PackageOptions) -> Result<PathBuf> {
    let root = ws
        .root()
        .canonicalize()
        .with_context(|| format!("failed to resolve project root {}", ws.root().display()))?;
    let dir_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("project root has no directory name")?;
    let parent = root.parent().context("project root has no parent directory")?;

    let tag = opts.tag.clone().unwrap_or_else(date_tag);
    let output = parent.join(archive_name(ws.plan().project(), &tag));

    let files = constituents(ws)?;
    for file in &files {
        if !root.join(file).is_file() {
            return Err(BuildError::Packaging {
                path: file.clone(),
                message: "declared file does not exist".to_string(),
            }
            .into());
        }
    }

    write_archive(&root, &dir_name, &files, &output).inspect_err(|_| {
        let _ = std::fs::remove_file(&output);
    })?;

    tracing::info!("packaged {} file(s) into {}", files.len(), output.display());
    Ok(output)
}

fn write_archive(root: &Path, dir_name: &str, files: &[PathBuf], output: &Path) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());

    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(true);
    builder.mode(HeaderMode::Deterministic);

    for rel in files {
        let name = format!("{}/{}", dir_name, to_slash(rel));
        builder
            .append_path_with_name(root.join(rel), &name)
            .map_err(|e| BuildError::Packaging {
                path: rel.clone(),
                message: e.to_string(),
            })?;
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .with_context(|| format!("failed to finish {}", output.display()))?;
    Ok(())
}
