//! Path and name helpers.
//!
//! These are pure string/path functions with no filesystem access.

use std::path::{Component, Path, PathBuf};

/// Strip any trailing path separators from `path`.
///
/// A path made only of separators is returned unchanged so that `/` stays
/// the filesystem root.
pub fn strip_trailing_separator(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        path
    } else {
        trimmed
    }
}

/// Join a prefix and suffix around a base name (`lib` + `foo` + `.a`).
pub fn join_affixes(prefix: &str, base: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + base.len() + suffix.len());
    out.push_str(prefix);
    out.push_str(base);
    out.push_str(suffix);
    out
}

/// Name of the directory a module lives in: the last component of its path.
///
/// Returns `None` for the project root (`.`) or an empty path.
pub fn module_dir_name(module_path: &str) -> Option<&str> {
    let trimmed = strip_trailing_separator(module_path);
    let name = trimmed.rsplit(['/', '\\']).next()?;
    if name.is_empty() || name == "." {
        None
    } else {
        Some(name)
    }
}

/// Executable suffix for the host (`.exe` on Windows, empty elsewhere).
pub fn exe_suffix() -> &'static str {
    std::env::consts::EXE_SUFFIX
}

/// Join a module-relative name onto a module path, treating `.` as the root.
pub fn module_join(module_path: &str, name: &str) -> PathBuf {
    if module_path.is_empty() || module_path == "." {
        PathBuf::from(name)
    } else {
        Path::new(module_path).join(name)
    }
}

/// Resolve `.` and `..` in a project-relative path without touching the
/// filesystem.
///
/// Returns `None` for absolute paths and for paths that climb above the
/// project root.
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.into_iter().collect())
}

/// Render a path with forward slashes regardless of host.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
