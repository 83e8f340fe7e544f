//! Typed artifact identifiers and the resolver that turns them into paths.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::module::{ModulePath, QualifiedName};
use crate::util::paths::{exe_suffix, join_affixes};

/// Source language of a compilation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C-family (C or C++)
    C,
    Fortran,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Fortran => "fortran",
        }
    }
}

/// What kind of file an artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Source(Language),
    Header,
    Object,
    Archive,
    SharedObject,
    Executable,
    Generated,
}

/// Kind + owning module + base name.
///
/// The base name is the declared name (`foo`), not the file name
/// (`libfoo.a`); [`ArtifactResolver`] computes file names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArtifactId {
    pub kind: ArtifactKind,
    pub module: ModulePath,
    pub name: String,
}

impl ArtifactId {
    pub fn new(kind: ArtifactKind, module: ModulePath, name: impl Into<String>) -> Self {
        ArtifactId {
            kind,
            module,
            name: name.into(),
        }
    }

    pub fn source(unit: &QualifiedName, lang: Language) -> Self {
        Self::new(ArtifactKind::Source(lang), unit.module.clone(), &unit.name)
    }

    pub fn header(unit: &QualifiedName) -> Self {
        Self::new(ArtifactKind::Header, unit.module.clone(), &unit.name)
    }

    pub fn object(unit: &QualifiedName) -> Self {
        Self::new(ArtifactKind::Object, unit.module.clone(), &unit.name)
    }

    pub fn executable(program: &QualifiedName) -> Self {
        Self::new(ArtifactKind::Executable, program.module.clone(), &program.name)
    }

    pub fn generated(file: &QualifiedName) -> Self {
        Self::new(ArtifactKind::Generated, file.module.clone(), &file.name)
    }

    pub fn archive(module: &ModulePath, library: &str) -> Self {
        Self::new(ArtifactKind::Archive, module.clone(), library)
    }

    pub fn shared_object(module: &ModulePath, library: &str) -> Self {
        Self::new(ArtifactKind::SharedObject, module.clone(), library)
    }

    /// Whether this artifact is produced by the build rather than authored.
    pub fn is_output(&self) -> bool {
        !matches!(self.kind, ArtifactKind::Source(_) | ArtifactKind::Header)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, QualifiedName::new(self.module.clone(), &self.name))
    }
}

/// File extensions used for declared units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceExtensions {
    /// C-family source extension
    pub c: String,
    /// Header extension
    pub header: String,
    /// Fortran source extension
    pub fortran: String,
}

impl Default for SourceExtensions {
    fn default() -> Self {
        SourceExtensions {
            c: "cpp".to_string(),
            header: "h".to_string(),
            fortran: "f90".to_string(),
        }
    }
}

/// Computes project-relative file paths for artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    extensions: SourceExtensions,
    exe_suffix: String,
}

impl ArtifactResolver {
    /// Resolver for the host platform.
    pub fn new(extensions: SourceExtensions) -> Self {
        Self::with_exe_suffix(extensions, exe_suffix())
    }

    pub fn with_exe_suffix(extensions: SourceExtensions, exe_suffix: impl Into<String>) -> Self {
        ArtifactResolver {
            extensions,
            exe_suffix: exe_suffix.into(),
        }
    }

    pub fn extensions(&self) -> &SourceExtensions {
        &self.extensions
    }

    /// File name of an artifact, without its module directory.
    pub fn file_name(&self, id: &ArtifactId) -> String {
        let dotted = |ext: &str| {
            if ext.is_empty() {
                String::new()
            } else {
                format!(".{}", ext)
            }
        };

        match id.kind {
            ArtifactKind::Source(Language::C) => {
                join_affixes("", &id.name, &dotted(&self.extensions.c))
            }
            ArtifactKind::Source(Language::Fortran) => {
                join_affixes("", &id.name, &dotted(&self.extensions.fortran))
            }
            ArtifactKind::Header => join_affixes("", &id.name, &dotted(&self.extensions.header)),
            ArtifactKind::Object => join_affixes("", &id.name, ".o"),
            ArtifactKind::Archive => join_affixes("lib", &id.name, ".a"),
            ArtifactKind::SharedObject => join_affixes("lib", &id.name, ".so"),
            ArtifactKind::Executable => join_affixes("", &id.name, &self.exe_suffix),
            ArtifactKind::Generated => id.name.clone(),
        }
    }

    /// Path relative to the project root.
    pub fn path(&self, id: &ArtifactId) -> PathBuf {
        id.module.join(&self.file_name(id))
    }

    /// Shorthand name used by the alias layer: the last path component.
    pub fn base_name(&self, id: &ArtifactId) -> String {
        let name = self.file_name(id);
        match name.rsplit_once('/') {
            Some((_, base)) => base.to_string(),
            None => name,
        }
    }
}
