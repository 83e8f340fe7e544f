//! Module identity and declaration kinds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize, Serializer};

use crate::util::paths::{module_dir_name, module_join, strip_trailing_separator};

/// Relative directory path identifying a module.
///
/// Normalized on construction: forward slashes, no trailing separator, no
/// leading `./`. The project root is `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModulePath(String);

impl ModulePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let slashed = path.as_ref().replace('\\', "/");
        let mut s = strip_trailing_separator(&slashed);
        while let Some(rest) = s.strip_prefix("./") {
            s = rest;
        }
        if s.is_empty() {
            ModulePath(".".to_string())
        } else {
            ModulePath(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The project root module (`.`).
    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// Last path component, or `None` for the root module.
    pub fn dir_name(&self) -> Option<&str> {
        module_dir_name(&self.0)
    }

    /// Path of `name` inside this module, relative to the project root.
    pub fn join(&self, name: &str) -> PathBuf {
        module_join(&self.0, name)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name namespaced by its owning module, e.g. `libs/basis/lsjt`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    pub module: ModulePath,
    pub name: String,
}

impl QualifiedName {
    pub fn new(module: ModulePath, name: impl Into<String>) -> Self {
        QualifiedName {
            module,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.module, self.name)
        }
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The seven things a module can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// Header-only unit (`name.h`)
    HeaderUnit,
    /// Compiled C-family unit (`name.cpp` + `name.h`)
    CompiledUnit,
    /// Fortran unit (`name.f90`)
    FortranUnit,
    /// C-family program
    Program,
    /// C-family test program, excluded from default builds
    TestProgram,
    /// Fortran program
    FortranProgram,
    /// Project-defined generated file, by module-relative path
    Generated,
}

impl DeclKind {
    pub const ALL: [DeclKind; 7] = [
        DeclKind::HeaderUnit,
        DeclKind::CompiledUnit,
        DeclKind::FortranUnit,
        DeclKind::Program,
        DeclKind::TestProgram,
        DeclKind::FortranProgram,
        DeclKind::Generated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::HeaderUnit => "header unit",
            DeclKind::CompiledUnit => "compiled unit",
            DeclKind::FortranUnit => "Fortran unit",
            DeclKind::Program => "program",
            DeclKind::TestProgram => "test program",
            DeclKind::FortranProgram => "Fortran program",
            DeclKind::Generated => "generated file",
        }
    }

    /// Whether declarations of this kind produce a `<name>.o` object.
    pub fn produces_object(&self) -> bool {
        matches!(
            self,
            DeclKind::CompiledUnit
                | DeclKind::FortranUnit
                | DeclKind::Program
                | DeclKind::TestProgram
                | DeclKind::FortranProgram
        )
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a generated file is produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRule {
    /// Program and arguments, run in the module directory
    #[serde(default)]
    pub command: Vec<String>,

    /// Module-relative inputs; an input naming another artifact's file
    /// depends on that artifact
    #[serde(default)]
    pub inputs: Vec<String>,
}

/// Everything a single module has declared so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleContribution {
    pub headers: BTreeSet<String>,
    /// Compiled units and whether each declares a header
    pub units: BTreeMap<String, bool>,
    pub fortran_units: BTreeSet<String>,
    pub programs: BTreeSet<String>,
    pub test_programs: BTreeSet<String>,
    pub fortran_programs: BTreeSet<String>,
    pub generated: BTreeMap<String, Option<GeneratedRule>>,
    pub library: bool,
    pub shared_library: bool,
}

impl ModuleContribution {
    /// Append names for one declaration kind.
    pub fn extend<I, S>(&mut self, kind: DeclKind, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            match kind {
                DeclKind::HeaderUnit => {
                    self.headers.insert(name);
                }
                DeclKind::CompiledUnit => {
                    self.units.insert(name, true);
                }
                DeclKind::FortranUnit => {
                    self.fortran_units.insert(name);
                }
                DeclKind::Program => {
                    self.programs.insert(name);
                }
                DeclKind::TestProgram => {
                    self.test_programs.insert(name);
                }
                DeclKind::FortranProgram => {
                    self.fortran_programs.insert(name);
                }
                DeclKind::Generated => {
                    self.generated.entry(name).or_insert(None);
                }
            }
        }
    }

    /// Names declared under `kind`, in sorted order.
    pub fn names(&self, kind: DeclKind) -> Vec<&str> {
        match kind {
            DeclKind::HeaderUnit => self.headers.iter().map(String::as_str).collect(),
            DeclKind::CompiledUnit => self.units.keys().map(String::as_str).collect(),
            DeclKind::FortranUnit => self.fortran_units.iter().map(String::as_str).collect(),
            DeclKind::Program => self.programs.iter().map(String::as_str).collect(),
            DeclKind::TestProgram => self.test_programs.iter().map(String::as_str).collect(),
            DeclKind::FortranProgram => {
                self.fortran_programs.iter().map(String::as_str).collect()
            }
            DeclKind::Generated => self.generated.keys().map(String::as_str).collect(),
        }
    }

    /// Find the first base name that two object-producing kinds share.
    pub fn object_name_clash(&self) -> Option<(String, DeclKind, DeclKind)> {
        let mut seen: BTreeMap<&str, DeclKind> = BTreeMap::new();
        for kind in DeclKind::ALL.into_iter().filter(DeclKind::produces_object) {
            for name in self.names(kind) {
                if let Some(first) = seen.insert(name, kind) {
                    return Some((name.to_string(), first, kind));
                }
            }
        }
        None
    }
}
