//! Toolchain command generation.
//!
//! The toolchain is whatever the configuration names: Stratum only decides
//! argument order. Every command runs with the project root as working
//! directory, so all paths passed in are project-relative.

use std::path::{Path, PathBuf};

use crate::core::artifact::Language;
use crate::util::config::ToolchainConfig;
use crate::util::process::find_executable;

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++", "gfortran")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add paths as arguments.
    fn paths<'a>(self, paths: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        self.args(paths.into_iter().map(|p| p.display().to_string()))
    }

    /// Render the command for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Input for a compile command.
#[derive(Debug, Clone)]
pub struct CompileInput<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
}

/// Input for archive and link commands.
#[derive(Debug, Clone)]
pub struct LinkInput<'a> {
    pub objects: &'a [PathBuf],
    pub archives: &'a [PathBuf],
    pub output: &'a Path,
}

/// Configured compilers, archiver and flags.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cxx: PathBuf,
    fc: PathBuf,
    ar: PathBuf,
    cflags: Vec<String>,
    fflags: Vec<String>,
    ldflags: Vec<String>,
    shared_flags: Vec<String>,
    ar_flags: Vec<String>,
    libs: Vec<String>,
    group_archives: bool,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain::from_config(&ToolchainConfig::default())
    }
}

impl Toolchain {
    /// Build a toolchain from configuration, filling in defaults.
    pub fn from_config(config: &ToolchainConfig) -> Self {
        let t = &config.toolchain;
        let or = |flags: &Vec<String>, default: &[&str]| {
            if flags.is_empty() {
                default.iter().map(|s| s.to_string()).collect()
            } else {
                flags.clone()
            }
        };

        Toolchain {
            cxx: t.cxx.clone().unwrap_or_else(|| PathBuf::from("c++")),
            fc: t.fc.clone().unwrap_or_else(|| PathBuf::from("gfortran")),
            ar: t.ar.clone().unwrap_or_else(|| PathBuf::from("ar")),
            cflags: t.cflags.clone(),
            fflags: t.fflags.clone(),
            ldflags: t.ldflags.clone(),
            shared_flags: or(&t.shared_flags, &["-shared"]),
            // `D` zeroes timestamps and uids so archives are reproducible
            ar_flags: or(&t.ar_flags, &["rcsD"]),
            libs: t.libs.clone(),
            group_archives: t.group_archives.unwrap_or(cfg!(target_os = "linux")),
        }
    }

    /// Compiler (and link driver) for a language.
    pub fn driver(&self, lang: Language) -> &Path {
        match lang {
            Language::C => &self.cxx,
            Language::Fortran => &self.fc,
        }
    }

    pub fn archiver(&self) -> &Path {
        &self.ar
    }

    /// `<driver> <flags> -I. -c <source> -o <output>`
    pub fn compile_command(&self, lang: Language, input: &CompileInput<'_>) -> CommandSpec {
        let flags = match lang {
            Language::C => &self.cflags,
            Language::Fortran => &self.fflags,
        };

        CommandSpec::new(self.driver(lang))
            .args(flags.iter().cloned())
            .arg("-I.")
            .arg("-c")
            .arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
    }

    /// `<ar> <ar_flags> <output> <objects...>`
    pub fn archive_command(&self, input: &LinkInput<'_>) -> CommandSpec {
        CommandSpec::new(&self.ar)
            .args(self.ar_flags.iter().cloned())
            .arg(input.output.display().to_string())
            .paths(input.objects)
    }

    /// `<cxx> <shared_flags> -o <output> <objects...> <ldflags>`
    pub fn shared_command(&self, input: &LinkInput<'_>) -> CommandSpec {
        CommandSpec::new(&self.cxx)
            .args(self.shared_flags.iter().cloned())
            .arg("-o")
            .arg(input.output.display().to_string())
            .paths(input.objects)
            .args(self.ldflags.iter().cloned())
    }

    /// `<driver> <ldflags> -o <output> <objects...> <archives...> <libs>`
    pub fn link_exe_command(&self, lang: Language, input: &LinkInput<'_>) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.driver(lang))
            .args(self.ldflags.iter().cloned())
            .arg("-o")
            .arg(input.output.display().to_string())
            .paths(input.objects);

        if self.group_archives && input.archives.len() > 1 {
            cmd = cmd
                .arg("-Wl,--start-group")
                .paths(input.archives)
                .arg("-Wl,--end-group");
        } else {
            cmd = cmd.paths(input.archives);
        }

        cmd.args(self.libs.iter().cloned())
    }

    /// Configured programs that cannot be found on PATH.
    pub fn missing_tools<'a>(&self, tools: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
        tools
            .into_iter()
            .filter(|tool| find_executable(tool).is_none())
            .map(Path::to_path_buf)
            .collect()
    }
}
