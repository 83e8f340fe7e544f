//! Implementation of `stratum report`.
//!
//! Read-only: describes the finalized plan without touching the toolchain.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use crate::core::{BuildMode, Library, ProjectPlan, QualifiedName, Workspace};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    mode: &'a BuildMode,
    plan: &'a ProjectPlan,
}

/// Render the plan in the requested format.
pub fn report(ws: &Workspace, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(format_report(ws.plan())),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport {
            mode: ws.mode(),
            plan: ws.plan(),
        })?),
    }
}

fn section<'a>(out: &mut String, title: &str, items: impl Iterator<Item = &'a QualifiedName>) {
    let items: Vec<String> = items.map(ToString::to_string).collect();
    let _ = writeln!(out, "{} ({}):", title, items.len());
    for item in items {
        let _ = writeln!(out, "  {}", item);
    }
}

/// Human-readable summary of a plan.
pub fn format_report(plan: &ProjectPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "project: {}", plan.project());

    let _ = writeln!(out, "modules ({}):", plan.len());
    for module in plan.modules() {
        let _ = writeln!(out, "  {}", module);
    }

    let libraries: Vec<&Library> = plan.libraries().collect();
    let _ = writeln!(out, "libraries ({}):", libraries.len());
    for lib in &libraries {
        let shared = if lib.shared { " (+shared)" } else { "" };
        let _ = writeln!(out, "  {} [{}]{}", lib.name, lib.module, shared);
    }

    section(&mut out, "programs", plan.programs());
    section(&mut out, "test programs", plan.test_programs());
    section(&mut out, "Fortran programs", plan.fortran_programs());
    section(&mut out, "generated files", plan.generated().map(|(file, _)| file));

    let _ = writeln!(out, "library units:");
    for lib in &libraries {
        let units: Vec<&str> = plan
            .module_units(&lib.module)
            .map(|(unit, _)| unit.name.as_str())
            .chain(plan.module_fortran_units(&lib.module).map(|u| u.name.as_str()))
            .collect();
        if units.is_empty() {
            let _ = writeln!(out, "  {}: (empty)", lib.name);
        } else {
            let _ = writeln!(out, "  {}: {}", lib.name, units.join(" "));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclKind, ModulePath, ModuleRegistry};

    fn plan() -> ProjectPlan {
        let a = ModulePath::new("libs/A");
        let b = ModulePath::new("B");
        let mut reg = ModuleRegistry::new("demo");
        reg.begin_module(&a).unwrap();
        reg.declare(&a, DeclKind::CompiledUnit, ["foo"]).unwrap();
        reg.declare(&a, DeclKind::FortranUnit, ["solver"]).unwrap();
        reg.request_library(&a, true).unwrap();
        reg.end_module(&a).unwrap();
        reg.begin_module(&b).unwrap();
        reg.declare(&b, DeclKind::Program, ["bar"]).unwrap();
        reg.declare(&b, DeclKind::TestProgram, ["bar_test"]).unwrap();
        reg.request_library(&b, false).unwrap();
        reg.end_module(&b).unwrap();
        reg.finalize(&BuildMode::Project.naming("demo")).unwrap()
    }

    #[test]
    fn test_text_report() {
        let text = format_report(&plan());
        assert!(text.contains("project: demo"));
        assert!(text.contains("modules (2):\n  B\n  libs/A\n"));
        assert!(text.contains("  A [libs/A] (+shared)"));
        assert!(text.contains("programs (1):\n  B/bar\n"));
        assert!(text.contains("test programs (1):\n  B/bar_test\n"));
        assert!(text.contains("  A: foo solver"));
        assert!(text.contains("  B: (empty)"));
    }

    #[test]
    fn test_json_report_shape() {
        let json = serde_json::to_value(JsonReport {
            mode: &BuildMode::Project,
            plan: &plan(),
        })
        .unwrap();
        assert_eq!(json["plan"]["project"], "demo");
        assert_eq!(json["plan"]["programs"][0], "B/bar");
        assert_eq!(json["mode"]["mode"], "project");
    }
}
