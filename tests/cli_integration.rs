//! CLI integration tests for Stratum.
//!
//! These tests drive the `stratum` binary over small on-disk projects.
//! Tests that need a real compiler skip themselves when it is not on PATH.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the stratum binary command.
fn stratum() -> Command {
    let mut cmd = Command::cargo_bin("stratum").unwrap();
    // Keep the user's toolchain overrides out of the tests
    cmd.env_remove("CXX").env_remove("FC").env_remove("AR");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn have_tools(tools: &[&str]) -> bool {
    let missing: Vec<&&str> = tools.iter().filter(|t| which::which(t).is_err()).collect();
    if !missing.is_empty() {
        eprintln!("skipping: {:?} not found", missing);
    }
    missing.is_empty()
}

/// `<tmp>/demo`: module A (unit foo, library) and module B (program bar).
fn a_b_project(tmp: &Path) -> std::path::PathBuf {
    let root = tmp.join("demo");
    write(
        &root,
        "Stratum.toml",
        "[project]\nname = \"demo\"\nmodules = [\"A\", \"B\"]\n",
    );
    write(&root, "A/module.toml", "units = [\"foo\"]\nlibrary = true\n");
    write(&root, "A/foo.h", "int foo();\n");
    write(&root, "A/foo.cpp", "#include \"A/foo.h\"\nint foo() { return 42; }\n");
    write(&root, "B/module.toml", "programs = [\"bar\"]\n");
    write(
        &root,
        "B/bar.cpp",
        "#include \"A/foo.h\"\nint main() { return foo() == 42 ? 0 : 1; }\n",
    );
    root
}

// ============================================================================
// stratum report
// ============================================================================

#[test]
fn test_report_lists_plan() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .arg("report")
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("project: demo"))
        .stdout(predicate::str::contains("A [A]"))
        .stdout(predicate::str::contains("B/bar"));
}

#[test]
fn test_report_json() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    let output = stratum()
        .args(["report", "--json"])
        .current_dir(&root)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["plan"]["project"], "demo");
    assert_eq!(json["plan"]["libraries"]["A"]["name"], "A");
}

#[test]
fn test_report_from_subdirectory() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .arg("report")
        .current_dir(root.join("B"))
        .assert()
        .success()
        .stdout(predicate::str::contains("project: demo"));
}

#[test]
fn test_standalone_module_uses_project_name() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .args(["--module", "A", "report"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("demo [A]"))
        .stdout(predicate::str::contains("modules (1):"));
}

// ============================================================================
// errors
// ============================================================================

#[test]
fn test_fails_without_manifest() {
    let tmp = temp_dir();

    stratum()
        .arg("report")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stratum.toml"));
}

#[test]
fn test_duplicate_module_is_rejected() {
    let tmp = temp_dir();
    let root = tmp.path();
    write(
        root,
        "Stratum.toml",
        "[project]\nname = \"demo\"\nmodules = [\"A\", \"A/\"]\n",
    );
    write(root, "A/module.toml", "");

    stratum()
        .arg("build-all")
        .current_dir(root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("declared more than once"))
        .stderr(predicate::str::contains("help:"));
}

#[test]
fn test_unknown_target() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .args(["build", "no-such-thing"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no target named `no-such-thing`"));
}

#[test]
fn test_unknown_standalone_module() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .args(["--module", "Z", "report"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not listed in the project"));
}

// ============================================================================
// generated files
// ============================================================================

#[cfg(unix)]
#[test]
fn test_build_generated() {
    let tmp = temp_dir();
    let root = tmp.path();
    write(
        root,
        "Stratum.toml",
        "[project]\nname = \"gen\"\nmodules = [\"data\"]\n",
    );
    write(
        root,
        "data/module.toml",
        r#"
[[generated]]
path = "table.dat"
command = ["sh", "-c", "tr a-z A-Z < seed.txt > table.dat"]
inputs = ["seed.txt"]
"#,
    );
    write(root, "data/seed.txt", "coefficients\n");

    stratum()
        .arg("build-generated")
        .current_dir(root)
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(root.join("data/table.dat")).unwrap(),
        "COEFFICIENTS\n"
    );

    // Shorthand alias resolves to the same file
    stratum()
        .args(["build", "table.dat"])
        .current_dir(root)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 built"));
}

#[cfg(unix)]
#[test]
fn test_failed_generator_reports_output() {
    let tmp = temp_dir();
    let root = tmp.path();
    write(
        root,
        "Stratum.toml",
        "[project]\nname = \"gen\"\nmodules = [\"data\"]\n",
    );
    write(
        root,
        "data/module.toml",
        r#"
[[generated]]
path = "table.dat"
command = ["sh", "-c", "echo 'generator exploded' >&2; exit 3"]
"#,
    );

    stratum()
        .arg("build-all")
        .current_dir(root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to build `data/table.dat`"))
        .stderr(predicate::str::contains("generator exploded"));
}

#[cfg(unix)]
#[test]
fn test_generated_input_from_sibling_module() {
    let tmp = temp_dir();
    let root = tmp.path();
    write(
        root,
        "Stratum.toml",
        "[project]\nname = \"gen\"\nmodules = [\"tools\", \"data\"]\n",
    );
    write(
        root,
        "tools/module.toml",
        r#"
[[generated]]
path = "seed.txt"
command = ["sh", "-c", "echo coefficients > seed.txt"]
"#,
    );
    write(
        root,
        "data/module.toml",
        r#"
[[generated]]
path = "table.dat"
command = ["sh", "-c", "tr a-z A-Z < ../tools/seed.txt > table.dat"]
inputs = ["../tools/seed.txt"]
"#,
    );

    stratum()
        .args(["build", "data/table.dat"])
        .current_dir(root)
        .assert()
        .success()
        .stderr(predicate::str::contains("2 built"));
    assert_eq!(
        fs::read_to_string(root.join("data/table.dat")).unwrap(),
        "COEFFICIENTS\n"
    );
}

#[test]
fn test_broken_project_toolchain_config() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());
    write(&root, ".stratum/toolchain.toml", "[toolchain\ncxx = ");

    stratum()
        .arg("build-generated")
        .current_dir(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse toolchain config"));
}

// ============================================================================
// stratum package
// ============================================================================

#[test]
fn test_package_with_tag() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .args(["package", "--tag", "240101"])
        .current_dir(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-240101.tgz"));

    assert!(tmp.path().join("demo-240101.tgz").is_file());
}

#[test]
fn test_package_missing_source() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());
    fs::remove_file(root.join("B/bar.cpp")).unwrap();

    stratum()
        .args(["package", "--tag", "x"])
        .current_dir(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("B/bar.cpp"));
}

// ============================================================================
// stratum install-include
// ============================================================================

#[test]
fn test_install_include_is_stub() {
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .args(["install-include", "--prefix", "out"])
        .current_dir(&root)
        .assert()
        .success()
        .stderr(predicate::str::contains("not provided"));
    assert!(!root.join("out/include").exists());
}

// ============================================================================
// full builds (need a C++ compiler)
// ============================================================================

#[test]
fn test_build_all_and_install() {
    if !have_tools(&["c++", "ar"]) {
        return;
    }
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());

    stratum()
        .arg("build-all")
        .current_dir(&root)
        .assert()
        .success();

    assert!(root.join("A/foo.o").is_file());
    assert!(root.join("A/libA.a").is_file());
    assert!(root.join(format!("B/bar{}", std::env::consts::EXE_SUFFIX)).is_file());

    // Second build has nothing to do
    stratum()
        .arg("build-all")
        .current_dir(&root)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 built"));

    stratum()
        .args(["install-bin", "--prefix", "stage"])
        .current_dir(&root)
        .assert()
        .success();
    assert!(root
        .join(format!("stage/bin/bar{}", std::env::consts::EXE_SUFFIX))
        .is_file());

    stratum()
        .args(["install-lib", "--prefix", "stage"])
        .current_dir(&root)
        .assert()
        .success();
    assert!(root.join("stage/lib/libA.a").is_file());

    stratum().arg("clean").current_dir(&root).assert().success();
    assert!(!root.join("A/libA.a").exists());
    assert!(root.join("A/foo.cpp").exists());
}

#[test]
fn test_compile_error_names_artifact() {
    if !have_tools(&["c++", "ar"]) {
        return;
    }
    let tmp = temp_dir();
    let root = a_b_project(tmp.path());
    write(&root, "A/foo.cpp", "this is not C++\n");

    stratum()
        .arg("build-libraries")
        .current_dir(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to build `A/foo.o`"));

    assert!(!root.join("A/foo.o").exists());
    assert!(!root.join("A/libA.a").exists());
}
