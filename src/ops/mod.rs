//! High-level operations.
//!
//! This module contains the implementation of Stratum commands.

pub mod stratum_build;
pub mod stratum_clean;
pub mod stratum_install;
pub mod stratum_package;
pub mod stratum_report;

pub use stratum_build::{artifact_graph, build, toolchain_config, BuildOptions};
pub use stratum_clean::clean;
pub use stratum_install::{install, install_bin, install_include, install_lib, InstallOptions};
pub use stratum_package::{archive_name, constituents, date_tag, package, PackageOptions};
pub use stratum_report::{format_report, report, ReportFormat};
