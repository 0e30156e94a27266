//! Pipeline build context - what a pipeline run is building or testing

use crate::core::{
    arch::Arch,
    config::{Configuration, Package, Subpackage},
};

/// Execution context for a pipeline run
///
/// Holds either a build or a test context, never both, along with the
/// package being processed and optionally the subpackage in scope.
#[derive(Debug, Clone)]
pub struct PipelineBuild {
    pub mode: Mode,
    pub package: Package,
    pub subpackage: Option<Subpackage>,
}

/// Build or test mode
#[derive(Debug, Clone)]
pub enum Mode {
    Build(BuildContext),
    Test(TestContext),
}

/// Facts only meaningful when building
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub configuration: Configuration,

    /// Architecture being built for
    pub arch: Arch,

    /// Architecture of the build host
    pub host_arch: Arch,

    /// Build options enabled for this build
    pub enabled_options: Vec<String>,
}

/// Facts available when testing
#[derive(Debug, Clone)]
pub struct TestContext {
    pub configuration: Configuration,
}

impl BuildContext {
    pub fn new(configuration: Configuration, arch: Arch) -> Self {
        Self {
            configuration,
            arch,
            host_arch: arch,
            enabled_options: Vec::new(),
        }
    }

    pub fn with_host_arch(mut self, host_arch: Arch) -> Self {
        self.host_arch = host_arch;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.enabled_options = options;
        self
    }

    pub fn host_triplet_gnu(&self) -> String {
        self.host_arch.to_triplet("gnu")
    }

    pub fn host_triplet_rust(&self) -> String {
        self.host_arch.to_rust_triplet("gnu")
    }
}

impl PipelineBuild {
    /// Context for building the main package
    pub fn build(context: BuildContext) -> Self {
        let package = context.configuration.package.clone();
        Self {
            mode: Mode::Build(context),
            package,
            subpackage: None,
        }
    }

    /// Context for testing the main package
    pub fn test(configuration: Configuration) -> Self {
        let package = configuration.package.clone();
        Self {
            mode: Mode::Test(TestContext { configuration }),
            package,
            subpackage: None,
        }
    }

    /// Narrow the context to one subpackage
    pub fn for_subpackage(mut self, subpackage: Subpackage) -> Self {
        self.subpackage = Some(subpackage);
        self
    }

    /// The active configuration for the current mode
    pub fn configuration(&self) -> &Configuration {
        match &self.mode {
            Mode::Build(b) => &b.configuration,
            Mode::Test(t) => &t.configuration,
        }
    }

    /// Build-only facts, `None` in test mode
    pub fn build_context(&self) -> Option<&BuildContext> {
        match &self.mode {
            Mode::Build(b) => Some(b),
            Mode::Test(_) => None,
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self.mode, Mode::Test(_))
    }
}
