use serde::Serialize;

/// Build metadata captured by `build.rs` at compile time
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub pkg_version: &'static str,
}

impl BuildInfo {
    pub const fn new() -> Self {
        Self {
            build_profile: env!("BUILD_PROFILE"),
            build_features: env!("BUILD_FEATURES"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            version: env!("REPO_VERSION"),
            pkg_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fedshare {} ({}, {} build, features: {}, built {})",
            self.pkg_version,
            self.version,
            self.build_profile,
            self.build_features,
            self.build_timestamp
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::new()
}

#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::build_info()
    };
}
