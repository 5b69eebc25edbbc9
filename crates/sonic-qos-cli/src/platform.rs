//! Platform information from the SONiC version file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Default location of the SONiC version file.
pub const SONIC_VERSION_FILE: &str = "/etc/sonic/sonic_version.yml";

/// Environment variable overriding the version file location.
pub const SONIC_VERSION_FILE_ENV: &str = "SONIC_VERSION_FILE";

/// ASIC type of Intel Tofino platforms.
const BAREFOOT_ASIC: &str = "barefoot";

/// Subset of `sonic_version.yml` the CLI cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformInfo {
    /// ASIC vendor type (e.g., "broadcom", "mellanox", "barefoot").
    #[serde(default)]
    pub asic_type: Option<String>,
    /// SONiC build version.
    #[serde(default)]
    pub build_version: Option<String>,
}

impl PlatformInfo {
    /// Platform with a known ASIC type.
    pub fn with_asic_type(asic_type: impl Into<String>) -> Self {
        Self {
            asic_type: Some(asic_type.into()),
            build_version: None,
        }
    }

    /// Reads `path`. A missing file yields an unknown platform.
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No version file at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CliError::VersionFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&contents).map_err(|source| CliError::VersionParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses the version file contents. An empty document is an unknown
    /// platform.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Returns the version file path: `explicit`, else the environment
    /// override, else the default location.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var_os(SONIC_VERSION_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SONIC_VERSION_FILE))
    }

    /// ASIC type, empty when unknown.
    pub fn asic_type(&self) -> &str {
        self.asic_type.as_deref().unwrap_or("")
    }

    /// Intel Tofino platforms support a single TC to queue profile and no
    /// per-port TC to queue binding.
    pub fn is_barefoot(&self) -> bool {
        self.asic_type() == BAREFOOT_ASIC
    }
}
