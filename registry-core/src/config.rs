//! Registry configuration.
//!
//! The admin identity is injected here rather than baked into the program, and
//! the two policy knobs (`max_schema_len`, `require_verified_deployer`) live
//! alongside it.
//!
//! ```toml
//! program_id = "0707...07"
//! admin = "9a1f...c2"
//! max_schema_len = 200
//! require_verified_deployer = false
//! ```

use crate::error::{RegistryError, Result};
use crate::types::{Address, Identity};
use serde::Deserialize;
use std::path::Path;

/// Default bound on schema content, in bytes.
pub const DEFAULT_MAX_SCHEMA_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Scopes every derived address.
    pub program_id: Address,
    /// The single identity allowed to verify authorities.
    pub admin: Identity,
    /// Maximum schema content length in bytes.
    pub max_schema_len: usize,
    /// Only verified authorities may register schemas.
    pub require_verified_deployer: bool,
}

/// On-disk shape: keys are hex strings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    program_id: String,
    admin: String,
    #[serde(default = "default_max_schema_len")]
    max_schema_len: usize,
    #[serde(default)]
    require_verified_deployer: bool,
}

fn default_max_schema_len() -> usize {
    DEFAULT_MAX_SCHEMA_LEN
}

impl RegistryConfig {
    /// Configuration with default policy for the given program and admin.
    pub fn new(program_id: Address, admin: Identity) -> Self {
        Self {
            program_id,
            admin,
            max_schema_len: DEFAULT_MAX_SCHEMA_LEN,
            require_verified_deployer: false,
        }
    }

    pub fn with_max_schema_len(mut self, max: usize) -> Self {
        self.max_schema_len = max;
        self
    }

    pub fn with_verified_deployers(mut self, required: bool) -> Self {
        self.require_verified_deployer = required;
        self
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(s).map_err(|e| RegistryError::Config(e.to_string()))?;

        let program_id = raw
            .program_id
            .parse()
            .map_err(|e| RegistryError::Config(format!("program_id: {e}")))?;
        let admin = raw
            .admin
            .parse()
            .map_err(|e| RegistryError::Config(format!("admin: {e}")))?;

        Ok(Self {
            program_id,
            admin,
            max_schema_len: raw.max_schema_len,
            require_verified_deployer: raw.require_verified_deployer,
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded registry config from {}", path.display());
        Self::from_toml_str(&content)
    }
}
