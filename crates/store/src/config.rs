//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GEARSHOP_DATA_FILE` - Path of the JSON account-table file
//!
//! ## Optional
//! - `GEARSHOP_ADMIN_USERNAME` - Superuser marker (default: `admin`)

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::auth::DEFAULT_ADMIN_USERNAME;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON account-table file.
    pub data_file: PathBuf,
    /// Username carrying superuser privileges.
    pub admin_username: String,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `GEARSHOP_DATA_FILE` is not
    /// set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_file = env::var("GEARSHOP_DATA_FILE")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingEnvVar("GEARSHOP_DATA_FILE".to_owned()))?;

        let admin_username = env::var("GEARSHOP_ADMIN_USERNAME")
            .unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.to_owned());

        Ok(Self {
            data_file,
            admin_username,
        })
    }
}
