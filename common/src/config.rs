//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default location for the configuration file of the portal
//! tools.  This is a configuration struct neutral loading engine, storing only the base
//! directory and with `load()` reading the proper file or the default one.
//!
//! This encapsulates the configuration, available with `.inner()`.
//!

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::makepath;

/// Config filename
const CONFIG: &str = "config.hcl";

/// Main name for the directory base
const TAG: &str = "portal-utils";

/// Current version
pub const CVERSION: usize = 1;

/// Default token lifetime in minutes
pub const DEF_EXPIRATION: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Bad file version {0}, expected {1}")]
    BadFileVersion(usize, usize),
    #[error("Unknown config file {0}")]
    MissingConfig(String),
    #[error("Error reading {0}: {1}")]
    Read(String, String),
    #[error("Error parsing {0}: {1}")]
    Parse(String, String),
}

/// Every configuration struct carries a version.
///
pub trait Versioned {
    fn version(&self) -> usize;
}

/// Tuning for the HTTP client.  Credentials stay on the command line.
///
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// File version
    #[serde(default = "default_version")]
    pub version: usize,
    /// Referer sent with the token request (and used as client id)
    #[serde(default)]
    pub referer: Option<String>,
    /// Token lifetime in minutes
    #[serde(default = "default_expiration")]
    pub expiration: u32,
    /// Override the user-agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_version() -> usize {
    CVERSION
}

fn default_expiration() -> u32 {
    DEF_EXPIRATION
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: CVERSION,
            referer: None,
            expiration: DEF_EXPIRATION,
            user_agent: None,
        }
    }
}

impl Versioned for Config {
    fn version(&self) -> usize {
        self.version
    }
}

#[derive(Debug)]
pub struct ConfigFile<T: Debug + Default + DeserializeOwned + Versioned> {
    /// Tag is the project name.
    tag: String,
    /// This is the base directory for all files.
    basedir: PathBuf,
    inner: T,
}

impl<T> ConfigFile<T>
where
    T: Debug + Default + DeserializeOwned + Versioned,
{
    #[tracing::instrument]
    fn new(tag: &str) -> Self {
        let basedir: PathBuf = match BaseDirs::new() {
            Some(base) => {
                #[cfg(unix)]
                let base = base.home_dir().join(".config");

                #[cfg(windows)]
                let base = base.data_local_dir().to_path_buf();

                debug!("base = {base:?}");
                makepath!(base, tag)
            }
            None => makepath!(".", tag),
        };
        ConfigFile {
            tag: String::from(tag),
            basedir,
            inner: T::default(),
        }
    }

    /// Returns the path of the default config directory
    ///
    pub fn config_path(&self) -> PathBuf {
        self.basedir.clone()
    }

    /// Returns the path of the default config file
    ///
    pub fn default_file(&self) -> PathBuf {
        let cfg = self.config_path().join(CONFIG);
        debug!("default = {cfg:?}");
        cfg
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// - file specified on CLI, which must exist
    /// - default file under the base directory, defaults apply when absent
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&Path>) -> Result<ConfigFile<T>, ConfigError> {
        let mut cfg = ConfigFile::<T>::new(TAG);

        let fname = match fname {
            Some(fname) => {
                if !fname.exists() {
                    return Err(ConfigError::MissingConfig(fname.display().to_string()));
                }
                fname.to_path_buf()
            }
            None => {
                let def = cfg.default_file();
                if !def.exists() {
                    trace!("no {def:?}, using defaults");
                    return Ok(cfg);
                }
                def
            }
        };

        trace!("Loading config file {fname:?} for {}", cfg.tag);

        let data = fs::read_to_string(&fname)
            .map_err(|e| ConfigError::Read(fname.display().to_string(), e.to_string()))?;
        cfg.inner = Self::parse(&fname.display().to_string(), &data)?;
        Ok(cfg)
    }

    /// Decode and check the version.
    ///
    pub fn parse(name: &str, data: &str) -> Result<T, ConfigError> {
        let data: T =
            hcl::from_str(data).map_err(|e| ConfigError::Parse(name.to_string(), e.to_string()))?;
        debug!("struct data = {data:?}");

        if data.version() != CVERSION {
            return Err(ConfigError::BadFileVersion(data.version(), CVERSION));
        }
        Ok(data)
    }

    /// Return the inner configuration
    ///
    pub fn inner(&self) -> &T {
        &self.inner
    }
}
