use std::path::{Path, PathBuf};
use serde_derive::{Serialize, Deserialize};

use super::constants::*;
use super::error::ConfigError;
use crate::th2e::constants::{DEFAULT_SENSOR_IP, DEFAULT_SENSOR_PORT, DEFAULT_SENSOR_TIMEOUT_MS};

/// # Config
/// Structure representing the bench configuration: where the broker and the probe live, which
/// acquisition client to run and how to size each acquisition.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml.
/// Missing fields take their lab default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub afc: String,
    pub fmc: String,
    pub client_program: PathBuf,
    pub client_timeout_ms: u64,
    pub acq_timeout_ms: u64,
    pub samples_pre: u32,
    pub samples_post: u32,
    pub num_shots: u32,
    pub max_input_power: f64,
    pub sensor_ip: String,
    pub sensor_port: u16,
    pub sensor_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            afc: String::from(DEFAULT_AFC),
            fmc: String::from(DEFAULT_FMC),
            client_program: PathBuf::from(DEFAULT_CLIENT_PROGRAM),
            client_timeout_ms: DEFAULT_CLIENT_TIMEOUT_MS,
            acq_timeout_ms: DEFAULT_ACQ_TIMEOUT_MS,
            samples_pre: DEFAULT_SAMPLES_PRE,
            samples_post: DEFAULT_SAMPLES_POST,
            num_shots: DEFAULT_NUM_SHOTS,
            max_input_power: DEFAULT_MAX_INPUT_POWER,
            sensor_ip: String::from(DEFAULT_SENSOR_IP),
            sensor_port: DEFAULT_SENSOR_PORT,
            sensor_timeout_ms: DEFAULT_SENSOR_TIMEOUT_MS,
        }
    }
}

impl Config {

    /// Read the configuration in a YAML file
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Load the given file, or the lab defaults if none was given
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::read_config_file(path),
            None => Ok(Self::default())
        }
    }

    /// Poll timeout handed to the acquisition client. Always ends before the client is killed,
    /// so a board that never answers makes the client fail on its own.
    pub fn acq_timeout_ms(&self) -> u64 {
        self.acq_timeout_ms.min(self.client_timeout_ms.saturating_sub(ACQ_TIMEOUT_MARGIN_MS))
    }

    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }
}
