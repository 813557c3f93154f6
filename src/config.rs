// src/config.rs
//! Configuration management with file storage

use crate::{
    error::{GpsError, Result},
    gps::ChecksumPolicy,
    sink::DEFAULT_LOG_FILE,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub source_type: String, // "simulated", "replay", "serial", "tcp"
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub tcp_host: Option<String>,
    pub tcp_port: Option<u16>,
    pub replay_file: Option<PathBuf>,
    pub output_path: PathBuf,
    pub truncate_log: bool,
    pub batch_interval_ms: u64,
    pub checksum_policy: ChecksumPolicy,
    pub upload_dir: Option<PathBuf>, // local object store root; None disables upload
    pub upload_bucket: String,
    pub upload_key: String,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl GpsConfig {
    /// Get default configuration
    pub fn platform_default() -> Self {
        Self {
            source_type: "simulated".to_string(),
            serial_port: None,
            serial_baudrate: Some(9600),
            tcp_host: Some("localhost".to_string()),
            tcp_port: Some(2947),
            replay_file: None,
            output_path: PathBuf::from(DEFAULT_LOG_FILE),
            truncate_log: false,
            batch_interval_ms: 2000,
            checksum_policy: ChecksumPolicy::Lenient,
            upload_dir: None,
            upload_bucket: "gpsdatasave".to_string(),
            upload_key: DEFAULT_LOG_FILE.to_string(),
        }
    }

    /// Load configuration from storage
    pub fn load() -> Result<Self> {
        Self::load_from_file(&Self::get_config_path()?)
    }

    /// Save configuration to storage
    pub fn save(&self) -> Result<()> {
        self.save_to_file(&Self::get_config_path()?)
    }

    /// Load from a config file, falling back to defaults when it is absent
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::platform_default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn save_to_file(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(config_path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("gps-collector").join("config.json"))
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    /// Update configuration with new source settings
    pub fn update_source(&mut self, source_type: &str) {
        self.source_type = source_type.to_string();
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update gpsd settings
    pub fn update_tcp(&mut self, host: String, port: u16) {
        self.source_type = "tcp".to_string();
        self.tcp_host = Some(host);
        self.tcp_port = Some(port);
    }

    pub fn update_replay(&mut self, path: PathBuf) {
        self.source_type = "replay".to_string();
        self.replay_file = Some(path);
    }

    pub fn update_upload(&mut self, dir: PathBuf, bucket: String, key: String) {
        self.upload_dir = Some(dir);
        self.upload_bucket = bucket;
        self.upload_key = key;
    }
}
