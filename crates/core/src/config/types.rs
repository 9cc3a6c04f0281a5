use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::converter::ConversionProfiles;
use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub conversion: ConversionProfiles,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Limits for selected files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    /// Largest accepted upload in bytes (default: 512 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Display names longer than this are shortened (default: 32)
    #[serde(default = "default_display_name_max_len")]
    pub display_name_max_len: usize,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            display_name_max_len: default_display_name_max_len(),
        }
    }
}

fn default_max_upload_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_display_name_max_len() -> usize {
    32
}
