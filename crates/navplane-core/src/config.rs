//! Env-driven configuration shapes (spec.md §6), following the teacher's
//! `OpenclawConfig` discovery-from-env convention.

use serde::{Deserialize, Serialize};

/// Per-process host configuration, read from the environment (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_ip")]
    pub host_ip: String,
    #[serde(default = "default_host_port")]
    pub host_port: u16,
    #[serde(default = "default_host_name")]
    pub host_name: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub unified_cache_ttl_secs: Option<u64>,
}

fn default_host_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_host_port() -> u16 {
    8080
}

fn default_host_name() -> String {
    "host".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host_ip: default_host_ip(),
            host_port: default_host_port(),
            host_name: default_host_name(),
            team_id: String::new(),
            unified_cache_ttl_secs: None,
        }
    }
}

impl HostConfig {
    /// Build from process environment variables, falling back to defaults
    /// for anything unset. The shape of this is ambient configuration
    /// (spec.md §6); the process wiring that calls it is out of scope.
    pub fn from_env() -> Self {
        Self {
            host_ip: std::env::var("HOST_IP").unwrap_or_else(|_| default_host_ip()),
            host_port: std::env::var("HOST_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_host_port),
            host_name: std::env::var("HOST_NAME").unwrap_or_else(|_| default_host_name()),
            team_id: std::env::var("TEAM_ID").unwrap_or_default(),
            unified_cache_ttl_secs: std::env::var("UNIFIED_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn host_url(&self) -> String {
        format!("http://{}:{}", self.host_ip, self.host_port)
    }
}

/// Per-device configuration, read from the environment (spec.md §6).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: String,
    pub device_name: String,
    pub device_model: String,
    pub device_ip: Option<String>,
    pub device_port: Option<u16>,
}

impl DeviceConfig {
    /// Build from `DEVICE{n}_*`-style environment variables, matching the
    /// original's device-registration-by-index env convention.
    pub fn from_env_indexed(index: u32) -> Option<Self> {
        let device_id = std::env::var(format!("DEVICE{index}_ID")).ok()?;
        Some(Self {
            device_id,
            device_name: std::env::var(format!("DEVICE{index}_NAME")).unwrap_or_default(),
            device_model: std::env::var(format!("DEVICE{index}_MODEL")).unwrap_or_default(),
            device_ip: std::env::var(format!("DEVICE{index}_IP")).ok(),
            device_port: std::env::var(format!("DEVICE{index}_PORT"))
                .ok()
                .and_then(|v| v.parse().ok()),
        })
    }
}
