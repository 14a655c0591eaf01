//! navplane — device-automation control-plane process entry point
//! (spec.md §6, §10): reads host/device configuration from the
//! environment, wires the controller registry and an in-memory
//! persistence backend, and serves the HTTP gateway.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use navplane_core::config::{DeviceConfig, HostConfig};
use navplane_core::{Device, DeviceId, MemoryPersistence};
use navplane_gateway::GatewayConfig;

#[derive(Parser)]
#[command(name = "navplane", about = "Device-automation control-plane host process")]
struct Cli {
    /// Bearer token required on every gateway request. Falls back to
    /// NAVPLANE_AUTH_TOKEN, then to no auth.
    #[arg(short, long)]
    token: Option<String>,

    /// Disable auth even if a token is configured in the environment.
    #[arg(long, default_value_t = false)]
    no_auth: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "navplane=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let host = HostConfig::from_env();

    let auth_token = if cli.no_auth {
        None
    } else {
        cli.token.or_else(|| std::env::var("NAVPLANE_AUTH_TOKEN").ok())
    };

    let devices = discover_devices();
    let device_model = devices.values().next().map(|d| d.device_model.clone()).unwrap_or_default();
    let controllers = Arc::new(navplane_controllers::build_default_registry(device_model));
    let persistence: Arc<dyn navplane_core::PersistenceBackend> = Arc::new(MemoryPersistence::new());

    tracing::info!(
        host_name = %host.host_name,
        device_count = devices.len(),
        "starting navplane host"
    );

    let config = GatewayConfig {
        bind_ip: host.host_ip,
        port: host.host_port,
        auth_token,
        unified_cache_ttl_secs: host.unified_cache_ttl_secs,
    };

    navplane_gateway::start_gateway(config, controllers, persistence, devices).await
}

/// Reads `DEVICE{n}_*` environment variables for n = 1, 2, ... until one
/// is missing (spec.md §6, mirroring `DeviceConfig::from_env_indexed`'s
/// indexed-registration convention).
fn discover_devices() -> HashMap<DeviceId, Device> {
    let mut devices = HashMap::new();
    let mut index = 1;
    while let Some(cfg) = DeviceConfig::from_env_indexed(index) {
        let mut device = Device::new(cfg.device_id.clone(), cfg.device_name, cfg.device_model);
        device.device_ip = cfg.device_ip;
        device.device_port = cfg.device_port;
        devices.insert(DeviceId::new(cfg.device_id), device);
        index += 1;
    }
    devices
}
