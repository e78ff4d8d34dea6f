//! synergy-client entry point.
//!
//! Wires together configuration loading, the uinput virtual device, the
//! dispatcher, and the network session, then runs the Tokio event loop
//! until `Ctrl+C` is pressed.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()        -- TOML file, or defaults if absent
//!  └─ UinputDeviceHandle    -- kernel virtual keyboard/mouse
//!  └─ Dispatcher            -- protocol message -> VirtualDevice calls
//!  └─ Session::run()        -- handshake + event loop, until Ctrl+C
//! ```
//!
//! Accepts an optional config file path as its first argument; with none
//! given, it looks for `config.toml` in the current directory and falls
//! back to built-in defaults if that is also absent.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use synergy_client::application::config::load_config;
use synergy_client::application::dispatch::Dispatcher;
use synergy_core::protocol::messages::ScreenDescriptor;

use synergy_client::infrastructure::cursor::NullCursorContext;
use synergy_client::infrastructure::network::{Session, TransportError};
use synergy_client::infrastructure::virtual_device::UinputDeviceHandle;

/// Process exit codes. Informational only — nothing inside the core
/// depends on these; they exist so shell wrappers and systemd units can
/// tell a configuration mistake from a transport hiccup without parsing
/// log text.
const EXIT_OK: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_TRANSPORT_FAILURE: u8 = 3;
const EXIT_UINPUT_PERMISSION: u8 = 4;
const EXIT_UNSUPPORTED_PROTOCOL: u8 = 5;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("synergy-client starting");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    info!(
        server = %format!("{}:{}", config.server.host, config.server.port),
        absolute_mode = config.mouse.absolute,
        tls = config.transport.tls,
        "configuration loaded"
    );

    let device = match UinputDeviceHandle::new(config.mouse.absolute) {
        Ok(device) => device,
        Err(e) => {
            error!(error = %e, "failed to create uinput virtual device (check /dev/uinput permissions)");
            return ExitCode::from(EXIT_UINPUT_PERMISSION);
        }
    };
    let cursor = NullCursorContext;
    let screen = ScreenDescriptor::new(config.screen.width, config.screen.height);
    let dispatcher = Dispatcher::new(
        device,
        cursor,
        screen,
        config.mouse.absolute,
        Duration::from_millis(config.mouse.move_threshold_ms),
        config.mouse.pos_sync_freq,
    );

    let mut session = Session::new(config, dispatcher);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to install Ctrl+C handler; session will only stop on transport failure");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down");
    };

    match session.run(shutdown).await {
        Ok(()) => {
            info!("synergy-client stopped");
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            error!(error = %e, "session terminated");
            let code = match e {
                TransportError::UnsupportedProtocol { .. } => EXIT_UNSUPPORTED_PROTOCOL,
                _ => EXIT_TRANSPORT_FAILURE,
            };
            ExitCode::from(code)
        }
    }
}
