//! # Weather Receiver
//!
//! Recebe os frames do rádio-modem pela porta serial, decodifica as
//! amostras da estação meteorológica e as exibe no console, com
//! histórico em CSV.
//!
//! ## Threads
//! - `serial-reader` / `replay-reader`: bytes brutos → channel
//! - `station`: decodificação + timer do enlace → channel
//! - principal: apresentação e CSV

mod console;
mod options;
mod serial_thread;
mod station_thread;

use clap::Parser;
use console::Console;
use std::time::Duration;
use tracing::{error, info};
use weather_core::config::AppConfig;

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let options = options::Options::parse();

    // ── Config ──
    let config_path = options
        .config()
        .cloned()
        .unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);

    if !config_path.exists() {
        let _ = config.save(&config_path);
    }

    if let Some(port) = options.port() {
        config.receiver.port_name = port.to_string();
    }
    if let Some(baud) = options.baud() {
        config.receiver.baud_rate = baud;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        std::process::exit(1);
    }

    // ── Threads ──
    let transport = match options.replay() {
        Some(path) => serial_thread::spawn_replay_thread(
            path.clone(),
            options.chunk(),
            Duration::ZERO,
            config.receiver.channel_capacity,
        ),
        None => serial_thread::spawn_serial_thread(config.receiver.clone()),
    };
    let rx = station_thread::spawn_station_thread(transport, &config);

    // ── Apresentação ──
    let mut console = Console::new(&config.storage, !options.no_csv());
    console.run(&rx);

    let stats = console.stats();
    info!(
        "Encerrado: {} bytes, {} frames, {} amostras, {} erros de checksum, {} de enquadramento, {} payloads curtos",
        stats.bytes,
        stats.frames,
        stats.samples,
        stats.checksum_errors,
        stats.framing_errors,
        stats.truncated_payloads
    );
}
