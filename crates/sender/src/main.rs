//! # Weather Sender
//!
//! Simula a unidade remota da estação: gera amostras, monta os frames
//! do rádio-modem e os escreve na porta serial em intervalo fixo.
//!
//! ## Uso
//! ```bash
//! weather_sender --port /dev/ttyUSB1         # Envia a cada `sender.interval_secs`
//! weather_sender --capture dump.bin -n 100   # Grava 100 frames para `weather_receiver --replay`
//! ```

mod options;
mod source;

use clap::Parser;
use source::SyntheticStation;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use weather_core::config::{AppConfig, SenderConfig};
use weather_core::frame::encode_frame;
use weather_core::protocol::{SubHeader, encode_payload};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let options = options::Options::parse();

    // ── Carregar config ──
    let config_path = options
        .config()
        .cloned()
        .unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(port) = options.port() {
        config.sender.port_name = port.to_string();
    }
    if let Some(baud) = options.baud() {
        config.sender.baud_rate = baud;
    }
    if let Some(interval) = options.interval() {
        config.sender.interval_secs = interval;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        std::process::exit(1);
    }

    let sender_cfg = &config.sender;
    let header = SubHeader {
        source_addr64: sender_cfg.source_addr64,
        ..Default::default()
    };

    // ── Destino ──
    let (mut sink, dest): (Box<dyn Write>, String) = match options.capture() {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => (Box::new(file), path.display().to_string()),
            Err(e) => {
                error!("Falha ao criar {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => (open_port(sender_cfg), sender_cfg.port_name.clone()),
    };
    // Em captura o intervalo só afeta o relógio simulado
    let interval = if options.capture().is_some() {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(sender_cfg.interval_secs)
    };

    let mut station = SyntheticStation::new(sender_cfg.interval_secs);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   WEATHER SENDER – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Destino:   {dest}");
    println!("  Intervalo: {:.1}s", sender_cfg.interval_secs);
    println!("  Origem:    {:016X}", sender_cfg.source_addr64);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    loop {
        if options.count().is_some_and(|n| station.cycle() >= n) {
            info!("{} frames enviados, encerrando", station.cycle());
            break;
        }
        let cycle_start = Instant::now();

        let report = station.collect(chrono::Local::now().naive_local());
        let frame = encode_frame(&encode_payload(&report, &header));
        match sink.write_all(&frame).and_then(|()| sink.flush()) {
            Ok(()) => {
                let s = &report.sample;
                info!(
                    "→ {} bytes para {} | {:?} | {:.2} V | {:.2} °C | {:.2} % | {} Pa",
                    frame.len(),
                    dest,
                    report.command,
                    s.battery_voltage,
                    s.sensor_temperature_primary,
                    s.sensor_humidity,
                    s.pressure
                );
            }
            Err(e) => error!("Erro ao escrever em {dest}: {e}"),
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
}

/// Abre a porta serial, tentando novamente até conseguir.
fn open_port(config: &SenderConfig) -> Box<dyn Write> {
    loop {
        match serialport::new(&config.port_name, config.baud_rate)
            .timeout(Duration::from_millis(config.write_timeout_ms))
            .open()
        {
            Ok(port) => {
                info!("Porta {} aberta a {} baud", config.port_name, config.baud_rate);
                return Box::new(port);
            }
            Err(e) => {
                error!(
                    "Falha ao abrir {}: {e}. Tentando novamente em {:.0}s...",
                    config.port_name, config.reopen_delay_secs
                );
                std::thread::sleep(Duration::from_secs_f64(config.reopen_delay_secs));
            }
        }
    }
}
