//! Apresentação em console: amostras, falhas, estado do enlace e CSV.

use crate::station_thread::UiMessage;
use crossbeam_channel::Receiver;
use tracing::{error, info, warn};
use weather_core::config::StorageConfig;
use weather_core::link::LinkState;
use weather_core::station::{StationEvent, StationStats};
use weather_core::storage::CsvLog;
use weather_core::types::{Command, WeatherReport};

/// Estado da apresentação.
pub struct Console {
    csv: Option<CsvLog>,
    link: Option<LinkState>,
    stats: StationStats,
}

impl Console {
    pub fn new(storage: &StorageConfig, csv_enabled: bool) -> Self {
        let csv = (csv_enabled && storage.csv_enabled).then(|| CsvLog::new(&storage.csv_path));
        match &csv {
            Some(log) => info!("Gravando amostras em {}", log.path().display()),
            None => info!("Gravação CSV desativada"),
        }
        Self {
            csv,
            link: None,
            stats: StationStats::default(),
        }
    }

    /// Consome mensagens até o channel fechar.
    pub fn run(&mut self, rx: &Receiver<UiMessage>) {
        for msg in rx.iter() {
            self.handle(msg);
        }
    }

    pub fn handle(&mut self, msg: UiMessage) {
        match msg {
            UiMessage::Event(StationEvent::Sample {
                report,
                received_at,
            }) => {
                for line in format_sample(&report) {
                    info!("{line}");
                }
                if let Some(notice) = command_notice(report.command) {
                    warn!("{notice}");
                }
                if let Some(csv) = &self.csv {
                    if let Err(e) = csv.append(&report, received_at) {
                        error!("Falha ao gravar CSV: {e}");
                    }
                }
            }
            UiMessage::Event(StationEvent::Failure(failure)) => {
                warn!("{failure}");
            }
            UiMessage::Link { state, stats } => {
                self.stats = stats;
                self.on_link(state);
            }
            UiMessage::Transport(text) => info!("{text}"),
        }
    }

    fn on_link(&mut self, state: LinkState) {
        if self.link == Some(state) {
            return;
        }
        match state {
            LinkState::Lost => warn!("Enlace: {state} – nenhuma amostra há muito tempo"),
            _ => info!("Enlace: {state}"),
        }
        self.link = Some(state);
    }

    pub fn link(&self) -> Option<LinkState> {
        self.link
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }
}

// ──────────────────────────────────────────────
// Formatação
// ──────────────────────────────────────────────

/// Linhas exibidas para uma amostra.
pub fn format_sample(report: &WeatherReport) -> Vec<String> {
    let s = &report.sample;
    vec![
        format!("Data/hora da estação: {}", s.timestamp),
        format!(
            "Bateria: {:.2} V ({}) – Carga: {}",
            s.battery_voltage, s.battery_status, s.charge_status
        ),
        format!(
            "Temperatura: {:.2} °C (TMP102) {:.2} °C (BMP085) {:.2} °C (DHT22)",
            s.sensor_temperature_primary,
            s.sensor_temperature_secondary,
            s.sensor_temperature_hygrometer
        ),
        format!(
            "Umidade: {:.2} % – Pressão: {} Pa",
            s.sensor_humidity,
            group_thousands(s.pressure)
        ),
        format!(
            "Altitude: {:.2} m (corrigida {:.2} m)",
            s.altitude_computed, s.altitude_corrected
        ),
    ]
}

fn command_notice(command: Command) -> Option<&'static str> {
    match command {
        Command::PowerAlert => Some("Estação pede carga da bateria"),
        Command::HeatAlert => Some("Estação reporta temperatura excessiva"),
        Command::GetTime => Some("Estação pede acerto do relógio"),
        Command::Reading | Command::Other(_) => None,
    }
}

/// Inteiro com separador de milhar (`101,325`).
fn group_thousands(value: i32) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::types::{BatteryStatus, ChargeStatus, StationDateTime, WeatherSample};

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(101_325), "101,325");
        assert_eq!(group_thousands(1_000_000), "1,000,000");
        assert_eq!(group_thousands(-12_345), "-12,345");
    }

    #[test]
    fn sample_lines() {
        let report = WeatherReport {
            sample: WeatherSample {
                battery_voltage: 0.16,
                battery_status: BatteryStatus::Ok,
                charge_status: ChargeStatus::NoBattery,
                sensor_temperature_primary: 21.5,
                pressure: 101_325,
                sensor_humidity: 40.0,
                timestamp: StationDateTime {
                    hour: 14,
                    minute: 30,
                    second: 5,
                    weekday: 3,
                    year: 13,
                    month: 7,
                    day: 4,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let lines = format_sample(&report);
        assert_eq!(lines[0], "Data/hora da estação: 2013/07/04 14:30:05");
        assert!(lines[1].starts_with("Bateria: 0.16 V"));
        assert!(lines[1].ends_with("No Bat."));
        assert!(lines[2].contains("21.50 °C (TMP102)"));
        assert!(lines[3].contains("101,325 Pa"));
    }

    #[test]
    fn link_changes_are_tracked() {
        let storage = StorageConfig {
            csv_enabled: false,
            ..Default::default()
        };
        let mut console = Console::new(&storage, true);
        assert_eq!(console.link(), None);

        console.handle(UiMessage::Link {
            state: LinkState::Lost,
            stats: StationStats {
                samples: 3,
                ..Default::default()
            },
        });
        assert_eq!(console.link(), Some(LinkState::Lost));
        assert_eq!(console.stats().samples, 3);

        console.handle(UiMessage::Link {
            state: LinkState::Working,
            stats: StationStats::default(),
        });
        assert_eq!(console.link(), Some(LinkState::Working));
    }

    #[test]
    fn samples_are_appended_to_csv() {
        let path = std::env::temp_dir().join(format!("weather-console-{}.csv", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let storage = StorageConfig {
            csv_enabled: true,
            csv_path: path.clone(),
        };
        let mut console = Console::new(&storage, true);
        console.handle(UiMessage::Event(StationEvent::Sample {
            report: WeatherReport::default(),
            received_at: chrono::Local::now(),
        }));

        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(content.lines().count(), 2);
    }
}
