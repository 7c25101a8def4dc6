//! Histórico das amostras em CSV.
//!
//! Uma linha por amostra, colunas fixas. O cabeçalho só é escrito quando o
//! arquivo é criado.

use crate::types::WeatherReport;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Cabeçalho do CSV (mantido byte a byte para compatibilidade com planilhas existentes).
pub const CSV_HEADER: &str = ";ComputerDate,ComputerTime,voltage,charger,battery_status,temperature102,temperatureDHT22,temperatureBMP085,humidty,pressure";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Erro de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Arquivo CSV de destino.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Anexa uma amostra, com o horário local do computador.
    pub fn append(&self, report: &WeatherReport, now: DateTime<Local>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        let mut content = String::new();
        if is_new {
            info!("Criando histórico CSV em {}", self.path.display());
            content.push_str(CSV_HEADER);
            content.push('\n');
        }
        content.push_str(&format_record(report, now));
        content.push('\n');

        file.write_all(content.as_bytes()).map_err(io_err)
    }
}

/// Formata uma linha do CSV (sem quebra de linha).
pub fn format_record(report: &WeatherReport, now: DateTime<Local>) -> String {
    let s = &report.sample;
    format!(
        "\"{}\",\"{}\",{},{},{},{},{},{},{},{}",
        now.format("%Y/%m/%d"),
        now.format("%H:%M"),
        s.battery_voltage,
        s.charge_status.code(),
        s.battery_status.code(),
        s.sensor_temperature_primary,
        s.sensor_temperature_hygrometer,
        s.sensor_temperature_secondary,
        s.sensor_humidity,
        s.pressure,
    )
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatteryStatus, ChargeStatus, WeatherSample};
    use chrono::TimeZone;

    fn report() -> WeatherReport {
        WeatherReport {
            sample: WeatherSample {
                battery_voltage: 4.1,
                battery_status: BatteryStatus::Weak,
                charge_status: ChargeStatus::Charging,
                sensor_temperature_primary: 22.5,
                sensor_temperature_secondary: 21.75,
                sensor_temperature_hygrometer: 23.0,
                sensor_humidity: 48.2,
                pressure: 100_812,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2013, 7, 4, 9, 5, 0).unwrap()
    }

    fn temp_csv(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.csv", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn record_columns_in_order() {
        assert_eq!(
            format_record(&report(), at()),
            "\"2013/07/04\",\"09:05\",4.1,4,2,22.5,23,21.75,48.2,100812"
        );
    }

    #[test]
    fn header_only_on_new_file() {
        let path = temp_csv("weather-csv-header");
        let log = CsvLog::new(&path);
        log.append(&report(), at()).unwrap();
        log.append(&report(), at()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("\"2013/07/04\""));
        assert_eq!(lines[1], lines[2]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let log = CsvLog::new(std::env::temp_dir().join("no-such-dir-weather").join("x.csv"));
        assert!(matches!(
            log.append(&report(), at()),
            Err(StorageError::Io { .. })
        ));
    }
}
