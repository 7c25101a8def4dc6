//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável, compartilhado pelo
//! receiver e pelo simulador da unidade remota.

use crate::frame::DEFAULT_MAX_FRAME_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Porta serial do rádio-modem no lado do receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Nome da porta (ex: "/dev/ttyUSB0", "COM3")
    pub port_name: String,
    pub baud_rate: u32,
    /// Timeout de leitura da porta (ms)
    pub read_timeout_ms: u64,
    /// Espera antes de reabrir a porta após falha (segundos)
    pub reopen_delay_secs: f64,
    /// Capacidade dos channels entre threads
    pub channel_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port_name: default_port_name().into(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            reopen_delay_secs: 2.0,
            channel_capacity: 64,
        }
    }
}

/// Parâmetros do enquadramento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Posição máxima dentro de um frame antes de abortar
    pub max_frame_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Thresholds do observador de enlace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Intervalo entre ticks (segundos)
    pub tick_secs: f64,
    /// Ticks silenciosos tolerados antes de `Lost`
    pub lost_after_ticks: u32,
    /// Ticks após o último frame ainda considerados `Working`
    pub grace_ticks: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            tick_secs: 10.0,
            lost_after_ticks: 18,
            grace_ticks: 5,
        }
    }
}

/// Gravação das amostras em CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub csv_enabled: bool,
    pub csv_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            csv_enabled: true,
            csv_path: PathBuf::from("WeatherStationData.csv"),
        }
    }
}

/// Simulador da unidade remota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub port_name: String,
    pub baud_rate: u32,
    /// Intervalo de envio em segundos
    pub interval_secs: f64,
    /// Endereço 64 bits do modem remoto
    pub source_addr64: u64,
    /// Timeout de escrita da porta (ms)
    pub write_timeout_ms: u64,
    /// Espera antes de reabrir a porta após falha (segundos)
    pub reopen_delay_secs: f64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            port_name: default_port_name().into(),
            baud_rate: 9600,
            interval_secs: 60.0,
            source_addr64: 0x0013_A200_40A1_B2C3,
            write_timeout_ms: 1000,
            reopen_delay_secs: 2.0,
        }
    }
}

/// Faixa aceita para intervalos de tick e de envio (segundos).
const INTERVAL_RANGE: std::ops::RangeInclusive<f64> = 0.1..=3600.0;
/// Faixa aceita para esperas de reabertura de porta (segundos).
const REOPEN_DELAY_RANGE: std::ops::RangeInclusive<f64> = 0.1..=3600.0;
/// Faixa aceita para timeouts de porta (ms). Zero faria a leitura girar sem pausa.
const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<u64> = 1..=60_000;

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub receiver: ReceiverConfig,
    pub protocol: ProtocolConfig,
    pub link: LinkConfig,
    pub storage: StorageConfig,
    pub sender: SenderConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.receiver.baud_rate == 0 {
            errors.push("Baud rate do receiver não pode ser 0".into());
        }
        if !TIMEOUT_MS_RANGE.contains(&self.receiver.read_timeout_ms) {
            errors.push(format!(
                "Timeout de leitura inválido: {} ms (1–60000)",
                self.receiver.read_timeout_ms
            ));
        }
        // `contains` também rejeita NaN
        if !REOPEN_DELAY_RANGE.contains(&self.receiver.reopen_delay_secs) {
            errors.push(format!(
                "Espera para reabrir a porta inválida: {} (0.1–3600.0)",
                self.receiver.reopen_delay_secs
            ));
        }
        if self.receiver.channel_capacity == 0 {
            errors.push("Capacidade do channel não pode ser 0".into());
        }
        if self.protocol.max_frame_size < crate::protocol::MIN_PAYLOAD_LEN + 3 {
            errors.push(format!(
                "max_frame_size muito pequeno: {} (mínimo {})",
                self.protocol.max_frame_size,
                crate::protocol::MIN_PAYLOAD_LEN + 3
            ));
        }
        if !INTERVAL_RANGE.contains(&self.link.tick_secs) {
            errors.push(format!(
                "Intervalo de tick inválido: {} (0.1–3600.0)",
                self.link.tick_secs
            ));
        }
        if self.link.grace_ticks > self.link.lost_after_ticks {
            errors.push(format!(
                "grace_ticks ({}) maior que lost_after_ticks ({})",
                self.link.grace_ticks, self.link.lost_after_ticks
            ));
        }
        if self.storage.csv_enabled && self.storage.csv_path.as_os_str().is_empty() {
            errors.push("Caminho do CSV vazio".into());
        }
        if self.sender.baud_rate == 0 {
            errors.push("Baud rate do sender não pode ser 0".into());
        }
        if !INTERVAL_RANGE.contains(&self.sender.interval_secs) {
            errors.push(format!(
                "Intervalo do sender inválido: {} (0.1–3600.0)",
                self.sender.interval_secs
            ));
        }
        if !TIMEOUT_MS_RANGE.contains(&self.sender.write_timeout_ms) {
            errors.push(format!(
                "Timeout de escrita inválido: {} ms (1–60000)",
                self.sender.write_timeout_ms
            ));
        }
        if !REOPEN_DELAY_RANGE.contains(&self.sender.reopen_delay_secs) {
            errors.push(format!(
                "Espera do sender para reabrir a porta inválida: {} (0.1–3600.0)",
                self.sender.reopen_delay_secs
            ));
        }

        errors
    }
}

#[cfg(windows)]
fn default_port_name() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_port_name() -> &'static str {
    "/dev/ttyUSB0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.receiver.port_name, parsed.receiver.port_name);
        assert_eq!(config.link, parsed.link);
        assert_eq!(config.storage.csv_path, parsed.storage.csv_path);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[receiver]
port_name = "/dev/ttyS1"

[link]
lost_after_ticks = 30
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.receiver.port_name, "/dev/ttyS1");
        assert_eq!(config.link.lost_after_ticks, 30);
        // Outros campos devem ter valor padrão
        assert_eq!(config.receiver.baud_rate, 9600);
        assert_eq!(config.link.grace_ticks, 5);
        assert_eq!(config.protocol.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn sender_port_timing_from_toml() {
        let partial = r#"
[sender]
write_timeout_ms = 250
reopen_delay_secs = 5.0
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.sender.write_timeout_ms, 250);
        assert_eq!(config.sender.reopen_delay_secs, 5.0);
        assert_eq!(config.sender.interval_secs, 60.0);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn rejects_tiny_frame_limit() {
        let mut config = AppConfig::default();
        config.protocol.max_frame_size = 20;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn rejects_bad_reopen_delay() {
        for delay in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let mut config = AppConfig::default();
            config.receiver.reopen_delay_secs = delay;
            assert_eq!(config.validate().len(), 1, "delay {delay}");
        }

        let mut config = AppConfig::default();
        config.sender.reopen_delay_secs = -1.0;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn rejects_zero_port_timeouts() {
        let mut config = AppConfig::default();
        config.receiver.read_timeout_ms = 0;
        config.sender.write_timeout_ms = 0;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn rejects_nan_intervals() {
        let mut config = AppConfig::default();
        config.link.tick_secs = f64::NAN;
        config.sender.interval_secs = f64::NAN;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn rejects_grace_beyond_loss() {
        let mut config = AppConfig::default();
        config.link.grace_ticks = 40;
        assert!(!config.validate().is_empty());
    }
}
