//! Tipos da telemetria da estação meteorológica.
//!
//! Valores de ponto fixo já convertidos (centésimos → `f32`), códigos de
//! status como enums abertos: códigos desconhecidos são preservados.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Status de bateria / carregador
// ──────────────────────────────────────────────

/// Status da bateria reportado pela unidade remota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryStatus {
    #[default]
    Ok,
    Over,
    Weak,
    Unknown(u8),
}

impl BatteryStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => BatteryStatus::Ok,
            0x01 => BatteryStatus::Over,
            0x02 => BatteryStatus::Weak,
            other => BatteryStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            BatteryStatus::Ok => 0x00,
            BatteryStatus::Over => 0x01,
            BatteryStatus::Weak => 0x02,
            BatteryStatus::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryStatus::Ok => f.write_str("OK"),
            BatteryStatus::Over => f.write_str("Over"),
            BatteryStatus::Weak => f.write_str("Weak"),
            BatteryStatus::Unknown(code) => write!(f, "Unknown (0x{code:02X})"),
        }
    }
}

/// Estado do carregador solar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    #[default]
    NoCharge,
    Complete,
    Charging,
    NoBattery,
    Unknown(u8),
}

impl ChargeStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => ChargeStatus::NoCharge,
            0x02 => ChargeStatus::Complete,
            0x04 => ChargeStatus::Charging,
            0x08 => ChargeStatus::NoBattery,
            other => ChargeStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ChargeStatus::NoCharge => 0x01,
            ChargeStatus::Complete => 0x02,
            ChargeStatus::Charging => 0x04,
            ChargeStatus::NoBattery => 0x08,
            ChargeStatus::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeStatus::NoCharge => f.write_str("No Charge"),
            ChargeStatus::Complete => f.write_str("Complete"),
            ChargeStatus::Charging => f.write_str("Charging"),
            ChargeStatus::NoBattery => f.write_str("No Bat."),
            ChargeStatus::Unknown(code) => write!(f, "Unknown (0x{code:02X})"),
        }
    }
}

// ──────────────────────────────────────────────
// Data/hora do RTC remoto
// ──────────────────────────────────────────────

/// Data/hora do RTC da unidade remota, campo a campo como chega no fio.
///
/// Nenhuma validação de calendário é feita na decodificação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDateTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Dia da semana (convenção do RTC)
    pub weekday: u8,
    /// Anos desde 2000
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

impl StationDateTime {
    /// Converte para data/hora de calendário; `None` se os campos não formam uma data válida.
    pub fn to_naive(&self) -> Option<chrono::NaiveDateTime> {
        let date = chrono::NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        date.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl fmt::Display for StationDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(dt) => write!(f, "{}", dt.format("%Y/%m/%d %H:%M:%S")),
            None => write!(
                f,
                "invalid ({}/{}/{} {}:{}:{})",
                2000 + u32::from(self.year),
                self.month,
                self.day,
                self.hour,
                self.minute,
                self.second
            ),
        }
    }
}

// ──────────────────────────────────────────────
// Amostra
// ──────────────────────────────────────────────

/// Amostra decodificada de um frame válido. Imutável; a próxima amostra a substitui.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Tensão da bateria (V)
    pub battery_voltage: f32,
    pub battery_status: BatteryStatus,
    pub charge_status: ChargeStatus,
    /// TMP102, sensor da placa (°C)
    pub sensor_temperature_primary: f32,
    /// BMP085, sensor do barômetro (°C)
    pub sensor_temperature_secondary: f32,
    /// Pressão (Pa)
    pub pressure: i32,
    /// Altitude calculada pelo barômetro (m)
    pub altitude_computed: f32,
    /// Altitude corrigida (m)
    pub altitude_corrected: f32,
    /// DHT22, sensor do higrômetro (°C)
    pub sensor_temperature_hygrometer: f32,
    /// Umidade relativa (%)
    pub sensor_humidity: f32,
    pub timestamp: StationDateTime,
}

/// Comando enviado pela unidade remota junto com a amostra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `'R'` – leitura normal
    #[default]
    Reading,
    /// `'T'` – pede acerto do RTC
    GetTime,
    /// `'P'` – bateria precisa de carga
    PowerAlert,
    /// `'H'` – temperatura excessiva
    HeatAlert,
    Other(u8),
}

impl Command {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'R' => Command::Reading,
            b'T' => Command::GetTime,
            b'P' => Command::PowerAlert,
            b'H' => Command::HeatAlert,
            other => Command::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Command::Reading => b'R',
            Command::GetTime => b'T',
            Command::PowerAlert => b'P',
            Command::HeatAlert => b'H',
            Command::Other(code) => *code,
        }
    }
}

/// Registro de aplicação completo: comando + amostra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub command: Command,
    /// Byte de comprimento do registro, como enviado pela unidade
    pub record_len: u8,
    pub sample: WeatherSample,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip_every_byte() {
        for code in 0..=u8::MAX {
            assert_eq!(BatteryStatus::from_code(code).code(), code);
            assert_eq!(ChargeStatus::from_code(code).code(), code);
            assert_eq!(Command::from_code(code).code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_kept() {
        assert_eq!(ChargeStatus::from_code(0x03), ChargeStatus::Unknown(0x03));
        assert_eq!(BatteryStatus::from_code(0x7F), BatteryStatus::Unknown(0x7F));
        assert_eq!(ChargeStatus::from_code(0x04).to_string(), "Charging");
    }

    #[test]
    fn station_datetime_converts() {
        let dt = StationDateTime {
            hour: 13,
            minute: 5,
            second: 59,
            weekday: 3,
            year: 12,
            month: 6,
            day: 20,
        };
        assert_eq!(dt.to_string(), "2012/06/20 13:05:59");
    }

    #[test]
    fn invalid_calendar_is_not_fatal() {
        let dt = StationDateTime {
            month: 13,
            day: 40,
            ..Default::default()
        };
        assert!(dt.to_naive().is_none());
        assert!(dt.to_string().starts_with("invalid"));
    }
}
