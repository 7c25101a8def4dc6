//! Unidade remota simulada: gera amostras plausíveis e determinísticas.
//!
//! Os valores oscilam em torno de um ponto fixo com período de um dia
//! (temperaturas) e de algumas horas (pressão). O relógio da estação
//! segue o horário local do computador.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::f64::consts::TAU;
use weather_core::protocol::RECORD_LEN;
use weather_core::types::*;

/// Abaixo desta tensão a unidade pede carga.
const LOW_VOLTAGE: f32 = 3.4;
/// Acima desta temperatura a unidade reporta superaquecimento.
const HEAT_LIMIT: f32 = 45.0;

/// Estação sintética.
#[derive(Debug, Clone)]
pub struct SyntheticStation {
    cycle: u64,
    /// Segundos simulados entre amostras
    step_secs: f64,
}

impl SyntheticStation {
    pub fn new(step_secs: f64) -> Self {
        Self {
            cycle: 0,
            step_secs,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Gera a próxima amostra com o RTC em `now`.
    pub fn collect(&mut self, now: NaiveDateTime) -> WeatherReport {
        let t = self.cycle as f64 * self.step_secs;
        self.cycle += 1;

        let day = (t / 86_400.0 * TAU).sin();
        let weather = (t / 10_800.0 * TAU).sin();

        let battery_voltage = round2(3.9 + 0.3 * day);
        let temperature = round2(20.0 + 6.0 * day);
        let sample = WeatherSample {
            battery_voltage,
            battery_status: if battery_voltage < LOW_VOLTAGE {
                BatteryStatus::Weak
            } else {
                BatteryStatus::Ok
            },
            charge_status: if day > 0.0 {
                ChargeStatus::Charging
            } else {
                ChargeStatus::NoCharge
            },
            sensor_temperature_primary: temperature,
            sensor_temperature_secondary: round2((temperature - 0.4).into()),
            pressure: (101_325.0 + 350.0 * weather).round() as i32,
            altitude_computed: round2(120.0 - 29.0 * weather),
            altitude_corrected: 118.5,
            sensor_temperature_hygrometer: round2((temperature + 0.3).into()),
            sensor_humidity: round2(55.0 - 15.0 * day),
            timestamp: station_time(now),
        };

        WeatherReport {
            command: command_for(&sample),
            record_len: (RECORD_LEN - 2) as u8,
            sample,
        }
    }
}

fn command_for(sample: &WeatherSample) -> Command {
    if sample.battery_voltage < LOW_VOLTAGE {
        Command::PowerAlert
    } else if sample.sensor_temperature_primary > HEAT_LIMIT {
        Command::HeatAlert
    } else {
        Command::Reading
    }
}

/// Campos do RTC a partir de uma data/hora de calendário.
pub fn station_time(now: NaiveDateTime) -> StationDateTime {
    StationDateTime {
        hour: now.hour() as u8,
        minute: now.minute() as u8,
        second: now.second() as u8,
        weekday: now.weekday().number_from_sunday() as u8,
        year: (now.year() - 2000).clamp(0, 255) as u8,
        month: now.month() as u8,
        day: now.day() as u8,
    }
}

/// Duas casas decimais, a resolução do fio.
fn round2(value: f64) -> f32 {
    ((value * 100.0).round() / 100.0) as f32
}
