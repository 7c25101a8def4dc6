//! Protocolo de aplicação da unidade remota.
//!
//! O payload de um frame começa com o sub-header do modem (frame de recepção
//! explícita, API id `0x91`) e só depois vem o registro da estação:
//!
//! ```text
//! ┌────────────────┬────────┬────────┬──────────────────────────────┐
//! │ Sub-header(18) │ Cmd(1) │ Len(1) │ Amostra (27, little-endian)  │
//! └────────────────┴────────┴────────┴──────────────────────────────┘
//! ```
//!
//! Campos da amostra, em ordem: tensão(2), status bateria(1), status carga(1),
//! TMP102(2), BMP085 temp(2), pressão(4), altitude(2), altitude corrigida(2),
//! DHT22 temp(2), umidade(2), data/hora(7). Campos de 2 bytes são `i16`
//! em centésimos.

use crate::frame::FRAME_HEADER_LEN;
use crate::types::{
    BatteryStatus, ChargeStatus, Command, StationDateTime, WeatherReport, WeatherSample,
};

/// Posição do byte de comando contada a partir do start byte.
///
/// Valor observado com o modem em modo explícito (AO=1); o offset não é
/// derivado do conteúdo do sub-header.
pub const COMMAND_FRAME_OFFSET: usize = 0x15;

/// Bytes do payload antes do byte de comando.
pub const SUBHEADER_LEN: usize = COMMAND_FRAME_OFFSET - FRAME_HEADER_LEN;

/// Tamanho do registro da estação (comando + comprimento + amostra).
pub const RECORD_LEN: usize = 29;

/// Tamanho mínimo do payload para conter uma amostra.
pub const MIN_PAYLOAD_LEN: usize = SUBHEADER_LEN + RECORD_LEN;

/// API id do frame de recepção explícita.
pub const EXPLICIT_RX_API_ID: u8 = 0x91;

/// Escala do ponto fixo (2 casas decimais).
const FIXED_POINT_SCALE: f64 = 100.0;

/// Erros de decodificação do payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Payload truncado ({actual} bytes, mínimo {expected})")]
    Truncated { expected: usize, actual: usize },
}

// ──────────────────────────────────────────────
// Sub-header do modem
// ──────────────────────────────────────────────

/// Sub-header do frame de recepção explícita.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    pub source_addr64: u64,
    pub source_addr16: u16,
    pub source_endpoint: u8,
    pub dest_endpoint: u8,
    pub cluster_id: u16,
    pub profile_id: u16,
    pub options: u8,
}

impl Default for SubHeader {
    fn default() -> Self {
        Self {
            source_addr64: 0x0013_A200_40A1_B2C3,
            source_addr16: 0xFFFE,
            source_endpoint: 0xE8,
            dest_endpoint: 0xE8,
            cluster_id: 0x0011,
            profile_id: 0xC105,
            options: 0x01,
        }
    }
}

impl SubHeader {
    /// Serializa com o API id na frente. Campos multibyte em big-endian.
    pub fn to_bytes(&self) -> [u8; SUBHEADER_LEN] {
        let mut out = [0u8; SUBHEADER_LEN];
        out[0] = EXPLICIT_RX_API_ID;
        out[1..9].copy_from_slice(&self.source_addr64.to_be_bytes());
        out[9..11].copy_from_slice(&self.source_addr16.to_be_bytes());
        out[11] = self.source_endpoint;
        out[12] = self.dest_endpoint;
        out[13..15].copy_from_slice(&self.cluster_id.to_be_bytes());
        out[15..17].copy_from_slice(&self.profile_id.to_be_bytes());
        out[17] = self.options;
        out
    }

    /// Lê o sub-header do início de um payload. `None` se curto ou se não for `0x91`.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let bytes = payload.get(..SUBHEADER_LEN)?;
        if bytes[0] != EXPLICIT_RX_API_ID {
            return None;
        }
        let mut addr64 = [0u8; 8];
        addr64.copy_from_slice(&bytes[1..9]);
        Some(Self {
            source_addr64: u64::from_be_bytes(addr64),
            source_addr16: u16::from_be_bytes([bytes[9], bytes[10]]),
            source_endpoint: bytes[11],
            dest_endpoint: bytes[12],
            cluster_id: u16::from_be_bytes([bytes[13], bytes[14]]),
            profile_id: u16::from_be_bytes([bytes[15], bytes[16]]),
            options: bytes[17],
        })
    }
}

// ──────────────────────────────────────────────
// Decodificação
// ──────────────────────────────────────────────

/// Cursor de leitura sobre o registro.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated {
            expected: end,
            actual: self.bytes.len(),
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    /// `i16` little-endian em centésimos.
    fn fixed(&mut self) -> Result<f32, DecodeError> {
        Ok(fixed_to_f32(i16::from_le_bytes(self.take()?)))
    }

    fn i32_le(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }
}

fn fixed_to_f32(raw: i16) -> f32 {
    (f64::from(raw) / FIXED_POINT_SCALE) as f32
}

fn f32_to_fixed(value: f32) -> i16 {
    // Cast satura fora da faixa de i16
    (f64::from(value) * FIXED_POINT_SCALE).round() as i16
}

/// Decodifica o payload de um frame validado (sub-header + registro).
///
/// Bytes além do registro são ignorados.
pub fn decode_payload(payload: &[u8]) -> Result<WeatherReport, DecodeError> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(DecodeError::Truncated {
            expected: MIN_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }
    decode_record(&payload[SUBHEADER_LEN..])
}

/// Decodifica o registro da estação a partir do byte de comando.
pub fn decode_record(record: &[u8]) -> Result<WeatherReport, DecodeError> {
    if record.len() < RECORD_LEN {
        return Err(DecodeError::Truncated {
            expected: RECORD_LEN,
            actual: record.len(),
        });
    }

    let mut r = Reader::new(record);
    let command = Command::from_code(r.u8()?);
    let record_len = r.u8()?;

    let sample = WeatherSample {
        battery_voltage: r.fixed()?,
        battery_status: BatteryStatus::from_code(r.u8()?),
        charge_status: ChargeStatus::from_code(r.u8()?),
        sensor_temperature_primary: r.fixed()?,
        sensor_temperature_secondary: r.fixed()?,
        pressure: r.i32_le()?,
        altitude_computed: r.fixed()?,
        altitude_corrected: r.fixed()?,
        sensor_temperature_hygrometer: r.fixed()?,
        sensor_humidity: r.fixed()?,
        timestamp: StationDateTime {
            hour: r.u8()?,
            minute: r.u8()?,
            second: r.u8()?,
            weekday: r.u8()?,
            year: r.u8()?,
            month: r.u8()?,
            day: r.u8()?,
        },
    };

    Ok(WeatherReport {
        command,
        record_len,
        sample,
    })
}

// ──────────────────────────────────────────────
// Codificação (lado da unidade remota)
// ──────────────────────────────────────────────

/// Codifica o registro da estação (inverso de [`decode_record`]).
pub fn encode_record(report: &WeatherReport) -> Vec<u8> {
    let s = &report.sample;
    let mut out = Vec::with_capacity(RECORD_LEN);
    out.push(report.command.code());
    out.push(report.record_len);
    out.extend_from_slice(&f32_to_fixed(s.battery_voltage).to_le_bytes());
    out.push(s.battery_status.code());
    out.push(s.charge_status.code());
    for value in [s.sensor_temperature_primary, s.sensor_temperature_secondary] {
        out.extend_from_slice(&f32_to_fixed(value).to_le_bytes());
    }
    out.extend_from_slice(&s.pressure.to_le_bytes());
    for value in [
        s.altitude_computed,
        s.altitude_corrected,
        s.sensor_temperature_hygrometer,
        s.sensor_humidity,
    ] {
        out.extend_from_slice(&f32_to_fixed(value).to_le_bytes());
    }
    let dt = &s.timestamp;
    out.extend_from_slice(&[
        dt.hour, dt.minute, dt.second, dt.weekday, dt.year, dt.month, dt.day,
    ]);
    out
}

/// Payload completo: sub-header do modem + registro.
pub fn encode_payload(report: &WeatherReport, header: &SubHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(MIN_PAYLOAD_LEN);
    out.extend_from_slice(&header.to_bytes());
    out.extend(encode_record(report));
    out
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
