//! # Weather Core
//!
//! Crate compartilhada da estação meteorológica: decodificação dos frames do
//! rádio-modem, desserialização das amostras, observador do enlace,
//! histórico CSV e configuração TOML.
//!
//! ## Módulos
//! - [`escape`] – Byte-stuffing (`0x7D` + XOR `0x20`)
//! - [`frame`] – Montagem de frames, comprimento e checksum
//! - [`protocol`] – Sub-header do modem e registro da estação
//! - [`types`] – Amostra, status de bateria/carga, data/hora do RTC
//! - [`link`] – Classificação do enlace (Working / Silent / Lost)
//! - [`station`] – Orquestrador bytes → amostras
//! - [`storage`] – Histórico em CSV
//! - [`config`] – Configuração unificada via TOML

pub mod escape;
pub mod frame;
pub mod protocol;
pub mod types;
pub mod link;
pub mod station;
pub mod storage;
pub mod config;

// Re-exports convenientes
pub use types::{WeatherReport, WeatherSample};
pub use frame::{Frame, FrameAssembler, FrameError, encode_frame};
pub use protocol::{decode_payload, encode_payload, DecodeError, SubHeader};
pub use link::{LinkState, LinkWatcher};
pub use station::{Station, StationEvent, StationError};
pub use config::AppConfig;
