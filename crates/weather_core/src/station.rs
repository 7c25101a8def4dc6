//! Orquestrador: bytes brutos → descrambler → assembler → decoder.
//!
//! Um [`Station`] por fluxo de bytes. Não é reentrante: quem chama deve
//! serializar `feed` e `tick` (o receiver faz isso numa única thread).

use crate::config::{LinkConfig, ProtocolConfig};
use crate::escape::ByteDescrambler;
use crate::frame::{Frame, FrameAssembler, FrameError};
use crate::link::{LinkState, LinkWatcher};
use crate::protocol::{DecodeError, SubHeader, decode_payload};
use crate::types::WeatherReport;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

/// Erro de uma tentativa de frame. Nunca afeta o frame seguinte.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StationError {
    #[error("Aguardando start byte ({skipped} bytes descartados, último 0x{last:02X})")]
    Noise { skipped: usize, last: u8 },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl StationError {
    /// Perda de sincronismo (start byte, resync, overflow).
    pub fn is_framing(&self) -> bool {
        match self {
            StationError::Noise { .. } => true,
            StationError::Frame(e) => e.is_framing(),
            StationError::Decode(_) => false,
        }
    }

    pub fn is_checksum(&self) -> bool {
        matches!(self, StationError::Frame(e) if e.is_checksum())
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, StationError::Decode(DecodeError::Truncated { .. }))
    }
}

/// Erro com o horário local em que ocorreu.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    pub error: StationError,
    pub at: DateTime<Local>,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.error, self.at.format("%Y/%m/%d %H:%M:%S"))
    }
}

/// Desfecho entregue aos colaboradores (tela, CSV).
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    Sample {
        report: WeatherReport,
        received_at: DateTime<Local>,
    },
    Failure(DecodeFailure),
}

/// Contadores acumulados desde a criação.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub bytes: u64,
    pub stray_bytes: u64,
    pub frames: u64,
    pub samples: u64,
    pub checksum_errors: u64,
    pub framing_errors: u64,
    pub truncated_payloads: u64,
}

/// Estado de decodificação de um fluxo + observador do enlace.
#[derive(Debug, Clone)]
pub struct Station {
    descrambler: ByteDescrambler,
    assembler: FrameAssembler,
    watcher: LinkWatcher,
    stats: StationStats,
}

impl Default for Station {
    fn default() -> Self {
        Self::new(&ProtocolConfig::default(), &LinkConfig::default())
    }
}

impl Station {
    pub fn new(protocol: &ProtocolConfig, link: &LinkConfig) -> Self {
        Self {
            descrambler: ByteDescrambler::new(),
            assembler: FrameAssembler::with_max_frame_size(protocol.max_frame_size),
            watcher: LinkWatcher::new(link),
            stats: StationStats::default(),
        }
    }

    /// Processa um lote de bytes na ordem de chegada.
    ///
    /// Frames incompletos ficam pendentes até o próximo lote. Bytes soltos
    /// antes de um start byte viram um único diagnóstico por sequência.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StationEvent> {
        let mut events = Vec::new();
        let mut noise: Option<(usize, u8)> = None;
        self.stats.bytes += bytes.len() as u64;

        for &raw in bytes {
            let Some(byte) = self.descrambler.push(raw) else {
                continue;
            };
            let Some(outcome) = self.assembler.push(byte) else {
                continue;
            };

            if let Err(FrameError::NoStartByte(b)) = outcome {
                trace!("Byte fora de frame: 0x{b:02X}");
                self.stats.stray_bytes += 1;
                let skipped = noise.map_or(0, |(n, _)| n);
                noise = Some((skipped + 1, b));
                continue;
            }

            if let Some((skipped, last)) = noise.take() {
                events.push(self.failure(StationError::Noise { skipped, last }));
            }

            let event = match outcome {
                Ok(frame) => self.on_frame(frame),
                Err(e) => {
                    if e.is_checksum() {
                        self.stats.checksum_errors += 1;
                    } else {
                        self.stats.framing_errors += 1;
                    }
                    debug!("Frame descartado: {e}");
                    self.failure(e.into())
                }
            };
            events.push(event);
        }

        if let Some((skipped, last)) = noise {
            events.push(self.failure(StationError::Noise { skipped, last }));
        }

        events
    }

    fn on_frame(&mut self, frame: Frame) -> StationEvent {
        self.stats.frames += 1;
        match decode_payload(&frame.payload) {
            Ok(report) => {
                self.stats.samples += 1;
                self.watcher.on_frame_arrival();
                let source = SubHeader::parse(&frame.payload)
                    .map(|h| format!("{:016X}", h.source_addr64))
                    .unwrap_or_else(|| "desconhecida".into());
                debug!(
                    "Amostra recebida de {source} ({} bytes, comando {:?})",
                    frame.declared_len(),
                    report.command
                );
                StationEvent::Sample {
                    report,
                    received_at: Local::now(),
                }
            }
            Err(e) => {
                self.stats.truncated_payloads += 1;
                debug!("Payload rejeitado: {e}");
                self.failure(e.into())
            }
        }
    }

    fn failure(&self, error: StationError) -> StationEvent {
        StationEvent::Failure(DecodeFailure {
            error,
            at: Local::now(),
        })
    }

    /// Tick periódico do timer de enlace.
    pub fn tick(&mut self) -> LinkState {
        self.watcher.on_tick();
        self.watcher.classify()
    }

    pub fn link_state(&self) -> LinkState {
        self.watcher.classify()
    }

    /// Reinicia o observador (ex: porta reaberta).
    pub fn reset_link(&mut self) {
        self.watcher.reset();
    }

    /// Descarta qualquer frame em andamento e escape pendente.
    pub fn reset_decoder(&mut self) {
        self.descrambler.reset();
        self.assembler.reset();
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
