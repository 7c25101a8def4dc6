//! Montagem de frames do rádio-modem a partir de bytes lógicos.
//!
//! Formato no fio (antes do byte-stuffing):
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬────────────────┬─────────────┐
//! │ 0x7E (1) │ len hi   │ len lo   │ Payload (len)  │ Checksum(1) │
//! └──────────┴──────────┴──────────┴────────────────┴─────────────┘
//! ```
//!
//! - `len` conta do primeiro byte do payload (API id) até o último, sem o checksum
//! - Checksum = `0xFF - (soma do payload mod 256)`; o frame é válido quando
//!   soma(payload) + checksum ≡ `0xFF` (mod 256)

use crate::escape::{LogicalByte, START_BYTE, escape};

/// Start byte + dois bytes de comprimento.
pub const FRAME_HEADER_LEN: usize = 3;

/// Limite padrão de posição dentro de um frame antes de abortar.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 110;

/// Erros de montagem de frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Aguardando start byte (recebido 0x{0:02X})")]
    NoStartByte(u8),

    #[error("Start byte inesperado na posição {position}, frame anterior descartado")]
    UnexpectedStart { position: usize },

    #[error("Frame excedeu o tamanho máximo ({position} > {limit})")]
    Oversize { position: usize, limit: usize },

    #[error("Checksum inválido (soma 0x{sum:02X}, esperado 0xFF)")]
    Checksum { sum: u8 },
}

impl FrameError {
    /// Erro de sincronismo (start byte, resync ou overflow).
    pub fn is_framing(&self) -> bool {
        !self.is_checksum()
    }

    /// Corrupção no transporte.
    pub fn is_checksum(&self) -> bool {
        matches!(self, FrameError::Checksum { .. })
    }
}

/// Frame com checksum validado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
}

impl Frame {
    /// Primeiro byte do payload (tipo do frame da API).
    pub fn api_id(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Comprimento declarado no cabeçalho.
    pub fn declared_len(&self) -> usize {
        self.payload.len()
    }
}

/// Estado da montagem, indexado pela posição dentro do frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    AwaitStart,
    LengthHigh,
    LengthLow { high: u8 },
    Payload { declared_len: usize },
}

/// Monta frames byte a byte. No máximo um frame em andamento.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state: AssemblerState,
    position: usize,
    checksum: u8,
    payload: Vec<u8>,
    max_frame_size: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            state: AssemblerState::AwaitStart,
            position: 0,
            checksum: 0,
            payload: Vec::with_capacity(max_frame_size),
            max_frame_size,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Posição do próximo byte dentro do frame (0 = aguardando start).
    pub fn position(&self) -> usize {
        self.position
    }

    /// Consome um byte lógico. Retorna `Some` quando há um desfecho
    /// (frame completo ou erro), `None` enquanto o frame está incompleto.
    pub fn push(&mut self, byte: LogicalByte) -> Option<Result<Frame, FrameError>> {
        if self.position > 0 && byte.is_frame_start() {
            let position = self.position;
            self.reset();
            // O novo start byte vira a posição 0 do próximo frame
            self.begin();
            return Some(Err(FrameError::UnexpectedStart { position }));
        }

        match self.state {
            AssemblerState::AwaitStart => self.on_await_start(byte),
            AssemblerState::LengthHigh => self.on_length_high(byte.value),
            AssemblerState::LengthLow { high } => self.on_length_low(high, byte.value),
            AssemblerState::Payload { declared_len } => self.on_payload(declared_len, byte.value),
        }
    }

    /// Descarta o frame em andamento.
    pub fn reset(&mut self) {
        self.state = AssemblerState::AwaitStart;
        self.position = 0;
        self.checksum = 0;
        self.payload.clear();
    }

    fn begin(&mut self) {
        self.state = AssemblerState::LengthHigh;
        self.position = 1;
    }

    fn on_await_start(&mut self, byte: LogicalByte) -> Option<Result<Frame, FrameError>> {
        if byte.is_frame_start() {
            self.begin();
            None
        } else {
            Some(Err(FrameError::NoStartByte(byte.value)))
        }
    }

    fn on_length_high(&mut self, value: u8) -> Option<Result<Frame, FrameError>> {
        self.state = AssemblerState::LengthLow { high: value };
        self.position = 2;
        None
    }

    fn on_length_low(&mut self, high: u8, low: u8) -> Option<Result<Frame, FrameError>> {
        let declared_len = u16::from_be_bytes([high, low]) as usize;
        self.state = AssemblerState::Payload { declared_len };
        self.position = FRAME_HEADER_LEN;
        None
    }

    fn on_payload(&mut self, declared_len: usize, value: u8) -> Option<Result<Frame, FrameError>> {
        if self.position > self.max_frame_size {
            let err = FrameError::Oversize {
                position: self.position,
                limit: self.max_frame_size,
            };
            self.reset();
            return Some(Err(err));
        }

        self.checksum = self.checksum.wrapping_add(value);

        if self.position == declared_len + FRAME_HEADER_LEN {
            // `value` é o checksum
            let sum = self.checksum;
            let outcome = if sum == 0xFF {
                Ok(Frame {
                    payload: std::mem::take(&mut self.payload),
                })
            } else {
                Err(FrameError::Checksum { sum })
            };
            self.reset();
            return Some(outcome);
        }

        self.payload.push(value);
        self.position += 1;
        None
    }
}

/// Checksum do modem para um payload.
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - sum
}

/// Codifica um payload em frame completo, com byte-stuffing após o start byte.
///
/// Payloads maiores que `u16::MAX` são truncados no comprimento declarado;
/// quem chama deve respeitar o limite do modem.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len().min(u16::MAX as usize);
    let payload = &payload[..len];

    let mut body = Vec::with_capacity(len + 3);
    body.extend_from_slice(&(len as u16).to_be_bytes());
    body.extend_from_slice(payload);
    body.push(checksum(payload));

    let mut out = vec![START_BYTE];
    out.extend(escape(&body));
    out
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::ByteDescrambler;
    use proptest::prelude::*;

    /// Passa bytes brutos por descrambler + assembler e coleta os desfechos.
    fn run(assembler: &mut FrameAssembler, raw: &[u8]) -> Vec<Result<Frame, FrameError>> {
        let mut d = ByteDescrambler::new();
        raw.iter()
            .filter_map(|&b| d.push(b))
            .filter_map(|b| assembler.push(b))
            .collect()
    }

    fn unstuffed(raw: &[u8]) -> Vec<LogicalByte> {
        raw.iter().map(|&b| LogicalByte::raw(b)).collect()
    }

    #[test]
    fn assembles_valid_frame() {
        let mut a = FrameAssembler::new();
        let out = run(&mut a, &encode_frame(&[0x91, 0x01, 0x02]));
        assert_eq!(
            out,
            vec![Ok(Frame {
                payload: vec![0x91, 0x01, 0x02]
            })]
        );
        assert_eq!(a.position(), 0);
        assert_eq!(a.state(), AssemblerState::AwaitStart);
    }

    #[test]
    fn walks_through_states() {
        let mut a = FrameAssembler::new();
        assert!(a.push(LogicalByte::raw(0x7E)).is_none());
        assert_eq!(a.state(), AssemblerState::LengthHigh);
        assert!(a.push(LogicalByte::raw(0x00)).is_none());
        assert_eq!(a.state(), AssemblerState::LengthLow { high: 0 });
        assert!(a.push(LogicalByte::raw(0x01)).is_none());
        assert_eq!(a.state(), AssemblerState::Payload { declared_len: 1 });
        assert_eq!(a.position(), 3);
        assert!(a.push(LogicalByte::raw(0x10)).is_none());
        let out = a.push(LogicalByte::raw(0xEF)).unwrap();
        assert_eq!(out, Ok(Frame { payload: vec![0x10] }));
    }

    #[test]
    fn bad_checksum_resets() {
        let mut a = FrameAssembler::new();
        let mut raw = encode_frame(&[0x91, 0x05]);
        let last = raw.len() - 1;
        raw[last] = raw[last].wrapping_add(1);
        let out = run(&mut a, &raw);
        assert!(matches!(out.as_slice(), [Err(FrameError::Checksum { .. })]));
        assert_eq!(a.position(), 0);
    }

    #[test]
    fn stray_byte_reports_waiting_for_start() {
        let mut a = FrameAssembler::new();
        let out = a.push(LogicalByte::raw(0x42));
        assert_eq!(out, Some(Err(FrameError::NoStartByte(0x42))));
        assert_eq!(a.state(), AssemblerState::AwaitStart);
    }

    #[test]
    fn start_mid_frame_resyncs_without_losing_byte() {
        let mut a = FrameAssembler::new();
        let mut raw = vec![0x7E, 0x00, 0x05, 0x91];
        raw.extend(encode_frame(&[0x91, 0x22]));
        let out = run(&mut a, &raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Err(FrameError::UnexpectedStart { position: 4 }));
        assert_eq!(
            out[1],
            Ok(Frame {
                payload: vec![0x91, 0x22]
            })
        );
    }

    #[test]
    fn escaped_start_is_payload_byte() {
        let mut a = FrameAssembler::new();
        let out = run(&mut a, &encode_frame(&[0x91, 0x7E, 0x7D]));
        assert_eq!(
            out,
            vec![Ok(Frame {
                payload: vec![0x91, 0x7E, 0x7D]
            })]
        );
    }

    #[test]
    fn oversize_frame_aborts() {
        let mut a = FrameAssembler::with_max_frame_size(8);
        // Declara 200 bytes de payload
        let mut raw = vec![0x7E, 0x00, 0xC8];
        raw.extend(std::iter::repeat_n(0x01, 10));
        let out: Vec<_> = unstuffed(&raw).into_iter().filter_map(|b| a.push(b)).collect();
        assert_eq!(
            out[0],
            Err(FrameError::Oversize {
                position: 9,
                limit: 8
            })
        );
        assert_eq!(a.state(), AssemblerState::AwaitStart);

        // O próximo frame válido é montado normalmente
        let next: Vec<_> = unstuffed(&encode_frame(&[0x10, 0x20]))
            .into_iter()
            .filter_map(|b| a.push(b))
            .collect();
        assert_eq!(
            next,
            vec![Ok(Frame {
                payload: vec![0x10, 0x20]
            })]
        );
    }

    #[test]
    fn empty_payload_frame() {
        let mut a = FrameAssembler::new();
        let out = run(&mut a, &encode_frame(&[]));
        assert_eq!(out, vec![Ok(Frame { payload: vec![] })]);
    }

    #[test]
    fn checksum_complements_sum() {
        assert_eq!(checksum(&[]), 0xFF);
        assert_eq!(checksum(&[0x10]), 0xEF);
        assert_eq!(checksum(&[0xFF, 0x01]), 0xFF);
    }

    #[test]
    fn error_classification() {
        assert!(FrameError::Checksum { sum: 0 }.is_checksum());
        assert!(FrameError::UnexpectedStart { position: 3 }.is_framing());
        assert!(
            FrameError::Oversize {
                position: 111,
                limit: 110
            }
            .is_framing()
        );
    }

    proptest! {
        #[test]
        fn checksum_acceptance(payload in proptest::collection::vec(any::<u8>(), 0..100), c in any::<u8>()) {
            let mut a = FrameAssembler::new();
            let len = payload.len() as u16;
            let mut body: Vec<u8> = len.to_be_bytes().to_vec();
            body.extend(&payload);
            body.push(c);
            // Tudo após o start byte chega como dado (já sem escape)
            let logical = std::iter::once(LogicalByte::raw(START_BYTE))
                .chain(body.iter().map(|&value| LogicalByte { value, escaped: true }));

            let out: Vec<_> = logical.filter_map(|b| a.push(b)).collect();
            let sum = payload.iter().fold(c, |acc, b| acc.wrapping_add(*b));
            prop_assert_eq!(out.len(), 1);
            if sum == 0xFF {
                prop_assert_eq!(&out[0], &Ok(Frame { payload: payload.clone() }));
            } else {
                prop_assert_eq!(&out[0], &Err(FrameError::Checksum { sum }));
            }
            prop_assert_eq!(a.position(), 0);
        }

        #[test]
        fn no_state_leaks_after_any_outcome(
            noise in proptest::collection::vec(any::<u8>(), 0..150),
            payload in proptest::collection::vec(any::<u8>(), 1..100),
        ) {
            let mut a = FrameAssembler::new();
            let mut d = ByteDescrambler::new();
            for b in noise.iter().filter_map(|&b| d.push(b)) {
                let _ = a.push(b);
            }
            // Fecha qualquer frame pendente com um start byte novo
            let mut raw = encode_frame(&payload);
            let mut outcomes: Vec<_> = raw
                .drain(..)
                .filter_map(|b| d.push(b))
                .filter_map(|b| a.push(b))
                .collect();
            let last = outcomes.pop();
            prop_assert_eq!(last, Some(Ok(Frame { payload })));
        }
    }
}
