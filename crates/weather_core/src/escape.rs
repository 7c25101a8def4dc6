//! Byte-stuffing do modo API 2 do rádio-modem.
//!
//! Dentro de um frame, os bytes reservados `0x7E` e `0x7D` nunca aparecem
//! literalmente: são transmitidos como `0x7D` seguido do byte original XOR `0x20`.
//!
//! ```text
//! 0x7E  →  0x7D 0x5E
//! 0x7D  →  0x7D 0x5D
//! ```

/// Marcador de início de frame.
pub const START_BYTE: u8 = 0x7E;

/// Marcador de escape.
pub const ESCAPE_BYTE: u8 = 0x7D;

/// Máscara aplicada ao byte que segue o escape.
pub const ESCAPE_MASK: u8 = 0x20;

/// Byte lógico já sem escape.
///
/// `escaped` indica que o valor veio de uma sequência `0x7D xx`; um `0x7E`
/// escapado é dado de payload, nunca início de frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalByte {
    pub value: u8,
    pub escaped: bool,
}

impl LogicalByte {
    /// Byte recebido literalmente.
    pub const fn raw(value: u8) -> Self {
        Self {
            value,
            escaped: false,
        }
    }

    /// `true` se este byte marca o início de um novo frame.
    pub const fn is_frame_start(&self) -> bool {
        self.value == START_BYTE && !self.escaped
    }
}

/// Desfaz o byte-stuffing do fluxo bruto, um byte por vez.
///
/// O estado de escape pendente sobrevive entre chamadas, então um `0x7D`
/// no fim de um lote se combina com o primeiro byte do lote seguinte.
#[derive(Debug, Default, Clone)]
pub struct ByteDescrambler {
    pending_escape: bool,
}

impl ByteDescrambler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consome um byte bruto. `None` = precisa de mais entrada.
    pub fn push(&mut self, raw: u8) -> Option<LogicalByte> {
        if raw == START_BYTE {
            // Start byte literal sempre é início de frame, mesmo após um escape órfão
            self.pending_escape = false;
            return Some(LogicalByte::raw(raw));
        }

        if self.pending_escape {
            self.pending_escape = false;
            return Some(LogicalByte {
                value: raw ^ ESCAPE_MASK,
                escaped: true,
            });
        }

        if raw == ESCAPE_BYTE {
            self.pending_escape = true;
            return None;
        }

        Some(LogicalByte::raw(raw))
    }

    /// `true` se o último byte consumido foi um escape ainda sem par.
    pub fn has_pending_escape(&self) -> bool {
        self.pending_escape
    }

    /// Descarta um escape pendente.
    pub fn reset(&mut self) {
        self.pending_escape = false;
    }
}

/// Anexa `byte` a `out`, aplicando escape se for reservado.
pub fn escape_into(out: &mut Vec<u8>, byte: u8) {
    if needs_escape(byte) {
        out.push(ESCAPE_BYTE);
        out.push(byte ^ ESCAPE_MASK);
    } else {
        out.push(byte);
    }
}

/// Aplica byte-stuffing a uma sequência inteira.
pub fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 8);
    for &b in bytes {
        escape_into(&mut out, b);
    }
    out
}

fn needs_escape(byte: u8) -> bool {
    byte == START_BYTE || byte == ESCAPE_BYTE
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
