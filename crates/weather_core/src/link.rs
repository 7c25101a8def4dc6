//! Saúde do enlace de rádio com a unidade remota.
//!
//! Não é uma máquina de estados linear: dois flags e um contador de ticks
//! são reclassificados a cada consulta.

use crate::config::LinkConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classificação do enlace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Working,
    Silent,
    Lost,
}

impl LinkState {
    /// Texto curto para o indicador de status.
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Working => "Receiving",
            LinkState::Silent => "Waiting",
            LinkState::Lost => "Lost",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observa chegadas de frame e ticks periódicos.
#[derive(Debug, Clone)]
pub struct LinkWatcher {
    ever_seen: bool,
    seen_recently: bool,
    lost: bool,
    silent_ticks: u32,
    lost_after_ticks: u32,
    grace_ticks: u32,
}

impl Default for LinkWatcher {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

impl LinkWatcher {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            ever_seen: false,
            seen_recently: false,
            lost: false,
            silent_ticks: 0,
            lost_after_ticks: config.lost_after_ticks,
            grace_ticks: config.grace_ticks,
        }
    }

    /// Zera flags e contador; o enlace volta a `Silent`.
    pub fn reset(&mut self) {
        self.ever_seen = false;
        self.seen_recently = false;
        self.lost = false;
        self.silent_ticks = 0;
    }

    pub fn on_frame_arrival(&mut self) {
        self.ever_seen = true;
        self.seen_recently = true;
        self.lost = false;
        self.silent_ticks = 0;
    }

    /// Um tick do timer. Um frame recente consome o tick sem contar silêncio.
    pub fn on_tick(&mut self) {
        if self.seen_recently {
            self.seen_recently = false;
        } else {
            self.silent_ticks = self.silent_ticks.saturating_add(1);
        }
        if self.silent_ticks > self.lost_after_ticks {
            self.lost = true;
        }
    }

    pub fn classify(&self) -> LinkState {
        if self.seen_recently {
            LinkState::Working
        } else if self.lost {
            LinkState::Lost
        } else if self.ever_seen && self.silent_ticks < self.grace_ticks {
            // Janela antes do próximo envio esperado da unidade
            LinkState::Working
        } else {
            LinkState::Silent
        }
    }

    /// Ticks consecutivos sem frame.
    pub fn silent_ticks(&self) -> u32 {
        self.silent_ticks
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(w: &mut LinkWatcher, n: usize) {
        for _ in 0..n {
            w.on_tick();
        }
    }

    #[test]
    fn starts_silent() {
        let w = LinkWatcher::default();
        assert_eq!(w.classify(), LinkState::Silent);
    }

    #[test]
    fn frame_means_working() {
        let mut w = LinkWatcher::default();
        w.on_frame_arrival();
        assert_eq!(w.classify(), LinkState::Working);
    }

    #[test]
    fn first_tick_consumes_recent_flag() {
        let mut w = LinkWatcher::default();
        w.on_frame_arrival();
        w.on_tick();
        assert_eq!(w.silent_ticks(), 0);
        // Ainda dentro da janela de tolerância
        assert_eq!(w.classify(), LinkState::Working);
    }

    #[test]
    fn grace_window_then_silent() {
        let mut w = LinkWatcher::default();
        w.on_frame_arrival();
        ticks(&mut w, 1 + 4);
        assert_eq!(w.classify(), LinkState::Working);
        w.on_tick();
        assert_eq!(w.silent_ticks(), 5);
        assert_eq!(w.classify(), LinkState::Silent);
    }

    #[test]
    fn lost_once_counter_exceeds_threshold() {
        let mut w = LinkWatcher::default();
        ticks(&mut w, 18);
        assert_eq!(w.classify(), LinkState::Silent);
        w.on_tick();
        assert_eq!(w.classify(), LinkState::Lost);
    }

    #[test]
    fn arrival_before_threshold_recovers() {
        let mut w = LinkWatcher::default();
        ticks(&mut w, 18);
        w.on_frame_arrival();
        assert_eq!(w.silent_ticks(), 0);
        assert_eq!(w.classify(), LinkState::Working);
        w.on_tick();
        assert_eq!(w.classify(), LinkState::Working);
    }

    #[test]
    fn arrival_clears_lost() {
        let mut w = LinkWatcher::default();
        ticks(&mut w, 30);
        assert_eq!(w.classify(), LinkState::Lost);
        w.on_frame_arrival();
        assert_eq!(w.classify(), LinkState::Working);
    }

    #[test]
    fn reset_returns_to_silent() {
        let mut w = LinkWatcher::default();
        w.on_frame_arrival();
        ticks(&mut w, 30);
        w.reset();
        assert_eq!(w.classify(), LinkState::Silent);
        assert_eq!(w.silent_ticks(), 0);
    }

    #[test]
    fn custom_thresholds() {
        let config = LinkConfig {
            tick_secs: 1.0,
            lost_after_ticks: 2,
            grace_ticks: 1,
        };
        let mut w = LinkWatcher::new(&config);
        ticks(&mut w, 3);
        assert_eq!(w.classify(), LinkState::Lost);
    }
}
