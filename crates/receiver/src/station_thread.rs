//! Thread da estação: consome os lotes de bytes e os ticks do timer,
//! alimenta o [`Station`] e repassa os desfechos para a apresentação.
//!
//! Bytes e ticks são serializados aqui, então o decodificador nunca vê
//! duas chamadas simultâneas.

use crate::serial_thread::TransportMessage;
use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use std::time::Duration;
use tracing::{debug, info};
use weather_core::config::AppConfig;
use weather_core::link::LinkState;
use weather_core::station::{Station, StationEvent, StationStats};

/// Mensagem da thread da estação para a apresentação.
#[derive(Debug, Clone, PartialEq)]
pub enum UiMessage {
    /// Amostra ou falha de decodificação
    Event(StationEvent),
    /// Estado do enlace (a cada tick e a cada amostra)
    Link {
        state: LinkState,
        stats: StationStats,
    },
    /// Porta aberta ou fechada
    Transport(String),
}

/// Inicia a thread da estação. O channel de saída fecha quando o
/// transporte encerra.
pub fn spawn_station_thread(
    transport: Receiver<TransportMessage>,
    config: &AppConfig,
) -> Receiver<UiMessage> {
    let (tx, rx) = bounded::<UiMessage>(config.receiver.channel_capacity);
    let station = Station::new(&config.protocol, &config.link);
    let period = Duration::from_secs_f64(config.link.tick_secs);

    std::thread::Builder::new()
        .name("station".into())
        .spawn(move || {
            station_loop(station, &transport, &tx, period);
        })
        .expect("Falha ao criar thread da estação");

    rx
}

fn station_loop(
    mut station: Station,
    transport: &Receiver<TransportMessage>,
    tx: &Sender<UiMessage>,
    period: Duration,
) {
    let ticker = tick(period);

    loop {
        select! {
            recv(transport) -> msg => {
                let Ok(msg) = msg else {
                    info!("Transporte encerrado");
                    break;
                };
                if !on_transport(&mut station, msg, tx) {
                    break;
                }
            }
            recv(ticker) -> _ => {
                let state = station.tick();
                debug!("Tick do enlace: {state}");
                if send_link(&station, tx).is_err() {
                    break;
                }
            }
        }
    }

    info!(
        "Estação finalizada: {} amostras, {} erros de checksum",
        station.stats().samples,
        station.stats().checksum_errors
    );
}

/// Retorna `false` quando a apresentação foi encerrada.
fn on_transport(station: &mut Station, msg: TransportMessage, tx: &Sender<UiMessage>) -> bool {
    match msg {
        TransportMessage::Data(bytes) => {
            for event in station.feed(&bytes) {
                let is_sample = matches!(event, StationEvent::Sample { .. });
                // Envio bloqueante: nenhuma amostra é descartada e a ordem
                // de decodificação é a ordem de apresentação.
                if tx.send(UiMessage::Event(event)).is_err() {
                    return false;
                }
                if is_sample && send_link(station, tx).is_err() {
                    return false;
                }
            }
            true
        }
        TransportMessage::Connected(source) => {
            station.reset_decoder();
            station.reset_link();
            tx.send(UiMessage::Transport(format!("Conectado: {source}")))
                .is_ok()
                && send_link(station, tx).is_ok()
        }
        TransportMessage::Disconnected(reason) => {
            station.reset_decoder();
            tx.send(UiMessage::Transport(format!("Desconectado: {reason}")))
                .is_ok()
        }
    }
}

fn send_link(
    station: &Station,
    tx: &Sender<UiMessage>,
) -> Result<(), crossbeam_channel::SendError<UiMessage>> {
    tx.send(UiMessage::Link {
        state: station.link_state(),
        stats: station.stats().clone(),
    })
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
