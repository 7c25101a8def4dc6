//! Thread de transporte: lê a porta serial (ou uma captura gravada) e
//! envia lotes de bytes brutos via channel.

use crossbeam_channel::{Receiver, Sender, bounded};
use serialport::SerialPort;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use weather_core::config::ReceiverConfig;

/// Mensagem da thread de transporte para a thread da estação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMessage {
    /// Porta aberta (nome da origem)
    Connected(String),
    /// Lote de bytes na ordem de chegada
    Data(Vec<u8>),
    /// Porta fechada ou com erro
    Disconnected(String),
}

/// Erros da camada de transporte.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Erro na porta serial: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Inicia a thread da porta serial. Retorna o receiver do channel.
pub fn spawn_serial_thread(config: ReceiverConfig) -> Receiver<TransportMessage> {
    let (tx, rx) = bounded::<TransportMessage>(config.channel_capacity);

    std::thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || {
            serial_loop(&tx, &config);
        })
        .expect("Falha ao criar thread serial");

    rx
}

fn open_port(config: &ReceiverConfig) -> Result<Box<dyn SerialPort>, TransportError> {
    let port = serialport::new(&config.port_name, config.baud_rate)
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .open()?;
    Ok(port)
}

fn serial_loop(tx: &Sender<TransportMessage>, config: &ReceiverConfig) {
    let reopen_delay = Duration::from_secs_f64(config.reopen_delay_secs);

    loop {
        match open_port(config) {
            Ok(mut port) => {
                info!(
                    "Porta {} aberta a {} baud",
                    config.port_name, config.baud_rate
                );
                if tx
                    .send(TransportMessage::Connected(config.port_name.clone()))
                    .is_err()
                {
                    return;
                }

                let reason = match read_until_error(port.as_mut(), tx) {
                    Some(reason) => reason,
                    // Consumidor encerrado
                    None => return,
                };
                warn!("Porta {} fechada: {reason}", config.port_name);
                if tx.send(TransportMessage::Disconnected(reason)).is_err() {
                    return;
                }
            }
            Err(e) => {
                error!(
                    "Falha ao abrir {}: {e}. Tentando novamente em {:.0}s...",
                    config.port_name, config.reopen_delay_secs
                );
            }
        }
        std::thread::sleep(reopen_delay);
    }
}

/// Lê até um erro de porta. `None` se o channel foi fechado pelo consumidor.
fn read_until_error(port: &mut dyn SerialPort, tx: &Sender<TransportMessage>) -> Option<String> {
    let mut buf = [0u8; 256];
    loop {
        match port.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                debug!("{n} bytes recebidos");
                tx.send(TransportMessage::Data(buf[..n].to_vec())).ok()?;
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                // Timeout normal, continua
            }
            Err(e) => return Some(TransportError::from(e).to_string()),
        }
    }
}

/// Reproduz uma captura binária como se viesse da porta, em lotes de `chunk_size`.
///
/// O channel é fechado no fim do arquivo.
pub fn spawn_replay_thread(
    path: PathBuf,
    chunk_size: usize,
    pace: Duration,
    capacity: usize,
) -> Receiver<TransportMessage> {
    let (tx, rx) = bounded::<TransportMessage>(capacity);

    std::thread::Builder::new()
        .name("replay-reader".into())
        .spawn(move || {
            if let Err(e) = replay(&path, chunk_size, pace, &tx) {
                error!("Falha na reprodução de {}: {e}", path.display());
                let _ = tx.send(TransportMessage::Disconnected(e.to_string()));
            }
        })
        .expect("Falha ao criar thread de reprodução");

    rx
}

fn replay(
    path: &std::path::Path,
    chunk_size: usize,
    pace: Duration,
    tx: &Sender<TransportMessage>,
) -> Result<(), TransportError> {
    let data = std::fs::read(path)?;
    info!("Reproduzindo {} ({} bytes)", path.display(), data.len());

    let source = path.display().to_string();
    if tx.send(TransportMessage::Connected(source)).is_err() {
        return Ok(());
    }
    for chunk in data.chunks(chunk_size.max(1)) {
        if tx.send(TransportMessage::Data(chunk.to_vec())).is_err() {
            return Ok(());
        }
        if !pace.is_zero() {
            std::thread::sleep(pace);
        }
    }
    let _ = tx.send(TransportMessage::Disconnected("fim da captura".into()));
    Ok(())
}
