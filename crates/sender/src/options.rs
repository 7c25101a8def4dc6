use std::path::PathBuf;

#[derive(clap_derive::Parser, Debug, Clone, Default)]
pub struct Options {
    #[arg(short, long)]
    ///Serial port of the modem. Overrides `sender.port_name` from the config
    port: Option<String>,
    #[arg(short, long)]
    ///Path of the config.toml. Defaults to the one next to the executable
    config: Option<PathBuf>,
    #[arg(short, long)]
    ///Baud rate of the serial port
    baud: Option<u32>,
    #[arg(short = 'n', long)]
    ///Stop after sending this many frames
    count: Option<u64>,
    #[arg(short, long)]
    ///Seconds between frames. Overrides `sender.interval_secs`
    interval: Option<f64>,
    #[arg(long)]
    ///Write the frames to this file instead of the serial port
    capture: Option<PathBuf>,
}
impl Options {
    pub fn port(&self) -> Option<&str> { self.port.as_deref() }
    pub fn config(&self) -> Option<&PathBuf> { self.config.as_ref() }
    pub const fn baud(&self) -> Option<u32> { self.baud }
    pub const fn count(&self) -> Option<u64> { self.count }
    pub const fn interval(&self) -> Option<f64> { self.interval }
    pub fn capture(&self) -> Option<&PathBuf> { self.capture.as_ref() }
}
