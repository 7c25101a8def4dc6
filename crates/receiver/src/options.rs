use std::path::PathBuf;

#[derive(clap_derive::Parser, Debug, Clone, Default)]
pub struct Options {
    #[arg(short, long)]
    ///Serial port of the modem. Overrides `receiver.port_name` from the config
    port: Option<String>,
    #[arg(short, long)]
    ///Path of the config.toml. Defaults to the one next to the executable
    config: Option<PathBuf>,
    #[arg(short, long)]
    ///Baud rate of the serial port
    baud: Option<u32>,
    #[arg(long)]
    ///Decode a recorded byte capture instead of opening the serial port
    replay: Option<PathBuf>,
    #[arg(long, default_value = "64")]
    ///Bytes per batch when replaying a capture
    chunk: usize,
    #[arg(long, default_value = "false")]
    ///Do not append samples to the CSV history
    no_csv: bool,
}
impl Options {
    pub fn port(&self) -> Option<&str> { self.port.as_deref() }
    pub fn config(&self) -> Option<&PathBuf> { self.config.as_ref() }
    pub const fn baud(&self) -> Option<u32> { self.baud }
    pub fn replay(&self) -> Option<&PathBuf> { self.replay.as_ref() }
    pub const fn chunk(&self) -> usize { self.chunk }
    pub const fn no_csv(&self) -> bool { self.no_csv }
}
