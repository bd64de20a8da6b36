use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rdm6300_frame::{ReadEvent, TagReader};
use rdm6300_transport::{ByteSource, SerialConfig};
use tracing::info;

use crate::exit::{frame_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_ready, print_rejection, print_tag};

/// Read tags from `device` until Ctrl-C or until the device goes away.
pub fn run(device: &Path) -> CliResult<i32> {
    let config = SerialConfig::new(device);
    let source = open_device(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut reader = TagReader::new(source);
    print_ready();

    while running.load(Ordering::SeqCst) {
        match reader.poll() {
            Ok(ReadEvent::Tag(tag)) => print_tag(&tag),
            Ok(ReadEvent::Rejected(err)) => print_rejection(&err),
            Ok(ReadEvent::Idle) => {}
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }

    info!(
        discarded_bytes = reader.assembler().discarded_bytes(),
        resyncs = reader.assembler().resyncs(),
        "interrupted, shutting down"
    );
    Ok(SUCCESS)
}

#[cfg(unix)]
fn open_device(config: &SerialConfig) -> CliResult<Box<dyn ByteSource>> {
    let port = rdm6300_transport::SerialPort::open(config)
        .map_err(|err| crate::exit::transport_error("serial device", err))?;
    tracing::debug!(transport = port.transport_name(), timeout = ?port.timeout(), "device ready");
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_device(config: &SerialConfig) -> CliResult<Box<dyn ByteSource>> {
    Err(CliError::new(
        crate::exit::USAGE,
        format!(
            "serial device: {} is not supported on this platform",
            config.device_path.display()
        ),
    ))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
