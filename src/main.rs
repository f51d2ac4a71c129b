use clap::Parser;
use rfid_forwarder::{DeviceIdentity, Options, SerialReader, logging};
use std::panic::{self, PanicHookInfo};

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

/// Wait for Ctrl-C / SIGINT.
///
/// If the handler cannot be installed the forwarder keeps running and can
/// only be stopped by a device error or a harder signal.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for interrupt: {}", err);
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to ensure clean exit codes for process managers
    // (e.g., systemd) that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();
    let log_guard = logging::init(&options.log_dir, options.verbose);

    let identity = DeviceIdentity::discover(options.ip_address, options.mac_address);
    tracing::info!("Starting RFID reading with deduplication and retry");
    tracing::info!(
        "IP: {} | MAC: {}",
        identity.ip_address,
        identity.hardware_address
    );

    let code = match SerialReader::open(&options.port, options.baud_rate) {
        Ok(mut reader) => {
            let dispatcher = options.http_dispatcher(identity);
            match rfid_forwarder::run(&options, &mut reader, &dispatcher, interrupted()).await {
                Ok(()) => EXIT_SUCCESS,
                Err(why) => {
                    tracing::error!("error: {}", why);
                    EXIT_ERROR
                }
            }
        }
        Err(why) => {
            tracing::error!("Cannot open {}: {}", options.port, why);
            EXIT_ERROR
        }
    };

    // process::exit skips destructors; flush the log file first
    drop(log_guard);
    std::process::exit(code);
}
