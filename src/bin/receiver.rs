use balanceflow::{devices::balanceboard::BAUD_RATE, output::Receiver, session};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

/// Print every line the balance board sends
#[derive(Parser)]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// Serial port of the balance board
    #[arg(default_value = "COM7")]
    port: String,

    /// Baud rate of the serial connection
    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Pause between two polls of the port in milliseconds
    #[arg(long, default_value_t = 1)]
    poll_interval_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli {
        port,
        baud,
        poll_interval_ms,
    } = Cli::parse();

    let mut receiver = match Receiver::open(&port, baud) {
        Ok(receiver) => receiver,
        Err(e) => {
            println!("Error: Could not open serial port {port}");
            println!("Details: {}", e.detail());
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to {port} at {baud} baud\n");

    let res = session::run_until_interrupt(
        &mut receiver,
        Duration::from_millis(poll_interval_ms.max(1)),
    )
    .await;

    receiver.close();
    println!("\nSerial connection closed");

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
