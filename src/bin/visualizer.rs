use balanceflow::{
    devices::balanceboard::BAUD_RATE,
    output::{board::RenderTarget, Visualizer},
    session,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Plot center of pressure and force distribution of the balance board
#[derive(Parser)]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// Serial port of the balance board
    #[arg(default_value = "COM7")]
    port: String,

    /// Baud rate of the serial connection
    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Redraw interval in milliseconds
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Image that is redrawn on every tick
    #[arg(long, short, default_value = "balance_board.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 1400)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli {
        port,
        baud,
        interval_ms,
        output,
        width,
        height,
    } = Cli::parse();

    let visualizer = match Visualizer::open(&port, baud) {
        Ok(visualizer) => visualizer,
        Err(e) => {
            println!("Error: Could not open serial port {port}");
            println!("Details: {}", e.detail());
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to {port} at {baud} baud\n");

    let mut visualizer = visualizer.with_target(RenderTarget {
        path: output.clone(),
        size: (width, height),
    });
    println!("Starting visualization...");
    println!("Rendering to {}, press Ctrl-C to stop\n", output.display());

    let res = session::run_until_interrupt(
        &mut visualizer,
        Duration::from_millis(interval_ms.max(1)),
    )
    .await;

    visualizer.close();
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
