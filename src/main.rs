use sensorlog::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize CLI and execute command
    if let Err(e) = Cli::run().await {
        eprintln!("✗ Error: {:#}", e);
        std::process::exit(1);
    }
}
