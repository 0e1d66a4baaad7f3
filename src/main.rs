mod api;
mod cache;
mod cli;
mod config;
mod errors;
mod pipeline;
mod providers;
mod render;
mod settings;
mod utils;

use cli::Cli;
use utils::logger::Logger;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger
    if let Err(e) = Logger::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    // Execute the command
    if let Err(e) = cli.execute().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
