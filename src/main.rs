//! SAM release pipeline - signs, packages and stamps provenance onto a
//! serverless application release.
//!
//! Configuration comes from command line flags or their environment
//! variables; see `--help`.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging, `info` unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match sam_release_pipeline::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
