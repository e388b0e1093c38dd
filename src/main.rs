use std::process::ExitCode;

use gsd_cli::exit::ExitStatus;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match gsd_cli::cli::run(std::env::args_os()).await {
        Ok(()) => ExitCode::from(ExitStatus::Ok as u8),
        Err(error) => {
            let status = error.exit_status();
            tracing::error!(%error, "gsd exiting with {status}");
            ExitCode::from(status as u8)
        }
    }
}
