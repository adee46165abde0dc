use gemini::{config::Config, runner::Runner};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries model text only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gemini=info,gemini_stream_runner=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().inspect_err(|e| error!("configuration error: {e}"))?;
    info!(model = %config.model, "configuration loaded");

    let runner = Runner::new(config.client()).inspect_err(|e| error!("{e}"))?;
    let mut stdout = std::io::stdout().lock();
    runner
        .run(&mut stdout)
        .await
        .inspect_err(|e| error!("generation failed: {e}"))?;

    Ok(())
}
