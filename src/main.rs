#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use synthload::config::{Config, LogFormat};
use synthload::serve;
use tracing::info;

fn init_tracing(format: LogFormat) {
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    match format {
        LogFormat::Json => fmt.json().init(),
        LogFormat::Pretty => fmt.init(),
    }
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    info!(bind = %config.bind_addr, "starting load generator");
    serve(&config).await?;
    Ok(())
}
