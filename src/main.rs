use std::io::Write;

use anyhow::Result;
use teampulse::{Config, LinearClient, ReportOrchestrator, TitleAgent};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    config.validate()?;

    // Logs go to stderr so the report stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(std::io::stderr)
        .init();

    let tracker = LinearClient::new(&config);
    let enhancer = TitleAgent::new(&config);
    let orchestrator = ReportOrchestrator::new(config, tracker, enhancer);

    let today = chrono::Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();
    orchestrator.write_report(&mut stdout, today).await?;
    stdout.flush()?;

    Ok(())
}
