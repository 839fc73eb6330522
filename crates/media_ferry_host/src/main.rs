use media_ferry_client::config::Config;
use media_ferry_client::session::Session;
use media_ferry_host::{COMMAND_QUEUE_DEPTH, Dispatcher, env_filter, log_filter_from, read_commands};
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_env = log_filter_from(|k| std::env::var(k).ok());
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&log_env))
        .init();
    tracing::info!("media_ferry_host: log filter: {}", log_env);

    let config = Config::from_env()?;
    let service = config.base_url.clone();
    let session = Session::start(config)?;

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let reader = tokio::spawn(read_commands(tokio::io::stdin(), tx));
    tracing::info!("media_ferry_host: reading commands from stdin");

    let dispatcher = Dispatcher::new(session.orchestrator(), service);
    let outcome = dispatcher.run(rx, tokio::io::stdout()).await;
    if outcome.is_err() {
        reader.abort();
    }

    match reader.await {
        Err(e) if e.is_cancelled() => {}
        Ok(Err(e)) => tracing::warn!("media_ferry_host: input error: {}", e),
        Err(e) => tracing::warn!("media_ferry_host: input task failed: {}", e),
        Ok(Ok(())) => {}
    }
    session.shutdown().await;
    outcome?;
    Ok(())
}
