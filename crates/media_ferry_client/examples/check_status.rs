use media_ferry_client::{config::Config, http_client::CompanionClient, liveness::LivenessProber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let prober = LivenessProber::new(
        CompanionClient::new(&cfg.base_url),
        cfg.probe_timeout,
        cfg.probe_interval,
    );
    let state = prober.probe().await;
    println!(
        "Companion service at {} is {}",
        cfg.base_url,
        if state.reachable { "up" } else { "down" }
    );
    Ok(())
}
