use media_ferry_client::{RequestKind, config::Config, session::Session};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;

    let Some(url) = std::env::args().nth(1) else {
        eprintln!("usage: cargo run -p media_ferry_client --example deliver_image -- <image_url>");
        return Ok(());
    };

    let session = Session::start(cfg)?;
    let result = session
        .orchestrator()
        .request_delivery(&url, RequestKind::Image)
        .await;

    match result {
        Ok(result) => {
            for outcome in &result.outcomes {
                println!(
                    "{:>14}: {} ({})",
                    outcome.channel.as_str(),
                    if outcome.success { "ok" } else { "failed" },
                    outcome.message
                );
            }
            println!("artifact: {}", result.artifact_name);
        }
        Err(e) => eprintln!("rejected: {}", e),
    }

    session.shutdown().await;
    Ok(())
}
