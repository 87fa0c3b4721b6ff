use std::path::Path;
use std::time::Duration;

use sentinel_worker::MonitorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env();
    println!(
        "sentinel-selfcheck: starting with source={} landmarks={} sink={}",
        config.source.source, config.landmarks.url, config.dispatch.sink_url
    );
    config.validate()?;

    if let Some(dir) = &config.source.image_dir {
        ensure_image_dir(dir)?;
    }
    ensure_reachable("landmark service", &config.landmarks.url).await?;
    ensure_reachable("alert sink", &config.dispatch.sink_url).await?;

    println!("sentinel-selfcheck: ok");
    Ok(())
}

fn ensure_image_dir(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        return Err(anyhow::anyhow!(
            "image directory {} does not exist",
            path.display()
        ));
    }
    Ok(())
}

/// Any HTTP response counts; only connection failures are fatal.
async fn ensure_reachable(name: &str, url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("{} not reachable at {}: {}", name, url, e))?;
    println!(
        "sentinel-selfcheck: {} reachable (HTTP {})",
        name,
        response.status().as_u16()
    );
    Ok(())
}
