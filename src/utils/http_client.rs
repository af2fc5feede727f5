use reqwest::{header, Client};
use serde_json::Value;
use tracing::{error, info};

pub async fn post_json(
    client: &Client,
    url: &str,
    payload: &Value,
    headers: Option<header::HeaderMap>,
) -> anyhow::Result<()> {
    info!("Sending POST request to {}", url);

    let mut request = client.post(url).json(payload);

    if let Some(h) = headers {
        request = request.headers(h);
    }

    let res = request.send().await?;

    if res.status().is_success() {
        info!("✅ OK response");
        Ok(())
    } else {
        let status = res.status();
        let body = res.text().await?;
        error!("❌ Error response: status={}, body={}", status, body);
        Err(anyhow::anyhow!("Failed with status {}: {}", status, body))
    }
}
