use sha2::{Digest, Sha256};

/// Cache key for a GET request, derived from its full URL (query included).
pub fn request_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("pubg_api_client.{}.{}", method, hex::encode(hasher.finalize()))
}
