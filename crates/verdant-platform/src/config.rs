use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub redis_url: String,
    pub http_addr: String,
    pub store_namespace: String,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        let redis_url = std::env::var("REDIS_URL").context("REDIS_URL is required")?;
        let http_addr =
            std::env::var("HTTP_ADDR").unwrap_or_else(|_| default_http_addr.to_string());
        let store_namespace =
            std::env::var("STORE_NAMESPACE").unwrap_or_else(|_| "verdant".to_string());

        Ok(Self {
            redis_url,
            http_addr,
            store_namespace,
        })
    }
}
