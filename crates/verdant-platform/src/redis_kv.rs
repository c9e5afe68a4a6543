use anyhow::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use verdant_core::KvStore;

/// Redis-backed store. Every key is prefixed with the configured
/// namespace so several deployments can share one instance.
#[derive(Clone)]
pub struct RedisKv {
    client: Client,
    namespace: String,
}

impl RedisKv {
    pub fn connect(redis_url: &str, namespace: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = connection.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let _: () = connection.set(self.namespaced(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = connection.del(self.namespaced(key)).await?;
        Ok(())
    }
}
