use async_trait::async_trait;
use std::time::Duration;

use super::{Properties, Removal, RemoteStore};
use crate::conf;
use crate::erx::ResultE;
use crate::tools::httpclient::{Client, ClientBuilder};

/// Remote store speaking JSON over HTTP.
pub struct HttpStore {
    client: Client,
}

impl HttpStore {
    pub fn new(client: Client) -> Self {
        HttpStore { client }
    }

    /// build from the `remote` config section
    pub fn from_remote(remote: &conf::Remote) -> ResultE<Self> {
        let mut builder = ClientBuilder::new(&remote.base);
        builder.use_json().set_timeout(Duration::from_secs(remote.timeout));

        if let Some(user_agent) = &remote.user_agent {
            builder.set_user_agent(user_agent);
        }

        for (name, value) in &remote.headers {
            builder.add_header(name, value)?;
        }

        if remote.no_tls_verify {
            builder.no_tls_verify();
        }

        Ok(HttpStore::new(builder.build()?))
    }

    /// build from the loaded settings
    pub fn shared() -> ResultE<Self> {
        let remote = conf::current().read().map_err(crate::erx::smp)?.remote.clone();
        Self::from_remote(&remote)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn fetch(&self, href: &str) -> ResultE<Properties> {
        self.client.get_object(href).await
    }

    async fn upsert(&self, href: &str, properties: &Properties) -> ResultE<Properties> {
        self.client.post_object(href, properties).await
    }

    async fn delete(&self, href: &str) -> ResultE<Removal> {
        let reply = self.client.delete(href).await?;
        if reply.is_not_found() {
            Ok(Removal::NotFound)
        } else if reply.is_success() {
            Ok(Removal::Deleted)
        } else {
            Err(reply.failure(href))
        }
    }
}
