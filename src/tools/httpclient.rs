use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use std::{str::FromStr, time::Duration};

use crate::erx::{amp, emp, Erx, Fault, ResultE};
use crate::tools::json::{Dec, Enc};
use crate::tools::url::resolve;

pub struct ClientBuilder {
    base: String,
    headers: reqwest::header::HeaderMap,
    user_agent: Option<String>,
    timeout: Duration,
    no_tls_verify: bool,
}

pub struct Client {
    base: String,
    cli: reqwest::Client,
}

/// Status and raw body of a finished request
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

pub struct UserAgentBuilder {
    product: String,
    version: String,
    platform: Option<String>,
}

impl UserAgentBuilder {
    pub fn new(product: &str, version: &str) -> Self {
        UserAgentBuilder { product: product.to_string(), version: version.to_string(), platform: None }
    }

    pub fn platform(&mut self, platform: &str) -> &mut Self {
        self.platform = Some(platform.to_string());
        self
    }

    // product/version (platform)
    pub fn build(&self) -> String {
        let mut parts = vec![format!("{}/{}", self.product, self.version)];

        if let Some(platform) = &self.platform {
            parts.push(format!("({})", platform));
        }

        parts.join(" ")
    }
}

fn default_user_agent() -> String {
    UserAgentBuilder::new("ringsdata", crate::VERSION).platform(std::env::consts::OS).build()
}

impl ClientBuilder {
    pub fn new(base: &str) -> ClientBuilder {
        ClientBuilder {
            base: base.to_string(),
            headers: reqwest::header::HeaderMap::new(),
            user_agent: None,
            timeout: Duration::from_secs(10),
            no_tls_verify: false,
        }
    }

    pub fn set_user_agent(&mut self, agent: &str) -> &mut Self {
        self.user_agent = Some(agent.to_string());
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn add_header(&mut self, key: &str, value: &str) -> ResultE<&mut Self> {
        let key = reqwest::header::HeaderName::from_str(key).map_err(amp("invalid header name"))?;
        let value = reqwest::header::HeaderValue::from_str(value).map_err(amp("invalid header value"))?;
        self.headers.insert(key, value);
        Ok(self)
    }

    pub fn use_json(&mut self) -> &mut Self {
        let val = reqwest::header::HeaderValue::from_static("application/json");
        self.headers.insert(reqwest::header::ACCEPT, val.clone());
        self.headers.insert(reqwest::header::CONTENT_TYPE, val);
        self
    }

    pub fn no_tls_verify(&mut self) -> &mut Self {
        self.no_tls_verify = true;
        self
    }

    pub fn build(self) -> ResultE<Client> {
        let mut builder = reqwest::Client::builder();

        let user_agent = self.user_agent.clone().unwrap_or_else(default_user_agent);
        builder = builder.user_agent(user_agent);
        builder = builder.default_headers(self.headers);
        builder = builder.timeout(self.timeout);
        builder = builder.redirect(reqwest::redirect::Policy::none());

        if self.no_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let cli = builder.build().map_err(amp("http client build failed"))?;
        Ok(Client { base: self.base, cli })
    }
}

impl Client {
    pub async fn get(&self, href: &str) -> ResultE<Reply> {
        Self::_send(self.cli.get(resolve(&self.base, href)), href).await
    }

    pub async fn post<T>(&self, href: &str, params: &T) -> ResultE<Reply>
    where
        T: serde::Serialize + ?Sized,
    {
        Self::_send(self.cli.post(resolve(&self.base, href)).json(params), href).await
    }

    pub async fn delete(&self, href: &str) -> ResultE<Reply> {
        Self::_send(self.cli.delete(resolve(&self.base, href)), href).await
    }

    /// GET a JSON object, non-2xx is a remote failure
    pub async fn get_object(&self, href: &str) -> ResultE<Map<String, Value>> {
        Self::_object(self.get(href).await?, href)
    }

    /// POST a JSON object and read the JSON object back, non-2xx is a remote failure
    pub async fn post_object(&self, href: &str, params: &Map<String, Value>) -> ResultE<Map<String, Value>> {
        Self::_object(self.post(href, params).await?, href)
    }

    async fn _send(request: RequestBuilder, href: &str) -> ResultE<Reply> {
        let response = request.send().await.map_err(|e| emp(e).extra_with("HREF", href))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| emp(e).extra_with("HREF", href))?;
        tracing::trace!(%status, href, "remote replied");
        Ok(Reply { status, body })
    }

    fn _object(reply: Reply, href: &str) -> ResultE<Map<String, Value>> {
        if reply.status.is_success() {
            Dec::object(&reply.body).map_err(|e| e.extra_with("HREF", href))
        } else {
            Err(reply.failure(href))
        }
    }
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// remote failure carrying status, href and the server's message when it sent one
    pub fn failure(&self, href: &str) -> Erx {
        let message = Dec::object(&self.body)
            .ok()
            .and_then(|m| m.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("remote replied {}", self.status));

        Erx::with_fault(Fault::RemoteFailure, &message)
            .extra_with("STATUS", self.status.as_str())
            .extra_with("HREF", href)
            .extra_with("BODY", &Enc::ens(&self.body))
    }
}
