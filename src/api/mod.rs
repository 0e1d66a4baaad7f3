pub mod config;
pub mod token;
#[cfg(test)]
pub(crate) mod test_server;

pub use config::{ApiConfig, ApiConfigLoader, Endpoints, EXAMPLE_CONFIG};

use crate::errors::{MediaRankError, Result};
use crate::providers::Provider;
use crate::utils::logger::Logger;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Shared HTTP transport for every provider
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    request_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Create a new API client with configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::from_builder(config, Client::builder())
    }

    /// Client that ignores proxy environment variables
    #[cfg(test)]
    pub(crate) fn direct(config: &ApiConfig) -> Result<Self> {
        Self::from_builder(config, Client::builder().no_proxy())
    }

    fn from_builder(config: &ApiConfig, builder: ClientBuilder) -> Result<Self> {
        let mut client_builder = builder
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent);

        // Add proxy support if configured
        if let Some(proxy_config) = &config.proxy_config {
            if proxy_config.enabled {
                let proxy_url = if let (Some(username), Some(password)) =
                    (&proxy_config.username, &proxy_config.password)
                {
                    format!(
                        "http://{}:{}@{}:{}",
                        username, password, proxy_config.host, proxy_config.port
                    )
                } else {
                    format!("http://{}:{}", proxy_config.host, proxy_config.port)
                };

                client_builder = client_builder.proxy(reqwest::Proxy::all(&proxy_url)?);
            }
        }

        Ok(Self {
            client: client_builder.build()?,
            request_timeout: config.request_timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Send a request and decode its JSON body.
    ///
    /// `build` is called again for every retry. Transient failures are retried
    /// up to the configured limit with a linear backoff; anything else is
    /// returned immediately.
    pub async fn get_json<T, F>(&self, provider: Provider, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.send_once(provider, &build).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} request failed ({}), retry {}/{}",
                        provider, e, attempt, self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once<T, F>(&self, provider: Provider, build: &F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let request = build(&self.client).build()?;
        // query strings carry API keys, so only host and path are logged
        let target = format!(
            "{}{}",
            request.url().host_str().unwrap_or_default(),
            request.url().path()
        );
        Logger::log_api_request(request.method().as_str(), &target);

        let body = with_timeout(provider, self.request_timeout, async {
            let response = self.client.execute(request).await.map_err(|e| {
                if e.is_timeout() {
                    MediaRankError::Timeout {
                        provider,
                        after: self.request_timeout,
                    }
                } else {
                    MediaRankError::Network(e)
                }
            })?;

            let status = response.status();
            Logger::log_api_response(status.as_u16(), &target);
            let body = response.bytes().await?;

            if !status.is_success() {
                let message = upstream_message(&body)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                Logger::log_api_error(&message, &target);
                return Err(MediaRankError::Upstream {
                    provider,
                    status: Some(status.as_u16()),
                    message,
                });
            }
            Ok(body)
        })
        .await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Bound a provider call by `after`, surfacing a hang as [`MediaRankError::Timeout`]
pub async fn with_timeout<T, Fut>(provider: Provider, after: Duration, call: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(MediaRankError::Timeout { provider, after }),
    }
}

/// Pull a human-readable message out of a provider error body
pub fn upstream_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error").or_else(|| value.get("Error"))?;

    let message = match error {
        serde_json::Value::String(code) => match value.get("error_description").and_then(|d| d.as_str()) {
            Some(description) => format!("{}: {}", code, description),
            None => code.clone(),
        },
        serde_json::Value::Object(fields) => fields.get("message")?.as_str()?.to_string(),
        _ => return None,
    };

    Some(message).filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::test_server::ScriptedServer;
    use super::*;

    #[test]
    fn test_upstream_message_shapes() {
        assert_eq!(
            upstream_message(br#"{"error":{"status":400,"message":"invalid id"}}"#).as_deref(),
            Some("invalid id")
        );
        assert_eq!(
            upstream_message(br#"{"Response":"False","Error":"Movie not found!"}"#).as_deref(),
            Some("Movie not found!")
        );
        assert_eq!(
            upstream_message(
                br#"{"error":"invalid_client","error_description":"Invalid client secret"}"#
            )
            .as_deref(),
            Some("invalid_client: Invalid client secret")
        );
        assert_eq!(upstream_message(b"<html>502</html>"), None);
        assert_eq!(upstream_message(br#"{"ok":true}"#), None);
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        let result: Result<()> = with_timeout(
            Provider::Youtube,
            Duration::from_millis(20),
            std::future::pending(),
        )
        .await;

        match result {
            Err(MediaRankError::Timeout { provider, after }) => {
                assert_eq!(provider, Provider::Youtube);
                assert_eq!(after, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = with_timeout(Provider::Omdb, Duration::from_secs(5), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    fn scripted_client(retries: u32) -> ApiClient {
        let config = ApiConfig {
            max_retries: retries,
            retry_delay: Duration::from_millis(20),
            ..Default::default()
        };
        ApiClient::direct(&config).unwrap()
    }

    async fn fetch(client: &ApiClient, server: &ScriptedServer) -> Result<serde_json::Value> {
        let url = server.url("/v1/items");
        client
            .get_json(Provider::Omdb, |http| http.get(&url).query(&[("page", "1")]))
            .await
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_with_backoff() {
        let server = ScriptedServer::start(vec![
            (503, r#"{"error":"busy"}"#),
            (429, r#"{"error":"slow down"}"#),
            (200, r#"{"n":1}"#),
        ])
        .await;
        let client = scripted_client(2);

        let started = std::time::Instant::now();
        let value = fetch(&client, &server).await.unwrap();

        assert_eq!(value["n"], 1);
        assert_eq!(server.request_lines().len(), 3);
        // 20ms then 40ms
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(server.requests().iter().all(|r| r.contains("page=1")));
    }

    #[tokio::test]
    async fn test_retries_stop_at_the_limit() {
        let server = ScriptedServer::start(vec![
            (500, r#"{"error":"down"}"#),
            (502, r#"{"error":"down"}"#),
            (503, r#"{"error":"still down"}"#),
        ])
        .await;
        let client = scripted_client(2);

        match fetch(&client, &server).await {
            Err(MediaRankError::Upstream {
                status, message, ..
            }) => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "still down");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert_eq!(server.request_lines().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = ScriptedServer::start(vec![(404, r#"{"error":"no such item"}"#)]).await;
        let client = scripted_client(2);

        let result = fetch(&client, &server).await;
        assert!(matches!(
            result,
            Err(MediaRankError::Upstream {
                status: Some(404),
                ..
            })
        ));
        assert_eq!(server.request_lines(), vec!["GET /v1/items".to_string()]);
    }

    #[test]
    fn test_client_builds_with_proxy() {
        let mut config = ApiConfig::default();
        config.proxy_config = Some(crate::config::ProxyConfig {
            enabled: true,
            ..Default::default()
        });
        assert!(ApiClient::new(&config).is_ok());
    }
}
