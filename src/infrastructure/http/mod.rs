//! Shared retried HTTP client factory (§11.3): every outbound HTTP
//! collaborator (broker REST calls, RSS polling) goes through a client built
//! here rather than a bare `reqwest::Client`, so transient failures get the
//! same retry treatment everywhere.

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Builds a client with exponential-backoff retry on transient failures:
    /// up to 3 retries, base delay ~500ms.
    pub fn create_client() -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_builds_without_panicking() {
        let _client = HttpClientFactory::create_client();
    }
}
