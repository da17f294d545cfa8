//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use toolshelf_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .relay_port(0)
///     .max_requests(1)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn relay_addr(mut self, addr: &str) -> Self {
        self.config.relay.listen_addr = addr.to_string();
        self
    }

    pub fn relay_port(mut self, port: u16) -> Self {
        self.config.relay.listen_port = port;
        self
    }

    pub fn route(mut self, route: &str) -> Self {
        self.config.relay.route = route.to_string();
        self
    }

    pub fn max_requests(mut self, n: u32) -> Self {
        self.config.relay.max_requests = n;
        self
    }

    pub fn window_secs(mut self, secs: u64) -> Self {
        self.config.relay.window_secs = secs;
        self
    }

    pub fn upstream_endpoint(mut self, endpoint: &str) -> Self {
        self.config.upstream.endpoint = endpoint.to_string();
        self
    }

    pub fn relay_url(mut self, url: &str) -> Self {
        self.config.chat.relay_url = url.to_string();
        self
    }

    pub fn provider(mut self, provider: &str) -> Self {
        self.config.chat.provider = provider.to_string();
        self
    }

    pub fn default_model(mut self, model: &str) -> Self {
        self.config.chat.default_model = model.to_string();
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.chat.retry_delay_ms = ms;
        self
    }

    pub fn plain_text(mut self, plain_text: bool) -> Self {
        self.config.chat.plain_text = plain_text;
        self
    }

    pub fn data_dir(mut self, dir: &str) -> Self {
        self.config.catalog.data_dir = dir.to_string();
        self
    }

    pub fn credentials_path(mut self, path: &str) -> Self {
        self.config.credentials.path = path.to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
