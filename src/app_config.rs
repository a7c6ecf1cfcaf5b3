use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    core: Core,
    gateway: Gateway,
    mqtt: Mqtt,
    discovery: Discovery,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("BWEE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut Gateway {
        &mut self.gateway
    }

    pub fn mqtt(&self) -> &Mqtt {
        &self.mqtt
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Core {
    event_buffer_size: usize,
}

impl Core {
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

/// The paired gateway. Both the address and the key may be unknown until discovery and pairing ran.
#[derive(Debug, Clone, Deserialize)]
pub struct Gateway {
    ip_address: Option<String>,
    api_key: Option<String>,
    port: u16,
    #[serde(with = "humantime_serde")]
    request_timeout: Duration,
    max_bad_request_retries: u32,
    host_label: String,
}

impl Gateway {
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn set_ip_address(&mut self, ip_address: impl Into<String>) {
        self.ip_address = Some(ip_address.into());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> Option<String> {
        self.ip_address.as_ref().map(|ip| format!("http://{}:{}", ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_bad_request_retries(&self) -> u32 {
        self.max_bad_request_retries
    }

    pub fn host_label(&self) -> &str {
        &self.host_label
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mqtt {
    port: u16,
    #[serde(with = "humantime_serde")]
    connect_timeout: Duration,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    max_packet_size: usize,
}

impl Mqtt {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    /// Largest MQTT packet accepted or sent, in bytes.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Discovery {
    #[serde(with = "humantime_serde")]
    timeout: Duration,
    listen_address: String,
    broadcast_address: String,
}

impl Discovery {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    pub fn broadcast_address(&self) -> &str {
        &self.broadcast_address
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { event_buffer_size: 16 },
                gateway: Gateway {
                    ip_address: Some("127.0.0.1".to_string()),
                    api_key: Some("key".to_string()),
                    port: 8080,
                    request_timeout: Duration::from_secs(2),
                    max_bad_request_retries: 1,
                    host_label: "Test Host".to_string(),
                },
                mqtt: Mqtt {
                    port: 1883,
                    connect_timeout: Duration::from_millis(200),
                    retry_ms: 10,
                    retry_max_delay_ms: 50,
                    max_packet_size: 2 * 1024 * 1024,
                },
                discovery: Discovery {
                    timeout: Duration::from_millis(200),
                    listen_address: "127.0.0.1:0".to_string(),
                    broadcast_address: "127.0.0.1:9001".to_string(),
                },
            },
        }
    }

    /// Points the gateway at a `host:port` pair, such as the one of a mock server.
    pub fn gateway_host_with_port(mut self, host_with_port: &str) -> Self {
        let (host, port) = host_with_port.rsplit_once(':').expect("expected host:port");
        self.config.gateway.ip_address = Some(host.to_string());
        self.config.gateway.port = port.parse().expect("expected a numeric port");
        self
    }

    pub fn api_key(mut self, api_key: Option<&str>) -> Self {
        self.config.gateway.api_key = api_key.map(str::to_string);
        self
    }

    pub fn max_bad_request_retries(mut self, retries: u32) -> Self {
        self.config.gateway.max_bad_request_retries = retries;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.gateway.request_timeout = timeout;
        self
    }

    pub fn mqtt_port(mut self, port: u16) -> Self {
        self.config.mqtt.port = port;
        self
    }

    pub fn discovery_addresses(mut self, listen_address: &str, broadcast_address: &str) -> Self {
        self.config.discovery.listen_address = listen_address.to_string();
        self.config.discovery.broadcast_address = broadcast_address.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
