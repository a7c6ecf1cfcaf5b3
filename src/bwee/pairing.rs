use crate::bwee::resources::{get_auth, get_gateway_info};
use crate::bwee::{ApiClient, ApiResult, GatewayInfo};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug, PartialEq)]
pub enum PairingError {
    #[error("cannot connect to the gateway: {0}")]
    CannotConnect(String),
    #[error("gateway rejected the pairing: {0}")]
    Auth(String),
}

impl<T> From<&ApiResult<T>> for PairingError {
    fn from(result: &ApiResult<T>) -> Self {
        if result.is_local_failure() {
            PairingError::CannotConnect(result.message().to_string())
        } else {
            PairingError::Auth(result.message().to_string())
        }
    }
}

/// Requests a new application key. The link button on the gateway has to be pressed first.
#[instrument(skip(client))]
pub async fn acquire_credential(client: &ApiClient, ip_address: &str, port: u16) -> Result<String, PairingError> {
    info!("🔑 Pairing with gateway at {}...", ip_address);
    let result = get_auth(client, ip_address, port).await;
    if !result.is_ok() {
        warn!("⚠️ Pairing refused, is the link button pressed? {}", result.message());
        return Err(PairingError::from(&result));
    }

    let username = result.into_object().and_then(|user| user.username);
    match username {
        Some(api_key) => {
            info!("🔑 Pairing with gateway at {}... OK", ip_address);
            Ok(api_key)
        }
        None => Err(PairingError::Auth("no application key in the response".to_string())),
    }
}

/// Checks that the configured key is accepted and returns the gateway's identity.
#[instrument(skip(client))]
pub async fn verify_credential(client: &ApiClient) -> Result<GatewayInfo, PairingError> {
    let result = get_gateway_info(client).await;
    if !result.is_ok() {
        return Err(PairingError::from(&result));
    }

    result
        .into_objects()
        .into_iter()
        .next()
        .ok_or_else(|| PairingError::Auth("gateway did not describe itself".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn port_of(server: &mockito::ServerGuard) -> u16 {
        server.socket_address().port()
    }

    #[tokio::test]
    async fn acquires_the_username_as_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api")
            .match_body(Matcher::Json(json!({ "device_type": "bweetech#home_assistant" })))
            .with_status(200)
            .with_body(r#"{ "code": 0, "data": { "obj": { "username": "new-key" } } }"#)
            .create_async()
            .await;
        // Pairing targets the given address, not the client's configured gateway.
        let config = AppConfigBuilder::new().gateway_host_with_port("127.0.0.1:1").api_key(None).build();
        let client = ApiClient::new(config.gateway());

        let key = acquire_credential(&client, "127.0.0.1", port_of(&server)).await;

        mock.assert_async().await;
        assert_eq!(key, Ok("new-key".to_string()));
    }

    #[tokio::test]
    async fn link_button_not_pressed_is_an_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api")
            .with_status(200)
            .with_body(r#"{ "code": 101, "msg": "link button not pressed" }"#)
            .create_async()
            .await;
        let client = ApiClient::new(AppConfigBuilder::new().api_key(None).build().gateway());

        let key = acquire_credential(&client, "127.0.0.1", port_of(&server)).await;

        assert_eq!(key, Err(PairingError::Auth("link button not pressed".to_string())));
    }

    #[tokio::test]
    async fn unreachable_gateway_cannot_connect() {
        let client = ApiClient::new(AppConfigBuilder::new().api_key(None).build().gateway());

        let key = acquire_credential(&client, "127.0.0.1", 1).await;

        assert!(matches!(key, Err(PairingError::CannotConnect(_))));
    }

    #[tokio::test]
    async fn verifies_a_key_and_returns_the_gateway() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/clip/v2/resource/bridge")
            .match_header("application-key", "key")
            .with_status(200)
            .with_body(include_str!("../../tests/resources/gateway_info_response.json"))
            .create_async()
            .await;
        let config = AppConfigBuilder::new().gateway_host_with_port(&server.host_with_port()).build();

        let info = verify_credential(&ApiClient::new(config.gateway())).await.unwrap();

        assert_eq!(info.mac.as_deref(), Some("a4:c1:38:00:11:22"));
    }

    #[tokio::test]
    async fn rejected_key_is_an_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/clip/v2/resource/bridge")
            .with_status(200)
            .with_body(r#"{ "code": 403, "msg": "unauthorized" }"#)
            .create_async()
            .await;
        let config = AppConfigBuilder::new().gateway_host_with_port(&server.host_with_port()).build();

        let info = verify_credential(&ApiClient::new(config.gateway())).await;

        assert_eq!(info, Err(PairingError::Auth("unauthorized".to_string())));
    }
}
