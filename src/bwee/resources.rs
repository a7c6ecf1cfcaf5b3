use crate::bwee::client::{ApiClient, ApiRequest};
use crate::bwee::{ApiResult, ControlForm, Device, GatewayInfo, Light, SearchForm, User};
use crate::codec;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, instrument};

const DEVICE_TYPE: &str = "bweetech#home_assistant";

#[instrument(skip(client))]
pub async fn get_all_devices(client: &ApiClient, form: &SearchForm) -> ApiResult<Device> {
    info!("Retrieving devices...");
    let query = match codec::encode_query(form) {
        Ok(query) => query,
        Err(e) => return ApiResult::failure(e.to_string()),
    };

    let result = client.get("/clip/v2/resource/device", query).await;
    if result.is_ok() {
        info!("Retrieving devices... OK, {} found", result.count());
    }
    result
}

pub async fn device_by_id(client: &ApiClient, device_id: &str) -> ApiResult<Device> {
    client.get(&format!("/clip/v2/resource/device/{}", device_id), Vec::new()).await
}

pub async fn device_control(client: &ApiClient, device_id: &str, form: &ControlForm) -> ApiResult<Value> {
    client.put(&format!("/clip/v2/resource/device/{}/light", device_id), form).await
}

pub async fn get_all_lights(client: &ApiClient) -> ApiResult<Light> {
    client.get("/clip/v2/resource/light", Vec::new()).await
}

/// Lights of a device. The gateway resolves a device id on the single-light route.
pub async fn get_lights(client: &ApiClient, device_id: &str) -> ApiResult<Light> {
    client.get(&format!("/clip/v2/resource/light/{}", device_id), Vec::new()).await
}

pub async fn light_by_id(client: &ApiClient, light_id: &str) -> ApiResult<Light> {
    client.get(&format!("/clip/v2/resource/light/{}", light_id), Vec::new()).await
}

pub async fn light_control(client: &ApiClient, light_id: &str, form: &ControlForm) -> ApiResult<Value> {
    client.put(&format!("/clip/v2/resource/light/{}", light_id), form).await
}

pub async fn get_gateway_info(client: &ApiClient) -> ApiResult<GatewayInfo> {
    client.get("/clip/v2/resource/bridge", Vec::new()).await
}

/// Asks the gateway at `ip_address` for an application key. Only succeeds while its link button is pressed.
#[instrument(skip(client))]
pub async fn get_auth(client: &ApiClient, ip_address: &str, port: u16) -> ApiResult<User> {
    let request = ApiRequest::new(Method::POST, "/api")
        .base(format!("http://{}:{}", ip_address, port))
        .body(json!({ "device_type": DEVICE_TYPE }));

    client.send(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use crate::codec::Flag;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        let config = AppConfigBuilder::new().gateway_host_with_port(&server.host_with_port()).build();
        ApiClient::new(config.gateway())
    }

    #[tokio::test]
    async fn get_all_devices_sends_the_search_form_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/clip/v2/resource/device")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("cat1_id".to_string(), "2".to_string()),
                Matcher::UrlEncoded("ext_light".to_string(), "1".to_string()),
                Matcher::UrlEncoded("ext_room".to_string(), "1".to_string()),
                Matcher::UrlEncoded("join_status".to_string(), "1".to_string()),
            ]))
            .with_status(200)
            .with_body(include_str!("../../tests/resources/device_list_response.json"))
            .create_async()
            .await;
        let form = SearchForm {
            cat1_id: Some(2),
            ext_light: Some(1),
            ext_room: Some(1),
            ..SearchForm::default()
        };

        let result = get_all_devices(&client_for(&server), &form).await;

        mock.assert_async().await;
        assert_eq!(result.count(), 2);
        assert_eq!(result.objects()[1].name.as_deref(), Some("Hallway"));
    }

    #[tokio::test]
    async fn get_lights_decodes_a_light_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/clip/v2/resource/light/dev-3")
            .with_status(200)
            .with_body(include_str!("../../tests/resources/light_list_response.json"))
            .create_async()
            .await;

        let result = get_lights(&client_for(&server), "dev-3").await;

        mock.assert_async().await;
        assert_eq!(result.objects()[0].id.as_deref(), Some("light-3"));
        assert_eq!(result.objects()[0].color_temp, Some(2700));
    }

    #[tokio::test]
    async fn device_control_puts_the_form_on_the_device_light() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/clip/v2/resource/device/dev-1/light")
            .match_body(Matcher::Json(json!({ "on": 0 })))
            .with_status(200)
            .with_body(r#"{ "code": 0, "msg": "success" }"#)
            .create_async()
            .await;
        let form = ControlForm {
            on: Some(Flag::from(false)),
            ..ControlForm::default()
        };

        let result = device_control(&client_for(&server), "dev-1", &form).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn light_control_puts_the_form_on_the_light() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/clip/v2/resource/light/light-1")
            .match_body(Matcher::Json(json!({ "color_cw": 3000 })))
            .with_status(200)
            .with_body(r#"{ "code": 0 }"#)
            .create_async()
            .await;
        let form = ControlForm {
            color_temp: Some(3000),
            ..ControlForm::default()
        };

        let result = light_control(&client_for(&server), "light-1", &form).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn get_gateway_info_returns_the_bridge() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/clip/v2/resource/bridge")
            .with_status(200)
            .with_body(include_str!("../../tests/resources/gateway_info_response.json"))
            .create_async()
            .await;

        let result = get_gateway_info(&client_for(&server)).await;

        assert_eq!(result.objects()[0].mac.as_deref(), Some("a4:c1:38:00:11:22"));
    }

    #[tokio::test]
    async fn device_and_light_lookups_use_the_id_routes() {
        let mut server = mockito::Server::new_async().await;
        let device_mock = server
            .mock("GET", "/clip/v2/resource/device/dev-1")
            .with_status(200)
            .with_body(r#"{ "code": 0, "data": { "obj": { "id": "dev-1" } } }"#)
            .create_async()
            .await;
        let light_mock = server
            .mock("GET", "/clip/v2/resource/light/light-1")
            .with_status(200)
            .with_body(r#"{ "code": 0, "data": { "obj": { "id": "light-1" } } }"#)
            .create_async()
            .await;
        let lights_mock = server
            .mock("GET", "/clip/v2/resource/light")
            .with_status(200)
            .with_body(r#"{ "code": 0, "data": { "arr": [] } }"#)
            .create_async()
            .await;
        let client = client_for(&server);

        let device = device_by_id(&client, "dev-1").await;
        let light = light_by_id(&client, "light-1").await;
        let lights = get_all_lights(&client).await;

        device_mock.assert_async().await;
        light_mock.assert_async().await;
        lights_mock.assert_async().await;
        assert_eq!(device.object().and_then(|d| d.id.as_deref()), Some("dev-1"));
        assert_eq!(light.object().and_then(|l| l.id.as_deref()), Some("light-1"));
        assert_eq!(lights.count(), 0);
    }
}
