use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Code carried by results that never reached the gateway, or whose response could not be used.
pub const LOCAL_FAILURE_CODE: i64 = -10086;

/// The gateway's response envelope. `code == 0` means success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ApiResult<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "msg", alias = "message")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ResultData<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ResultData<T> {
    #[serde(default)]
    pub arr: Option<Vec<T>>,
    #[serde(default)]
    pub obj: Option<T>,
    #[serde(default)]
    pub len: usize,
}

impl<T> Default for ApiResult<T> {
    fn default() -> Self {
        ApiResult {
            code: None,
            message: None,
            data: None,
        }
    }
}

impl<T> ApiResult<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResult {
            code: Some(LOCAL_FAILURE_CODE),
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Some(0)
    }

    /// True when the failure was produced locally (transport, status or decode) rather than by the gateway.
    pub fn is_local_failure(&self) -> bool {
        self.code == Some(LOCAL_FAILURE_CODE)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// Length of the array payload as counted on receipt.
    pub fn count(&self) -> usize {
        self.data.as_ref().map_or(0, |data| data.len)
    }

    pub fn objects(&self) -> &[T] {
        self.data.as_ref().and_then(|data| data.arr.as_deref()).unwrap_or_default()
    }

    pub fn into_objects(self) -> Vec<T> {
        self.data.and_then(|data| data.arr).unwrap_or_default()
    }

    pub fn object(&self) -> Option<&T> {
        self.data.as_ref().and_then(|data| data.obj.as_ref())
    }

    pub fn into_object(self) -> Option<T> {
        self.data.and_then(|data| data.obj)
    }

    pub(crate) fn count_objects(&mut self) {
        if let Some(data) = self.data.as_mut() {
            if let Some(arr) = data.arr.as_ref() {
                data.len = arr.len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bwee::{Device, User};
    use crate::codec::{DecodeError, decode};
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Token {
        value: String,
    }

    #[test]
    fn a_zero_code_is_ok() -> Result<(), DecodeError> {
        let result: ApiResult<User> = decode(json!({ "code": 0, "msg": "success", "data": { "obj": { "username": "key" } } }))?;

        assert!(result.is_ok());
        assert_eq!(result.message(), "success");
        assert_eq!(result.object().and_then(|user| user.username.as_deref()), Some("key"));
        Ok(())
    }

    #[test]
    fn a_non_zero_code_is_a_failure() -> Result<(), DecodeError> {
        let result: ApiResult<User> = decode(json!({ "code": 101, "message": "link button not pressed" }))?;

        assert!(!result.is_ok());
        assert!(!result.is_local_failure());
        assert_eq!(result.message(), "link button not pressed");
        Ok(())
    }

    #[test]
    fn a_missing_code_is_a_failure() -> Result<(), DecodeError> {
        let result: ApiResult<User> = decode(json!({}))?;

        assert!(!result.is_ok());
        Ok(())
    }

    #[test]
    fn failure_uses_the_local_failure_code() {
        let result = ApiResult::<Device>::failure("Response code: 500");

        assert_eq!(result.code, Some(LOCAL_FAILURE_CODE));
        assert!(result.is_local_failure());
        assert!(result.objects().is_empty());
    }

    #[test]
    fn count_objects_sets_the_length_of_an_array_payload() -> Result<(), DecodeError> {
        let mut result: ApiResult<Device> = decode(json!({ "code": 0, "data": { "arr": [{ "id": "a" }, { "id": "b" }] } }))?;
        assert_eq!(result.count(), 0);

        result.count_objects();

        assert_eq!(result.count(), 2);
        assert_eq!(result.into_objects().len(), 2);
        Ok(())
    }

    #[test]
    fn decodes_payload_types_without_a_default() -> Result<(), DecodeError> {
        let result: ApiResult<Token> = decode(json!({ "code": 0, "data": { "arr": [{ "value": "a" }], "obj": { "value": "b" } } }))?;

        assert_eq!(result.objects()[0].value, "a");
        assert_eq!(result.object().map(|token| token.value.as_str()), Some("b"));
        Ok(())
    }
}
