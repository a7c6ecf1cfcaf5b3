use serde::{Deserialize, Serialize};

// GET /clip/v2/resource/bridge
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayInfo {
    pub id: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub model: Option<String>,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_type: Option<String>,
    pub r#type: Option<String>,
    pub version: Option<String>,
}

// POST /api, the username is the application key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: Option<String>,
}
