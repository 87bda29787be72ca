use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SampleCreateRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub auto_redirect: bool,
}

/// Update request; carries the create fields alongside the record id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SampleUpdateRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: SampleCreateRequest,
}

/// Path model with no registered validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReadRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleLookupResponse {
    pub id: Uuid,
    pub request: SampleCreateRequest,
}
