use chrono::{TimeZone, Utc};
use domain::{Comment, ServiceError};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    // 认证失败时 Reddit 可能仍返回 200，只带 error 字段
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct Me {
    pub name: String,
}

#[derive(Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Deserialize)]
pub struct ListingData {
    pub children: Vec<Thing>,
    pub after: Option<String>,
}

#[derive(Deserialize)]
pub struct Thing {
    pub data: RawComment,
}

#[derive(Deserialize)]
pub struct RawComment {
    /// fullname, 例如 `t1_abc123`
    pub name: String,
    pub body: String,
    pub created_utc: f64,
}

impl TryFrom<RawComment> for Comment {
    type Error = ServiceError;

    fn try_from(raw: RawComment) -> Result<Self, Self::Error> {
        let secs = raw.created_utc.trunc() as i64;
        let nanos = (raw.created_utc.fract() * 1e9) as u32;
        let created_at = Utc.timestamp_opt(secs, nanos).single().ok_or_else(|| {
            ServiceError::Fetch(format!(
                "comment {} has invalid created_utc {}",
                raw.name, raw.created_utc
            ))
        })?;

        Ok(Comment::new(raw.name, raw.body, created_at))
    }
}

#[derive(Deserialize)]
pub struct ApiResponse {
    pub json: Option<ApiErrors>,
}

#[derive(Deserialize)]
pub struct ApiErrors {
    #[serde(default)]
    pub errors: Vec<Value>,
}
