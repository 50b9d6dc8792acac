//! Authentication and user payloads

use serde_json::Value;

use super::container;
use crate::error::{AppError, AppResult};
use crate::records::UserProfile;

/// `access_token` of a login or registration answer
pub fn token(payload: &Value) -> AppResult<String> {
    container(payload, "access_token")?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::malformed("`access_token` is not a token"))
}

/// Optional server message of the password endpoints
pub fn notice(payload: &Value) -> Option<String> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `GET user/current_user`
pub fn profile(payload: &Value) -> AppResult<UserProfile> {
    if !payload.is_object() {
        return Err(AppError::malformed("current user is not an object"));
    }
    serde_json::from_value(payload.clone())
        .map_err(|e| AppError::malformed(format!("current user: {e}")))
}
