//! Tokens signed the way the auth service signs them: HS256 over `{ userId, iat, exp }`.

use super::constants::JWT_SECRET;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_secs() as i64
}

fn sign(secret: &str, user_id: i64, exp: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "userId": user_id, "iat": now_secs(), "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// A valid token for `user_id`, good for an hour
pub fn token_for(user_id: i64) -> String {
    sign(JWT_SECRET, user_id, now_secs() + 3600)
}

#[allow(dead_code)]
pub fn expired_token(user_id: i64) -> String {
    sign(JWT_SECRET, user_id, now_secs() - 3600)
}

/// Correctly shaped but signed with the wrong secret
#[allow(dead_code)]
pub fn forged_token(user_id: i64) -> String {
    sign("not-the-secret", user_id, now_secs() + 3600)
}
