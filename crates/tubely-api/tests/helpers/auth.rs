use chrono::Duration;
use tubely_api::auth::JwtService;
use uuid::Uuid;

/// `Authorization` header value for `user_id`, valid for an hour.
pub fn bearer(jwt: &JwtService, user_id: Uuid) -> String {
    let token = jwt
        .issue_token(user_id, Duration::hours(1))
        .expect("Failed to issue token");
    format!("Bearer {}", token)
}
