use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::User;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<i32>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update. Only these four fields may be changed; the handler rejects
/// the whole request when the body carries any other key.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            age: u.age,
            created_at: u.created_at,
        }
    }
}

/// Response returned after register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_request_accepts_partial_bodies() {
        let req: UpdateUserRequest =
            serde_json::from_value(json!({ "name": "Ana", "age": 30 })).expect("valid body");
        assert_eq!(req.name.as_deref(), Some("Ana"));
        assert_eq!(req.age, Some(30));
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }

    #[test]
    fn update_request_rejects_unknown_fields() {
        let err = serde_json::from_value::<UpdateUserRequest>(
            json!({ "name": "Ana", "height": 180 }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn user_response_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "argon2-secret".into(),
            age: 30,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(json.contains("ana@example.com"));
        assert!(!json.contains("argon2-secret"));
    }
}
