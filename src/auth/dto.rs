use crate::auth::repo::User;
use crate::auth::role::Role;
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Token type used to distinguish Access and Refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// Session principal carried in the JWT: identity, names and role of the
/// authenticated user, plus the standard time/issuer claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Optional profile fields shared by both account-creation paths.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Request body for self-service signup. There is deliberately no role
/// field; whatever extra keys the caller sends are dropped and the account
/// is stored as RETAIL_CUSTOMER.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileInput,
}

/// Request body for admin-initiated account creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileInput,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// The user as returned to clients: everything except the password hash
/// and the reset-token pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
            phone: user.phone,
            address: user.address,
            city: user.city,
            state: user.state,
            zip_code: user.zip_code,
            country: user.country,
            created_at: user.created_at,
        }
    }
}

/// Response returned after account creation.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
    /// Landing route for the authenticated role.
    pub redirect_to: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Present only when EXPOSE_RESET_TOKEN is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "customer@winjhenshop.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            first_name: "Bob".into(),
            last_name: "Customer".into(),
            role: Role::RetailCustomer,
            is_active: true,
            email_verified: false,
            phone: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            country: None,
            reset_token: Some("deadbeef".into()),
            reset_token_expires: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_user_never_carries_hash_or_reset_fields() {
        let json = serde_json::to_string(&PublicUser::from(sample_user())).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("resetToken"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("\"firstName\":\"Bob\""));
        assert!(json.contains("\"role\":\"RETAIL_CUSTOMER\""));
    }

    #[test]
    fn signup_request_drops_any_role_field() {
        let payload = r#"{
            "email": "eve@example.com",
            "password": "hunter2hunter2",
            "firstName": "Eve",
            "lastName": "Attacker",
            "role": "ADMIN",
            "zipCode": "12345"
        }"#;
        let req: SignupRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(req.email.as_deref(), Some("eve@example.com"));
        assert_eq!(req.profile.zip_code.as_deref(), Some("12345"));
        // No role field exists on the type to smuggle a privilege through.
    }

    #[test]
    fn forgot_password_response_omits_absent_token() {
        let json = serde_json::to_string(&ForgotPasswordResponse {
            message: "ok".into(),
            reset_token: None,
        })
        .unwrap();
        assert!(!json.contains("resetToken"));

        let json = serde_json::to_string(&ForgotPasswordResponse {
            message: "ok".into(),
            reset_token: Some("ab".repeat(32)),
        })
        .unwrap();
        assert!(json.contains("resetToken"));
    }
}
