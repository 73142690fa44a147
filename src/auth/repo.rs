use crate::auth::role::Role;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
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
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a new account.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub zip_code: Option<&'a str>,
    pub country: Option<&'a str>,
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, is_active, \
     email_verified, phone, address, city, state, zip_code, country, \
     reset_token, reset_token_expires, created_at";

impl User {
    /// Find a user by exact email match.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Any one record holding the given role, if one exists.
    pub async fn find_first_by_role(db: &PgPool, role: Role) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users \
                 (email, password_hash, first_name, last_name, role, is_active, \
                  email_verified, phone, address, city, state, zip_code, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.first_name)
            .bind(new.last_name)
            .bind(new.role)
            .bind(new.is_active)
            .bind(new.email_verified)
            .bind(new.phone)
            .bind(new.address)
            .bind(new.city)
            .bind(new.state)
            .bind(new.zip_code)
            .bind(new.country)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    /// Attach a reset token and its expiry to the record. A newer token
    /// overwrites any outstanding one; only the latest is redeemable.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_token_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Swap in a new password hash and consume the reset token.
    ///
    /// The write is one conditional UPDATE keyed on the token with a
    /// strictly-future expiry, so a token can never be redeemed twice and
    /// no observer sees the new hash with the token still set. Returns
    /// None when the token is unknown or expired.
    pub async fn redeem_reset_token(
        db: &PgPool,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users \
             SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL \
             WHERE reset_token = $1 AND reset_token_expires > $3 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(password_hash)
            .bind(now)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }
}
