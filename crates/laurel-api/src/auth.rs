//! Password hashing and JWT bearer authentication.
//!
//! Passwords are stored as argon2 PHC strings. Tokens are HS256 with the
//! user UUID in `sub`; expiry is enforced by [`jsonwebtoken`]'s default
//! validation.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{
  DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use laurel_core::{store::TaskStore, user::User};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, store_err},
};

/// Token-signing configuration shared by all handlers.
#[derive(Clone)]
pub struct AuthConfig {
  pub jwt_secret:        String,
  pub token_ttl_minutes: i64,
}

/// JWT payload: the user UUID plus standard time claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub iat: i64,
  pub exp: i64,
}

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Verify a plaintext password against a PHC string. Malformed hashes
/// verify as false rather than erroring — the caller only needs a yes/no.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| {
      Argon2::default().verify_password(password.as_bytes(), &parsed)
    })
    .is_ok()
}

/// Issue a bearer token for `user_id`.
pub fn issue_token(
  user_id: Uuid,
  config: &AuthConfig,
) -> Result<String, ApiError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user_id,
    iat: now.timestamp(),
    exp: (now + Duration::minutes(config.token_ttl_minutes)).timestamp(),
  };
  encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )
  .map_err(|e| ApiError::Internal(format!("token encoding error: {e}")))
}

/// Decode and validate a bearer token, returning the user UUID.
pub fn decode_token(
  token: &str,
  config: &AuthConfig,
) -> Result<Uuid, ApiError> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
    &Validation::default(),
  )
  .map(|data| data.claims.sub)
  .map_err(|_| ApiError::Unauthorized)
}

/// Extractor: the authenticated user, loaded fresh from the store on every
/// request.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: TaskStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized)?;

    let user_id = decode_token(token, &state.auth)?;

    let user = state
      .store
      .get_user(user_id)
      .await
      .map_err(store_err)?
      // A valid token for a deleted user is still not a user.
      .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentUser(user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> AuthConfig {
    AuthConfig {
      jwt_secret:        "test-secret".to_owned(),
      token_ttl_minutes: 30,
    }
  }

  #[test]
  fn password_hash_round_trip() {
    let phc = hash_password("hunter22").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("hunter22", &phc));
    assert!(!verify_password("hunter23", &phc));
  }

  #[test]
  fn malformed_phc_verifies_as_false() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn token_round_trip() {
    let config = config();
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, &config).unwrap();
    assert_eq!(decode_token(&token, &config).unwrap(), user_id);
  }

  #[test]
  fn token_with_wrong_secret_is_rejected() {
    let token = issue_token(Uuid::new_v4(), &config()).unwrap();
    let other = AuthConfig {
      jwt_secret:        "different-secret".to_owned(),
      token_ttl_minutes: 30,
    };
    assert!(matches!(
      decode_token(&token, &other),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn expired_token_is_rejected() {
    let config = AuthConfig {
      jwt_secret:        "test-secret".to_owned(),
      token_ttl_minutes: -120,
    };
    let token = issue_token(Uuid::new_v4(), &config).unwrap();
    assert!(matches!(
      decode_token(&token, &config),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn garbage_token_is_rejected() {
    assert!(matches!(
      decode_token("definitely.not.ajwt", &config()),
      Err(ApiError::Unauthorized)
    ));
  }
}
