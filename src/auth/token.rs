use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use super::principal::Role;

/// Reasons a token is refused. All of them reach the client as the same 401;
/// the specific variant only goes to the logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token signature or algorithm is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is malformed: {0}")]
    MalformedToken(String),

    #[error("token carries no usable user identifier")]
    MissingIdentifier,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Wire claims. `userID` is the primary identifier, `sub` the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn new(user_id: Uuid, email: &str, role: Role, expiry_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let lifetime = i64::try_from(expiry_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .ok_or_else(|| AuthError::Signing(format!("token lifetime of {} hours is out of range", expiry_hours)))?;
        let exp = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AuthError::Signing(format!("token lifetime of {} hours is out of range", expiry_hours)))?
            .timestamp();
        let id = user_id.to_string();

        Ok(Self {
            user_id: Some(id.clone()),
            sub: Some(id),
            email: Some(email.to_string()),
            role: Some(role.as_str().to_string()),
            exp,
            iat: Some(now.timestamp()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedClaims {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub expires_at: i64,
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verifies signature, algorithm and expiry, then extracts the identity claims.
pub fn verify_token(token: &str, secret: &str) -> Result<VerifiedClaims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
        _ => AuthError::MalformedToken(e.to_string()),
    })?;
    let claims = data.claims;

    let raw_id = claims
        .user_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| claims.sub.as_deref().filter(|id| !id.trim().is_empty()))
        .ok_or(AuthError::MissingIdentifier)?;
    let user_id = Uuid::parse_str(raw_id.trim()).map_err(|_| AuthError::MissingIdentifier)?;

    let role = claims
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    Ok(VerifiedClaims {
        user_id,
        email: claims.email,
        role,
        expires_at: claims.exp,
    })
}

/// Short, non-reversible token identifier for log lines.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims_for(id: Uuid) -> Claims {
        Claims::new(id, "client@example.com", Role::Client, 1).unwrap()
    }

    #[test]
    fn absurd_lifetime_is_a_signing_error() {
        let id = Uuid::new_v4();
        for hours in [u64::MAX, 10_000_000_000_000] {
            assert!(matches!(
                Claims::new(id, "a@b.co", Role::Client, hours),
                Err(AuthError::Signing(_))
            ));
        }
        let claims = Claims::new(id, "a@b.co", Role::Client, 8760).unwrap();
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn issued_token_verifies() {
        let id = Uuid::new_v4();
        let token = issue_token(&claims_for(id), SECRET).unwrap();

        let verified = verify_token(&token, SECRET).unwrap();
        assert_eq!(verified.user_id, id);
        assert_eq!(verified.email.as_deref(), Some("client@example.com"));
        assert_eq!(verified.role, Some(Role::Client));
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = issue_token(&claims_for(Uuid::new_v4()), SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "another-secret"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn other_hmac_algorithm_is_rejected() {
        let claims = claims_for(Uuid::new_v4());
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(verify_token(&token, SECRET), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = claims_for(Uuid::new_v4());
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issue_token(&claims, SECRET).unwrap();

        assert!(matches!(verify_token(&token, SECRET), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn sub_is_used_when_user_id_is_absent() {
        let id = Uuid::new_v4();
        let mut claims = claims_for(id);
        claims.user_id = None;
        let token = issue_token(&claims, SECRET).unwrap();

        assert_eq!(verify_token(&token, SECRET).unwrap().user_id, id);
    }

    #[test]
    fn missing_or_non_uuid_identifier_is_rejected() {
        let mut claims = claims_for(Uuid::new_v4());
        claims.user_id = None;
        claims.sub = None;
        let token = issue_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(AuthError::MissingIdentifier)));

        claims.user_id = Some("42".to_string());
        let token = issue_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(AuthError::MissingIdentifier)));
    }

    #[test]
    fn wrongly_shaped_claim_is_malformed() {
        let payload = serde_json::json!({
            "userID": 12345,
            "exp": Utc::now().timestamp() + 600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(verify_token(&token, SECRET), Err(AuthError::MalformedToken(_))));
        assert!(matches!(verify_token("not.a.jwt", SECRET), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 12);
    }
}
