//! Access and refresh tokens.
//!
//! Both kinds are HS256 JWTs signed with the same secret. The only thing
//! telling them apart is the `iss` claim, so the validator checks it after
//! signature and expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthError};

pub const ACCESS_ISSUER: &str = "messenger-access";
pub const REFRESH_ISSUER: &str = "messenger-refresh";

const BEARER_PREFIX: &str = "Bearer ";
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// What the validator reads back. `exp` is optional so a token without one
/// decodes and is reported as expired rather than malformed.
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    iss: String,
    sub: String,
    exp: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn issuer(self) -> &'static str {
        match self {
            TokenKind::Access => ACCESS_ISSUER,
            TokenKind::Refresh => REFRESH_ISSUER,
        }
    }

    pub fn lifetime(self) -> Duration {
        match self {
            TokenKind::Access => Duration::hours(1),
            TokenKind::Refresh => Duration::days(60),
        }
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::ConfigurationMissing("JWT_SECRET".into()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue_access_token(&self, user_id: &str) -> Result<String, AppError> {
        self.issue_at(TokenKind::Access, user_id, Utc::now())
    }

    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, AppError> {
        self.issue_at(TokenKind::Refresh, user_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        kind: TokenKind,
        user_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            iss: kind.issuer().to_string(),
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + kind.lifetime()).timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, &claims, &self.encoding_key)?)
    }
}

pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::ConfigurationMissing("JWT_SECRET".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate an `Authorization` header value and return the user id it
    /// was issued for. Only access tokens pass.
    pub fn validate(&self, authorization: &str) -> Result<String, AuthError> {
        if authorization.is_empty() {
            return Err(AuthError::TokenMissing);
        }
        let token = authorization
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::TokenInvalid)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }

        let header = decode_header(token).map_err(|_| AuthError::TokenInvalid)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::UnexpectedSigningMethod);
        }

        let data = decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => AuthError::TokenExpired,
                ErrorKind::InvalidAlgorithm => AuthError::UnexpectedSigningMethod,
                _ => AuthError::TokenInvalid,
            })?;

        if data.claims.exp.is_none() {
            return Err(AuthError::TokenExpired);
        }
        if data.claims.iss == REFRESH_ISSUER {
            return Err(AuthError::WrongTokenKind);
        }

        Ok(data.claims.sub)
    }
}
