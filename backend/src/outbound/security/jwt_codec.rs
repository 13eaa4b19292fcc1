//! HS256 JSON Web Token implementation of the `TokenCodec` port.
//!
//! Tokens carry `{sub, iat, exp}` where `sub` is the decimal user id.
//! Expiry is checked by `jsonwebtoken` against the system clock.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::domain::ports::{AccessToken, TokenCodec, TokenCodecError};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenCodec {
    /// Codec signing with `secret`; issued tokens live for `lifetime`.
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self::with_clock(secret, lifetime, Arc::new(DefaultClock))
    }

    /// As [`JwtTokenCodec::new`], stamping `iat` from `clock`.
    pub fn with_clock(secret: &[u8], lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
            clock,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user_id: UserId) -> Result<AccessToken, TokenCodecError> {
        let issued_at = self.clock.utc().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenCodecError::signing(err.to_string()))?;
        Ok(AccessToken {
            value,
            expires_in: self.lifetime,
        })
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenCodecError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| TokenCodecError::invalid(err.to_string()))?;
        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|err| TokenCodecError::invalid(err.to_string()))
    }
}
