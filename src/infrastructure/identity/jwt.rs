//! Bearer-token identity resolution.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::{ConnectContext, Identity, IdentityError, IdentityResolver};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Resolves HS256 bearer tokens to [`Identity::User`] using the `sub` claim.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
    require_identity: bool,
}

impl JwtIdentityResolver {
    /// With `require_identity`, connections without a token are rejected
    /// instead of being admitted as anonymous.
    pub fn new(secret: &str, require_identity: bool) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            require_identity,
        }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, ctx: &ConnectContext) -> Result<Identity, IdentityError> {
        let Some(token) = ctx.bearer_token.as_deref() else {
            return if self.require_identity {
                Err(IdentityError::Missing)
            } else {
                Ok(Identity::Anonymous)
            };
        };

        let token_data =
            decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::Invalid("Invalid token".into()),
            })?;

        if token_data.claims.sub.is_empty() {
            return Err(IdentityError::Invalid("Invalid token claims".into()));
        }

        Ok(Identity::user(token_data.claims.sub))
    }
}

/// Admits everyone as [`Identity::Anonymous`]. Used when no secret is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousIdentityResolver;

#[async_trait]
impl IdentityResolver for AnonymousIdentityResolver {
    async fn resolve(&self, _ctx: &ConnectContext) -> Result<Identity, IdentityError> {
        Ok(Identity::Anonymous)
    }
}
