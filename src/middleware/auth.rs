use crate::config::AuthConfig;
use crate::db::models::user::User;
use crate::error::AppError;
use crate::services::context::RequestContext;
use crate::services::users_service::UsersService;
use crate::AppState;
use axum::{
    TypedHeader, async_trait,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use headers::Authorization;
use headers::authorization::Bearer;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims minted by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: u64,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies HS256 bearer tokens. Issuing tokens is the identity provider's job.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

/// The authenticated caller, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct AuthUserInfo {
    pub user: User,
}

impl AuthUserInfo {
    pub fn context(&self) -> RequestContext {
        RequestContext {
            user_id: self.user.id,
            role: self.user.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUserInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUserInfo>()
            .cloned()
            .ok_or_else(|| AppError::auth("Authentication required"))
    }
}

pub async fn auth_middleware<B>(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::auth("Missing bearer token"))?;

    let claims = state.jwt.verify(bearer.token())?;

    let mut conn = state.db.get()?;
    let user = UsersService::provision(&mut conn, &claims)?;
    drop(conn);

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Rejected request from deactivated user");
        return Err(AppError::auth("Account is deactivated"));
    }

    request.extensions_mut().insert(AuthUserInfo { user });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn token(secret: &str, exp: u64, iss: Option<&str>) -> String {
        let claims = Claims {
            sub: uuid::Uuid::new_v4(),
            email: "resident@example.com".to_string(),
            name: Some("Resident".to_string()),
            exp,
            iat: now(),
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(issuer: Option<&str>) -> JwtVerifier {
        JwtVerifier::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: issuer.map(str::to_string),
        })
    }

    #[test]
    fn accepts_valid_token() {
        let claims = verifier(None)
            .verify(&token("test-secret", now() + 600, None))
            .unwrap();
        assert_eq!(claims.email, "resident@example.com");
    }

    #[test]
    fn rejects_wrong_secret_and_expired() {
        let v = verifier(None);
        assert!(v.verify(&token("other-secret", now() + 600, None)).is_err());
        assert!(v.verify(&token("test-secret", now() - 3600, None)).is_err());
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let v = verifier(Some("city-idp"));
        assert!(v.verify(&token("test-secret", now() + 600, Some("city-idp"))).is_ok());
        assert!(v.verify(&token("test-secret", now() + 600, Some("elsewhere"))).is_err());
    }
}
