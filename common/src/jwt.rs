use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    env_config::IdentityConfig,
    error::{AppError, Res},
};

/// Claims of a session token issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    /// Identity provider user id.
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserClaims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

/// Verifies a session token and extracts its claims.
/// RS256 is used when a public key is configured, HS256 with the shared secret otherwise.
pub fn validate_jwt(token: &str, config: &IdentityConfig) -> Res<UserClaims> {
    let (key, mut validation) = match (&config.jwt_public_key, &config.jwt_secret) {
        (Some(pem), _) => (
            DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AppError::Internal(format!("Invalid identity public key: {}", e)))?,
            Validation::new(Algorithm::RS256),
        ),
        (None, Some(secret)) => (
            DecodingKey::from_secret(secret.as_bytes()),
            Validation::new(Algorithm::HS256),
        ),
        (None, None) => {
            return Err(AppError::Internal(
                "No identity token verification key configured".to_string(),
            ));
        }
    };

    if let Some(issuer) = &config.jwt_issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)
        .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;
    Ok(token_data.claims)
}

pub fn get_claims_or_error(req: &ServiceRequest) -> Result<UserClaims, HttpResponse> {
    if let Some(claims_res) = req.extensions().get::<Res<UserClaims>>() {
        match claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(
            AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response(),
        )
    }
}
