use std::sync::Arc;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use common::{
    error::{AppError, Res},
    jwt::UserClaims,
};
use futures::future::LocalBoxFuture;

use crate::services::identity::IdentityClient;

/// Authenticated user together with the Google OAuth token to act on their behalf.
#[derive(Debug, Clone)]
pub struct GoogleToken {
    pub user_id: String,
    pub access_token: String,
}

impl GoogleToken {
    async fn resolve(claims: Option<UserClaims>, identity: Option<Arc<IdentityClient>>) -> Res<Self> {
        let claims = claims
            .ok_or_else(|| AppError::Unauthorized("No authorization token provided".to_string()))?;
        let identity = identity
            .ok_or_else(|| AppError::Internal("Identity client not configured".to_string()))?;

        let access_token = identity.google_access_token(claims.user_id()).await?;
        Ok(GoogleToken {
            user_id: claims.sub,
            access_token,
        })
    }
}

impl FromRequest for GoogleToken {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<UserClaims>().cloned();
        let identity = req
            .app_data::<web::Data<IdentityClient>>()
            .map(|data| data.clone().into_inner());
        Box::pin(Self::resolve(claims, identity))
    }
}
