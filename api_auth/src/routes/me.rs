use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, jwt::UserClaims};
use db::models::subscription::Subscription;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: String,
    email: Option<String>,
    name: Option<String>,
    subscription: Option<Subscription>,
}

/// Identity of the caller and their subscription, if any.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/me', {
///   headers: { 'Authorization': `Bearer ${await getToken()}` }
/// });
/// // { user_id: "user_2abc", email: "a@b.c", name: null, subscription: { status: "active", ... } }
/// ```
#[get("/me")]
pub(crate) async fn get_me(
    claims: web::ReqData<UserClaims>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let claims = claims.into_inner();
    let pg_pool: &PgPool = &pool;
    let subscription = db::subscription::get_subscription_by_user_id(pg_pool, &claims.sub).await?;

    Success::ok(MeResponse {
        user_id: claims.sub,
        email: claims.email,
        name: claims.name,
        subscription,
    })
}
