use actix_web::{HttpResponse, Responder};
use serde::Serialize;

use crate::{error::Res, feature::FeatureResponse};

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
    /// Mutations always answer 200; the UI branches on the envelope flags.
    pub fn feature(envelope: FeatureResponse) -> Res<impl Responder> {
        if !envelope.success {
            log::debug!(
                "Feature request finished without full success: {}",
                envelope.message
            );
        }
        Result::Ok(HttpResponse::Ok().json(envelope))
    }
}
