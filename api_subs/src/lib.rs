use actix_web::web;

pub mod routes {
    pub mod pay;
    pub mod sub;
}

mod services {
    pub(crate) mod billing;
    pub(crate) mod pay;
    pub(crate) mod plan;
}

mod dtos {
    pub(crate) mod sub;
}

mod models {
    pub(crate) mod plan;
}

/// Public plan listing.
pub fn mount_plans() -> actix_web::Scope {
    web::scope("/sub").service(routes::sub::get_plans)
}

/// Stripe webhook; must stay outside the authenticated scope.
pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_webhook)
}

/// Billing routes of the signed-in user.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sub")
            .service(routes::sub::get_current)
            .service(routes::sub::post_checkout)
            .service(routes::sub::post_portal),
    );
}
