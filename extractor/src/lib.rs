use middleware::extractor::ExtractionMiddleware;

pub mod middleware {
    pub mod extractor;
}

/// Validates the bearer session token of every request and stores the
/// outcome as `Res<UserClaims>` in the request extensions.
pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
