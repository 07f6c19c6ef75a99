use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // browser clients are served from several hosts
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        // session cookie from the hosted auth client
        .supports_credentials()
        .max_age(3600)
}
