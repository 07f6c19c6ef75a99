use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::time::Duration;

use tipster_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{GnewsClient, PaystackService, SportyBetClient},
    handlers,
    middlewares::{AuthMiddleware, DashboardGate, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to connect to the database");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret);

    // External clients
    let paystack_service = PaystackService::new(config.paystack.clone());
    if !paystack_service.is_configured() {
        log::warn!("Paystack keys are not configured; paid unlocks will fail");
    }
    let sportybet_client = SportyBetClient::new(config.booking.clone());
    let gnews_client = GnewsClient::new(config.news.clone());
    if !gnews_client.api_key_configured() {
        log::warn!("GNEWS_API_KEY is not configured; the news feed is disabled");
    }

    // Services
    let access_service = AccessService::new(
        pool.clone(),
        Duration::from_secs(config.access.role_cache_ttl_secs),
    );
    let profile_service = ProfileService::new(pool.clone())
        .with_bootstrap_admins(&config.access.bootstrap_admin_emails);
    let game_service = GameService::new(pool.clone(), config.lifecycle.retention_days);
    let lifecycle_service = LifecycleService::new(pool.clone(), config.lifecycle.retention_days);
    let purchase_service = PurchaseService::new(pool.clone(), paystack_service);
    let recovery_service = RecoveryService::new(pool.clone());
    let dashboard_service = DashboardService::new(
        pool.clone(),
        purchase_service.clone(),
        profile_service.clone(),
        access_service.clone(),
    );
    let booking_service = BookingService::new(sportybet_client);
    let news_service = NewsService::new(gnews_client);

    tasks::spawn_all(
        lifecycle_service.clone(),
        config.lifecycle.reconcile_interval_secs,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(DashboardGate::new(access_service.clone()))
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::from(pool.clone()))
            .app_data(web::Data::new(access_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(game_service.clone()))
            .app_data(web::Data::new(lifecycle_service.clone()))
            .app_data(web::Data::new(purchase_service.clone()))
            .app_data(web::Data::new(recovery_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(news_service.clone()))
            .configure(swagger_config)
            .configure(handlers::dashboard_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::health_config)
                    .configure(handlers::profile_config)
                    .configure(handlers::games_config)
                    .configure(handlers::purchases_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::booking_config)
                    .configure(handlers::news_config)
                    .configure(handlers::recovery_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
