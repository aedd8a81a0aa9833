mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use crate::mail::sendmail::Mailer;
use crate::service::{
    approval_service::ApprovalService, fees::FeeCalculator,
    notification_service::NotificationService, payment_provider::StripeGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub approval_service: Arc<ApprovalService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let mailer = Arc::new(Mailer::new(&config).expect("Failed to initialize SMTP mailer"));
        let notification_service = Arc::new(NotificationService::new(mailer));

        let gateway = Arc::new(StripeGateway::new(&config));
        let approval_service = Arc::new(ApprovalService::new(
            db_client_arc.clone(),
            gateway,
            FeeCalculator::new(&config),
            notification_service.clone(),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            approval_service,
            notification_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);

    let allowed_origins = vec![
        config
            .app_url
            .parse::<HeaderValue>()
            .expect("APP_URL must be a valid origin"),
        "http://localhost:5173".parse::<HeaderValue>().unwrap(),
        "http://localhost:8000".parse::<HeaderValue>().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ]);

    let port = config.port;
    let app_state = Arc::new(AppState::new(db_client, config));

    let app = create_router(app_state).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
