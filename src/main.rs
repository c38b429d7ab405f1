mod entity;
mod error;
mod handlers;
mod money;
mod notify;
mod prelude;
mod settings;
mod state;
mod sv;

use std::{env, net::SocketAddr};

use axum::{
  Router,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  notify::{HttpMailer, Mailer, Notifier, NullMailer},
  prelude::*,
  state::AppState,
  sv::Carrier,
};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "storefront=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:storefront.db?mode=rwc".into());
  let admin_token = env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN not set");

  let carrier_url = env::var("CARRIER_API_URL")
    .unwrap_or_else(|_| sv::carrier::DEFAULT_API_URL.into());
  let carrier_token = env::var("CARRIER_API_TOKEN").unwrap_or_default();
  if carrier_token.is_empty() {
    warn!("CARRIER_API_TOKEN not set, shipping procurement disabled");
  }
  let carrier = Carrier::new(carrier_url, carrier_token);

  let mailer: Arc<dyn Mailer> = match (
    env::var("MAIL_API_URL"),
    env::var("MAIL_API_TOKEN"),
  ) {
    (Ok(url), Ok(token)) => Arc::new(HttpMailer::new(url, token)),
    _ => {
      warn!("mail provider not configured, notifications disabled");
      Arc::new(NullMailer)
    }
  };
  let notifier = Notifier::spawn(mailer);

  info!("Starting Storefront v{}", env!("CARGO_PKG_VERSION"));

  let app_state = Arc::new(
    AppState::new(&db_url, carrier, notifier, admin_token)
      .await
      .expect("Failed to initialize app state"),
  );

  let governor_conf = Arc::new(
    GovernorConfigBuilder::default()
      .per_second(2)
      .burst_size(100)
      .finish()
      .expect("Failed to build rate limiter config"),
  );

  let governor_limiter = governor_conf.limiter().clone();
  tokio::spawn(async move {
    loop {
      tokio::time::sleep(Duration::from_secs(60)).await;
      governor_limiter.retain_recent();
    }
  });

  let app = Router::new()
    .route("/api/discount/validate", post(handlers::validate_discount))
    .route("/api/checkout", post(handlers::checkout))
    .route(
      "/api/orders/{id}/submit-payment",
      post(handlers::submit_payment),
    )
    .route(
      "/api/orders/{id}/confirm-payment",
      post(handlers::confirm_payment),
    )
    .route("/api/orders/{id}/cancel", post(handlers::cancel_order))
    .route("/api/orders/{id}/complete", post(handlers::complete_order))
    .route("/api/orders/{id}/status", post(handlers::override_status))
    .route("/api/orders/{id}", get(handlers::get_order))
    .route(
      "/api/orders/{id}/commissions",
      get(handlers::order_commissions),
    )
    .route("/api/orders/{id}/rates", get(handlers::shipping_rates))
    .route(
      "/api/orders/{id}/label",
      post(handlers::purchase_label).get(handlers::current_label),
    )
    .route("/api/affiliates/apply", post(handlers::apply_affiliate))
    .route(
      "/api/affiliates/{id}/status",
      post(handlers::set_affiliate_status),
    )
    .route("/api/affiliates/{id}/rate", post(handlers::set_affiliate_rate))
    .route(
      "/api/affiliates/{id}/parent",
      post(handlers::set_affiliate_parent),
    )
    .route(
      "/api/commissions/{id}/approve",
      post(handlers::approve_commission),
    )
    .route("/api/commissions/{id}/pay", post(handlers::pay_commission))
    .route(
      "/api/commissions/{id}/cancel",
      post(handlers::cancel_commission),
    )
    .route("/health", get(handlers::health))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app_state);

  let port: u16 =
    env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  info!("HTTP server listening on {}", addr);

  let listener =
    tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
  axum::serve(listener, app).await.expect("Server error");
}
