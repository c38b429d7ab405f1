use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    AffiliateStatus, OrderStatus, PaymentMethod, affiliate, order, payment,
    shipping_label,
  },
  prelude::*,
  settings::Settings,
  state::AppState,
  sv::{
    Affiliates, Checkout, Commissions, Discount, Orders, Shipping,
    carrier::RateQuote,
    checkout::{CartLine, ShipTo},
    discount::AttributionCookie,
  },
};

pub struct ApiError {
  status: StatusCode,
  msg: String,
}

impl From<Error> for ApiError {
  fn from(err: Error) -> Self {
    let status = if err.is_validation() {
      StatusCode::BAD_REQUEST
    } else if err.is_conflict() {
      StatusCode::CONFLICT
    } else if matches!(err, Error::Provider(_)) {
      StatusCode::BAD_GATEWAY
    } else {
      error!("internal error: {err}");
      StatusCode::INTERNAL_SERVER_ERROR
    };
    Self { status, msg: err.to_string() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = Json(json::json!({
      "success": false,
      "msg": self.msg,
    }));
    (self.status, body).into_response()
  }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn require_admin(
  state: &AppState,
  headers: &HeaderMap,
) -> Result<(), ApiError> {
  let token =
    headers.get("x-admin-token").and_then(|value| value.to_str().ok());
  if token != Some(state.admin_token.as_str()) {
    return Err(ApiError {
      status: StatusCode::UNAUTHORIZED,
      msg: "admin token required".into(),
    });
  }
  Ok(())
}

pub async fn health() -> &'static str {
  "ok"
}

#[derive(Deserialize)]
pub struct ValidateDiscountReq {
  pub code: String,
  pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct DiscountPreview {
  pub label: String,
  pub amount_cents: i64,
}

/// Price preview for a code the customer typed at checkout.
pub async fn validate_discount(
  State(state): State<Arc<AppState>>,
  Json(req): Json<ValidateDiscountReq>,
) -> ApiResult<DiscountPreview> {
  let settings = Settings::load(&state.db).await?;
  let applied = Discount::new(&state.db)
    .validate(&req.code, req.subtotal_cents, &settings)
    .await?;

  Ok(Json(DiscountPreview {
    label: applied.label.clone(),
    amount_cents: applied.amount_cents(req.subtotal_cents),
  }))
}

#[derive(Deserialize)]
pub struct CheckoutLineReq {
  pub product_id: i32,
  pub variant_id: Option<i32>,
  pub quantity: i32,
}

#[derive(Deserialize)]
pub struct ShipToReq {
  pub name: String,
  pub street1: String,
  pub street2: Option<String>,
  pub city: String,
  pub state: String,
  pub zip: String,
  pub country: String,
  pub email: String,
}

#[derive(Deserialize)]
pub struct CheckoutReq {
  pub user_id: i64,
  pub items: Vec<CheckoutLineReq>,
  pub ship_to: ShipToReq,
  pub payment_method: PaymentMethod,
  pub discount_code: Option<String>,
  /// Referral attribution cookie forwarded by the storefront frontend.
  pub referral_cookie: Option<ReferralCookieReq>,
}

#[derive(Deserialize)]
pub struct ReferralCookieReq {
  pub code: String,
  pub set_at: DateTime,
}

pub async fn checkout(
  State(state): State<Arc<AppState>>,
  Json(req): Json<CheckoutReq>,
) -> ApiResult<order::Model> {
  let settings = Settings::load(&state.db).await?;

  let cart: Vec<CartLine> = req
    .items
    .iter()
    .map(|line| CartLine {
      product_id: line.product_id,
      variant_id: line.variant_id,
      quantity: line.quantity,
    })
    .collect();
  let ship_to = ShipTo {
    name: req.ship_to.name,
    street1: req.ship_to.street1,
    street2: req.ship_to.street2,
    city: req.ship_to.city,
    state: req.ship_to.state,
    zip: req.ship_to.zip,
    country: req.ship_to.country,
    email: req.ship_to.email,
  };
  let cookie = req.referral_cookie.map(|c| AttributionCookie {
    code: c.code,
    set_at: c.set_at,
  });

  let order = Checkout::new(&state.db)
    .create_order(
      req.user_id,
      &cart,
      ship_to,
      req.payment_method,
      req.discount_code.as_deref(),
      cookie.as_ref(),
      &settings,
      &state.notifier,
    )
    .await?;

  Ok(Json(order))
}

pub async fn get_order(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
) -> ApiResult<order::Model> {
  let order = Orders::new(&state.db).by_id(order_id).await?;
  Ok(Json(order))
}

pub async fn order_commissions(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<Vec<crate::entity::commission::Model>> {
  require_admin(&state, &headers)?;
  let rows = Commissions::new(&state.db).for_order(order_id).await?;
  Ok(Json(rows))
}

pub async fn current_label(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<Option<shipping_label::Model>> {
  require_admin(&state, &headers)?;
  let label = Shipping::new(&state.db).current_label(order_id).await?;
  Ok(Json(label))
}

#[derive(Deserialize, Default)]
pub struct PaymentRefReq {
  pub transaction_ref: Option<String>,
}

pub async fn submit_payment(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  Json(req): Json<PaymentRefReq>,
) -> ApiResult<payment::Model> {
  let pay =
    Orders::new(&state.db).submit_payment(order_id, req.transaction_ref).await?;
  Ok(Json(pay))
}

pub async fn confirm_payment(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<PaymentRefReq>,
) -> ApiResult<order::Model> {
  require_admin(&state, &headers)?;
  let settings = Settings::load(&state.db).await?;

  let order = Orders::new(&state.db)
    .confirm_payment(
      order_id,
      req.transaction_ref,
      &settings,
      &state.notifier,
    )
    .await?;
  Ok(Json(order))
}

pub async fn cancel_order(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<order::Model> {
  require_admin(&state, &headers)?;
  let order = Orders::new(&state.db).cancel(order_id, &state.notifier).await?;
  Ok(Json(order))
}

pub async fn complete_order(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<order::Model> {
  require_admin(&state, &headers)?;
  let order = Orders::new(&state.db).mark_complete(order_id).await?;
  Ok(Json(order))
}

#[derive(Deserialize)]
pub struct OverrideStatusReq {
  pub status: OrderStatus,
}

pub async fn override_status(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<OverrideStatusReq>,
) -> ApiResult<order::Model> {
  require_admin(&state, &headers)?;
  let settings = Settings::load(&state.db).await?;

  let order = Orders::new(&state.db)
    .override_status(order_id, req.status, &settings, &state.notifier)
    .await?;
  Ok(Json(order))
}

#[derive(Deserialize)]
pub struct RatesQuery {
  pub weight_oz: f64,
}

pub async fn shipping_rates(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
  Query(query): Query<RatesQuery>,
) -> ApiResult<Vec<RateQuote>> {
  require_admin(&state, &headers)?;
  let settings = Settings::load(&state.db).await?;

  let rates = Shipping::new(&state.db)
    .get_rates(order_id, query.weight_oz, &state.carrier, &settings)
    .await?;
  Ok(Json(rates))
}

#[derive(Deserialize)]
pub struct PurchaseLabelReq {
  pub rate_id: String,
}

pub async fn purchase_label(
  State(state): State<Arc<AppState>>,
  Path(order_id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<PurchaseLabelReq>,
) -> ApiResult<shipping_label::Model> {
  require_admin(&state, &headers)?;
  let label = Shipping::new(&state.db)
    .purchase_label(order_id, &req.rate_id, &state.carrier, &state.notifier)
    .await?;
  Ok(Json(label))
}

#[derive(Deserialize)]
pub struct AffiliateApplyReq {
  pub user_id: i64,
}

pub async fn apply_affiliate(
  State(state): State<Arc<AppState>>,
  Json(req): Json<AffiliateApplyReq>,
) -> ApiResult<affiliate::Model> {
  let row = Affiliates::new(&state.db).apply(req.user_id).await?;
  Ok(Json(row))
}

#[derive(Deserialize)]
pub struct AffiliateStatusReq {
  pub status: AffiliateStatus,
}

pub async fn set_affiliate_status(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<AffiliateStatusReq>,
) -> ApiResult<affiliate::Model> {
  require_admin(&state, &headers)?;
  let row = Affiliates::new(&state.db).set_status(id, req.status).await?;
  Ok(Json(row))
}

#[derive(Deserialize)]
pub struct AffiliateRateReq {
  pub rate: Option<f64>,
}

pub async fn set_affiliate_rate(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<AffiliateRateReq>,
) -> ApiResult<affiliate::Model> {
  require_admin(&state, &headers)?;
  let row = Affiliates::new(&state.db).set_rate(id, req.rate).await?;
  Ok(Json(row))
}

#[derive(Deserialize)]
pub struct AffiliateParentReq {
  pub parent_id: Option<i32>,
}

pub async fn set_affiliate_parent(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
  Json(req): Json<AffiliateParentReq>,
) -> ApiResult<affiliate::Model> {
  require_admin(&state, &headers)?;
  let row = Affiliates::new(&state.db).set_parent(id, req.parent_id).await?;
  Ok(Json(row))
}

pub async fn approve_commission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<crate::entity::commission::Model> {
  require_admin(&state, &headers)?;
  let row = Commissions::new(&state.db).approve(id).await?;
  Ok(Json(row))
}

pub async fn pay_commission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<crate::entity::commission::Model> {
  require_admin(&state, &headers)?;
  let row = Commissions::new(&state.db).mark_paid(id).await?;
  Ok(Json(row))
}

pub async fn cancel_commission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i32>,
  headers: HeaderMap,
) -> ApiResult<crate::entity::commission::Model> {
  require_admin(&state, &headers)?;
  let row = Commissions::new(&state.db).cancel(id).await?;
  Ok(Json(row))
}
