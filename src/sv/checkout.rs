use uuid::Uuid;

use crate::{
  entity::{
    PaymentMethod, PaymentStatus, coupon, order, order_item, payment, product,
    variant,
  },
  money,
  notify::Notifier,
  prelude::*,
  settings::Settings,
  sv::discount::{Applied, AttributionCookie, Discount},
};

pub struct Checkout<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct CartLine {
  pub product_id: i32,
  pub variant_id: Option<i32>,
  pub quantity: i32,
}

/// Structured ship-to snapshot captured onto the order.
#[derive(Debug, Clone)]
pub struct ShipTo {
  pub name: String,
  pub street1: String,
  pub street2: Option<String>,
  pub city: String,
  pub state: String,
  pub zip: String,
  pub country: String,
  pub email: String,
}

struct PricedLine {
  product_id: i32,
  variant_id: Option<i32>,
  name: String,
  sku: String,
  unit_price_cents: i64,
  quantity: i32,
  line_total_cents: i64,
}

impl<'a> Checkout<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Turns a cart into a persisted order aggregate: header, line-item
  /// snapshot and PENDING payment, all in one transaction together with the
  /// stock decrement and coupon counter. Either the whole order persists or
  /// none of it does.
  #[allow(clippy::too_many_arguments)]
  pub async fn create_order(
    &self,
    user_id: i64,
    cart: &[CartLine],
    ship_to: ShipTo,
    method: PaymentMethod,
    discount_code: Option<&str>,
    cookie: Option<&AttributionCookie>,
    settings: &Settings,
    notifier: &Notifier,
  ) -> Result<order::Model> {
    if cart.is_empty() {
      return Err(Error::EmptyCart);
    }

    let lines = self.price_lines(cart).await?;
    let subtotal_cents: i64 = lines.iter().map(|l| l.line_total_cents).sum();

    let applied =
      self.resolve_attribution(discount_code, cookie, subtotal_cents, settings)
        .await?;

    let discount_cents =
      applied.as_ref().map_or(0, |a| a.amount_cents(subtotal_cents));
    let tax_cents =
      money::percent_of(subtotal_cents - discount_cents, settings.tax_rate);
    let shipping_cents = settings.flat_shipping_cents;
    let total_cents =
      subtotal_cents - discount_cents + tax_cents + shipping_cents;

    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    for line in &lines {
      self.take_stock(&txn, line).await?;
    }

    if let Some(code) = applied.as_ref().and_then(|a| a.coupon_code.as_deref())
    {
      self.redeem_coupon(&txn, code).await?;
    }

    let order = order::ActiveModel {
      order_number: Set(Self::order_number(now)),
      user_id: Set(user_id),
      status: Set(order::OrderStatus::AwaitingPayment),
      subtotal_cents: Set(subtotal_cents),
      discount_cents: Set(discount_cents),
      coupon_code: Set(
        applied.as_ref().and_then(|a| a.coupon_code.clone()),
      ),
      tax_cents: Set(tax_cents),
      shipping_cents: Set(shipping_cents),
      total_cents: Set(total_cents),
      ship_name: Set(ship_to.name),
      ship_street1: Set(ship_to.street1),
      ship_street2: Set(ship_to.street2),
      ship_city: Set(ship_to.city),
      ship_state: Set(ship_to.state),
      ship_zip: Set(ship_to.zip),
      ship_country: Set(ship_to.country),
      email: Set(ship_to.email),
      affiliate_id: Set(applied.as_ref().and_then(|a| a.affiliate_id)),
      created_at: Set(now),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    for line in lines {
      order_item::ActiveModel {
        order_id: Set(order.id),
        product_id: Set(line.product_id),
        variant_id: Set(line.variant_id),
        name: Set(line.name),
        sku: Set(line.sku),
        unit_price_cents: Set(line.unit_price_cents),
        quantity: Set(line.quantity),
        line_total_cents: Set(line.line_total_cents),
        ..Default::default()
      }
      .insert(&txn)
      .await?;
    }

    payment::ActiveModel {
      order_id: Set(order.id),
      method: Set(method),
      status: Set(PaymentStatus::Pending),
      transaction_ref: Set(None),
      confirmed_at: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
      "order {} created: subtotal {} total {}",
      order.order_number,
      money::fmt_usd(subtotal_cents),
      money::fmt_usd(total_cents)
    );
    notifier.order_placed(&order);

    Ok(order)
  }

  /// Explicit code wins; otherwise an unexpired attribution cookie applies.
  /// A cookie that fails validation is dropped silently since the customer
  /// never typed it.
  async fn resolve_attribution(
    &self,
    discount_code: Option<&str>,
    cookie: Option<&AttributionCookie>,
    subtotal_cents: i64,
    settings: &Settings,
  ) -> Result<Option<Applied>> {
    if let Some(code) = discount_code {
      let applied =
        Discount::new(self.db).validate(code, subtotal_cents, settings).await?;
      return Ok(Some(applied));
    }

    let Some(cookie) = cookie else { return Ok(None) };
    let now = Utc::now().naive_utc();
    if !cookie.is_fresh(now, settings.affiliate_cookie_days) {
      return Ok(None);
    }

    match Discount::new(self.db)
      .validate(&cookie.code, subtotal_cents, settings)
      .await
    {
      Ok(applied) => Ok(Some(applied)),
      Err(err) if err.is_validation() => {
        debug!("attribution cookie {} rejected: {err}", cookie.code);
        Ok(None)
      }
      Err(err) => Err(err),
    }
  }

  async fn price_lines(&self, cart: &[CartLine]) -> Result<Vec<PricedLine>> {
    let mut lines = Vec::with_capacity(cart.len());

    for item in cart {
      if item.quantity <= 0 {
        return Err(Error::InvalidArgs("quantity must be positive".into()));
      }

      let product = product::Entity::find_by_id(item.product_id)
        .one(self.db)
        .await?
        .ok_or(Error::ProductNotFound)?;
      if !product.is_active {
        return Err(Error::ProductNotFound);
      }

      let (name, sku, unit_price_cents, variant_id) =
        if let Some(variant_id) = item.variant_id {
          let variant = variant::Entity::find_by_id(variant_id)
            .one(self.db)
            .await?
            .filter(|v| v.product_id == product.id)
            .ok_or(Error::ProductNotFound)?;
          (
            format!("{} ({})", product.name, variant.name),
            variant.sku,
            variant.price_cents.unwrap_or(product.price_cents),
            Some(variant.id),
          )
        } else {
          (product.name.clone(), product.sku.clone(), product.price_cents, None)
        };

      lines.push(PricedLine {
        product_id: product.id,
        variant_id,
        name,
        sku,
        unit_price_cents,
        quantity: item.quantity,
        line_total_cents: unit_price_cents * i64::from(item.quantity),
      });
    }

    Ok(lines)
  }

  /// Conditional decrement: only succeeds while live stock covers the
  /// requested quantity, so concurrent checkouts of a low-stock item cannot
  /// both commit.
  async fn take_stock<C: ConnectionTrait>(
    &self,
    txn: &C,
    line: &PricedLine,
  ) -> Result<()> {
    let qty = line.quantity;

    let rows = if let Some(variant_id) = line.variant_id {
      variant::Entity::update_many()
        .col_expr(
          variant::Column::Stock,
          Expr::col(variant::Column::Stock).sub(qty),
        )
        .filter(variant::Column::Id.eq(variant_id))
        .filter(variant::Column::Stock.gte(qty))
        .exec(txn)
        .await?
        .rows_affected
    } else {
      product::Entity::update_many()
        .col_expr(
          product::Column::Stock,
          Expr::col(product::Column::Stock).sub(qty),
        )
        .filter(product::Column::Id.eq(line.product_id))
        .filter(product::Column::Stock.gte(qty))
        .exec(txn)
        .await?
        .rows_affected
    };

    if rows == 0 {
      return Err(Error::OutOfStock(line.sku.clone()));
    }
    Ok(())
  }

  /// Counter increment guarded against the redemption cap, under the same
  /// transaction as the stock decrement. A burst of concurrent redemptions
  /// of a limited-use code cannot oversell it.
  async fn redeem_coupon<C: ConnectionTrait>(
    &self,
    txn: &C,
    code: &str,
  ) -> Result<()> {
    let rows = coupon::Entity::update_many()
      .col_expr(
        coupon::Column::TimesUsed,
        Expr::col(coupon::Column::TimesUsed).add(1),
      )
      .filter(coupon::Column::Code.eq(code))
      .filter(
        Condition::any()
          .add(coupon::Column::MaxUses.is_null())
          .add(
            Expr::col(coupon::Column::TimesUsed)
              .lt(Expr::col(coupon::Column::MaxUses)),
          ),
      )
      .exec(txn)
      .await?
      .rows_affected;

    if rows == 0 {
      return Err(Error::UsageLimitReached);
    }
    Ok(())
  }

  fn order_number(now: DateTime) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
      "SF-{}-{}",
      now.format("%Y%m%d"),
      suffix[..6].to_uppercase()
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{AffiliateStatus, DiscountType},
    sv::test_utils::test_db,
  };

  fn settings() -> Settings {
    Settings {
      tax_rate: 8.0,
      flat_shipping_cents: 500,
      affiliate_discount_rate: 5.0,
      affiliate_cookie_days: 30,
      ..Settings::default()
    }
  }

  fn ship_to() -> ShipTo {
    ShipTo {
      name: "Pat Doe".into(),
      street1: "1 Main St".into(),
      street2: None,
      city: "Springfield".into(),
      state: "IL".into(),
      zip: "62701".into(),
      country: "US".into(),
      email: "pat@example.com".into(),
    }
  }

  async fn seed_save10(db: &DatabaseConnection) {
    coupon::ActiveModel {
      code: Set("SAVE10".into()),
      label: Set("10% off".into()),
      discount_type: Set(DiscountType::Percentage),
      percent: Set(Some(10.0)),
      amount_cents: Set(None),
      min_subtotal_cents: Set(None),
      starts_at: Set(None),
      expires_at: Set(None),
      max_uses: Set(None),
      times_used: Set(0),
      is_active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();
  }

  #[tokio::test]
  async fn order_totals_follow_the_pricing_invariant() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 2500, 10).await;
    seed_save10(&db).await;

    // $100 subtotal, 10% coupon, 8% tax, $5 flat shipping -> $102.20
    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 4 }],
        ship_to(),
        PaymentMethod::Venmo,
        Some("SAVE10"),
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    assert_eq!(order.subtotal_cents, 10000);
    assert_eq!(order.discount_cents, 1000);
    assert_eq!(order.tax_cents, 720);
    assert_eq!(order.shipping_cents, 500);
    assert_eq!(order.total_cents, 10220);
    assert_eq!(
      order.total_cents,
      order.subtotal_cents - order.discount_cents
        + order.tax_cents
        + order.shipping_cents
    );

    // Payment row created PENDING, stock decremented, coupon consumed.
    let pay =
      payment::Entity::find_by_id(order.id).one(&db).await.unwrap().unwrap();
    assert_eq!(pay.status, PaymentStatus::Pending);

    let product =
      product::Entity::find_by_id(product.id).one(&db).await.unwrap().unwrap();
    assert_eq!(product.stock, 6);

    let coupon =
      coupon::Entity::find_by_id("SAVE10").one(&db).await.unwrap().unwrap();
    assert_eq!(coupon.times_used, 1);
  }

  #[tokio::test]
  async fn line_items_snapshot_prices_at_order_time() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 2500, 10).await;

    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 2 }],
        ship_to(),
        PaymentMethod::Bitcoin,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    // A later price change must not alter the persisted snapshot.
    product::ActiveModel {
      price_cents: Set(9999),
      ..product::Entity::find_by_id(product.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .into()
    }
    .update(&db)
    .await
    .unwrap();

    let items = order_item::Entity::find()
      .filter(order_item::Column::OrderId.eq(order.id))
      .all(&db)
      .await
      .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].unit_price_cents, 2500);
    assert_eq!(items[0].line_total_cents, 5000);
  }

  #[tokio::test]
  async fn empty_cart_is_rejected() {
    let db = test_db::setup().await;

    let result = Checkout::new(&db)
      .create_order(
        7,
        &[],
        ship_to(),
        PaymentMethod::Venmo,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await;

    assert!(matches!(result, Err(Error::EmptyCart)));
  }

  #[tokio::test]
  async fn oversell_fails_and_rolls_back_the_whole_order() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "SCARCE", 1000, 3).await;

    let checkout = Checkout::new(&db);
    let line =
      CartLine { product_id: product.id, variant_id: None, quantity: 2 };

    checkout
      .create_order(
        1,
        &[line.clone()],
        ship_to(),
        PaymentMethod::Venmo,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    // Second order wants 2 but only 1 remains.
    let result = checkout
      .create_order(
        2,
        &[line],
        ship_to(),
        PaymentMethod::Venmo,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await;
    assert!(matches!(result, Err(Error::OutOfStock(sku)) if sku == "SCARCE"));

    // No partial order and no stock taken by the failed attempt.
    assert_eq!(order::Entity::find().all(&db).await.unwrap().len(), 1);
    let product =
      product::Entity::find_by_id(product.id).one(&db).await.unwrap().unwrap();
    assert_eq!(product.stock, 1);
  }

  #[tokio::test]
  async fn limited_coupon_is_consumed_at_creation_not_validation() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 1000, 100).await;
    coupon::ActiveModel {
      code: Set("ONCE".into()),
      label: Set("single use".into()),
      discount_type: Set(DiscountType::Percentage),
      percent: Set(Some(10.0)),
      amount_cents: Set(None),
      min_subtotal_cents: Set(None),
      starts_at: Set(None),
      expires_at: Set(None),
      max_uses: Set(Some(1)),
      times_used: Set(0),
      is_active: Set(true),
    }
    .insert(&db)
    .await
    .unwrap();

    // Validation alone does not consume the code.
    Discount::new(&db).validate("ONCE", 1000, &settings()).await.unwrap();
    let coupon =
      coupon::Entity::find_by_id("ONCE").one(&db).await.unwrap().unwrap();
    assert_eq!(coupon.times_used, 0);

    let line =
      CartLine { product_id: product.id, variant_id: None, quantity: 1 };
    Checkout::new(&db)
      .create_order(
        1,
        &[line.clone()],
        ship_to(),
        PaymentMethod::Venmo,
        Some("ONCE"),
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    let result = Checkout::new(&db)
      .create_order(
        2,
        &[line],
        ship_to(),
        PaymentMethod::Venmo,
        Some("ONCE"),
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await;
    assert!(matches!(result, Err(Error::UsageLimitReached)));
  }

  #[tokio::test]
  async fn explicit_code_takes_precedence_over_cookie() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 10000, 10).await;
    seed_save10(&db).await;
    let aff =
      test_db::seed_affiliate(&db, "JANE01", AffiliateStatus::Approved).await;

    let cookie = AttributionCookie {
      code: "JANE01".into(),
      set_at: Utc::now().naive_utc(),
    };

    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 1 }],
        ship_to(),
        PaymentMethod::Venmo,
        Some("SAVE10"),
        Some(&cookie),
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    // The coupon applied; the cookie's affiliate did not attribute.
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(order.discount_cents, 1000);
    assert_ne!(order.affiliate_id, Some(aff.id));
  }

  #[tokio::test]
  async fn fresh_cookie_attributes_when_no_code_is_typed() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 10000, 10).await;
    let aff =
      test_db::seed_affiliate(&db, "JANE01", AffiliateStatus::Approved).await;

    let cookie = AttributionCookie {
      code: "JANE01".into(),
      set_at: Utc::now().naive_utc() - TimeDelta::days(10),
    };

    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 1 }],
        ship_to(),
        PaymentMethod::Venmo,
        None,
        Some(&cookie),
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    assert_eq!(order.affiliate_id, Some(aff.id));
    // Store-configured 5% referral discount.
    assert_eq!(order.discount_cents, 500);
  }

  #[tokio::test]
  async fn stale_cookie_is_ignored() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "WIDGET", 10000, 10).await;
    test_db::seed_affiliate(&db, "JANE01", AffiliateStatus::Approved).await;

    let cookie = AttributionCookie {
      code: "JANE01".into(),
      set_at: Utc::now().naive_utc() - TimeDelta::days(45),
    };

    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 1 }],
        ship_to(),
        PaymentMethod::Venmo,
        None,
        Some(&cookie),
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    assert!(order.affiliate_id.is_none());
    assert_eq!(order.discount_cents, 0);
  }

  #[tokio::test]
  async fn variant_price_overrides_product_price() {
    let db = test_db::setup().await;
    let product = test_db::seed_product(&db, "SHIRT", 2000, 0).await;
    let variant = variant::ActiveModel {
      product_id: Set(product.id),
      name: Set("XL".into()),
      sku: Set("SHIRT-XL".into()),
      price_cents: Set(Some(2200)),
      stock: Set(5),
      ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let order = Checkout::new(&db)
      .create_order(
        7,
        &[CartLine {
          product_id: product.id,
          variant_id: Some(variant.id),
          quantity: 2,
        }],
        ship_to(),
        PaymentMethod::Cashapp,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap();

    assert_eq!(order.subtotal_cents, 4400);

    let variant =
      variant::Entity::find_by_id(variant.id).one(&db).await.unwrap().unwrap();
    assert_eq!(variant.stock, 3);
  }
}
