use crate::{
  entity::{order, shipping_label},
  money,
  notify::Notifier,
  prelude::*,
  settings::Settings,
  sv::carrier::{Address, Carrier, LabelPurchase, RateQuote, RateRequest},
};

/// Procures carrier rates and labels for confirmed orders.
///
/// Label purchase and order-status changes are independent admin actions;
/// this service never transitions the order. External calls happen outside
/// any write transaction so a slow carrier cannot hold a row lock.
pub struct Shipping<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Shipping<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Fetches the rate menu for an order using its ship-to snapshot and the
  /// store's configured ship-from address and carrier list.
  pub async fn get_rates(
    &self,
    order_id: i32,
    weight_oz: f64,
    carrier: &Carrier,
    settings: &Settings,
  ) -> Result<Vec<RateQuote>> {
    let order = order::Entity::find_by_id(order_id)
      .one(self.db)
      .await?
      .ok_or(Error::OrderNotFound)?;

    if !settings.ship_from.is_configured() {
      return Err(Error::Provider(
        "ship-from address not configured".into(),
      ));
    }

    let request = RateRequest {
      address_from: Address {
        name: settings.ship_from.name.clone(),
        street1: settings.ship_from.street1.clone(),
        street2: None,
        city: settings.ship_from.city.clone(),
        state: settings.ship_from.state.clone(),
        zip: settings.ship_from.zip.clone(),
        country: settings.ship_from.country.clone(),
      },
      address_to: Self::ship_to(&order),
      weight_oz,
      carrier_accounts: settings.carrier_ids.clone(),
    };

    carrier.rates(&request).await
  }

  /// Buys the chosen rate and records the label. Re-purchasing supersedes
  /// the previous label with a fresh row; older rows stay for audit.
  pub async fn purchase_label(
    &self,
    order_id: i32,
    rate_id: &str,
    carrier: &Carrier,
    notifier: &Notifier,
  ) -> Result<shipping_label::Model> {
    let order = order::Entity::find_by_id(order_id)
      .one(self.db)
      .await?
      .ok_or(Error::OrderNotFound)?;

    let purchase = carrier.buy_label(rate_id).await?;
    let label = self.record_label(order_id, purchase).await?;

    info!(
      "label for order {}: {} {} {} at {}",
      order.order_number,
      label.carrier,
      label.service,
      label.tracking_number,
      money::fmt_usd(label.rate_cents)
    );
    notifier.order_shipped(&order, &label);

    Ok(label)
  }

  pub async fn record_label(
    &self,
    order_id: i32,
    purchase: LabelPurchase,
  ) -> Result<shipping_label::Model> {
    let label = shipping_label::ActiveModel {
      order_id: Set(order_id),
      carrier: Set(purchase.carrier),
      service: Set(purchase.service),
      tracking_number: Set(purchase.tracking_number),
      label_url: Set(purchase.label_url),
      rate_cents: Set(purchase.rate_cents),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;
    Ok(label)
  }

  /// The order's current label is the most recently created row.
  pub async fn current_label(
    &self,
    order_id: i32,
  ) -> Result<Option<shipping_label::Model>> {
    Ok(
      shipping_label::Entity::find()
        .filter(shipping_label::Column::OrderId.eq(order_id))
        .order_by_desc(shipping_label::Column::CreatedAt)
        .order_by_desc(shipping_label::Column::Id)
        .one(self.db)
        .await?,
    )
  }

  fn ship_to(order: &order::Model) -> Address {
    Address {
      name: order.ship_name.clone(),
      street1: order.ship_street1.clone(),
      street2: order.ship_street2.clone(),
      city: order.ship_city.clone(),
      state: order.ship_state.clone(),
      zip: order.ship_zip.clone(),
      country: order.ship_country.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{OrderStatus, PaymentMethod},
    settings::ShipFrom,
    sv::{
      checkout::{CartLine, Checkout, ShipTo},
      test_utils::test_db,
    },
  };

  fn settings() -> Settings {
    Settings {
      ship_from: ShipFrom {
        name: "Storefront".into(),
        street1: "2 Dock Rd".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        zip: "62702".into(),
        country: "US".into(),
      },
      ..Settings::default()
    }
  }

  async fn place_order(db: &DatabaseConnection) -> order::Model {
    let product = test_db::seed_product(db, "WIDGET", 1000, 10).await;
    Checkout::new(db)
      .create_order(
        7,
        &[CartLine { product_id: product.id, variant_id: None, quantity: 1 }],
        ShipTo {
          name: "Pat Doe".into(),
          street1: "1 Main St".into(),
          street2: None,
          city: "Springfield".into(),
          state: "IL".into(),
          zip: "62701".into(),
          country: "US".into(),
          email: "pat@example.com".into(),
        },
        PaymentMethod::Venmo,
        None,
        None,
        &settings(),
        &Notifier::disabled(),
      )
      .await
      .unwrap()
  }

  fn purchase(tracking: &str, rate_cents: i64) -> LabelPurchase {
    LabelPurchase {
      carrier: "usps".into(),
      service: "Priority".into(),
      tracking_number: tracking.into(),
      label_url: format!("https://labels.example/{tracking}.pdf"),
      rate_cents,
    }
  }

  #[tokio::test]
  async fn second_label_supersedes_but_keeps_the_first() {
    let db = test_db::setup().await;
    let order = place_order(&db).await;
    let sv = Shipping::new(&db);

    let first = sv.record_label(order.id, purchase("TRACK1", 733)).await.unwrap();
    let second =
      sv.record_label(order.id, purchase("TRACK2", 812)).await.unwrap();
    assert_ne!(first.id, second.id);

    let all = shipping_label::Entity::find()
      .filter(shipping_label::Column::OrderId.eq(order.id))
      .all(&db)
      .await
      .unwrap();
    assert_eq!(all.len(), 2);

    let current = sv.current_label(order.id).await.unwrap().unwrap();
    assert_eq!(current.id, second.id);
    assert_eq!(current.tracking_number, "TRACK2");
  }

  #[tokio::test]
  async fn label_cost_is_distinct_from_customer_shipping_charge() {
    let db = test_db::setup().await;
    let order = place_order(&db).await;
    let sv = Shipping::new(&db);

    let label = sv.record_label(order.id, purchase("TRACK1", 733)).await.unwrap();

    assert_eq!(label.rate_cents, 733);
    // The customer-facing charge on the order is untouched.
    let order =
      order::Entity::find_by_id(order.id).one(&db).await.unwrap().unwrap();
    assert_eq!(order.shipping_cents, 0);
    assert_eq!(order.status, OrderStatus::AwaitingPayment);
  }

  #[tokio::test]
  async fn missing_ship_from_is_reported_not_retried() {
    let db = test_db::setup().await;
    let order = place_order(&db).await;
    let carrier = Carrier::new("http://127.0.0.1:1/".into(), "token".into());

    let result = Shipping::new(&db)
      .get_rates(order.id, 16.0, &carrier, &Settings::default())
      .await;
    assert!(matches!(result, Err(Error::Provider(_))));
  }

  #[tokio::test]
  async fn rates_for_unknown_order_conflict() {
    let db = test_db::setup().await;
    let carrier = Carrier::new("http://127.0.0.1:1/".into(), "token".into());

    let result =
      Shipping::new(&db).get_rates(999, 16.0, &carrier, &settings()).await;
    assert!(matches!(result, Err(Error::OrderNotFound)));
  }
}
