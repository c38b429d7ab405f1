use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  #[sea_orm(string_value = "awaiting_payment")]
  #[default]
  AwaitingPayment,
  #[sea_orm(string_value = "payment_complete")]
  PaymentComplete,
  #[sea_orm(string_value = "order_complete")]
  OrderComplete,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

/// An order is an atomic snapshot of cart contents, pricing and attribution
/// taken at creation time. `total = subtotal - discount + tax + shipping`
/// holds at creation and is never recomputed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub order_number: String,
  pub user_id: i64,
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub discount_cents: i64,
  pub coupon_code: Option<String>,
  pub tax_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub ship_name: String,
  pub ship_street1: String,
  pub ship_street2: Option<String>,
  pub ship_city: String,
  pub ship_state: String,
  pub ship_zip: String,
  pub ship_country: String,
  pub email: String,
  /// Resolved at creation and frozen thereafter.
  pub affiliate_id: Option<i32>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::order_item::Entity")]
  Items,
  #[sea_orm(has_one = "super::payment::Entity")]
  Payment,
  #[sea_orm(has_many = "super::commission::Entity")]
  Commissions,
  #[sea_orm(has_many = "super::shipping_label::Entity")]
  ShippingLabels,
}

impl Related<super::order_item::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Items.def()
  }
}

impl Related<super::payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Payment.def()
  }
}

impl Related<super::commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl Related<super::shipping_label::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::ShippingLabels.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
