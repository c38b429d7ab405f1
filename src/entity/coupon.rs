use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
  #[sea_orm(string_value = "percentage")]
  #[default]
  Percentage,
  #[sea_orm(string_value = "fixed")]
  Fixed,
}

/// Coupons are authored by the admin subsystem; the core reads them for
/// validation and increments `times_used` at order-creation commit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
  /// Stored uppercase; lookups normalize input the same way.
  #[sea_orm(primary_key, auto_increment = false)]
  pub code: String,
  pub label: String,
  pub discount_type: DiscountType,
  pub percent: Option<f64>,
  pub amount_cents: Option<i64>,
  pub min_subtotal_cents: Option<i64>,
  pub starts_at: Option<DateTime>,
  pub expires_at: Option<DateTime>,
  pub max_uses: Option<i32>,
  pub times_used: i32,
  pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
