use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{affiliate, order};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CommissionTier {
  #[sea_orm(string_value = "direct")]
  #[default]
  Direct,
  #[sea_orm(string_value = "parent")]
  Parent,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "approved")]
  Approved,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

/// Rate and amount are snapshots taken at post time; later affiliate rate
/// changes never touch already-posted rows. Only `status` may change.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub affiliate_id: i32,
  pub order_id: i32,
  pub tier: CommissionTier,
  pub rate: f64,
  /// Percent of the discounted subtotal, never tax/shipping-inclusive.
  pub amount_cents: i64,
  pub status: CommissionStatus,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "affiliate::Entity",
    from = "Column::AffiliateId",
    to = "affiliate::Column::Id"
  )]
  Affiliate,
  #[sea_orm(
    belongs_to = "order::Entity",
    from = "Column::OrderId",
    to = "order::Column::Id"
  )]
  Order,
}

impl Related<affiliate::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Affiliate.def()
  }
}

impl Related<order::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Order.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
