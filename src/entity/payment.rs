use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::order;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  #[sea_orm(string_value = "venmo")]
  #[default]
  Venmo,
  #[sea_orm(string_value = "cashapp")]
  Cashapp,
  #[sea_orm(string_value = "bitcoin")]
  Bitcoin,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "submitted")]
  Submitted,
  #[sea_orm(string_value = "confirmed")]
  Confirmed,
}

/// 1:1 with its order; created PENDING alongside the order and mutated only
/// by the confirm-payment transition.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub order_id: i32,
  pub method: PaymentMethod,
  pub status: PaymentStatus,
  pub transaction_ref: Option<String>,
  pub confirmed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "order::Entity",
    from = "Column::OrderId",
    to = "order::Column::Id"
  )]
  Order,
}

impl Related<order::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Order.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
