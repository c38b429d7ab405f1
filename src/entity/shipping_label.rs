use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::order;

/// A purchased carrier label. Re-purchasing inserts a new row; the newest row
/// is the order's current label, older rows stay as an audit trail.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipping_labels")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub order_id: i32,
  pub carrier: String,
  pub service: String,
  pub tracking_number: String,
  pub label_url: String,
  /// Cost charged by the carrier, distinct from the customer-facing
  /// shipping charge on the order.
  pub rate_cents: i64,
  pub created_at: DateTime,
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
