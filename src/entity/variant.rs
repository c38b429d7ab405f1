use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::product;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variants")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub product_id: i32,
  pub name: String,
  #[sea_orm(unique)]
  pub sku: String,
  /// `None` falls back to the product base price.
  pub price_cents: Option<i64>,
  pub stock: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "product::Entity",
    from = "Column::ProductId",
    to = "product::Column::Id"
  )]
  Product,
}

impl Related<product::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Product.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
