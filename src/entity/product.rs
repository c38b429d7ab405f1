use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::category;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  #[sea_orm(unique)]
  pub sku: String,
  pub price_cents: i64,
  pub stock: i32,
  pub category_id: Option<i32>,
  pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "category::Entity",
    from = "Column::CategoryId",
    to = "category::Column::Id"
  )]
  Category,
  #[sea_orm(has_many = "super::variant::Entity")]
  Variants,
}

impl Related<category::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Category.def()
  }
}

impl Related<super::variant::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Variants.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
