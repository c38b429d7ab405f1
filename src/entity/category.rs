use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  /// Category-level commission percent, between a personal override and the
  /// store default in precedence.
  pub commission_rate: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::product::Entity")]
  Products,
}

impl Related<super::product::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Products.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
