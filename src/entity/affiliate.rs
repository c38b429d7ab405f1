use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AffiliateStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "approved")]
  Approved,
  #[sea_orm(string_value = "rejected")]
  Rejected,
  #[sea_orm(string_value = "suspended")]
  Suspended,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliates")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i64,
  #[sea_orm(unique)]
  pub referral_code: String,
  /// Personal percent override; `None` falls back to category/store default.
  pub commission_rate: Option<f64>,
  /// One meaningful tier up; deeper chains earn nothing.
  pub parent_id: Option<i32>,
  pub status: AffiliateStatus,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::commission::Entity")]
  Commissions,
}

impl Related<super::commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
