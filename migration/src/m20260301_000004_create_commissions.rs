use sea_orm_migration::prelude::*;

use super::{
  m20260301_000002_create_affiliates::Affiliates,
  m20260301_000003_create_orders::Orders,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Commissions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Commissions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Commissions::AffiliateId).integer().not_null())
          .col(ColumnDef::new(Commissions::OrderId).integer().not_null())
          .col(ColumnDef::new(Commissions::Tier).string().not_null())
          .col(ColumnDef::new(Commissions::Rate).double().not_null())
          .col(
            ColumnDef::new(Commissions::AmountCents).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(Commissions::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Commissions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_affiliate")
              .from(Commissions::Table, Commissions::AffiliateId)
              .to(Affiliates::Table, Affiliates::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_order")
              .from(Commissions::Table, Commissions::OrderId)
              .to(Orders::Table, Orders::Id),
          )
          .to_owned(),
      )
      .await?;

    // One direct and at most one parent commission per order.
    manager
      .create_index(
        Index::create()
          .name("idx_commissions_order_tier")
          .table(Commissions::Table)
          .col(Commissions::OrderId)
          .col(Commissions::Tier)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Commissions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Commissions {
  Table,
  Id,
  AffiliateId,
  OrderId,
  Tier,
  Rate,
  AmountCents,
  Status,
  CreatedAt,
}
