use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_orders::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(ShippingLabels::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ShippingLabels::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(ShippingLabels::OrderId).integer().not_null())
          .col(ColumnDef::new(ShippingLabels::Carrier).string().not_null())
          .col(ColumnDef::new(ShippingLabels::Service).string().not_null())
          .col(
            ColumnDef::new(ShippingLabels::TrackingNumber)
              .string()
              .not_null(),
          )
          .col(ColumnDef::new(ShippingLabels::LabelUrl).string().not_null())
          .col(
            ColumnDef::new(ShippingLabels::RateCents).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(ShippingLabels::CreatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_shipping_labels_order")
              .from(ShippingLabels::Table, ShippingLabels::OrderId)
              .to(Orders::Table, Orders::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_shipping_labels_order")
          .table(ShippingLabels::Table)
          .col(ShippingLabels::OrderId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ShippingLabels::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ShippingLabels {
  Table,
  Id,
  OrderId,
  Carrier,
  Service,
  TrackingNumber,
  LabelUrl,
  RateCents,
  CreatedAt,
}
