use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_catalog::Products,
  m20260301_000002_create_affiliates::Affiliates,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Orders::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Orders::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Orders::OrderNumber)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Orders::UserId).big_integer().not_null())
          .col(
            ColumnDef::new(Orders::Status)
              .string()
              .not_null()
              .default("awaiting_payment"),
          )
          .col(ColumnDef::new(Orders::SubtotalCents).big_integer().not_null())
          .col(ColumnDef::new(Orders::DiscountCents).big_integer().not_null())
          .col(ColumnDef::new(Orders::CouponCode).string().null())
          .col(ColumnDef::new(Orders::TaxCents).big_integer().not_null())
          .col(ColumnDef::new(Orders::ShippingCents).big_integer().not_null())
          .col(ColumnDef::new(Orders::TotalCents).big_integer().not_null())
          .col(ColumnDef::new(Orders::ShipName).string().not_null())
          .col(ColumnDef::new(Orders::ShipStreet1).string().not_null())
          .col(ColumnDef::new(Orders::ShipStreet2).string().null())
          .col(ColumnDef::new(Orders::ShipCity).string().not_null())
          .col(ColumnDef::new(Orders::ShipState).string().not_null())
          .col(ColumnDef::new(Orders::ShipZip).string().not_null())
          .col(ColumnDef::new(Orders::ShipCountry).string().not_null())
          .col(ColumnDef::new(Orders::Email).string().not_null())
          .col(ColumnDef::new(Orders::AffiliateId).integer().null())
          .col(ColumnDef::new(Orders::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_orders_affiliate")
              .from(Orders::Table, Orders::AffiliateId)
              .to(Affiliates::Table, Affiliates::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(OrderItems::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(OrderItems::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
          .col(ColumnDef::new(OrderItems::ProductId).integer().not_null())
          .col(ColumnDef::new(OrderItems::VariantId).integer().null())
          .col(ColumnDef::new(OrderItems::Name).string().not_null())
          .col(ColumnDef::new(OrderItems::Sku).string().not_null())
          .col(
            ColumnDef::new(OrderItems::UnitPriceCents)
              .big_integer()
              .not_null(),
          )
          .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
          .col(
            ColumnDef::new(OrderItems::LineTotalCents)
              .big_integer()
              .not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_order_items_order")
              .from(OrderItems::Table, OrderItems::OrderId)
              .to(Orders::Table, Orders::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_order_items_product")
              .from(OrderItems::Table, OrderItems::ProductId)
              .to(Products::Table, Products::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_order_items_order")
          .table(OrderItems::Table)
          .col(OrderItems::OrderId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Payments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Payments::OrderId)
              .integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Payments::Method).string().not_null())
          .col(
            ColumnDef::new(Payments::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Payments::TransactionRef).string().null())
          .col(ColumnDef::new(Payments::ConfirmedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_order")
              .from(Payments::Table, Payments::OrderId)
              .to(Orders::Table, Orders::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Payments::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(OrderItems::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Orders {
  Table,
  Id,
  OrderNumber,
  UserId,
  Status,
  SubtotalCents,
  DiscountCents,
  CouponCode,
  TaxCents,
  ShippingCents,
  TotalCents,
  ShipName,
  ShipStreet1,
  ShipStreet2,
  ShipCity,
  ShipState,
  ShipZip,
  ShipCountry,
  Email,
  AffiliateId,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum OrderItems {
  Table,
  Id,
  OrderId,
  ProductId,
  VariantId,
  Name,
  Sku,
  UnitPriceCents,
  Quantity,
  LineTotalCents,
}

#[derive(DeriveIden)]
pub enum Payments {
  Table,
  OrderId,
  Method,
  Status,
  TransactionRef,
  ConfirmedAt,
}
