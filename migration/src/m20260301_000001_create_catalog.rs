use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Settings::Table)
          .if_not_exists()
          .col(ColumnDef::new(Settings::Key).string().not_null().primary_key())
          .col(ColumnDef::new(Settings::Value).string().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Categories::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Categories::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Categories::Name).string().not_null())
          .col(ColumnDef::new(Categories::CommissionRate).double().null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Products::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Products::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Products::Name).string().not_null())
          .col(
            ColumnDef::new(Products::Sku).string().not_null().unique_key(),
          )
          .col(ColumnDef::new(Products::PriceCents).big_integer().not_null())
          .col(
            ColumnDef::new(Products::Stock).integer().not_null().default(0),
          )
          .col(ColumnDef::new(Products::CategoryId).integer().null())
          .col(
            ColumnDef::new(Products::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_products_category")
              .from(Products::Table, Products::CategoryId)
              .to(Categories::Table, Categories::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Variants::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Variants::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Variants::ProductId).integer().not_null())
          .col(ColumnDef::new(Variants::Name).string().not_null())
          .col(ColumnDef::new(Variants::Sku).string().not_null().unique_key())
          .col(ColumnDef::new(Variants::PriceCents).big_integer().null())
          .col(
            ColumnDef::new(Variants::Stock).integer().not_null().default(0),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_variants_product")
              .from(Variants::Table, Variants::ProductId)
              .to(Products::Table, Products::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Coupons::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Coupons::Code).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(Coupons::Label).string().not_null())
          .col(ColumnDef::new(Coupons::DiscountType).string().not_null())
          .col(ColumnDef::new(Coupons::Percent).double().null())
          .col(ColumnDef::new(Coupons::AmountCents).big_integer().null())
          .col(ColumnDef::new(Coupons::MinSubtotalCents).big_integer().null())
          .col(ColumnDef::new(Coupons::StartsAt).date_time().null())
          .col(ColumnDef::new(Coupons::ExpiresAt).date_time().null())
          .col(ColumnDef::new(Coupons::MaxUses).integer().null())
          .col(
            ColumnDef::new(Coupons::TimesUsed)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Coupons::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Coupons::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(Variants::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(Products::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(Categories::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(Settings::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Settings {
  Table,
  Key,
  Value,
}

#[derive(DeriveIden)]
pub enum Categories {
  Table,
  Id,
  Name,
  CommissionRate,
}

#[derive(DeriveIden)]
pub enum Products {
  Table,
  Id,
  Name,
  Sku,
  PriceCents,
  Stock,
  CategoryId,
  IsActive,
}

#[derive(DeriveIden)]
pub enum Variants {
  Table,
  Id,
  ProductId,
  Name,
  Sku,
  PriceCents,
  Stock,
}

#[derive(DeriveIden)]
pub enum Coupons {
  Table,
  Code,
  Label,
  DiscountType,
  Percent,
  AmountCents,
  MinSubtotalCents,
  StartsAt,
  ExpiresAt,
  MaxUses,
  TimesUsed,
  IsActive,
}
