use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Affiliates::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Affiliates::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Affiliates::UserId).big_integer().not_null())
          .col(
            ColumnDef::new(Affiliates::ReferralCode)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Affiliates::CommissionRate).double().null())
          .col(ColumnDef::new(Affiliates::ParentId).integer().null())
          .col(
            ColumnDef::new(Affiliates::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Affiliates::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_affiliates_parent")
              .from(Affiliates::Table, Affiliates::ParentId)
              .to(Affiliates::Table, Affiliates::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_affiliates_code")
          .table(Affiliates::Table)
          .col(Affiliates::ReferralCode)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Affiliates::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Affiliates {
  Table,
  Id,
  UserId,
  ReferralCode,
  CommissionRate,
  ParentId,
  Status,
  CreatedAt,
}
