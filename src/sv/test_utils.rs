//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Schema, Set,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(setting::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(category::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(product::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(variant::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(coupon::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(affiliate::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(order::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(order_item::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(payment::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(shipping_label::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  pub async fn seed_product(
    db: &DatabaseConnection,
    sku: &str,
    price_cents: i64,
    stock: i32,
  ) -> product::Model {
    product::ActiveModel {
      name: Set(format!("Product {sku}")),
      sku: Set(sku.to_string()),
      price_cents: Set(price_cents),
      stock: Set(stock),
      category_id: Set(None),
      is_active: Set(true),
      ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn seed_affiliate(
    db: &DatabaseConnection,
    code: &str,
    status: AffiliateStatus,
  ) -> affiliate::Model {
    affiliate::ActiveModel {
      user_id: Set(1000),
      referral_code: Set(code.to_string()),
      commission_rate: Set(None),
      parent_id: Set(None),
      status: Set(status),
      created_at: Set(chrono::Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
  }
}
