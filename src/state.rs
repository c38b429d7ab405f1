use migration::{Migrator, MigratorTrait};

use crate::{notify::Notifier, prelude::*, sv::Carrier};

/// Shared application state behind an `Arc`.
pub struct AppState {
  pub db: DatabaseConnection,
  pub carrier: Carrier,
  pub notifier: Notifier,
  pub admin_token: String,
}

impl AppState {
  pub async fn new(
    db_url: &str,
    carrier: Carrier,
    notifier: Notifier,
    admin_token: String,
  ) -> Result<Self> {
    let db = Database::connect(db_url).await?;
    Migrator::up(&db, None).await?;

    Ok(Self { db, carrier, notifier, admin_token })
  }
}
