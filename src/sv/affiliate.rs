use uuid::Uuid;

use crate::{
  entity::{AffiliateStatus, affiliate},
  prelude::*,
};

/// Affiliate lifecycle administration. Affiliates are created on
/// application and never hard-deleted; rejection and suspension are status
/// transitions so the commission audit trail stays intact.
pub struct Affiliates<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Affiliates<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Registers an application with a fresh unique referral code, PENDING
  /// until an admin approves it.
  pub async fn apply(&self, user_id: i64) -> Result<affiliate::Model> {
    let code = self.fresh_code().await?;

    let affiliate = affiliate::ActiveModel {
      user_id: Set(user_id),
      referral_code: Set(code),
      commission_rate: Set(None),
      parent_id: Set(None),
      status: Set(AffiliateStatus::Pending),
      created_at: Set(Utc::now().naive_utc()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    info!(
      "affiliate application {} for user {user_id}",
      affiliate.referral_code
    );
    Ok(affiliate)
  }

  pub async fn by_id(&self, id: i32) -> Result<affiliate::Model> {
    affiliate::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::AffiliateNotFound)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<affiliate::Model>> {
    Ok(
      affiliate::Entity::find()
        .filter(
          affiliate::Column::ReferralCode.eq(code.trim().to_uppercase()),
        )
        .one(self.db)
        .await?,
    )
  }

  pub async fn set_status(
    &self,
    id: i32,
    status: AffiliateStatus,
  ) -> Result<affiliate::Model> {
    let affiliate = self.by_id(id).await?;
    let updated =
      affiliate::ActiveModel { status: Set(status), ..affiliate.into() }
        .update(self.db)
        .await?;
    Ok(updated)
  }

  /// Sets or clears the personal commission-rate override.
  pub async fn set_rate(
    &self,
    id: i32,
    rate: Option<f64>,
  ) -> Result<affiliate::Model> {
    if let Some(rate) = rate
      && !(0.0..=100.0).contains(&rate)
    {
      return Err(Error::InvalidArgs(
        "commission rate must be between 0 and 100".into(),
      ));
    }

    let affiliate = self.by_id(id).await?;
    let updated =
      affiliate::ActiveModel { commission_rate: Set(rate), ..affiliate.into() }
        .update(self.db)
        .await?;
    Ok(updated)
  }

  /// Assigns (or clears) the parent used for second-tier commissions.
  /// Commission posting only ever walks one hop up, so assignments that
  /// would create a deeper chain or a cycle are rejected here.
  pub async fn set_parent(
    &self,
    id: i32,
    parent_id: Option<i32>,
  ) -> Result<affiliate::Model> {
    let affiliate = self.by_id(id).await?;

    if let Some(parent_id) = parent_id {
      if parent_id == id {
        return Err(Error::InvalidArgs(
          "affiliate cannot be its own parent".into(),
        ));
      }

      let parent = self.by_id(parent_id).await?;
      if parent.parent_id.is_some() {
        return Err(Error::InvalidArgs(
          "parent already has a parent; only one tier is paid".into(),
        ));
      }
    }

    let updated =
      affiliate::ActiveModel { parent_id: Set(parent_id), ..affiliate.into() }
        .update(self.db)
        .await?;
    Ok(updated)
  }

  async fn fresh_code(&self) -> Result<String> {
    loop {
      let candidate =
        Uuid::new_v4().simple().to_string()[..8].to_uppercase();
      let taken = affiliate::Entity::find()
        .filter(affiliate::Column::ReferralCode.eq(candidate.as_str()))
        .one(self.db)
        .await?
        .is_some();
      if !taken {
        return Ok(candidate);
      }
    }
  }
}
