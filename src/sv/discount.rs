use crate::{
  entity::{AffiliateStatus, DiscountType, affiliate, coupon},
  money,
  prelude::*,
  settings::Settings,
};

/// Resolves a user-supplied code against coupons first, then affiliate
/// referral codes. Validation is a pure read; redemption counters only move
/// when an order is actually created.
pub struct Discount<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscountKind {
  /// Percent of the subtotal, rounded half-up to the cent.
  Percentage(f64),
  /// Flat amount in cents, clamped to the subtotal.
  Fixed(i64),
}

/// The resolved discount descriptor for a validated code.
#[derive(Debug, Clone)]
pub struct Applied {
  pub kind: DiscountKind,
  pub label: String,
  pub coupon_code: Option<String>,
  pub affiliate_id: Option<i32>,
}

impl Applied {
  pub fn amount_cents(&self, subtotal_cents: i64) -> i64 {
    match self.kind {
      DiscountKind::Percentage(rate) => money::percent_of(subtotal_cents, rate),
      DiscountKind::Fixed(cents) => cents.min(subtotal_cents),
    }
  }
}

/// Browser-persisted referral attribution. A cookie code gets no special
/// trust: it is re-validated exactly like a typed code.
#[derive(Debug, Clone)]
pub struct AttributionCookie {
  pub code: String,
  pub set_at: DateTime,
}

impl AttributionCookie {
  pub fn is_fresh(&self, now: DateTime, lifetime_days: i64) -> bool {
    now - self.set_at <= TimeDelta::days(lifetime_days)
  }
}

impl<'a> Discount<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn validate(
    &self,
    code: &str,
    subtotal_cents: i64,
    settings: &Settings,
  ) -> Result<Applied> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
      return Err(Error::InvalidCode);
    }

    if let Some(coupon) =
      coupon::Entity::find_by_id(code.as_str()).one(self.db).await?
    {
      return Self::check_coupon(&coupon, subtotal_cents);
    }

    let affiliate = affiliate::Entity::find()
      .filter(affiliate::Column::ReferralCode.eq(code.as_str()))
      .one(self.db)
      .await?
      .ok_or(Error::InvalidCode)?;

    if affiliate.status != AffiliateStatus::Approved {
      return Err(Error::InvalidCode);
    }

    Ok(Applied {
      kind: DiscountKind::Percentage(settings.affiliate_discount_rate),
      label: format!("Referral {}", affiliate.referral_code),
      coupon_code: None,
      affiliate_id: Some(affiliate.id),
    })
  }

  fn check_coupon(
    coupon: &coupon::Model,
    subtotal_cents: i64,
  ) -> Result<Applied> {
    if !coupon.is_active {
      return Err(Error::InvalidCode);
    }

    let now = Utc::now().naive_utc();
    if let Some(starts_at) = coupon.starts_at
      && now < starts_at
    {
      return Err(Error::CodeNotYetActive);
    }
    if let Some(expires_at) = coupon.expires_at
      && now > expires_at
    {
      return Err(Error::CodeExpired);
    }
    if let Some(min) = coupon.min_subtotal_cents
      && subtotal_cents < min
    {
      return Err(Error::MinimumNotMet);
    }
    if let Some(max_uses) = coupon.max_uses
      && coupon.times_used >= max_uses
    {
      return Err(Error::UsageLimitReached);
    }

    let kind = match coupon.discount_type {
      DiscountType::Percentage => {
        DiscountKind::Percentage(coupon.percent.unwrap_or(0.0))
      }
      DiscountType::Fixed => {
        DiscountKind::Fixed(coupon.amount_cents.unwrap_or(0))
      }
    };

    Ok(Applied {
      kind,
      label: coupon.label.clone(),
      coupon_code: Some(coupon.code.clone()),
      affiliate_id: None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn settings() -> Settings {
    Settings { affiliate_discount_rate: 5.0, ..Settings::default() }
  }

  async fn seed_coupon(db: &DatabaseConnection, model: coupon::ActiveModel) {
    model.insert(db).await.unwrap();
  }

  fn percentage_coupon(code: &str, percent: f64) -> coupon::ActiveModel {
    coupon::ActiveModel {
      code: Set(code.to_string()),
      label: Set(format!("{percent}% off")),
      discount_type: Set(DiscountType::Percentage),
      percent: Set(Some(percent)),
      amount_cents: Set(None),
      min_subtotal_cents: Set(None),
      starts_at: Set(None),
      expires_at: Set(None),
      max_uses: Set(None),
      times_used: Set(0),
      is_active: Set(true),
    }
  }

  #[tokio::test]
  async fn percentage_coupon_rounds_once_on_subtotal() {
    let db = test_db::setup().await;
    seed_coupon(&db, percentage_coupon("SAVE10", 10.0)).await;

    let applied = Discount::new(&db)
      .validate("save10", 10000, &settings())
      .await
      .unwrap();

    assert_eq!(applied.amount_cents(10000), 1000);
    assert_eq!(applied.coupon_code.as_deref(), Some("SAVE10"));
    assert!(applied.affiliate_id.is_none());
  }

  #[tokio::test]
  async fn fixed_coupon_is_clamped_to_subtotal() {
    let db = test_db::setup().await;
    seed_coupon(
      &db,
      coupon::ActiveModel {
        discount_type: Set(DiscountType::Fixed),
        percent: Set(None),
        amount_cents: Set(Some(2500)),
        ..percentage_coupon("FLAT25", 0.0)
      },
    )
    .await;

    let applied =
      Discount::new(&db).validate("FLAT25", 1000, &settings()).await.unwrap();

    assert_eq!(applied.amount_cents(1000), 1000);
    assert_eq!(applied.amount_cents(10000), 2500);
  }

  #[tokio::test]
  async fn unknown_code_is_rejected() {
    let db = test_db::setup().await;

    let result = Discount::new(&db).validate("NOPE", 1000, &settings()).await;
    assert!(matches!(result, Err(Error::InvalidCode)));
  }

  #[tokio::test]
  async fn date_bounds_are_enforced() {
    let db = test_db::setup().await;
    let now = Utc::now().naive_utc();

    seed_coupon(
      &db,
      coupon::ActiveModel {
        starts_at: Set(Some(now + TimeDelta::days(1))),
        ..percentage_coupon("SOON", 10.0)
      },
    )
    .await;
    seed_coupon(
      &db,
      coupon::ActiveModel {
        expires_at: Set(Some(now - TimeDelta::days(1))),
        ..percentage_coupon("GONE", 10.0)
      },
    )
    .await;

    let sv = Discount::new(&db);
    assert!(matches!(
      sv.validate("SOON", 1000, &settings()).await,
      Err(Error::CodeNotYetActive)
    ));
    assert!(matches!(
      sv.validate("GONE", 1000, &settings()).await,
      Err(Error::CodeExpired)
    ));
  }

  #[tokio::test]
  async fn minimum_and_usage_limit_are_enforced() {
    let db = test_db::setup().await;

    seed_coupon(
      &db,
      coupon::ActiveModel {
        min_subtotal_cents: Set(Some(5000)),
        ..percentage_coupon("BIG", 10.0)
      },
    )
    .await;
    seed_coupon(
      &db,
      coupon::ActiveModel {
        max_uses: Set(Some(3)),
        times_used: Set(3),
        ..percentage_coupon("USED", 10.0)
      },
    )
    .await;

    let sv = Discount::new(&db);
    assert!(matches!(
      sv.validate("BIG", 4999, &settings()).await,
      Err(Error::MinimumNotMet)
    ));
    assert!(sv.validate("BIG", 5000, &settings()).await.is_ok());
    assert!(matches!(
      sv.validate("USED", 1000, &settings()).await,
      Err(Error::UsageLimitReached)
    ));
  }

  #[tokio::test]
  async fn referral_code_resolves_to_store_discount_rate() {
    let db = test_db::setup().await;
    let aff = test_db::seed_affiliate(&db, "JANE01", AffiliateStatus::Approved)
      .await;

    let applied =
      Discount::new(&db).validate("jane01", 10000, &settings()).await.unwrap();

    assert_eq!(applied.kind, DiscountKind::Percentage(5.0));
    assert_eq!(applied.affiliate_id, Some(aff.id));
    assert_eq!(applied.amount_cents(10000), 500);
  }

  #[tokio::test]
  async fn unapproved_affiliate_code_is_invalid() {
    let db = test_db::setup().await;
    test_db::seed_affiliate(&db, "WAIT01", AffiliateStatus::Pending).await;

    let result = Discount::new(&db).validate("WAIT01", 1000, &settings()).await;
    assert!(matches!(result, Err(Error::InvalidCode)));
  }

  #[test]
  fn cookie_freshness_window() {
    let now = Utc::now().naive_utc();
    let cookie = AttributionCookie {
      code: "JANE01".into(),
      set_at: now - TimeDelta::days(29),
    };
    assert!(cookie.is_fresh(now, 30));

    let stale = AttributionCookie {
      code: "JANE01".into(),
      set_at: now - TimeDelta::days(31),
    };
    assert!(!stale.is_fresh(now, 30));
  }
}
