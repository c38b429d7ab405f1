use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy for the fulfillment core.
///
/// Validation errors are bad input and are never retried. Conflicts mean the
/// caller raced another writer and may retry with fresh data. Provider errors
/// come from external services and are reported to the admin caller.
/// Invariant errors are programming defects.
#[derive(Debug, Error)]
pub enum Error {
  // Validation
  #[error("unknown discount code")]
  InvalidCode,
  #[error("discount code has expired")]
  CodeExpired,
  #[error("discount code is not active yet")]
  CodeNotYetActive,
  #[error("subtotal is below the coupon minimum")]
  MinimumNotMet,
  #[error("coupon redemption limit reached")]
  UsageLimitReached,
  #[error("cart is empty")]
  EmptyCart,
  #[error("invalid arguments: {0}")]
  InvalidArgs(String),

  // Conflict
  #[error("out of stock: {0}")]
  OutOfStock(String),
  #[error("illegal transition: {0}")]
  IllegalTransition(String),
  #[error("order not found")]
  OrderNotFound,
  #[error("affiliate not found")]
  AffiliateNotFound,
  #[error("commission not found")]
  CommissionNotFound,
  #[error("product not found")]
  ProductNotFound,

  // Provider
  #[error("provider error: {0}")]
  Provider(String),

  // Invariant
  #[error("invariant violation: {0}")]
  Invariant(String),

  #[error(transparent)]
  Db(#[from] sea_orm::DbErr),
}

impl Error {
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidCode
        | Self::CodeExpired
        | Self::CodeNotYetActive
        | Self::MinimumNotMet
        | Self::UsageLimitReached
        | Self::EmptyCart
        | Self::InvalidArgs(_)
    )
  }

  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::OutOfStock(_)
        | Self::IllegalTransition(_)
        | Self::OrderNotFound
        | Self::AffiliateNotFound
        | Self::CommissionNotFound
        | Self::ProductNotFound
    )
  }
}
