use crate::{
  entity::{
    AffiliateStatus, CommissionStatus, CommissionTier, OrderStatus, affiliate,
    category, commission, order, order_item, product,
  },
  money,
  prelude::*,
  settings::Settings,
};

/// Posts and administers affiliate commissions.
///
/// Posting runs on the confirm-payment transaction via the associated
/// functions; the admin status lifecycle runs on the service's own
/// connection.
pub struct Commissions<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Commissions<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates zero, one or two commission rows for a freshly confirmed order,
  /// on the caller's transaction. Idempotent: an order that already has
  /// rows gets them back unchanged, never duplicated.
  pub async fn post_for_order<C: ConnectionTrait>(
    conn: &C,
    order: &order::Model,
    settings: &Settings,
  ) -> Result<Vec<commission::Model>> {
    if order.status != OrderStatus::PaymentComplete {
      error!(
        "commission post attempted for order {} in {:?}",
        order.order_number, order.status
      );
      return Err(Error::Invariant(
        "commissions require a payment-complete order".into(),
      ));
    }

    let Some(affiliate_id) = order.affiliate_id else {
      return Ok(vec![]);
    };

    let existing = commission::Entity::find()
      .filter(commission::Column::OrderId.eq(order.id))
      .all(conn)
      .await?;
    if !existing.is_empty() {
      debug!("order {} already has commissions, no-op", order.order_number);
      return Ok(existing);
    }

    let direct = affiliate::Entity::find_by_id(affiliate_id)
      .one(conn)
      .await?
      .ok_or_else(|| {
        Error::Invariant(format!(
          "order {} references missing affiliate {affiliate_id}",
          order.order_number
        ))
      })?;

    let category_rate = Self::category_rate_for_order(conn, order.id).await?;
    let rate = Self::effective_rate(&direct, category_rate, settings);
    // Commissions are earned on the discounted subtotal only; tax and
    // shipping never pay out.
    let base_cents = order.subtotal_cents - order.discount_cents;
    let now = Utc::now().naive_utc();

    let mut posted = vec![
      commission::ActiveModel {
        affiliate_id: Set(direct.id),
        order_id: Set(order.id),
        tier: Set(CommissionTier::Direct),
        rate: Set(rate),
        amount_cents: Set(money::percent_of(base_cents, rate)),
        status: Set(CommissionStatus::Pending),
        created_at: Set(now),
        ..Default::default()
      }
      .insert(conn)
      .await?,
    ];

    // One hop up only, and only while the parent is in good standing.
    if let Some(parent_id) = direct.parent_id
      && let Some(parent) =
        affiliate::Entity::find_by_id(parent_id).one(conn).await?
      && parent.status == AffiliateStatus::Approved
    {
      let parent_rate = settings.parent_commission_rate;
      posted.push(
        commission::ActiveModel {
          affiliate_id: Set(parent.id),
          order_id: Set(order.id),
          tier: Set(CommissionTier::Parent),
          rate: Set(parent_rate),
          amount_cents: Set(money::percent_of(base_cents, parent_rate)),
          status: Set(CommissionStatus::Pending),
          created_at: Set(now),
          ..Default::default()
        }
        .insert(conn)
        .await?,
      );
    }

    info!(
      "posted {} commission(s) for order {}",
      posted.len(),
      order.order_number
    );
    Ok(posted)
  }

  /// Effective direct-commission percent. The precedence is deliberately
  /// confined to this one function: personal override, then category rate,
  /// then the store default.
  pub fn effective_rate(
    affiliate: &affiliate::Model,
    category_rate: Option<f64>,
    settings: &Settings,
  ) -> f64 {
    affiliate
      .commission_rate
      .or(category_rate)
      .unwrap_or(settings.default_commission_rate)
  }

  /// First line item (in insertion order) whose product's category defines
  /// a rate.
  async fn category_rate_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
  ) -> Result<Option<f64>> {
    let items = order_item::Entity::find()
      .filter(order_item::Column::OrderId.eq(order_id))
      .order_by_asc(order_item::Column::Id)
      .all(conn)
      .await?;

    for item in items {
      let Some(product) =
        product::Entity::find_by_id(item.product_id).one(conn).await?
      else {
        continue;
      };
      let Some(category_id) = product.category_id else { continue };
      if let Some(category) =
        category::Entity::find_by_id(category_id).one(conn).await?
        && category.commission_rate.is_some()
      {
        return Ok(category.commission_rate);
      }
    }

    Ok(None)
  }

  /// Cancels every live commission on an order, keeping the rows as an
  /// audit trail. Runs on the order-cancellation transaction.
  pub async fn cancel_for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
  ) -> Result<u64> {
    let result = commission::Entity::update_many()
      .col_expr(
        commission::Column::Status,
        Expr::value(CommissionStatus::Cancelled),
      )
      .filter(commission::Column::OrderId.eq(order_id))
      .filter(commission::Column::Status.is_in([
        CommissionStatus::Pending,
        CommissionStatus::Approved,
      ]))
      .exec(conn)
      .await?;
    Ok(result.rows_affected)
  }

  pub async fn approve(&self, id: i32) -> Result<commission::Model> {
    self.transition(id, CommissionStatus::Approved, &[CommissionStatus::Pending])
      .await
  }

  pub async fn mark_paid(&self, id: i32) -> Result<commission::Model> {
    self.transition(id, CommissionStatus::Paid, &[CommissionStatus::Approved])
      .await
  }

  pub async fn cancel(&self, id: i32) -> Result<commission::Model> {
    self
      .transition(
        id,
        CommissionStatus::Cancelled,
        &[CommissionStatus::Pending, CommissionStatus::Approved],
      )
      .await
  }

  /// Admin-driven status sub-state-machine. Amount and rate stay frozen;
  /// only `status` ever changes, and PAID/CANCELLED are terminal.
  async fn transition(
    &self,
    id: i32,
    to: CommissionStatus,
    allowed_from: &[CommissionStatus],
  ) -> Result<commission::Model> {
    let row = commission::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::CommissionNotFound)?;

    if !allowed_from.contains(&row.status) {
      return Err(Error::IllegalTransition(format!(
        "commission {id}: {:?} -> {to:?}",
        row.status
      )));
    }

    let updated =
      commission::ActiveModel { status: Set(to), ..row.into() }
        .update(self.db)
        .await?;
    Ok(updated)
  }

  pub async fn for_order(
    &self,
    order_id: i32,
  ) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::OrderId.eq(order_id))
        .order_by_asc(commission::Column::Id)
        .all(self.db)
        .await?,
    )
  }
}
