use crate::{
  entity::{
    OrderStatus, PaymentStatus, order, order_item, payment, product, variant,
  },
  notify::Notifier,
  prelude::*,
  settings::Settings,
  sv::commission::Commissions,
};

/// The order status state machine.
///
/// AWAITING_PAYMENT -> PAYMENT_COMPLETE -> ORDER_COMPLETE, with
/// AWAITING_PAYMENT or PAYMENT_COMPLETE -> CANCELLED. Terminal states have
/// no exits. Every transition is a status-guarded conditional update so
/// concurrent admins cannot double-apply side effects.
pub struct Orders<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Orders<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, order_id: i32) -> Result<order::Model> {
    order::Entity::find_by_id(order_id)
      .one(self.db)
      .await?
      .ok_or(Error::OrderNotFound)
  }

  /// Customer marks a manual payment as sent (PENDING -> SUBMITTED).
  pub async fn submit_payment(
    &self,
    order_id: i32,
    transaction_ref: Option<String>,
  ) -> Result<payment::Model> {
    let order = self.by_id(order_id).await?;
    if order.status != OrderStatus::AwaitingPayment {
      return Err(Error::IllegalTransition(format!(
        "submit_payment on order in {:?}",
        order.status
      )));
    }

    let pay = payment::Entity::find_by_id(order_id)
      .one(self.db)
      .await?
      .ok_or_else(|| {
        Error::Invariant(format!("order {order_id} has no payment row"))
      })?;
    if pay.status != PaymentStatus::Pending {
      return Err(Error::IllegalTransition(format!(
        "submit_payment on payment in {:?}",
        pay.status
      )));
    }

    let updated = payment::ActiveModel {
      status: Set(PaymentStatus::Submitted),
      transaction_ref: Set(transaction_ref),
      ..pay.into()
    }
    .update(self.db)
    .await?;
    Ok(updated)
  }

  /// Admin confirms the payment arrived. Marks the payment CONFIRMED, moves
  /// the order to PAYMENT_COMPLETE and posts commissions, all in one
  /// transaction: a confirmed order can never silently lack its commission
  /// trail. The customer notification goes out only after commit.
  pub async fn confirm_payment(
    &self,
    order_id: i32,
    transaction_ref: Option<String>,
    settings: &Settings,
    notifier: &Notifier,
  ) -> Result<order::Model> {
    let txn = self.db.begin().await?;

    let order = order::Entity::find_by_id(order_id)
      .one(&txn)
      .await?
      .ok_or(Error::OrderNotFound)?;
    if order.status != OrderStatus::AwaitingPayment {
      return Err(Error::IllegalTransition(format!(
        "confirm_payment on order in {:?}",
        order.status
      )));
    }

    // Guarded write: loses cleanly if another confirm raced us here.
    let rows = order::Entity::update_many()
      .col_expr(
        order::Column::Status,
        Expr::value(OrderStatus::PaymentComplete),
      )
      .filter(order::Column::Id.eq(order_id))
      .filter(order::Column::Status.eq(OrderStatus::AwaitingPayment))
      .exec(&txn)
      .await?
      .rows_affected;
    if rows == 0 {
      return Err(Error::IllegalTransition(
        "order status changed concurrently".into(),
      ));
    }

    let pay = payment::Entity::find_by_id(order_id)
      .one(&txn)
      .await?
      .ok_or_else(|| {
        Error::Invariant(format!("order {order_id} has no payment row"))
      })?;
    if pay.status == PaymentStatus::Confirmed {
      error!("payment for order {order_id} confirmed while order awaited it");
      return Err(Error::Invariant("payment already confirmed".into()));
    }

    let now = Utc::now().naive_utc();
    let existing_ref = pay.transaction_ref.clone();
    payment::ActiveModel {
      status: Set(PaymentStatus::Confirmed),
      transaction_ref: Set(transaction_ref.or(existing_ref)),
      confirmed_at: Set(Some(now)),
      ..pay.into()
    }
    .update(&txn)
    .await?;

    let order = order::Entity::find_by_id(order_id)
      .one(&txn)
      .await?
      .ok_or(Error::OrderNotFound)?;

    // Commission failure aborts the confirmation rather than leaving a paid
    // order with no commission trail.
    Commissions::post_for_order(&txn, &order, settings).await?;

    txn.commit().await?;

    info!("order {} payment confirmed", order.order_number);
    notifier.payment_confirmed(&order);
    Ok(order)
  }

  /// PAYMENT_COMPLETE -> ORDER_COMPLETE.
  pub async fn mark_complete(&self, order_id: i32) -> Result<order::Model> {
    let order = self.by_id(order_id).await?;
    if order.status != OrderStatus::PaymentComplete {
      return Err(Error::IllegalTransition(format!(
        "mark_complete on order in {:?}",
        order.status
      )));
    }

    let rows = order::Entity::update_many()
      .col_expr(order::Column::Status, Expr::value(OrderStatus::OrderComplete))
      .filter(order::Column::Id.eq(order_id))
      .filter(order::Column::Status.eq(OrderStatus::PaymentComplete))
      .exec(self.db)
      .await?
      .rows_affected;
    if rows == 0 {
      return Err(Error::IllegalTransition(
        "order status changed concurrently".into(),
      ));
    }

    self.by_id(order_id).await
  }

  /// Cancels an order from AWAITING_PAYMENT or PAYMENT_COMPLETE: restocks
  /// every line item and moves any posted commissions to CANCELLED, keeping
  /// them as an audit trail.
  pub async fn cancel(
    &self,
    order_id: i32,
    notifier: &Notifier,
  ) -> Result<order::Model> {
    let txn = self.db.begin().await?;

    let order = order::Entity::find_by_id(order_id)
      .one(&txn)
      .await?
      .ok_or(Error::OrderNotFound)?;
    if !matches!(
      order.status,
      OrderStatus::AwaitingPayment | OrderStatus::PaymentComplete
    ) {
      return Err(Error::IllegalTransition(format!(
        "cancel on order in {:?}",
        order.status
      )));
    }

    let rows = order::Entity::update_many()
      .col_expr(order::Column::Status, Expr::value(OrderStatus::Cancelled))
      .filter(order::Column::Id.eq(order_id))
      .filter(order::Column::Status.is_in([
        OrderStatus::AwaitingPayment,
        OrderStatus::PaymentComplete,
      ]))
      .exec(&txn)
      .await?
      .rows_affected;
    if rows == 0 {
      return Err(Error::IllegalTransition(
        "order status changed concurrently".into(),
      ));
    }

    self.restock(&txn, order_id).await?;
    Commissions::cancel_for_order(&txn, order_id).await?;

    let order = order::Entity::find_by_id(order_id)
      .one(&txn)
      .await?
      .ok_or(Error::OrderNotFound)?;

    txn.commit().await?;

    info!("order {} cancelled", order.order_number);
    notifier.order_cancelled(&order);
    Ok(order)
  }

  /// Administrative escape hatch. An override to PAYMENT_COMPLETE routes
  /// through the guarded confirm path, so commission posting has exactly
  /// one entry point; any other target is a raw status write that skips the
  /// automatic side effects.
  pub async fn override_status(
    &self,
    order_id: i32,
    new_status: OrderStatus,
    settings: &Settings,
    notifier: &Notifier,
  ) -> Result<order::Model> {
    warn!("manual status override: order {order_id} -> {new_status:?}");

    if new_status == OrderStatus::PaymentComplete {
      return self.confirm_payment(order_id, None, settings, notifier).await;
    }

    let order = self.by_id(order_id).await?;
    let updated = order::ActiveModel {
      status: Set(new_status),
      ..order.into()
    }
    .update(self.db)
    .await?;
    Ok(updated)
  }

  async fn restock<C: ConnectionTrait>(
    &self,
    txn: &C,
    order_id: i32,
  ) -> Result<()> {
    let items = order_item::Entity::find()
      .filter(order_item::Column::OrderId.eq(order_id))
      .all(txn)
      .await?;

    for item in items {
      if let Some(variant_id) = item.variant_id {
        variant::Entity::update_many()
          .col_expr(
            variant::Column::Stock,
            Expr::col(variant::Column::Stock).add(item.quantity),
          )
          .filter(variant::Column::Id.eq(variant_id))
          .exec(txn)
          .await?;
      } else {
        product::Entity::update_many()
          .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(item.quantity),
          )
          .filter(product::Column::Id.eq(item.product_id))
          .exec(txn)
          .await?;
      }
    }

    Ok(())
  }
}
