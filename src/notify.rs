//! Best-effort customer/admin notifications.
//!
//! Emails are queued after the core transaction commits and delivered by a
//! background task, so a slow or failing mail provider can never hold a row
//! lock or abort a state transition. Delivery failures are logged and
//! swallowed; nothing here is on the critical path.

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::{entity::shipping_label, money, prelude::*};

#[derive(Debug, Clone)]
pub struct Email {
  pub to: String,
  pub subject: String,
  pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &Email) -> Result<()>;
}

const SEND_TIMEOUT: Duration = Duration::from_secs(8);

/// HTTP mail API client.
pub struct HttpMailer {
  client: Client,
  base_url: String,
  api_token: String,
}

impl HttpMailer {
  pub fn new(base_url: String, api_token: String) -> Self {
    Self { client: Client::new(), base_url, api_token }
  }
}

#[async_trait]
impl Mailer for HttpMailer {
  async fn send(&self, email: &Email) -> Result<()> {
    let url = format!("{}messages", self.base_url);

    let response = self
      .client
      .post(&url)
      .timeout(SEND_TIMEOUT)
      .bearer_auth(&self.api_token)
      .json(&json::json!({
        "to": email.to,
        "subject": email.subject,
        "html": email.html,
      }))
      .send()
      .await
      .map_err(|e| Error::Provider(format!("mail send failed: {e}")))?;

    if !response.status().is_success() {
      return Err(Error::Provider(format!(
        "mail provider returned {}",
        response.status()
      )));
    }

    Ok(())
  }
}

/// Drops every message; used in tests and when no mail provider is set.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
  async fn send(&self, _email: &Email) -> Result<()> {
    Ok(())
  }
}

/// Handle for enqueueing notifications. Cheap to clone; `disabled()` yields
/// a no-op handle for tests.
#[derive(Clone)]
pub struct Notifier {
  tx: Option<mpsc::UnboundedSender<Email>>,
}

impl Notifier {
  pub fn spawn(mailer: Arc<dyn Mailer>) -> Self {
    let (tx, mut rx) = mpsc::unbounded_channel::<Email>();

    tokio::spawn(async move {
      while let Some(email) = rx.recv().await {
        if let Err(err) = mailer.send(&email).await {
          warn!("notification to {} dropped: {err}", email.to);
        }
      }
    });

    Self { tx: Some(tx) }
  }

  pub fn disabled() -> Self {
    Self { tx: None }
  }

  fn enqueue(&self, email: Email) {
    if let Some(tx) = &self.tx
      && tx.send(email).is_err()
    {
      warn!("notification queue closed, message dropped");
    }
  }

  pub fn order_placed(&self, order: &crate::entity::order::Model) {
    self.enqueue(Email {
      to: order.email.clone(),
      subject: format!("Order {} received", order.order_number),
      html: format!(
        "<p>Thanks for your order! Your total is {}. We'll let you know \
         once your payment is confirmed.</p>",
        money::fmt_usd(order.total_cents)
      ),
    });
  }

  pub fn payment_confirmed(&self, order: &crate::entity::order::Model) {
    self.enqueue(Email {
      to: order.email.clone(),
      subject: format!("Payment confirmed for order {}", order.order_number),
      html: format!(
        "<p>We received your payment of {}. Your order is being \
         prepared.</p>",
        money::fmt_usd(order.total_cents)
      ),
    });
  }

  pub fn order_cancelled(&self, order: &crate::entity::order::Model) {
    self.enqueue(Email {
      to: order.email.clone(),
      subject: format!("Order {} cancelled", order.order_number),
      html: "<p>Your order has been cancelled.</p>".to_string(),
    });
  }

  pub fn order_shipped(
    &self,
    order: &crate::entity::order::Model,
    label: &shipping_label::Model,
  ) {
    self.enqueue(Email {
      to: order.email.clone(),
      subject: format!("Order {} shipped", order.order_number),
      html: format!(
        "<p>Your order is on its way via {} {}.</p>\
         <p>Tracking number: {}</p>",
        label.carrier, label.service, label.tracking_number
      ),
    });
  }
}
