//! Store-wide settings snapshot.
//!
//! Settings live in the `settings` key/value table and are owned by the admin
//! subsystem; the core only reads them. Every operation takes one snapshot up
//! front so a concurrent settings edit cannot change the pricing math of an
//! order already being assembled.

use crate::{entity::setting, prelude::*};

#[derive(Debug, Clone, Default)]
pub struct ShipFrom {
  pub name: String,
  pub street1: String,
  pub city: String,
  pub state: String,
  pub zip: String,
  pub country: String,
}

impl ShipFrom {
  /// A ship-from address is usable once it has at least a street and zip.
  pub fn is_configured(&self) -> bool {
    !self.street1.is_empty() && !self.zip.is_empty()
  }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
  /// Sales tax percent applied to the discounted subtotal.
  pub tax_rate: f64,
  /// Flat customer-facing shipping charge; 0 when unconfigured.
  pub flat_shipping_cents: i64,
  /// Store default commission percent for affiliates with no override.
  pub default_commission_rate: f64,
  /// Flat percent paid to a direct affiliate's parent, one hop only.
  pub parent_commission_rate: f64,
  /// Customer discount percent granted by any affiliate referral code.
  pub affiliate_discount_rate: f64,
  /// Attribution cookie lifetime in days.
  pub affiliate_cookie_days: i64,
  pub ship_from: ShipFrom,
  /// Carrier account ids passed to the rate service.
  pub carrier_ids: Vec<String>,
}

impl Settings {
  /// Snapshot the settings table. Absent or unparsable values fall back to
  /// zero / empty so a misconfigured store degrades instead of erroring.
  pub async fn load(db: &DatabaseConnection) -> Result<Self> {
    let rows = setting::Entity::find().all(db).await?;
    let map: HashMap<String, String> =
      rows.into_iter().map(|row| (row.key, row.value)).collect();
    Ok(Self::from_map(&map))
  }

  pub fn from_map(map: &HashMap<String, String>) -> Self {
    Self {
      tax_rate: parse_f64(map, "tax_rate"),
      flat_shipping_cents: parse_i64(map, "flat_shipping_cents"),
      default_commission_rate: parse_f64(map, "default_commission_rate"),
      parent_commission_rate: parse_f64(map, "parent_commission_rate"),
      affiliate_discount_rate: parse_f64(map, "affiliate_discount_rate"),
      affiliate_cookie_days: parse_i64(map, "affiliate_cookie_days"),
      ship_from: ShipFrom {
        name: parse_str(map, "ship_from_name"),
        street1: parse_str(map, "ship_from_street1"),
        city: parse_str(map, "ship_from_city"),
        state: parse_str(map, "ship_from_state"),
        zip: parse_str(map, "ship_from_zip"),
        country: parse_str(map, "ship_from_country"),
      },
      carrier_ids: parse_str(map, "carrier_ids")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect(),
    }
  }
}

fn parse_str(map: &HashMap<String, String>, key: &str) -> String {
  map.get(key).cloned().unwrap_or_default()
}

fn parse_f64(map: &HashMap<String, String>, key: &str) -> f64 {
  let parsed = map.get(key).and_then(|v| v.trim().parse::<f64>().ok());
  match parsed {
    Some(value) if value.is_finite() => value,
    Some(_) | None => {
      if map.contains_key(key) {
        warn!("setting {key} is not a number, defaulting to 0");
      }
      0.0
    }
  }
}

fn parse_i64(map: &HashMap<String, String>, key: &str) -> i64 {
  let parsed = map.get(key).and_then(|v| v.trim().parse::<i64>().ok());
  match parsed {
    Some(value) => value,
    None => {
      if map.contains_key(key) {
        warn!("setting {key} is not an integer, defaulting to 0");
      }
      0
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn parses_configured_values() {
    let settings = Settings::from_map(&map(&[
      ("tax_rate", "8"),
      ("flat_shipping_cents", "500"),
      ("default_commission_rate", "10"),
      ("parent_commission_rate", "5"),
      ("affiliate_discount_rate", "5"),
      ("affiliate_cookie_days", "30"),
      ("carrier_ids", "usps_1, ups_2,"),
    ]));

    assert_eq!(settings.tax_rate, 8.0);
    assert_eq!(settings.flat_shipping_cents, 500);
    assert_eq!(settings.affiliate_cookie_days, 30);
    assert_eq!(settings.carrier_ids, vec!["usps_1", "ups_2"]);
  }

  #[test]
  fn garbage_and_absent_values_default_to_zero() {
    let settings =
      Settings::from_map(&map(&[("tax_rate", "eight"), ("carrier_ids", "")]));

    assert_eq!(settings.tax_rate, 0.0);
    assert_eq!(settings.flat_shipping_cents, 0);
    assert!(settings.carrier_ids.is_empty());
    assert!(!settings.ship_from.is_configured());
  }
}
