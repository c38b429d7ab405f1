pub mod affiliate;
pub mod carrier;
pub mod checkout;
pub mod commission;
pub mod discount;
pub mod order;
pub mod shipping;
#[cfg(test)]
pub mod test_utils;

pub use affiliate::Affiliates;
pub use carrier::Carrier;
pub use checkout::Checkout;
pub use commission::Commissions;
pub use discount::Discount;
pub use order::Orders;
pub use shipping::Shipping;
