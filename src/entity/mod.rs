pub mod affiliate;
pub mod category;
pub mod commission;
pub mod coupon;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod setting;
pub mod shipping_label;
pub mod variant;

pub use affiliate::AffiliateStatus;
pub use commission::{CommissionStatus, CommissionTier};
pub use coupon::DiscountType;
pub use order::OrderStatus;
pub use payment::{PaymentMethod, PaymentStatus};
