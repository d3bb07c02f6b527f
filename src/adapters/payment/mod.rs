//! Payment gateway adapters.

mod mock;
mod razorpay;

pub use mock::MockPaymentGateway;
pub use razorpay::{RazorpayConfig, RazorpayGateway, DEFAULT_API_BASE_URL};
