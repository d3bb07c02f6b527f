//! Mock payment gateway for testing.
//!
//! Supports pre-configured payments, error injection, and lookup counting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::PaymentId;
use crate::domain::membership::ProviderPayment;
use crate::ports::{PaymentError, PaymentGateway};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new().with_payment(payment);
/// let fetched = gateway.fetch_payment(&payment_id).await?;
/// assert_eq!(gateway.lookup_count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    payments: HashMap<String, ProviderPayment>,
    error: Option<PaymentError>,
    lookups: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payment, keyed by its `id`.
    pub fn with_payment(self, payment: ProviderPayment) -> Self {
        self.set_payment(payment);
        self
    }

    /// Registers a payment under an explicit lookup ID, which may differ from its body `id`.
    pub fn with_payment_for(self, lookup_id: impl Into<String>, payment: ProviderPayment) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.payments.insert(lookup_id.into(), payment);
        }
        self
    }

    /// Forces every lookup to fail with `error`.
    pub fn with_error(self, error: PaymentError) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.error = Some(error);
        }
        self
    }

    /// Registers or replaces a payment at runtime.
    pub fn set_payment(&self, payment: ProviderPayment) {
        if let Ok(mut state) = self.inner.lock() {
            state.payments.insert(payment.id.clone(), payment);
        }
    }

    /// Number of lookups made so far.
    pub fn lookup_count(&self) -> usize {
        self.inner.lock().map(|s| s.lookups.len()).unwrap_or(0)
    }

    /// Payment IDs looked up, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.inner.lock().map(|s| s.lookups.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<ProviderPayment, PaymentError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| PaymentError::network("mock gateway poisoned"))?;

        state.lookups.push(payment_id.to_string());

        if let Some(error) = state.error.clone() {
            return Err(error);
        }

        state
            .payments
            .get(payment_id.as_str())
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Payment"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::membership::{fixtures::captured_payment, PlanType};
    use crate::ports::PaymentErrorCode;

    #[tokio::test]
    async fn returns_registered_payment_and_counts_lookup() {
        let gateway = MockPaymentGateway::new()
            .with_payment(captured_payment("pay_1", "user-1", PlanType::Monthly));

        let payment = gateway
            .fetch_payment(&PaymentId::new("pay_1").unwrap())
            .await
            .unwrap();

        assert_eq!(payment.id, "pay_1");
        assert_eq!(gateway.lookup_count(), 1);
        assert_eq!(gateway.lookups(), vec!["pay_1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let gateway = MockPaymentGateway::new();
        let err = gateway
            .fetch_payment(&PaymentId::new("pay_x").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NotFound);
    }

    #[tokio::test]
    async fn injected_error_is_returned() {
        let gateway = MockPaymentGateway::new().with_error(PaymentError::network("down"));
        let err = gateway
            .fetch_payment(&PaymentId::new("pay_1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);
        assert_eq!(gateway.lookup_count(), 1);
    }
}
