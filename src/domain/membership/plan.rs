//! Membership plans and the server-held price table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Billing cadence of a premium membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Yearly,
}

impl PlanType {
    /// Returns the wire/storage name of this plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
        }
    }

    /// Number of calendar months one payment buys.
    pub fn period_months(&self) -> u32 {
        match self {
            PlanType::Monthly => 1,
            PlanType::Yearly => 12,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(PlanType::Monthly),
            "yearly" => Ok(PlanType::Yearly),
            other => Err(ValidationError::invalid_format(
                "plan_type",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

/// Price and label for one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDetails {
    /// Expected charge in minor currency units (paise, cents).
    pub amount_minor: i64,
    /// Tier label written to subscription state, e.g. `premium_monthly`.
    pub label: &'static str,
}

/// Immutable plan table, loaded once at startup and shared by both payment paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    currency: String,
    monthly: PlanDetails,
    yearly: PlanDetails,
}

impl PlanCatalog {
    pub const DEFAULT_CURRENCY: &'static str = "INR";
    pub const DEFAULT_MONTHLY_PRICE_MINOR: i64 = 9_900;
    pub const DEFAULT_YEARLY_PRICE_MINOR: i64 = 99_900;

    /// Creates a catalog for a single ISO currency.
    pub fn new(currency: impl Into<String>, monthly_minor: i64, yearly_minor: i64) -> Self {
        Self {
            currency: currency.into().to_uppercase(),
            monthly: PlanDetails {
                amount_minor: monthly_minor,
                label: "premium_monthly",
            },
            yearly: PlanDetails {
                amount_minor: yearly_minor,
                label: "premium_yearly",
            },
        }
    }

    /// Looks up price and label for a plan.
    pub fn details(&self, plan: PlanType) -> &PlanDetails {
        match plan {
            PlanType::Monthly => &self.monthly,
            PlanType::Yearly => &self.yearly,
        }
    }

    /// The only currency payments are accepted in.
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_CURRENCY,
            Self::DEFAULT_MONTHLY_PRICE_MINOR,
            Self::DEFAULT_YEARLY_PRICE_MINOR,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_type_parses_known_values() {
        assert_eq!("monthly".parse::<PlanType>().unwrap(), PlanType::Monthly);
        assert_eq!("yearly".parse::<PlanType>().unwrap(), PlanType::Yearly);
    }

    #[test]
    fn plan_type_rejects_unknown_and_mixed_case() {
        assert!("weekly".parse::<PlanType>().is_err());
        assert!("Monthly".parse::<PlanType>().is_err());
        assert!("".parse::<PlanType>().is_err());
    }

    #[test]
    fn plan_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlanType::Yearly).unwrap(), "\"yearly\"");
    }

    #[test]
    fn period_months_match_cadence() {
        assert_eq!(PlanType::Monthly.period_months(), 1);
        assert_eq!(PlanType::Yearly.period_months(), 12);
    }

    #[test]
    fn catalog_labels_are_fixed() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.details(PlanType::Monthly).label, "premium_monthly");
        assert_eq!(catalog.details(PlanType::Yearly).label, "premium_yearly");
    }

    #[test]
    fn catalog_normalizes_currency_case() {
        let catalog = PlanCatalog::new("inr", 100, 1000);
        assert_eq!(catalog.currency(), "INR");
        assert_eq!(catalog.details(PlanType::Monthly).amount_minor, 100);
        assert_eq!(catalog.details(PlanType::Yearly).amount_minor, 1000);
    }
}
