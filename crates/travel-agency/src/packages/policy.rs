use serde::{Deserialize, Serialize};

/// Which amount a cancellation credits back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    /// Refund exactly what was charged at sign-up.
    #[default]
    PricePaid,
    /// Re-price the activity at its current cost using the passenger's tier.
    CurrentCost,
}

impl RefundPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "price_paid" | "paid" => Some(Self::PricePaid),
            "current_cost" | "current" => Some(Self::CurrentCost),
            _ => None,
        }
    }
}

/// Whether a package's passenger capacity limits enrolment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageCapacityPolicy {
    #[default]
    Enforced,
    Advisory,
}

impl PackageCapacityPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enforced" | "enforce" => Some(Self::Enforced),
            "advisory" | "informational" => Some(Self::Advisory),
            _ => None,
        }
    }
}

/// Engine-wide knobs, loaded from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    pub refund: RefundPolicy,
    pub package_capacity: PackageCapacityPolicy,
}
