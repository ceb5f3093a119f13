use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing::Tier;

/// Monetary amounts are exact decimals so tier discounts never drift.
pub type Money = Decimal;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }
    };
}

entity_id!(
    /// Store-assigned identifier of an activity.
    ActivityId,
    "activity"
);
entity_id!(
    /// Store-assigned identifier of a destination.
    DestinationId,
    "destination"
);
entity_id!(
    /// Store-assigned identifier of a passenger.
    PassengerId,
    "passenger"
);
entity_id!(
    /// Store-assigned identifier of a travel package.
    PackageId,
    "travel package"
);

/// The four aggregate kinds the store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Activity,
    Destination,
    Passenger,
    Package,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Activity => "activity",
            EntityKind::Destination => "destination",
            EntityKind::Passenger => "passenger",
            EntityKind::Package => "travel package",
        }
    }
}

/// Typed pointer to any stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Activity(ActivityId),
    Destination(DestinationId),
    Passenger(PassengerId),
    Package(PackageId),
}

impl EntityRef {
    pub const fn kind(self) -> EntityKind {
        match self {
            EntityRef::Activity(_) => EntityKind::Activity,
            EntityRef::Destination(_) => EntityKind::Destination,
            EntityRef::Passenger(_) => EntityKind::Passenger,
            EntityRef::Package(_) => EntityKind::Package,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Activity(id) => id.fmt(f),
            EntityRef::Destination(id) => id.fmt(f),
            EntityRef::Passenger(id) => id.fmt(f),
            EntityRef::Package(id) => id.fmt(f),
        }
    }
}

impl From<ActivityId> for EntityRef {
    fn from(value: ActivityId) -> Self {
        Self::Activity(value)
    }
}

impl From<DestinationId> for EntityRef {
    fn from(value: DestinationId) -> Self {
        Self::Destination(value)
    }
}

impl From<PassengerId> for EntityRef {
    fn from(value: PassengerId) -> Self {
        Self::Passenger(value)
    }
}

impl From<PackageId> for EntityRef {
    fn from(value: PackageId) -> Self {
        Self::Package(value)
    }
}

/// Fields required to create an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: Money,
    pub capacity: u32,
}

/// Partial update for an activity. Capacity is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDestination {
    pub name: String,
    #[serde(default)]
    pub activity_ids: Vec<ActivityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationChanges {
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields required to enrol a passenger. Premium passengers must start at a zero balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPassenger {
    pub name: String,
    pub number: String,
    pub tier: Tier,
    #[serde(default)]
    pub balance: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub balance: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPackage {
    pub name: String,
    pub passenger_capacity: u32,
    #[serde(default)]
    pub destination_ids: Vec<DestinationId>,
    #[serde(default)]
    pub passenger_ids: Vec<PassengerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub passenger_capacity: Option<u32>,
}

/// Business-rule failures. Each one leaves the stored state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(EntityRef),
    #[error("{activity} has no remaining capacity")]
    CapacityExceeded { activity: ActivityId },
    #[error("{passenger} cannot afford {required} (balance {available})")]
    InsufficientBalance {
        passenger: PassengerId,
        required: Money,
        available: Money,
    },
    #[error("{passenger} is not signed up for {activity}")]
    NotSignedUp {
        passenger: PassengerId,
        activity: ActivityId,
    },
    #[error("{member} is already associated with {owner}")]
    AlreadyAssociated { member: EntityRef, owner: EntityRef },
    #[error("{member} is not associated with {owner}")]
    NotAssociated { member: EntityRef, owner: EntityRef },
    #[error("{package} is full ({capacity} passengers)")]
    PackageFull { package: PackageId, capacity: u32 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl BookingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub(crate) fn require_name(field: &str, value: &str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::invalid(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_non_negative(field: &str, value: Money) -> Result<Money, BookingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(BookingError::invalid(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_refs_render_with_kind_labels() {
        assert_eq!(EntityRef::from(ActivityId(4)).to_string(), "activity 4");
        assert_eq!(EntityRef::from(PackageId(1)).to_string(), "travel package 1");
        assert_eq!(
            EntityRef::from(PassengerId(9)).kind(),
            EntityKind::Passenger
        );
    }

    #[test]
    fn validation_helpers_reject_blank_and_negative_values() {
        assert_eq!(require_name("name", "  Goa ").expect("valid"), "Goa");
        assert!(matches!(
            require_name("name", "   "),
            Err(BookingError::InvalidArgument(_))
        ));
        assert!(require_non_negative("cost", Decimal::new(-1, 0)).is_err());
        assert_eq!(
            require_non_negative("cost", Decimal::ZERO).expect("zero allowed"),
            Decimal::ZERO
        );
    }
}
