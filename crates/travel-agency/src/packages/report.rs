use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::activity::Activity;
use super::domain::{ActivityId, DestinationId, Money, PackageId, PassengerId};
use super::passenger::Passenger;
use super::pricing::Tier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLine {
    pub activity_id: ActivityId,
    pub name: String,
    pub description: String,
    pub cost: Money,
    pub capacity: u32,
    pub remaining: u32,
}

impl From<&Activity> for ActivityLine {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id,
            name: activity.name.clone(),
            description: activity.description.clone(),
            cost: activity.cost,
            capacity: activity.capacity,
            remaining: activity.remaining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationItinerary {
    pub destination_id: DestinationId,
    pub name: String,
    pub activities: Vec<ActivityLine>,
}

/// Everything a package offers, destination by destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItineraryView {
    pub package_id: PackageId,
    pub name: String,
    pub destinations: Vec<DestinationItinerary>,
}

impl fmt::Display for ItineraryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Itinerary for {}", self.name)?;
        for destination in &self.destinations {
            writeln!(f, "- {}", destination.name)?;
            for activity in &destination.activities {
                writeln!(
                    f,
                    "  - {}: {} (cost {}, {}/{} seats left)",
                    activity.name,
                    activity.description,
                    activity.cost,
                    activity.remaining,
                    activity.capacity
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub passenger_id: PassengerId,
    pub name: String,
    pub number: String,
}

impl From<&Passenger> for ManifestEntry {
    fn from(passenger: &Passenger) -> Self {
        Self {
            passenger_id: passenger.id,
            name: passenger.name.clone(),
            number: passenger.number.clone(),
        }
    }
}

/// Who is enrolled in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestView {
    pub package_id: PackageId,
    pub name: String,
    pub passenger_capacity: u32,
    pub enrolled: usize,
    pub passengers: Vec<ManifestEntry>,
}

impl fmt::Display for ManifestView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Passengers of {} ({}/{} enrolled)",
            self.name, self.enrolled, self.passenger_capacity
        )?;
        for passenger in &self.passengers {
            writeln!(f, "- {} [{}]", passenger.name, passenger.number)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub activity_id: ActivityId,
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub price_paid: Money,
    pub booked_at: DateTime<Utc>,
}

/// A passenger's account: balance and held activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementView {
    pub passenger_id: PassengerId,
    pub name: String,
    pub number: String,
    pub tier: Tier,
    /// Absent for premium passengers, whose balance plays no part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Money>,
    pub activities: Vec<StatementLine>,
}

impl StatementView {
    pub(crate) fn new(passenger: &Passenger, activities: Vec<StatementLine>) -> Self {
        Self {
            passenger_id: passenger.id,
            name: passenger.name.clone(),
            number: passenger.number.clone(),
            tier: passenger.tier,
            balance: passenger.tier.tracks_balance().then_some(passenger.balance),
            activities,
        }
    }
}

impl fmt::Display for StatementView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}], {} tier", self.name, self.number, self.tier.label())?;
        if let Some(balance) = self.balance {
            writeln!(f, "Balance: {balance}")?;
        }
        if self.activities.is_empty() {
            return writeln!(f, "No activities booked");
        }
        for line in &self.activities {
            match &line.destination {
                Some(destination) => writeln!(
                    f,
                    "- {} at {} (paid {})",
                    line.activity, destination, line.price_paid
                )?,
                None => writeln!(f, "- {} (paid {})", line.activity, line.price_paid)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityLine {
    pub activity_id: ActivityId,
    pub activity: String,
    pub destination: String,
    pub cost: Money,
    pub remaining: u32,
}

/// Activities in a package that can still be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityView {
    pub package_id: PackageId,
    pub name: String,
    pub activities: Vec<AvailabilityLine>,
}

impl fmt::Display for AvailabilityView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Open activities in {}", self.name)?;
        if self.activities.is_empty() {
            return writeln!(f, "- none");
        }
        for line in &self.activities {
            writeln!(
                f,
                "- {} at {}: {} seats left (cost {})",
                line.activity, line.destination, line.remaining, line.cost
            )?;
        }
        Ok(())
    }
}
