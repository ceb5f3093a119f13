use serde::{Deserialize, Serialize};

use super::domain::{
    require_name, require_non_negative, ActivityChanges, ActivityId, BookingError, DestinationId,
    Money, NewActivity,
};

/// Seat availability of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityState {
    Open,
    Full,
}

/// Bookable unit offered at (at most) one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub description: String,
    pub cost: Money,
    pub capacity: u32,
    pub remaining: u32,
    pub destination: Option<DestinationId>,
}

impl Activity {
    pub fn new(id: ActivityId, draft: NewActivity) -> Result<Self, BookingError> {
        let name = require_name("activity name", &draft.name)?;
        let cost = require_non_negative("activity cost", draft.cost)?;
        if draft.capacity == 0 {
            return Err(BookingError::invalid("activity capacity must be at least 1"));
        }

        Ok(Self {
            id,
            name,
            description: draft.description.trim().to_string(),
            cost,
            capacity: draft.capacity,
            remaining: draft.capacity,
            destination: None,
        })
    }

    pub fn state(&self) -> CapacityState {
        if self.remaining == 0 {
            CapacityState::Full
        } else {
            CapacityState::Open
        }
    }

    /// Seats currently taken.
    pub fn booked(&self) -> u32 {
        self.capacity - self.remaining
    }

    pub(crate) fn ensure_open(&self) -> Result<(), BookingError> {
        match self.state() {
            CapacityState::Open => Ok(()),
            CapacityState::Full => Err(BookingError::CapacityExceeded { activity: self.id }),
        }
    }

    /// Take one seat. Callers reject full activities before selecting.
    pub(crate) fn select(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Release one seat, never above capacity.
    pub(crate) fn unselect(&mut self) {
        if self.remaining < self.capacity {
            self.remaining += 1;
        }
    }

    pub(crate) fn apply(&mut self, changes: ActivityChanges) -> Result<(), BookingError> {
        let name = changes
            .name
            .map(|name| require_name("activity name", &name))
            .transpose()?;
        let cost = changes
            .cost
            .map(|cost| require_non_negative("activity cost", cost))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        if let Some(cost) = cost {
            self.cost = cost;
        }
        Ok(())
    }
}
