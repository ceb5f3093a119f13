use serde::{Deserialize, Serialize};

use super::domain::{require_name, ActivityId, BookingError, DestinationChanges, DestinationId};

/// A place that exclusively owns the activities offered there.
///
/// Only the id list lives here; the matching back-reference sits on each
/// [`Activity`](super::activity::Activity) and the two are kept in step by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub name: String,
    pub activities: Vec<ActivityId>,
}

impl Destination {
    pub fn new(id: DestinationId, name: &str) -> Result<Self, BookingError> {
        Ok(Self {
            id,
            name: require_name("destination name", name)?,
            activities: Vec::new(),
        })
    }

    pub fn offers(&self, activity: ActivityId) -> bool {
        self.activities.contains(&activity)
    }

    /// Returns `false` when the activity was already listed.
    pub(crate) fn insert(&mut self, activity: ActivityId) -> bool {
        if self.offers(activity) {
            return false;
        }
        self.activities.push(activity);
        true
    }

    pub(crate) fn remove(&mut self, activity: ActivityId) -> bool {
        let before = self.activities.len();
        self.activities.retain(|listed| *listed != activity);
        before != self.activities.len()
    }

    pub(crate) fn apply(&mut self, changes: DestinationChanges) -> Result<(), BookingError> {
        if let Some(name) = changes.name {
            self.name = require_name("destination name", &name)?;
        }
        Ok(())
    }
}
