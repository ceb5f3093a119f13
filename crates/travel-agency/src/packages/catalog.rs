//! Seed destinations and activities from a CSV catalog.
//!
//! Expected headers: `Destination,Activity,Description,Cost,Capacity`. Every row is parsed
//! before anything is written, so a malformed file changes nothing. Rows are then committed one
//! at a time; a store failure part way through keeps the rows already imported.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::activity::Activity;
use super::destination::Destination;
use super::domain::{Money, NewActivity, NewDestination};
use super::repository::TravelRepository;
use super::service::{PackageServiceError, TravelPackageService};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: usize, message: String },
    Service(PackageServiceError),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Row { line, message } => {
                write!(f, "catalog line {}: {}", line, message)
            }
            CatalogImportError::Service(err) => {
                write!(f, "could not store catalog entry: {}", err)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
            CatalogImportError::Service(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<PackageServiceError> for CatalogImportError {
    fn from(err: PackageServiceError) -> Self {
        Self::Service(err)
    }
}

/// What an import created, in file order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSummary {
    pub destinations: Vec<Destination>,
    pub activities: Vec<Activity>,
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P, R>(
        path: P,
        service: &TravelPackageService<R>,
    ) -> Result<CatalogSummary, CatalogImportError>
    where
        P: AsRef<Path>,
        R: TravelRepository + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service)
    }

    /// Create the catalog's activities and attach them to destinations, reusing stored
    /// destinations whose name matches.
    pub fn from_reader<Rd, R>(
        reader: Rd,
        service: &TravelPackageService<R>,
    ) -> Result<CatalogSummary, CatalogImportError>
    where
        Rd: Read,
        R: TravelRepository + 'static,
    {
        let entries = parse_entries(reader)?;
        let mut known = service.destinations()?;
        let mut summary = CatalogSummary::default();

        for entry in entries {
            let activity = service.create_activity(entry.activity)?;
            let existing = known
                .iter()
                .find(|destination| destination.name.eq_ignore_ascii_case(&entry.destination))
                .map(|destination| destination.id);

            let destination = match existing {
                Some(id) => service.add_activity_to_destination(id, activity.id)?,
                None => service.create_destination(NewDestination {
                    name: entry.destination,
                    activity_ids: vec![activity.id],
                })?,
            };

            known.retain(|listed| listed.id != destination.id);
            known.push(destination.clone());
            summary
                .destinations
                .retain(|listed| listed.id != destination.id);
            summary.destinations.push(destination);
            summary.activities.push(service.activity(activity.id)?);
        }

        info!(
            destinations = summary.destinations.len(),
            activities = summary.activities.len(),
            "catalog imported"
        );
        Ok(summary)
    }
}

#[derive(Debug)]
struct CatalogEntry {
    destination: String,
    activity: NewActivity,
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Destination")]
    destination: String,
    #[serde(rename = "Activity")]
    activity: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Cost")]
    cost: String,
    #[serde(rename = "Capacity")]
    capacity: u32,
}

fn parse_entries<R: Read>(reader: R) -> Result<Vec<CatalogEntry>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, row) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let line = index + 2;
        let row = row?;
        if row.destination.is_empty() {
            return Err(CatalogImportError::Row {
                line,
                message: "destination is blank".to_string(),
            });
        }
        if row.activity.is_empty() {
            return Err(CatalogImportError::Row {
                line,
                message: "activity is blank".to_string(),
            });
        }
        if row.capacity == 0 {
            return Err(CatalogImportError::Row {
                line,
                message: "capacity must be at least 1".to_string(),
            });
        }

        let cost = parse_cost(&row.cost).ok_or_else(|| CatalogImportError::Row {
            line,
            message: format!("'{}' is not a non-negative amount", row.cost),
        })?;

        entries.push(CatalogEntry {
            destination: row.destination,
            activity: NewActivity {
                name: row.activity,
                description: row.description,
                cost,
                capacity: row.capacity,
            },
        });
    }

    Ok(entries)
}

/// Accepts plain amounts and thousands-grouped ones such as `4,500.50`.
fn parse_cost(raw: &str) -> Option<Money> {
    let raw = raw.trim();
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    if raw.contains('_') || fraction.is_some_and(|fraction| fraction.contains(',')) {
        return None;
    }

    let mut groups = whole.split(',');
    let lead = groups.next()?;
    if whole.contains(',') && (lead.is_empty() || lead.len() > 3) {
        return None;
    }
    if groups.any(|group| group.len() != 3) {
        return None;
    }

    let digits = whole.replace(',', "");
    let normalized = match fraction {
        Some(fraction) => format!("{digits}.{fraction}"),
        None => digits,
    };
    let value = Decimal::from_str(&normalized).ok()?;
    (!value.is_sign_negative() || value.is_zero()).then_some(value)
}
