use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A profile with its interest and activity tags aggregated into arrays.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub availability: Option<String>,
    pub interests: Vec<String>,
    pub activities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn availability(&self) -> Option<Availability> {
        self.availability.as_deref().and_then(|a| a.parse().ok())
    }
}

/// The short form embedded in connection listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub city: Option<String>,
}

impl From<&ProfileRow> for ProfileSummary {
    fn from(p: &ProfileRow) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            bio: p.bio.clone(),
            city: p.city.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Weekday,
    Weekend,
    Both,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Weekday => "weekday",
            Availability::Weekend => "weekend",
            Availability::Both => "both",
        }
    }

    /// `both` covers either half of the week; otherwise only an exact match.
    pub fn covers(&self, wanted: Availability) -> bool {
        *self == Availability::Both || *self == wanted
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekday" | "weekdays" => Ok(Availability::Weekday),
            "weekend" | "weekends" => Ok(Availability::Weekend),
            "both" => Ok(Availability::Both),
            other => Err(format!(
                "unknown availability '{other}' (expected weekday, weekend or both)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_parses_plural_and_case() {
        assert_eq!("Weekends".parse::<Availability>(), Ok(Availability::Weekend));
        assert_eq!(" weekday ".parse::<Availability>(), Ok(Availability::Weekday));
        assert_eq!("BOTH".parse::<Availability>(), Ok(Availability::Both));
        assert!("evenings".parse::<Availability>().is_err());
    }

    #[test]
    fn test_both_covers_everything() {
        assert!(Availability::Both.covers(Availability::Weekday));
        assert!(Availability::Both.covers(Availability::Weekend));
        assert!(Availability::Weekday.covers(Availability::Weekday));
        assert!(!Availability::Weekday.covers(Availability::Weekend));
        assert!(!Availability::Weekend.covers(Availability::Both));
    }
}
