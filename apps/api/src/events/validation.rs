use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::validation::{nullable, optional_text};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Body of `POST /api/events`. `event_date` is RFC 3339.
#[derive(Debug, Default, Deserialize)]
pub struct CreateEventRequest {
    pub created_by: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
    pub max_participants: Option<i32>,
    pub category: Option<String>,
}

/// Body of `PUT /api/events/:id`. Same rules as profile updates: absent
/// fields are kept, an empty string clears optional text. An explicit
/// `"max_participants": null` removes the cap.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_participants: Option<Option<i32>>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub created_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub event_date: Option<DateTime<Utc>>,
    pub max_participants: Option<Option<i32>>,
    pub category: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Interested,
    Confirmed,
    Declined,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Interested => "interested",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Declined => "declined",
        }
    }

    /// Whether this RSVP takes up a place.
    pub fn occupies_spot(&self) -> bool {
        !matches!(self, ParticipantStatus::Declined)
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interested" => Ok(ParticipantStatus::Interested),
            "confirmed" => Ok(ParticipantStatus::Confirmed),
            "declined" => Ok(ParticipantStatus::Declined),
            _ => Err("status must be one of: interested, confirmed, declined".to_string()),
        }
    }
}

/// RSVP status of a join request; `interested` when omitted.
pub fn parse_rsvp(raw: Option<&str>) -> Result<ParticipantStatus, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ParticipantStatus::Interested),
        Some(s) => s.parse().map_err(AppError::Validation),
    }
}

pub fn validate_new_event(req: CreateEventRequest) -> Result<NewEvent, AppError> {
    let created_by = req
        .created_by
        .ok_or_else(|| AppError::Validation("created_by is required".to_string()))?;
    let title = validate_title(req.title.as_deref().unwrap_or(""))?;
    let event_date = match req.event_date.as_deref() {
        Some(raw) => parse_event_date(raw)?,
        None => return Err(AppError::Validation("event_date is required".to_string())),
    };

    Ok(NewEvent {
        created_by,
        title,
        description: optional_text(req.description.as_deref(), "description", MAX_DESCRIPTION_LEN)?,
        location: optional_text(req.location.as_deref(), "location", MAX_LOCATION_LEN)?,
        event_date,
        max_participants: req.max_participants.map(validate_capacity).transpose()?,
        category: optional_text(req.category.as_deref(), "category", MAX_CATEGORY_LEN)?,
    })
}

pub fn validate_event_update(req: UpdateEventRequest) -> Result<EventChanges, AppError> {
    Ok(EventChanges {
        title: req.title.as_deref().map(validate_title).transpose()?,
        description: req
            .description
            .as_deref()
            .map(|d| optional_text(Some(d), "description", MAX_DESCRIPTION_LEN))
            .transpose()?,
        location: req
            .location
            .as_deref()
            .map(|l| optional_text(Some(l), "location", MAX_LOCATION_LEN))
            .transpose()?,
        event_date: req.event_date.as_deref().map(parse_event_date).transpose()?,
        max_participants: req
            .max_participants
            .map(|cap| cap.map(validate_capacity).transpose())
            .transpose()?,
        category: req
            .category
            .as_deref()
            .map(|c| optional_text(Some(c), "category", MAX_CATEGORY_LEN))
            .transpose()?,
    })
}

fn validate_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Validation(format!("event_date '{raw}' is not an RFC 3339 timestamp"))
        })
}

fn validate_capacity(max: i32) -> Result<i32, AppError> {
    if max <= 0 {
        return Err(AppError::Validation(
            "max_participants must be greater than 0".to_string(),
        ));
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_req() -> CreateEventRequest {
        CreateEventRequest {
            created_by: Some(Uuid::new_v4()),
            title: Some("  Board game night ".to_string()),
            description: Some("".to_string()),
            location: Some("Mission branch library".to_string()),
            event_date: Some("2026-11-20T18:30:00-08:00".to_string()),
            max_participants: Some(8),
            category: Some("games".to_string()),
        }
    }

    #[test]
    fn test_valid_event_is_normalized() {
        let event = validate_new_event(create_req()).unwrap();
        assert_eq!(event.title, "Board game night");
        assert_eq!(event.description, None);
        assert_eq!(
            event.event_date,
            Utc.with_ymd_and_hms(2026, 11, 21, 2, 30, 0).unwrap()
        );
        assert_eq!(event.max_participants, Some(8));
    }

    #[test]
    fn test_title_and_date_are_required() {
        let mut req = create_req();
        req.title = Some("   ".to_string());
        assert!(validate_new_event(req).is_err());

        let mut req = create_req();
        req.event_date = None;
        let err = validate_new_event(req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("event_date")));

        let mut req = create_req();
        req.created_by = None;
        assert!(validate_new_event(req).is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let mut req = create_req();
        req.event_date = Some("next friday".to_string());
        let err = validate_new_event(req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("RFC 3339")));
    }

    #[test]
    fn test_capacity_must_be_positive() {
        let mut req = create_req();
        req.max_participants = Some(0);
        assert!(validate_new_event(req).is_err());

        let update = UpdateEventRequest {
            max_participants: Some(Some(-3)),
            ..Default::default()
        };
        assert!(validate_event_update(update).is_err());
    }

    #[test]
    fn test_update_cap_can_be_set_or_removed() {
        let req: UpdateEventRequest =
            serde_json::from_str(r#"{"max_participants": null}"#).unwrap();
        assert_eq!(validate_event_update(req).unwrap().max_participants, Some(None));

        let req: UpdateEventRequest = serde_json::from_str(r#"{"max_participants": 12}"#).unwrap();
        assert_eq!(validate_event_update(req).unwrap().max_participants, Some(Some(12)));

        let req: UpdateEventRequest = serde_json::from_str(r#"{"title": "Hike"}"#).unwrap();
        assert_eq!(validate_event_update(req).unwrap().max_participants, None);
    }

    #[test]
    fn test_update_keeps_absent_and_clears_empty() {
        let changes = validate_event_update(UpdateEventRequest {
            location: Some("".to_string()),
            category: Some("outdoors".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.description, None);
        assert_eq!(changes.location, Some(None));
        assert_eq!(changes.category, Some(Some("outdoors".to_string())));
    }

    #[test]
    fn test_rsvp_defaults_to_interested() {
        assert_eq!(parse_rsvp(None).unwrap(), ParticipantStatus::Interested);
        assert_eq!(parse_rsvp(Some("")).unwrap(), ParticipantStatus::Interested);
        assert_eq!(parse_rsvp(Some("Confirmed")).unwrap(), ParticipantStatus::Confirmed);
        assert!(parse_rsvp(Some("maybe")).is_err());
    }

    #[test]
    fn test_declined_takes_no_spot() {
        assert!(ParticipantStatus::Interested.occupies_spot());
        assert!(ParticipantStatus::Confirmed.occupies_spot());
        assert!(!ParticipantStatus::Declined.occupies_spot());
    }
}
