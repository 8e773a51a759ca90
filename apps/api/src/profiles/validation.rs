use std::collections::HashSet;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::profile::Availability;
use crate::validation::optional_text;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_BIO_LEN: usize = 1000;
pub const MAX_PLACE_LEN: usize = 100;
pub const MAX_TAGS: usize = 30;
pub const MAX_TAG_LEN: usize = 50;

/// Body of `POST /api/profiles`. Every field is optional at the wire level so
/// that a missing name surfaces as a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub availability: Option<String>,
    pub interests: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
}

/// Body of `PUT /api/profiles/:id`. Absent (or null) fields are left as they
/// are; an empty string clears an optional text field.
pub type UpdateProfileRequest = CreateProfileRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub name: String,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub availability: Option<Availability>,
    pub interests: Vec<String>,
    pub activities: Vec<String>,
}

/// A validated partial update. `Some(None)` clears a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub neighborhood: Option<Option<String>>,
    pub availability: Option<Option<Availability>>,
    pub interests: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
}

pub fn validate_new_profile(req: CreateProfileRequest) -> Result<NewProfile, AppError> {
    let name = validate_name(req.name.as_deref().unwrap_or(""))?;
    Ok(NewProfile {
        name,
        bio: optional_text(req.bio.as_deref(), "bio", MAX_BIO_LEN)?,
        city: optional_text(req.city.as_deref(), "city", MAX_PLACE_LEN)?,
        neighborhood: optional_text(req.neighborhood.as_deref(), "neighborhood", MAX_PLACE_LEN)?,
        availability: parse_availability(req.availability.as_deref())?,
        interests: normalize_tags(req.interests.as_deref().unwrap_or(&[]), "interests")?,
        activities: normalize_tags(req.activities.as_deref().unwrap_or(&[]), "activities")?,
    })
}

pub fn validate_profile_update(req: UpdateProfileRequest) -> Result<ProfileChanges, AppError> {
    Ok(ProfileChanges {
        name: req.name.as_deref().map(validate_name).transpose()?,
        bio: req
            .bio
            .as_deref()
            .map(|b| optional_text(Some(b), "bio", MAX_BIO_LEN))
            .transpose()?,
        city: req
            .city
            .as_deref()
            .map(|c| optional_text(Some(c), "city", MAX_PLACE_LEN))
            .transpose()?,
        neighborhood: req
            .neighborhood
            .as_deref()
            .map(|n| optional_text(Some(n), "neighborhood", MAX_PLACE_LEN))
            .transpose()?,
        availability: req
            .availability
            .as_deref()
            .map(|a| parse_availability(Some(a)))
            .transpose()?,
        interests: req
            .interests
            .as_deref()
            .map(|t| normalize_tags(t, "interests"))
            .transpose()?,
        activities: req
            .activities
            .as_deref()
            .map(|t| normalize_tags(t, "activities"))
            .transpose()?,
    })
}

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn parse_availability(raw: Option<&str>) -> Result<Option<Availability>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(AppError::Validation),
    }
}

/// Trims tags, drops blanks and collapses case-insensitive duplicates,
/// keeping the first spelling seen.
pub fn normalize_tags(raw: &[String], field: &str) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::Validation(format!(
                "each entry in {field} must be at most {MAX_TAG_LEN} characters"
            )));
        }
        if seen.insert(tag.to_lowercase()) {
            tags.push(tag.to_string());
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "{field} may contain at most {MAX_TAGS} entries"
        )));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = validate_new_profile(CreateProfileRequest::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Name is required"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let req = CreateProfileRequest {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_new_profile(req).is_err());
    }

    #[test]
    fn test_fields_are_trimmed_and_blanks_become_none() {
        let req = CreateProfileRequest {
            name: Some("  Alice ".to_string()),
            bio: Some("  Love hiking  ".to_string()),
            city: Some("   ".to_string()),
            neighborhood: None,
            availability: Some("weekends".to_string()),
            interests: Some(strings(&["hiking", " Music ", ""])),
            activities: None,
        };
        let p = validate_new_profile(req).unwrap();
        assert_eq!(p.name, "Alice");
        assert_eq!(p.bio.as_deref(), Some("Love hiking"));
        assert_eq!(p.city, None);
        assert_eq!(p.availability, Some(Availability::Weekend));
        assert_eq!(p.interests, strings(&["hiking", "Music"]));
        assert!(p.activities.is_empty());
    }

    #[test]
    fn test_unknown_availability_is_rejected() {
        let req = CreateProfileRequest {
            name: Some("Bob".to_string()),
            availability: Some("evenings".to_string()),
            ..Default::default()
        };
        assert!(validate_new_profile(req).is_err());
    }

    #[test]
    fn test_tags_dedupe_case_insensitively() {
        let tags = normalize_tags(&strings(&["Hiking", "hiking", "HIKING ", "music"]), "interests")
            .unwrap();
        assert_eq!(tags, strings(&["Hiking", "music"]));
    }

    #[test]
    fn test_too_many_tags_is_rejected() {
        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("tag{i}")).collect();
        assert!(normalize_tags(&many, "interests").is_err());
    }

    #[test]
    fn test_overlong_tag_is_rejected() {
        let long = "x".repeat(MAX_TAG_LEN + 1);
        assert!(normalize_tags(&[long], "activities").is_err());
    }

    #[test]
    fn test_update_leaves_absent_fields_alone() {
        let changes = validate_profile_update(UpdateProfileRequest {
            city: Some("Oakland".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.bio, None);
        assert_eq!(changes.city, Some(Some("Oakland".to_string())));
        assert_eq!(changes.interests, None);
    }

    #[test]
    fn test_update_empty_string_clears() {
        let changes = validate_profile_update(UpdateProfileRequest {
            bio: Some(String::new()),
            availability: Some(String::new()),
            interests: Some(vec![]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.bio, Some(None));
        assert_eq!(changes.availability, Some(None));
        assert_eq!(changes.interests, Some(vec![]));
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let res = validate_profile_update(UpdateProfileRequest {
            name: Some(" ".to_string()),
            ..Default::default()
        });
        assert!(res.is_err());
    }
}
