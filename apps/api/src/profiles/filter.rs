use serde::Deserialize;

use crate::errors::AppError;
use crate::models::profile::{Availability, ProfileRow};

/// Browse criteria, accepted both as a query string and as a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFilter {
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub interest: Option<String>,
    pub activity: Option<String>,
    pub availability: Option<String>,
}

/// A filter with blanks dropped, needles lowercased and availability parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    city: Option<String>,
    neighborhood: Option<String>,
    interest: Option<String>,
    activity: Option<String>,
    availability: Option<Availability>,
}

impl ProfileFilter {
    pub fn compile(&self) -> Result<CompiledFilter, AppError> {
        let availability = match needle(&self.availability) {
            Some(a) => Some(a.parse::<Availability>().map_err(AppError::Validation)?),
            None => None,
        };
        Ok(CompiledFilter {
            city: needle(&self.city),
            neighborhood: needle(&self.neighborhood),
            interest: needle(&self.interest),
            activity: needle(&self.activity),
            availability,
        })
    }
}

fn needle(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn any_tag_contains(tags: &[String], needle: &str) -> bool {
    tags.iter().any(|t| t.to_lowercase().contains(needle))
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        *self == CompiledFilter::default()
    }

    pub fn matches(&self, profile: &ProfileRow) -> bool {
        if let Some(city) = &self.city {
            if !contains_ci(profile.city.as_deref(), city) {
                return false;
            }
        }
        if let Some(hood) = &self.neighborhood {
            if !contains_ci(profile.neighborhood.as_deref(), hood) {
                return false;
            }
        }
        if let Some(interest) = &self.interest {
            if !any_tag_contains(&profile.interests, interest) {
                return false;
            }
        }
        if let Some(activity) = &self.activity {
            if !any_tag_contains(&profile.activities, activity) {
                return false;
            }
        }
        if let Some(wanted) = self.availability {
            match profile.availability() {
                Some(have) if have.covers(wanted) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply(&self, profiles: Vec<ProfileRow>) -> Vec<ProfileRow> {
        if self.is_empty() {
            return profiles;
        }
        profiles.into_iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(
        name: &str,
        city: Option<&str>,
        hood: Option<&str>,
        availability: Option<&str>,
        interests: &[&str],
        activities: &[&str],
    ) -> ProfileRow {
        ProfileRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bio: None,
            city: city.map(String::from),
            neighborhood: hood.map(String::from),
            availability: availability.map(String::from),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            activities: activities.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample() -> Vec<ProfileRow> {
        vec![
            profile(
                "Alice",
                Some("San Francisco"),
                Some("Mission"),
                Some("weekend"),
                &["Hiking", "reading"],
                &["coffee"],
            ),
            profile(
                "Bob",
                Some("San Francisco"),
                Some("Sunset"),
                Some("both"),
                &["hiking", "music"],
                &["concerts"],
            ),
            profile("Charlie", Some("Oakland"), None, Some("weekday"), &["tech"], &["gaming"]),
            profile("Dana", None, None, None, &[], &[]),
        ]
    }

    fn names(profiles: &[ProfileRow]) -> Vec<&str> {
        profiles.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let f = ProfileFilter::default().compile().unwrap();
        assert!(f.is_empty());
        assert_eq!(f.apply(sample()).len(), 4);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let f = ProfileFilter {
            city: Some("  ".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert!(f.is_empty());
    }

    #[test]
    fn test_city_is_case_insensitive_substring() {
        let f = ProfileFilter {
            city: Some("francisco".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(names(&f.apply(sample())), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_interest_matches_any_tag() {
        let f = ProfileFilter {
            interest: Some("HIK".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(names(&f.apply(sample())), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_availability_both_covers_weekend() {
        let f = ProfileFilter {
            availability: Some("weekend".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(names(&f.apply(sample())), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let f = ProfileFilter {
            city: Some("san francisco".to_string()),
            neighborhood: Some("sun".to_string()),
            activity: Some("concert".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(names(&f.apply(sample())), vec!["Bob"]);
    }

    #[test]
    fn test_missing_field_never_matches_a_criterion() {
        let f = ProfileFilter {
            neighborhood: Some("a".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert!(!f.matches(&sample()[3]));
    }

    #[test]
    fn test_invalid_availability_is_rejected() {
        let res = ProfileFilter {
            availability: Some("sometimes".to_string()),
            ..Default::default()
        }
        .compile();
        assert!(matches!(res, Err(AppError::Validation(_))));
    }
}
