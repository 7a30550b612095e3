//! Domain models for nursenotes.
//!
//! Notes and profiles are the two durable entities. Categories and study
//! years are closed label sets: the catalog filters on equality against
//! them, so free-form strings are rejected at the edge.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// CATEGORY / STUDY YEAR LABEL SETS
// =============================================================================

/// Subject category of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Anatomy,
    Physiology,
    Pathology,
    Pharmacology,
    #[serde(rename = "Clinical Medicine")]
    ClinicalMedicine,
    Surgery,
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 7] = [
        Category::Anatomy,
        Category::Physiology,
        Category::Pathology,
        Category::Pharmacology,
        Category::ClinicalMedicine,
        Category::Surgery,
        Category::Other,
    ];

    /// The label stored in the database and shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anatomy => "Anatomy",
            Category::Physiology => "Physiology",
            Category::Pathology => "Pathology",
            Category::Pharmacology => "Pharmacology",
            Category::ClinicalMedicine => "Clinical Medicine",
            Category::Surgery => "Surgery",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::Validation(format!("Unknown category: '{}'", s)))
    }
}

/// Study year of the uploader the note targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyYear {
    #[serde(rename = "1st Year")]
    First,
    #[serde(rename = "2nd Year")]
    Second,
    #[serde(rename = "3rd Year")]
    Third,
    #[serde(rename = "4th Year")]
    Fourth,
    #[serde(rename = "5th Year")]
    Fifth,
    #[serde(rename = "6th Year")]
    Sixth,
}

impl StudyYear {
    /// All study years in display order.
    pub const ALL: [StudyYear; 6] = [
        StudyYear::First,
        StudyYear::Second,
        StudyYear::Third,
        StudyYear::Fourth,
        StudyYear::Fifth,
        StudyYear::Sixth,
    ];

    /// The label stored in the database and shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyYear::First => "1st Year",
            StudyYear::Second => "2nd Year",
            StudyYear::Third => "3rd Year",
            StudyYear::Fourth => "4th Year",
            StudyYear::Fifth => "5th Year",
            StudyYear::Sixth => "6th Year",
        }
    }
}

impl fmt::Display for StudyYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudyYear::ALL
            .iter()
            .find(|y| y.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::Validation(format!("Unknown study year: '{}'", s)))
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// A shared study note as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub year: Option<StudyYear>,
    /// Public URL of the stored file.
    pub file_url: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A note as listed in the catalog, joined with the uploader's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub year: Option<StudyYear>,
    pub file_url: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Uploader's full name; None when the profile has no name set.
    pub uploader_name: Option<String>,
}

/// Request for inserting a note row once its file is already stored.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub year: StudyYear,
    pub file_url: String,
    pub user_id: Uuid,
}

// =============================================================================
// PROFILES
// =============================================================================

/// A user's public profile. Shares its id with the authenticating user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Request for updating one's own profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

// =============================================================================
// CONTACT MESSAGES
// =============================================================================

/// A message submitted through the contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Request for submitting a contact message.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactMessageRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

// =============================================================================
// AUTH
// =============================================================================

/// An authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// A live session: the identity plus its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    /// Opaque bearer token presented on subsequent requests.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Credentials for sign-up and sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in Category::ALL {
            let parsed: Category = cat.as_str().parse().unwrap();
            assert_eq!(parsed, cat);
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        let parsed: Category = "clinical medicine".parse().unwrap();
        assert_eq!(parsed, Category::ClinicalMedicine);
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        let result = "Astrology".parse::<Category>();
        assert!(result.is_err());
    }

    #[test]
    fn test_study_year_round_trip() {
        for year in StudyYear::ALL {
            let parsed: StudyYear = year.as_str().parse().unwrap();
            assert_eq!(parsed, year);
        }
    }

    #[test]
    fn test_study_year_serde_uses_display_label() {
        let json = serde_json::to_string(&StudyYear::Second).unwrap();
        assert_eq!(json, "\"2nd Year\"");
        let back: StudyYear = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StudyYear::Second);
    }

    #[test]
    fn test_category_serde_uses_display_label() {
        let json = serde_json::to_string(&Category::ClinicalMedicine).unwrap();
        assert_eq!(json, "\"Clinical Medicine\"");
    }

    #[test]
    fn test_note_summary_serializes_nullable_uploader() {
        let summary = NoteSummary {
            id: Uuid::nil(),
            title: "Cardio Basics".to_string(),
            description: None,
            category: Category::Pathology,
            year: Some(StudyYear::Second),
            file_url: "https://files.example/notes/x.pdf".to_string(),
            user_id: Uuid::nil(),
            created_at: Utc::now(),
            uploader_name: None,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["uploader_name"].is_null());
        assert_eq!(value["category"], "Pathology");
    }
}
