use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value held in both site languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual<T> {
    pub sv: T,
    pub en: T,
}

impl<T> Bilingual<T> {
    pub fn new(sv: T, en: T) -> Self {
        Self { sv, en }
    }
}

/// Lifecycle state of a portfolio project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Done,
    Paused,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Active,
        ProjectStatus::Done,
        ProjectStatus::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Done => "done",
            ProjectStatus::Paused => "paused",
        }
    }

    /// Parse a status from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "done" => Some(ProjectStatus::Done),
            "paused" => Some(ProjectStatus::Paused),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External links of a project. Serialized only when at least one is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<String>,
}

/// Frontmatter of `projects/<slug>.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFrontmatter {
    pub title: Bilingual<String>,
    pub description: Bilingual<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub year: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stack: Vec<String>,
    pub cover_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Bilingual<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ProjectLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_bullets: Option<Bilingual<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery_images: Vec<String>,
}

/// Frontmatter of `updates/<date>-<slug>.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFrontmatter {
    pub title: Bilingual<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Flat form payload submitted by the project editor.
///
/// The same shape is returned when a stored project is read back for editing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_sv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_sv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_sv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_link: Option<String>,
    #[serde(default, rename = "coverImage", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, rename = "galleryImages", skip_serializing_if = "Option::is_none")]
    pub gallery_images: Option<Vec<String>>,
    #[serde(default, rename = "highlightBullets_sv", skip_serializing_if = "Option::is_none")]
    pub highlight_bullets_sv: Option<Vec<String>>,
    #[serde(default, rename = "highlightBullets_en", skip_serializing_if = "Option::is_none")]
    pub highlight_bullets_en: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Flat form payload submitted by the update editor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_sv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A parsed markdown document: frontmatter plus free-form body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<F> {
    pub frontmatter: F,
    pub body: String,
}
