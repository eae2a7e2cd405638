//! Per-collection content schemas.
//!
//! A schema names the collection's required fields, its bilingual fields and
//! how a new document's identity is derived. The API handlers are generic
//! over [`ContentSchema`], so adding a collection means adding a schema.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ContentConfig;
use crate::content::mapper::{self, present, ProjectDefaults};
use crate::content::models::{
    Document, ProjectFrontmatter, ProjectPayload, ProjectStatus, UpdateFrontmatter, UpdatePayload,
};
use crate::content::slug::{dated_identity, parse_calendar_date, sanitize_slug};
use crate::error::{AppError, FieldError};

/// How the identity of a newly created document is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// The caller supplies a slug in `field`; it is sanitized before use.
    Slug { field: &'static str },
    /// `<YYYY-MM-DD>-<slugified title>`, from a date and a title field.
    DatedTitle {
        date_field: &'static str,
        title_field: &'static str,
    },
}

impl IdentityStrategy {
    /// The payload field that only matters when creating a document.
    pub fn create_only_field(&self) -> Option<&'static str> {
        match self {
            IdentityStrategy::Slug { field } => Some(*field),
            IdentityStrategy::DatedTitle { .. } => None,
        }
    }
}

/// When a nested bilingual value is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always emitted; a missing language becomes an empty value.
    Always,
    /// Emitted only when both languages are present.
    BothLanguages,
}

/// A `<name>_sv` / `<name>_en` pair nested as `<name>: {sv, en}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BilingualField {
    pub name: &'static str,
    pub presence: Presence,
}

/// Whether a payload is being validated for a new or an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Inputs the mapper needs beyond the payload itself.
#[derive(Debug, Clone)]
pub struct MappingContext<'a> {
    pub today: NaiveDate,
    pub content: &'a ContentConfig,
}

pub trait ContentSchema: Send + Sync + 'static {
    /// Directory under the content root, e.g. `projects`.
    const COLLECTION: &'static str;
    /// Singular name used in commit and error messages.
    const LABEL: &'static str;
    const REQUIRED_FIELDS: &'static [&'static str];
    const BILINGUAL_FIELDS: &'static [BilingualField];
    /// Whether `repo_link` / `live_link` nest into `links`.
    const HAS_LINKS: bool;
    const IDENTITY: IdentityStrategy;
    /// Body written on create when the payload has none.
    const DEFAULT_BODY: &'static str;

    type Payload: DeserializeOwned + Serialize + Send + Sync + 'static;
    type Frontmatter: DeserializeOwned + Serialize + Send + Sync;

    /// Look up a scalar text field by its form name.
    fn text_field<'a>(payload: &'a Self::Payload, name: &str) -> Option<&'a str>;

    /// Field checks beyond presence of the required fields.
    fn check_fields(payload: &Self::Payload) -> Vec<FieldError>;

    fn to_frontmatter(payload: &Self::Payload, ctx: &MappingContext<'_>) -> Self::Frontmatter;

    fn body(payload: &Self::Payload) -> Option<&str>;

    fn to_payload(document: Document<Self::Frontmatter>) -> Self::Payload;
}

/// Reject payloads with missing required fields or invalid values.
pub fn validate<S: ContentSchema>(payload: &S::Payload, op: Operation) -> Result<(), AppError> {
    let skip = match op {
        Operation::Create => None,
        Operation::Update => S::IDENTITY.create_only_field(),
    };

    let mut errors: Vec<FieldError> = S::REQUIRED_FIELDS
        .iter()
        .filter(|field| Some(**field) != skip)
        .filter(|field| {
            S::text_field(payload, field)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|field| FieldError::missing(field))
        .collect();

    let checks: Vec<FieldError> = S::check_fields(payload)
        .into_iter()
        .filter(|e| !errors.iter().any(|m| m.field == e.field))
        .collect();
    errors.extend(checks);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Derive the identity of a document about to be created.
pub fn derive_identity<S: ContentSchema>(payload: &S::Payload) -> Result<String, AppError> {
    match S::IDENTITY {
        IdentityStrategy::Slug { field } => {
            let slug = sanitize_slug(S::text_field(payload, field).unwrap_or_default());
            if slug.is_empty() {
                return Err(AppError::Validation(vec![FieldError::new(
                    field,
                    "must contain at least one letter or digit",
                )]));
            }
            Ok(slug)
        }
        IdentityStrategy::DatedTitle {
            date_field,
            title_field,
        } => {
            let date = S::text_field(payload, date_field)
                .and_then(parse_calendar_date)
                .ok_or_else(|| AppError::Validation(vec![invalid_date(date_field)]))?;
            let title = S::text_field(payload, title_field).unwrap_or_default();
            dated_identity(date, title).ok_or_else(|| {
                AppError::Validation(vec![FieldError::new(
                    title_field,
                    "must contain at least one letter or digit",
                )])
            })
        }
    }
}

/// Identities are always lower-case `[a-z0-9-]` with no leading or trailing hyphen.
pub fn is_valid_identity(identity: &str) -> bool {
    !identity.is_empty() && sanitize_slug(identity) == identity
}

fn invalid_date(field: &str) -> FieldError {
    FieldError::new(field, "must be a calendar date (YYYY-MM-DD)")
}

/// Portfolio projects: `projects/<slug>.md`.
pub struct Projects;

impl ContentSchema for Projects {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "project";
    const REQUIRED_FIELDS: &'static [&'static str] = &["slug", "title_sv", "title_en"];
    const BILINGUAL_FIELDS: &'static [BilingualField] = &[
        BilingualField { name: "title", presence: Presence::Always },
        BilingualField { name: "description", presence: Presence::Always },
        BilingualField { name: "role", presence: Presence::BothLanguages },
        BilingualField { name: "highlightBullets", presence: Presence::BothLanguages },
    ];
    const HAS_LINKS: bool = true;
    const IDENTITY: IdentityStrategy = IdentityStrategy::Slug { field: "slug" };
    const DEFAULT_BODY: &'static str = "# Project Content\n\nAdd your project description here...";

    type Payload = ProjectPayload;
    type Frontmatter = ProjectFrontmatter;

    fn text_field<'a>(payload: &'a ProjectPayload, name: &str) -> Option<&'a str> {
        match name {
            "slug" => payload.slug.as_deref(),
            "title_sv" => payload.title_sv.as_deref(),
            "title_en" => payload.title_en.as_deref(),
            "description_sv" => payload.description_sv.as_deref(),
            "description_en" => payload.description_en.as_deref(),
            "role_sv" => payload.role_sv.as_deref(),
            "role_en" => payload.role_en.as_deref(),
            "status" => payload.status.as_deref(),
            "repo_link" => payload.repo_link.as_deref(),
            "live_link" => payload.live_link.as_deref(),
            "coverImage" => payload.cover_image.as_deref(),
            "body" => payload.body.as_deref(),
            _ => None,
        }
    }

    fn check_fields(payload: &ProjectPayload) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(status) = present(&payload.status) {
            if ProjectStatus::from_str_ci(status).is_none() {
                let allowed: Vec<&str> = ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
                errors.push(FieldError::new(
                    "status",
                    format!("must be one of: {}", allowed.join(", ")),
                ));
            }
        }
        if let Some(year) = payload.year {
            if year != 0 && !(1900..=9999).contains(&year) {
                errors.push(FieldError::new("year", "must be a four-digit year"));
            }
        }
        errors
    }

    fn to_frontmatter(payload: &ProjectPayload, ctx: &MappingContext<'_>) -> ProjectFrontmatter {
        use chrono::Datelike;

        let defaults = ProjectDefaults {
            year: ctx.today.year(),
            cover_image: ctx.content.placeholder_cover.clone(),
        };
        mapper::project_frontmatter(payload, &defaults)
    }

    fn body(payload: &ProjectPayload) -> Option<&str> {
        present(&payload.body)
    }

    fn to_payload(document: Document<ProjectFrontmatter>) -> ProjectPayload {
        mapper::project_payload(document.frontmatter, document.body)
    }
}

/// Dated news updates: `updates/<YYYY-MM-DD>-<slug>.md`.
pub struct Updates;

impl ContentSchema for Updates {
    const COLLECTION: &'static str = "updates";
    const LABEL: &'static str = "update";
    const REQUIRED_FIELDS: &'static [&'static str] = &["title_sv", "title_en", "date"];
    const BILINGUAL_FIELDS: &'static [BilingualField] =
        &[BilingualField { name: "title", presence: Presence::Always }];
    const HAS_LINKS: bool = false;
    const IDENTITY: IdentityStrategy = IdentityStrategy::DatedTitle {
        date_field: "date",
        title_field: "title_en",
    };
    const DEFAULT_BODY: &'static str = "# Update\n\nAdd your update content here...";

    type Payload = UpdatePayload;
    type Frontmatter = UpdateFrontmatter;

    fn text_field<'a>(payload: &'a UpdatePayload, name: &str) -> Option<&'a str> {
        match name {
            "title_sv" => payload.title_sv.as_deref(),
            "title_en" => payload.title_en.as_deref(),
            "date" => payload.date.as_deref(),
            "body" => payload.body.as_deref(),
            _ => None,
        }
    }

    fn check_fields(payload: &UpdatePayload) -> Vec<FieldError> {
        match present(&payload.date) {
            Some(date) if parse_calendar_date(date).is_none() => vec![invalid_date("date")],
            _ => Vec::new(),
        }
    }

    fn to_frontmatter(payload: &UpdatePayload, ctx: &MappingContext<'_>) -> UpdateFrontmatter {
        let date = payload
            .date
            .as_deref()
            .and_then(parse_calendar_date)
            .unwrap_or(ctx.today);
        mapper::update_frontmatter(payload, date)
    }

    fn body(payload: &UpdatePayload) -> Option<&str> {
        present(&payload.body)
    }

    fn to_payload(document: Document<UpdateFrontmatter>) -> UpdatePayload {
        mapper::update_payload(document.frontmatter, document.body)
    }
}
