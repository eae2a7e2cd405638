//! Flat bilingual form payloads ⇄ nested frontmatter documents.

use chrono::NaiveDate;

use crate::content::models::{
    Bilingual, ProjectFrontmatter, ProjectLinks, ProjectPayload, ProjectStatus,
    UpdateFrontmatter, UpdatePayload,
};

/// Values used when a project payload leaves an optional scalar out.
#[derive(Debug, Clone)]
pub struct ProjectDefaults {
    pub year: i32,
    pub cover_image: String,
}

/// `Some` only for values with visible content. Blank strings count as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn pair(sv: &Option<String>, en: &Option<String>) -> Option<Bilingual<String>> {
    match (present(sv), present(en)) {
        (Some(sv), Some(en)) => Some(Bilingual::new(sv.to_string(), en.to_string())),
        _ => None,
    }
}

/// Map a project form payload to its frontmatter.
///
/// `role` and `highlightBullets` appear only when both languages are given;
/// `links` only when at least one link is set.
pub fn project_frontmatter(payload: &ProjectPayload, defaults: &ProjectDefaults) -> ProjectFrontmatter {
    let links = {
        let repo = present(&payload.repo_link).map(str::to_string);
        let live = present(&payload.live_link).map(str::to_string);
        (repo.is_some() || live.is_some()).then_some(ProjectLinks { repo, live })
    };

    let highlight_bullets = match (&payload.highlight_bullets_sv, &payload.highlight_bullets_en) {
        (Some(sv), Some(en)) => Some(Bilingual::new(sv.clone(), en.clone())),
        _ => None,
    };

    ProjectFrontmatter {
        title: Bilingual::new(
            payload.title_sv.clone().unwrap_or_default(),
            payload.title_en.clone().unwrap_or_default(),
        ),
        description: Bilingual::new(
            payload.description_sv.clone().unwrap_or_default(),
            payload.description_en.clone().unwrap_or_default(),
        ),
        status: present(&payload.status)
            .and_then(ProjectStatus::from_str_ci)
            .unwrap_or_default(),
        year: payload.year.filter(|y| *y != 0).unwrap_or(defaults.year),
        tags: payload.tags.clone().unwrap_or_default(),
        stack: payload.stack.clone().unwrap_or_default(),
        cover_image: present(&payload.cover_image)
            .map(str::to_string)
            .unwrap_or_else(|| defaults.cover_image.clone()),
        role: pair(&payload.role_sv, &payload.role_en),
        links,
        highlight_bullets,
        gallery_images: payload.gallery_images.clone().unwrap_or_default(),
    }
}

/// Map an update form payload to its frontmatter. The date is parsed upstream.
pub fn update_frontmatter(payload: &UpdatePayload, date: NaiveDate) -> UpdateFrontmatter {
    UpdateFrontmatter {
        title: Bilingual::new(
            payload.title_sv.clone().unwrap_or_default(),
            payload.title_en.clone().unwrap_or_default(),
        ),
        date,
        tags: payload.tags.clone().unwrap_or_default(),
    }
}

/// Flatten a stored project back into the editor's form shape.
pub fn project_payload(fm: ProjectFrontmatter, body: String) -> ProjectPayload {
    let (role_sv, role_en) = fm
        .role
        .map(|r| (Some(r.sv), Some(r.en)))
        .unwrap_or_default();
    let (highlight_bullets_sv, highlight_bullets_en) = fm
        .highlight_bullets
        .map(|h| (Some(h.sv), Some(h.en)))
        .unwrap_or_default();
    let links = fm.links.unwrap_or_default();

    ProjectPayload {
        slug: None,
        title_sv: Some(fm.title.sv),
        title_en: Some(fm.title.en),
        description_sv: Some(fm.description.sv),
        description_en: Some(fm.description.en),
        role_sv,
        role_en,
        status: Some(fm.status.to_string()),
        year: Some(fm.year),
        tags: Some(fm.tags),
        stack: Some(fm.stack),
        repo_link: links.repo,
        live_link: links.live,
        cover_image: Some(fm.cover_image),
        gallery_images: (!fm.gallery_images.is_empty()).then_some(fm.gallery_images),
        highlight_bullets_sv,
        highlight_bullets_en,
        body: Some(body),
    }
}

/// Flatten a stored update back into the editor's form shape.
pub fn update_payload(fm: UpdateFrontmatter, body: String) -> UpdatePayload {
    UpdatePayload {
        title_sv: Some(fm.title.sv),
        title_en: Some(fm.title.en),
        date: Some(fm.date.format("%Y-%m-%d").to_string()),
        tags: Some(fm.tags),
        body: Some(body),
    }
}
