//! Rewrites documents saved with flat bilingual keys (`title_sv`, `title_en`,
//! `repo_link`, ...) into the nested frontmatter shape the site reads.
//!
//! Applying a migration twice is a no-op: once the flat keys are gone there is
//! nothing left to move.

use serde_yaml::{Mapping, Value};

use crate::content::frontmatter::{self, FrontmatterError};
use crate::content::schema::{BilingualField, ContentSchema, Presence, Projects, Updates};

/// Which keys to fold for one collection.
#[derive(Debug, Clone, Copy)]
pub struct MigrationRules {
    pub bilingual: &'static [BilingualField],
    pub links: bool,
}

impl MigrationRules {
    pub fn for_schema<S: ContentSchema>() -> Self {
        Self {
            bilingual: S::BILINGUAL_FIELDS,
            links: S::HAS_LINKS,
        }
    }

    /// Rules for a collection directory name, if it is a known collection.
    pub fn for_collection(collection: &str) -> Option<Self> {
        match collection {
            c if c == Projects::COLLECTION => Some(Self::for_schema::<Projects>()),
            c if c == Updates::COLLECTION => Some(Self::for_schema::<Updates>()),
            _ => None,
        }
    }
}

/// Outcome of migrating one frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub changed: bool,
    /// Optional bilingual fields left flat because only one language was present.
    pub partial_fields: Vec<String>,
}

/// A migrated file. `content` is `None` when nothing needed rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedDocument {
    pub content: Option<String>,
    pub report: MigrationReport,
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

/// Fold flat keys in `map` into nested values according to `rules`.
pub fn migrate_frontmatter(map: &mut Mapping, rules: &MigrationRules) -> MigrationReport {
    let before = map.clone();
    let mut partial_fields = Vec::new();

    for field in rules.bilingual {
        let sv_key = key(&format!("{}_sv", field.name));
        let en_key = key(&format!("{}_en", field.name));

        let fold = match field.presence {
            Presence::Always => map.contains_key(&sv_key) || map.contains_key(&en_key),
            Presence::BothLanguages => {
                let sv = is_truthy(map.get(&sv_key));
                let en = is_truthy(map.get(&en_key));
                if sv != en {
                    partial_fields.push(field.name.to_string());
                }
                sv && en
            }
        };
        if !fold {
            continue;
        }

        let empty = || Value::String(String::new());
        let sv = map.remove(&sv_key).filter(|v| !v.is_null()).unwrap_or_else(empty);
        let en = map.remove(&en_key).filter(|v| !v.is_null()).unwrap_or_else(empty);

        let mut nested = Mapping::new();
        nested.insert(key("sv"), sv);
        nested.insert(key("en"), en);
        map.insert(key(field.name), Value::Mapping(nested));
    }

    if rules.links {
        let repo_key = key("repo_link");
        let live_key = key("live_link");
        let repo = is_truthy(map.get(&repo_key));
        let live = is_truthy(map.get(&live_key));

        if repo || live {
            let mut links = match map.remove(key("links")) {
                Some(Value::Mapping(existing)) => existing,
                _ => Mapping::new(),
            };
            let repo_value = map.remove(&repo_key);
            let live_value = map.remove(&live_key);
            if let Some(value) = repo_value.filter(|_| repo) {
                links.insert(key("repo"), value);
            }
            if let Some(value) = live_value.filter(|_| live) {
                links.insert(key("live"), value);
            }
            map.insert(key("links"), Value::Mapping(links));
        }
    }

    MigrationReport {
        changed: *map != before,
        partial_fields,
    }
}

/// Migrate a whole stored file, returning the rewritten text only if it changed.
pub fn migrate_document(
    source: &str,
    rules: &MigrationRules,
) -> Result<MigratedDocument, FrontmatterError> {
    let source = frontmatter::normalize(source);
    let (yaml, body) = frontmatter::split(&source)?;
    let mut map: Mapping = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    let report = migrate_frontmatter(&mut map, rules);
    let content = if report.changed {
        Some(frontmatter::render(&map, body)?)
    } else {
        None
    };

    Ok(MigratedDocument { content, report })
}
