use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use folio::content::migrate::{migrate_document, MigrationRules};
use walkdir::WalkDir;

/// Rewrite flat bilingual frontmatter keys (`title_sv`, `title_en`, ...)
/// into nested `{sv, en}` values, in place.
#[derive(Parser, Debug)]
#[command(name = "folio-migrate", version, about)]
struct Args {
    /// Directory holding one sub-directory per collection.
    #[arg(long, default_value = "src/content")]
    content_root: PathBuf,

    /// Report what would change without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    migrated: usize,
    unchanged: usize,
    failed: usize,
}

fn migrate_file(path: &Path, rules: &MigrationRules, dry_run: bool) -> Result<(bool, Vec<String>)> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let migrated = migrate_document(&source, rules)?;

    if let Some(content) = &migrated.content {
        if !dry_run {
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        }
    }

    Ok((migrated.content.is_some(), migrated.report.partial_fields))
}

/// Migrate every markdown file of every known collection under `root`.
fn migrate_tree(root: &Path, dry_run: bool, out: &mut impl Write) -> Result<Summary> {
    if !root.is_dir() {
        anyhow::bail!("content root {} is not a directory", root.display());
    }

    let mut summary = Summary::default();
    let entries = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"));

    for entry in entries {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path).display().to_string();
        let Some(rules) = path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .and_then(MigrationRules::for_collection)
        else {
            continue;
        };

        match migrate_file(path, &rules, dry_run) {
            Ok((changed, partial)) => {
                if changed {
                    summary.migrated += 1;
                    let verb = if dry_run { "would migrate" } else { "migrated" };
                    writeln!(out, "✓ {verb} {relative}")?;
                } else {
                    summary.unchanged += 1;
                    writeln!(out, "  unchanged {relative}")?;
                }
                for field in partial {
                    writeln!(
                        out,
                        "  ! {relative}: only one language of '{field}' present, left as is"
                    )?;
                }
            }
            Err(e) => {
                summary.failed += 1;
                writeln!(out, "✗ {relative}: {e:#}")?;
            }
        }
    }

    Ok(summary)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let stdout = io::stdout();
    let summary = migrate_tree(&args.content_root, args.dry_run, &mut stdout.lock())?;

    println!(
        "\n{} migrated, {} unchanged, {} failed",
        summary.migrated, summary.unchanged, summary.failed
    );

    if summary.failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
