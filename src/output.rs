//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each article leads
//! with its positional index and title; slug, date and category are shown as
//! indented context lines. Paths only appear where the file *is* the subject
//! (the `check` report).
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! News (zh, 5 articles)
//! 001 2025年中国签证新规
//!     Slug: china-visa-requirements-2025
//!     2025年1月15日 · Policy Updates · 3 min read
//!     All travelers should review the updated documentation...
//! ```
//!
//! ## Check
//!
//! ```text
//! Articles: 5
//! Translations
//!     zh: 2/5
//!         Missing: business-visa-checklist, china-travel-guide-2025, ...
//! Orphans
//!     zh/retired-announcement.mdx
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::catalog::{Article, ArticleMeta, CheckReport, display_date};
use crate::contact::Acknowledgement;
use crate::sitemap::Sitemap;
use std::path::Path;

const EXCERPT_WIDTH: usize = 72;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Article header: positional index + title. Untitled articles show their
/// slug in parens, since the slug is then their only identity.
///
/// ```text
/// 001 China Visa Requirements 2025
/// 002 (office-hours-update)
/// ```
fn article_header(index: usize, meta: &ArticleMeta) -> String {
    if meta.title.is_empty() {
        format!("{} ({})", format_index(index), meta.slug)
    } else {
        format!("{} {}", format_index(index), meta.title)
    }
}

/// `date · category · N min read`, skipping an empty date.
fn summary_line(meta: &ArticleMeta, locale: &str) -> String {
    let mut parts = Vec::new();
    if !meta.date.is_empty() {
        parts.push(display_date(&meta.date, locale));
    }
    parts.push(meta.category.clone());
    parts.push(format!("{} min read", meta.read_time));
    parts.join(" \u{b7} ")
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Path relative to `base` for display, falling back to the full path.
fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// slugs / list
// ============================================================================

pub fn format_slugs(slugs: &[String]) -> Vec<String> {
    slugs.to_vec()
}

pub fn print_slugs(slugs: &[String]) {
    print_lines(format_slugs(slugs));
}

/// Format a listing for one locale.
pub fn format_listing(articles: &[ArticleMeta], locale: &str) -> Vec<String> {
    let noun = if articles.len() == 1 { "article" } else { "articles" };
    let mut lines = vec![format!("News ({}, {} {})", locale, articles.len(), noun)];
    lines.extend(format_article_entries(articles, locale, 0));
    lines
}

fn format_article_entries(articles: &[ArticleMeta], locale: &str, depth: usize) -> Vec<String> {
    let base = indent(depth);
    let mut lines = Vec::new();
    for (i, meta) in articles.iter().enumerate() {
        lines.push(format!("{}{}", base, article_header(i + 1, meta)));
        lines.push(format!("{}    Slug: {}", base, meta.slug));
        lines.push(format!("{}    {}", base, summary_line(meta, locale)));
        let excerpt = truncate_desc(meta.excerpt.trim(), EXCERPT_WIDTH);
        if !excerpt.is_empty() {
            lines.push(format!("{}    {}", base, excerpt));
        }
    }
    lines
}

pub fn print_listing(articles: &[ArticleMeta], locale: &str) {
    print_lines(format_listing(articles, locale));
}

// ============================================================================
// show
// ============================================================================

/// Format a full article: metadata block, blank line, raw body.
pub fn format_article(article: &Article, locale: &str) -> Vec<String> {
    let meta = &article.meta;
    let title = if meta.title.is_empty() {
        format!("({})", meta.slug)
    } else {
        meta.title.clone()
    };
    let mut lines = vec![title];
    lines.push(format!("    Slug: {}", meta.slug));
    if !meta.date.is_empty() {
        lines.push(format!("    Date: {}", display_date(&meta.date, locale)));
    }
    lines.push(format!("    Category: {}", meta.category));
    lines.push(format!("    Author: {}", meta.author));
    lines.push(format!("    Read time: {} min", meta.read_time));
    lines.push(format!("    Cover: {}", meta.cover_image));
    if !meta.excerpt.is_empty() {
        lines.push(format!("    Excerpt: {}", meta.excerpt));
    }
    lines.push(String::new());
    lines.extend(article.content.trim_end().lines().map(String::from));
    lines
}

pub fn print_article(article: &Article, locale: &str) {
    print_lines(format_article(article, locale));
}

// ============================================================================
// related
// ============================================================================

pub fn format_related(slug: &str, related: &[ArticleMeta], locale: &str) -> Vec<String> {
    let mut lines = vec![format!("Related to {}", slug)];
    if related.is_empty() {
        lines.push("    (none)".to_string());
    } else {
        lines.extend(format_article_entries(related, locale, 1));
    }
    lines
}

pub fn print_related(slug: &str, related: &[ArticleMeta], locale: &str) {
    print_lines(format_related(slug, related, locale));
}

// ============================================================================
// check
// ============================================================================

/// Format a content audit. Paths are shown relative to the content directory.
pub fn format_check_report(report: &CheckReport, content_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Articles: {}", report.articles)];

    if !report.coverage.is_empty() {
        lines.push("Translations".to_string());
        for cov in &report.coverage {
            lines.push(format!(
                "    {}: {}/{}",
                cov.locale, cov.translated, report.articles
            ));
            if !cov.missing.is_empty() {
                lines.push(format!("        Missing: {}", cov.missing.join(", ")));
            }
        }
    }

    if !report.orphans.is_empty() {
        lines.push("Orphans".to_string());
        for path in &report.orphans {
            lines.push(format!("    {}", relative(path, content_dir)));
        }
    }

    if !report.unknown_dirs.is_empty() {
        lines.push("Unknown locale directories".to_string());
        for path in &report.unknown_dirs {
            lines.push(format!("    {}/", relative(path, content_dir)));
        }
    }

    if report.is_clean() {
        lines.push("OK".to_string());
    }
    lines
}

pub fn print_check_report(report: &CheckReport, content_dir: &Path) {
    print_lines(format_check_report(report, content_dir));
}

// ============================================================================
// sitemap / contact
// ============================================================================

/// Summary shown when the sitemap is written to a file.
pub fn format_sitemap_summary(sitemap: &Sitemap, out: &Path) -> Vec<String> {
    vec![format!(
        "Sitemap: {} entries \u{2192} {}",
        sitemap.len(),
        out.display()
    )]
}

pub fn format_acknowledgement(ack: Acknowledgement, recipient: &str) -> Vec<String> {
    match ack {
        Acknowledgement::Sent => vec![format!("Message sent to {}", recipient)],
        Acknowledgement::Recorded => vec![
            "Message recorded".to_string(),
            "    Mail credential not configured; submission written to the log".to_string(),
        ],
    }
}

pub fn print_acknowledgement(ack: Acknowledgement, recipient: &str) {
    print_lines(format_acknowledgement(ack, recipient));
}
