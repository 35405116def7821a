//! News article catalog.
//!
//! The catalog is a read-only view over a directory of article files. It
//! discovers slugs, resolves locale-specific variants, parses front matter,
//! derives computed fields and hands back owned records. Nothing is cached:
//! every call reflects the files on disk at the moment it runs.
//!
//! ## Directory Structure
//!
//! ```text
//! content/news/                              # Default-locale articles
//! ├── china-visa-requirements-2025.mdx       # slug = file stem
//! ├── tourist-visa-tips-dc.mdx
//! └── zh/                                    # One directory per other locale
//!     └── china-visa-requirements-2025.mdx   # Same slug, translated
//! ```
//!
//! The default-locale directory defines which slugs exist. A translation
//! without a default-locale counterpart is never listed (see [`Catalog::check`]).
//!
//! ## Locale Fallback
//!
//! For a non-default locale `L`, `<dir>/L/<slug>.<ext>` wins when it exists,
//! otherwise `<dir>/<slug>.<ext>` is used. Fallback is whole-record: a
//! translation never borrows individual fields from the default file.
//!
//! ## Derived Fields
//!
//! | Field | Source | Default when absent |
//! |-------|--------|---------------------|
//! | `title` | front matter | `""` |
//! | `date` | front matter | `""` |
//! | `excerpt` | front matter | `""` |
//! | `coverImage` | front matter | `https://picsum.photos/seed/{slug}/800/450` |
//! | `category` | front matter | `General` |
//! | `author` | front matter | `Jing Tong Team` |
//! | `readTime` | body word count | never stored, always `>= 1` |
//!
//! ## Ordering
//!
//! Listings are sorted newest first. Dates that are empty or unparseable sort
//! after every dated article. The sort is stable, so equal dates keep slug
//! order.

use crate::config::SiteConfig;
use crate::frontmatter::{self, Document, FrontMatterError};
use crate::locale::Locales;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_AUTHOR: &str = "Jing Tong Team";
pub const DEFAULT_CATEGORY: &str = "General";
/// Reading speed used for `readTime`, in whitespace-delimited tokens per minute.
pub const WORDS_PER_MINUTE: usize = 200;
/// Number of related articles shown under an article.
pub const RELATED_LIMIT: usize = 3;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Listing form of an article: everything except the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMeta {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub cover_image: String,
    pub category: String,
    pub author: String,
    pub read_time: u32,
}

impl ArticleMeta {
    fn derive(slug: String, doc: &Document) -> Self {
        let fm = &doc.front_matter;
        Self {
            title: fm.get_or("title", ""),
            date: fm.get_or("date", ""),
            excerpt: fm.get_or("excerpt", ""),
            cover_image: fm
                .get("coverImage")
                .map(String::from)
                .unwrap_or_else(|| placeholder_cover(&slug)),
            category: fm.get_or("category", DEFAULT_CATEGORY),
            author: fm.get_or("author", DEFAULT_AUTHOR),
            read_time: read_time(&doc.body),
            slug,
        }
    }
}

/// Full form of an article, body included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub meta: ArticleMeta,
    /// Raw markdown/MDX body, front matter removed.
    pub content: String,
}

impl Article {
    /// Render the body as CommonMark HTML.
    ///
    /// MDX component tags pass through as raw HTML; this is a preview, not the
    /// site's renderer.
    pub fn body_html(&self) -> String {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(&self.content, options);
        let mut html = String::new();
        md_html::push_html(&mut html, parser);
        html
    }
}

/// Estimated reading time in minutes.
///
/// Counts whitespace-delimited tokens, so text in scripts that do not separate
/// words with spaces (Chinese) reads as far fewer words than it contains.
pub fn read_time(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round() as u32;
    minutes.max(1)
}

/// Cover image used when an article does not name one.
pub fn placeholder_cover(slug: &str) -> String {
    format!("https://picsum.photos/seed/{slug}/800/450")
}

/// Parse a front matter date as an ISO-8601 instant.
///
/// Accepts RFC 3339, naive date-times with or without seconds and fractional
/// seconds (`T` or space separated), `YYYY-MM-DD`, and the reduced-precision
/// forms `YYYY-MM` and `YYYY`. Partial dates map to their first instant.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_partial_date(value))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `YYYY` or `YYYY-MM`, as the first day of the period.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    fn digits(s: &str, len: usize) -> Option<u32> {
        (s.len() == len && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse().ok())
            .flatten()
    }

    let mut parts = value.split('-');
    let year = digits(parts.next()?, 4)?;
    let month = match parts.next() {
        None => 1,
        Some(m) => digits(m, 2)?,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)
}

/// Human-readable date: `January 15, 2025` or, for `zh`, `2025年1月15日`.
///
/// Unparseable input is returned unchanged.
pub fn display_date(date: &str, locale: &str) -> String {
    let Some(parsed) = parse_date(date) else {
        return date.to_string();
    };
    let day = parsed.date();
    if locale.eq_ignore_ascii_case("zh") {
        format!("{}年{}月{}日", day.year(), day.month(), day.day())
    } else {
        day.format("%B %-d, %Y").to_string()
    }
}

/// Newest first; undated articles last; stable for ties.
fn sort_newest_first(articles: &mut [ArticleMeta]) {
    articles.sort_by_cached_key(|a| Reverse(parse_date(&a.date)));
}

/// A slug must be a plain file stem so it can never address another directory.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
}

fn read_document(path: &Path) -> Result<Document, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = frontmatter::parse(&raw).map_err(|source| CatalogError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    if doc.front_matter.is_empty() {
        tracing::debug!(path = %path.display(), "no front matter; using defaults");
    } else {
        tracing::trace!(path = %path.display(), keys = doc.front_matter.len(), "parsed article");
    }
    Ok(doc)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Read-only article catalog over one content directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
    extension: String,
    locales: Locales,
}

impl Catalog {
    pub fn new(dir: impl Into<PathBuf>, locales: Locales) -> Self {
        Self {
            dir: dir.into(),
            extension: "mdx".to_string(),
            locales,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Catalog for the site rooted at `root`, as described by `config`.
    pub fn from_config(config: &SiteConfig, root: &Path) -> Self {
        Self::new(config.content_path(root), config.locale_set())
            .with_extension(config.content.extension.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn locales(&self) -> &Locales {
        &self.locales
    }

    /// Every slug in the default-locale directory, sorted by file name.
    ///
    /// A missing directory is an empty catalog.
    pub fn list_slugs(&self) -> Result<Vec<String>, CatalogError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "content directory missing");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut slugs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            let Some(stem) = path.file_stem() else {
                continue;
            };
            let Some(stem) = stem.to_str() else {
                tracing::warn!(path = %path.display(), "skipping article with non-UTF-8 file name");
                continue;
            };
            if is_valid_slug(stem) {
                slugs.push(stem.to_string());
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    /// Every article in listing form for `locale`, newest first.
    ///
    /// Fails if any listed article cannot be read or parsed; records are never
    /// silently dropped.
    pub fn all_articles(&self, locale: &str) -> Result<Vec<ArticleMeta>, CatalogError> {
        let mut articles = self
            .list_slugs()?
            .into_iter()
            .map(|slug| {
                let path = self.resolve_path(&slug, locale);
                let doc = read_document(&path)?;
                Ok(ArticleMeta::derive(slug, &doc))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        sort_newest_first(&mut articles);
        Ok(articles)
    }

    /// A single article in full form, or `None` when no file exists for the
    /// slug in either the requested or the default locale.
    pub fn article(&self, slug: &str, locale: &str) -> Result<Option<Article>, CatalogError> {
        if !is_valid_slug(slug) {
            return Ok(None);
        }
        let path = self.resolve_path(slug, locale);
        if !path.is_file() {
            tracing::debug!(slug, locale, "article not found");
            return Ok(None);
        }
        let doc = read_document(&path)?;
        let meta = ArticleMeta::derive(slug.to_string(), &doc);
        Ok(Some(Article {
            meta,
            content: doc.body,
        }))
    }

    /// Up to `limit` other articles sharing the article's category, newest first.
    pub fn related(
        &self,
        slug: &str,
        locale: &str,
        limit: usize,
    ) -> Result<Vec<ArticleMeta>, CatalogError> {
        let Some(article) = self.article(slug, locale)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .all_articles(locale)?
            .into_iter()
            .filter(|a| a.category == article.meta.category && a.slug != slug)
            .take(limit)
            .collect())
    }

    /// [`display_date`] for a requested locale, after locale resolution.
    pub fn display_date(&self, date: &str, locale: &str) -> String {
        display_date(date, self.locales.resolve(locale))
    }

    /// File that serves `slug` in `locale`, after fallback.
    ///
    /// The returned path is the default-locale file whenever no translation
    /// exists, whether or not that file exists itself.
    pub fn resolve_path(&self, slug: &str, locale: &str) -> PathBuf {
        let file_name = format!("{slug}.{}", self.extension);
        let locale = self.locales.resolve(locale);
        if !self.locales.is_default(locale) {
            let localized = self.dir.join(locale).join(&file_name);
            if localized.is_file() {
                return localized;
            }
        }
        self.dir.join(file_name)
    }

    /// Audit the content tree.
    ///
    /// Reports translations without a default-locale article, directories that
    /// are not a configured locale, and per-locale translation coverage. Every
    /// configured locale is also listed in full, so unreadable or malformed
    /// files surface as errors.
    pub fn check(&self) -> Result<CheckReport, CatalogError> {
        let slugs = self.list_slugs()?;
        let known: BTreeSet<&str> = slugs.iter().map(String::as_str).collect();
        let mut report = CheckReport {
            articles: slugs.len(),
            ..CheckReport::default()
        };

        if !self.dir.is_dir() {
            return Ok(report);
        }

        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if entry.depth() == 1 && entry.file_type().is_dir() {
                if !self.is_translation_dir(path) {
                    report.unknown_dirs.push(path.to_path_buf());
                }
            } else if entry.depth() == 2
                && entry.file_type().is_file()
                && self.has_extension(path)
                && path.parent().is_some_and(|p| self.is_translation_dir(p))
            {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if !known.contains(stem.as_str()) {
                    report.orphans.push(path.to_path_buf());
                }
            }
        }

        for locale in self.locales.translations() {
            let missing: Vec<String> = slugs
                .iter()
                .filter(|slug| !self.dir.join(locale).join(self.file_name(slug)).is_file())
                .cloned()
                .collect();
            report.coverage.push(TranslationCoverage {
                locale: locale.to_string(),
                translated: slugs.len() - missing.len(),
                missing,
            });
        }

        for locale in self.locales.available() {
            self.all_articles(locale)?;
        }

        if !report.is_clean() {
            tracing::warn!(
                orphans = report.orphans.len(),
                unknown_dirs = report.unknown_dirs.len(),
                "content tree has unreachable files"
            );
        }
        Ok(report)
    }

    /// Directory named after a configured non-default locale.
    fn is_translation_dir(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.locales.translations().any(|l| l == name))
    }

    fn file_name(&self, slug: &str) -> String {
        format!("{slug}.{}", self.extension)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e == self.extension.as_str())
            .unwrap_or(false)
    }
}

/// Result of [`Catalog::check`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of default-locale articles.
    pub articles: usize,
    /// Translation coverage, one entry per non-default locale.
    pub coverage: Vec<TranslationCoverage>,
    /// Translated files whose slug has no default-locale article.
    pub orphans: Vec<PathBuf>,
    /// Subdirectories that are not a configured non-default locale.
    pub unknown_dirs: Vec<PathBuf>,
}

impl CheckReport {
    /// No file in the tree is unreachable.
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.unknown_dirs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCoverage {
    pub locale: String,
    pub translated: usize,
    /// Slugs served from the default locale for this locale.
    pub missing: Vec<String>,
}
