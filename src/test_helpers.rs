//! Shared test utilities for the jingtong-site test suite.
//!
//! Provides the fixture site and lookup helpers that panic with a useful
//! message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let catalog = fixture_catalog(tmp.path());
//! let list = catalog.all_articles("zh").unwrap();
//! let article = find_article(&list, "tourist-visa-tips-dc");
//! assert_eq!(article.category, "Visa Tips");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::{ArticleMeta, Catalog};
use crate::config::SiteConfig;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Catalog over a fixture copy, using stock config.
pub fn fixture_catalog(root: &Path) -> Catalog {
    Catalog::from_config(&SiteConfig::default(), root)
}

// =========================================================================
// Listing lookups
// =========================================================================

/// Find an article by slug in a listing. Panics if not found.
pub fn find_article<'a>(list: &'a [ArticleMeta], slug: &str) -> &'a ArticleMeta {
    list.iter().find(|a| a.slug == slug).unwrap_or_else(|| {
        let slugs = slugs_of(list);
        panic!("article '{slug}' not found. Available: {slugs:?}")
    })
}

/// Slugs in listing order.
pub fn slugs_of(list: &[ArticleMeta]) -> Vec<&str> {
    list.iter().map(|a| a.slug.as_str()).collect()
}
