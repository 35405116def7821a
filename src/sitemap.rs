//! Site URL inventory.
//!
//! Every page the site publishes, per locale: the fixed marketing routes plus
//! one article page per catalog slug. Rendered as a sitemaps.org `urlset`.
//!
//! ```text
//! https://jingtongvisa.com/en              1.0 weekly
//! https://jingtongvisa.com/zh              1.0 weekly
//! https://jingtongvisa.com/en/services     0.8 monthly
//! ...
//! https://jingtongvisa.com/en/news/{slug}  0.6 monthly
//! https://jingtongvisa.com/zh/news/{slug}  0.6 monthly
//! ```

use crate::catalog::{Catalog, CatalogError};
use crate::config::SiteInfo;
use maud::{Markup, PreEscaped, html};
use serde::Serialize;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

/// A fixed, non-article route.
#[derive(Debug, Clone, Copy)]
pub struct StaticRoute {
    pub path: &'static str,
    pub priority: f32,
    pub change_frequency: ChangeFrequency,
}

pub const STATIC_ROUTES: [StaticRoute; 7] = [
    route("", 1.0, ChangeFrequency::Weekly),
    route("/services", 0.8, ChangeFrequency::Monthly),
    route("/pricing", 0.8, ChangeFrequency::Monthly),
    route("/checklist", 0.8, ChangeFrequency::Monthly),
    route("/faq", 0.8, ChangeFrequency::Monthly),
    route("/news", 0.8, ChangeFrequency::Monthly),
    route("/contact", 0.8, ChangeFrequency::Monthly),
];

const fn route(path: &'static str, priority: f32, change_frequency: ChangeFrequency) -> StaticRoute {
    StaticRoute {
        path,
        priority,
        change_frequency,
    }
}

pub const ARTICLE_PRIORITY: f32 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub priority: f32,
    pub change_frequency: ChangeFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

impl Sitemap {
    /// Entries for every static route and every catalog slug, in every
    /// configured locale.
    ///
    /// Static routes come first (route-major, then locale), followed by
    /// articles (slug-major, then locale).
    pub fn build(catalog: &Catalog, site: &SiteInfo) -> Result<Self, CatalogError> {
        let slugs = catalog.list_slugs()?;
        let locales = catalog.locales().available();
        let origin = site.origin();

        let statics = STATIC_ROUTES.iter().flat_map(|r| {
            locales.iter().map(move |locale| SitemapEntry {
                url: format!("{origin}/{locale}{}", r.path),
                priority: r.priority,
                change_frequency: r.change_frequency,
            })
        });
        let articles = slugs.iter().flat_map(|slug| {
            locales.iter().map(move |locale| SitemapEntry {
                url: format!("{origin}/{locale}/news/{slug}"),
                priority: ARTICLE_PRIORITY,
                change_frequency: ChangeFrequency::Monthly,
            })
        });

        let entries: Vec<SitemapEntry> = statics.chain(articles).collect();
        tracing::debug!(entries = entries.len(), slugs = slugs.len(), "built sitemap");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a sitemaps.org XML document.
    pub fn to_xml(&self) -> String {
        let doc: Markup = html! {
            (PreEscaped(XML_DECLARATION))
            urlset xmlns=(SITEMAP_NS) {
                @for entry in &self.entries {
                    url {
                        loc { (entry.url) }
                        changefreq { (entry.change_frequency.as_str()) }
                        priority { (format!("{:.1}", entry.priority)) }
                    }
                }
            }
        };
        doc.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locales;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with(slugs: &[&str]) -> (TempDir, Catalog) {
        let tmp = TempDir::new().unwrap();
        for slug in slugs {
            fs::write(tmp.path().join(format!("{slug}.mdx")), "---\ntitle: T\n---\n").unwrap();
        }
        let catalog = Catalog::new(tmp.path(), Locales::default());
        (tmp, catalog)
    }

    #[test]
    fn entry_count_is_routes_plus_slugs_times_locales() {
        let (_tmp, catalog) = catalog_with(&["a", "b", "c"]);
        let sitemap = Sitemap::build(&catalog, &SiteInfo::default()).unwrap();
        assert_eq!(sitemap.len(), (7 + 3) * 2);
    }

    #[test]
    fn empty_catalog_still_lists_static_routes() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::new(tmp.path().join("missing"), Locales::default());
        let sitemap = Sitemap::build(&catalog, &SiteInfo::default()).unwrap();
        assert_eq!(sitemap.len(), 14);
        assert_eq!(sitemap.entries[0].url, "https://jingtongvisa.com/en");
        assert_eq!(sitemap.entries[1].url, "https://jingtongvisa.com/zh");
        assert_eq!(sitemap.entries[0].priority, 1.0);
        assert_eq!(sitemap.entries[0].change_frequency, ChangeFrequency::Weekly);
    }

    #[test]
    fn article_entries_follow_static_routes() {
        let (_tmp, catalog) = catalog_with(&["visa-tips"]);
        let sitemap = Sitemap::build(&catalog, &SiteInfo::default()).unwrap();
        let tail: Vec<&str> = sitemap.entries[14..].iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            tail,
            vec![
                "https://jingtongvisa.com/en/news/visa-tips",
                "https://jingtongvisa.com/zh/news/visa-tips",
            ]
        );
        assert!(sitemap.entries[14..].iter().all(|e| e.priority == ARTICLE_PRIORITY));
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let (_tmp, catalog) = catalog_with(&[]);
        let site = SiteInfo {
            base_url: "https://example.org/".to_string(),
            ..SiteInfo::default()
        };
        let sitemap = Sitemap::build(&catalog, &site).unwrap();
        assert_eq!(sitemap.entries[2].url, "https://example.org/en/services");
    }

    #[test]
    fn xml_is_a_urlset_document() {
        let (_tmp, catalog) = catalog_with(&["a"]);
        let xml = Sitemap::build(&catalog, &SiteInfo::default()).unwrap().to_xml();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://jingtongvisa.com/en/news/a</loc>"));
        assert!(xml.contains("<priority>0.6</priority>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert_eq!(xml.matches("<url>").count(), 16);
    }

    #[test]
    fn xml_escapes_ampersands() {
        let sitemap = Sitemap {
            entries: vec![SitemapEntry {
                url: "https://example.org/?a=1&b=2".to_string(),
                priority: 0.5,
                change_frequency: ChangeFrequency::Monthly,
            }],
        };
        let xml = sitemap.to_xml();
        assert!(xml.contains("a=1&amp;b=2"));
        assert!(!xml.contains("a=1&b=2"));
    }

    #[test]
    fn fixture_sitemap_covers_every_article() {
        let tmp = setup_fixtures();
        let catalog = fixture_catalog(tmp.path());
        let sitemap = Sitemap::build(&catalog, &SiteInfo::default()).unwrap();
        assert_eq!(sitemap.len(), (7 + 5) * 2);
        assert!(
            sitemap
                .entries
                .iter()
                .all(|e| !e.url.contains("retired-announcement"))
        );
    }
}
