//! # Jing Tong Site
//!
//! Content and contact backend for the Jing Tong Visa bilingual website.
//! News articles are markdown/MDX files with YAML front matter; the filesystem
//! is the database. This crate answers the questions the site's pages ask of
//! that content, and handles the contact form.
//!
//! ```text
//! content/news/*.mdx   →  Catalog   →  listings, single articles, related, sitemap
//! contact form JSON    →  ContactHandler  →  SMTP notification (or log)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Slug discovery, locale fallback, derived fields, ordering, related articles, content audit |
//! | [`frontmatter`] | Splits a document into its YAML front matter block and body |
//! | [`locale`] | Configured locale set and request resolution |
//! | [`sitemap`] | Per-locale URL inventory rendered as sitemap XML with Maud |
//! | [`contact`] | Contact form validation, notification composition, delivery |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## No Cache
//!
//! Every catalog call reads the files it needs. The content directory is small
//! and edited by hand; reading on demand means an edit is visible on the very
//! next call without invalidation logic.
//!
//! ## Whole-Record Locale Fallback
//!
//! A translation replaces the default-locale article as a unit. If `zh/x.mdx`
//! exists, none of its fields are filled in from `x.mdx`, including the date,
//! so a translation can sort differently from its original.
//!
//! ## Explicit Locale
//!
//! The requested locale is an argument to every catalog operation. There is no
//! ambient "current locale", so concurrent requests in different locales
//! cannot interfere.

pub mod catalog;
pub mod config;
pub mod contact;
pub mod frontmatter;
pub mod locale;
pub mod output;
pub mod sitemap;

#[cfg(test)]
pub(crate) mod test_helpers;
