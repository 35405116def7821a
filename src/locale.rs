//! Locale set and request resolution.
//!
//! The site is published in a fixed set of locales, one of which is the
//! default. Every catalog call takes the requested locale as an argument;
//! there is no process-wide "current locale".
//!
//! Resolution is total: a configured locale (compared ASCII case-insensitively)
//! resolves to itself, anything else resolves to the default. Unknown
//! locales are therefore never turned into filesystem paths.

/// The configured locales of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    default: String,
    available: Vec<String>,
}

impl Locales {
    /// Build a locale set. The default is always part of the available list,
    /// placed first when the caller did not list it.
    pub fn new(default: impl Into<String>, available: impl IntoIterator<Item = String>) -> Self {
        let default = default.into();
        let mut list: Vec<String> = Vec::new();
        for locale in available {
            if !list.iter().any(|l| l.eq_ignore_ascii_case(&locale)) {
                list.push(locale);
            }
        }
        if !list.iter().any(|l| l.eq_ignore_ascii_case(&default)) {
            list.insert(0, default.clone());
        }
        Self {
            default,
            available: list,
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn is_default(&self, locale: &str) -> bool {
        self.default.eq_ignore_ascii_case(locale)
    }

    /// Map a requested locale onto a configured one.
    pub fn resolve<'a>(&'a self, requested: &str) -> &'a str {
        self.available
            .iter()
            .find(|l| l.eq_ignore_ascii_case(requested.trim()))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// Configured locales other than the default, in configured order.
    pub fn translations(&self) -> impl Iterator<Item = &str> {
        self.available
            .iter()
            .map(String::as_str)
            .filter(|l| !self.is_default(l))
    }
}

impl Default for Locales {
    fn default() -> Self {
        Self::new("en", ["en".to_string(), "zh".to_string()])
    }
}
