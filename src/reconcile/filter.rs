//! Backend listing filters.
//!
//! Filters are written by users as `key=value` (`url=https://10.0.0.1`,
//! `name=orders`) and sent to the control plane as an OData substring match:
//!
//! ```text
//! contains(properties/url, 'https://10.0.0.1')
//! ```

use std::fmt;
use std::str::FromStr;

/// Backend property a filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterField {
    /// `properties/url`
    Url,
    /// `properties/name`
    #[default]
    Name,
}

impl FilterField {
    /// Key used in both the user syntax and the OData property path.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Name => "name",
        }
    }
}

/// A substring filter on one backend property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendFilter {
    /// Filtered property
    pub field: FilterField,
    /// Substring to look for; empty lists everything
    pub value: String,
}

impl BackendFilter {
    /// Filter on `properties/url`.
    pub fn url(value: impl Into<String>) -> Self {
        Self {
            field: FilterField::Url,
            value: value.into(),
        }
    }

    /// Filter on `properties/name`.
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            field: FilterField::Name,
            value: value.into(),
        }
    }

    /// A filter that matches every backend.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse the `key=value` syntax.
    ///
    /// The input is split at the first `=`. Keys other than `url` and `name`
    /// fall back to `name`. Without `=` the whole input is a name filter.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.split_once('=') {
            Some((key, value)) => {
                let field = if key.trim().eq_ignore_ascii_case("url") {
                    FilterField::Url
                } else {
                    FilterField::Name
                };
                Self {
                    field,
                    value: value.to_string(),
                }
            }
            None => Self::name(input),
        }
    }

    /// Whether the filter matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The OData `$filter` expression, `None` for an empty filter.
    #[must_use]
    pub fn to_odata(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "contains(properties/{}, '{}')",
            self.field.key(),
            self.value.replace('\'', "''")
        ))
    }

    /// Apply the filter locally to a backend's id and URL.
    #[must_use]
    pub fn matches(&self, name: &str, url: &str) -> bool {
        match self.field {
            FilterField::Url => url.contains(&self.value),
            FilterField::Name => name.contains(&self.value),
        }
    }
}

impl FromStr for BackendFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for BackendFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field.key(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(BackendFilter::parse("url=https://10.0.0.1"), BackendFilter::url("https://10.0.0.1"));
        assert_eq!(BackendFilter::parse("name=svc-a"), BackendFilter::name("svc-a"));
    }

    #[test]
    fn test_parse_splits_at_first_equals() {
        let filter = BackendFilter::parse("url=https://h/?a=b");
        assert_eq!(filter.field, FilterField::Url);
        assert_eq!(filter.value, "https://h/?a=b");
    }

    #[test]
    fn test_parse_fallbacks() {
        assert_eq!(BackendFilter::parse("title=x"), BackendFilter::name("x"));
        assert_eq!(BackendFilter::parse("svc"), BackendFilter::name("svc"));
        assert!(BackendFilter::parse("").is_empty());
    }

    #[test]
    fn test_to_odata() {
        assert_eq!(
            BackendFilter::url("https://10.0.0.1").to_odata().as_deref(),
            Some("contains(properties/url, 'https://10.0.0.1')")
        );
        assert_eq!(
            BackendFilter::name("o'brien").to_odata().as_deref(),
            Some("contains(properties/name, 'o''brien')")
        );
        assert_eq!(BackendFilter::all().to_odata(), None);
    }

    #[test]
    fn test_matches() {
        let filter = BackendFilter::url("10.0.0.1");
        assert!(filter.matches("a", "https://10.0.0.1:8080"));
        assert!(!filter.matches("10.0.0.1", "https://other"));
        assert!(BackendFilter::all().matches("any", "thing"));
    }
}
