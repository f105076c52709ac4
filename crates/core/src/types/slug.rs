//! URL slugs derived from store names.
//!
//! A slug is the lowercase, hyphenated form of a store name used in
//! `/store/{slug}` URLs. The repository owns uniqueness: it counts existing
//! slugs that match [`Slug::collision_pattern`] and, when there are any,
//! stores the name as [`Slug::with_suffix`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe identifier derived from a store name.
///
/// ```
/// use delicious_core::Slug;
///
/// let slug = Slug::from_name("  Tim's Coffee & Donuts ");
/// assert_eq!(slug.as_str(), "tims-coffee-donuts");
/// assert_eq!(slug.with_suffix(3).as_str(), "tims-coffee-donuts-3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Slug used when a name contains no usable characters at all.
    pub const FALLBACK: &'static str = "store";

    /// Derive the base slug for a store name.
    ///
    /// ASCII letters and digits are kept (lowercased); whitespace, hyphens,
    /// and underscores become separators, with runs collapsed to a single
    /// hyphen; every other character is dropped. Leading and trailing
    /// separators are trimmed.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else if c.is_whitespace() || c == '-' || c == '_' {
                pending_separator = true;
            }
        }

        if slug.is_empty() {
            slug.push_str(Self::FALLBACK);
        }
        Self(slug)
    }

    /// Wrap a slug that was already stored (e.g. from a URL or the database).
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The slug with a numeric collision suffix, e.g. `coffee-2`.
    #[must_use]
    pub fn with_suffix(&self, n: i64) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Case-insensitive regular expression matching this slug and every
    /// suffixed variant of it (`base`, `base-2`, `base-17`, ...).
    ///
    /// The base is escaped so that it can be handed to Postgres' `~*`
    /// operator verbatim. Slugs built by [`Slug::from_name`] never contain
    /// metacharacters, but stored slugs may come from older data.
    #[must_use]
    pub fn collision_pattern(&self) -> String {
        format!("^({})(-[0-9]+)?$", regex::escape(&self.0))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_lowercases_and_hyphenates() {
        assert_eq!(Slug::from_name("Coffee Shop").as_str(), "coffee-shop");
        assert_eq!(Slug::from_name("  Coffee   Shop  ").as_str(), "coffee-shop");
        assert_eq!(Slug::from_name("Coffee_Shop--Two").as_str(), "coffee-shop-two");
    }

    #[test]
    fn test_from_name_strips_punctuation() {
        assert_eq!(Slug::from_name("Tim's").as_str(), "tims");
        assert_eq!(Slug::from_name("Bagels & Co.").as_str(), "bagels-co");
        assert_eq!(Slug::from_name("Café Olé").as_str(), "caf-ol");
    }

    #[test]
    fn test_from_name_falls_back_when_nothing_survives() {
        assert_eq!(Slug::from_name("!!!").as_str(), Slug::FALLBACK);
        assert_eq!(Slug::from_name("   ").as_str(), Slug::FALLBACK);
    }

    #[test]
    fn test_with_suffix() {
        let slug = Slug::from_name("Bagels");
        assert_eq!(slug.with_suffix(2).as_str(), "bagels-2");
        assert_eq!(slug.with_suffix(10).as_str(), "bagels-10");
    }

    #[test]
    fn test_collision_pattern_shape() {
        let slug = Slug::from_name("Bagels");
        assert_eq!(slug.collision_pattern(), "^(bagels)(-[0-9]+)?$");
    }

    #[test]
    fn test_collision_pattern_escapes_metacharacters() {
        let slug = Slug::from_stored("a.b+c");
        assert_eq!(slug.collision_pattern(), r"^(a\.b\+c)(-[0-9]+)?$");
    }

    #[test]
    fn test_collision_pattern_escapes_separators() {
        let slug = Slug::from_name("Bagel Barn");
        assert_eq!(slug.collision_pattern(), r"^(bagel\-barn)(-[0-9]+)?$");
    }
}
