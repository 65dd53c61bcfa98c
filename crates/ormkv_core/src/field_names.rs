//! Ordered field-name sets.

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::str::FromStr;

/// An ordered, non-empty set of field names.
///
/// The order is the order in which lookup values are supplied. Two sets
/// select the same index when they contain the same names, whatever their
/// order.
///
/// ```rust
/// use ormkv_core::FieldNames;
///
/// let fields: FieldNames = "owner, created".parse().unwrap();
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields.to_string(), "owner,created");
/// assert!(fields.same_set(&FieldNames::new(["created", "owner"]).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldNames {
    names: Vec<String>,
}

impl FieldNames {
    /// Builds a field-name set from individual names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldNames` if the list is empty, a name is blank, or a
    /// name appears twice.
    pub fn new<I, S>(names: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if name.is_empty() {
                return Err(OrmError::invalid_field_names("blank field name"));
            }
            if collected.contains(&name) {
                return Err(OrmError::invalid_field_names(format!(
                    "duplicate field name {name}"
                )));
            }
            collected.push(name);
        }
        if collected.is_empty() {
            return Err(OrmError::invalid_field_names("at least one field is required"));
        }
        Ok(Self { names: collected })
    }

    /// Parses a comma-separated list such as `"id,email"`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FieldNames::new`].
    pub fn parse(list: &str) -> OrmResult<Self> {
        Self::new(list.split(','))
    }

    /// Returns the names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates over the names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: field-name sets are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the position of `name`, if present.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns true if `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns true if both sets hold exactly the same names.
    #[must_use]
    pub fn same_set(&self, other: &Self) -> bool {
        self.len() == other.len() && other.iter().all(|name| self.contains(name))
    }
}

impl fmt::Display for FieldNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(","))
    }
}

impl FromStr for FieldNames {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldNames {
    type Error = OrmError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_comma_separated() {
        let fields = FieldNames::parse("id,email").unwrap();
        assert_eq!(fields.names(), &["id".to_string(), "email".to_string()]);
        assert_eq!(fields.position("email"), Some(1));
    }

    #[test]
    fn parse_trims_whitespace() {
        let fields = FieldNames::parse(" a , b ").unwrap();
        assert_eq!(fields.to_string(), "a,b");
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            FieldNames::new(Vec::<String>::new()),
            Err(OrmError::InvalidFieldNames { .. })
        ));
        assert!(matches!(
            FieldNames::parse(""),
            Err(OrmError::InvalidFieldNames { .. })
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        assert!(matches!(
            FieldNames::parse("id,id"),
            Err(OrmError::InvalidFieldNames { .. })
        ));
    }

    #[test]
    fn same_set_ignores_order() {
        let a = FieldNames::parse("a,b").unwrap();
        let b = FieldNames::parse("b,a").unwrap();
        let c = FieldNames::parse("a").unwrap();
        let d = FieldNames::parse("a,b,c").unwrap();
        assert!(a.same_set(&b));
        assert!(!a.same_set(&c));
        assert!(!a.same_set(&d));
        assert_ne!(a, b);
    }
}
