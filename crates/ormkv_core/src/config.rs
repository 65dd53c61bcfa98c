//! Schema configuration.

/// Configuration applied to every table of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Bytes prepended to every key the schema writes.
    ///
    /// Lets several schemas share one backend without overlapping.
    pub key_prefix: Vec<u8>,

    /// Whether deleting a record that does not exist fails with `NotFound`.
    ///
    /// When false (the default) such deletes are no-ops.
    pub strict_delete: bool,

    /// Limit applied to list scans that do not set one.
    ///
    /// When set, a list with default options returns at most this many
    /// records rather than every record. Callers page on with the returned
    /// cursor or pass an explicit limit. `None` (the default) leaves such
    /// scans unbounded.
    pub default_list_limit: Option<usize>,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets whether deleting a missing record is an error.
    #[must_use]
    pub const fn strict_delete(mut self, value: bool) -> Self {
        self.strict_delete = value;
        self
    }

    /// Sets the default list limit.
    #[must_use]
    pub const fn default_list_limit(mut self, limit: usize) -> Self {
        self.default_list_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.key_prefix.is_empty());
        assert!(!config.strict_delete);
        assert_eq!(config.default_list_limit, None);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .key_prefix(b"app/".to_vec())
            .strict_delete(true)
            .default_list_limit(50);

        assert_eq!(config.key_prefix, b"app/");
        assert!(config.strict_delete);
        assert_eq!(config.default_list_limit, Some(50));
    }
}
