//! ULID-based identifier generation with prefixes.
//!
//! Identifiers in opsdeck follow the pattern: `prefix_ulid`
//! For example: `snp_01hqxyz...` for file snapshots.

use ulid::Ulid;

/// Identifier generation and parsing utilities.
pub struct Identifier;

impl Identifier {
    /// Generate a new ascending identifier (newer = larger).
    ///
    /// Lexical ordering of ascending identifiers tracks creation time.
    pub fn ascending(prefix: &str) -> String {
        let ulid = Ulid::new();
        format!("{}_{}", prefix, ulid.to_string().to_lowercase())
    }

    /// Generate an identifier with a specific ULID (for testing or imports).
    pub fn with_ulid(prefix: &str, ulid: Ulid) -> String {
        format!("{}_{}", prefix, ulid.to_string().to_lowercase())
    }

    /// Parse an identifier into its prefix and ULID parts.
    pub fn parse(id: &str) -> Option<(&str, Ulid)> {
        let (prefix, rest) = id.split_once('_')?;
        if prefix.is_empty() {
            return None;
        }
        let ulid = Ulid::from_string(rest).ok()?;
        Some((prefix, ulid))
    }

    /// Check if an identifier has the expected prefix.
    pub fn has_prefix(id: &str, prefix: &str) -> bool {
        id.starts_with(prefix) && id.as_bytes().get(prefix.len()) == Some(&b'_')
    }

    /// Generate a snapshot ID.
    pub fn snapshot() -> String {
        Self::ascending("snp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_id() {
        let id = Identifier::snapshot();
        assert!(id.starts_with("snp_"));
        assert_eq!(id.len(), 30); // "snp_" (4) + ULID (26)
    }

    #[test]
    fn test_ascending_order() {
        let id1 = Identifier::snapshot();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = Identifier::snapshot();
        assert!(id1 < id2, "Ascending IDs should increase over time");
    }

    #[test]
    fn test_parse_id() {
        let id = Identifier::snapshot();
        let (prefix, _ulid) = Identifier::parse(&id).unwrap();
        assert_eq!(prefix, "snp");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Identifier::parse("nounderscore").is_none());
        assert!(Identifier::parse("snp_notaulid").is_none());
        assert!(Identifier::parse("_01HQXYZ").is_none());
    }

    #[test]
    fn test_has_prefix() {
        let id = Identifier::snapshot();
        assert!(Identifier::has_prefix(&id, "snp"));
        assert!(!Identifier::has_prefix(&id, "ses"));
        // Prefix must be followed by an underscore
        assert!(!Identifier::has_prefix("snp123", "snp"));
    }

    #[test]
    fn test_with_ulid() {
        let ulid = Ulid::new();
        let id = Identifier::with_ulid("snp", ulid);
        let (_, parsed) = Identifier::parse(&id).unwrap();
        assert_eq!(parsed, ulid);
    }
}
