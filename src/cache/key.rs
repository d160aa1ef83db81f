//! Cache key derivation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::failure::FailureRecord;

/// Content hash identifying a failure for caching
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a failure.
    ///
    /// Only the command text, stderr and exit code take part; the same failure
    /// in another directory or shell maps to the same key. The fields are
    /// serialised as JSON with sorted keys and hashed with SHA-256, so keys are
    /// stable across processes.
    pub fn for_failure(record: &FailureRecord) -> Self {
        let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
        fields.insert("command", Value::from(record.command.as_str()));
        fields.insert("exit_code", Value::from(record.exit_code));
        fields.insert("stderr", Value::from(record.stderr.as_str()));

        let canonical = serde_json::to_string(&fields).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record() -> FailureRecord {
        FailureRecord::new("ls /nope", 2)
            .stderr("ls: cannot access '/nope': No such file or directory")
    }

    #[test]
    fn test_key_is_stable_sha256() {
        assert_eq!(
            CacheKey::for_failure(&record()).as_str(),
            "087fadaf1381b4824938a306bfbc999671f29e4b8210b12feef09be5224f2354"
        );
    }

    #[test]
    fn test_key_ignores_context_fields() {
        let plain = record();
        let decorated = record()
            .working_directory("/tmp/elsewhere")
            .shell("fish")
            .stdout("some output")
            .execution_time(Duration::from_secs(3));

        assert_eq!(
            CacheKey::for_failure(&plain),
            CacheKey::for_failure(&decorated)
        );
    }

    #[test]
    fn test_key_changes_with_keyed_fields() {
        let base = CacheKey::for_failure(&record());

        let other_command = FailureRecord::new("ls /nope2", 2).stderr(record().stderr);
        let other_code = FailureRecord::new("ls /nope", 1).stderr(record().stderr);
        let other_stderr = FailureRecord::new("ls /nope", 2).stderr("different");

        assert_ne!(base, CacheKey::for_failure(&other_command));
        assert_ne!(base, CacheKey::for_failure(&other_code));
        assert_ne!(base, CacheKey::for_failure(&other_stderr));
    }

    #[test]
    fn test_key_display_is_hex() {
        let key = CacheKey::for_failure(&record());
        let shown = key.to_string();
        assert_eq!(shown.len(), 64);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
