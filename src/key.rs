//! Qualified configuration keys
//!
//! A key is a lower-cased dotted path such as `noun.verb.flag`. Flags are
//! looked up in the config file under their key and in the environment under
//! the key's upper snake case form.

use std::fmt;

/// A normalized dotted configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedKey(String);

impl QualifiedKey {
    /// Derive the root-level key for a flag.
    ///
    /// With `namespace_flags`, separators inside the name become namespace
    /// boundaries, so `--keycloak-username` is looked up as
    /// `keycloak.username`.
    pub fn for_flag(name: &str, namespace_flags: bool) -> Self {
        let lowered = name.to_lowercase();
        if namespace_flags {
            Self(lowered.replace(['-', '_'], "."))
        } else {
            Self(lowered)
        }
    }

    /// Qualify this key under a command namespace such as `noun.verb`.
    pub fn under(&self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self.clone();
        }
        Self(format!("{}.{}", prefix.to_lowercase(), self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// True when `other` lives inside the namespace this key names,
    /// e.g. `db` is a namespace ancestor of `db.host`.
    pub fn is_namespace_of(&self, other: &QualifiedKey) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }

    /// Name of the environment variable bound to this key.
    pub fn env_var(&self, prefix: &str) -> String {
        env_var_name(prefix, &self.0)
    }
}

impl fmt::Display for QualifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QualifiedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `APP` + `db.host` gives `APP_DB_HOST`.
pub fn env_var_name(prefix: &str, key: &str) -> String {
    let body = key.replace(['.', '-'], "_").to_uppercase();
    if prefix.is_empty() {
        body
    } else {
        format!("{}_{}", prefix.to_uppercase(), body)
    }
}

/// Every candidate key for a flag: the root-level key first, then one key per
/// command namespace from shallowest to deepest.
pub fn candidate_keys(flag_name: &str, prefixes: &[String], namespace_flags: bool) -> Vec<QualifiedKey> {
    let base = QualifiedKey::for_flag(flag_name, namespace_flags);
    let prefixed: Vec<QualifiedKey> = prefixes.iter().map(|prefix| base.under(prefix)).collect();
    std::iter::once(base).chain(prefixed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_key_without_namespacing_keeps_separators() {
        assert_eq!(QualifiedKey::for_flag("verb-flag", false).as_str(), "verb-flag");
        assert_eq!(QualifiedKey::for_flag("nounFlag", false).as_str(), "nounflag");
    }

    #[test]
    fn test_flag_key_with_namespacing() {
        assert_eq!(
            QualifiedKey::for_flag("keycloak-username", true).as_str(),
            "keycloak.username"
        );
        assert_eq!(QualifiedKey::for_flag("db_pool-size", true).as_str(), "db.pool.size");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let once = QualifiedKey::for_flag("favorite-color", true);
        let twice = QualifiedKey::for_flag(once.as_str(), true);
        assert_eq!(once, twice);

        let prefixes = vec!["noun".to_string(), "noun.verb".to_string()];
        assert_eq!(
            candidate_keys("favorite-color", &prefixes, true),
            candidate_keys("favorite-color", &prefixes, true)
        );
    }

    #[test]
    fn test_candidate_keys_order_shallow_to_deep() {
        let prefixes = vec!["noun".to_string(), "noun.verb".to_string()];
        let keys: Vec<String> = candidate_keys("verb-flag", &prefixes, false)
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["verb-flag", "noun.verb-flag", "noun.verb.verb-flag"]);
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(env_var_name("APP", "db.host"), "APP_DB_HOST");
        assert_eq!(env_var_name("tst", "noun.verb-flag"), "TST_NOUN_VERB_FLAG");
        assert_eq!(QualifiedKey::for_flag("nounFlag", false).under("noun").env_var("TST"), "TST_NOUN_NOUNFLAG");
    }

    #[test]
    fn test_namespace_relation() {
        let db = QualifiedKey::for_flag("db", true);
        let host = QualifiedKey::for_flag("db-host", true);
        let dbx = QualifiedKey::for_flag("dbx", true);
        assert!(db.is_namespace_of(&host));
        assert!(!host.is_namespace_of(&db));
        assert!(!db.is_namespace_of(&dbx));
        assert!(!db.is_namespace_of(&db));
    }
}
