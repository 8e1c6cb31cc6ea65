//! Environment variable snapshot

use std::collections::BTreeMap;

/// Environment variables visible to one binding pass.
///
/// Bindings read from this snapshot rather than from the live process
/// environment, so callers and tests can supply their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment. Variables whose name or
    /// value is not valid UTF-8 are left out.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Value of `name`. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Non-empty variables whose name starts with `PREFIX_`, paired with the
    /// configuration key they spell: `APP_DB_HOST` gives `db.host`.
    pub fn prefixed<'a>(&'a self, prefix: &str) -> impl Iterator<Item = (&'a str, String, &'a str)> + 'a {
        let marker = format!("{}_", prefix.to_uppercase());
        self.vars.iter().filter_map(move |(name, value)| {
            let rest = name.strip_prefix(&marker)?;
            if rest.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.as_str(), rest.to_lowercase().replace('_', "."), value.as_str()))
        })
    }
}
