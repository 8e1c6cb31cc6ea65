//! Binding flags to qualified keys and resolving their values
//!
//! Each flag visible at the executing command is bound to its root-level key
//! and, with prefixed commands, to one key per command namespace. A flag the
//! caller did not supply takes its value from the deepest key that resolves.
//! At that key the environment wins over the config file. When no key
//! resolves, the flag falls back to its default.

use crate::config::ConfigStore;
use crate::env::Environment;
use crate::error::{BindingError, BindingErrors, Error, Result};
use crate::key::{candidate_keys, QualifiedKey};
use crate::scope::prefixes;
use crate::tree::{CommandTree, FlagRef, NodeId, ValueSource};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How flag names turn into configuration keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Treat `-` and `_` in flag names as namespace separators.
    pub namespace_flags: bool,
    /// Also bind each flag under every command namespace of the executing
    /// command.
    pub prefix_commands: bool,
}

/// The value layers consulted for flags the caller did not supply.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub store: &'a ConfigStore,
    pub environment: &'a Environment,
    /// Environment variables are only consulted when a prefix is set.
    pub env_prefix: Option<&'a str>,
}

/// Shared flag that aborts a binding pass between two flags.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The keys one flag was bound to, shallowest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagBinding {
    pub flag: FlagRef,
    pub keys: Vec<QualifiedKey>,
}

/// Outcome of a successful binding pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    bindings: Vec<FlagBinding>,
}

impl Resolution {
    pub fn bindings(&self) -> &[FlagBinding] {
        &self.bindings
    }

    pub fn keys_for(&self, flag: FlagRef) -> Option<&[QualifiedKey]> {
        self.bindings.iter().find(|b| b.flag == flag).map(|b| b.keys.as_slice())
    }
}

/// Keys claimed so far in one pass, and the flag that owns each.
#[derive(Debug, Default)]
struct BindingTable {
    keys: BTreeMap<QualifiedKey, String>,
}

impl BindingTable {
    /// Bind all of `keys` to `flag`, or none of them. Keys of the same flag
    /// never conflict with each other, so a flag named like a command (e.g.
    /// `config` under `app config`) holds both `config` and `config.config`.
    fn bind_all(&mut self, flag: &str, keys: &[QualifiedKey]) -> Vec<BindingError> {
        let mut conflicts = Vec::new();

        for key in keys {
            let clash = self.keys.iter().find(|(existing, owner)| {
                owner.as_str() != flag
                    && (*existing == key || existing.is_namespace_of(key) || key.is_namespace_of(existing))
            });

            if let Some((existing, owner)) = clash {
                conflicts.push(BindingError {
                    flag: flag.to_string(),
                    key: key.to_string(),
                    existing_flag: owner.clone(),
                    existing_key: existing.to_string(),
                });
            }
        }

        if conflicts.is_empty() {
            for key in keys {
                tracing::trace!(flag, key = %key, "Binding flag");
                self.keys.insert(key.clone(), flag.to_string());
            }
        }

        conflicts
    }
}

/// Bind every flag visible at `node` and resolve the ones the caller did not
/// supply.
///
/// Binding conflicts across all flags are collected and returned together.
/// A flag with a conflict is left untouched, while the other flags still
/// resolve.
pub fn resolve(
    tree: &mut CommandTree,
    node: NodeId,
    sources: &Sources<'_>,
    options: MergeOptions,
    cancel: Option<&CancelToken>,
) -> Result<Resolution> {
    let prefixes = if options.prefix_commands { prefixes(tree, node) } else { Vec::new() };

    let mut table = BindingTable::default();
    let mut errors = Vec::new();
    let mut bindings = Vec::new();

    for flag_ref in tree.visible_flags(node) {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        let flag = tree.flag(flag_ref);
        let keys = candidate_keys(flag.name(), &prefixes, options.namespace_flags);

        let conflicts = table.bind_all(flag.name(), &keys);
        if !conflicts.is_empty() {
            errors.extend(conflicts);
            continue;
        }

        if flag.is_explicitly_set() {
            tracing::trace!(flag = flag.name(), "Flag set on the command line, skipping sources");
        } else {
            let resolved = lookup(&keys, sources);
            let flag = tree.flag_mut(flag_ref);
            match resolved {
                Some((value, source)) => {
                    tracing::debug!(flag = flag.name(), value = %value, source = %source, "Resolved flag");
                    flag.bind(value, source);
                }
                None => flag.reset_to_default(),
            }
        }

        bindings.push(FlagBinding { flag: flag_ref, keys });
    }

    if !errors.is_empty() {
        return Err(BindingErrors::new(errors).into());
    }

    Ok(Resolution { bindings })
}

/// The value at the deepest key that has one, environment before file.
fn lookup(keys: &[QualifiedKey], sources: &Sources<'_>) -> Option<(String, ValueSource)> {
    keys.iter().rev().find_map(|key| {
        let from_env = sources.env_prefix.and_then(|prefix| {
            let variable = key.env_var(prefix);
            let value = sources.environment.get(&variable)?.to_string();
            Some((value, ValueSource::Environment { variable, key: key.to_string() }))
        });

        from_env.or_else(|| {
            let value = sources.store.get_str(key.as_str())?;
            Some((value, ValueSource::ConfigFile { key: key.to_string() }))
        })
    })
}
