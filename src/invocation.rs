//! The resolved state of one command invocation

use crate::error::Result;
use crate::key::QualifiedKey;
use crate::merge::Resolution;
use crate::settings::Settings;
use crate::tree::{CommandTree, FlagSpec, NodeId, ValueSource};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Everything a command body needs after binding: the executing command,
/// every visible flag with its final value, and the merged settings.
#[derive(Debug, Clone)]
pub struct Invocation {
    tree: CommandTree,
    node: NodeId,
    resolution: Resolution,
    settings: Settings,
    config_file: Option<PathBuf>,
}

impl Invocation {
    pub(crate) fn new(
        tree: CommandTree,
        node: NodeId,
        resolution: Resolution,
        settings: Settings,
        config_file: Option<PathBuf>,
    ) -> Self {
        Self { tree, node, resolution, settings, config_file }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Subcommand names from below the root to the executing command.
    pub fn command_path(&self) -> Vec<&str> {
        self.tree.path(self.node)
    }

    pub fn flag(&self, name: &str) -> Option<&FlagSpec> {
        self.tree.lookup_flag(self.node, name).map(|f| self.tree.flag(f))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.flag(name).and_then(FlagSpec::value)
    }

    pub fn source(&self, name: &str) -> Option<&ValueSource> {
        self.flag(name).and_then(FlagSpec::source)
    }

    /// Visible flags in binding order, each with the keys it was bound to.
    pub fn flags(&self) -> impl Iterator<Item = (&FlagSpec, &[QualifiedKey])> {
        self.resolution.bindings().iter().map(|b| (self.tree.flag(b.flag), b.keys.as_slice()))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The config file the values were read from, if one was found.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.settings.decode()
    }

    pub fn decode_into<T: DeserializeOwned>(&self, target: &mut T) -> Result<()> {
        self.settings.decode_into(target)
    }
}
