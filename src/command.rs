//! Building a [`CommandTree`] from clap
//!
//! clap parses the arguments. This module mirrors the clap command
//! definition as a tree, and records which flags the caller actually supplied.

use crate::tree::{CommandTree, FlagSpec, NodeId};
use clap::parser::ValueSource as ClapValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;

impl CommandTree {
    /// Mirror a clap command and its subcommands.
    ///
    /// Global arguments become persistent flags of the command that declares
    /// them. Positional arguments are skipped, and so are clap's own help and
    /// version flags.
    pub fn from_clap(cmd: &Command) -> Self {
        // building fills in implied defaults such as `false` for `SetTrue`
        let mut built = cmd.clone();
        built.build();

        let mut tree = CommandTree::new(built.get_name());
        let root = tree.root();
        add_clap_command(&mut tree, root, &built, &HashSet::new());
        tree
    }
}

fn add_clap_command(tree: &mut CommandTree, node: NodeId, cmd: &Command, inherited: &HashSet<String>) {
    let mut globals = inherited.clone();

    for arg in cmd.get_arguments() {
        if !is_flag(arg) {
            continue;
        }
        let id = arg.get_id().as_str();
        if arg.is_global_set() && inherited.contains(id) {
            // propagated copy of an ancestor's global flag
            continue;
        }

        let name = arg.get_long().unwrap_or(id);
        let mut flag = FlagSpec::new(name).with_id(id);
        if arg.is_global_set() {
            flag = flag.persistent();
            globals.insert(id.to_string());
        }
        if let Some(default) = join_values(arg.get_default_values().iter().map(|v| v.to_string_lossy())) {
            flag = flag.with_default(default);
        }
        tree.add_flag(node, flag);
    }

    for sub in cmd.get_subcommands() {
        if sub.get_name() == "help" {
            continue;
        }
        let child = tree.add_command(node, sub.get_name());
        add_clap_command(tree, child, sub, &globals);
    }
}

fn is_flag(arg: &Arg) -> bool {
    !arg.is_positional()
        && !matches!(
            arg.get_action(),
            ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
        )
}

fn join_values<'a>(values: impl Iterator<Item = std::borrow::Cow<'a, str>>) -> Option<String> {
    let parts: Vec<String> = values.map(|v| v.into_owned()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}

/// Follow the parsed subcommand chain and mark every flag the caller
/// supplied. Returns the executing command.
///
/// A value counts as supplied when clap took it from the command line or
/// from an `env` attribute declared on the argument itself.
pub fn apply_matches(tree: &mut CommandTree, matches: &ArgMatches) -> NodeId {
    let mut node = tree.root();
    let mut chain = vec![matches];
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        let Some(child) = tree.find_child(node, name) else { break };
        node = child;
        chain.push(sub);
        current = sub;
    }

    for flag_ref in tree.visible_flags(node) {
        let id = tree.flag(flag_ref).id().to_string();
        if let Some(value) = chain.iter().rev().find_map(|m| supplied_value(m, &id)) {
            tree.flag_mut(flag_ref).set_explicit(value);
        }
    }

    node
}

fn supplied_value(matches: &ArgMatches, id: &str) -> Option<String> {
    // `try_get_raw` rejects ids unknown at this level; `value_source` would panic
    let raw = matches.try_get_raw(id).ok().flatten()?;
    let source = matches.value_source(id)?;
    if !matches!(source, ClapValueSource::CommandLine | ClapValueSource::EnvVariable) {
        return None;
    }
    join_values(raw.map(|v| v.to_string_lossy()))
}

/// The raw value of `id` from the deepest matches that have one.
pub(crate) fn deepest_raw(matches: &ArgMatches, id: &str) -> Option<String> {
    let mut found = None;
    let mut current = Some(matches);
    while let Some(m) = current {
        let raw = m.try_get_raw(id).ok().flatten();
        if let Some(value) = raw.and_then(|raw| join_values(raw.map(|v| v.to_string_lossy()))) {
            found = Some(value);
        }
        current = m.subcommand().map(|(_, sub)| sub);
    }
    found
}
