//! Command tree arena
//!
//! Commands are stored in a single `Vec` and refer to their parent by index,
//! so walking up the tree never needs shared ownership.

use std::collections::HashSet;
use std::fmt;

/// Index of a command inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Points at one flag: the command that declares it and its slot there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagRef {
    pub owner: NodeId,
    index: usize,
}

/// Where a flag's current value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    CommandLine,
    Environment { variable: String, key: String },
    ConfigFile { key: String },
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CommandLine => write!(f, "command line"),
            ValueSource::Environment { variable, .. } => write!(f, "env {}", variable),
            ValueSource::ConfigFile { key } => write!(f, "file {}", key),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// One bindable flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    name: String,
    id: String,
    persistent: bool,
    default: Option<String>,
    value: Option<String>,
    source: Option<ValueSource>,
}

impl FlagSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            persistent: false,
            default: None,
            value: None,
            source: None,
        }
    }

    /// Set the identifier used to look the flag up in parsed arguments,
    /// when it differs from the flag's name.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Make the flag visible to every descendant of the declaring command.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        let default = default.into();
        self.value = Some(default.clone());
        self.source = Some(ValueSource::Default);
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn source(&self) -> Option<&ValueSource> {
        self.source.as_ref()
    }

    pub fn is_explicitly_set(&self) -> bool {
        matches!(self.source, Some(ValueSource::CommandLine))
    }

    /// Record a value supplied directly by the caller. Nothing overrides it.
    pub fn set_explicit(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
        self.source = Some(ValueSource::CommandLine);
    }

    pub(crate) fn bind(&mut self, value: String, source: ValueSource) {
        self.value = Some(value);
        self.source = Some(source);
    }

    pub(crate) fn reset_to_default(&mut self) {
        self.value = self.default.clone();
        self.source = self.default.as_ref().map(|_| ValueSource::Default);
    }
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    flags: Vec<FlagSpec>,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Flags declared on this command, persistent ones included.
    pub fn flags(&self) -> &[FlagSpec] {
        &self.flags
    }
}

/// A tree of named commands, rooted at the application itself.
#[derive(Debug, Clone)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![CommandNode {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                flags: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Add a subcommand under `parent`.
    ///
    /// Names are unique among siblings: adding a name twice returns the
    /// existing child.
    pub fn add_command(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let name = name.into();
        if let Some(existing) = self.find_child(parent, &name) {
            return existing;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode {
            name,
            parent: Some(parent),
            children: Vec::new(),
            flags: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Declare a flag on `node`, replacing any flag of the same name there.
    pub fn add_flag(&mut self, node: NodeId, flag: FlagSpec) -> FlagRef {
        let flags = &mut self.nodes[node.0].flags;
        let index = match flags.iter().position(|f| f.name == flag.name) {
            Some(index) => {
                flags[index] = flag;
                index
            }
            None => {
                flags.push(flag);
                flags.len() - 1
            }
        };
        FlagRef { owner: node, index }
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).children.iter().copied().find(|child| self.node(*child).name == name)
    }

    /// Find a command by its path below the root, e.g. `["noun", "verb"]`.
    pub fn find(&self, path: &[&str]) -> Option<NodeId> {
        path.iter().try_fold(self.root(), |node, name| self.find_child(node, name))
    }

    /// Commands from the root down to `node`, both included.
    pub fn ancestry(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Names of the commands below the root down to `node`.
    pub fn path(&self, node: NodeId) -> Vec<&str> {
        self.ancestry(node).into_iter().skip(1).map(|id| self.node(id).name()).collect()
    }

    /// Flags visible while `node` executes: persistent flags of every
    /// ancestor, from the root down, followed by the node's own flags. A flag
    /// declared deeper shadows an ancestor flag with the same name.
    pub fn visible_flags(&self, node: NodeId) -> Vec<FlagRef> {
        let mut visible = Vec::new();
        for id in self.ancestry(node) {
            let inherited_only = id != node;
            for (index, flag) in self.node(id).flags.iter().enumerate() {
                if inherited_only && !flag.persistent {
                    continue;
                }
                visible.push(FlagRef { owner: id, index });
            }
        }

        let mut seen = HashSet::new();
        let mut unshadowed: Vec<FlagRef> =
            visible.into_iter().rev().filter(|f| seen.insert(self.flag(*f).name())).collect();
        unshadowed.reverse();
        unshadowed
    }

    pub fn flag(&self, flag: FlagRef) -> &FlagSpec {
        &self.nodes[flag.owner.0].flags[flag.index]
    }

    pub fn flag_mut(&mut self, flag: FlagRef) -> &mut FlagSpec {
        &mut self.nodes[flag.owner.0].flags[flag.index]
    }

    /// Look up a flag by name among those visible at `node`.
    pub fn lookup_flag(&self, node: NodeId, name: &str) -> Option<FlagRef> {
        self.visible_flags(node).into_iter().find(|f| self.flag(*f).name == name)
    }
}
