//! Option declaration, normalization and input matching
//!
//! Matching is case-insensitive and runs in a fixed order:
//! 1. exact match against a declared key or alias
//! 2. the 1-based position of an option declared without a key
//! 3. an unambiguous prefix of a declared key, only at nodes without a
//!    `_default` option
//! 4. the `_default` option, which receives the whole raw input
//!
//! When two options share an effective key the first declared wins.

use crate::context::{Kwargs, NodeContext};
use crate::error::MenuError;
use crate::node::{NodeError, NodeId};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Key of the catch-all option
pub const DEFAULT_KEY: &str = "_default";

/// Computes the next node from the session and the matched input
pub type GotoFn =
    Arc<dyn Fn(&mut NodeContext, &str, &Kwargs) -> Result<Jump, NodeError> + Send + Sync>;

/// Side-effecting logic run before the goto is resolved
pub type ExecFn =
    Arc<dyn Fn(&mut NodeContext, &str, &Kwargs) -> Result<(), NodeError> + Send + Sync>;

/// Declared key of an option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OptionKey {
    /// No key; the option is addressed by its position
    #[default]
    Auto,
    Key(String),
    /// Several aliases; the first is the one displayed
    Aliases(Vec<String>),
}

impl From<&str> for OptionKey {
    fn from(key: &str) -> Self {
        OptionKey::Key(key.to_string())
    }
}

impl From<String> for OptionKey {
    fn from(key: String) -> Self {
        OptionKey::Key(key)
    }
}

impl<const N: usize> From<[&str; N]> for OptionKey {
    fn from(aliases: [&str; N]) -> Self {
        OptionKey::Aliases(aliases.iter().map(|a| (*a).to_string()).collect())
    }
}

impl From<Vec<String>> for OptionKey {
    fn from(aliases: Vec<String>) -> Self {
        OptionKey::Aliases(aliases)
    }
}

/// Where selecting an option leads
#[derive(Clone)]
pub enum Goto {
    /// A fixed node, entered with the given kwargs
    Node { node: NodeId, kwargs: Kwargs },
    /// A node computed at selection time
    Computed { func: GotoFn, kwargs: Kwargs },
}

impl fmt::Debug for Goto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goto::Node { node, kwargs } => f
                .debug_struct("Node")
                .field("node", node)
                .field("kwargs", kwargs)
                .finish(),
            Goto::Computed { kwargs, .. } => f
                .debug_struct("Computed")
                .field("kwargs", kwargs)
                .finish_non_exhaustive(),
        }
    }
}

/// Logic run when an option is selected
#[derive(Clone)]
pub enum Exec {
    Call { func: ExecFn, kwargs: Kwargs },
    /// Run another node for its side effects; its text is shown, its
    /// options are discarded
    Node { node: NodeId, kwargs: Kwargs },
}

impl fmt::Debug for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exec::Call { kwargs, .. } => f
                .debug_struct("Call")
                .field("kwargs", kwargs)
                .finish_non_exhaustive(),
            Exec::Node { node, kwargs } => f
                .debug_struct("Node")
                .field("node", node)
                .field("kwargs", kwargs)
                .finish(),
        }
    }
}

/// Result of a computed goto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jump {
    /// `None` exits the menu
    pub node: Option<NodeId>,
    /// Merged into session attributes and delivered to the target node
    pub kwargs: Kwargs,
}

impl Jump {
    pub fn to(node: impl Into<NodeId>) -> Self {
        Self {
            node: Some(node.into()),
            kwargs: Kwargs::new(),
        }
    }

    pub fn exit() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// One selectable choice, as declared by node logic
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    pub key: OptionKey,
    pub desc: Option<String>,
    pub goto: Option<Goto>,
    pub exec: Option<Exec>,
}

impl OptionSpec {
    /// An option without a key; it is addressed by position
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<OptionKey>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// The catch-all option
    pub fn default_option() -> Self {
        Self::with_key(DEFAULT_KEY)
    }

    #[must_use]
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    #[must_use]
    pub fn goto(self, node: impl Into<NodeId>) -> Self {
        self.goto_with(node, Kwargs::new())
    }

    #[must_use]
    pub fn goto_with(mut self, node: impl Into<NodeId>, kwargs: Kwargs) -> Self {
        self.goto = Some(Goto::Node {
            node: node.into(),
            kwargs,
        });
        self
    }

    #[must_use]
    pub fn goto_fn<F>(self, func: F) -> Self
    where
        F: Fn(&mut NodeContext, &str, &Kwargs) -> Result<Jump, NodeError> + Send + Sync + 'static,
    {
        self.goto_fn_with(func, Kwargs::new())
    }

    #[must_use]
    pub fn goto_fn_with<F>(mut self, func: F, kwargs: Kwargs) -> Self
    where
        F: Fn(&mut NodeContext, &str, &Kwargs) -> Result<Jump, NodeError> + Send + Sync + 'static,
    {
        self.goto = Some(Goto::Computed {
            func: Arc::new(func),
            kwargs,
        });
        self
    }

    #[must_use]
    pub fn exec<F>(self, func: F) -> Self
    where
        F: Fn(&mut NodeContext, &str, &Kwargs) -> Result<(), NodeError> + Send + Sync + 'static,
    {
        self.exec_with(func, Kwargs::new())
    }

    #[must_use]
    pub fn exec_with<F>(mut self, func: F, kwargs: Kwargs) -> Self
    where
        F: Fn(&mut NodeContext, &str, &Kwargs) -> Result<(), NodeError> + Send + Sync + 'static,
    {
        self.exec = Some(Exec::Call {
            func: Arc::new(func),
            kwargs,
        });
        self
    }

    #[must_use]
    pub fn exec_node(mut self, node: impl Into<NodeId>, kwargs: Kwargs) -> Self {
        self.exec = Some(Exec::Node {
            node: node.into(),
            kwargs,
        });
        self
    }
}

/// An option after normalization, ready for display and matching
#[derive(Debug, Clone)]
pub struct MenuOption {
    index: usize,
    declared_key: bool,
    aliases: Vec<String>,
    display_key: Option<String>,
    is_default: bool,
    desc: Option<String>,
    goto: Option<Goto>,
    exec: Option<Exec>,
}

impl MenuOption {
    /// 1-based position in declaration order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Key shown to the entity; `None` for a bare `_default` option
    pub fn display_key(&self) -> Option<&str> {
        self.display_key.as_deref()
    }

    /// Lowercased aliases this option matches, excluding `_default`
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn goto(&self) -> Option<&Goto> {
        self.goto.as_ref()
    }

    pub fn exec(&self) -> Option<&Exec> {
        self.exec.as_ref()
    }

    /// An input that selects this option
    pub fn probe_input(&self) -> String {
        if let Some(alias) = self.aliases.first() {
            alias.clone()
        } else if self.is_default {
            "test raw input".to_string()
        } else {
            self.index.to_string()
        }
    }
}

/// Which rule matched an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedKey {
    Key(String),
    Index(usize),
    /// Unambiguous prefix of a declared key
    Prefix(String),
    Default,
}

/// A matched option together with the rule that matched it
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub option: &'a MenuOption,
    pub matched: MatchedKey,
}

/// Canonical form of keys and input for matching
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Turn declared options into their canonical list
pub fn normalize(specs: Vec<OptionSpec>) -> Vec<MenuOption> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| {
            let index = i + 1;
            let declared: Vec<String> = match spec.key {
                OptionKey::Auto => Vec::new(),
                OptionKey::Key(key) => vec![key],
                OptionKey::Aliases(aliases) => aliases,
            };
            let declared: Vec<String> = declared
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();

            let is_default = declared.iter().any(|k| k.eq_ignore_ascii_case(DEFAULT_KEY));
            let visible: Vec<&String> = declared
                .iter()
                .filter(|k| !k.eq_ignore_ascii_case(DEFAULT_KEY))
                .collect();

            let mut aliases: Vec<String> = Vec::with_capacity(visible.len());
            for key in &visible {
                let key = normalize_key(key);
                if !aliases.contains(&key) {
                    aliases.push(key);
                }
            }

            let declared_key = !declared.is_empty();
            let display_key = if declared_key {
                visible.first().map(|k| (*k).clone())
            } else {
                Some(index.to_string())
            };

            MenuOption {
                index,
                declared_key,
                aliases,
                display_key,
                is_default,
                desc: spec.desc,
                goto: spec.goto,
                exec: spec.exec,
            }
        })
        .collect()
}

/// Match against declared keys, then positional indices of keyless options
pub fn match_key<'a>(options: &'a [MenuOption], raw: &str) -> Option<Selection<'a>> {
    let cmd = normalize_key(raw);
    if cmd.is_empty() {
        return None;
    }

    if let Some(option) = options.iter().find(|o| o.aliases.contains(&cmd)) {
        return Some(Selection {
            option,
            matched: MatchedKey::Key(cmd),
        });
    }

    let index: usize = cmd.parse().ok()?;
    options
        .iter()
        .find(|o| !o.declared_key && o.index == index)
        .map(|option| Selection {
            option,
            matched: MatchedKey::Index(index),
        })
}

/// Match input that starts exactly one option's declared key.
///
/// Ambiguous prefixes match nothing. A node with a `_default` option
/// never matches on prefix: unmatched input belongs to the catch-all.
pub fn match_prefix<'a>(options: &'a [MenuOption], raw: &str) -> Option<Selection<'a>> {
    let cmd = normalize_key(raw);
    if cmd.is_empty() || options.iter().any(MenuOption::is_default) {
        return None;
    }

    let mut candidates = options
        .iter()
        .filter(|o| o.aliases.iter().any(|a| a.starts_with(&cmd)));
    let option = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some(Selection {
        option,
        matched: MatchedKey::Prefix(cmd),
    })
}

/// The first `_default` option, if any
pub fn match_default(options: &[MenuOption]) -> Option<Selection<'_>> {
    options.iter().find(|o| o.is_default).map(|option| Selection {
        option,
        matched: MatchedKey::Default,
    })
}

/// Full matching: keys, positions, prefixes, then the catch-all.
///
/// Fails with [`MenuError::NoMatch`] when nothing matches and no
/// `_default` option exists.
pub fn resolve<'a>(options: &'a [MenuOption], raw: &str) -> Result<Selection<'a>, MenuError> {
    match_key(options, raw)
        .or_else(|| match_prefix(options, raw))
        .or_else(|| match_default(options))
        .ok_or_else(|| MenuError::NoMatch(raw.to_string()))
}

/// Where a selected option leads, once its goto has been evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Node {
        node: NodeId,
        kwargs: Kwargs,
    },
    /// Re-run the current node (an exec without a goto)
    Rerun,
    Exit,
}

/// Evaluate an option's goto.
///
/// Kwargs returned by a computed goto are merged into the session
/// attributes before the target node runs.
pub fn resolve_target(
    option: &MenuOption,
    ctx: &mut NodeContext,
    raw: &str,
) -> Result<Target, NodeError> {
    match &option.goto {
        Some(Goto::Node { node, kwargs }) => Ok(Target::Node {
            node: node.clone(),
            kwargs: kwargs.clone(),
        }),
        Some(Goto::Computed { func, kwargs }) => {
            let jump = func(ctx, raw, kwargs)?;
            match jump.node {
                Some(node) => {
                    ctx.merge_attributes(&jump.kwargs);
                    Ok(Target::Node {
                        node,
                        kwargs: jump.kwargs,
                    })
                }
                None => Ok(Target::Exit),
            }
        }
        None if option.exec.is_some() => Ok(Target::Rerun),
        None => Ok(Target::Exit),
    }
}

/// One line per visible option, e.g. ` s: Set an attribute`
pub fn format_listing(options: &[MenuOption]) -> String {
    options
        .iter()
        .filter_map(|o| {
            let key = o.display_key()?;
            Some(match o.desc() {
                Some(desc) => format!(" {key}: {desc}"),
                None => format!(" {key}"),
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}
