//! Menu nodes
//!
//! A node is an opaque callable producing display text and a set of
//! options. Callables come in three arities (no arguments, context only,
//! context plus the raw input that led to the node); the variant is fixed
//! when the callable is registered.

pub mod executor;
pub mod registry;

use crate::context::NodeContext;
use crate::options::OptionSpec;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stable node identifier
pub type NodeId = String;

pub type NodeResult = Result<NodeOutput, NodeError>;

/// Error raised by node, exec or goto logic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NodeError(String);

impl NodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Options as returned by node logic, before normalization
#[derive(Debug, Clone, Default)]
pub enum NodeOptions {
    #[default]
    None,
    One(OptionSpec),
    Many(Vec<OptionSpec>),
}

impl NodeOptions {
    pub fn into_vec(self) -> Vec<OptionSpec> {
        match self {
            NodeOptions::None => Vec::new(),
            NodeOptions::One(spec) => vec![spec],
            NodeOptions::Many(specs) => specs,
        }
    }
}

impl From<OptionSpec> for NodeOptions {
    fn from(spec: OptionSpec) -> Self {
        NodeOptions::One(spec)
    }
}

impl From<Vec<OptionSpec>> for NodeOptions {
    fn from(specs: Vec<OptionSpec>) -> Self {
        NodeOptions::Many(specs)
    }
}

impl<const N: usize> From<[OptionSpec; N]> for NodeOptions {
    fn from(specs: [OptionSpec; N]) -> Self {
        NodeOptions::Many(specs.into())
    }
}

/// What a node produces when executed
#[derive(Debug, Clone, Default)]
pub struct NodeOutput {
    pub text: Option<String>,
    /// Shown by the auto-help command
    pub help: Option<String>,
    pub options: NodeOptions,
}

impl NodeOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            help: None,
            options: NodeOptions::None,
        }
    }

    /// No text and no options
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: impl Into<NodeOptions>) -> Self {
        self.options = options.into();
        self
    }
}

/// Return types accepted from node callables
pub trait IntoNodeResult {
    fn into_node_result(self) -> NodeResult;
}

impl IntoNodeResult for NodeOutput {
    fn into_node_result(self) -> NodeResult {
        Ok(self)
    }
}

impl IntoNodeResult for NodeResult {
    fn into_node_result(self) -> NodeResult {
        self
    }
}

type StaticFn = dyn Fn() -> NodeResult + Send + Sync;
type ContextFn = dyn Fn(&mut NodeContext) -> NodeResult + Send + Sync;
type InputFn = dyn Fn(&mut NodeContext, &str) -> NodeResult + Send + Sync;

/// Node logic, tagged by the arguments it takes
#[derive(Clone)]
pub enum NodeFn {
    /// Takes nothing; static text and options
    Static(Arc<StaticFn>),
    /// Takes the session context
    Context(Arc<ContextFn>),
    /// Takes the session context and the raw input that led here
    Input(Arc<InputFn>),
}

impl NodeFn {
    pub fn new<M>(f: impl IntoNodeFn<M>) -> Self {
        f.into_node_fn()
    }

    pub fn arity(&self) -> usize {
        match self {
            NodeFn::Static(_) => 0,
            NodeFn::Context(_) => 1,
            NodeFn::Input(_) => 2,
        }
    }

    /// Invoke with whichever arguments this variant accepts
    pub fn call(&self, ctx: &mut NodeContext, raw_input: &str) -> NodeResult {
        match self {
            NodeFn::Static(f) => f(),
            NodeFn::Context(f) => f(ctx),
            NodeFn::Input(f) => f(ctx, raw_input),
        }
    }
}

impl fmt::Debug for NodeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeFn(arity={})", self.arity())
    }
}

/// Marker for zero-argument node callables
pub struct NoArgs;
/// Marker for context-only node callables
pub struct WithContext;
/// Marker for context-and-input node callables
pub struct WithInput;

/// Conversion from plain functions and closures into [`NodeFn`].
///
/// The marker parameter lets the callable's own signature select the
/// variant, so `fn start() -> NodeOutput` and
/// `fn echo(ctx: &mut NodeContext, raw: &str) -> NodeOutput` register the
/// same way.
pub trait IntoNodeFn<M> {
    fn into_node_fn(self) -> NodeFn;
}

impl IntoNodeFn<NodeFn> for NodeFn {
    fn into_node_fn(self) -> NodeFn {
        self
    }
}

impl<F, R> IntoNodeFn<NoArgs> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoNodeResult,
{
    fn into_node_fn(self) -> NodeFn {
        NodeFn::Static(Arc::new(move || self().into_node_result()))
    }
}

impl<F, R> IntoNodeFn<WithContext> for F
where
    F: Fn(&mut NodeContext) -> R + Send + Sync + 'static,
    R: IntoNodeResult,
{
    fn into_node_fn(self) -> NodeFn {
        NodeFn::Context(Arc::new(move |ctx: &mut NodeContext| {
            self(ctx).into_node_result()
        }))
    }
}

impl<F, R> IntoNodeFn<WithInput> for F
where
    F: Fn(&mut NodeContext, &str) -> R + Send + Sync + 'static,
    R: IntoNodeResult,
{
    fn into_node_fn(self) -> NodeFn {
        NodeFn::Input(Arc::new(move |ctx: &mut NodeContext, raw: &str| {
            self(ctx, raw).into_node_result()
        }))
    }
}
