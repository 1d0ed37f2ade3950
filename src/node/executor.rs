//! Node execution and output normalization

use super::{NodeFn, NodeId};
use crate::context::{Kwargs, NodeContext};
use crate::error::MenuError;
use crate::options::{self, MenuOption};

/// A node after execution: what the entity sees and can select
#[derive(Debug, Clone)]
pub struct RenderedNode {
    pub node: NodeId,
    pub text: Option<String>,
    pub help: Option<String>,
    pub options: Vec<MenuOption>,
}

impl RenderedNode {
    /// A node without options ends the menu
    pub fn is_terminal(&self) -> bool {
        self.options.is_empty()
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Text as presented: node text, then the option listing if enabled
    pub fn display_text(&self, list_options: bool) -> String {
        let text = self.text.as_deref().unwrap_or_default().trim_end();
        if !list_options {
            return text.to_string();
        }
        let listing = options::format_listing(&self.options);
        match (text.is_empty(), listing.is_empty()) {
            (_, true) => text.to_string(),
            (true, false) => listing,
            (false, false) => format!("{text}\n\n{listing}"),
        }
    }
}

/// Run a node with the given transition kwargs and normalize its output.
///
/// The context's current node and kwargs are switched to this node before
/// the callable runs.
pub fn run(
    node_id: &str,
    node: &NodeFn,
    ctx: &mut NodeContext,
    raw_input: &str,
    kwargs: Kwargs,
) -> Result<RenderedNode, MenuError> {
    ctx.enter(node_id, kwargs);
    let output = node.call(ctx, raw_input).map_err(|e| {
        tracing::warn!(node = %node_id, error = %e, "Menu node raised an error");
        MenuError::NodeFailed {
            node: node_id.to_string(),
            message: e.to_string(),
        }
    })?;

    let options = options::normalize(output.options.into_vec());
    tracing::debug!(
        node = %node_id,
        arity = node.arity(),
        options = options.len(),
        "Executed menu node"
    );

    Ok(RenderedNode {
        node: node_id.to_string(),
        text: output.text,
        help: output.help,
        options,
    })
}
