//! Example menu
//!
//! Exercises every kind of node and option: static and context-aware
//! nodes, a node that sees the raw input, exec callbacks, computed gotos,
//! a node used as an exec, a catch-all option and a node with help text.
//! The `menu-demo` binary runs it over stdin.

use crate::config::MenuConfig;
use crate::context::{Kwargs, NodeContext};
use crate::node::registry::NodeRegistry;
use crate::node::{NodeError, NodeOutput};
use crate::options::{Jump, OptionSpec};
use serde_json::{json, Value};

/// Catalog name of the demo menu
pub const MENU_NAME: &str = "demo";
pub const START_NODE: &str = "test_start_node";

const DYNAMIC_NODE: &str = "test_dynamic_node";
const VIEW_NODE: &str = "test_view_node";

/// Config the demo menu is normally opened with
pub fn config() -> MenuConfig {
    MenuConfig::new(START_NODE)
        .attribute("testval", "val")
        .attribute("testval2", "val2")
}

pub fn registry() -> NodeRegistry {
    NodeRegistry::from_namespace(crate::node_module![
        test_start_node,
        test_set_node,
        test_look_node,
        test_view_node,
        test_dynamic_node,
        test_end_node,
        test_displayinput_node,
    ])
}

fn kwargs<const N: usize>(pairs: [(&str, Value); N]) -> Kwargs {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn test_start_node(ctx: &mut NodeContext) -> NodeOutput {
    let text = format!(
        "This is an example menu.\n\n\
         If you enter anything except the valid options, your input will be\n\
         recorded and you will be brought to a menu entry showing your input.\n\n\
         Select options or use 'quit' to exit the menu.\n\n\
         The menu was initialized with two variables: {} and {}.",
        ctx.attr_str("testval").unwrap_or("-"),
        ctx.attr_str("testval2").unwrap_or("-"),
    );

    NodeOutput::new(text).with_options([
        OptionSpec::with_key(["Set", "s"])
            .desc("Set an attribute on the menu.")
            .exec(|ctx, _raw, _kwargs| {
                ctx.set_attr("menuattrtest", "Test value");
                Ok(())
            })
            .goto("test_set_node"),
        OptionSpec::with_key(["Look", "l"])
            .desc("Look and see a custom message.")
            .goto("test_look_node"),
        OptionSpec::with_key(["View", "v"])
            .desc("View your own name.")
            .goto(VIEW_NODE),
        OptionSpec::with_key(["Dynamic", "d"])
            .desc("Dynamic node.")
            .goto_fn(enter_dynamic),
        OptionSpec::with_key(["Quit", "quit", "q", "Q"])
            .desc("Quit this menu example.")
            .goto("test_end_node"),
        OptionSpec::default_option().goto("test_displayinput_node"),
    ])
}

fn enter_dynamic(_ctx: &mut NodeContext, _raw: &str, _kwargs: &Kwargs) -> Result<Jump, NodeError> {
    Ok(Jump::to(DYNAMIC_NODE).with_kwarg("origin", START_NODE))
}

fn test_set_node(ctx: &mut NodeContext) -> NodeOutput {
    let value = ctx.attr_str("menuattrtest").unwrap_or("<unset>").to_string();
    let text = format!(
        "The attribute 'menuattrtest' was set to\n\n     {value}\n\n\
         (Enter anything to go back.)"
    );
    NodeOutput::new(text)
        .with_help(
            "This is the help entry for this node. It is shown when the\n\
             node declares its own help text.",
        )
        .with_options(OptionSpec::with_key(["back (default)", "_default"]).goto(START_NODE))
}

fn test_look_node() -> NodeOutput {
    NodeOutput::empty().with_options(
        OptionSpec::with_key(["Look", "l"])
            .desc("Go back to the previous menu.")
            .goto(START_NODE),
    )
}

fn test_view_node(ctx: &mut NodeContext) -> NodeOutput {
    let text = format!(
        "Your name is {}!\n\n\
         This text was generated from the menu's context.",
        ctx.entity()
    );
    let from_dynamic = ctx
        .kwarg("executed_from_dynamic_node")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if from_dynamic {
        ctx.msg(format!("{text}\n(This node was run as an exec.)"));
        return NodeOutput::empty();
    }
    NodeOutput::new(text).with_options(OptionSpec::new().desc("back to start").goto(START_NODE))
}

fn test_dynamic_node(ctx: &mut NodeContext) -> NodeOutput {
    let visits = ctx
        .attr("dynamic_visits")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        + 1;
    ctx.set_attr("dynamic_visits", visits);

    let arrival = match ctx.kwarg("step").and_then(Value::as_i64) {
        Some(step) => format!("You looped back with step {step}."),
        None => match ctx.kwarg("origin").and_then(Value::as_str) {
            Some(origin) => format!("You arrived from {origin}."),
            None => "You arrived here again.".to_string(),
        },
    };
    let text = format!(
        "This is a dynamic node (visit {visits}).\n\n{arrival}\n\n\
         Each option below comes back here in a different way."
    );

    NodeOutput::new(text).with_options([
        OptionSpec::new()
            .desc("Loop back with a step counter.")
            .goto_with(DYNAMIC_NODE, kwargs([("step", json!(visits))])),
        OptionSpec::new()
            .desc("Run a callback and stay here.")
            .exec_with(record_call, kwargs([("mode", json!("exec"))])),
        OptionSpec::new()
            .desc("Compute where to go next.")
            .goto_fn_with(computed_goto, kwargs([("mode", json!("goto"))])),
        OptionSpec::new()
            .desc("Show your name, then stay here.")
            .exec_node(
                VIEW_NODE,
                kwargs([("executed_from_dynamic_node", json!(true))]),
            )
            .goto(DYNAMIC_NODE),
        OptionSpec::new()
            .desc("Back to the start.")
            .goto(START_NODE),
    ])
}

fn record_call(ctx: &mut NodeContext, raw: &str, kwargs: &Kwargs) -> Result<(), NodeError> {
    let mode = kwargs.get("mode").cloned().unwrap_or(Value::Null);
    ctx.set_attr("last_call", json!({ "mode": mode, "input": raw }));
    ctx.msg(format!("Callback ran with input '{raw}'."));
    Ok(())
}

fn computed_goto(_ctx: &mut NodeContext, _raw: &str, kwargs: &Kwargs) -> Result<Jump, NodeError> {
    let mode = kwargs.get("mode").cloned().unwrap_or(Value::Null);
    Ok(Jump::to(DYNAMIC_NODE).with_kwarg("came_from", mode))
}

fn test_end_node() -> NodeOutput {
    NodeOutput::new(
        "This is the end of the menu. Since this node has no options,\n\
         the menu will exit here, followed by a call of the 'look' command.",
    )
}

fn test_displayinput_node(_ctx: &mut NodeContext, raw: &str) -> NodeOutput {
    let text = format!(
        "You entered the text:\n\n    \"{raw}\"\n\n\
         ... which could now be handled or stored here in some way if this\n\
         was not just an example.\n\n\
         This node has an option with a single key '_default', which catches\n\
         any input, so entering anything will lead back to the start."
    );
    NodeOutput::new(text).with_options(OptionSpec::default_option().goto(START_NODE))
}
