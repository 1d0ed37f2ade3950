//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::config::MenuConfig;
use crate::context::{EntityId, Kwargs};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(persistent: bool) -> MenuContext {
    MenuContext::new(
        EntityId::new("prop-entity"),
        "prop",
        MenuConfig::new("start").persistent(persistent),
    )
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_node() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("start".to_string()),
        Just("a".to_string()),
        Just("b".to_string()),
        "[a-z]{1,8}",
    ]
}

fn arb_kwargs() -> impl Strategy<Value = Kwargs> {
    proptest::collection::btree_map("[a-z]{1,5}", any::<i64>().prop_map(serde_json::Value::from), 0..3)
}

fn arb_exit_reason() -> impl Strategy<Value = ExitReason> {
    prop_oneof![
        Just(ExitReason::TerminalNode),
        Just(ExitReason::ExitOption),
        Just(ExitReason::Quit),
        Just(ExitReason::Error),
        Just(ExitReason::Disconnected),
        Just(ExitReason::ForceClosed),
    ]
}

fn arb_active_state() -> impl Strategy<Value = MenuState> {
    (arb_node(), "[a-z0-9 ]{0,10}", arb_kwargs()).prop_map(|(node, input, kwargs)| {
        MenuState::Active {
            node,
            input,
            kwargs,
        }
    })
}

fn arb_suspended_state() -> impl Strategy<Value = MenuState> {
    (arb_node(), "[a-z0-9 ]{0,10}", arb_kwargs()).prop_map(|(node, input, kwargs)| {
        MenuState::Suspended {
            node,
            input,
            kwargs,
        }
    })
}

fn arb_finished_state() -> impl Strategy<Value = MenuState> {
    prop_oneof![
        arb_exit_reason().prop_map(|reason| MenuState::Exiting { reason }),
        arb_exit_reason().prop_map(|reason| MenuState::Closed { reason }),
    ]
}

fn arb_state() -> impl Strategy<Value = MenuState> {
    prop_oneof![
        Just(MenuState::Entering),
        arb_active_state(),
        arb_suspended_state(),
        arb_finished_state(),
    ]
}

fn arb_resolution() -> impl Strategy<Value = Resolution> {
    prop_oneof![
        (arb_node(), "[a-z0-9 ]{0,10}", arb_kwargs()).prop_map(|(node, input, kwargs)| {
            Resolution::Goto {
                node,
                input,
                kwargs,
            }
        }),
        "[a-z0-9 ]{0,10}".prop_map(|input| Resolution::Rerun { input }),
        Just(Resolution::Exit),
        Just(Resolution::Quit),
        Just(Resolution::Look),
        Just(Resolution::Help),
        Just(Resolution::NoMatch),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        Just(Event::Disconnect),
        Just(Event::Reconnect),
        Just(Event::ForceClose),
        Just(Event::TeardownComplete),
        "[a-z0-9 ]{0,10}".prop_map(|raw| Event::Input { raw }),
        arb_resolution().prop_map(|resolution| Event::Resolved { resolution }),
        (arb_node(), arb_kwargs(), any::<bool>()).prop_map(|(node, kwargs, terminal)| {
            Event::NodeRendered {
                node,
                input: String::new(),
                kwargs,
                terminal,
            }
        }),
        "[a-z ]{1,20}".prop_map(|message| Event::Failed { message }),
    ]
}

fn teardown_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Teardown))
        .count()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: same inputs, same outputs
    #[test]
    fn prop_transition_is_deterministic(
        state in arb_state(),
        event in arb_event(),
        persistent in any::<bool>()
    ) {
        let ctx = test_context(persistent);
        let first = transition(&state, &ctx, event.clone());
        let second = transition(&state, &ctx, event);
        prop_assert_eq!(first, second);
    }

    // Invariant 2: Teardown only ever accompanies the move into Exiting
    #[test]
    fn prop_teardown_only_on_entering_exiting(
        state in arb_state(),
        event in arb_event(),
        persistent in any::<bool>()
    ) {
        if let Ok(result) = transition(&state, &test_context(persistent), event) {
            let count = teardown_count(&result.effects);
            prop_assert!(count <= 1, "Multiple teardowns: {:?}", result.effects);
            if count == 1 {
                prop_assert!(!state.is_finished(), "Teardown from finished state {:?}", state);
                prop_assert!(
                    matches!(result.new_state, MenuState::Exiting { .. }),
                    "Teardown without Exiting: {:?}",
                    result.new_state
                );
                prop_assert_eq!(result.effects.last(), Some(&Effect::Teardown));
            }
        }
    }

    // Invariant 3: any event sequence tears down at most once
    #[test]
    fn prop_event_sequences_tear_down_once(
        events in proptest::collection::vec(arb_event(), 0..30),
        persistent in any::<bool>()
    ) {
        let ctx = test_context(persistent);
        let mut state = MenuState::Entering;
        let mut teardowns = 0;

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                teardowns += teardown_count(&result.effects);
                state = result.new_state;
            }
        }
        // Always allowed to close at the end
        if let Ok(result) = transition(&state, &ctx, Event::ForceClose) {
            teardowns += teardown_count(&result.effects);
        }

        prop_assert!(teardowns <= 1, "Tore down {} times", teardowns);
    }

    // Invariant 4: force close from a live state always exits
    #[test]
    fn prop_force_close_exits_live_states(
        state in prop_oneof![Just(MenuState::Entering), arb_active_state(), arb_suspended_state()],
        persistent in any::<bool>()
    ) {
        let result = transition(&state, &test_context(persistent), Event::ForceClose).unwrap();
        prop_assert_eq!(
            result.new_state,
            MenuState::Exiting { reason: ExitReason::ForceClosed }
        );
        prop_assert_eq!(result.effects, vec![Effect::Teardown]);
    }

    // Invariant 5: a failed match never changes state
    #[test]
    fn prop_no_match_keeps_state(state in arb_active_state(), persistent in any::<bool>()) {
        let event = Event::Resolved { resolution: Resolution::NoMatch };
        let result = transition(&state, &test_context(persistent), event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects, vec![Effect::PresentNode]);
    }

    // Invariant 6: closed menus accept nothing but close requests
    #[test]
    fn prop_closed_rejects_everything_else(reason in arb_exit_reason(), event in arb_event()) {
        let state = MenuState::Closed { reason };
        let is_close = matches!(event, Event::ForceClose);
        let result = transition(&state, &test_context(false), event);
        if is_close {
            prop_assert!(result.unwrap().effects.is_empty());
        } else {
            prop_assert_eq!(result, Err(TransitionError::Closed));
        }
    }

    // Invariant 7: non-persistent menus never save or suspend
    #[test]
    fn prop_non_persistent_never_persists(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(false), event) {
            prop_assert!(!result.effects.contains(&Effect::PersistState));
            let suspended = matches!(
                (&state, &result.new_state),
                (MenuState::Active { .. }, MenuState::Suspended { .. })
            );
            prop_assert!(!suspended);
        }
    }

    // Invariant 8: rendering an interactive node lands on that node
    #[test]
    fn prop_render_lands_on_node(
        state in prop_oneof![Just(MenuState::Entering), arb_active_state()],
        node in arb_node(),
        kwargs in arb_kwargs()
    ) {
        let event = Event::NodeRendered {
            node: node.clone(),
            input: "in".to_string(),
            kwargs: kwargs.clone(),
            terminal: false,
        };
        let result = transition(&state, &test_context(false), event).unwrap();
        prop_assert_eq!(
            result.new_state,
            MenuState::Active { node, input: "in".to_string(), kwargs }
        );
    }
}
