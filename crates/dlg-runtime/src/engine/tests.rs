use std::sync::Arc;

use dlg_core::{
    Condition, DialogueTransition, DlgValue, Edge, EndData, EntryRestriction, Event, Node, NodeKind,
    SelectorType, TextArgument, TextArgumentKind, Uuid,
};
use dlg_graph::{Dialogue, DialogueSettings, NodeRef, ParticipantClassCatalog};

use super::*;
use crate::custom::{CustomCall, CustomCondition};
use crate::history::SharedMemory;
use crate::participant::{DialogueParticipant, MemoryParticipant, MemoryState};

fn guid(value: u128) -> Uuid {
    Uuid::from_u128(value)
}

fn load(start_nodes: Vec<Node>, nodes: Vec<Node>) -> Arc<Dialogue> {
    let mut dialogue =
        Dialogue::from_parts("test", start_nodes, nodes).expect("test dialogue should load");
    dialogue.refresh(
        &DialogueSettings::default(),
        &ParticipantClassCatalog::default(),
    );
    Arc::new(dialogue)
}

fn start_to(target: usize) -> Vec<Node> {
    vec![Node::start().with_child(Edge::to(target))]
}

fn options(participants: &[&Arc<MemoryParticipant>]) -> ContextOptions {
    let mut options = ContextOptions {
        random_seed: Some(1),
        ..ContextOptions::default()
    };
    for participant in participants {
        options = options.with_participant(Arc::clone(*participant) as Arc<dyn DialogueParticipant>);
    }
    options
}

fn edge_indices(options: &[ContextOption]) -> Vec<usize> {
    options.iter().map(|option| option.edge_index).collect()
}

fn three_way(virtual_parent: bool) -> Vec<Node> {
    let chooser = Node::speech("Guard", "Choose")
        .with_child(Edge::to(1).with_condition(Condition::bool_call("Player", "has_key", true)))
        .with_child(Edge::to(2))
        .with_child(Edge::to(3));
    let chooser = if virtual_parent {
        chooser.virtual_parent()
    } else {
        chooser
    };
    vec![
        chooser,
        Node::speech("Guard", "one").with_child(Edge::to(4)),
        Node::speech("Guard", "two").with_child(Edge::to(4)),
        Node::speech("Guard", "three").with_child(Edge::to(4)),
        Node::end(),
    ]
}

#[test]
fn multi_option_keeps_satisfied_and_all_children_in_order() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("has_key", false);
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let dialogue = load(start_to(0), three_way(false));

    let context = DialogueContext::start(dialogue, options(&[&player, &guard]), None)
        .expect("dialogue should start");
    assert_eq!(context.active_node_index(), Some(0));
    assert_eq!(edge_indices(context.current_options()), vec![1, 2]);
    assert_eq!(edge_indices(context.all_options()), vec![0, 1, 2]);
    assert!(!context.all_options()[0].satisfied);
    assert_eq!(context.current_options()[0].source, NodeRef::Regular(0));
}

#[test]
fn reevaluation_is_deterministic() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("has_key", false);
    let dialogue = load(start_to(0), three_way(false));
    let mut context =
        DialogueContext::start(dialogue, options(&[&player]), None).expect("dialogue should start");
    let first = context.current_options().to_vec();
    assert!(context.reevaluate_options());
    assert_eq!(context.current_options(), first.as_slice());
}

#[test]
fn virtual_parent_picks_first_satisfied_edge() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("has_key", false);
    let dialogue = load(start_to(0), three_way(true));

    let context =
        DialogueContext::start(dialogue, options(&[&player]), None).expect("dialogue should start");
    assert_eq!(context.active_node_index(), Some(2));
    assert_eq!(context.active_text(), "two");
    assert!(context.history().contains(0, context.dialogue().nodes()[0].guid));
}

#[test]
fn start_auto_resolves_virtual_parent_and_fires_child_events_once() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let nodes = vec![
        Node::speech("Guard", "hidden")
            .virtual_parent()
            .with_enter_event(Event::call("", "virtual_entered"))
            .with_child(Edge::to(1)),
        Node::speech("Guard", "Hello")
            .with_enter_event(Event::call("", "greeted"))
            .with_child(Edge::to(2).with_text("Bye")),
        Node::end(),
    ];
    let context = DialogueContext::start(load(start_to(0), nodes), options(&[&guard]), None)
        .expect("dialogue should start");

    assert_eq!(context.active_node_index(), Some(1));
    assert_eq!(context.active_text(), "Hello");
    assert_eq!(
        guard.fired_events(),
        vec!["virtual_entered".to_string(), "greeted".to_string()]
    );
    assert_eq!(context.current_options().len(), 1);
    assert_eq!(context.current_options()[0].text, "Bye");
}

#[test]
fn virtual_parent_cycle_ends_session_instead_of_recursing() {
    let nodes = vec![
        Node::speech("Guard", "a").virtual_parent().with_child(Edge::to(1)),
        Node::speech("Guard", "b").virtual_parent().with_child(Edge::to(0)),
    ];
    let dialogue = load(start_to(0), nodes);

    let entered = DialogueContext::start(Arc::clone(&dialogue), ContextOptions::default(), None)
        .expect("start should succeed and end");
    assert!(entered.is_ended());
    assert!(entered.current_options().is_empty());

    let evaluated = DialogueContext::start_from_node(dialogue, ContextOptions::default(), 0, false)
        .expect("start_from_node should succeed and end");
    assert!(evaluated.is_ended());
}

#[test]
fn once_restriction_consults_global_memory() {
    let nodes = vec![
        Node::speech("Guard", "first time")
            .with_guid(guid(1))
            .with_restriction(EntryRestriction::Once)
            .with_child(Edge::to(1)),
        Node::end(),
        Node::speech("Guard", "again").with_child(Edge::to(1)),
    ];
    let start = vec![Node::start().with_child(Edge::to(0)).with_child(Edge::to(2))];
    let dialogue = load(start, nodes);

    let first = DialogueContext::start(Arc::clone(&dialogue), ContextOptions::default(), None)
        .expect("first session should start");
    assert_eq!(first.active_node_index(), Some(0));

    let second_options = ContextOptions {
        memory: SharedMemory::from(first.into_memory()),
        ..ContextOptions::default()
    };
    let second = DialogueContext::start(Arc::clone(&dialogue), second_options, None)
        .expect("second session should start");
    assert_eq!(second.active_node_index(), Some(2));

    let fresh = DialogueContext::start(dialogue, ContextOptions::default(), None)
        .expect("fresh session should start");
    assert_eq!(fresh.active_node_index(), Some(0));
}

#[test]
fn once_restriction_holds_across_concurrent_sessions() {
    let nodes = vec![
        Node::speech("Guard", "first time")
            .with_guid(guid(1))
            .with_restriction(EntryRestriction::Once)
            .with_child(Edge::to(1)),
        Node::end(),
        Node::speech("Guard", "again").with_child(Edge::to(1)),
    ];
    let start = vec![Node::start().with_child(Edge::to(0)).with_child(Edge::to(2))];
    let dialogue = load(start, nodes);
    let shared = SharedMemory::default();

    let first = DialogueContext::start(
        Arc::clone(&dialogue),
        ContextOptions {
            memory: shared.clone(),
            ..ContextOptions::default()
        },
        None,
    )
    .expect("first session should start");
    let second = DialogueContext::start(
        Arc::clone(&dialogue),
        ContextOptions {
            memory: shared.clone(),
            ..ContextOptions::default()
        },
        None,
    )
    .expect("second session should start");

    assert_eq!(first.active_node_index(), Some(0));
    assert_eq!(second.active_node_index(), Some(2));
    assert!(first.memory().shares_with(second.memory()));
    assert!(shared.is_node_visited(&dialogue.guid, 0, guid(1)));
}

#[test]
fn resume_merges_snapshot_memory_into_shared_memory() {
    let nodes = vec![
        Node::speech("Guard", "first time")
            .with_guid(guid(1))
            .with_restriction(EntryRestriction::Once)
            .with_child(Edge::to(1)),
        Node::end(),
        Node::speech("Guard", "again").with_guid(guid(3)).with_child(Edge::to(1)),
    ];
    let start = vec![Node::start().with_child(Edge::to(0)).with_child(Edge::to(2))];
    let dialogue = load(start, nodes);
    let saved = DialogueContext::start(Arc::clone(&dialogue), ContextOptions::default(), None)
        .expect("saved session should start")
        .snapshot();

    let shared = SharedMemory::default();
    shared.set_node_visited(dialogue.guid, 2, guid(3));
    let resumed = DialogueContext::resume(
        Arc::clone(&dialogue),
        ContextOptions {
            memory: shared.clone(),
            ..ContextOptions::default()
        },
        saved,
    )
    .expect("snapshot should resume");
    assert_eq!(resumed.active_node_index(), Some(0));
    assert!(resumed.memory().shares_with(&shared));
    assert!(shared.is_node_visited(&dialogue.guid, 0, guid(1)));
    assert!(shared.is_node_visited(&dialogue.guid, 2, guid(3)));

    let next = DialogueContext::start(
        dialogue,
        ContextOptions {
            memory: shared,
            ..ContextOptions::default()
        },
        None,
    )
    .expect("next session should start");
    assert_eq!(next.active_node_index(), Some(2));
}

#[test]
fn virtual_parent_reevaluation_exposes_first_satisfied_child_options() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("has_key", false);
    let dialogue = load(start_to(0), three_way(true));

    let mut context = DialogueContext::start_from_node(dialogue, options(&[&player]), 0, false)
        .expect("virtual parent should be resumable");
    assert_eq!(context.active_node_index(), Some(0));
    assert_eq!(edge_indices(context.current_options()), vec![0]);
    assert_eq!(context.current_options()[0].source, NodeRef::Regular(2));
    assert_eq!(context.current_options()[0].target_index, 4);

    player.set_bool("has_key", true);
    assert!(context.reevaluate_options());
    assert_eq!(context.active_node_index(), Some(0));
    assert_eq!(context.current_options()[0].source, NodeRef::Regular(1));
}

#[test]
fn virtual_parent_reevaluation_counts_loop_back_to_itself_as_satisfied() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("menu_open", false);
    let mut looping = Node::speech("Guard", "Again?").with_child(Edge::to(0).with_text("Back"));
    looping.check_children_on_evaluation = true;
    let nodes = vec![
        Node::speech("Guard", "Menu")
            .with_enter_condition(Condition::bool_call("Player", "menu_open", true))
            .with_child(Edge::to(1))
            .with_child(Edge::to(2))
            .virtual_parent(),
        looping,
        Node::speech("Guard", "Fallback").with_child(Edge::to(3)),
        Node::end(),
    ];

    // The loop child is picked over the fallback, and its only option leads
    // back into the closed menu, so nothing is left to choose.
    let context = DialogueContext::start_from_node(load(start_to(0), nodes), options(&[&player]), 0, false)
        .expect("virtual parent should be resumable");
    assert!(context.is_ended());
    assert!(context.current_options().is_empty());
}

fn hub_nodes() -> Vec<Node> {
    vec![
        Node::speech("Guard", "What now?")
            .with_child(Edge::to(1).with_text("Ask"))
            .with_child(Edge::to(2).with_text("Leave")),
        Node::speech("Guard", "Answer")
            .with_restriction(EntryRestriction::OncePerContext)
            .with_enter_event(Event::call("", "answered"))
            .with_child(Edge::to(0)),
        Node::new(NodeKind::End(EndData {
            return_to_main_on_end: Some(true),
            transition: Some(DialogueTransition {
                dialogue_name: "market".to_string(),
                branch_tag: "evening".to_string(),
                start_node_guid: Uuid::nil(),
            }),
        })),
    ]
}

#[test]
fn once_per_context_hides_visited_option_and_disabled_choice_is_rejected() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let mut context = DialogueContext::start(load(start_to(0), hub_nodes()), options(&[&guard]), None)
        .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![0, 1]);

    context.choose_option(0).expect("ask should be selectable");
    assert_eq!(context.active_node_index(), Some(1));
    context.choose_option(0).expect("back to hub");
    assert_eq!(context.active_node_index(), Some(0));
    assert_eq!(edge_indices(context.current_options()), vec![1]);
    assert_eq!(context.all_options().len(), 2);

    let error = context
        .choose_option_from_all(0)
        .expect_err("disabled option should be rejected");
    assert_eq!(error.code, "CONTEXT_OPTION_UNSATISFIED");
    let error = context
        .choose_option(5)
        .expect_err("out of range option should be rejected");
    assert_eq!(error.code, "CONTEXT_OPTION_INDEX");

    context
        .choose_option_from_all(1)
        .expect("leave should be selectable");
    assert!(context.is_ended());
    let outcome = context.end_outcome().expect("end outcome should be recorded");
    assert_eq!(outcome.node_index, 2);
    assert_eq!(outcome.return_to_main_on_end, Some(true));
    assert_eq!(
        outcome.transition.as_ref().map(|t| t.dialogue_name.as_str()),
        Some("market")
    );
    assert_eq!(guard.fired_events(), vec!["answered".to_string()]);

    let error = context.choose_option(0).expect_err("ended session rejects choices");
    assert_eq!(error.code, "CONTEXT_ENDED");
}

#[test]
fn edge_events_fire_on_traversal_only() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_int("gold", 10);
    let nodes = vec![
        Node::speech("Merchant", "Buy?")
            .with_child(
                Edge::to(1)
                    .with_condition(Condition::int_call(
                        "Player",
                        "gold",
                        dlg_core::Operation::GreaterOrEqual,
                        5,
                    ))
                    .with_event(Event::modify_int("Player", "gold", -5, true)),
            ),
        Node::end(),
    ];
    let mut context = DialogueContext::start(load(start_to(0), nodes), options(&[&player]), None)
        .expect("dialogue should start");
    assert!(context.reevaluate_options());
    assert_eq!(player.get_int("gold").expect("gold"), 10);

    context.choose_option(0).expect("purchase should be selectable");
    assert_eq!(player.get_int("gold").expect("gold"), 5);
    assert!(context.is_ended());
}

#[test]
fn unresolved_capability_is_false_even_when_negated() {
    let nodes = vec![
        Node::speech("Guard", "Hm")
            .with_child(Edge::to(1).with_condition(Condition::bool_call("Ghost", "x", true).negate()))
            .with_child(Edge::to(1).with_condition(Condition::event_call("", "unknown")))
            .with_child(Edge::to(1)),
        Node::end(),
    ];
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let context = DialogueContext::start(load(start_to(0), nodes), options(&[&guard]), None)
        .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![2]);
}

#[test]
fn second_participant_comparison_reads_other_value() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_int("gold", 7);
    let merchant = Arc::new(MemoryParticipant::new("Merchant"));
    merchant.set_int("price", 9);
    let affordable = Condition::int_call("Player", "gold", dlg_core::Operation::GreaterOrEqual, 0)
        .with_other_participant("Merchant", "price");
    let nodes = vec![
        Node::speech("Merchant", "Offer")
            .with_child(Edge::to(1).with_condition(affordable))
            .with_child(Edge::to(1)),
        Node::end(),
    ];
    let mut context = DialogueContext::start(
        load(start_to(0), nodes),
        options(&[&player, &merchant]),
        None,
    )
    .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![1]);

    player.set_int("gold", 9);
    assert!(context.reevaluate_options());
    assert_eq!(edge_indices(context.current_options()), vec![0, 1]);
}

#[test]
fn check_children_on_evaluation_requires_satisfied_child() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    player.set_bool("never", false);
    let mut gated = Node::speech("Guard", "Gated")
        .with_child(Edge::to(2).with_condition(Condition::bool_call("Player", "never", true)));
    gated.check_children_on_evaluation = true;
    let nodes = vec![
        Node::speech("Guard", "Hub")
            .with_child(Edge::to(1))
            .with_child(Edge::to(2)),
        gated,
        Node::end(),
    ];
    let context = DialogueContext::start(load(start_to(0), nodes), options(&[&player]), None)
        .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![1]);
}

#[test]
fn was_node_visited_checks_session_history() {
    let nodes = vec![
        Node::speech("Guard", "Hub")
            .with_child(
                Edge::to(1).with_condition(Condition::was_node_visited(guid(30), true, false)),
            )
            .with_child(Edge::to(2)),
        Node::end(),
        Node::speech("Guard", "Intro").with_guid(guid(30)).with_child(Edge::to(0)),
    ];
    let mut context = DialogueContext::start(load(start_to(0), nodes), ContextOptions::default(), None)
        .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![1]);

    context.choose_option(0).expect("intro should be selectable");
    assert!(context.was_node_visited(2));
    context.choose_option(0).expect("back to hub");
    assert_eq!(edge_indices(context.current_options()), vec![0, 1]);
}

struct ParticipantIs(&'static str);

impl CustomCondition for ParticipantIs {
    fn evaluate(&self, call: &CustomCall<'_>) -> bool {
        call.participant_name == self.0 && call.participant.is_some()
    }
}

#[test]
fn custom_conditions_use_registry_and_missing_handler_is_false() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let nodes = vec![
        Node::speech("Guard", "Custom")
            .with_child(Edge::to(1).with_condition(Condition::custom("", "is_guard")))
            .with_child(Edge::to(1).with_condition(Condition::custom("", "unregistered"))),
        Node::end(),
    ];
    let mut options = options(&[&guard]);
    options
        .custom
        .register_condition("is_guard", Arc::new(ParticipantIs("Guard")));
    let context = DialogueContext::start(load(start_to(0), nodes), options, None)
        .expect("dialogue should start");
    assert_eq!(edge_indices(context.current_options()), vec![0]);
}

#[test]
fn random_selector_is_reproducible_with_seed() {
    let nodes = vec![
        Node::selector(SelectorType::Random)
            .with_child(Edge::to(1))
            .with_child(Edge::to(2))
            .with_child(Edge::to(3)),
        Node::speech("Guard", "a").with_child(Edge::to(4)),
        Node::speech("Guard", "b").with_child(Edge::to(4)),
        Node::speech("Guard", "c").with_child(Edge::to(4)),
        Node::end(),
    ];
    let dialogue = load(start_to(0), nodes);
    let run = |seed: u32| {
        let options = ContextOptions {
            random_seed: Some(seed),
            ..ContextOptions::default()
        };
        DialogueContext::start(Arc::clone(&dialogue), options, None)
            .expect("dialogue should start")
            .active_node_index()
    };
    let first = run(11);
    assert_eq!(first, run(11));
    assert!(matches!(first, Some(1..=3)));
}

#[test]
fn first_selector_and_proxy_enter_their_targets() {
    let nodes = vec![
        Node::selector(SelectorType::First)
            .with_child(Edge::to(1).with_condition(Condition::event_call("Guard", "missing")))
            .with_child(Edge::to(2)),
        Node::end(),
        Node::proxy(3),
        Node::speech("Guard", "Real").with_child(Edge::to(1)),
    ];
    let context = DialogueContext::start(load(start_to(0), nodes), ContextOptions::default(), None)
        .expect("dialogue should start");
    assert_eq!(context.active_node_index(), Some(3));
    assert_eq!(context.active_text(), "Real");
}

#[test]
fn proxy_requires_target_enter_conditions() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    guard.set_bool("open", false);
    let nodes = vec![
        Node::proxy(1),
        Node::speech("Guard", "Closed")
            .with_enter_condition(Condition::bool_call("", "open", true))
            .with_child(Edge::to(2)),
        Node::end(),
    ];
    let error = DialogueContext::start(load(start_to(0), nodes), options(&[&guard]), None)
        .err()
        .expect("no start path should be satisfied");
    assert_eq!(error.code, "CONTEXT_NO_SATISFIED_START");
}

#[test]
fn text_arguments_are_applied_to_speech_and_option_text() {
    let player = Arc::new(MemoryParticipant::with_state(
        "Player",
        MemoryState {
            display_name: Some("Ada".to_string()),
            ..MemoryState::default()
        },
    ));
    player.set_int("gold", 12);
    let mut guard_state = MemoryState::default();
    guard_state
        .class_variables
        .insert("price".to_string(), DlgValue::Int(5));
    let guard = Arc::new(MemoryParticipant::with_state("Guard", guard_state));

    let nodes = vec![
        Node::speech("Guard", "Welcome {Name}, you have {Gold} gold.")
            .with_text_argument(TextArgument::new(
                "Name",
                TextArgumentKind::DisplayName,
                "Player",
                "",
            ))
            .with_text_argument(TextArgument::new(
                "Gold",
                TextArgumentKind::DialogueInt,
                "Player",
                "gold",
            ))
            .with_child(
                Edge::to(1)
                    .with_text("Pay {Price}")
                    .with_text_argument(TextArgument::new(
                        "Price",
                        TextArgumentKind::ClassInt,
                        "",
                        "price",
                    )),
            ),
        Node::end(),
    ];
    let context = DialogueContext::start(load(start_to(0), nodes), options(&[&player, &guard]), None)
        .expect("dialogue should start");
    assert_eq!(context.active_text(), "Welcome Ada, you have 12 gold.");
    assert_eq!(context.current_options()[0].text, "Pay 5");
    assert_eq!(context.active_participant_name(), "Guard");
}

#[test]
fn start_reports_structural_errors() {
    let error = DialogueContext::start(Arc::new(Dialogue::default()), ContextOptions::default(), None)
        .err()
        .expect("empty dialogue cannot start");
    assert_eq!(error.code, "CONTEXT_NO_START_NODE");

    let dialogue = load(start_to(0), hub_nodes());
    let error = DialogueContext::start(dialogue, ContextOptions::default(), Some(4))
        .err()
        .expect("start index should be validated");
    assert_eq!(error.code, "CONTEXT_START_INDEX_INVALID");
}

#[test]
fn branch_tags_and_excluded_start_nodes() {
    let night = Node::new(NodeKind::Start {
        branch_tag: "night".to_string(),
        exclude_from_default_start: true,
    })
    .with_child(Edge::to(1));
    let start = vec![night, Node::start().with_child(Edge::to(0))];
    let nodes = vec![
        Node::speech("Guard", "Day").with_child(Edge::to(2)),
        Node::speech("Guard", "Night").with_child(Edge::to(2)),
        Node::end(),
    ];
    let dialogue = load(start, nodes);

    let day = DialogueContext::start(Arc::clone(&dialogue), ContextOptions::default(), None)
        .expect("default start should work");
    assert_eq!(day.active_text(), "Day");
    let night = DialogueContext::start_with_branch_tag(
        Arc::clone(&dialogue),
        ContextOptions::default(),
        "night",
    )
    .expect("tagged start should work");
    assert_eq!(night.active_text(), "Night");
    let error = DialogueContext::start_with_branch_tag(dialogue, ContextOptions::default(), "noon")
        .err()
        .expect("unknown tag should fail");
    assert_eq!(error.code, "CONTEXT_BRANCH_TAG_UNKNOWN");
}

#[test]
fn start_from_node_optionally_fires_enter_events() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let dialogue = load(start_to(0), hub_nodes());

    let quiet = DialogueContext::start_from_node(Arc::clone(&dialogue), options(&[&guard]), 1, false)
        .expect("node 1 should be resumable");
    assert_eq!(quiet.active_node_index(), Some(1));
    assert!(guard.fired_events().is_empty());

    let loud = DialogueContext::start_from_node(Arc::clone(&dialogue), options(&[&guard]), 1, true)
        .expect("node 1 should be enterable");
    assert_eq!(loud.active_node_index(), Some(1));
    assert_eq!(guard.fired_events(), vec!["answered".to_string()]);

    let error = DialogueContext::start_from_node(dialogue, ContextOptions::default(), 9, true)
        .err()
        .expect("index should be validated");
    assert_eq!(error.code, "CONTEXT_NODE_INDEX_INVALID");
}

#[test]
fn snapshot_resume_restores_position_without_replaying_events() {
    let guard = Arc::new(MemoryParticipant::new("Guard"));
    let dialogue = load(start_to(0), hub_nodes());
    let mut context = DialogueContext::start(Arc::clone(&dialogue), options(&[&guard]), None)
        .expect("dialogue should start");
    context.choose_option(0).expect("ask");

    let json = serde_json::to_string(&context.snapshot()).expect("snapshot should serialize");
    let snapshot: ContextSnapshot = serde_json::from_str(&json).expect("snapshot should parse");
    assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA);

    let mut resumed = DialogueContext::resume(Arc::clone(&dialogue), options(&[&guard]), snapshot.clone())
        .expect("snapshot should resume");
    assert_eq!(resumed.active_node_index(), Some(1));
    assert_eq!(resumed.history(), context.history());
    assert_eq!(resumed.current_options(), context.current_options());
    assert_eq!(guard.fired_events().len(), 1);

    resumed.choose_option(0).expect("back to hub");
    assert_eq!(edge_indices(resumed.current_options()), vec![1]);

    let mut wrong = snapshot;
    wrong.schema_version = "dlg-snapshot.v0".to_string();
    let error = DialogueContext::resume(dialogue, ContextOptions::default(), wrong)
        .err()
        .expect("schema should be checked");
    assert_eq!(error.code, "CONTEXT_SNAPSHOT_SCHEMA");
}

#[test]
fn missing_participants_lists_unbound_names() {
    let player = Arc::new(MemoryParticipant::new("Player"));
    let dialogue = load(start_to(0), three_way(false));
    let bound = options(&[&player]);
    assert_eq!(
        missing_participants(&dialogue, &bound.participants),
        vec!["Guard".to_string()]
    );
}
