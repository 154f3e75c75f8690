use chatflow::{
    Block, BlockKind, ClientSideActionKind, CurrentBlock, Edge, Group, InputBlock, InputType,
    LogicBlock, RedirectBlock, RedirectOptions, SetVariableBlock, SetVariableOptions,
    StartParams, TurnStatus, Typebot, Variable, VariableValue, config::EngineConfig,
    provider::MockChatCompletionClient, store::InMemoryStore,
};
use pretty_assertions::assert_eq;

use crate::{engine, engine_with, load_typebot, text_block, texts};

fn single_group(blocks: Vec<Block>) -> Typebot {
    let mut typebot = Typebot::new("tb");
    typebot.groups = vec![Group::new("g1", "Group #1", blocks)];
    typebot
}

#[tokio::test]
async fn test_lead_form_conversation() {
    let engine = engine(InMemoryStore::new());
    let typebot = load_typebot("lead_form");

    let turn = engine
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::AwaitingInput);
    assert_eq!(texts(&turn.reply), vec!["Hi! What's your name?"]);
    let input = turn.reply.input.as_ref().unwrap();
    assert_eq!(input.kind, "text input");
    assert_eq!(input.options["labels"]["placeholder"], "Type your name...");
    assert_eq!(
        turn.new_session_state.current_block,
        Some(CurrentBlock {
            group_id: "g-welcome".into(),
            block_id: "b-name".into(),
        })
    );

    let turn = engine
        .continue_session(turn.new_session_state, "Ada")
        .await
        .unwrap();
    assert_eq!(texts(&turn.reply), vec!["Nice to meet you Ada!"]);
    assert_eq!(turn.reply.input.as_ref().unwrap().kind, "email input");

    let retry = engine
        .continue_session(turn.new_session_state.clone(), "ada.example.com")
        .await
        .unwrap();
    assert_eq!(retry.status, TurnStatus::AwaitingInput);
    assert_eq!(
        texts(&retry.reply),
        vec!["This email doesn't seem to be valid. Can you type it again?"]
    );
    assert_eq!(retry.reply.input.as_ref().unwrap().id, "b-email");
    assert_eq!(
        retry.new_session_state.current_block,
        turn.new_session_state.current_block
    );

    let turn = engine
        .continue_session(retry.new_session_state, "ada@example.com")
        .await
        .unwrap();
    assert_eq!(texts(&turn.reply), vec!["Which plan are you interested in?"]);
    assert_eq!(turn.reply.input.as_ref().unwrap().items.len(), 2);

    let turn = engine
        .continue_session(turn.new_session_state, "free")
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["Enjoy the free plan!"]);
    assert!(turn.reply.input.is_none());

    let state = turn.new_session_state;
    assert!(state.current_block.is_none());
    let result = state.result.unwrap();
    let answers: Vec<_> = result
        .answers
        .iter()
        .map(|answer| answer.content.as_str())
        .collect();
    assert_eq!(answers, vec!["Ada", "ada@example.com", "Free"]);
    assert_eq!(result.variables.len(), 3);
}

#[tokio::test]
async fn test_choice_without_item_edge_follows_block_edge() {
    let engine = engine(InMemoryStore::new());
    let mut turn = engine
        .start_from_typebot(load_typebot("lead_form"), StartParams::default())
        .await
        .unwrap();
    for answer in ["Grace", "grace@example.com", "Pro"] {
        turn = engine
            .continue_session(turn.new_session_state, answer)
            .await
            .unwrap();
    }
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(
        texts(&turn.reply),
        vec!["Our sales team will contact you at grace@example.com."]
    );
}

#[tokio::test]
async fn test_bubble_only_group_terminates_in_order() {
    let typebot = single_group(vec![
        text_block("b1", "one"),
        text_block("b2", "two"),
        text_block("b3", "three"),
    ]);
    let turn = engine(InMemoryStore::new())
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();

    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["one", "two", "three"]);
    assert!(turn.reply.input.is_none());
    assert!(turn.reply.logs.is_empty());
}

#[tokio::test]
async fn test_input_halts_group_and_resumes_after_it() {
    let mut typebot = single_group(vec![
        text_block("b1", "before"),
        Block::new(
            "b2",
            BlockKind::Input(InputBlock::new(InputType::Text).with_variable("v1")),
        ),
        text_block("b3", "after {{answer}}"),
    ]);
    typebot.variables = vec![Variable::new("v1", "answer")];
    let engine = engine(InMemoryStore::new());

    let turn = engine
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(texts(&turn.reply), vec!["before"]);
    assert_eq!(
        turn.new_session_state
            .current_block
            .as_ref()
            .map(|anchor| anchor.block_id.as_str()),
        Some("b2")
    );

    let turn = engine
        .continue_session(turn.new_session_state, "42")
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["after 42"]);
}

#[tokio::test]
async fn test_cycles_are_bounded_by_step_budget() {
    let mut typebot = single_group(vec![text_block("b1", "again").with_outgoing_edge("e1")]);
    typebot.edges = vec![Edge::new("e1", "b1", "g1")];
    let config = EngineConfig {
        max_steps_per_turn: 25,
        ..Default::default()
    };
    let engine = engine_with(config, InMemoryStore::new(), MockChatCompletionClient::new());

    let turn = engine
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(turn.reply.messages.len(), 25);
    assert_eq!(turn.reply.logs.len(), 1);
    assert!(turn.reply.logs[0].is_error());
}

#[tokio::test]
async fn test_dangling_edge_ends_turn_silently() {
    let mut typebot = single_group(vec![text_block("b1", "bye").with_outgoing_edge("e1")]);
    typebot.edges = vec![Edge::new("e1", "b1", "deleted-group")];

    let turn = engine(InMemoryStore::new())
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["bye"]);
    assert!(turn.reply.logs.is_empty());
}

#[tokio::test]
async fn test_non_blocking_actions_carry_last_bubble() {
    let typebot = single_group(vec![
        Block::new(
            "b0",
            BlockKind::Logic(LogicBlock::Redirect(RedirectBlock {
                options: RedirectOptions {
                    url: Some("typebot.io".into()),
                    is_new_tab: true,
                },
            })),
        ),
        text_block("b1", "hello"),
        Block::new(
            "b2",
            BlockKind::Logic(LogicBlock::Redirect(RedirectBlock {
                options: RedirectOptions {
                    url: Some("https://docs.typebot.io".into()),
                    is_new_tab: false,
                },
            })),
        ),
        text_block("b3", "still here"),
    ]);

    let turn = engine(InMemoryStore::new())
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["hello", "still here"]);

    let actions = &turn.reply.client_side_actions;
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].last_bubble_block_id, None);
    assert_eq!(actions[1].last_bubble_block_id.as_deref(), Some("b1"));
    let ClientSideActionKind::Redirect(redirect) = &actions[0].kind else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.url, "https://typebot.io");
}

#[tokio::test]
async fn test_client_side_set_variable_round_trip() {
    let mut typebot = single_group(vec![
        text_block("b1", "computing"),
        Block::new(
            "b2",
            BlockKind::Logic(LogicBlock::SetVariable(SetVariableBlock {
                options: SetVariableOptions {
                    variable_id: Some("v1".into()),
                    expression_to_evaluate: Some("{{seed}} * 2".into()),
                    is_executed_on_client: true,
                    ..Default::default()
                },
            })),
        ),
        text_block("b3", "result is {{result}}"),
    ]);
    typebot.variables = vec![
        Variable::new("v1", "result"),
        Variable::new("v2", "seed").with_value("21"),
    ];
    let engine = engine(InMemoryStore::new());

    let turn = engine
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::AwaitingClientAction);
    assert_eq!(texts(&turn.reply), vec!["computing"]);
    let action = &turn.reply.client_side_actions[0];
    assert_eq!(action.last_bubble_block_id.as_deref(), Some("b1"));
    let ClientSideActionKind::SetVariable(set_variable) = &action.kind else {
        panic!("expected a setVariable action");
    };
    assert_eq!(set_variable.script_to_execute.content, "return v2 * 2");

    let turn = engine
        .continue_session(turn.new_session_state, "42")
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    assert_eq!(texts(&turn.reply), vec!["result is 42"]);
    assert_eq!(
        turn.new_session_state.typebot.variables[0].value,
        Some(VariableValue::from("42"))
    );
}

#[tokio::test]
async fn test_preview_session_records_nothing() {
    let typebot = single_group(vec![
        Block::new(
            "b1",
            BlockKind::Input(InputBlock::new(InputType::Number).with_variable("v1")),
        ),
        text_block("b2", "got {{n}}"),
    ]);
    let mut typebot = typebot;
    typebot.variables = vec![Variable::new("v1", "n")];
    let engine = engine(InMemoryStore::new());

    let turn = engine
        .start_from_typebot(
            typebot,
            StartParams {
                is_preview: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let turn = engine
        .continue_session(turn.new_session_state, "7")
        .await
        .unwrap();
    assert_eq!(texts(&turn.reply), vec!["got 7"]);
    assert!(turn.new_session_state.result.is_none());
}
