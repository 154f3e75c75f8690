use chatflow::{StartParams, TurnStatus, Typebot, store::InMemoryStore};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{engine, texts};

/// Condition block routing adults to one group and everyone else through
/// the block's own edge.
fn age_check(age: serde_json::Value, operator: &str, comparand: &str) -> Typebot {
    serde_json::from_value(json!({
        "id": "age-check",
        "variables": [{"id": "v-age", "name": "Age", "value": age}],
        "groups": [
            {
                "id": "g1",
                "title": "Check",
                "blocks": [
                    {
                        "id": "b-condition",
                        "type": "Condition",
                        "items": [{
                            "id": "i1",
                            "outgoingEdgeId": "e-true",
                            "content": {
                                "logicalOperator": "AND",
                                "comparisons": [{
                                    "id": "c1",
                                    "variableId": "v-age",
                                    "comparisonOperator": operator,
                                    "value": comparand
                                }]
                            }
                        }],
                        "outgoingEdgeId": "e-else"
                    }
                ]
            },
            {
                "id": "g-true",
                "title": "Adult",
                "blocks": [{"id": "b-true", "type": "text", "content": {"plainText": "Welcome in"}}]
            },
            {
                "id": "g-else",
                "title": "Minor",
                "blocks": [{"id": "b-else", "type": "text", "content": {"plainText": "Sorry"}}]
            }
        ],
        "edges": [
            {"id": "e-true", "from": {"blockId": "b-condition", "itemId": "i1"}, "to": {"groupId": "g-true"}},
            {"id": "e-else", "from": {"blockId": "b-condition"}, "to": {"groupId": "g-else"}}
        ]
    }))
    .unwrap()
}

async fn route(typebot: Typebot) -> Vec<String> {
    let turn = engine(InMemoryStore::new())
        .start_from_typebot(typebot, StartParams::default())
        .await
        .unwrap();
    assert_eq!(turn.status, TurnStatus::Terminated);
    texts(&turn.reply)
}

#[tokio::test]
async fn test_greater_than_routes_to_item_edge() {
    assert_eq!(
        route(age_check(json!("21"), "Greater than", "18")).await,
        vec!["Welcome in"]
    );
    assert_eq!(
        route(age_check(json!("17"), "Greater than", "18")).await,
        vec!["Sorry"]
    );
}

#[tokio::test]
async fn test_numeric_strings_compare_as_numbers() {
    assert_eq!(
        route(age_check(json!("10"), "Greater than", "9")).await,
        vec!["Welcome in"]
    );
}

#[tokio::test]
async fn test_list_semantics() {
    let cities = json!(["Paris", "Lyon"]);
    assert_eq!(
        route(age_check(cities.clone(), "Contains", "par")).await,
        vec!["Welcome in"]
    );
    assert_eq!(
        route(age_check(cities.clone(), "Equal to", "Paris")).await,
        vec!["Sorry"]
    );
    assert_eq!(
        route(age_check(cities, "Greater than", "1")).await,
        vec!["Welcome in"]
    );
}

#[tokio::test]
async fn test_unknown_operator_fails_closed() {
    assert_eq!(
        route(age_check(json!("21"), "Matches regex", "\\d+")).await,
        vec!["Sorry"]
    );
}

#[tokio::test]
async fn test_missing_variable_value() {
    assert_eq!(
        route(age_check(json!(null), "Is set", "")).await,
        vec!["Sorry"]
    );
    assert_eq!(
        route(age_check(json!(null), "Is empty", "")).await,
        vec!["Welcome in"]
    );
}
