use serde_json::Value as JsonValue;

use crate::engine::BlockOutcome;
use crate::schema::{ClientSideAction, ClientSideActionKind, SessionState};
use crate::variables::{DeepParseOptions, deep_parse_variables};

/// Forwards the tracking options to the client. Nothing is tracked when no
/// result is recorded.
pub fn execute_google_analytics(state: &SessionState, options: &JsonValue) -> BlockOutcome {
    if state.result.is_none() {
        return BlockOutcome::new();
    }
    let options = deep_parse_variables(
        state.variables(),
        options,
        &DeepParseOptions {
            guess_correct_types: true,
            remove_empty_strings: true,
            ..Default::default()
        },
    );
    BlockOutcome::new().with_action(ClientSideAction::new(ClientSideActionKind::GoogleAnalytics(
        options,
    )))
}
