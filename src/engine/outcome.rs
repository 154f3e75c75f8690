use crate::schema::{ClientSideAction, ReplyLog, SessionState};

/// What executing a single logic or integration block produced.
#[derive(Debug, Clone, Default)]
pub struct BlockOutcome {
    /// Explicit branch. Wins over the block's own outgoing edge.
    pub outgoing_edge_id: Option<String>,
    pub logs: Vec<ReplyLog>,
    pub new_session_state: Option<SessionState>,
    pub client_side_actions: Vec<ClientSideAction>,
}

impl BlockOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge(outgoing_edge_id: Option<String>) -> Self {
        Self {
            outgoing_edge_id,
            ..Default::default()
        }
    }

    pub fn with_log(mut self, log: ReplyLog) -> Self {
        self.logs.push(log);
        self
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.new_session_state = Some(state);
        self
    }

    pub fn with_action(mut self, action: ClientSideAction) -> Self {
        self.client_side_actions.push(action);
        self
    }

    pub fn requires_client_round_trip(&self) -> bool {
        self.client_side_actions
            .iter()
            .any(ClientSideAction::requires_client_round_trip)
    }
}
