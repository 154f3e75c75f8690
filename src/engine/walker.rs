//! Group/block walker.
//!
//! The walk is iterative: each group is scanned from a cursor, and the edge
//! picked at the end of the scan becomes the next cursor. Messages, logs and
//! actions are threaded through a [`ReplyAccumulator`] so a single reply can
//! span many groups. Every visited block counts against the step budget,
//! which bounds graphs that loop without ever reaching a blocking block.

use tracing::{debug, error};

use crate::integrations::{IntegrationContext, execute_integration_block};
use crate::logic::execute_logic_block;
use crate::schema::{BlockKind, ChatReply, CurrentBlock, ReplyLog, SessionState, Typebot};

use super::bubble::render_bubble;
use super::input::render_input;
use super::outcome::BlockOutcome;
use super::{TurnResult, TurnStatus};

/// Position in the graph the walker resumes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub group_id: String,
    pub block_index: usize,
}

impl Cursor {
    pub fn new(group_id: impl Into<String>, block_index: usize) -> Self {
        Self {
            group_id: group_id.into(),
            block_index,
        }
    }
}

/// Resolves an edge to the position it points at. `None` for dangling edges
/// and missing groups or blocks.
pub fn resolve_edge(typebot: &Typebot, edge_id: &str) -> Option<Cursor> {
    let Some(edge) = typebot.find_edge(edge_id) else {
        debug!("Edge {} not found, ending turn", edge_id);
        return None;
    };
    let Some(group) = typebot.find_group(&edge.to.group_id) else {
        debug!("Group {} not found, ending turn", edge.to.group_id);
        return None;
    };
    let block_index = match edge.to.block_id.as_deref() {
        Some(block_id) => group.blocks.iter().position(|block| block.id == block_id)?,
        None => 0,
    };
    Some(Cursor::new(group.id.clone(), block_index))
}

/// Reply built across the groups visited in one turn.
#[derive(Debug, Clone, Default)]
pub struct ReplyAccumulator {
    pub reply: ChatReply,
    /// Most recent bubble, attached to every action produced after it.
    pub last_bubble_block_id: Option<String>,
}

impl ReplyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(logs: Vec<ReplyLog>) -> Self {
        Self {
            reply: ChatReply {
                logs,
                ..Default::default()
            },
            last_bubble_block_id: None,
        }
    }

    /// Appends logs and actions and hands back the new state, if any.
    fn merge(&mut self, outcome: BlockOutcome) -> Option<SessionState> {
        self.reply.logs.extend(outcome.logs);
        for mut action in outcome.client_side_actions {
            action.last_bubble_block_id = self.last_bubble_block_id.clone();
            self.reply.client_side_actions.push(action);
        }
        outcome.new_session_state
    }

    fn finish(self, new_session_state: SessionState, status: TurnStatus) -> TurnResult {
        TurnResult {
            reply: self.reply,
            new_session_state,
            status,
        }
    }
}

pub struct Walker<'a> {
    ctx: IntegrationContext<'a>,
    max_steps: usize,
}

impl<'a> Walker<'a> {
    pub fn new(ctx: IntegrationContext<'a>) -> Self {
        let max_steps = ctx.config.max_steps_per_turn;
        Self { ctx, max_steps }
    }

    /// Walks from `cursor` until an input, a blocking client action or a
    /// dead end. A `None` cursor ends the turn right away.
    #[tracing::instrument(skip(self, state, acc), level = "debug")]
    pub async fn walk(
        &self,
        mut state: SessionState,
        cursor: Option<Cursor>,
        mut acc: ReplyAccumulator,
    ) -> TurnResult {
        let mut cursor = cursor;
        let mut steps = 0usize;

        while let Some(Cursor {
            group_id,
            block_index,
        }) = cursor.take()
        {
            let Some(group) = state.typebot.find_group(&group_id).cloned() else {
                debug!("Group {} not found, ending turn", group_id);
                break;
            };
            let mut next_edge_id = None;

            for block in group.blocks.iter().skip(block_index) {
                steps += 1;
                if steps > self.max_steps {
                    error!("Step budget of {} blocks exhausted", self.max_steps);
                    acc.reply.logs.push(ReplyLog::error(format!(
                        "Turn stopped after visiting {} blocks",
                        self.max_steps
                    )));
                    return acc.finish(state.with_current_block(None), TurnStatus::Terminated);
                }
                next_edge_id = block.outgoing_edge_id.clone();

                let outcome = match &block.kind {
                    BlockKind::Start(_) => continue,
                    BlockKind::Bubble(bubble) => {
                        debug!("Rendering bubble {}", block.id);
                        acc.reply
                            .messages
                            .push(render_bubble(state.variables(), &block.id, bubble));
                        acc.last_bubble_block_id = Some(block.id.clone());
                        continue;
                    }
                    BlockKind::Input(input) => {
                        debug!("Awaiting input {}", block.id);
                        acc.reply.input = Some(render_input(&state, &block.id, input));
                        let anchor = CurrentBlock {
                            group_id: group.id.clone(),
                            block_id: block.id.clone(),
                        };
                        return acc.finish(
                            state.with_current_block(Some(anchor)),
                            TurnStatus::AwaitingInput,
                        );
                    }
                    BlockKind::Logic(logic) => {
                        debug!("Executing logic block {}", block.id);
                        execute_logic_block(&state, logic)
                    }
                    BlockKind::Integration(integration) => {
                        debug!("Executing integration block {}", block.id);
                        execute_integration_block(&self.ctx, &state, &block.id, integration).await
                    }
                };

                let blocking = outcome.requires_client_round_trip();
                let branch = outcome.outgoing_edge_id.clone();
                if let Some(new_state) = acc.merge(outcome) {
                    state = new_state;
                }

                if blocking {
                    debug!("Awaiting client action for {}", block.id);
                    let anchor = CurrentBlock {
                        group_id: group.id.clone(),
                        block_id: block.id.clone(),
                    };
                    return acc.finish(
                        state.with_current_block(Some(anchor)),
                        TurnStatus::AwaitingClientAction,
                    );
                }
                if branch.is_some() {
                    next_edge_id = branch;
                    break;
                }
            }

            cursor = next_edge_id.and_then(|edge_id| resolve_edge(&state.typebot, &edge_id));
        }

        acc.finish(state.with_current_block(None), TurnStatus::Terminated)
    }
}
