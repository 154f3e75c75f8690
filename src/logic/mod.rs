//! Logic blocks: branching, variable assignment, redirects and scripts.

pub mod condition;
pub mod redirect;
pub mod script;
pub mod set_variable;

pub use condition::{execute_condition, find_passing_item_edge};
pub use set_variable::resume_set_variable;

use crate::engine::BlockOutcome;
use crate::schema::{LogicBlock, SessionState};

pub fn execute_logic_block(state: &SessionState, block: &LogicBlock) -> BlockOutcome {
    match block {
        LogicBlock::Condition(block) => {
            BlockOutcome::edge(find_passing_item_edge(state.variables(), block))
        }
        LogicBlock::SetVariable(block) => set_variable::execute_set_variable(state, &block.options),
        LogicBlock::Redirect(block) => redirect::execute_redirect(state, &block.options),
        LogicBlock::Script(block) => script::execute_script(state, &block.options),
    }
}
