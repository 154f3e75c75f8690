use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::blocks::{Block, BlockKind};
use super::variable::Variable;

/// A typebot definition: groups of blocks joined by edges.
///
/// The graph is read-only for the engine. Cycles are legal; the walker bounds
/// every turn with a step budget instead of rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typebot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub settings: JsonValue,
}

impl Typebot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            groups: Vec::new(),
            edges: Vec::new(),
            variables: Vec::new(),
            settings: JsonValue::Null,
        }
    }

    pub fn find_group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn find_edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == edge_id)
    }

    /// Locates a block and returns its group together with its position.
    pub fn find_block(&self, block_id: &str) -> Option<(&Group, usize, &Block)> {
        self.groups.iter().find_map(|group| {
            group
                .blocks
                .iter()
                .position(|block| block.id == block_id)
                .map(|index| (group, index, &group.blocks[index]))
        })
    }

    /// Block reached right after `block_id`: the following block in its
    /// group, or the target of its outgoing edge.
    pub fn next_block(&self, block_id: &str) -> Option<&Block> {
        let (group, index, block) = self.find_block(block_id)?;
        if let Some(next) = group.blocks.get(index + 1) {
            return Some(next);
        }
        let edge = self.find_edge(block.outgoing_edge_id.as_deref()?)?;
        let target = self.find_group(&edge.to.group_id)?;
        match edge.to.block_id.as_deref() {
            Some(target_block_id) => target.blocks.iter().find(|block| block.id == target_block_id),
            None => target.blocks.first(),
        }
    }

    /// The start event block, if the typebot has one.
    pub fn start_block(&self) -> Option<&Block> {
        self.groups
            .iter()
            .flat_map(|group| group.blocks.iter())
            .find(|block| matches!(block.kind, BlockKind::Start(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Group {
    pub fn new(id: impl Into<String>, title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub from: EdgeSource,
    pub to: EdgeTarget,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        from_block_id: impl Into<String>,
        to_group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: EdgeSource {
                block_id: from_block_id.into(),
                item_id: None,
            },
            to: EdgeTarget {
                group_id: to_group_id.into(),
                block_id: None,
            },
        }
    }

    pub fn to_block(mut self, block_id: impl Into<String>) -> Self {
        self.to.block_id = Some(block_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSource {
    pub block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Destination of an edge. A missing `block_id` means the first block of the
/// target group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTarget {
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}
