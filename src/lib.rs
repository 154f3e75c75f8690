//! # chatflow: Conversation Flow Execution Engine
//!
//! chatflow interprets a typebot graph (groups of blocks joined by edges) one
//! conversation turn at a time. Each turn walks the graph from a starting
//! position, renders messages, evaluates branching logic, calls external
//! integrations and stops as soon as it has to hand control back to the
//! client.
//!
//! ## Technical Foundations
//!
//! ### 1. Data Model
//! - Graph, blocks, session state and reply envelope ([`schema`])
//! - Variable lookup and `{{variable}}` interpolation ([`variables`])
//!
//! ### 2. Block Execution
//! - Condition evaluation and other logic blocks ([`logic`])
//! - Webhook, chat completion and analytics executors ([`integrations`])
//!
//! ### 3. Engine
//! - Group/block walker with a per-turn step budget ([`engine`])
//! - Resumption from a persisted `currentBlock` anchor ([`engine`])
//!
//! ### 4. Collaborators
//! - Storage and credential ports with an in-memory implementation ([`store`])
//! - Chat completion provider port backed by OpenAI ([`provider`])
//!
//! ## Turn Lifecycle
//!
//! ```text
//! SessionState ─► Walker ─► (bubble | input | logic | integration)* ─► TurnResult
//!                   ▲                                                   │
//!                   └──────────── continue_session(state, reply) ◄──────┘
//! ```
//!
//! A turn ends in one of three ways: an input block needs an answer, a
//! client-side action needs a round-trip, or the graph runs out of edges.
//! Integration failures never abort a turn; they are reported in the reply's
//! log list.

pub mod config;
pub mod engine;
pub mod error;
pub mod integrations;
pub mod logic;
pub mod provider;
pub mod schema;
pub mod store;
pub mod variables;

// Re-exports
pub use engine::{FlowEngine, StartParams, TurnResult, TurnStatus};
pub use error::*;
pub use schema::*;
