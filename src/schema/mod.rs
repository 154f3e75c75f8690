//! Data model shared by every layer: the typebot graph, its blocks, the
//! session state carried between turns and the reply envelope.

pub mod blocks;
pub mod graph;
pub mod integration;
pub mod logic;
pub mod reply;
pub mod session;
pub mod variable;
pub mod webhook;

pub use blocks::*;
pub use graph::*;
pub use integration::*;
pub use logic::*;
pub use reply::*;
pub use session::*;
pub use variable::*;
pub use webhook::*;
