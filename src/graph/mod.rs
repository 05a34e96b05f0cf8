//! Browser-independent graph state: analysis, layout seeding, visibility,
//! suggestions and the custom-connection workflow.

pub mod catalog;
pub mod connectivity;
pub mod custom_edge;
pub mod input;
pub mod layout;
pub mod model;
pub mod session;
pub mod suggest;
pub mod visibility;

pub use layout::{LayoutPlan, LayoutPort, LayoutSnapshot};
pub use model::{Edge, GraphSnapshot, Item, Node, NodeId};
pub use session::{Command, GraphOverlay, NodeStyle, QuoteSession, SessionView};
