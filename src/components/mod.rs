pub mod controller;
pub mod force_graph;
pub mod quote_panel;
