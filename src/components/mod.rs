pub mod chat;
pub mod concept_graph;
pub mod force_graph;
pub mod upload;
