//! Toolkit-free core: entities, selection, artifact cache, sync bridge and
//! the artifact producers.

pub mod bridge;
pub mod cache;
pub mod entity;
pub mod render;
pub mod selection;
pub mod spectrum;
pub mod token;
