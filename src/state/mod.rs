/// State management module
///
/// This module holds all application state:
/// - Shared data structures (data.rs)
/// - The in-memory character library (library.rs)
/// - Layer ordering of selected characters (selection.rs)
/// - The generation state machine (generation.rs)
/// - The studio container tying them together (studio.rs)

pub mod data;
pub mod generation;
pub mod library;
pub mod selection;
pub mod studio;
