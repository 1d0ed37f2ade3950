//! Runtime for executing menus
//!
//! [`MenuSession`] runs one entity's menu against injected collaborators;
//! [`MenuManager`] keeps one session per entity and resumes persistent
//! menus from the store.

mod command_stack;
mod manager;
mod session;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use command_stack::{CommandHandler, CommandStack};
pub use manager::MenuManager;
pub use session::{MenuServices, MenuSession, TrailEntry};
pub use traits::*;

/// Manager wired to the in-process command layer and the SQLite store
pub type ProductionManager<O> = MenuManager<O, CommandStack, SqliteMenuStore>;
