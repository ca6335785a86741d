//! The chat command/keyboard/formatting surface (§6, §11.1). The transport itself
//! (long-polling, webhook) is out of scope; this module is the pure, testable core
//! a thin `ChatGateway` adapter calls into.

pub mod commands;
pub mod formatters;
pub mod keyboards;

pub use commands::{dispatch, parse, ChatCommand, ChatDeps};
pub use formatters::{format_exit_alert, format_final_signal};
