//! Terminal front end

mod console;
mod repl;

pub use console::Console;
pub use repl::{
    Flow, InputCommand, Repl, ReplExit, EMPTY_INPUT_NOTICE, NOT_AUTHORIZED_NOTICE,
};
