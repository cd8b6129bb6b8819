mod error;
mod executor;
mod history;
mod parser;
mod readline;
#[allow(clippy::module_inception)]
mod shell;
mod signals;
mod state;

pub use shell::Shell;
