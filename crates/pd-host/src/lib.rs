//! pd-host: PlanDrop native messaging host
//!
//! Reads one framed request at a time from the browser extension, routes it
//! to an action handler, and writes one framed response back. Handlers reach
//! the remote machine only through a [`pd_core::Transport`].

pub mod command;
pub mod dispatch;
pub mod files;
pub mod logging;
pub mod queue;
pub mod relay;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::Dispatcher;
pub use logging::LoggingContext;
pub use relay::serve;
