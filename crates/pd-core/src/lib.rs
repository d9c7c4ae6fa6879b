//! pd-core: Core abstractions and configuration for the PlanDrop relay
//!
//! This crate provides input validation, remote queue layout, construction
//! of transport invocations, and the transport abstraction used by the
//! relay's action handlers.

pub mod config;
pub mod error;
pub mod layout;
pub mod ssh;
pub mod time;
pub mod transport;
pub mod validate;

pub use error::{Operation, RelayError, TransportError, ValidationError};
pub use layout::{Identifier, QueueLayout};
pub use ssh::{shell_join, shell_quote, Remote, SshOptions, Tool};
pub use transport::{ExecOutput, SshTransport, Transport};
