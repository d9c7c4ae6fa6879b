//! pd-protocol: Native messaging wire protocol for the PlanDrop relay
//!
//! This crate defines the length-prefixed JSON framing used between the
//! browser extension and the relay over standard input/output, and the
//! request/response vocabulary carried inside those frames.

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::NativeCodec;
pub use error::{ProtocolError, RequestError};
pub use frame::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use message::{Action, Endpoint, Request, Response, Status};
