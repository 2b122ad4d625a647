//! Model Context Protocol server layer.

pub mod bridge;
pub mod codec;
pub mod dispatcher;
pub mod envelope;
pub mod registry;
pub mod session;
pub mod sse;
pub mod tools;
pub mod transport;
