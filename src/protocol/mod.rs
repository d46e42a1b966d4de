//! JSON-RPC 2.0 tool protocol: `initialize`, `ping`, `tools/list` and
//! `tools/call`.

pub mod message;
mod server;
mod stdio;

pub use message::{Request, Response, RpcError};
pub use server::{McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use stdio::{serve_lines, serve_stdio};
