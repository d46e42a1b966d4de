pub mod error;
pub mod mcp;
pub mod tools;
