//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 connection engine: incremental
//! request parsing, handler dispatch, response writing, and keep-alive.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-transport state machine driving parsing, dispatch and writing
//! - **`parser`**: Incremental request parser emitting events to a sink trait
//! - **`request`**: HTTP request representation built from parser events
//! - **`response`**: HTTP response representation with builder pattern and wire serialization
//! - **`handler`**: The request-handler contract and the write-callback handed to it
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │    Idle     │ ← No parser; wait for the first bytes
//!        └──────┬──────┘
//!               │ Bytes received
//!               ▼
//!        ┌──────────────────┐
//!        │    Receiving     │ ← Feed parser: headers, then body
//!        └──────┬───────────┘
//!               │ Message complete
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatched     │ ← Handler runs as its own task
//!        └──────┬───────────┘
//!               │ Response received
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Serialize and write to the client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Idle (same connection, state reset)
//!               └─ Close → Closed
//! ```
//!
//! Aborts (oversized request, framing error, timeout, write failure) jump
//! straight to Closed from any state; teardown runs on every path.

pub mod connection;
pub mod handler;
pub mod parser;
pub mod request;
pub mod response;
