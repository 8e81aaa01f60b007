//! HTML Document Object Model
//!
//! Arena-backed document tree produced by the `html` parser, plus a JSON
//! serializer for it.
//!
//! ## Core Design
//!
//! ```text
//! Document (owned arena) ──→ DomNode { parent_id, children_ids, data }
//!        ↓                              ↑
//!   NodeId (u32) ───────────────────────┘
//!        ↓
//! DomSerializer → JSON
//! ```
//!
//! A `Document` shares nothing with any other `Document`, so independent
//! documents can be built and read on separate threads.

pub mod arena;
pub mod error;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::Document;
pub use error::{DomError, Result};
pub use serializer::{DomSerializer, SerializerConfig};
pub use types::*;
