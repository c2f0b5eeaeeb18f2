//! # api-adapters
//!
//! HTTP surface of ULTRAGOL: the static SPA router and server-side
//! rendering with output escaping.

pub mod render;
pub mod router;
pub mod sanitize;

pub use render::{render_stream_card, CardView};
pub use router::spa_router;
pub use sanitize::{escape_attr, escape_text, safe_url};
