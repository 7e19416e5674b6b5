//! UI primitives for the Solace CLI.
//!
//! - **Context**: Environment detection (TTY, width, color)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badges and styles
//! - **Render**: Tables, headers, receipts, hints

mod context;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use theme::Badge;

pub use render::{
    badge, header, hint, kv, print, print_error, print_json, receipt, table, truncate,
};
