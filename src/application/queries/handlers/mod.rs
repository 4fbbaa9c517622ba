//! Query Handlers 实现

mod stats_handlers;
mod voice_handlers;

pub use stats_handlers::*;
pub use voice_handlers::*;
