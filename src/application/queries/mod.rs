//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：音色目录与统计

mod stats_queries;
mod voice_queries;

pub mod handlers;

pub use stats_queries::*;
pub use voice_queries::*;
