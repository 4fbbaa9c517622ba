//! Synthesis Context - 合成请求
//!
//! 合成参数与内容寻址缓存 key 的推导

mod value_objects;

pub use value_objects::{normalize_for_key, CacheKey, SynthesisParams};
