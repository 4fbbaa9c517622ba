//! Text Context - 合成前的文本预处理
//!
//! 决定最终被哈希、被送去合成的文本内容

mod chunker;
mod errors;
mod expansion;
mod preparer;
mod profile;
mod script_spacing;

pub use chunker::split_into_chunks;
pub use errors::TextError;
pub use expansion::{expand_symbols, normalize_whitespace, strip_special_chars};
pub use preparer::{PreparedText, TextPreparer, TextPreparerConfig};
pub use profile::PlatformProfile;
pub use script_spacing::{apply_script_spacing, ScriptRange};
