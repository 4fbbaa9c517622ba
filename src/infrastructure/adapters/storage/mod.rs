//! Storage Adapter - 音频文件输出

mod audio_saver;
mod file_storage;
mod space_probe;

pub use audio_saver::AudioSaver;
pub use file_storage::AudioFileManager;
pub use space_probe::{DirectoryQuotaProbe, FixedSpaceProbe};
