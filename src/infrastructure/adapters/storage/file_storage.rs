//! Audio File Manager - 输出目录管理
//!
//! 实现 AudioStoragePort trait；写入委托给 AudioSaver

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::audio_saver::{AudioSaver, PROBE_PREFIX, TEMP_SUFFIX};
use crate::application::ports::{
    AudioStoragePort, SaveOptions, SavedAudio, StorageError, StorageStats, StoredAudioFile,
};
use crate::domain::audio::{suggest_file_name, AudioFormat};

/// 输出目录下的音频文件管理
pub struct AudioFileManager {
    /// 输出根目录
    root: PathBuf,
    saver: AudioSaver,
}

impl AudioFileManager {
    /// 创建管理器，确保根目录存在
    pub async fn new(root: impl AsRef<Path>, saver: AudioSaver) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;

        Ok(Self { root, saver })
    }

    /// 为文本生成文件名
    pub fn suggest_file_name(&self, text: &str, format: AudioFormat) -> String {
        suggest_file_name(text, format)
    }

    /// 根目录下的单层文件名，不允许路径分隔符和 `..`
    fn resolve(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let candidate = Path::new(file_name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !file_name.trim().is_empty() => {
                Ok(self.root.join(candidate))
            }
            _ => Err(StorageError::InvalidPath {
                path: candidate.to_path_buf(),
                reason: "expected a plain file name".to_string(),
            }),
        }
    }
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with(PROBE_PREFIX) || (name.starts_with('.') && name.ends_with(TEMP_SUFFIX))
}

fn audio_format_of(path: &Path) -> Option<AudioFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<AudioFormat>().ok())
}

#[async_trait]
impl AudioStoragePort for AudioFileManager {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn save(
        &self,
        data: &[u8],
        file_name: &str,
        options: &SaveOptions,
    ) -> Result<SavedAudio, StorageError> {
        let dest = self.resolve(file_name)?;
        self.saver.save(data, &dest, options).await
    }

    async fn read(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(file_name)?;
        fs::read(&path).await.map_err(|e| StorageError::io(&path, e))
    }

    async fn delete(&self, file_name: &str) -> Result<(), StorageError> {
        let path = self.resolve(file_name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        tracing::debug!(path = %path.display(), "Deleted audio file");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredAudioFile>, StorageError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            let format = match audio_format_of(&path) {
                Some(format) => format,
                None => continue,
            };
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            files.push(StoredAudioFile {
                path,
                file_name,
                size_bytes: metadata.len(),
                format: Some(format),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    async fn stats(&self) -> Result<StorageStats, StorageError> {
        let files = self.list().await?;
        Ok(StorageStats {
            file_count: files.len() as u64,
            used_bytes: files.iter().map(|f| f.size_bytes).sum(),
        })
    }

    async fn cleanup_temp_files(&self) -> Result<u64, StorageError> {
        let mut removed = 0u64;
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_temp_file(&name) {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove temp file"
                ),
            }
        }

        if removed > 0 {
            tracing::info!(root = %self.root.display(), removed = removed, "Cleaned up temp files");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ConflictPolicy;
    use crate::domain::audio::wrap_i16_samples;
    use crate::infrastructure::adapters::audio::SymphoniaProber;
    use crate::infrastructure::adapters::storage::DirectoryQuotaProbe;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn manager(root: &Path) -> AudioFileManager {
        let saver = AudioSaver::new(
            Arc::new(DirectoryQuotaProbe::unlimited()),
            Arc::new(SymphoniaProber::new()),
        );
        AudioFileManager::new(root, saver).await.unwrap()
    }

    fn wav() -> Vec<u8> {
        wrap_i16_samples(&[0i16; 800], 16000, 1).unwrap()
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let temp_dir = tempdir().unwrap();
        let storage = manager(temp_dir.path()).await;
        let data = wav();

        let saved = storage
            .save(&data, "hello.wav", &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap();
        assert!(saved.path.exists());

        assert_eq!(storage.read("hello.wav").await.unwrap(), data);

        storage.delete("hello.wav").await.unwrap();
        assert!(matches!(
            storage.read("hello.wav").await,
            Err(StorageError::FileNotFound { .. })
        ));
        assert!(matches!(
            storage.delete("hello.wav").await,
            Err(StorageError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let temp_dir = tempdir().unwrap();
        let storage = manager(temp_dir.path()).await;

        for name in ["../escape.wav", "nested/a.wav", "", "/abs.wav", ".."] {
            assert!(
                matches!(storage.read(name).await, Err(StorageError::InvalidPath { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let temp_dir = tempdir().unwrap();
        let storage = manager(temp_dir.path()).await;
        let data = wav();
        let options = SaveOptions::new(AudioFormat::Wav).with_conflict(ConflictPolicy::AutoRename);

        storage.save(&data, "b.wav", &options).await.unwrap();
        storage.save(&data, "a.wav", &options).await.unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"ignore me").await.unwrap();

        let files = storage.list().await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.wav", "b.wav"]);
        assert!(files.iter().all(|f| f.format == Some(AudioFormat::Wav)));
        assert!(files[0].modified_at.is_some());

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.used_bytes, 2 * data.len() as u64);
    }

    #[tokio::test]
    async fn test_cleanup_temp_files() {
        let temp_dir = tempdir().unwrap();
        let storage = manager(temp_dir.path()).await;

        fs::write(temp_dir.path().join(".a.wav.1234.part"), b"x").await.unwrap();
        fs::write(temp_dir.path().join(format!("{}abcd", PROBE_PREFIX)), b"").await.unwrap();
        fs::write(temp_dir.path().join("keep.wav"), wav()).await.unwrap();

        assert_eq!(storage.cleanup_temp_files().await.unwrap(), 2);
        assert_eq!(storage.cleanup_temp_files().await.unwrap(), 0);
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_suggest_file_name() {
        let temp_dir = tempdir().unwrap();
        let storage = manager(temp_dir.path()).await;
        let name = storage.suggest_file_name("Good morning", AudioFormat::Ogg);
        assert!(name.starts_with("good-morning-"));
        assert!(name.ends_with(".ogg"));
    }
}
