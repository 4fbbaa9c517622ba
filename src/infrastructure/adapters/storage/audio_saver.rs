//! Audio Saver - 安全写入音频文件
//!
//! 流程: 路径/扩展名检查 -> 写权限探测 -> 空间估算 -> 冲突处理
//! -> 临时文件写入 + fsync + 原子 rename -> 可选校验

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::application::ports::{
    AudioInfo, AudioProbePort, ConflictPolicy, SaveOptions, SavedAudio, SpaceProbe, StorageError,
};
use crate::domain::audio::validate_format;

/// 临时文件后缀
pub(crate) const TEMP_SUFFIX: &str = ".part";
/// 写权限探测文件前缀
pub(crate) const PROBE_PREFIX: &str = ".speechcache-probe-";

const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// 空间估算: 数据大小 × 1.1，向上取整
fn required_space(len: usize) -> u64 {
    (len as u64).saturating_mul(11).div_ceil(10)
}

pub struct AudioSaver {
    space: Arc<dyn SpaceProbe>,
    prober: Arc<dyn AudioProbePort>,
}

impl AudioSaver {
    pub fn new(space: Arc<dyn SpaceProbe>, prober: Arc<dyn AudioProbePort>) -> Self {
        Self { space, prober }
    }

    pub async fn save(
        &self,
        data: &[u8],
        dest: &Path,
        options: &SaveOptions,
    ) -> Result<SavedAudio, StorageError> {
        check_destination(dest, options)?;
        if data.is_empty() {
            return Err(StorageError::VerificationFailed {
                path: dest.to_path_buf(),
                reason: "audio data is empty".to_string(),
            });
        }

        let parent = parent_dir(dest);
        self.prepare_parent(&parent, options.create_dirs).await?;
        probe_write_permission(&parent).await?;

        let required = required_space(data.len());
        let available = self.space.available_bytes(&parent).await?;
        if available < required {
            return Err(StorageError::InsufficientSpace {
                path: parent,
                required,
                available,
            });
        }

        let (target, renamed) = resolve_conflict(dest, options.conflict).await?;
        write_atomically(&target, data).await?;

        let info = if options.verify {
            match self.verify(&target, data.len(), options).await {
                Ok(info) => info,
                Err(e) => {
                    let _ = fs::remove_file(&target).await;
                    return Err(e);
                }
            }
        } else {
            None
        };

        tracing::info!(
            path = %target.display(),
            size = data.len(),
            format = %options.format,
            renamed = renamed,
            "Audio saved"
        );

        Ok(SavedAudio {
            path: target,
            size_bytes: data.len() as u64,
            format: options.format,
            renamed,
            info,
        })
    }

    async fn prepare_parent(&self, parent: &Path, create_dirs: bool) -> Result<(), StorageError> {
        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::InvalidPath {
                path: parent.to_path_buf(),
                reason: "parent is not a directory".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && create_dirs => {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::io(parent, e))
            }
            Err(e) => Err(StorageError::io(parent, e)),
        }
    }

    /// 重新读取文件，校验大小与格式；探测失败不算校验失败
    async fn verify(
        &self,
        path: &Path,
        expected_len: usize,
        options: &SaveOptions,
    ) -> Result<Option<AudioInfo>, StorageError> {
        let written = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
        if written.len() != expected_len {
            return Err(StorageError::VerificationFailed {
                path: path.to_path_buf(),
                reason: format!("size mismatch: expected {}, found {}", expected_len, written.len()),
            });
        }
        validate_format(&written, options.format).map_err(|e| StorageError::VerificationFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match self.prober.probe(&written) {
            Ok(info) => Ok(Some(info)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Probe skipped during verification");
                Ok(None)
            }
        }
    }
}

fn check_destination(dest: &Path, options: &SaveOptions) -> Result<(), StorageError> {
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| StorageError::InvalidPath {
            path: dest.to_path_buf(),
            reason: "missing file name".to_string(),
        })?;

    if file_name.starts_with('.') && file_name.ends_with(TEMP_SUFFIX) {
        return Err(StorageError::InvalidPath {
            path: dest.to_path_buf(),
            reason: "reserved temporary file name".to_string(),
        });
    }

    let ext = dest.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !options.format.matches_extension(ext) {
        return Err(StorageError::ExtensionMismatch {
            path: dest.to_path_buf(),
            format: options.format,
        });
    }
    Ok(())
}

fn parent_dir(dest: &Path) -> PathBuf {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn probe_write_permission(dir: &Path) -> Result<(), StorageError> {
    let probe = dir.join(format!("{}{}", PROBE_PREFIX, Uuid::new_v4().simple()));
    fs::write(&probe, b"")
        .await
        .map_err(|e| StorageError::io(dir, e))?;
    fs::remove_file(&probe)
        .await
        .map_err(|e| StorageError::io(&probe, e))
}

async fn exists(path: &Path) -> Result<bool, StorageError> {
    fs::try_exists(path).await.map_err(|e| StorageError::io(path, e))
}

async fn resolve_conflict(
    dest: &Path,
    policy: ConflictPolicy,
) -> Result<(PathBuf, bool), StorageError> {
    if !exists(dest).await? {
        return Ok((dest.to_path_buf(), false));
    }

    match policy {
        ConflictPolicy::Overwrite => Ok((dest.to_path_buf(), false)),
        ConflictPolicy::Skip => Err(StorageError::Skipped {
            path: dest.to_path_buf(),
        }),
        ConflictPolicy::Error => Err(StorageError::AlreadyExists {
            path: dest.to_path_buf(),
        }),
        ConflictPolicy::AutoRename => {
            let stem = dest
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ext = dest
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();

            for n in 1..=MAX_RENAME_ATTEMPTS {
                let candidate = dest.with_file_name(format!("{}-{}.{}", stem, n, ext));
                if !exists(&candidate).await? {
                    return Ok((candidate, true));
                }
            }
            Err(StorageError::AlreadyExists {
                path: dest.to_path_buf(),
            })
        }
    }
}

/// 写入同目录临时文件，fsync 后 rename 到目标
async fn write_atomically(target: &Path, data: &[u8]) -> Result<(), StorageError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(
        ".{}.{}{}",
        file_name,
        Uuid::new_v4().simple(),
        TEMP_SUFFIX
    ));

    let result = async {
        let mut file = fs::File::create(&temp)
            .await
            .map_err(|e| StorageError::io(&temp, e))?;
        file.write_all(data)
            .await
            .map_err(|e| StorageError::io(&temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(&temp, e))?;
        drop(file);
        fs::rename(&temp, target)
            .await
            .map_err(|e| StorageError::io(target, e))
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&temp).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::{wrap_i16_samples, AudioFormat};
    use crate::infrastructure::adapters::audio::SymphoniaProber;
    use crate::infrastructure::adapters::storage::FixedSpaceProbe;
    use tempfile::tempdir;

    fn saver(available: u64) -> AudioSaver {
        AudioSaver::new(Arc::new(FixedSpaceProbe(available)), Arc::new(SymphoniaProber::new()))
    }

    fn wav() -> Vec<u8> {
        wrap_i16_samples(&vec![0i16; 16000], 16000, 1).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_verify() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out/hello.wav");
        let data = wav();

        let saved = saver(u64::MAX)
            .save(&data, &dest, &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap();

        assert_eq!(saved.path, dest);
        assert!(!saved.renamed);
        assert_eq!(saved.size_bytes, data.len() as u64);
        assert_eq!(saved.info.unwrap().duration_ms, Some(1000));
        assert_eq!(fs::read(&dest).await.unwrap(), data);

        // 没有残留的临时文件和探测文件
        let mut entries = fs::read_dir(dir.path().join("out")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["hello.wav".to_string()]);
    }

    #[tokio::test]
    async fn test_extension_mismatch() {
        let dir = tempdir().unwrap();
        let err = saver(u64::MAX)
            .save(&wav(), &dir.path().join("a.mp3"), &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ExtensionMismatch { format: AudioFormat::Wav, .. }));
    }

    #[tokio::test]
    async fn test_insufficient_space() {
        let dir = tempdir().unwrap();
        let data = vec![0u8; 1000];
        let err = saver(1099)
            .save(&data, &dir.path().join("a.wav"), &SaveOptions::new(AudioFormat::Wav).with_verify(false))
            .await
            .unwrap_err();
        match err {
            StorageError::InsufficientSpace { required, available, .. } => {
                assert_eq!(required, 1100);
                assert_eq!(available, 1099);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_conflict_policies() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("a.wav");
        let saver = saver(u64::MAX);
        let data = wav();
        saver.save(&data, &dest, &SaveOptions::new(AudioFormat::Wav)).await.unwrap();

        let skip = SaveOptions::new(AudioFormat::Wav).with_conflict(ConflictPolicy::Skip);
        assert!(matches!(
            saver.save(&data, &dest, &skip).await,
            Err(StorageError::Skipped { .. })
        ));

        let error = SaveOptions::new(AudioFormat::Wav).with_conflict(ConflictPolicy::Error);
        assert!(matches!(
            saver.save(&data, &dest, &error).await,
            Err(StorageError::AlreadyExists { .. })
        ));

        let renamed = saver
            .save(&data, &dest, &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap();
        assert!(renamed.renamed);
        assert_eq!(renamed.path, dir.path().join("a-1.wav"));

        let renamed = saver
            .save(&data, &dest, &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap();
        assert_eq!(renamed.path, dir.path().join("a-2.wav"));

        let overwrite = SaveOptions::new(AudioFormat::Wav).with_conflict(ConflictPolicy::Overwrite);
        let replaced = saver.save(&data, &dest, &overwrite).await.unwrap();
        assert_eq!(replaced.path, dest);
        assert!(!replaced.renamed);
    }

    #[tokio::test]
    async fn test_verification_rejects_wrong_container() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("a.wav");
        let err = saver(u64::MAX)
            .save(b"not audio at all", &dest, &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::VerificationFailed { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_missing_parent_without_create_dirs() {
        let dir = tempdir().unwrap();
        let mut options = SaveOptions::new(AudioFormat::Wav);
        options.create_dirs = false;
        let err = saver(u64::MAX)
            .save(&wav(), &dir.path().join("missing/a.wav"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_data_rejected() {
        let dir = tempdir().unwrap();
        let err = saver(u64::MAX)
            .save(&[], &dir.path().join("a.wav"), &SaveOptions::new(AudioFormat::Wav))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::VerificationFailed { .. }));
    }

    #[test]
    fn test_required_space() {
        assert_eq!(required_space(1000), 1100);
        assert_eq!(required_space(1), 2);
        assert_eq!(required_space(0), 0);
    }
}
