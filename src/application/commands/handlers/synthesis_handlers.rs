//! Synthesis Command Handlers

use std::sync::Arc;

use crate::application::commands::synthesis_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCachePort, AudioStoragePort, SaveOptions, SynthesisRequest, TtsEnginePort,
};
use crate::domain::audio::{chunk_file_name, suggest_file_name};
use crate::domain::markup::{strip_tags, MarkupValidator, ValidationIssue};
use crate::domain::text::{TextError, TextPreparer};

/// Synthesize Handler - 预处理 -> 缓存 -> 引擎 -> 回填缓存
pub struct SynthesizeHandler {
    engine: Arc<dyn TtsEnginePort>,
    cache: Arc<dyn AudioCachePort>,
    preparer: TextPreparer,
    validator: MarkupValidator,
}

impl SynthesizeHandler {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        cache: Arc<dyn AudioCachePort>,
        preparer: TextPreparer,
        validator: MarkupValidator,
    ) -> Self {
        Self {
            engine,
            cache,
            preparer,
            validator,
        }
    }

    pub async fn handle(&self, cmd: SynthesizeCommand) -> Result<SynthesizeResponse, ApplicationError> {
        cmd.params.validate().map_err(ApplicationError::validation)?;

        let (chunks, warnings) = if cmd.params.markup {
            self.prepare_markup(&cmd)?
        } else {
            let prepared = self.preparer.prepare(&cmd.text, cmd.platform, cmd.chunking)?;
            (prepared.chunks, Vec::new())
        };

        let mut results = Vec::with_capacity(chunks.len());
        for (index, text) in chunks.into_iter().enumerate() {
            let cache_key = self.cache.key_for(&text, &cmd.params);

            if let Some(audio) = self.cache.lookup(&text, &cmd.params) {
                tracing::debug!(index = index, cache_key = %cache_key, "Cache hit");
                results.push(SynthesizedChunk {
                    index,
                    text,
                    cache_key,
                    audio,
                    cache_hit: true,
                });
                continue;
            }

            let audio = self
                .engine
                .synthesize(SynthesisRequest {
                    text: text.clone(),
                    params: cmd.params.clone(),
                    platform: cmd.platform,
                })
                .await?;
            self.cache.store(&text, &cmd.params, audio.clone());

            tracing::debug!(
                index = index,
                cache_key = %cache_key,
                size = audio.len(),
                "Chunk synthesized"
            );
            results.push(SynthesizedChunk {
                index,
                text,
                cache_key,
                audio,
                cache_hit: false,
            });
        }

        let response = SynthesizeResponse {
            chunks: results,
            warnings,
        };
        tracing::info!(
            platform = %cmd.platform,
            voice = %cmd.params.voice,
            chunks = response.chunks.len(),
            cache_hits = response.cache_hits(),
            bytes = response.total_bytes(),
            "Synthesis completed"
        );
        Ok(response)
    }

    /// 标记请求: 非严格校验，有 error 即拒绝；否则去掉平台不支持的标签
    fn prepare_markup(
        &self,
        cmd: &SynthesizeCommand,
    ) -> Result<(Vec<String>, Vec<ValidationIssue>), ApplicationError> {
        let report = self.validator.validate(&cmd.text, cmd.platform, false);
        if !report.is_valid() {
            tracing::debug!(
                platform = %cmd.platform,
                issues = report.issues.len(),
                "Markup rejected"
            );
            return Err(ApplicationError::invalid_markup(report.issues));
        }

        let sanitized = self.validator.sanitize(&cmd.text, cmd.platform);
        let spoken = strip_tags(&sanitized);
        let length = spoken.trim().chars().count();
        if length == 0 {
            return Err(TextError::Empty.into());
        }
        let limit = self.preparer.max_chars(cmd.platform);
        if length > limit {
            return Err(TextError::LengthExceeded { length, limit }.into());
        }

        let warnings = report.warnings().cloned().collect();
        Ok((vec![sanitized], warnings))
    }
}

/// SaveAudio Handler - 合成后写入输出目录
pub struct SaveAudioHandler {
    synthesizer: Arc<SynthesizeHandler>,
    storage: Arc<dyn AudioStoragePort>,
}

impl SaveAudioHandler {
    pub fn new(synthesizer: Arc<SynthesizeHandler>, storage: Arc<dyn AudioStoragePort>) -> Self {
        Self {
            synthesizer,
            storage,
        }
    }

    pub async fn handle(&self, cmd: SaveAudioCommand) -> Result<SaveAudioResponse, ApplicationError> {
        let format = cmd.synth.params.format;
        let file_name = cmd
            .file_name
            .clone()
            .unwrap_or_else(|| suggest_file_name(&cmd.synth.text, format));
        let options = SaveOptions::new(format)
            .with_conflict(cmd.conflict)
            .with_verify(cmd.verify);

        let synthesized = self.synthesizer.handle(cmd.synth).await?;
        let multiple = synthesized.chunks.len() > 1;

        let mut files = Vec::with_capacity(synthesized.chunks.len());
        for chunk in &synthesized.chunks {
            let name = if multiple {
                chunk_file_name(&file_name, chunk.index)
            } else {
                file_name.clone()
            };
            files.push(self.storage.save(&chunk.audio, &name, &options).await?);
        }

        tracing::info!(
            root = %self.storage.root().display(),
            files = files.len(),
            "Audio saved to output directory"
        );

        Ok(SaveAudioResponse {
            files,
            cache_hits: synthesized.cache_hits(),
            warnings: synthesized.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{StorageError, TtsError};
    use crate::domain::audio::AudioFormat;
    use crate::domain::markup::IssueKind;
    use crate::domain::synthesis::SynthesisParams;
    use crate::domain::text::TextPreparerConfig;
    use crate::domain::voice::Platform;
    use crate::infrastructure::adapters::{
        AudioFileManager, AudioSaver, FakeTtsClient, FixedSpaceProbe, SymphoniaProber,
    };
    use crate::infrastructure::memory::{AudioCacheConfig, InMemoryAudioCache};
    use tempfile::tempdir;

    struct Fixture {
        engine: Arc<FakeTtsClient>,
        cache: Arc<InMemoryAudioCache>,
        handler: Arc<SynthesizeHandler>,
    }

    fn fixture(preparer: TextPreparer) -> Fixture {
        let engine = Arc::new(FakeTtsClient::with_defaults());
        let cache = InMemoryAudioCache::new(AudioCacheConfig::default()).arc();
        let handler = Arc::new(SynthesizeHandler::new(
            engine.clone(),
            cache.clone(),
            preparer,
            MarkupValidator::default(),
        ));
        Fixture {
            engine,
            cache,
            handler,
        }
    }

    fn params() -> SynthesisParams {
        SynthesisParams::new("en-US")
    }

    #[tokio::test]
    async fn test_second_request_hits_cache_despite_whitespace() {
        let f = fixture(TextPreparer::default());

        let first = f
            .handler
            .handle(SynthesizeCommand::new("Hello   world", params(), Platform::Android))
            .await
            .unwrap();
        assert!(!first.chunks[0].cache_hit);

        let second = f
            .handler
            .handle(SynthesizeCommand::new("  Hello world ", params(), Platform::Android))
            .await
            .unwrap();
        assert!(second.chunks[0].cache_hit);
        assert_eq!(second.chunks[0].audio, first.chunks[0].audio);
        assert_eq!(second.chunks[0].cache_key, first.chunks[0].cache_key);

        assert_eq!(f.engine.calls(), 1);
        let stats = f.cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_long_text_is_chunked() {
        let preparer = TextPreparer::new(TextPreparerConfig {
            max_chars_override: Some(20),
            ..Default::default()
        });
        let f = fixture(preparer);

        let text = "First sentence here. Second sentence here. Third one.";
        let response = f
            .handler
            .handle(SynthesizeCommand::new(text, params(), Platform::Android))
            .await
            .unwrap();
        assert!(response.chunks.len() > 1);
        assert!(response.chunks.iter().all(|c| c.text.chars().count() <= 20));
        assert_eq!(f.engine.calls() as usize, response.chunks.len());

        let err = f
            .handler
            .handle(SynthesizeCommand::new(text, params(), Platform::Android).with_chunking(false))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::TextError(TextError::LengthExceeded { limit: 20, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_markup_lists_every_issue() {
        let f = fixture(TextPreparer::default());
        let cmd = SynthesizeCommand::new(
            "<speak><p>Hello</speak> <s>",
            params().with_markup(true),
            Platform::Android,
        );

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError { .. }));
        assert!(err.issues().len() >= 2);
        assert!(err
            .issues()
            .iter()
            .any(|i| i.kind == IssueKind::MalformedMarkup));
        assert_eq!(f.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_markup_is_sanitized_for_platform() {
        let f = fixture(TextPreparer::default());
        let cmd = SynthesizeCommand::new(
            "<speak>Hello <emphasis>there</emphasis></speak>",
            params().with_markup(true),
            Platform::Web,
        );

        let response = f.handler.handle(cmd).await.unwrap();
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].text, "<speak>Hello there</speak>");
        assert!(response
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::UnsupportedTag));
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_before_engine() {
        let f = fixture(TextPreparer::default());
        let err = f
            .handler
            .handle(SynthesizeCommand::new("hi", params().with_rate(9.0), Platform::Linux))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError { .. }));
        assert_eq!(f.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_not_cached() {
        let f = fixture(TextPreparer::default());
        f.engine.set_failing(true);

        let err = f
            .handler
            .handle(SynthesizeCommand::new("hello", params(), Platform::Linux))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::EngineError(TtsError::ServiceError(_))));
        assert_eq!(f.cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_save_audio_writes_files() {
        let dir = tempdir().unwrap();
        let f = fixture(TextPreparer::new(TextPreparerConfig {
            max_chars_override: Some(20),
            ..Default::default()
        }));
        let saver = AudioSaver::new(
            Arc::new(FixedSpaceProbe(u64::MAX)),
            Arc::new(SymphoniaProber::new()),
        );
        let storage = Arc::new(AudioFileManager::new(dir.path(), saver).await.unwrap());
        let handler = SaveAudioHandler::new(f.handler.clone(), storage.clone());

        let single = handler
            .handle(
                SaveAudioCommand::new(SynthesizeCommand::new("Good morning", params(), Platform::Linux))
                    .with_file_name("morning.wav"),
            )
            .await
            .unwrap();
        assert_eq!(single.files.len(), 1);
        assert_eq!(single.files[0].path, dir.path().join("morning.wav"));

        let chunked = handler
            .handle(SaveAudioCommand::new(SynthesizeCommand::new(
                "First one here. Second one here.",
                params(),
                Platform::Linux,
            )))
            .await
            .unwrap();
        assert_eq!(chunked.files.len(), 2);
        let first = chunked.files[0].path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(first.starts_with("first-one-here-second-one-"));
        assert!(first.ends_with("-001.wav"));

        let err = handler
            .handle(
                SaveAudioCommand::new(SynthesizeCommand::new("Good morning", params(), Platform::Linux))
                    .with_file_name("morning.mp3"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::StorageError(StorageError::ExtensionMismatch { format: AudioFormat::Wav, .. })
        ));
    }
}
