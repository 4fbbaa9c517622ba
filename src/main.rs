//! speechcache - 命令行入口
//!
//! 组装各层组件：配置 -> 日志 -> 目录缓存 -> 音频缓存 -> 合成 -> 保存

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use speechcache::application::ports::{
    AudioCachePort, AudioStoragePort, Clock, SystemClock, TtsEnginePort, VoiceCatalogPort,
    VoiceFetcherPort,
};
use speechcache::application::{
    GetCacheStats, GetCacheStatsHandler, GetCatalogStats, GetCatalogStatsHandler, ListSavedAudio,
    ListSavedAudioHandler, ListVoices, ListVoicesHandler, SaveAudioCommand, SaveAudioHandler,
    SynthesizeCommand, SynthesizeHandler,
};
use speechcache::config::{load_config, load_config_from_path, print_config, AppConfig};
use speechcache::domain::audio::AudioFormat;
use speechcache::domain::markup::MarkupValidator;
use speechcache::domain::synthesis::SynthesisParams;
use speechcache::domain::text::TextPreparer;
use speechcache::domain::voice::Platform;
use speechcache::infrastructure::adapters::{
    AudioFileManager, AudioSaver, DirectoryQuotaProbe, FakeTtsClient, HttpTtsClient,
    HttpTtsClientConfig, HttpVoiceFetcher, HttpVoiceFetcherConfig, StaticVoiceFetcher,
    SymphoniaProber,
};
use speechcache::infrastructure::memory::{InMemoryAudioCache, VoiceCatalogCache};
use speechcache::infrastructure::persistence::SledCatalogStore;
use speechcache::infrastructure::worker::{CatalogRefresher, CatalogRefresherConfig};

#[derive(Parser, Debug)]
#[command(name = "speechcache", version, about = "Cached text-to-speech pipeline")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 使用静音引擎和内置音色目录
    #[arg(long, global = true)]
    dry_run: bool,

    /// 目标平台
    #[arg(long, global = true)]
    platform: Option<Platform>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 合成文本并保存到输出目录
    Say {
        /// 要合成的文本
        #[arg(required = true)]
        text: Vec<String>,

        /// 音色
        #[arg(short, long)]
        voice: Option<String>,

        /// 输出格式
        #[arg(short, long)]
        format: Option<AudioFormat>,

        /// 输出文件名（默认根据文本生成）
        #[arg(short, long)]
        output: Option<String>,

        /// 文本为 SSML
        #[arg(long)]
        markup: bool,

        #[arg(long, default_value_t = 1.0)]
        rate: f32,

        #[arg(long, default_value_t = 1.0)]
        pitch: f32,

        #[arg(long, default_value_t = 1.0)]
        volume: f32,
    },

    /// 列出平台音色
    Voices {
        /// 语言前缀过滤
        #[arg(short, long)]
        locale: Option<String>,

        /// 忽略缓存重新拉取
        #[arg(long)]
        refresh: bool,
    },

    /// 列出输出目录中的音频文件
    Files,

    /// 清理输出目录中的临时文件
    Cleanup,

    /// 打印生效配置
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(Some(path.as_path())),
        None => load_config(),
    }
    .context("Failed to load config")?;
    if cli.dry_run {
        config.tts.dry_run = true;
    }
    if cli.platform.is_some() {
        config.tts.platform = cli.platform;
    }

    init_tracing(&config);
    print_config(&config);

    match cli.command {
        Command::Config => {
            println!("{}", config.to_toml().context("Failed to render config")?);
            Ok(())
        }
        Command::Files => {
            let storage = build_storage(&config).await?;
            for file in ListSavedAudioHandler::new(storage).handle(ListSavedAudio).await? {
                println!("{}\t{} bytes", file.file_name, file.size_bytes);
            }
            Ok(())
        }
        Command::Cleanup => {
            let storage = build_storage(&config).await?;
            let removed = storage.cleanup_temp_files().await?;
            println!("removed {} temp files", removed);
            Ok(())
        }
        command => run_with_catalog(&config, command).await,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "warn,speechcache={}",
            config.log.level
        ))
    });

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn build_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn AudioStoragePort>> {
    let saver = AudioSaver::new(
        Arc::new(DirectoryQuotaProbe::new(config.storage.quota_bytes)),
        Arc::new(SymphoniaProber::new()),
    );
    let manager = AudioFileManager::new(&config.storage.output_dir, saver)
        .await
        .with_context(|| format!("Failed to open output dir {:?}", config.storage.output_dir))?;
    Ok(Arc::new(manager))
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<Arc<dyn VoiceFetcherPort>> {
    if config.tts.dry_run {
        return Ok(Arc::new(StaticVoiceFetcher::builtin()));
    }
    let fetcher = HttpVoiceFetcher::new(HttpVoiceFetcherConfig {
        base_url: config.catalog.url.clone().unwrap_or_else(|| config.tts.url.clone()),
        timeout_secs: config.catalog.timeout_secs,
    })?;
    Ok(Arc::new(fetcher))
}

fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    if config.tts.dry_run {
        return Ok(Arc::new(FakeTtsClient::with_defaults()));
    }
    let engine = HttpTtsClient::new(
        HttpTtsClientConfig::new(config.tts.url.clone())
            .with_timeout(config.tts.timeout_secs)
            .with_retries(config.tts.max_retries),
    )?;
    Ok(Arc::new(engine))
}

/// 需要音色目录的命令：打开快照、启动刷新，结束时落盘
async fn run_with_catalog(config: &AppConfig, command: Command) -> anyhow::Result<()> {
    let platform = config.tts.platform();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if let Some(parent) = config.catalog.db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let store = SledCatalogStore::open(&config.catalog.db_path)
        .with_context(|| format!("Failed to open catalog store {:?}", config.catalog.db_path))?
        .arc();
    let catalog = VoiceCatalogCache::open(
        config.catalog.cache_config(),
        build_fetcher(config)?,
        clock.clone(),
        store,
    )
    .await
    .arc();

    let refresher = config.catalog.refresh_interval().map(|interval| {
        CatalogRefresher::new(CatalogRefresherConfig { interval, platform }, catalog.clone())
            .spawn()
    });

    let result = match command {
        Command::Say {
            text,
            voice,
            format,
            output,
            markup,
            rate,
            pitch,
            volume,
        } => {
            let params = SynthesisParams::new(voice.unwrap_or_else(|| config.tts.voice.clone()))
                .with_format(format.unwrap_or(config.tts.format))
                .with_rate(rate)
                .with_pitch(pitch)
                .with_volume(volume)
                .with_markup(markup);
            say(config, catalog.clone(), clock, text.join(" "), params, output).await
        }
        Command::Voices { locale, refresh } => {
            let query = ListVoices {
                platform,
                locale,
                force_refresh: refresh,
            };
            match ListVoicesHandler::new(catalog.clone()).handle(query).await {
                Ok(voices) => {
                    for voice in voices {
                        println!("{}\t{}\t{}", voice.name, voice.locale, voice.display_name);
                    }
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!(e.user_message())),
            }
        }
        _ => Ok(()),
    };

    let stats = GetCatalogStatsHandler::new(catalog.clone()).handle(GetCatalogStats);
    tracing::info!(
        buckets = stats.bucket_count,
        voices = stats.voice_count,
        fetches = stats.fetches,
        stale_served = stats.stale_served,
        "Voice catalog stats"
    );

    if let Some(handle) = refresher {
        handle.shutdown().await;
    }
    catalog.shutdown().await;
    tracing::info!("Shutdown complete");

    result
}

async fn say(
    config: &AppConfig,
    catalog: Arc<VoiceCatalogCache>,
    clock: Arc<dyn Clock>,
    text: String,
    params: SynthesisParams,
    output: Option<String>,
) -> anyhow::Result<()> {
    let platform = config.tts.platform();

    // 音色不在目录中只提示，不阻止合成
    match catalog.get(platform, false).await {
        Ok(_) if catalog.find_voice(platform, &params.voice).is_none() => tracing::warn!(
            voice = %params.voice,
            platform = %platform,
            "Voice not listed in catalog"
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Voice catalog unavailable"),
    }

    let engine = build_engine(config)?;
    if !engine.health_check().await {
        tracing::warn!(url = %config.tts.url, "TTS service health check failed");
    }
    let cache: Arc<dyn AudioCachePort> =
        InMemoryAudioCache::with_clock(config.cache.audio_cache_config(), clock).arc();
    let synthesizer = Arc::new(SynthesizeHandler::new(
        engine,
        cache.clone(),
        TextPreparer::new(config.text.preparer_config()),
        MarkupValidator::default(),
    ));
    let storage = build_storage(config).await?;
    let handler = SaveAudioHandler::new(synthesizer, storage);

    let mut command = SaveAudioCommand::new(
        SynthesizeCommand::new(text, params, platform).with_chunking(config.text.chunking),
    )
    .with_conflict(config.storage.conflict);
    command.verify = config.storage.verify;
    if let Some(name) = output {
        command = command.with_file_name(name);
    }

    let response = match handler.handle(command).await {
        Ok(response) => response,
        Err(e) => {
            for issue in e.issues() {
                eprintln!("  {}", issue);
            }
            return Err(anyhow::anyhow!(e.user_message()));
        }
    };

    for warning in &response.warnings {
        tracing::warn!(issue = %warning, "Markup warning");
    }
    for file in &response.files {
        println!("{}", file.path.display());
    }

    let stats = GetCacheStatsHandler::new(cache).handle(GetCacheStats);
    tracing::info!(
        entries = stats.entry_count,
        bytes = stats.size_bytes,
        hit_rate = stats.hit_rate,
        "Audio cache stats"
    );
    Ok(())
}
