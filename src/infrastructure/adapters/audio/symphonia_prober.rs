//! Symphonia Prober - 基于 symphonia 的容器探测
//!
//! 只读取容器头与轨道参数，不解码音频包

use std::io::Cursor;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, AudioProbePort};
use crate::domain::audio::{detect_format, FormatError};

#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProber;

impl SymphoniaProber {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProbePort for SymphoniaProber {
    fn probe(&self, data: &[u8]) -> Result<AudioInfo, FormatError> {
        let format = detect_format(data).ok_or(FormatError::UnknownFormat)?;

        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| FormatError::ProbeFailed(e.to_string()))?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| FormatError::ProbeFailed("No audio track found".to_string()))?;
        let params = &track.codec_params;

        let duration_ms = match (params.time_base, params.n_frames, params.sample_rate) {
            (Some(time_base), Some(n_frames), _) => {
                let time = time_base.calc_time(n_frames);
                Some(time.seconds * 1000 + (time.frac * 1000.0) as u64)
            }
            (None, Some(n_frames), Some(sample_rate)) if sample_rate > 0 => {
                Some(n_frames * 1000 / sample_rate as u64)
            }
            _ => None,
        };

        let info = AudioInfo {
            format,
            size_bytes: data.len() as u64,
            duration_ms,
            sample_rate: params.sample_rate,
            channels: params.channels.map(|c| c.count() as u16),
        };

        tracing::debug!(
            format = %info.format,
            size_bytes = info.size_bytes,
            duration_ms = ?info.duration_ms,
            sample_rate = ?info.sample_rate,
            "Audio probed"
        );
        Ok(info)
    }
}
