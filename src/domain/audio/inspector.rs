//! Audio Format Inspector
//!
//! 基于魔数签名的容器探测、WAV 头解析，以及把裸 PCM 包装成最小 WAV 容器

use super::{AudioFormat, FormatError};

/// 标准 PCM WAV 头长度
pub const WAV_HEADER_LEN: usize = 44;

/// WAV 文件头信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    /// 1 = PCM, 3 = IEEE float, 0xFFFE = extensible
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// data chunk 起始偏移
    pub data_offset: usize,
    /// data chunk 大小（字节）
    pub data_size: usize,
    pub duration_ms: u64,
}

/// 按固定优先级探测容器格式，第一个匹配的签名胜出
///
/// 无法识别时返回 `None`
pub fn detect_format(data: &[u8]) -> Option<AudioFormat> {
    AudioFormat::DETECTION_ORDER
        .into_iter()
        .find(|format| matches_signature(*format, data))
}

/// 校验数据是否为期望的格式
pub fn validate_format(data: &[u8], expected: AudioFormat) -> Result<(), FormatError> {
    match detect_format(data) {
        Some(detected) if detected == expected => Ok(()),
        Some(detected) => Err(FormatError::Mismatch { expected, detected }),
        None => Err(FormatError::UnknownFormat),
    }
}

fn matches_signature(format: AudioFormat, data: &[u8]) -> bool {
    match format {
        AudioFormat::Wav => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE",
        AudioFormat::Flac => data.starts_with(b"fLaC"),
        AudioFormat::Ogg => data.starts_with(b"OggS"),
        AudioFormat::M4a => data.len() >= 12 && &data[4..8] == b"ftyp",
        AudioFormat::Mp3 => data.starts_with(b"ID3") || is_mpeg_layer3_sync(data),
        AudioFormat::Aac => is_adts_sync(data),
    }
}

/// MPEG 音频帧同步字 + Layer III
#[inline]
fn is_mpeg_layer3_sync(data: &[u8]) -> bool {
    data.len() >= 2
        && data[0] == 0xFF
        && (data[1] & 0xE0) == 0xE0
        && (data[1] & 0x18) != 0x08
        && (data[1] & 0x06) == 0x02
}

/// ADTS 同步字（12 bit 全 1）且 layer 为 00
#[inline]
fn is_adts_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xF6) == 0xF0
}

#[inline]
fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

#[inline]
fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 解析 WAV 文件头
///
/// 遍历 RIFF chunk，找到 `fmt ` 与 `data`；chunk 按偶数字节对齐
pub fn parse_wav(data: &[u8]) -> Result<WavInfo, FormatError> {
    if data.len() < WAV_HEADER_LEN {
        return Err(FormatError::InvalidWav("data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(FormatError::InvalidWav("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidWav("missing WAVE identifier".to_string()));
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body + 16 > data.len() {
                    return Err(FormatError::InvalidWav("invalid fmt chunk size".to_string()));
                }
                fmt = Some((
                    read_u16(data, body),
                    read_u16(data, body + 2),
                    read_u32(data, body + 4),
                    read_u16(data, body + 14),
                ));
            }
            b"data" => {
                // 流式写出的 WAV 可能声明了超出实际长度的 data size
                let available = data.len().saturating_sub(body);
                data_chunk = Some((body, chunk_size.min(available)));
                break;
            }
            _ => {}
        }

        pos = body.saturating_add(chunk_size);
        if chunk_size % 2 != 0 {
            pos = pos.saturating_add(1);
        }
    }

    let (audio_format, channels, sample_rate, bits_per_sample) =
        fmt.ok_or_else(|| FormatError::InvalidWav("missing fmt chunk".to_string()))?;
    let (data_offset, data_size) =
        data_chunk.ok_or_else(|| FormatError::InvalidWav("missing data chunk".to_string()))?;

    if channels == 0 {
        return Err(FormatError::InvalidWav("zero channels".to_string()));
    }

    let bytes_per_frame = (bits_per_sample as u64 / 8) * channels as u64;
    let duration_ms = if bytes_per_frame > 0 && sample_rate > 0 {
        (data_size as u64 / bytes_per_frame) * 1000 / sample_rate as u64
    } else {
        0
    };

    Ok(WavInfo {
        audio_format,
        channels,
        sample_rate,
        bits_per_sample,
        data_offset,
        data_size,
        duration_ms,
    })
}

/// 把裸 PCM（小端、交错）包装成最小的 44 字节头 WAV
pub fn wrap_pcm_as_wav(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Result<Vec<u8>, FormatError> {
    if channels == 0 || sample_rate == 0 {
        return Err(FormatError::InvalidWav(
            "channels and sample rate must be non-zero".to_string(),
        ));
    }
    if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(FormatError::InvalidWav(format!(
            "unsupported bits per sample: {}",
            bits_per_sample
        )));
    }

    let block_align = channels
        .checked_mul(bits_per_sample / 8)
        .ok_or_else(|| FormatError::InvalidWav(format!("too many channels: {}", channels)))?;
    if pcm.len() % block_align as usize != 0 {
        return Err(FormatError::InvalidWav(format!(
            "PCM length {} is not a multiple of block align {}",
            pcm.len(),
            block_align
        )));
    }
    let data_size = u32::try_from(pcm.len())
        .map_err(|_| FormatError::InvalidWav("PCM data exceeds 4 GiB".to_string()))?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            FormatError::InvalidWav(format!("byte rate overflows for {} Hz", sample_rate))
        })?;
    let riff_size = data_size
        .checked_add(36)
        .ok_or_else(|| FormatError::InvalidWav("PCM data exceeds 4 GiB".to_string()))?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    Ok(wav)
}

/// 16 位样本的便捷包装
pub fn wrap_i16_samples(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, FormatError> {
    let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    wrap_pcm_as_wav(&pcm, sample_rate, channels, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_wav(sample_rate: u32, seconds: u32) -> Vec<u8> {
        let samples = vec![0i16; (sample_rate * seconds) as usize];
        wrap_i16_samples(&samples, sample_rate, 1).unwrap()
    }

    #[test]
    fn test_detect_signatures() {
        assert_eq!(detect_format(&silent_wav(8000, 1)), Some(AudioFormat::Wav));
        assert_eq!(detect_format(b"fLaC\0\0\0\x22"), Some(AudioFormat::Flac));
        assert_eq!(detect_format(b"OggS\0\x02\0\0"), Some(AudioFormat::Ogg));
        assert_eq!(
            detect_format(b"\0\0\0\x20ftypM4A \0\0\0\0"),
            Some(AudioFormat::M4a)
        );
        assert_eq!(detect_format(b"ID3\x04\0\0\0\0"), Some(AudioFormat::Mp3));
        assert_eq!(detect_format(&[0xFF, 0xFB, 0x90, 0x64]), Some(AudioFormat::Mp3));
        assert_eq!(detect_format(&[0xFF, 0xF1, 0x50, 0x80]), Some(AudioFormat::Aac));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format(b""), None);
        assert_eq!(detect_format(b"hello world"), None);
        // RIFF 但不是 WAVE
        assert_eq!(detect_format(b"RIFF\0\0\0\0AVI LIST"), None);
    }

    #[test]
    fn test_validate_format_mismatch() {
        let wav = silent_wav(8000, 1);
        assert!(validate_format(&wav, AudioFormat::Wav).is_ok());
        match validate_format(&wav, AudioFormat::Mp3) {
            Err(FormatError::Mismatch { expected, detected }) => {
                assert_eq!(expected, AudioFormat::Mp3);
                assert_eq!(detected, AudioFormat::Wav);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            validate_format(b"garbage", AudioFormat::Wav),
            Err(FormatError::UnknownFormat)
        ));
    }

    #[test]
    fn test_parse_wav_header() {
        let wav = silent_wav(16000, 1);
        let info = parse_wav(&wav).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.data_offset, WAV_HEADER_LEN);
        assert_eq!(info.data_size, 32000);
        assert_eq!(info.duration_ms, 1000);
    }

    #[test]
    fn test_parse_wav_skips_unknown_chunks() {
        let mut wav = silent_wav(8000, 1);
        // 在 fmt 与 data 之间插入一个奇数长度的 LIST chunk
        let mut list = Vec::new();
        list.extend_from_slice(b"LIST");
        list.extend_from_slice(&3u32.to_le_bytes());
        list.extend_from_slice(b"abc\0");
        let insert_at = 36;
        wav.splice(insert_at..insert_at, list);

        let info = parse_wav(&wav).unwrap();
        assert_eq!(info.data_size, 16000);
        assert_eq!(info.duration_ms, 1000);
    }

    #[test]
    fn test_parse_wav_rejects_truncated() {
        assert!(parse_wav(b"RIFF").is_err());
        let mut wav = silent_wav(8000, 1);
        wav[8..12].copy_from_slice(b"WAVX");
        assert!(parse_wav(&wav).is_err());
    }

    #[test]
    fn test_wrap_pcm_rejects_partial_frames() {
        assert!(wrap_pcm_as_wav(&[0u8; 3], 8000, 1, 16).is_err());
        assert!(wrap_pcm_as_wav(&[0u8; 4], 8000, 0, 16).is_err());
        assert!(wrap_pcm_as_wav(&[0u8; 4], 8000, 1, 12).is_err());
    }

    #[test]
    fn test_wrap_pcm_header_fields() {
        let wav = wrap_pcm_as_wav(&[0u8; 8], 22050, 2, 16).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN + 8);
        let info = parse_wav(&wav).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.data_size, 8);
    }

    #[test]
    fn test_wrap_pcm_rejects_overflowing_header() {
        // block align 超出 u16
        assert!(matches!(
            wrap_pcm_as_wav(&[], 48000, 40000, 16),
            Err(FormatError::InvalidWav(_))
        ));
        // byte rate 超出 u32
        assert!(matches!(
            wrap_pcm_as_wav(&[], u32::MAX / 2, 2, 16),
            Err(FormatError::InvalidWav(_))
        ));
        assert!(wrap_i16_samples(&[], u32::MAX / 2, 2).is_err());
        assert!(wrap_i16_samples(&[0i16; 2], 48000, 40000).is_err());
    }
}
