//! 编码器配置与初始化校验.
//!
//! [`EncoderConfig`] 是调用方提供的原始配置, [`ActiveConfig`] 是校验通过后
//! 解析出的生效配置 (码率、比特上下限、带宽等均已确定). 校验只读取常量表,
//! 不修改任何实例状态.

use bitflags::bitflags;
use log::debug;

use aacenc_core::{
    AacEncError, AacEncResult, AudioObjectType, ChannelMode, ChannelOrder, ElementInfo,
    TransportType,
};

use crate::element::{END_AND_ALIGN_BITS, min_distributable_bits};
use crate::rate::vbr_bitrate;

/// 采样率索引对应的采样率 (Hz)
pub const SAMPLE_RATE_TABLE: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// 每声道每帧的最大比特数
pub const MAX_BITS_PER_CHANNEL: u32 = 6144;
/// 每个有效声道的最低码率
pub const MIN_BITRATE_PER_CHANNEL: u32 = 8000;
/// 每个访问单元最多携带的辅助数据字节数
pub const MAX_ANC_BYTES_PER_AU: usize = 1024;
/// 编码实例支持的最大声道数
pub const MAX_CHANNELS: u32 = 8;
/// 固定帧模式下的比特储备 (仅保存不足一字节的余数)
pub const FIXED_FRAME_RESERVOIR: u32 = 7;
/// SBR 每个有效声道预留的边信息码率
pub const SBR_SIDE_RATE_PER_CHANNEL: u32 = 2000;
/// PS 在 SBR 之外额外预留的码率
pub const PS_SIDE_RATE: u32 = 1000;

/// 码率模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitrateMode {
    /// 恒定码率
    #[default]
    Cbr,
    /// 可变码率, 约 32 kbps/声道
    Vbr1,
    /// 可变码率, 约 40 kbps/声道
    Vbr2,
    /// 可变码率, 约 48-56 kbps/声道
    Vbr3,
    /// 可变码率, 约 64 kbps/声道
    Vbr4,
    /// 可变码率, 约 80-96 kbps/声道
    Vbr5,
    /// 固定帧长
    FixedFrame,
    /// 超帧: 多个子帧合计满足码率
    SuperFrame,
}

impl BitrateMode {
    /// 从数值模式构造 (0 = CBR, 1-5 = VBR, 6 = 固定帧, 7 = 超帧)
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Cbr,
            1 => Self::Vbr1,
            2 => Self::Vbr2,
            3 => Self::Vbr3,
            4 => Self::Vbr4,
            5 => Self::Vbr5,
            6 => Self::FixedFrame,
            7 => Self::SuperFrame,
            _ => return None,
        })
    }

    /// VBR 档位 (1-5), 非 VBR 模式返回 `None`
    pub const fn vbr_tier(self) -> Option<u8> {
        match self {
            Self::Vbr1 => Some(1),
            Self::Vbr2 => Some(2),
            Self::Vbr3 => Some(3),
            Self::Vbr4 => Some(4),
            Self::Vbr5 => Some(5),
            _ => None,
        }
    }

    /// 是否为 VBR 模式
    pub const fn is_vbr(self) -> bool {
        self.vbr_tier().is_some()
    }
}

/// 辅助数据码率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AncillaryRate {
    /// 不携带辅助数据
    #[default]
    Disabled,
    /// 不预留码率, 每个访问单元最多 1024 字节
    Default,
    /// 预留指定码率 (bps)
    Rate(u32),
}

bitflags! {
    /// 编码工具开关
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ToolFlags: u32 {
        /// 时域噪声整形
        const TNS       = 1 << 0;
        /// 感知噪声替代
        const PNS       = 1 << 1;
        /// 强度立体声
        const INTENSITY = 1 << 2;
        /// 量化后细化
        const REQUANT   = 1 << 3;
    }
}

/// 编码器配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EncoderConfig {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 目标码率 (bps), VBR 模式下忽略
    pub bit_rate: u32,
    /// 码率模式
    pub bitrate_mode: BitrateMode,
    /// 输入声道数
    pub n_channels: u32,
    /// 输入声道排列
    pub channel_order: ChannelOrder,
    /// 声道模式
    pub channel_mode: ChannelMode,
    /// 每声道帧长, 1024 或 960
    pub frame_length: u32,
    /// 音频对象类型
    pub audio_object_type: AudioObjectType,
    /// 编码工具
    pub tools: ToolFlags,
    /// 错误保护配置, 只允许 `None` 或 `Some(0)`
    pub ep_config: Option<i32>,
    /// 辅助数据码率
    pub anc_rate: AncillaryRate,
    /// 每帧最少比特数
    pub min_bits_per_frame: Option<u32>,
    /// 每帧最多比特数
    pub max_bits_per_frame: Option<u32>,
    /// 比特储备大小
    pub bit_reservoir: Option<u32>,
    /// 每个超帧的子帧数, 非超帧模式为 1
    pub n_sub_frames: u32,
    /// 音频带宽 (Hz), `None` 为按码率自动选择
    pub band_width: Option<u32>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        default_config()
    }
}

/// 默认配置: 48 kHz 立体声 AAC-LC, CBR 128 kbps, 帧长 1024, 不启用编码工具
pub fn default_config() -> EncoderConfig {
    EncoderConfig {
        sample_rate: 48000,
        bit_rate: 128000,
        bitrate_mode: BitrateMode::Cbr,
        n_channels: 2,
        channel_order: ChannelOrder::Mpeg,
        channel_mode: ChannelMode::Mode2,
        frame_length: 1024,
        audio_object_type: AudioObjectType::AacLc,
        tools: ToolFlags::empty(),
        ep_config: None,
        anc_rate: AncillaryRate::Disabled,
        min_bits_per_frame: None,
        max_bits_per_frame: None,
        bit_reservoir: None,
        n_sub_frames: 1,
        band_width: None,
    }
}

/// 采样率索引
pub fn sample_rate_index(sample_rate: u32) -> Option<u8> {
    SAMPLE_RATE_TABLE
        .iter()
        .position(|&sr| sr == sample_rate)
        .map(|i| i as u8)
}

/// 按每声道码率选择音频带宽 (Hz)
fn auto_bandwidth(bitrate_per_channel: u32) -> u32 {
    const TABLE: [(u32, u32); 7] = [
        (16000, 5000),
        (24000, 8000),
        (32000, 11000),
        (48000, 14000),
        (64000, 16000),
        (96000, 17000),
        (u32::MAX, 20000),
    ];
    TABLE
        .iter()
        .find(|&&(limit, _)| bitrate_per_channel < limit)
        .map_or(20000, |&(_, bw)| bw)
}

/// 校验通过后的生效配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    /// 原始配置
    pub config: EncoderConfig,
    /// 传输格式
    pub transport: TransportType,
    /// 采样率索引
    pub sample_rate_index: u8,
    /// 声道元素
    pub elements: Vec<ElementInfo>,
    /// 有效声道数 (不计 LFE)
    pub n_channels_eff: u32,
    /// 生效码率 (VBR 已换算)
    pub bit_rate: u32,
    /// 每帧最少比特数
    pub min_bits: u32,
    /// 每帧最多比特数
    pub max_bits: u32,
    /// 比特储备大小
    pub reservoir_size: u32,
    /// 音频带宽 (Hz)
    pub band_width: u32,
    /// 带宽对应的谱线数
    pub bandwidth_lines: usize,
    /// 每个访问单元的辅助数据字节上限
    pub max_anc_bytes_per_au: usize,
    /// 为辅助数据预留的码率
    pub anc_data_bit_rate: u32,
    /// 为 SBR/PS 边信息预留的码率
    pub sbr_data_bit_rate: u32,
}

impl ActiveConfig {
    /// 帧长 (每声道样本数)
    pub fn frame_length(&self) -> usize {
        self.config.frame_length as usize
    }

    /// 输入声道数
    pub fn n_channels(&self) -> usize {
        self.config.n_channels as usize
    }

    /// 长期平均的每帧比特数 (向下取整)
    pub fn average_bits(&self) -> u32 {
        (self.bit_rate as u64 * self.config.frame_length as u64 / self.config.sample_rate as u64)
            as u32
    }

    /// 每帧为辅助数据与 SBR 边信息预留的比特数 (向上取整)
    pub fn side_data_bits(&self) -> u32 {
        let rate = (self.anc_data_bit_rate + self.sbr_data_bit_rate) as u64;
        (rate * self.config.frame_length as u64).div_ceil(self.config.sample_rate as u64) as u32
    }

    /// 检查最低码率下的一帧能否容纳传输层帧头与全部声道元素
    ///
    /// 平均比特数向下对齐到字节后, 必须放得下帧头、预留的边信息、结束元素
    /// 与每个声道元素的最小需求.
    pub fn check_frame_capacity(&self, static_bits: u32) -> AacEncResult<()> {
        let available = self.average_bits() & !7;
        let needed = static_bits
            + self.side_data_bits()
            + END_AND_ALIGN_BITS
            + min_distributable_bits(&self.elements);
        if available < needed {
            debug!(
                "码率 {} bps 每帧只有 {} bits, 至少需要 {} bits (帧头 {})",
                self.bit_rate, available, needed, static_bits
            );
            return Err(AacEncError::UnsupportedBitrate(self.bit_rate));
        }
        Ok(())
    }
}

/// 校验配置并解析生效参数
///
/// 任一字段不受支持时返回对应的 "不支持" 错误.
pub fn validate(config: &EncoderConfig, transport: TransportType) -> AacEncResult<ActiveConfig> {
    if config.frame_length != 1024 && config.frame_length != 960 {
        return Err(AacEncError::InvalidFrameLength(config.frame_length));
    }
    if config.n_channels == 0 || config.n_channels > MAX_CHANNELS {
        return Err(AacEncError::InvalidChannelCount(config.n_channels));
    }
    let sample_rate_index = sample_rate_index(config.sample_rate)
        .ok_or(AacEncError::UnsupportedSampleRate(config.sample_rate))?;

    let aot = config.audio_object_type;
    if !aot.is_supported() {
        return Err(AacEncError::UnsupportedAot(aot.as_u32()));
    }

    let mode = config.channel_mode;
    if mode.channels() != config.n_channels {
        return Err(AacEncError::UnsupportedChannelConfig(format!(
            "声道模式 {} 需要 {} 个声道, 实际 {}",
            mode,
            mode.channels(),
            config.n_channels
        )));
    }
    if aot == AudioObjectType::Ps && mode != ChannelMode::Mode1 {
        return Err(AacEncError::UnsupportedChannelConfig(format!(
            "{} 只支持单声道核心, 实际声道模式 {}",
            aot, mode
        )));
    }

    if !transport.is_supported() {
        return Err(AacEncError::UnsupportedTransportType(transport.to_string()));
    }
    if aot.is_error_resilient() && transport == TransportType::Adts {
        return Err(AacEncError::UnsupportedErFormat(format!(
            "{} 不能使用 {} 封装",
            aot, transport
        )));
    }
    match config.ep_config {
        None => {}
        Some(0) if aot.is_error_resilient() => {}
        Some(ep) => return Err(AacEncError::UnsupportedEpConfig(ep)),
    }

    let bitrate_mode = config.bitrate_mode;
    match (bitrate_mode, config.n_sub_frames) {
        (BitrateMode::SuperFrame, n) if n >= 2 => {}
        (BitrateMode::SuperFrame, n) => {
            return Err(AacEncError::UnsupportedBitrateMode(format!(
                "超帧模式至少需要 2 个子帧, 实际 {}",
                n
            )));
        }
        (_, 1) => {}
        (m, n) => {
            return Err(AacEncError::UnsupportedBitrateMode(format!(
                "{:?} 模式只允许 1 个子帧, 实际 {}",
                m, n
            )));
        }
    }

    let n_channels_eff = mode.effective_channels();
    let sr = config.sample_rate as u64;
    let frame_len = config.frame_length as u64;
    let max_frame_bits = MAX_BITS_PER_CHANNEL * config.n_channels;
    let max_bitrate = (max_frame_bits as u64 * sr / frame_len) as u32;
    let min_bitrate = MIN_BITRATE_PER_CHANNEL * n_channels_eff;

    let bit_rate = match vbr_bitrate(bitrate_mode, mode) {
        Some(vbr) => vbr.clamp(min_bitrate, max_bitrate),
        None => config.bit_rate,
    };
    if bit_rate < min_bitrate || bit_rate > max_bitrate {
        return Err(AacEncError::UnsupportedBitrate(bit_rate));
    }

    let sbr_data_bit_rate = match aot {
        AudioObjectType::Ps => SBR_SIDE_RATE_PER_CHANNEL * n_channels_eff + PS_SIDE_RATE,
        _ if aot.has_sbr() => SBR_SIDE_RATE_PER_CHANNEL * n_channels_eff,
        _ => 0,
    };

    let (max_anc_bytes_per_au, anc_data_bit_rate) = match config.anc_rate {
        AncillaryRate::Disabled => (0, 0),
        _ if aot.is_error_resilient() => {
            return Err(AacEncError::UnsupportedAncMode(format!(
                "{} 不支持辅助数据",
                aot
            )));
        }
        AncillaryRate::Default => (MAX_ANC_BYTES_PER_AU, 0),
        AncillaryRate::Rate(r) if r == 0 || r.saturating_add(sbr_data_bit_rate) > bit_rate / 2 => {
            return Err(AacEncError::UnsupportedAncBitrate(r));
        }
        AncillaryRate::Rate(r) => {
            let bytes = (r as u64 * frame_len).div_ceil(8 * sr) as usize;
            (bytes.min(MAX_ANC_BYTES_PER_AU), r)
        }
    };

    // 比特上下限
    let avg_floor = (bit_rate as u64 * frame_len / sr) as u32;
    let avg_ceil = (bit_rate as u64 * frame_len).div_ceil(sr) as u32;
    let max_bits = config.max_bits_per_frame.unwrap_or(max_frame_bits);
    let min_bits = config.min_bits_per_frame.unwrap_or(0);
    if max_bits > max_frame_bits || min_bits > avg_floor || avg_ceil > max_bits {
        return Err(AacEncError::UnsupportedBitrate(bit_rate));
    }
    let reservoir_size = match bitrate_mode {
        BitrateMode::FixedFrame => FIXED_FRAME_RESERVOIR,
        _ => {
            let limit = max_bits - avg_ceil;
            config.bit_reservoir.unwrap_or(limit).min(limit)
        }
    };

    let nyquist = config.sample_rate / 2;
    let band_width = config
        .band_width
        .unwrap_or_else(|| auto_bandwidth(bit_rate / n_channels_eff))
        .min(nyquist);
    let bandwidth_lines =
        ((band_width as u64 * 2 * frame_len / sr) as usize).min(frame_len as usize);

    let active = ActiveConfig {
        config: config.clone(),
        transport,
        sample_rate_index,
        elements: mode.elements(),
        n_channels_eff,
        bit_rate,
        min_bits,
        max_bits,
        reservoir_size,
        band_width,
        bandwidth_lines,
        max_anc_bytes_per_au,
        anc_data_bit_rate,
        sbr_data_bit_rate,
    };
    debug!(
        "配置校验通过: {} Hz, {} bps ({:?}), 声道模式 {}, 帧长 {}, 储备 {} bits, 带宽 {} Hz",
        config.sample_rate,
        bit_rate,
        bitrate_mode,
        mode,
        config.frame_length,
        reservoir_size,
        band_width
    );
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_默认配置有效() {
        let active = validate(&default_config(), TransportType::Raw).unwrap();
        assert_eq!(active.bit_rate, 128000);
        assert_eq!(active.average_bits(), 2730);
        assert_eq!(active.max_bits, 12288);
        assert_eq!(active.reservoir_size, 12288 - 2731);
        assert_eq!(active.elements.len(), 1);
        assert_eq!(active.sample_rate_index, 3);
        assert!(active.bandwidth_lines > 0 && active.bandwidth_lines <= 1024);
    }

    #[test]
    fn test_帧长校验() {
        for len in [0, 512, 1000, 2048] {
            let cfg = EncoderConfig {
                frame_length: len,
                ..default_config()
            };
            assert_eq!(
                validate(&cfg, TransportType::Raw),
                Err(AacEncError::InvalidFrameLength(len))
            );
        }
        let cfg = EncoderConfig {
            frame_length: 960,
            ..default_config()
        };
        assert!(validate(&cfg, TransportType::Adts).is_ok());
    }

    #[test]
    fn test_不支持的字段() {
        let base = default_config();
        let cases: Vec<(EncoderConfig, TransportType, AacEncError)> = vec![
            (
                EncoderConfig {
                    sample_rate: 44000,
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::UnsupportedSampleRate(44000),
            ),
            (
                EncoderConfig {
                    audio_object_type: AudioObjectType::AacLd,
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::UnsupportedAot(23),
            ),
            (
                EncoderConfig {
                    n_channels: 9,
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::InvalidChannelCount(9),
            ),
            (
                EncoderConfig {
                    ep_config: Some(0),
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::UnsupportedEpConfig(0),
            ),
            (
                EncoderConfig {
                    bit_rate: 4000,
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::UnsupportedBitrate(4000),
            ),
            (
                EncoderConfig {
                    anc_rate: AncillaryRate::Rate(100000),
                    ..base.clone()
                },
                TransportType::Raw,
                AacEncError::UnsupportedAncBitrate(100000),
            ),
        ];
        for (cfg, tt, err) in cases {
            assert_eq!(validate(&cfg, tt), Err(err));
        }

        assert!(matches!(
            validate(&base, TransportType::Adif),
            Err(AacEncError::UnsupportedTransportType(_))
        ));
        let er = EncoderConfig {
            audio_object_type: AudioObjectType::ErAacLc,
            ..base.clone()
        };
        assert!(matches!(
            validate(&er, TransportType::Adts),
            Err(AacEncError::UnsupportedErFormat(_))
        ));
        let er_anc = EncoderConfig {
            anc_rate: AncillaryRate::Default,
            ..er.clone()
        };
        assert!(matches!(
            validate(&er_anc, TransportType::LatmMcp1),
            Err(AacEncError::UnsupportedAncMode(_))
        ));
        let er_ep = EncoderConfig {
            ep_config: Some(0),
            ..er
        };
        assert!(validate(&er_ep, TransportType::Loas).is_ok());
    }

    #[test]
    fn test_声道配置() {
        let cfg = EncoderConfig {
            n_channels: 2,
            channel_mode: ChannelMode::Mode1,
            ..default_config()
        };
        assert!(matches!(
            validate(&cfg, TransportType::Raw),
            Err(AacEncError::UnsupportedChannelConfig(_))
        ));
        let ps = EncoderConfig {
            audio_object_type: AudioObjectType::Ps,
            bit_rate: 32000,
            ..default_config()
        };
        assert!(matches!(
            validate(&ps, TransportType::Raw),
            Err(AacEncError::UnsupportedChannelConfig(_))
        ));
        let ps_mono = EncoderConfig {
            n_channels: 1,
            channel_mode: ChannelMode::Mode1,
            ..ps
        };
        assert!(validate(&ps_mono, TransportType::Raw).is_ok());
    }

    #[test]
    fn test_超帧子帧数() {
        let sfr = EncoderConfig {
            bitrate_mode: BitrateMode::SuperFrame,
            ..default_config()
        };
        assert!(matches!(
            validate(&sfr, TransportType::Raw),
            Err(AacEncError::UnsupportedBitrateMode(_))
        ));
        let sfr = EncoderConfig {
            n_sub_frames: 4,
            ..sfr
        };
        assert!(validate(&sfr, TransportType::Raw).is_ok());
        let cbr = EncoderConfig {
            n_sub_frames: 2,
            ..default_config()
        };
        assert!(validate(&cbr, TransportType::Raw).is_err());
    }

    #[test]
    fn test_比特上下限() {
        let cfg = EncoderConfig {
            min_bits_per_frame: Some(4000),
            ..default_config()
        };
        assert!(validate(&cfg, TransportType::Raw).is_err());
        let cfg = EncoderConfig {
            max_bits_per_frame: Some(2000),
            ..default_config()
        };
        assert!(validate(&cfg, TransportType::Raw).is_err());
        let cfg = EncoderConfig {
            bit_reservoir: Some(1_000_000),
            ..default_config()
        };
        let active = validate(&cfg, TransportType::Raw).unwrap();
        assert_eq!(active.reservoir_size, 12288 - 2731);
        let ff = EncoderConfig {
            bitrate_mode: BitrateMode::FixedFrame,
            ..default_config()
        };
        assert_eq!(validate(&ff, TransportType::Raw).unwrap().reservoir_size, 7);
    }

    #[test]
    fn test_vbr_码率换算() {
        let cfg = EncoderConfig {
            bitrate_mode: BitrateMode::Vbr3,
            bit_rate: 0,
            ..default_config()
        };
        let active = validate(&cfg, TransportType::Raw).unwrap();
        assert_eq!(active.bit_rate, 96000);
    }

    #[test]
    fn test_带宽() {
        let cfg = EncoderConfig {
            band_width: Some(30000),
            sample_rate: 32000,
            bit_rate: 96000,
            ..default_config()
        };
        let active = validate(&cfg, TransportType::Raw).unwrap();
        assert_eq!(active.band_width, 16000);
        assert_eq!(active.bandwidth_lines, 1024);

        let active = validate(&default_config(), TransportType::Raw).unwrap();
        assert_eq!(active.band_width, 17000);
    }

    #[test]
    fn test_辅助数据字节上限() {
        let cfg = EncoderConfig {
            anc_rate: AncillaryRate::Rate(8000),
            ..default_config()
        };
        let active = validate(&cfg, TransportType::Raw).unwrap();
        // 8000 * 1024 / (8 * 48000) = 21.33 -> 22
        assert_eq!(active.max_anc_bytes_per_au, 22);
        assert_eq!(active.anc_data_bit_rate, 8000);
    }

    #[test]
    fn test_边信息预留() {
        let sbr = EncoderConfig {
            audio_object_type: AudioObjectType::Sbr,
            bit_rate: 64000,
            ..default_config()
        };
        let active = validate(&sbr, TransportType::Loas).unwrap();
        assert_eq!(active.sbr_data_bit_rate, 4000);
        // 4000 * 1024 / 48000 = 85.33 -> 86
        assert_eq!(active.side_data_bits(), 86);

        let ps = EncoderConfig {
            audio_object_type: AudioObjectType::Ps,
            n_channels: 1,
            channel_mode: ChannelMode::Mode1,
            bit_rate: 32000,
            ..default_config()
        };
        assert_eq!(validate(&ps, TransportType::Loas).unwrap().sbr_data_bit_rate, 3000);

        let anc = EncoderConfig {
            anc_rate: AncillaryRate::Rate(8000),
            ..default_config()
        };
        let active = validate(&anc, TransportType::Raw).unwrap();
        assert_eq!(active.sbr_data_bit_rate, 0);
        assert_eq!(active.side_data_bits(), 171);
        assert_eq!(validate(&default_config(), TransportType::Raw).unwrap().side_data_bits(), 0);

        // 辅助数据与 SBR 合计不能超过码率的一半
        let crowded = EncoderConfig {
            anc_rate: AncillaryRate::Rate(30000),
            ..sbr
        };
        assert_eq!(
            validate(&crowded, TransportType::Loas),
            Err(AacEncError::UnsupportedAncBitrate(30000))
        );
    }

    #[test]
    fn test_最小帧容量() {
        let cfg = EncoderConfig {
            sample_rate: 96000,
            bit_rate: 8000,
            n_channels: 1,
            channel_mode: ChannelMode::Mode1,
            ..default_config()
        };
        // 8000 * 1024 / 96000 = 85 -> 80 bits, ADTS 帧头 56 bits
        let active = validate(&cfg, TransportType::Adts).unwrap();
        assert_eq!(active.average_bits(), 85);
        assert_eq!(active.check_frame_capacity(56), Err(AacEncError::UnsupportedBitrate(8000)));
        // 无帧头时 80 >= 10 + 28
        assert!(active.check_frame_capacity(0).is_ok());

        let sbr = EncoderConfig {
            audio_object_type: AudioObjectType::Sbr,
            sample_rate: 96000,
            bit_rate: 16000,
            ..cfg
        };
        // 170 -> 168 bits, SBR 预留 22 bits
        let active = validate(&sbr, TransportType::Loas).unwrap();
        assert_eq!(active.side_data_bits(), 22);
        assert!(active.check_frame_capacity(0).is_ok());
        assert!(active.check_frame_capacity(112).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_往返() {
        let cfg = EncoderConfig {
            tools: ToolFlags::TNS | ToolFlags::PNS,
            anc_rate: AncillaryRate::Rate(4000),
            ..default_config()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EncoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
        let partial: EncoderConfig = serde_json::from_str(r#"{"bit_rate": 64000}"#).unwrap();
        assert_eq!(partial.bit_rate, 64000);
        assert_eq!(partial.frame_length, 1024);
    }
}
