//! VBR 档位到目标码率的映射

use aacenc_core::ChannelMode;

use crate::config::BitrateMode;

/// 每档每声道码率: (单声道, 多声道时每个有效声道)
const VBR_RATE_TABLE: [(u32, u32); 5] = [
    (32000, 20000),
    (40000, 32000),
    (56000, 48000),
    (72000, 64000),
    (112000, 96000),
];

/// VBR 档位对应的近似目标码率 (bps)
///
/// 非 VBR 模式返回 `None`. 结果未按采样率限制上限, 由配置校验截断.
pub fn vbr_bitrate(mode: BitrateMode, channel_mode: ChannelMode) -> Option<u32> {
    let tier = mode.vbr_tier()?;
    let (mono, per_channel) = VBR_RATE_TABLE[tier as usize - 1];
    Some(match channel_mode {
        ChannelMode::Mode1 => mono,
        _ => per_channel * channel_mode.effective_channels(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VBR_MODES: [BitrateMode; 5] = [
        BitrateMode::Vbr1,
        BitrateMode::Vbr2,
        BitrateMode::Vbr3,
        BitrateMode::Vbr4,
        BitrateMode::Vbr5,
    ];

    #[test]
    fn test_非vbr模式() {
        for mode in [
            BitrateMode::Cbr,
            BitrateMode::FixedFrame,
            BitrateMode::SuperFrame,
        ] {
            assert_eq!(vbr_bitrate(mode, ChannelMode::Mode2), None);
        }
    }

    #[test]
    fn test_档位单调() {
        for cm in ChannelMode::ALL {
            let rates: Vec<u32> = VBR_MODES
                .iter()
                .map(|&m| vbr_bitrate(m, cm).unwrap())
                .collect();
            assert!(rates.windows(2).all(|w| w[0] <= w[1]), "{cm}: {rates:?}");
        }
    }

    #[test]
    fn test_声道数换算() {
        assert_eq!(vbr_bitrate(BitrateMode::Vbr1, ChannelMode::Mode1), Some(32000));
        assert_eq!(vbr_bitrate(BitrateMode::Vbr1, ChannelMode::Mode2), Some(40000));
        // 5.1: 5 个有效声道
        assert_eq!(
            vbr_bitrate(BitrateMode::Vbr5, ChannelMode::Mode1_2_2_1),
            Some(480000)
        );
    }
}
