//! MPEG-4 音频对象类型 (AOT).

use std::fmt;

/// 音频对象类型
///
/// 判别值即 MPEG-4 音频对象类型编号.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioObjectType {
    /// AAC Main
    AacMain = 1,
    /// AAC 低复杂度
    AacLc = 2,
    /// AAC 可伸缩采样率
    AacSsr = 3,
    /// AAC 长时预测
    AacLtp = 4,
    /// 频带复制 (HE-AAC), 核心编码为 AAC-LC
    Sbr = 5,
    /// 抗误码 AAC-LC
    ErAacLc = 17,
    /// 低延迟 AAC
    AacLd = 23,
    /// 参数立体声 (HE-AAC v2), 核心编码为单声道 AAC-LC
    Ps = 29,
    /// 增强低延迟 AAC
    AacEld = 39,
}

impl AudioObjectType {
    /// 从 AOT 编号构造
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::AacMain,
            2 => Self::AacLc,
            3 => Self::AacSsr,
            4 => Self::AacLtp,
            5 => Self::Sbr,
            17 => Self::ErAacLc,
            23 => Self::AacLd,
            29 => Self::Ps,
            39 => Self::AacEld,
            _ => return None,
        })
    }

    /// AOT 编号
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// 是否为抗误码 (ER) 类型
    pub const fn is_error_resilient(self) -> bool {
        matches!(self, Self::ErAacLc | Self::AacLd | Self::AacEld)
    }

    /// 是否携带 SBR 扩展 (需要为其预留旁路码率)
    pub const fn has_sbr(self) -> bool {
        matches!(self, Self::Sbr | Self::Ps)
    }

    /// 本编码核心是否支持
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::AacLc | Self::Sbr | Self::Ps | Self::ErAacLc)
    }
}

impl fmt::Display for AudioObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AacMain => "aac-main",
            Self::AacLc => "aac-lc",
            Self::AacSsr => "aac-ssr",
            Self::AacLtp => "aac-ltp",
            Self::Sbr => "he-aac",
            Self::ErAacLc => "er-aac-lc",
            Self::AacLd => "aac-ld",
            Self::Ps => "he-aac-v2",
            Self::AacEld => "aac-eld",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_编号往返() {
        for v in [1, 2, 3, 4, 5, 17, 23, 29, 39] {
            let aot = AudioObjectType::from_u32(v).unwrap();
            assert_eq!(aot.as_u32(), v);
        }
        assert_eq!(AudioObjectType::from_u32(0), None);
        assert_eq!(AudioObjectType::from_u32(42), None);
    }

    #[test]
    fn test_支持集合() {
        assert!(AudioObjectType::AacLc.is_supported());
        assert!(AudioObjectType::ErAacLc.is_error_resilient());
        assert!(!AudioObjectType::AacMain.is_supported());
        assert!(!AudioObjectType::AacEld.is_supported());
        assert!(AudioObjectType::Ps.has_sbr());
    }
}
