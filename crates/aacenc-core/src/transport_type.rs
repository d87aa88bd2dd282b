//! 传输封装类型.

use std::fmt;

/// 比特流封装格式
///
/// 具体的封装语法由外部传输模块实现, 编码核心只负责校验组合是否合法.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportType {
    /// 裸访问单元
    #[default]
    Raw,
    /// ADIF 文件头 (不支持)
    Adif,
    /// ADTS 帧头
    Adts,
    /// LATM, muxConfigPresent = 1
    LatmMcp1,
    /// LATM, muxConfigPresent = 0
    LatmMcp0,
    /// LOAS/LATM 同步流
    Loas,
}

impl TransportType {
    /// 是否支持
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Adif)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Adif => "adif",
            Self::Adts => "adts",
            Self::LatmMcp1 => "latm-mcp1",
            Self::LatmMcp0 => "latm-mcp0",
            Self::Loas => "loas",
        };
        write!(f, "{name}")
    }
}
