//! 统一错误类型定义.
//!
//! 编码器各模块共用的错误类型. 错误按类别划分:
//! - 校验错误: 初始化阶段发现的配置问题, 修正配置后可重新初始化
//! - 资源错误: 打开实例时内存分配失败
//! - 内部错误: 逻辑缺陷, 实例必须关闭后重新打开
//! - 帧错误: 单帧编码失败, 不影响已提交的持久状态

use thiserror::Error;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 未知原因或来自其它模块
    Unknown,
    /// 初始化参数校验失败
    Validation,
    /// 资源分配失败
    Resource,
    /// 内部一致性错误 (不应发生)
    Internal,
    /// 单帧编码错误
    PerFrame,
}

/// 编码器统一错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AacEncError {
    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),

    /// 句柄无效或实例尚未初始化
    #[error("无效句柄: {0}")]
    InvalidHandle(&'static str),

    /// 帧长必须为 1024 或 960
    #[error("无效帧长: {0}")]
    InvalidFrameLength(u32),

    /// 输入声道数无效
    #[error("无效声道数: {0}")]
    InvalidChannelCount(u32),

    /// 不支持的音频对象类型
    #[error("不支持的音频对象类型: {0}")]
    UnsupportedAot(u32),

    /// 不支持的码率
    #[error("不支持的码率: {0} bps")]
    UnsupportedBitrate(u32),

    /// 不支持的码率模式
    #[error("不支持的码率模式: {0}")]
    UnsupportedBitrateMode(String),

    /// 不支持的辅助数据码率
    #[error("不支持的辅助数据码率: {0}")]
    UnsupportedAncBitrate(u32),

    /// 当前配置不允许携带辅助数据
    #[error("不支持的辅助数据模式: {0}")]
    UnsupportedAncMode(String),

    /// 不支持的传输格式
    #[error("不支持的传输格式: {0}")]
    UnsupportedTransportType(String),

    /// 不支持的错误恢复格式
    #[error("不支持的错误恢复格式: {0}")]
    UnsupportedErFormat(String),

    /// 不支持的错误保护配置
    #[error("不支持的错误保护配置: {0}")]
    UnsupportedEpConfig(i32),

    /// 不支持的声道配置
    #[error("不支持的声道配置: {0}")]
    UnsupportedChannelConfig(String),

    /// 不支持的采样率
    #[error("不支持的采样率: {0} Hz")]
    UnsupportedSampleRate(u32),

    /// 变换引擎参数错误
    #[error("变换参数错误: {0}")]
    InvalidTransform(String),

    /// 输入 PCM 数据不符合配置
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    NoMemory(String),

    /// 缩放因子带表无效
    #[error("缩放因子带表无效")]
    InvalidSfbTable,

    /// 感知熵初始化表缺失
    #[error("比特分配表缺失")]
    PeInitTableNotFound,

    /// 声道元素信息类型无效
    #[error("声道元素信息无效: {0}")]
    InvalidElementInfoType(String),

    /// 量化后比特数超出允许值
    #[error("量化比特数超限: 使用 {used}, 允许 {allowed}")]
    QuantError { used: u32, allowed: u32 },

    /// 实际写出的比特数与计算值不一致
    #[error("写出比特数不一致: 预期 {expected}, 实际 {written}")]
    WrittenBitsError { expected: u32, written: u32 },

    /// 噪声替代能量超出范围
    #[error("PNS 能量超出范围: {0}")]
    PnsTableError(i32),

    /// 全局增益过高
    #[error("全局增益过高: {0}")]
    GlobalGainTooHigh(i32),

    /// 比特储备不足
    #[error("比特储备不足: 储备 {reservoir}, 需要 {needed}")]
    BitresTooLow { reservoir: i32, needed: i32 },

    /// 比特储备溢出
    #[error("比特储备溢出: 储备 {reservoir}, 上限 {limit}")]
    BitresTooHigh { reservoir: i32, limit: i32 },

    /// 声道元素分得的码率无效
    #[error("声道元素码率无效: {0} bits")]
    InvalidChannelBitrate(i32),

    /// 扩展载荷无效
    #[error("扩展载荷无效: {0}")]
    InvalidExtPayload(String),

    /// 写入缩放因子数据失败
    #[error("写入缩放因子数据失败")]
    WriteScalError,

    /// 写入分段数据失败
    #[error("写入分段数据失败")]
    WriteSecError,

    /// 写入频谱数据失败
    #[error("写入频谱数据失败")]
    WriteSpecError,
}

impl AacEncError {
    /// 错误所属类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unknown(_) => ErrorCategory::Unknown,
            Self::InvalidHandle(_)
            | Self::InvalidFrameLength(_)
            | Self::InvalidChannelCount(_)
            | Self::UnsupportedAot(_)
            | Self::UnsupportedBitrate(_)
            | Self::UnsupportedBitrateMode(_)
            | Self::UnsupportedAncBitrate(_)
            | Self::UnsupportedAncMode(_)
            | Self::UnsupportedTransportType(_)
            | Self::UnsupportedErFormat(_)
            | Self::UnsupportedEpConfig(_)
            | Self::UnsupportedChannelConfig(_)
            | Self::UnsupportedSampleRate(_)
            | Self::InvalidTransform(_)
            | Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::NoMemory(_) => ErrorCategory::Resource,
            Self::InvalidSfbTable
            | Self::PeInitTableNotFound
            | Self::InvalidElementInfoType(_) => ErrorCategory::Internal,
            Self::QuantError { .. }
            | Self::WrittenBitsError { .. }
            | Self::PnsTableError(_)
            | Self::GlobalGainTooHigh(_)
            | Self::BitresTooLow { .. }
            | Self::BitresTooHigh { .. }
            | Self::InvalidChannelBitrate(_)
            | Self::InvalidExtPayload(_)
            | Self::WriteScalError
            | Self::WriteSecError
            | Self::WriteSpecError => ErrorCategory::PerFrame,
        }
    }

    /// 是否为致命错误 (实例必须关闭后重新打开)
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Internal
    }
}

/// 编码器统一 Result 类型
pub type AacEncResult<T> = Result<T, AacEncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_错误类别划分() {
        assert_eq!(
            AacEncError::InvalidFrameLength(512).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AacEncError::NoMemory("overlap".into()).category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            AacEncError::BitresTooLow {
                reservoir: 0,
                needed: 8
            }
            .category(),
            ErrorCategory::PerFrame
        );
        assert_eq!(
            AacEncError::Unknown("x".into()).category(),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_仅内部错误为致命() {
        assert!(AacEncError::InvalidSfbTable.is_fatal());
        assert!(AacEncError::InvalidElementInfoType("lfe".into()).is_fatal());
        assert!(!AacEncError::QuantError { used: 10, allowed: 5 }.is_fatal());
        assert!(!AacEncError::UnsupportedSampleRate(1).is_fatal());
    }
}
