//! # aacenc-core
//!
//! AAC 编码器核心库: 错误类型、块浮点定点运算、比特写入以及 MDCT 变换引擎.
//!
//! 本 crate 不依赖任何编码器实例状态, 变换引擎的每个声道状态由调用方持有.

pub mod bitwriter;
pub mod channel_mode;
pub mod error;
pub mod fixed;
pub mod mdct;
pub mod object_type;
pub mod transport_type;

// 重导出常用类型
pub use bitwriter::BitWriter;
pub use channel_mode::{ChannelMode, ChannelOrder, ElementInfo, ElementType};
pub use error::{AacEncError, AacEncResult, ErrorCategory};
pub use fixed::BlockFloat;
pub use mdct::{MdctOutput, MdctState, WindowShape, WindowSlope};
pub use object_type::AudioObjectType;
pub use transport_type::TransportType;
