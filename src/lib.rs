//! # aacenc
//!
//! 纯 Rust 实现的 AAC 编码器核心.
//!
//! - **变换引擎**: 块浮点定点 MDCT/IMDCT, 正弦与 KBD 窗
//! - **码率控制**: CBR/VBR/固定帧/超帧与比特池
//! - **编码实例**: 打开、初始化、逐帧编码、关闭
//! - **扩展载荷**: 辅助数据与填充元素
//!
//! # 快速开始
//!
//! ```rust
//! use aacenc::codec::{AacEncoder, InitFlags, MemoryTransport, default_config};
//! use aacenc::core::TransportType;
//!
//! let mut transport = MemoryTransport::new(TransportType::Adts);
//! let mut encoder = AacEncoder::open(1, 2, 1).unwrap();
//! encoder
//!     .initialize(&default_config(), &mut transport, InitFlags::all())
//!     .unwrap();
//! let frame = encoder
//!     .encode_frame(&mut transport, &vec![0i16; 2048], &[])
//!     .unwrap();
//! println!("输出 {} 字节", frame.num_out_bytes);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `aacenc-core` | 错误类型、定点工具、比特写入、MDCT 引擎 |
//! | `aacenc-codec` | 配置、码率控制、编码实例与逐帧流程 |
//! | `aacenc-ffi` | C 语言接口 |

pub mod logging;

/// 核心类型与变换引擎
pub use aacenc_core as core;

/// 编码器
pub use aacenc_codec as codec;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
