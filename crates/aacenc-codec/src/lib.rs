//! # aacenc-codec
//!
//! AAC 编码器: 配置校验、码率控制、编码实例生命周期与逐帧编码流程.
//!
//! 典型用法:
//!
//! ```
//! use aacenc_codec::{AacEncoder, InitFlags, MemoryTransport, default_config};
//! use aacenc_core::TransportType;
//!
//! let mut transport = MemoryTransport::new(TransportType::Adts);
//! let mut slot = Some(AacEncoder::open(1, 2, 1).unwrap());
//! if let Some(enc) = slot.as_mut() {
//!     enc.initialize(&default_config(), &mut transport, InitFlags::all())
//!         .unwrap();
//!     let silence = vec![0i16; 2048];
//!     let frame = enc.encode_frame(&mut transport, &silence, &[]).unwrap();
//!     assert!(frame.num_out_bytes > 0);
//! }
//! AacEncoder::close(&mut slot);
//! assert!(slot.is_none());
//! ```

pub mod coder;
pub mod config;
pub mod element;
pub mod encoder;
pub mod payload;
mod pipeline;
pub mod rate;
pub mod transport;

// 重导出常用类型
pub use coder::{ChannelCoder, ChannelSpectrum, CoderContext, UniformCoder};
pub use config::{
    ActiveConfig, AncillaryRate, BitrateMode, EncoderConfig, ToolFlags, default_config, validate,
};
pub use encoder::{AacEncoder, EncodedFrame, EncoderState, InitFlags};
pub use payload::{ExtPayloadType, ExtensionPayload, MAX_TOTAL_EXT_PAYLOADS, WrittenPayload};
pub use rate::{FrameBudget, RateController, vbr_bitrate};
pub use transport::{MemoryTransport, StreamInfo, TransportEncoder};
