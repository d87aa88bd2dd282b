//! 传输层接口.
//!
//! 编码流程只产出原始数据块 (raw data block), 由 [`TransportEncoder`] 负责
//! 加上封装格式的帧头并输出. 帧头的比特数在码率控制中预先扣除.

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;

use aacenc_core::{AacEncError, AacEncResult, AudioObjectType, TransportType};

/// 传输层需要的流参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub audio_object_type: AudioObjectType,
    pub sample_rate_index: u8,
    /// MPEG 声道配置索引
    pub channel_config: u8,
    pub frame_length: u32,
}

/// 传输层编码器
pub trait TransportEncoder {
    /// 封装格式
    fn transport_type(&self) -> TransportType;

    /// 初始化时传入流参数
    fn configure(&mut self, info: &StreamInfo) -> AacEncResult<()>;

    /// 每帧固定的帧头比特数, 必须为 8 的倍数
    fn static_bits(&self) -> u32;

    /// 输出一个访问单元, 返回写出的总字节数 (含帧头)
    ///
    /// `raw_bits` 为原始数据块的有效比特数.
    fn write_access_unit(&mut self, raw: Bytes, raw_bits: usize) -> AacEncResult<usize>;
}

/// ADTS 帧头长度 (无 CRC)
const ADTS_HEADER_BYTES: usize = 7;
/// LOAS 同步头长度
const LOAS_HEADER_BYTES: usize = 3;

/// 把访问单元收集在内存中的传输层
///
/// ADTS 与 LOAS 写出同步帧头, 其余格式直接保存原始数据块.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    transport_type: TransportType,
    info: Option<StreamInfo>,
    units: Vec<Bytes>,
}

impl MemoryTransport {
    pub fn new(transport_type: TransportType) -> Self {
        Self {
            transport_type,
            info: None,
            units: Vec::new(),
        }
    }

    /// 已输出的访问单元
    pub fn units(&self) -> &[Bytes] {
        &self.units
    }

    /// 配置的流参数, 尚未配置时为 `None`
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    /// 取走已输出的访问单元
    pub fn take_units(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.units)
    }

    fn header_bytes(&self) -> usize {
        match self.transport_type {
            TransportType::Adts => ADTS_HEADER_BYTES,
            TransportType::Loas => LOAS_HEADER_BYTES,
            _ => 0,
        }
    }

    /// ADTS 帧头 (protection_absent = 1)
    fn put_adts_header(buf: &mut BytesMut, info: &StreamInfo, frame_bytes: usize) {
        // SBR/PS 的核心按 AAC-LC 标注
        let profile: u8 = match info.audio_object_type {
            AudioObjectType::AacMain => 0,
            AudioObjectType::AacSsr => 2,
            AudioObjectType::AacLtp => 3,
            _ => 1,
        };
        let sr_index = info.sample_rate_index;
        let channel_config = info.channel_config.min(7);
        let len = frame_bytes as u16;
        buf.put_u8(0xFF);
        buf.put_u8(0xF1);
        buf.put_u8((profile << 6) | (sr_index << 2) | (channel_config >> 2));
        buf.put_u8(((channel_config & 0x03) << 6) | ((len >> 11) & 0x03) as u8);
        buf.put_u8(((len >> 3) & 0xFF) as u8);
        buf.put_u8((((len & 0x07) << 5) | 0x1F) as u8);
        buf.put_u8(0xFC);
    }
}

impl TransportEncoder for MemoryTransport {
    fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    fn configure(&mut self, info: &StreamInfo) -> AacEncResult<()> {
        if !self.transport_type.is_supported() {
            return Err(AacEncError::UnsupportedTransportType(
                self.transport_type.to_string(),
            ));
        }
        self.info = Some(*info);
        Ok(())
    }

    fn static_bits(&self) -> u32 {
        self.header_bytes() as u32 * 8
    }

    fn write_access_unit(&mut self, raw: Bytes, raw_bits: usize) -> AacEncResult<usize> {
        let info = self
            .info
            .ok_or(AacEncError::InvalidHandle("传输层尚未配置"))?;
        let raw_bytes = raw_bits.div_ceil(8);
        if raw_bytes > raw.len() {
            return Err(AacEncError::WrittenBitsError {
                expected: raw_bits as u32,
                written: raw.len() as u32 * 8,
            });
        }
        let total = self.header_bytes() + raw_bytes;
        let unit = match self.transport_type {
            TransportType::Adts => {
                let mut buf = BytesMut::with_capacity(total);
                Self::put_adts_header(&mut buf, &info, total);
                buf.put_slice(&raw[..raw_bytes]);
                buf.freeze()
            }
            TransportType::Loas => {
                // 11 bit 同步字 0x2B7 + 13 bit 负载长度
                let mut buf = BytesMut::with_capacity(total);
                let len = raw_bytes as u32 & 0x1FFF;
                buf.put_u8(0x56);
                buf.put_u8(0xE0 | (len >> 8) as u8);
                buf.put_u8(len as u8);
                buf.put_slice(&raw[..raw_bytes]);
                buf.freeze()
            }
            _ => raw.slice(..raw_bytes),
        };
        trace!(
            "{}: 输出访问单元 {} 字节",
            self.transport_type,
            unit.len()
        );
        self.units.push(unit);
        Ok(total)
    }
}
