//! 扩展载荷.
//!
//! 调用方提供的附加数据按类型写成数据流元素 (DSE) 或填充元素 (FIL), 紧跟在
//! 所属声道元素之后. 编码流程另外生成填充载荷, 使一帧达到最少比特数.

use log::warn;

use aacenc_core::{AacEncError, AacEncResult, BitWriter};

use crate::element::{ID_BITS, INSTANCE_TAG_BITS, SyntaxElementId};

/// 最大声道元素数
pub const MAX_CHANNEL_ELEMENTS: usize = 6;
/// 每帧最多的扩展载荷数
pub const MAX_TOTAL_EXT_PAYLOADS: usize = MAX_CHANNEL_ELEMENTS + 4;

/// 单个数据流元素最多携带的字节数
const MAX_DSE_BYTES: usize = 255 + 255;
/// 单个填充元素最多携带的字节数
const MAX_FIL_BYTES: usize = 14 + 255;
/// 单个填充元素的最大总比特数
const MAX_FIL_ELEMENT_BITS: u32 = ID_BITS + 4 + 8 * (MAX_FIL_BYTES as u32 + 1);
/// 填充载荷的字节内容
const FILL_BYTE: u8 = 0xA5;

/// 扩展载荷类型, 数值即填充元素中的 4 bit 扩展类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ExtPayloadType {
    /// 填充
    Fill = 0,
    /// 填充数据
    FillData = 1,
    /// 辅助数据, 写成数据流元素
    DataElement = 2,
    /// 动态范围控制
    DynamicRange = 11,
    /// 空间音频数据
    SacData = 12,
    /// SBR 数据
    SbrData = 13,
    /// 带 CRC 的 SBR 数据
    SbrDataCrc = 14,
}

impl ExtPayloadType {
    /// 从 4 bit 扩展类型构造
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Fill,
            1 => Self::FillData,
            2 => Self::DataElement,
            11 => Self::DynamicRange,
            12 => Self::SacData,
            13 => Self::SbrData,
            14 => Self::SbrDataCrc,
            _ => return None,
        })
    }

    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// 调用方提供的扩展载荷, 只在一次编码调用内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionPayload<'a> {
    /// 载荷数据
    pub data: &'a [u8],
    /// 有效比特数
    pub data_bits: usize,
    /// 载荷类型
    pub payload_type: ExtPayloadType,
    /// 所属声道元素的序号
    pub associated_ch_element: usize,
}

impl<'a> ExtensionPayload<'a> {
    /// 以整字节数据构造
    pub fn new(payload_type: ExtPayloadType, data: &'a [u8], associated_ch_element: usize) -> Self {
        Self {
            data,
            data_bits: data.len() * 8,
            payload_type,
            associated_ch_element,
        }
    }
}

/// 已写入码流的扩展载荷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenPayload {
    pub payload_type: ExtPayloadType,
    pub data_bits: usize,
    pub associated_ch_element: usize,
}

/// 校验后的载荷: 辅助数据可能已被截断
#[derive(Debug, Clone, Copy)]
pub(crate) struct PreparedPayload<'a> {
    pub payload: ExtensionPayload<'a>,
    /// 实际写出的数据比特数
    pub data_bits: usize,
}

impl PreparedPayload<'_> {
    /// 写入码流所需的总比特数
    pub fn bits(&self) -> u32 {
        match self.payload.payload_type {
            ExtPayloadType::DataElement => dse_bits(self.data_bits.div_ceil(8)),
            _ => fil_element_bits((4 + self.data_bits).div_ceil(8)),
        }
    }

    /// 写出载荷, 返回写入记录
    pub fn write(&self, writer: &mut BitWriter) -> WrittenPayload {
        let payload = &self.payload;
        match payload.payload_type {
            ExtPayloadType::DataElement => {
                let bytes = &payload.data[..self.data_bits.div_ceil(8)];
                for chunk in bytes.chunks(MAX_DSE_BYTES) {
                    write_dse(writer, chunk);
                }
            }
            ty => {
                let count = (4 + self.data_bits).div_ceil(8);
                write_fil_header(writer, count, count >= 15);
                let ext_type = match ty {
                    ExtPayloadType::Fill => 0,
                    other => other.as_u32(),
                };
                writer.write_bits(ext_type, 4);
                write_data_bits(writer, payload.data, self.data_bits);
                // 按字节补齐
                let pad = (count * 8 - 4 - self.data_bits) as u32;
                if pad > 0 {
                    writer.write_bits(0, pad);
                }
            }
        }
        WrittenPayload {
            payload_type: payload.payload_type,
            data_bits: self.data_bits,
            associated_ch_element: payload.associated_ch_element,
        }
    }
}

/// 写出 `data` 的前 `bits` 个比特
fn write_data_bits(writer: &mut BitWriter, data: &[u8], bits: usize) {
    let whole = bits / 8;
    writer.write_bytes(&data[..whole]);
    let rest = (bits % 8) as u32;
    if rest > 0 {
        writer.write_bits((data[whole] >> (8 - rest)) as u32, rest);
    }
}

/// 数据流元素的总比特数 (超长时拆成多个元素)
fn dse_bits(bytes: usize) -> u32 {
    let full = bytes / MAX_DSE_BYTES;
    let rest = bytes % MAX_DSE_BYTES;
    let mut total = full as u32 * single_dse_bits(MAX_DSE_BYTES);
    if rest > 0 || full == 0 {
        total += single_dse_bits(rest);
    }
    total
}

fn single_dse_bits(bytes: usize) -> u32 {
    let esc = if bytes >= 255 { 8 } else { 0 };
    ID_BITS + INSTANCE_TAG_BITS + 1 + 8 + esc + 8 * bytes as u32
}

fn write_dse(writer: &mut BitWriter, bytes: &[u8]) {
    writer.write_bits(SyntaxElementId::Dse.as_u32(), ID_BITS);
    writer.write_bits(0, INSTANCE_TAG_BITS);
    // data_byte_align_flag
    writer.write_bit(false);
    let count = bytes.len();
    if count >= 255 {
        writer.write_bits(255, 8);
        writer.write_bits((count - 255) as u32, 8);
    } else {
        writer.write_bits(count as u32, 8);
    }
    writer.write_bytes(bytes);
}

/// 含 `count` 字节内容的填充元素的总比特数
fn fil_element_bits(count: usize) -> u32 {
    let esc = if count >= 15 { 8 } else { 0 };
    ID_BITS + 4 + esc + 8 * count as u32
}

/// 写出填充元素头; `escape` 为真时使用 8 bit 扩展计数, 内容字节数 = 14 + 扩展计数
fn write_fil_header(writer: &mut BitWriter, count: usize, escape: bool) {
    writer.write_bits(SyntaxElementId::Fil.as_u32(), ID_BITS);
    if escape {
        writer.write_bits(15, 4);
        writer.write_bits((count - 14) as u32, 8);
    } else {
        writer.write_bits(count as u32, 4);
    }
}

/// 校验调用方载荷
///
/// - 数量不超过 [`MAX_TOTAL_EXT_PAYLOADS`]
/// - 所属声道元素必须存在
/// - 辅助数据总字节数超出 `max_anc_bytes` 时截断
/// - 其它载荷必须能放进单个填充元素
pub(crate) fn prepare_payloads<'a>(
    payloads: &[ExtensionPayload<'a>],
    n_elements: usize,
    max_anc_bytes: usize,
) -> AacEncResult<Vec<PreparedPayload<'a>>> {
    if payloads.len() > MAX_TOTAL_EXT_PAYLOADS {
        return Err(AacEncError::InvalidExtPayload(format!(
            "载荷过多: {} > {}",
            payloads.len(),
            MAX_TOTAL_EXT_PAYLOADS
        )));
    }
    let mut anc_left = max_anc_bytes;
    let mut prepared = Vec::with_capacity(payloads.len());
    for payload in payloads {
        if payload.associated_ch_element >= n_elements {
            return Err(AacEncError::InvalidExtPayload(format!(
                "载荷所属声道元素 {} 不存在",
                payload.associated_ch_element
            )));
        }
        if payload.data_bits > payload.data.len() * 8 {
            return Err(AacEncError::InvalidExtPayload(format!(
                "载荷比特数 {} 超过数据长度 {} 字节",
                payload.data_bits,
                payload.data.len()
            )));
        }
        let data_bits = match payload.payload_type {
            ExtPayloadType::DataElement => {
                if max_anc_bytes == 0 {
                    return Err(AacEncError::InvalidExtPayload(
                        "未启用辅助数据".into(),
                    ));
                }
                let bytes = payload.data_bits.div_ceil(8);
                if bytes > anc_left {
                    warn!(
                        "辅助数据超出每帧上限, 截断: {} -> {} 字节",
                        bytes, anc_left
                    );
                    let clipped = anc_left;
                    anc_left = 0;
                    clipped * 8
                } else {
                    anc_left -= bytes;
                    payload.data_bits
                }
            }
            _ => {
                if (4 + payload.data_bits).div_ceil(8) > MAX_FIL_BYTES {
                    return Err(AacEncError::InvalidExtPayload(format!(
                        "{:?} 载荷过长: {} bits",
                        payload.payload_type, payload.data_bits
                    )));
                }
                payload.data_bits
            }
        };
        if payload.payload_type == ExtPayloadType::DataElement && data_bits == 0 {
            continue;
        }
        prepared.push(PreparedPayload {
            payload: *payload,
            data_bits,
        });
    }
    Ok(prepared)
}

/// 写出约 `need` 比特的填充元素, 返回实际写出的比特数
///
/// 写出量 `F` 满足 `need - 8 < F <= need`. `need < 8` 时不写.
pub(crate) fn write_fill(writer: &mut BitWriter, need: u32) -> u32 {
    if need < 8 {
        return 0;
    }
    let elements = need.div_ceil(MAX_FIL_ELEMENT_BITS);
    // 每个元素固定 7 bit 头, 其余按字节计
    let mut units = (need - 7 * elements) / 8;
    let start = writer.bits_written();
    for i in 0..elements {
        let left = elements - i;
        let share = units.div_ceil(left).min(MAX_FIL_BYTES as u32 + 1);
        units -= share;
        // 带扩展计数时 8 bit 计数本身占一个字节单位
        let escape = share >= 15;
        let count = if escape { share - 1 } else { share } as usize;
        write_fil_header(writer, count, escape);
        if count > 0 {
            writer.write_bits(ExtPayloadType::Fill.as_u32(), 4);
            writer.write_bits(0, 4);
            for _ in 1..count {
                writer.write_bits(FILL_BYTE as u32, 8);
            }
        }
    }
    (writer.bits_written() - start) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_填充比特数() {
        for need in [8u32, 9, 15, 100, 127, 128, 2166, 2167, 2168, 5000, 20000] {
            let mut writer = BitWriter::new();
            let written = write_fill(&mut writer, need);
            assert!(written <= need, "need {need}, written {written}");
            assert!(written + 8 > need, "need {need}, written {written}");
            assert_eq!(writer.bits_written() as u32, written);
        }
        let mut writer = BitWriter::new();
        assert_eq!(write_fill(&mut writer, 7), 0);
    }

    #[test]
    fn test_填充内容() {
        let mut writer = BitWriter::new();
        // 7 + 8 * 3: 计数 3, 扩展类型字节后接两个填充字节
        assert_eq!(write_fill(&mut writer, 31), 31);
        writer.byte_align();
        let bytes = writer.finish();
        // 110 0011 | 0000 0000 | 1010 0101 | 1010 0101 | 0
        assert_eq!(bytes, vec![0xC6, 0x01, 0x4B, 0x4A]);
    }

    #[test]
    fn test_载荷校验() {
        let data = [1u8, 2, 3];
        let anc = ExtensionPayload::new(ExtPayloadType::DataElement, &data, 0);
        assert!(matches!(
            prepare_payloads(&[anc], 1, 0),
            Err(AacEncError::InvalidExtPayload(_))
        ));
        let bad = ExtensionPayload::new(ExtPayloadType::SbrData, &data, 2);
        assert!(prepare_payloads(&[bad], 2, 0).is_err());
        let many = vec![ExtensionPayload::new(ExtPayloadType::FillData, &data, 0); 11];
        assert!(prepare_payloads(&many, 1, 0).is_err());
        let long = vec![0u8; 300];
        let long = ExtensionPayload::new(ExtPayloadType::DynamicRange, &long, 0);
        assert!(prepare_payloads(&[long], 1, 0).is_err());
    }

    #[test]
    fn test_辅助数据截断() {
        let data = [7u8; 40];
        let a = ExtensionPayload::new(ExtPayloadType::DataElement, &data, 0);
        let prepared = prepare_payloads(&[a, a], 1, 50).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].data_bits, 320);
        assert_eq!(prepared[1].data_bits, 80);
        // 上限用尽后的载荷被丢弃
        let prepared = prepare_payloads(&[a, a, a], 1, 50).unwrap();
        assert_eq!(prepared.len(), 2);
    }

    #[test]
    fn test_写出比特数与预计一致() {
        let small = [0x5Au8; 3];
        let big = vec![0x11u8; 600];
        let cases = [
            ExtensionPayload::new(ExtPayloadType::DataElement, &small, 0),
            ExtensionPayload::new(ExtPayloadType::DataElement, &big, 0),
            ExtensionPayload::new(ExtPayloadType::SbrData, &small, 0),
            ExtensionPayload {
                data: &small,
                data_bits: 13,
                payload_type: ExtPayloadType::DynamicRange,
                associated_ch_element: 0,
            },
            ExtensionPayload::new(ExtPayloadType::FillData, &big[..100], 0),
        ];
        for payload in cases {
            let prepared = prepare_payloads(&[payload], 1, 1024).unwrap();
            let mut writer = BitWriter::new();
            let record = prepared[0].write(&mut writer);
            assert_eq!(writer.bits_written() as u32, prepared[0].bits());
            assert_eq!(record.payload_type, payload.payload_type);
        }
    }

    #[test]
    fn test_数据流元素() {
        let data = [0xABu8, 0xCD];
        let payload = ExtensionPayload::new(ExtPayloadType::DataElement, &data, 0);
        let prepared = prepare_payloads(&[payload], 1, 16).unwrap();
        let mut writer = BitWriter::new();
        prepared[0].write(&mut writer);
        writer.byte_align();
        // 100 0000 0 | 0000 0010 | 1010 1011 | 1100 1101
        assert_eq!(writer.finish(), vec![0x80, 0x02, 0xAB, 0xCD]);
    }
}
