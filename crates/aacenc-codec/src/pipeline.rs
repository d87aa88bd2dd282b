//! 逐帧编码流程.
//!
//! 一帧的处理顺序:
//! 1. 去交错并转为定点 (按需把 WAV 声道顺序重排为 MPEG 顺序)
//! 2. 每声道长窗 MDCT, 结果写入暂存的变换状态
//! 3. 向码率控制器申请本帧预算, 扣除帧头、扩展载荷 (不少于预留的边信息) 与结束标志后
//!    按权重分给声道元素
//! 4. 依次写出声道元素及其扩展载荷, 不足最少比特数时补填充元素
//! 5. 写出结束元素并字节对齐, 通过传输层输出
//!
//! 只有传输层输出成功后才提交变换状态与比特储备, 失败的帧可以直接丢弃.

use bytes::Bytes;
use log::{debug, error, trace};

use aacenc_core::fixed::pcm16_to_fixp;
use aacenc_core::{AacEncError, AacEncResult, BitWriter, ChannelOrder};

use crate::coder::{ChannelSpectrum, CoderContext};
use crate::config::MAX_CHANNELS;
use crate::element::{END_AND_ALIGN_BITS, ID_BITS, INSTANCE_TAG_BITS, SyntaxElementId, distribute_bits};
use crate::encoder::{AacEncoder, EncodedFrame, EncoderState};
use crate::payload::{ExtPayloadType, ExtensionPayload, WrittenPayload, prepare_payloads, write_fill};
use crate::transport::TransportEncoder;

/// 交错 PCM 去交错为每声道定点样本
///
/// `map` 为 `Some` 时, 第 `ch` 个输出声道取自输入声道 `map[ch]`.
fn deinterleave(
    input: &[i16],
    n_channels: usize,
    frame_length: usize,
    map: Option<&[usize]>,
    out: &mut [Vec<i32>],
) {
    for (ch, dst) in out.iter_mut().take(n_channels).enumerate() {
        let src = map.map_or(ch, |m| m[ch]);
        for (i, slot) in dst[..frame_length].iter_mut().enumerate() {
            *slot = pcm16_to_fixp(input[i * n_channels + src]);
        }
    }
}

impl AacEncoder {
    /// 编码一帧
    ///
    /// `input` 为交错的 16 位 PCM, 长度必须为 帧长 * 声道数.
    /// 非致命错误不改变任何持久状态; 致命错误使实例失效.
    pub fn encode_frame(
        &mut self,
        transport: &mut dyn TransportEncoder,
        input: &[i16],
        payloads: &[ExtensionPayload<'_>],
    ) -> AacEncResult<EncodedFrame> {
        match self.state {
            EncoderState::Initialized | EncoderState::Encoding => {}
            EncoderState::Failed => {
                return Err(AacEncError::InvalidHandle("实例已失效, 需要重新打开"));
            }
            EncoderState::Opened | EncoderState::Closed => {
                return Err(AacEncError::InvalidHandle("实例尚未初始化"));
            }
        }
        match self.encode_frame_inner(transport, input, payloads) {
            Ok(frame) => {
                self.state = EncoderState::Encoding;
                Ok(frame)
            }
            Err(err) => {
                if err.is_fatal() {
                    error!("编码内部错误, 实例失效: {}", err);
                    self.state = EncoderState::Failed;
                } else {
                    debug!("帧编码失败: {}", err);
                }
                Err(err)
            }
        }
    }

    fn encode_frame_inner(
        &mut self,
        transport: &mut dyn TransportEncoder,
        input: &[i16],
        payloads: &[ExtensionPayload<'_>],
    ) -> AacEncResult<EncodedFrame> {
        let Self {
            active,
            rate,
            mdct,
            staged,
            time,
            spectra,
            slope,
            static_bits,
            coder,
            ..
        } = self;
        let (Some(active), Some(rate), Some(slope)) = (active.as_ref(), rate.as_mut(), slope.as_ref())
        else {
            return Err(AacEncError::InvalidHandle("实例尚未初始化"));
        };

        let frame_len = active.frame_length();
        let n_ch = active.n_channels();
        if input.len() != frame_len * n_ch {
            return Err(AacEncError::InvalidInput(format!(
                "输入样本数 {} 不等于 帧长 {} * 声道数 {}",
                input.len(),
                frame_len,
                n_ch
            )));
        }
        let prepared = prepare_payloads(
            payloads,
            active.elements.len(),
            active.max_anc_bytes_per_au,
        )?;

        let map = match active.config.channel_order {
            ChannelOrder::Mpeg => None,
            ChannelOrder::Wav => Some(active.config.channel_mode.wav_to_mpeg()),
        };
        deinterleave(input, n_ch, frame_len, map, time);

        // 变换结果先写入暂存状态
        for (dst, src) in staged[..n_ch].iter_mut().zip(&mdct[..n_ch]) {
            dst.copy_from(src)?;
        }
        let mut exponents = [0i32; MAX_CHANNELS as usize];
        for (ch, state) in staged[..n_ch].iter_mut().enumerate() {
            let out = state.forward_block(
                &time[ch][..frame_len],
                0,
                &mut spectra[ch][..frame_len],
                frame_len,
                0,
                slope,
            )?;
            if out.consumed != frame_len {
                return Err(AacEncError::InvalidTransform(format!(
                    "声道 {} 消耗 {} 个样本, 预期 {}",
                    ch, out.consumed, frame_len
                )));
            }
            exponents[ch] = out.exponent;
        }

        let budget = rate.frame_budget();
        let static_bits = *static_bits;
        if static_bits > budget.max_bits {
            return Err(AacEncError::BitresTooLow {
                reservoir: budget.reservoir as i32,
                needed: static_bits as i32,
            });
        }
        let raw_max = budget.max_bits - static_bits;
        let raw_min = budget.min_bits.saturating_sub(static_bits);

        let ext_bits: u32 = prepared.iter().map(|p| p.bits()).sum();
        let reserved = ext_bits.max(budget.side_bits) + END_AND_ALIGN_BITS;
        if reserved > raw_max {
            return Err(AacEncError::InvalidExtPayload(format!(
                "扩展载荷 {} bits 超出本帧容量 {} bits",
                ext_bits, raw_max
            )));
        }
        let shares = distribute_bits(&active.elements, raw_max - reserved)?;

        let mut writer = BitWriter::with_capacity(raw_max as usize / 8 + 1);
        let mut written_payloads = Vec::with_capacity(prepared.len() + 1);
        let header_bits = ID_BITS + INSTANCE_TAG_BITS;
        let mut carry = 0u32;
        for (idx, (info, &share)) in active.elements.iter().zip(&shares).enumerate() {
            let n = info.kind.channels();
            if info.channel_offset + n > n_ch {
                return Err(AacEncError::InvalidElementInfoType(format!(
                    "{:?} 声道偏移 {} 超出声道数 {}",
                    info.kind, info.channel_offset, n_ch
                )));
            }
            writer.write_bits(SyntaxElementId::for_element(info.kind).as_u32(), ID_BITS);
            writer.write_bits(info.instance_tag as u32, INSTANCE_TAG_BITS);

            let channels: Vec<ChannelSpectrum<'_>> = (info.channel_offset..info.channel_offset + n)
                .map(|ch| ChannelSpectrum {
                    lines: &spectra[ch][..frame_len],
                    exponent: exponents[ch],
                })
                .collect();
            let ctx = CoderContext {
                tools: active.config.tools,
                bandwidth_lines: active.bandwidth_lines,
            };
            let allowance = share + carry - header_bits;
            let used = coder.encode_element(info.kind, &channels, &ctx, allowance, &mut writer)?;
            if used > allowance {
                return Err(AacEncError::QuantError {
                    used,
                    allowed: allowance,
                });
            }
            carry = allowance - used;

            for payload in prepared
                .iter()
                .filter(|p| p.payload.associated_ch_element == idx)
            {
                written_payloads.push(payload.write(&mut writer));
            }
        }

        // 补足本帧最少比特数
        let used = writer.bits_written() as u32;
        let fill_bits = write_fill(&mut writer, raw_min.saturating_sub(used + ID_BITS));
        if fill_bits > 0 {
            written_payloads.push(WrittenPayload {
                payload_type: ExtPayloadType::Fill,
                data_bits: fill_bits as usize,
                associated_ch_element: active.elements.len() - 1,
            });
        }
        writer.write_bits(SyntaxElementId::End.as_u32(), ID_BITS);
        writer.byte_align();

        let raw_bits = writer.bits_written();
        let total_bits = raw_bits as u32 + static_bits;
        let mut next_rate = rate.clone();
        let reservoir = next_rate.commit(&budget, total_bits)?;

        let num_out_bytes = transport.write_access_unit(Bytes::from(writer.finish()), raw_bits)?;

        mdct[..n_ch].swap_with_slice(&mut staged[..n_ch]);
        *rate = next_rate;
        trace!(
            "编码一帧: {} bits (预算 {}, 范围 {}..={}), 输出 {} 字节, 储备 {}",
            total_bits,
            budget.budget,
            budget.min_bits,
            budget.max_bits,
            num_out_bytes,
            reservoir
        );
        Ok(EncodedFrame {
            num_out_bytes,
            ext_payloads: written_payloads,
        })
    }
}
