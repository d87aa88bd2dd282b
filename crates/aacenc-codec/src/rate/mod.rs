//! 码率控制.
//!
//! 每帧的名义预算由整数累加器按 `码率 * 帧长 / 采样率` 精确分摊, 余数留给
//! 下一帧. 在此基础上按码率模式从比特储备中借用:
//! - CBR: 最多借用当前储备的一半
//! - VBR: 可借用全部储备
//! - 固定帧: 储备只保存不足一字节的余数
//! - 超帧: 每个超帧结束时储备回落到不足一字节的余数
//!
//! 所有上下限均按字节对齐, 并落在配置的每帧最少/最多比特数之内.

mod reservoir;
mod vbr;

use log::trace;

use aacenc_core::{AacEncError, AacEncResult};

use crate::config::{ActiveConfig, BitrateMode, FIXED_FRAME_RESERVOIR};

pub use reservoir::BitReservoir;
pub use vbr::vbr_bitrate;

#[inline]
fn floor8(bits: u64) -> u64 {
    bits & !7
}

#[inline]
fn ceil8(bits: u64) -> u64 {
    (bits + 7) & !7
}

/// 单帧比特预算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    /// 名义预算
    pub budget: u32,
    /// 本帧至少写出的比特数
    pub min_bits: u32,
    /// 本帧最多写出的比特数
    pub max_bits: u32,
    /// 计算预算时的储备
    pub reservoir: u32,
    /// 为辅助数据与 SBR 边信息预留的比特数
    pub side_bits: u32,
    /// 本帧结束后储备允许的上限
    reservoir_limit: u32,
    /// 分摊余数
    remainder: u64,
}

/// 码率控制器
#[derive(Debug, Clone)]
pub struct RateController {
    mode: BitrateMode,
    bit_rate: u32,
    sample_rate: u32,
    frame_length: u32,
    min_bits: u32,
    max_bits: u32,
    side_bits: u32,
    remainder: u64,
    reservoir: BitReservoir,
    n_sub_frames: u32,
    sub_frame: u32,
}

impl RateController {
    /// 按生效配置创建
    pub fn new(active: &ActiveConfig) -> Self {
        let mode = active.config.bitrate_mode;
        Self {
            mode,
            bit_rate: active.bit_rate,
            sample_rate: active.config.sample_rate,
            frame_length: active.config.frame_length,
            min_bits: active.min_bits,
            max_bits: active.max_bits,
            side_bits: active.side_data_bits(),
            remainder: 0,
            reservoir: BitReservoir::new(active.reservoir_size, Self::starts_full(mode)),
            n_sub_frames: active.config.n_sub_frames.max(1),
            sub_frame: 0,
        }
    }

    fn starts_full(mode: BitrateMode) -> bool {
        !matches!(mode, BitrateMode::FixedFrame | BitrateMode::SuperFrame)
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.remainder = 0;
        self.sub_frame = 0;
        self.reservoir.reset(Self::starts_full(self.mode));
    }

    /// 当前储备比特数
    pub fn reservoir_level(&self) -> u32 {
        self.reservoir.level()
    }

    /// 储备上限
    pub fn reservoir_size(&self) -> u32 {
        self.reservoir.size()
    }

    /// 码率模式
    pub fn mode(&self) -> BitrateMode {
        self.mode
    }

    /// 计算下一帧的预算 (不修改状态)
    pub fn frame_budget(&self) -> FrameBudget {
        let total = self.remainder + self.bit_rate as u64 * self.frame_length as u64;
        let sr = self.sample_rate as u64;
        let budget = total / sr;
        let r = self.reservoir.level() as u64;

        let superframe_end = self.mode == BitrateMode::SuperFrame
            && self.sub_frame + 1 >= self.n_sub_frames;
        let limit = if superframe_end {
            FIXED_FRAME_RESERVOIR.min(self.reservoir.size())
        } else {
            self.reservoir.size()
        } as u64;

        let draw = match self.mode {
            BitrateMode::Cbr => r / 2,
            _ => r,
        };

        let cfg_min = floor8(self.min_bits as u64);
        let cfg_max = floor8(self.max_bits as u64);
        let upper = floor8(budget + r);
        let overflow = (budget + r).saturating_sub(limit);
        let lower = cfg_min.max(ceil8(overflow)).min(upper).min(cfg_max);
        let max_bits = floor8((self.max_bits as u64).min(budget + draw))
            .max(lower)
            .min(upper);

        FrameBudget {
            budget: budget as u32,
            min_bits: lower as u32,
            max_bits: max_bits as u32,
            reservoir: r as u32,
            side_bits: self.side_bits,
            reservoir_limit: limit as u32,
            remainder: total % sr,
        }
    }

    /// 提交一帧的实际写出比特数
    ///
    /// 超出上下限时返回储备下溢/溢出错误, 状态不变.
    pub fn commit(&mut self, frame: &FrameBudget, written: u32) -> AacEncResult<u32> {
        if written > frame.max_bits {
            return Err(AacEncError::BitresTooLow {
                reservoir: frame.reservoir as i32,
                needed: written as i32 - frame.budget as i32,
            });
        }
        if written < frame.min_bits {
            return Err(AacEncError::BitresTooHigh {
                reservoir: (frame.reservoir as i64 + frame.budget as i64 - written as i64) as i32,
                limit: frame.reservoir_limit as i32,
            });
        }
        let level = self
            .reservoir
            .update(frame.budget, written, frame.reservoir_limit);
        self.remainder = frame.remainder;
        self.sub_frame = (self.sub_frame + 1) % self.n_sub_frames;
        trace!(
            "码率控制: 预算 {}, 写出 {}, 储备 {} -> {}",
            frame.budget, written, frame.reservoir, level
        );
        Ok(level)
    }
}
