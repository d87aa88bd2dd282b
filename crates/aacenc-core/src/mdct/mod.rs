//! MDCT/IMDCT 变换引擎.
//!
//! 每个声道持有一个 [`MdctState`], 绑定一块外部分配的重叠缓冲区:
//! - 正变换 (分析) 方向: 缓冲区保存上一块右斜坡区间的时域样本
//! - 逆变换 (合成) 方向: 缓冲区头部为尚未输出的样本, 尾部为上一块右半部分的折叠源
//!
//! 折叠点几何: 第 j 块位于折叠点 p_j 与 p_{j+1} = p_j + tl 之间, 窗口跨越
//! [p_j - tl/2, p_{j+1} + tl/2). 左半部分依次为 (tl-fl)/2 个零、fl 点上升斜坡、
//! 其余为 1; 右半部分依次为 nr = (tl-fr)/2 个 1、fr 点下降斜坡、其余为 0.
//! 相邻块的斜坡在同一折叠点附近重叠, 因此长度切换时仍能完全重建.
//!
//! 所有数值均为块浮点: 一块尾数共享一个指数, 缩放一律饱和.

mod analysis;
mod dct;
mod synthesis;
mod window;

use log::trace;

use crate::error::{AacEncError, AacEncResult};
use crate::fixed::BlockFloat;

pub use dct::{SUPPORTED_TRANSFORM_LENGTHS, dct_iv, is_supported_length};
pub use window::{WindowShape, WindowSlope};

/// Q31 下的 1.0 (以 i64 表示)
pub(crate) const ONE_Q31: i64 = 1 << 31;

/// 正变换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdctOutput {
    /// 本次消耗的输入样本数
    pub consumed: usize,
    /// 频谱共享指数
    pub exponent: i32,
}

/// 重叠缓冲区的解释方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    /// 尚未变换
    Idle,
    /// 分析方向: 缓冲区前 `fill` 个为时域样本, 共享指数 `exponent`
    Time { fill: usize, exponent: i32 },
    /// 合成方向: 头部 `pending` 个待输出样本, 尾部 `half` 个为折叠源
    Freq { pending: usize, half: usize },
}

/// 上一块右侧窗口的几何信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlopeHistory {
    /// 上一块变换长度
    pub prev_tl: usize,
    /// 上一块右斜坡长度, 恒等于 `prev_wrs.len()`
    pub prev_fr: usize,
    /// 上一块右侧平坦区长度
    pub prev_nr: usize,
    /// 上一块右斜坡
    pub prev_wrs: WindowSlope,
}

impl SlopeHistory {
    /// 按给定右侧窗口建立历史
    pub(crate) fn from_right(tl: usize, wrs: &WindowSlope) -> Self {
        Self {
            prev_tl: tl,
            prev_fr: wrs.len(),
            prev_nr: (tl - wrs.len()) / 2,
            prev_wrs: wrs.clone(),
        }
    }

    /// 合成方向的首块: 假想一个长度为 `desired` 的前置块, 右斜坡与当前左斜坡一致
    pub(crate) fn virtual_start(wls: &WindowSlope, desired: usize) -> Self {
        let fl = wls.len();
        let tl = desired.max(fl) & !1;
        Self::from_right(tl, wls)
    }
}

/// 当左斜坡长度与上一块右斜坡长度不同时调整左侧几何
///
/// 优先改用较长的斜坡. 两侧都无法调整时返回错误.
pub(crate) fn adapt_history(
    hist: &mut SlopeHistory,
    fl: &mut usize,
    nl: &mut usize,
    tl: usize,
    wls: &WindowSlope,
) -> AacEncResult<()> {
    let diff = (hist.prev_fr as isize - *fl as isize) / 2;
    let new_nr = hist.prev_nr as isize + diff;
    let new_nl = *nl as isize - diff;
    // 调整后斜坡仍须落在各自的半窗之内
    let mut use_current = new_nr > 0 && new_nr + *fl as isize <= hist.prev_tl as isize;
    let use_previous = new_nl > 0 && new_nl + hist.prev_fr as isize <= tl as isize;
    if use_current && use_previous && *fl < hist.prev_fr {
        use_current = false;
    }

    if use_current {
        hist.prev_nr = new_nr as usize;
        hist.prev_fr = *fl;
        hist.prev_wrs = wls.clone();
    } else {
        if new_nl < 0 || new_nl + hist.prev_fr as isize > tl as isize {
            return Err(AacEncError::InvalidTransform(format!(
                "无法衔接窗口斜坡: 上一块 fr={} nr={}, 当前 fl={} nl={}",
                hist.prev_fr, hist.prev_nr, fl, nl
            )));
        }
        *nl = new_nl as usize;
        *fl = hist.prev_fr;
    }
    trace!(
        "窗口斜坡调整: use_current={}, fl={}, nl={}, prev_nr={}",
        use_current, fl, nl, hist.prev_nr
    );
    Ok(())
}

/// 计算逆变换的归一化增益 2/tl
pub fn compute_gain(tl: usize) -> AacEncResult<BlockFloat> {
    if !is_supported_length(tl) {
        return Err(AacEncError::InvalidTransform(format!(
            "不支持的变换长度: {}",
            tl
        )));
    }
    Ok(BlockFloat::from_ratio(2, tl as u32))
}

/// 单声道变换状态
#[derive(Debug, Clone)]
pub struct MdctState {
    /// 重叠缓冲区
    buffer: Vec<i32>,
    /// 允许的最大变换长度
    max_tl: usize,
    overlap: Overlap,
    /// `None` 表示尚未变换
    history: Option<SlopeHistory>,
}

impl MdctState {
    /// 绑定重叠缓冲区
    ///
    /// 缓冲区长度必须不小于 `max_transform_len`.
    pub fn init(mut buffer: Vec<i32>, max_transform_len: usize) -> AacEncResult<Self> {
        if max_transform_len == 0 {
            return Err(AacEncError::InvalidTransform(
                "最大变换长度不能为 0".into(),
            ));
        }
        if buffer.len() < max_transform_len {
            return Err(AacEncError::InvalidTransform(format!(
                "重叠缓冲区过小: {} < {}",
                buffer.len(),
                max_transform_len
            )));
        }
        buffer.fill(0);
        Ok(Self {
            buffer,
            max_tl: max_transform_len,
            overlap: Overlap::Idle,
            history: None,
        })
    }

    /// 清空重叠内容, 回到初始状态 (保留缓冲区)
    pub fn reset(&mut self) {
        self.buffer.fill(0);
        self.overlap = Overlap::Idle;
        self.history = None;
    }

    /// 复制另一个状态的全部内容, 复用自身缓冲区
    ///
    /// 两者缓冲区长度不同时返回错误, 自身不变.
    pub fn copy_from(&mut self, other: &MdctState) -> AacEncResult<()> {
        if self.buffer.len() != other.buffer.len() {
            return Err(AacEncError::InvalidTransform(format!(
                "重叠缓冲区长度不一致: {} != {}",
                self.buffer.len(),
                other.buffer.len()
            )));
        }
        self.buffer.copy_from_slice(&other.buffer);
        self.max_tl = other.max_tl;
        self.overlap = other.overlap;
        self.history.clone_from(&other.history);
        Ok(())
    }

    /// 重叠缓冲区长度
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// 允许的最大变换长度
    pub fn max_transform_len(&self) -> usize {
        self.max_tl
    }

    /// 是否已进行过变换
    pub fn is_started(&self) -> bool {
        self.history.is_some()
    }

    /// 缓冲区中的样本数: 分析方向为时域样本, 合成方向为待输出样本
    pub fn buffered_samples(&self) -> usize {
        match self.overlap {
            Overlap::Idle => 0,
            Overlap::Time { fill, .. } => fill,
            Overlap::Freq { pending, .. } => pending,
        }
    }

    /// 上一块右斜坡长度
    pub fn prev_slope_len(&self) -> Option<usize> {
        self.history.as_ref().map(|h| h.prev_fr)
    }

    pub(crate) fn check_length(&self, tl: usize) -> AacEncResult<()> {
        if !is_supported_length(tl) || tl > self.max_tl {
            return Err(AacEncError::InvalidTransform(format!(
                "变换长度 {} 不受支持或超过上限 {}",
                tl, self.max_tl
            )));
        }
        Ok(())
    }

    /// 合成前调整左侧窗口几何
    ///
    /// 首次调用时以 `desired` 建立假想的前置块. 分析方向的状态不允许调整.
    pub fn adapt_parameters(
        &mut self,
        fl: &mut usize,
        nl: &mut usize,
        tl: usize,
        wls: &WindowSlope,
        desired: usize,
    ) -> AacEncResult<()> {
        if matches!(self.overlap, Overlap::Time { .. }) {
            return Err(AacEncError::InvalidTransform(
                "分析方向的状态不能调整合成窗口".into(),
            ));
        }
        match &mut self.history {
            None => {
                self.history = Some(SlopeHistory::virtual_start(wls, desired));
                Ok(())
            }
            Some(hist) if *fl != hist.prev_fr => adapt_history(hist, fl, nl, tl, wls),
            Some(_) => Ok(()),
        }
    }

    /// 取出缓冲的输出样本 (破坏性读取), 返回写入个数
    pub fn drain(&mut self, out: &mut [i32]) -> usize {
        let Overlap::Freq { pending, half } = self.overlap else {
            return 0;
        };
        let n = pending.min(out.len());
        out[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.copy_within(n..pending, 0);
        self.overlap = Overlap::Freq {
            pending: pending - n,
            half,
        };
        n
    }

    /// 复制缓冲样本与已确定的新样本 (不改变状态), 返回写入个数
    ///
    /// 合成方向: 待输出样本之后紧跟上一块右侧平坦区 (该区不再与后续块重叠).
    /// 分析方向: 缓冲的时域样本.
    pub fn copy_overlap_and_new(&self, out: &mut [i32]) -> usize {
        match self.overlap {
            Overlap::Idle => 0,
            Overlap::Time { fill, .. } => {
                let n = fill.min(out.len());
                out[..n].copy_from_slice(&self.buffer[..n]);
                n
            }
            Overlap::Freq { pending, half } => {
                let nr = self.history.as_ref().map_or(0, |h| h.prev_nr);
                let n = (pending + nr).min(out.len());
                let copied = pending.min(n);
                out[..copied].copy_from_slice(&self.buffer[..copied]);
                let v1 = &self.buffer[self.buffer.len() - half..];
                for (i, slot) in out[copied..n].iter_mut().enumerate() {
                    *slot = v1[half - 1 - i].saturating_neg();
                }
                n
            }
        }
    }
}
