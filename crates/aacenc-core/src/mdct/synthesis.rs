//! 逆变换 (合成) 与重叠相加.
//!
//! 每块输出 [p_j - prev_tl/2, p_j + tl/2) 区间: 上一块右侧平坦区、重叠斜坡区、
//! 本块左侧平坦区. 本块右半部分的折叠源 (tl/2 个样本) 留到下一块.

use log::trace;

use super::{MdctState, Overlap, SlopeHistory, WindowSlope, adapt_history, dct_iv};
use crate::error::{AacEncError, AacEncResult};
use crate::fixed::{BlockFloat, MDCT_OUT_HEADROOM, round_shr_i64, saturate_i64, scale_i64};

impl MdctState {
    /// 多块 IMDCT
    ///
    /// - `spectra`: 连续存放的 `exponents.len()` 块频谱, 每块 `tl` 个系数
    /// - `exponents`: 各块的共享指数
    /// - `out`: 输出缓冲, 至少 `desired` 个样本
    /// - `wls`: 首块的左斜坡; 后续块的左斜坡与 `wrs` 相同
    /// - `gain`: 输出增益, 通常为 [`compute_gain`](super::compute_gain) 的结果
    ///
    /// 输出样本为保留 [`MDCT_OUT_HEADROOM`] 位净空的定点格式. 返回实际输出的
    /// 样本数 (不超过 `desired`); 多余的样本留在缓冲区中, 下次调用或
    /// [`drain`](MdctState::drain) 时输出. 失败时状态保持不变.
    #[allow(clippy::too_many_arguments)]
    pub fn inverse_block(
        &mut self,
        spectra: &[i32],
        exponents: &[i32],
        out: &mut [i32],
        desired: usize,
        tl: usize,
        wls: &WindowSlope,
        wrs: &WindowSlope,
        gain: BlockFloat,
    ) -> AacEncResult<usize> {
        self.check_length(tl)?;
        let blocks = exponents.len();
        if blocks == 0 || spectra.len() < blocks * tl {
            return Err(AacEncError::InvalidTransform(format!(
                "频谱块数据不足: {} 块 x {} < {}",
                blocks,
                tl,
                spectra.len()
            )));
        }
        if wls.len() > tl || wrs.len() > tl {
            return Err(AacEncError::InvalidTransform(format!(
                "斜坡长度超过变换长度: fl={}, fr={}, tl={}",
                wls.len(),
                wrs.len(),
                tl
            )));
        }
        if out.len() < desired {
            return Err(AacEncError::InvalidTransform(format!(
                "输出缓冲区过小: {} < {}",
                out.len(),
                desired
            )));
        }

        let size = self.buffer.len();
        let (pending, stored_half) = match self.overlap {
            Overlap::Idle => (0, None),
            Overlap::Freq { pending, half } => (pending, Some(half)),
            Overlap::Time { .. } => {
                return Err(AacEncError::InvalidTransform(
                    "分析方向的状态不能做逆变换".into(),
                ));
            }
        };
        let mut hist = match &self.history {
            Some(h) => h.clone(),
            None => SlopeHistory::virtual_start(wls, desired),
        };
        let mut v1: Vec<i32> = match stored_half {
            Some(half) => self.buffer[size - half..].to_vec(),
            None => vec![0; hist.prev_tl / 2],
        };

        let fr = wrs.len();
        let mut produced: Vec<i32> = self.buffer[..pending].to_vec();
        let mut block = vec![0i32; tl];
        for j in 0..blocks {
            let left = if j == 0 { wls } else { wrs };
            let mut fl = left.len();
            let mut nl = (tl - fl) / 2;
            if fl != hist.prev_fr {
                adapt_history(&mut hist, &mut fl, &mut nl, tl, left)?;
            }
            let zl = tl.checked_sub(fl + nl).ok_or_else(|| {
                AacEncError::InvalidTransform(format!(
                    "左侧窗口几何无效: tl={}, fl={}, nl={}",
                    tl, fl, nl
                ))
            })?;

            block.copy_from_slice(&spectra[j * tl..(j + 1) * tl]);
            let e = dct_iv(&mut block, exponents[j])?;
            let shift = e + gain.exponent - MDCT_OUT_HEADROOM as i32 - 31;
            for v in block.iter_mut() {
                *v = scale_i64(*v as i64 * gain.mantissa as i64, shift);
            }

            let (u1, u2) = block.split_at(tl / 2);
            overlap_add(&mut produced, &hist, &v1, u2, fl, nl, zl);
            v1.clear();
            v1.extend_from_slice(u1);
            hist = SlopeHistory::from_right(tl, wrs);
        }

        let n_out = produced.len().min(desired);
        let leftover = produced.len() - n_out;
        let half = tl / 2;
        if leftover + half > size {
            return Err(AacEncError::InvalidTransform(format!(
                "重叠缓冲区不足: 待输出 {} + 折叠源 {} > {}",
                leftover, half, size
            )));
        }

        out[..n_out].copy_from_slice(&produced[..n_out]);
        self.buffer[..leftover].copy_from_slice(&produced[n_out..]);
        self.buffer[size - half..].copy_from_slice(&v1);
        self.overlap = Overlap::Freq {
            pending: leftover,
            half,
        };
        self.history = Some(hist);
        trace!(
            "inverse_block: tl={}, blocks={}, fr={}, out={}, pending={}",
            tl, blocks, fr, n_out, leftover
        );
        Ok(n_out)
    }
}

/// 输出一块: 上一块右侧平坦区 + 重叠区 + 本块左侧平坦区
///
/// 重叠区两侧都使用 `hist.prev_wrs`, 其长度等于 `fl`.
fn overlap_add(
    out: &mut Vec<i32>,
    hist: &SlopeHistory,
    v1: &[i32],
    u2: &[i32],
    fl: usize,
    nl: usize,
    zl: usize,
) {
    let prev_half = v1.len();
    let cur_half = u2.len();
    // 上一块右半部分 (-v1_r, -v1)
    let right = |n: usize| -> i64 {
        if n < prev_half {
            -(v1[prev_half - 1 - n] as i64)
        } else {
            -(v1[n - prev_half] as i64)
        }
    };
    // 本块左半部分 (u2, -u2_r)
    let left = |n: usize| -> i64 {
        if n < cur_half {
            u2[n] as i64
        } else {
            -(u2[2 * cur_half - 1 - n] as i64)
        }
    };

    out.reserve(hist.prev_nr + fl + nl);
    for n in 0..hist.prev_nr {
        out.push(saturate_i64(right(n)));
    }
    let w = &hist.prev_wrs;
    for k in 0..fl {
        let acc = ((right(hist.prev_nr + k) * w.falling(k) as i64) >> 1)
            + ((left(zl + k) * w.rising(k) as i64) >> 1);
        out.push(saturate_i64(round_shr_i64(acc, 30)));
    }
    for k in 0..nl {
        out.push(saturate_i64(left(zl + fl + k)));
    }
}
