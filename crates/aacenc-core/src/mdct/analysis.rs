//! 正变换 (分析).
//!
//! 左斜坡沿用上一块的右斜坡, 缓冲区保存从 p_j - fl/2 开始的时域样本.
//! 本块需要 [p_j - fl/2, p_{j+1} + fr/2) 共 fl/2 + tl + fr/2 个样本,
//! 不足部分从输入补齐; 结束后保留最后 fr 个样本供下一块使用.

use log::trace;

use super::{MdctOutput, MdctState, ONE_Q31, Overlap, SlopeHistory, WindowSlope, dct_iv};
use crate::error::{AacEncError, AacEncResult};
use crate::fixed::{round_shr_i64, saturate_i64, scale_value};

impl MdctState {
    /// 加窗 MDCT
    ///
    /// - `input`: 新输入样本, 共享指数 `scale`
    /// - `spectrum`: 输出 `tl` 个频谱系数
    /// - `nr`: 右侧平坦区长度, 必须等于 `(tl - wrs.len()) / 2`
    ///
    /// 首次调用时假定之前全为零, 且左斜坡与 `wrs` 相同.
    /// 失败时状态保持不变.
    pub fn forward_block(
        &mut self,
        input: &[i32],
        scale: i32,
        spectrum: &mut [i32],
        tl: usize,
        nr: usize,
        wrs: &WindowSlope,
    ) -> AacEncResult<MdctOutput> {
        self.check_length(tl)?;
        let fr = wrs.len();
        if fr > tl || 2 * nr + fr != tl {
            return Err(AacEncError::InvalidTransform(format!(
                "右侧窗口几何不一致: tl={}, nr={}, fr={}",
                tl, nr, fr
            )));
        }
        if spectrum.len() < tl {
            return Err(AacEncError::InvalidTransform(format!(
                "频谱缓冲区过小: {} < {}",
                spectrum.len(),
                tl
            )));
        }

        let hist = match &self.history {
            Some(h) => h.clone(),
            None => SlopeHistory::from_right(tl, wrs),
        };
        let (buffered, ov_exp) = match self.overlap {
            Overlap::Idle => (None, scale),
            Overlap::Time { fill, exponent } => (Some(fill), exponent),
            Overlap::Freq { .. } => {
                return Err(AacEncError::InvalidTransform(
                    "合成方向的状态不能做正变换".into(),
                ));
            }
        };

        let fl = hist.prev_fr;
        let wls = &hist.prev_wrs;
        if fl > tl {
            return Err(AacEncError::InvalidTransform(format!(
                "左斜坡 {} 长于变换长度 {}",
                fl, tl
            )));
        }
        let zl = (tl - fl) / 2;
        let span = fl / 2 + tl + fr / 2;
        let fill = buffered.unwrap_or(fl);
        let consumed = span - fill;
        if input.len() < consumed {
            return Err(AacEncError::InvalidInput(format!(
                "输入样本不足: 需要 {}, 实际 {}",
                consumed,
                input.len()
            )));
        }

        // 统一到较大的指数
        let exp = ov_exp.max(scale);
        let mut seg = Vec::with_capacity(span);
        match buffered {
            Some(fill) => seg.extend(
                self.buffer[..fill]
                    .iter()
                    .map(|&v| scale_value(v, ov_exp - exp)),
            ),
            None => seg.resize(fill, 0),
        }
        seg.extend(input[..consumed].iter().map(|&v| scale_value(v, scale - exp)));

        let weight = |t: usize| -> i64 {
            if t < tl {
                if t < zl + fl {
                    wls.rising(t - zl) as i64
                } else {
                    ONE_Q31
                }
            } else {
                let r = t - tl;
                if r < nr {
                    ONE_Q31
                } else if r < nr + fr {
                    wrs.falling(r - nr) as i64
                } else {
                    0
                }
            }
        };
        // 加窗样本, 乘以 2^30
        let z = |t: usize| -> i64 {
            if t < zl || t - zl >= span {
                return 0;
            }
            (seg[t - zl] as i64 * weight(t)) >> 1
        };

        // 折叠: (a, b, c, d) -> (-c_r - d, a - b_r), 数值减半, 指数 +1
        let half = tl / 2;
        for n in 0..half {
            let u1 = -z(3 * half - 1 - n) - z(3 * half + n);
            let u2 = z(n) - z(tl - 1 - n);
            spectrum[n] = saturate_i64(round_shr_i64(u1, 31));
            spectrum[half + n] = saturate_i64(round_shr_i64(u2, 31));
        }
        let exponent = dct_iv(&mut spectrum[..tl], exp + 1)?;

        let carry = fl / 2 + tl - fr / 2;
        self.buffer[..fr].copy_from_slice(&seg[carry..]);
        self.overlap = Overlap::Time {
            fill: fr,
            exponent: exp,
        };
        self.history = Some(SlopeHistory::from_right(tl, wrs));
        trace!(
            "forward_block: tl={}, fl={}, fr={}, consumed={}, exp={}",
            tl, fl, fr, consumed, exponent
        );
        Ok(MdctOutput { consumed, exponent })
    }
}
