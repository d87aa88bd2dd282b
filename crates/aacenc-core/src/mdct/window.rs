//! 窗口斜坡表.
//!
//! 只保存窗口的上升半段 (长度 = 斜坡长度), 下降半段按逆序读取.
//! 两种形状都满足 Princen-Bradley 条件: w[k]^2 + w[len-1-k]^2 = 1.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::error::{AacEncError, AacEncResult};

/// 窗口形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowShape {
    /// 正弦窗
    #[default]
    Sine,
    /// Kaiser-Bessel 派生窗
    Kbd,
}

/// 窗口斜坡 (Q31 上升半段)
#[derive(Clone, PartialEq, Eq)]
pub struct WindowSlope {
    shape: WindowShape,
    coefs: Arc<[i32]>,
}

impl WindowSlope {
    /// 构建指定形状与长度的斜坡, 长度必须为正偶数
    pub fn new(shape: WindowShape, len: usize) -> AacEncResult<Self> {
        if len == 0 || len % 2 != 0 {
            return Err(AacEncError::InvalidTransform(format!(
                "窗口斜坡长度必须为正偶数, 实际为 {}",
                len
            )));
        }
        let values = match shape {
            WindowShape::Sine => sine_slope(len),
            WindowShape::Kbd => kbd_slope(len, kbd_alpha(len)),
        };
        let coefs: Arc<[i32]> = values.into_iter().map(to_q31).collect();
        Ok(Self { shape, coefs })
    }

    /// 正弦斜坡
    pub fn sine(len: usize) -> AacEncResult<Self> {
        Self::new(WindowShape::Sine, len)
    }

    /// KBD 斜坡
    pub fn kbd(len: usize) -> AacEncResult<Self> {
        Self::new(WindowShape::Kbd, len)
    }

    /// 形状
    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    /// 斜坡长度
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    /// 是否为空 (合法斜坡不会为空)
    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }

    /// 上升半段系数
    pub fn coefs(&self) -> &[i32] {
        &self.coefs
    }

    /// 上升方向第 k 个系数
    #[inline]
    pub fn rising(&self, k: usize) -> i32 {
        self.coefs[k]
    }

    /// 下降方向第 k 个系数
    #[inline]
    pub fn falling(&self, k: usize) -> i32 {
        self.coefs[self.coefs.len() - 1 - k]
    }
}

impl fmt::Debug for WindowSlope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowSlope")
            .field("shape", &self.shape)
            .field("len", &self.coefs.len())
            .finish()
    }
}

/// 短斜坡用更陡的 Kaiser 参数
fn kbd_alpha(len: usize) -> f64 {
    if len <= 256 { 6.0 } else { 4.0 }
}

fn to_q31(v: f64) -> i32 {
    let scaled = (v * 2147483648.0).round();
    scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

fn sine_slope(len: usize) -> Vec<f64> {
    (0..len)
        .map(|k| (PI / (2.0 * len as f64) * (k as f64 + 0.5)).sin())
        .collect()
}

/// Kaiser 原型长度为 len+1, 累积和开方得到上升半段
fn kbd_slope(len: usize, alpha: f64) -> Vec<f64> {
    let proto: Vec<f64> = (0..=len)
        .map(|n| {
            let x = 2.0 * n as f64 / len as f64 - 1.0;
            bessel_i0(PI * alpha * (1.0 - x * x).max(0.0).sqrt())
        })
        .collect();

    let mut cum = Vec::with_capacity(len + 1);
    let mut running = 0.0f64;
    for &p in &proto {
        running += p;
        cum.push(running);
    }
    let total = cum[len];
    cum[..len].iter().map(|&c| (c / total).sqrt()).collect()
}

/// 第一类修正贝塞尔函数 I0 (级数展开)
fn bessel_i0(x: f64) -> f64 {
    let half = x * 0.5;
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let mut k = 1.0f64;
    while k <= 64.0 {
        term *= (half * half) / (k * k);
        sum += term;
        if term < 1e-15 * sum {
            break;
        }
        k += 1.0;
    }
    sum
}
