//! 定点运算与块浮点表示.
//!
//! 所有样本与频谱值均为 Q31 定点小数, 每个数据块额外携带一个共享指数:
//! 真实值 = 尾数 / 2^31 * 2^指数.
//!
//! 缩放过程中的溢出一律饱和到可表示范围, 不会回绕.

use std::ops::Mul;

/// 定点字长
pub const DFRACT_BITS: u32 = 32;
/// PCM 样本位宽
pub const SAMPLE_BITS: u32 = 16;
/// 逆变换输出额外保留的净空位数
pub const MDCT_OUT_HEADROOM: u32 = 2;
/// 输出格式到 16 位 PCM 的右移量
pub const MDCT_OUTPUT_SCALE: u32 = DFRACT_BITS - SAMPLE_BITS - MDCT_OUT_HEADROOM;

/// 饱和到 i32 范围
#[inline]
pub fn saturate_i64(x: i64) -> i32 {
    x.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// 四舍五入右移 (shift 为 0 时原样返回)
#[inline]
pub fn round_shr_i64(x: i64, shift: u32) -> i64 {
    match shift {
        0 => x,
        s if s >= 63 => 0,
        s => (x + (1i64 << (s - 1))) >> s,
    }
}

/// 按有符号移位量缩放并饱和到 i32
///
/// `shift > 0` 左移, `shift < 0` 四舍五入右移.
#[inline]
pub fn scale_i64(x: i64, shift: i32) -> i32 {
    if shift >= 0 {
        let s = shift as u32;
        if x == 0 {
            return 0;
        }
        if s >= 32 {
            return if x > 0 { i32::MAX } else { i32::MIN };
        }
        saturate_i64(x.saturating_mul(1i64 << s))
    } else {
        saturate_i64(round_shr_i64(x, shift.unsigned_abs()))
    }
}

/// 按有符号移位量缩放 i32 值 (饱和)
#[inline]
pub fn scale_value(x: i32, shift: i32) -> i32 {
    scale_i64(x as i64, shift)
}

/// 原地缩放整个数据块 (饱和)
pub fn scale_block(values: &mut [i32], shift: i32) {
    if shift == 0 {
        return;
    }
    for v in values.iter_mut() {
        *v = scale_value(*v, shift);
    }
}

/// Q31 乘法, 四舍五入, 饱和
#[inline]
pub fn fmult(a: i32, b: i32) -> i32 {
    saturate_i64(round_shr_i64(a as i64 * b as i64, 31))
}

/// 冗余符号位个数 (0 值返回 31)
#[inline]
pub fn count_leading_sign(x: i32) -> u32 {
    if x == 0 {
        return DFRACT_BITS - 1;
    }
    (x ^ (x >> 31)).leading_zeros() - 1
}

/// 数据块的公共净空 (全零块返回 31)
pub fn block_headroom(values: &[i32]) -> u32 {
    values
        .iter()
        .map(|&v| count_leading_sign(v))
        .min()
        .unwrap_or(DFRACT_BITS - 1)
}

/// i64 绝对值的有效位数
#[inline]
pub fn significant_bits(x: i64) -> u32 {
    64 - x.unsigned_abs().leading_zeros()
}

/// 16 位 PCM 转 Q31 (指数 0)
#[inline]
pub fn pcm16_to_fixp(s: i16) -> i32 {
    (s as i32) << (DFRACT_BITS - SAMPLE_BITS)
}

/// 逆变换输出格式转 16 位 PCM (四舍五入, 饱和)
#[inline]
pub fn fixp_to_pcm16(x: i32) -> i16 {
    round_shr_i64(x as i64, MDCT_OUTPUT_SCALE).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// 块浮点标量: 尾数 (Q31) 与指数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFloat {
    /// Q31 尾数
    pub mantissa: i32,
    /// 二进制指数
    pub exponent: i32,
}

impl BlockFloat {
    /// 零值
    pub const ZERO: Self = Self {
        mantissa: 0,
        exponent: 0,
    };

    /// 创建块浮点值
    pub const fn new(mantissa: i32, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    /// 用整数比值 `num / den` 构造 (den > 0), 尾数归一化到 [0.5, 1)
    pub fn from_ratio(num: u32, den: u32) -> Self {
        if num == 0 || den == 0 {
            return Self::ZERO;
        }
        // num / den < 2^exponent
        let exponent = (32 - num.leading_zeros()) as i32 - (32 - den.leading_zeros()) as i32 + 1;
        let shift = 31 - exponent;
        let scaled = if shift >= 0 {
            (((num as u128) << shift) + den as u128 / 2) / den as u128
        } else {
            ((num >> shift.unsigned_abs()) as u128 + den as u128 / 2) / den as u128
        };
        let mut value = Self {
            mantissa: scaled.min(i32::MAX as u128) as i32,
            exponent,
        };
        value.normalize();
        value
    }

    /// 归一化尾数, 保持真实值不变
    pub fn normalize(&mut self) {
        if self.mantissa == 0 {
            self.exponent = 0;
            return;
        }
        let h = count_leading_sign(self.mantissa);
        self.mantissa <<= h;
        self.exponent -= h as i32;
    }

    /// 转换到指定指数下的尾数 (饱和)
    pub fn to_exponent(self, exponent: i32) -> i32 {
        scale_value(self.mantissa, self.exponent - exponent)
    }
}

impl Mul for BlockFloat {
    type Output = BlockFloat;

    fn mul(self, rhs: BlockFloat) -> BlockFloat {
        let mut out = BlockFloat {
            mantissa: fmult(self.mantissa, rhs.mantissa),
            exponent: self.exponent + rhs.exponent,
        };
        out.normalize();
        out
    }
}
