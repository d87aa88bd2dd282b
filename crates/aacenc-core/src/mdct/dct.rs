//! 定点 DCT-IV.
//!
//! X[k] = sum_{n=0}^{N-1} x[n] * cos(pi/N * (n + 1/2) * (k + 1/2))
//!
//! 直接计算 (O(N^2)), 余弦表按长度懒加载并全局共享 (只读).

use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::error::{AacEncError, AacEncResult};
use crate::fixed::{block_headroom, round_shr_i64, scale_i64, significant_bits};

/// 支持的变换长度 (频谱系数个数)
pub const SUPPORTED_TRANSFORM_LENGTHS: [usize; 10] =
    [1024, 960, 512, 480, 256, 240, 128, 120, 64, 60];

/// 乘积累加前的右移量
const PRODUCT_SHIFT: u32 = 21;
/// 累加结果归一化后的有效位数
const OUTPUT_BITS: i32 = 30;

static COS_TABLES: [OnceLock<Box<[i32]>>; SUPPORTED_TRANSFORM_LENGTHS.len()] =
    [const { OnceLock::new() }; SUPPORTED_TRANSFORM_LENGTHS.len()];

/// 变换长度是否受支持
pub fn is_supported_length(n: usize) -> bool {
    SUPPORTED_TRANSFORM_LENGTHS.contains(&n)
}

/// cos(pi * m / (4N)), m ∈ [0, 2N], Q31
fn cos_table(n: usize) -> AacEncResult<&'static [i32]> {
    let slot = SUPPORTED_TRANSFORM_LENGTHS
        .iter()
        .position(|&len| len == n)
        .ok_or_else(|| AacEncError::InvalidTransform(format!("不支持的变换长度: {}", n)))?;
    let table = COS_TABLES[slot].get_or_init(|| {
        let n4 = 4.0 * n as f64;
        (0..=2 * n)
            .map(|m| {
                let v = (PI * m as f64 / n4).cos() * 2147483648.0;
                v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
            })
            .collect()
    });
    Ok(table)
}

/// 按 8N 周期折叠到四分之一表
#[inline]
fn cos_at(table: &[i32], n4: usize, m: usize) -> i64 {
    let m = if m > n4 { 2 * n4 - m } else { m };
    if m > n4 / 2 {
        -(table[n4 - m] as i64)
    } else {
        table[m] as i64
    }
}

/// 原地 DCT-IV
///
/// `data` 为共享指数 `exponent` 下的 Q31 尾数, 返回输出的共享指数.
/// 输出尾数最多 30 个有效位, 保留 1 位净空.
pub fn dct_iv(data: &mut [i32], exponent: i32) -> AacEncResult<i32> {
    let n = data.len();
    let table = cos_table(n)?;

    let headroom = block_headroom(data);
    if headroom >= 31 {
        // 全零
        return Ok(exponent);
    }
    let input: Vec<i64> = data.iter().map(|&x| (x as i64) << headroom).collect();
    let exp_in = exponent - headroom as i32;

    let n4 = 4 * n;
    let n8 = 8 * n;
    let mut acc = vec![0i64; n];
    for (k, out) in acc.iter_mut().enumerate() {
        let step = 2 * (2 * k + 1);
        let mut m = 2 * k + 1;
        let mut sum = 0i64;
        for &x in &input {
            sum += round_shr_i64(x * cos_at(table, n4, m), PRODUCT_SHIFT);
            m += step;
            if m >= n8 {
                m -= n8;
            }
        }
        *out = sum;
    }

    let peak = acc.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
    if peak == 0 {
        data.fill(0);
        return Ok(exponent);
    }
    let shift = significant_bits(peak as i64) as i32 - OUTPUT_BITS;
    for (dst, &v) in data.iter_mut().zip(&acc) {
        *dst = scale_i64(v, -shift);
    }
    // 累加值 = 真实值 * 2^(62 - PRODUCT_SHIFT - exp_in)
    Ok(exp_in + PRODUCT_SHIFT as i32 - 31 + shift)
}
