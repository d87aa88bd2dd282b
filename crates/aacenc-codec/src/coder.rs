//! 声道元素编码.
//!
//! [`ChannelCoder`] 负责把一个声道元素的频谱写成码流, 编码流程只关心它消耗的
//! 比特数. 默认实现 [`UniformCoder`] 对整块频谱使用同一个量化步长, 通过
//! 码率循环逐步加大步长直到满足比特上限.
//!
//! 单声道码流语法:
//!
//! | 字段 | 位数 |
//! |------|------|
//! | global_gain | 8 |
//! | max_line | 11 |
//! | tns_present (+ tns_coef) | 1 (+4) |
//! | pns_present (+ pns_start + pns_level) | 1 (+11 +9) |
//! | 谱线 | 变长 |
//!
//! 声道对元素在两个声道之前写出强度立体声信息: 1 bit 标志 (+ 11 bit 起始谱线
//! + 5 bit 位置).

use aacenc_core::fixed::{round_shr_i64, saturate_i64, significant_bits};
use aacenc_core::{AacEncError, AacEncResult, BitWriter, ElementType};

use crate::config::ToolFlags;

/// 全局增益的零点偏移
pub const GLOBAL_GAIN_OFFSET: i32 = 100;
/// PNS 能量的零点偏移
const PNS_LEVEL_OFFSET: i32 = 256;
/// 谱线最大量化幅度
const MAX_QUANT: i64 = 127;
/// 启用 PNS/强度立体声所需的最少编码谱线数
const MIN_TOOL_LINES: usize = 16;
/// 相关统计前的右移量, 避免 i64 累加溢出
const STAT_SHIFT: u32 = 16;

/// 单声道频谱: 块浮点尾数与共享指数
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpectrum<'a> {
    pub lines: &'a [i32],
    pub exponent: i32,
}

/// 编码一个声道元素所需的上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoderContext {
    /// 配置启用的编码工具
    pub tools: ToolFlags,
    /// 带宽对应的谱线数, 之上的谱线不编码
    pub bandwidth_lines: usize,
}

/// 声道元素编码器
pub trait ChannelCoder: Send {
    /// 编码器名称
    fn name(&self) -> &str;

    /// 写出一个声道元素的内容 (不含元素标识与实例标签)
    ///
    /// 写出比特数不得超过 `max_bits`, 返回实际写出的比特数.
    fn encode_element(
        &mut self,
        kind: ElementType,
        channels: &[ChannelSpectrum<'_>],
        ctx: &CoderContext,
        max_bits: u32,
        writer: &mut BitWriter,
    ) -> AacEncResult<u32>;
}

/// 元素类型允许使用的编码工具: 强度立体声只用于声道对, LFE 不用 TNS/PNS
pub fn element_tools(kind: ElementType, tools: ToolFlags) -> ToolFlags {
    match kind {
        ElementType::Cpe => tools,
        ElementType::Sce => tools - ToolFlags::INTENSITY,
        ElementType::Lfe => tools - ToolFlags::INTENSITY - ToolFlags::TNS - ToolFlags::PNS,
    }
}

/// 谱线幅度的变长码长度
#[inline]
fn line_bits(q: i32) -> u32 {
    match q.unsigned_abs() {
        0 => 1,
        1 => 3,
        2..=3 => 5,
        4..=7 => 7,
        _ => 12,
    }
}

/// 写出一条谱线: 前缀 + 幅度余数 + 符号
fn write_line(writer: &mut BitWriter, q: i32) {
    let abs_q = q.unsigned_abs();
    let sign = u32::from(q < 0);
    match abs_q {
        0 => writer.write_bit(false),
        1 => writer.write_bits(0b100 | sign, 3),
        2..=3 => writer.write_bits(0b11000 | (abs_q - 2) << 1 | sign, 5),
        4..=7 => writer.write_bits(0b1110000 | (abs_q - 4) << 1 | sign, 7),
        _ => {
            writer.write_bits(0b1111, 4);
            writer.write_bits(abs_q - 8, 7);
            writer.write_bit(sign == 1);
        }
    }
}

/// 一阶 TNS 预测: 返回量化系数 (-7..=7), 预测增益不足时返回 `None`
fn tns_coefficient(lines: &[i32]) -> Option<i32> {
    if lines.len() < 2 {
        return None;
    }
    let (mut r0, mut r1) = (0i64, 0i64);
    let mut prev = 0i64;
    for &x in lines {
        let v = (x >> STAT_SHIFT) as i64;
        r0 += v * v;
        r1 += v * prev;
        prev = v;
    }
    if r0 == 0 {
        return None;
    }
    let idx = ((8 * r1 + r0 / 2).div_euclid(r0)).clamp(-7, 7) as i32;
    if idx.abs() >= 2 { Some(idx) } else { None }
}

/// 按一阶预测系数 `idx / 8` 原地求残差 (从高频往低频, 使用原始值)
fn apply_tns(lines: &mut [i32], idx: i32) {
    for k in (1..lines.len()).rev() {
        let pred = (idx as i64 * lines[k - 1] as i64) >> 3;
        lines[k] = saturate_i64(lines[k] as i64 - pred);
    }
}

/// 区间平均幅度的以 2 为底的对数 (真实值), 全零返回 `None`
fn mean_level_log2(lines: &[i32], exponent: i32) -> Option<i32> {
    if lines.is_empty() {
        return None;
    }
    let sum: i64 = lines.iter().map(|&x| x.unsigned_abs() as i64).sum();
    let mean = sum / lines.len() as i64;
    if mean == 0 {
        return None;
    }
    Some(significant_bits(mean) as i32 - 1 + exponent - 31)
}

/// 强度立体声参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IntensityInfo {
    start: usize,
    /// 右声道相对左声道的电平差 (对数, 5 bit 有符号)
    position: i32,
}

/// 两个声道高频部分高度相关时启用强度立体声
fn intensity_info(left: &ChannelSpectrum<'_>, right: &ChannelSpectrum<'_>, band: usize) -> Option<IntensityInfo> {
    if band < 2 * MIN_TOOL_LINES {
        return None;
    }
    let start = band / 2;
    let l = &left.lines[start..band];
    let r = &right.lines[start..band];
    // 指数不同时先对齐到较大者
    let el = left.exponent.max(right.exponent);
    let sl = (el - left.exponent) as u32 + STAT_SHIFT;
    let sr = (el - right.exponent) as u32 + STAT_SHIFT;
    let (mut ll, mut rr, mut lr) = (0i128, 0i128, 0i128);
    for (&a, &b) in l.iter().zip(r) {
        let a = (a as i64 >> sl.min(63)) as i128;
        let b = (b as i64 >> sr.min(63)) as i128;
        ll += a * a;
        rr += b * b;
        lr += a * b;
    }
    if ll == 0 || rr == 0 || lr <= 0 {
        return None;
    }
    // 相关系数 >= 0.9
    if 100 * lr * lr < 81 * ll * rr {
        return None;
    }
    let level_l = mean_level_log2(l, left.exponent)?;
    let level_r = mean_level_log2(r, right.exponent)?;
    Some(IntensityInfo {
        start,
        position: (level_r - level_l).clamp(-16, 15),
    })
}

/// 单声道的编码计划 (量化前)
#[derive(Debug, Clone)]
struct ChannelPlan {
    /// 经 TNS 处理后的谱线
    lines: Vec<i32>,
    exponent: i32,
    /// 编码区间上界
    coded_end: usize,
    tns: Option<i32>,
    /// PNS 起始谱线与能量
    pns: Option<(usize, i32)>,
    /// 使幅度不超过 [`MAX_QUANT`] 的最小步长
    base_shift: u32,
}

impl ChannelPlan {
    fn new(
        spectrum: &ChannelSpectrum<'_>,
        tools: ToolFlags,
        band: usize,
        coded_end: usize,
    ) -> AacEncResult<Self> {
        let mut lines = spectrum.lines[..band].to_vec();
        let mut coded_end = coded_end.min(band);

        let pns = if tools.contains(ToolFlags::PNS) && coded_end >= 2 * MIN_TOOL_LINES {
            let start = coded_end * 3 / 4;
            match mean_level_log2(&lines[start..coded_end], spectrum.exponent) {
                Some(level) => {
                    let level = level + PNS_LEVEL_OFFSET;
                    if !(0..512).contains(&level) {
                        return Err(AacEncError::PnsTableError(level));
                    }
                    Some((start, level))
                }
                None => None,
            }
        } else {
            None
        };
        if let Some((start, _)) = pns {
            coded_end = start;
        }

        let tns = if tools.contains(ToolFlags::TNS) {
            tns_coefficient(&lines[..coded_end])
        } else {
            None
        };
        if let Some(idx) = tns {
            apply_tns(&mut lines[..coded_end], idx);
        }

        let peak = lines[..coded_end]
            .iter()
            .map(|&x| x.unsigned_abs())
            .max()
            .unwrap_or(0);
        let base_shift = (significant_bits(peak as i64)).saturating_sub(7);
        Ok(Self {
            lines,
            exponent: spectrum.exponent,
            coded_end,
            tns,
            pns,
            base_shift,
        })
    }

    fn quantize(&self, shift: u32) -> Vec<i32> {
        self.lines[..self.coded_end]
            .iter()
            .map(|&x| round_shr_i64(x as i64, shift).clamp(-MAX_QUANT, MAX_QUANT) as i32)
            .collect()
    }

    /// 边信息比特数 (不含 max_line)
    fn side_bits(&self) -> u32 {
        let tns = 1 + if self.tns.is_some() { 4 } else { 0 };
        let pns = 1 + if self.pns.is_some() { 11 + 9 } else { 0 };
        8 + tns + pns
    }
}

/// 量化结果
#[derive(Debug, Clone)]
struct QuantizedChannel {
    values: Vec<i32>,
    max_line: usize,
    global_gain: i32,
    spectral_bits: u32,
}

fn quantize_channel(plan: &ChannelPlan, shift: u32) -> QuantizedChannel {
    let values = plan.quantize(shift);
    let max_line = values.iter().rposition(|&q| q != 0).map_or(0, |i| i + 1);
    let spectral_bits = values[..max_line].iter().map(|&q| line_bits(q)).sum();
    let global_gain = if max_line == 0 {
        GLOBAL_GAIN_OFFSET
    } else {
        GLOBAL_GAIN_OFFSET + shift as i32 + plan.exponent - 31
    };
    QuantizedChannel {
        values,
        max_line,
        global_gain,
        spectral_bits,
    }
}

/// 统一步长量化编码器
#[derive(Debug, Clone, Default)]
pub struct UniformCoder {
    /// 最近一次编码的步长增量
    last_offset: u32,
}

impl UniformCoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次编码相对初始步长加大的量
    pub fn last_offset(&self) -> u32 {
        self.last_offset
    }

    fn element_bits(intensity: Option<IntensityInfo>, kind: ElementType, plans: &[ChannelPlan], quants: &[QuantizedChannel]) -> u32 {
        intensity_bits(kind, intensity)
            + plans
                .iter()
                .zip(quants)
                .map(|(p, q)| p.side_bits() + 11 + q.spectral_bits)
                .sum::<u32>()
    }
}

/// 强度立体声信息的比特数
fn intensity_bits(kind: ElementType, intensity: Option<IntensityInfo>) -> u32 {
    match (kind, intensity) {
        (ElementType::Cpe, Some(_)) => 1 + 11 + 5,
        (ElementType::Cpe, None) => 1,
        _ => 0,
    }
}

/// 在剩余容量内写出一段码流
///
/// 估算比特数超出 `remaining` 时不写出并返回 `err`; 写出后与估算不符同样返回
/// `err`. 成功时从 `remaining` 扣除写出的比特数.
fn write_section(
    writer: &mut BitWriter,
    predicted: u32,
    remaining: &mut u32,
    err: AacEncError,
    write: impl FnOnce(&mut BitWriter),
) -> AacEncResult<()> {
    if predicted > *remaining {
        return Err(err);
    }
    let start = writer.bits_written();
    write(writer);
    if (writer.bits_written() - start) as u32 != predicted {
        return Err(err);
    }
    *remaining -= predicted;
    Ok(())
}

/// 写出一个声道: 全局增益、最大谱线、工具边信息、谱线
fn write_channel(
    writer: &mut BitWriter,
    plan: &ChannelPlan,
    quant: &QuantizedChannel,
    remaining: &mut u32,
) -> AacEncResult<()> {
    if !(0..256).contains(&quant.global_gain) {
        return Err(AacEncError::GlobalGainTooHigh(quant.global_gain));
    }
    write_section(writer, 8, remaining, AacEncError::WriteScalError, |w| {
        w.write_bits(quant.global_gain as u32, 8)
    })?;
    write_section(writer, 11, remaining, AacEncError::WriteSecError, |w| {
        w.write_bits(quant.max_line as u32, 11)
    })?;
    write_section(writer, plan.side_bits() - 8, remaining, AacEncError::WriteScalError, |w| {
        w.write_bit(plan.tns.is_some());
        if let Some(idx) = plan.tns {
            w.write_bits(idx as u32, 4);
        }
        w.write_bit(plan.pns.is_some());
        if let Some((pns_start, level)) = plan.pns {
            w.write_bits(pns_start as u32, 11);
            w.write_bits(level as u32, 9);
        }
    })?;
    write_section(writer, quant.spectral_bits, remaining, AacEncError::WriteSpecError, |w| {
        for &q in &quant.values[..quant.max_line] {
            write_line(w, q);
        }
    })
}

impl ChannelCoder for UniformCoder {
    fn name(&self) -> &str {
        "uniform"
    }

    fn encode_element(
        &mut self,
        kind: ElementType,
        channels: &[ChannelSpectrum<'_>],
        ctx: &CoderContext,
        max_bits: u32,
        writer: &mut BitWriter,
    ) -> AacEncResult<u32> {
        if channels.len() != kind.channels() {
            return Err(AacEncError::InvalidElementInfoType(format!(
                "{:?} 需要 {} 个声道, 实际 {}",
                kind,
                kind.channels(),
                channels.len()
            )));
        }
        let tools = element_tools(kind, ctx.tools);
        let band = channels
            .iter()
            .map(|c| c.lines.len())
            .min()
            .unwrap_or(0)
            .min(ctx.bandwidth_lines)
            .min(0x7FF);

        let intensity = if tools.contains(ToolFlags::INTENSITY) {
            intensity_info(&channels[0], &channels[1], band)
        } else {
            None
        };
        let plans = channels
            .iter()
            .enumerate()
            .map(|(ch, spectrum)| {
                let end = match intensity {
                    Some(info) if ch == 1 => info.start,
                    _ => band,
                };
                ChannelPlan::new(spectrum, tools, band, end)
            })
            .collect::<AacEncResult<Vec<_>>>()?;

        // 码率循环: 步长每次加 2, 直到满足上限或全部谱线为零
        let mut offset = 0u32;
        let mut quants: Vec<QuantizedChannel>;
        loop {
            quants = plans
                .iter()
                .map(|p| quantize_channel(p, p.base_shift + offset))
                .collect();
            let bits = Self::element_bits(intensity, kind, &plans, &quants);
            if bits <= max_bits {
                break;
            }
            if quants.iter().all(|q| q.max_line == 0) {
                return Err(AacEncError::QuantError {
                    used: bits,
                    allowed: max_bits,
                });
            }
            offset += 2;
        }
        // 细化: 尝试回退一级步长
        if tools.contains(ToolFlags::REQUANT) && offset > 0 {
            let finer: Vec<QuantizedChannel> = plans
                .iter()
                .map(|p| quantize_channel(p, p.base_shift + offset - 1))
                .collect();
            if Self::element_bits(intensity, kind, &plans, &finer) <= max_bits {
                quants = finer;
                offset -= 1;
            }
        }
        self.last_offset = offset;

        let expected = Self::element_bits(intensity, kind, &plans, &quants);
        let start = writer.bits_written();
        let mut remaining = max_bits;

        if kind == ElementType::Cpe {
            let predicted = intensity_bits(kind, intensity);
            write_section(writer, predicted, &mut remaining, AacEncError::WriteSecError, |w| {
                w.write_bit(intensity.is_some());
                if let Some(info) = intensity {
                    w.write_bits(info.start as u32, 11);
                    w.write_bits(info.position as u32, 5);
                }
            })?;
        }

        for (plan, quant) in plans.iter().zip(&quants) {
            write_channel(writer, plan, quant, &mut remaining)?;
        }

        let written = (writer.bits_written() - start) as u32;
        if written != expected {
            return Err(AacEncError::WrittenBitsError { expected, written });
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, amplitude: i32, period: usize) -> Vec<i32> {
        (0..len)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i % period) as f64 / period as f64;
                (amplitude as f64 * phase.sin()) as i32
            })
            .collect()
    }

    fn ctx(tools: ToolFlags) -> CoderContext {
        CoderContext {
            tools,
            bandwidth_lines: 1024,
        }
    }

    #[test]
    fn test_谱线码长() {
        for q in [-127, -9, -8, -7, -4, -3, -2, -1, 0, 1, 2, 3, 4, 7, 8, 127] {
            let mut writer = BitWriter::new();
            write_line(&mut writer, q);
            assert_eq!(writer.bits_written() as u32, line_bits(q), "q={q}");
        }
    }

    #[test]
    fn test_静音只写边信息() {
        let zeros = vec![0i32; 1024];
        let spectrum = ChannelSpectrum {
            lines: &zeros,
            exponent: 10,
        };
        let mut coder = UniformCoder::new();
        let mut writer = BitWriter::new();
        let bits = coder
            .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::all()), 1000, &mut writer)
            .unwrap();
        // 增益 8 + max_line 11 + TNS 标志 1 + PNS 标志 1
        assert_eq!(bits, 21);
        assert_eq!(writer.bits_written(), 21);
    }

    #[test]
    fn test_码率循环满足上限() {
        let lines = tone(1024, 1 << 28, 7);
        let spectrum = ChannelSpectrum {
            lines: &lines,
            exponent: 5,
        };
        for max_bits in [200u32, 1000, 3000, 20000] {
            let mut coder = UniformCoder::new();
            let mut writer = BitWriter::new();
            let bits = coder
                .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::empty()), max_bits, &mut writer)
                .unwrap();
            assert!(bits <= max_bits);
            assert_eq!(writer.bits_written() as u32, bits);
        }
    }

    #[test]
    fn test_细化使用更多比特() {
        let lines = tone(1024, 1 << 28, 13);
        let spectrum = ChannelSpectrum {
            lines: &lines,
            exponent: 5,
        };
        let mut plain = UniformCoder::new();
        let mut refined = UniformCoder::new();
        let a = plain
            .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::empty()), 3000, &mut BitWriter::new())
            .unwrap();
        let b = refined
            .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::REQUANT), 3000, &mut BitWriter::new())
            .unwrap();
        assert!(b >= a);
        assert!(refined.last_offset() <= plain.last_offset());
    }

    #[test]
    fn test_上限过低() {
        let zeros = vec![0i32; 64];
        let spectrum = ChannelSpectrum {
            lines: &zeros,
            exponent: 0,
        };
        let err = UniformCoder::new()
            .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::empty()), 10, &mut BitWriter::new())
            .unwrap_err();
        assert_eq!(err, AacEncError::QuantError { used: 21, allowed: 10 });
    }

    #[test]
    fn test_全局增益过高() {
        let lines = tone(256, 1 << 30, 5);
        let spectrum = ChannelSpectrum {
            lines: &lines,
            exponent: 200,
        };
        let err = UniformCoder::new()
            .encode_element(ElementType::Sce, &[spectrum], &ctx(ToolFlags::empty()), 100000, &mut BitWriter::new())
            .unwrap_err();
        assert!(matches!(err, AacEncError::GlobalGainTooHigh(_)));
    }

    #[test]
    fn test_强度立体声只用于声道对() {
        assert_eq!(element_tools(ElementType::Sce, ToolFlags::all()), ToolFlags::TNS | ToolFlags::PNS | ToolFlags::REQUANT);
        assert_eq!(element_tools(ElementType::Lfe, ToolFlags::all()), ToolFlags::REQUANT);
        assert_eq!(element_tools(ElementType::Cpe, ToolFlags::all()), ToolFlags::all());

        let lines = tone(1024, 1 << 26, 9);
        let left = ChannelSpectrum {
            lines: &lines,
            exponent: 3,
        };
        let right = ChannelSpectrum {
            lines: &lines,
            exponent: 2,
        };
        let info = intensity_info(&left, &right, 1024).unwrap();
        assert_eq!(info.start, 512);
        assert_eq!(info.position, -1);

        let mut with_is = BitWriter::new();
        let mut without_is = BitWriter::new();
        let a = UniformCoder::new()
            .encode_element(ElementType::Cpe, &[left, right], &ctx(ToolFlags::INTENSITY), 50000, &mut with_is)
            .unwrap();
        let b = UniformCoder::new()
            .encode_element(ElementType::Cpe, &[left, right], &ctx(ToolFlags::empty()), 50000, &mut without_is)
            .unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_声道数不匹配() {
        let zeros = vec![0i32; 64];
        let spectrum = ChannelSpectrum {
            lines: &zeros,
            exponent: 0,
        };
        let err = UniformCoder::new()
            .encode_element(ElementType::Cpe, &[spectrum], &ctx(ToolFlags::empty()), 1000, &mut BitWriter::new())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    fn quantized_tone() -> (ChannelPlan, QuantizedChannel) {
        let lines = tone(256, 1 << 26, 11);
        let spectrum = ChannelSpectrum {
            lines: &lines,
            exponent: 4,
        };
        let plan = ChannelPlan::new(&spectrum, ToolFlags::empty(), 256, 256).unwrap();
        let quant = quantize_channel(&plan, plan.base_shift);
        (plan, quant)
    }

    #[test]
    fn test_分段写出受容量限制() {
        let (plan, quant) = quantized_tone();
        assert!(quant.max_line > 0);
        let total = plan.side_bits() + 11 + quant.spectral_bits;

        let mut remaining = total;
        let mut writer = BitWriter::new();
        write_channel(&mut writer, &plan, &quant, &mut remaining).unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(writer.bits_written() as u32, total);

        // 依次在增益、最大谱线、边信息、谱线处耗尽容量
        let cases = [
            (7, AacEncError::WriteScalError),
            (8 + 10, AacEncError::WriteSecError),
            (8 + 11 + 1, AacEncError::WriteScalError),
            (total - 1, AacEncError::WriteSpecError),
        ];
        for (capacity, err) in cases {
            let mut remaining = capacity;
            let mut writer = BitWriter::new();
            assert_eq!(write_channel(&mut writer, &plan, &quant, &mut remaining), Err(err), "{capacity}");
            // 超出容量的一段不会写出
            assert!(writer.bits_written() as u32 <= capacity);
        }
    }

    #[test]
    fn test_码长估算不符() {
        let (plan, mut quant) = quantized_tone();
        quant.spectral_bits -= 1;
        let mut remaining = u32::MAX;
        assert_eq!(
            write_channel(&mut BitWriter::new(), &plan, &quant, &mut remaining),
            Err(AacEncError::WriteSpecError)
        );

        let mut remaining = 100;
        let mut writer = BitWriter::new();
        let err = write_section(&mut writer, 5, &mut remaining, AacEncError::WriteSecError, |w| {
            w.write_bits(0, 6)
        });
        assert_eq!(err, Err(AacEncError::WriteSecError));
        assert_eq!(remaining, 100);
        let err = write_section(&mut writer, 101, &mut remaining, AacEncError::WriteSecError, |w| {
            w.write_bits(0, 1)
        });
        assert_eq!(err, Err(AacEncError::WriteSecError));
        assert_eq!(writer.bits_written(), 6);
    }

    #[test]
    fn test_tns_预测() {
        // 平滑谱: 相邻谱线强相关
        let lines: Vec<i32> = (0..256).map(|i| (1000 - i) << 18).collect();
        assert_eq!(tns_coefficient(&lines), Some(7));
        let alternating: Vec<i32> = (0..256).map(|i| if i % 2 == 0 { 1 << 24 } else { -(1 << 24) }).collect();
        assert_eq!(tns_coefficient(&alternating), Some(-7));
        assert_eq!(tns_coefficient(&[0; 16]), None);
    }
}
