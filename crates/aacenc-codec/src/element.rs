//! 码流语法元素与声道元素间的比特分配

use aacenc_core::{AacEncError, AacEncResult, ElementInfo, ElementType};

/// 语法元素标识 (3 bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SyntaxElementId {
    Sce = 0,
    Cpe = 1,
    Cce = 2,
    Lfe = 3,
    Dse = 4,
    Pce = 5,
    Fil = 6,
    End = 7,
}

/// 语法元素标识位数
pub const ID_BITS: u32 = 3;
/// 元素实例标签位数
pub const INSTANCE_TAG_BITS: u32 = 4;
/// 单声道码流的最少比特数: 全局增益、最大谱线、TNS 与 PNS 标志
pub const MIN_CHANNEL_BITS: u32 = 8 + 11 + 1 + 1;
/// 结束元素与字节对齐预留的比特数
pub const END_AND_ALIGN_BITS: u32 = ID_BITS + 7;

impl SyntaxElementId {
    /// 声道元素对应的语法元素
    pub const fn for_element(kind: ElementType) -> Self {
        match kind {
            ElementType::Sce => Self::Sce,
            ElementType::Cpe => Self::Cpe,
            ElementType::Lfe => Self::Lfe,
        }
    }

    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// 声道元素的分配权重
pub const fn element_weight(kind: ElementType) -> u32 {
    match kind {
        ElementType::Sce => 4,
        ElementType::Cpe => 8,
        ElementType::Lfe => 1,
    }
}

/// 声道元素 (含元素头) 至少需要的比特数
pub const fn min_element_bits(kind: ElementType) -> u32 {
    let header = ID_BITS + INSTANCE_TAG_BITS;
    match kind {
        // 强度立体声标志
        ElementType::Cpe => header + 1 + 2 * MIN_CHANNEL_BITS,
        ElementType::Sce | ElementType::Lfe => header + MIN_CHANNEL_BITS,
    }
}

/// 按权重分配时, 每个声道元素都能分到最小需求所需的总比特数
pub fn min_distributable_bits(elements: &[ElementInfo]) -> u32 {
    let weight_sum: u64 = elements
        .iter()
        .map(|e| element_weight(e.kind) as u64)
        .sum();
    elements
        .iter()
        .map(|e| {
            let w = element_weight(e.kind) as u64;
            (min_element_bits(e.kind) as u64 * weight_sum).div_ceil(w) as u32
        })
        .max()
        .unwrap_or(0)
}

/// 按权重在声道元素间分配比特
///
/// 余数归最后一个元素. 任一元素分得的比特数低于其最小需求时返回错误.
pub fn distribute_bits(elements: &[ElementInfo], total: u32) -> AacEncResult<Vec<u32>> {
    let weight_sum: u64 = elements
        .iter()
        .map(|e| element_weight(e.kind) as u64)
        .sum();
    if weight_sum == 0 {
        return Err(AacEncError::InvalidElementInfoType(
            "声道元素列表为空".into(),
        ));
    }
    let mut shares: Vec<u32> = elements
        .iter()
        .map(|e| (total as u64 * element_weight(e.kind) as u64 / weight_sum) as u32)
        .collect();
    let assigned: u32 = shares.iter().sum();
    if let Some(last) = shares.last_mut() {
        *last += total - assigned;
    }
    for (info, &share) in elements.iter().zip(&shares) {
        if share < min_element_bits(info.kind) {
            return Err(AacEncError::InvalidChannelBitrate(share as i32));
        }
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use aacenc_core::ChannelMode;

    use super::*;

    #[test]
    fn test_按权重分配() {
        let elements = ChannelMode::Mode1_2_2_1.elements();
        // SCE 4 + CPE 8 + CPE 8 + LFE 1 = 21
        let shares = distribute_bits(&elements, 2100).unwrap();
        assert_eq!(shares, vec![400, 800, 800, 100]);
        let shares = distribute_bits(&elements, 2105).unwrap();
        assert_eq!(shares.iter().sum::<u32>(), 2105);
    }

    #[test]
    fn test_比特不足() {
        let elements = ChannelMode::Mode2.elements();
        assert_eq!(
            distribute_bits(&elements, 40),
            Err(AacEncError::InvalidChannelBitrate(40))
        );
        assert!(distribute_bits(&elements, min_element_bits(ElementType::Cpe)).is_ok());
    }

    #[test]
    fn test_最少可分配比特() {
        for mode in ChannelMode::ALL {
            let elements = mode.elements();
            let total = min_distributable_bits(&elements);
            assert!(distribute_bits(&elements, total).is_ok(), "{mode}");
        }
        // 单声道: 只有一个 SCE
        assert_eq!(min_distributable_bits(&ChannelMode::Mode1.elements()), 28);
        // SCE 4 + CPE 8 + CPE 8 + LFE 1 = 21, LFE 需要 28 * 21
        assert_eq!(min_distributable_bits(&ChannelMode::Mode1_2_2_1.elements()), 588);
        assert_eq!(min_distributable_bits(&ChannelMode::Mode2.elements()), 50);
    }

    #[test]
    fn test_元素标识() {
        assert_eq!(SyntaxElementId::for_element(ElementType::Lfe).as_u32(), 3);
        assert_eq!(SyntaxElementId::Fil.as_u32(), 6);
        assert_eq!(SyntaxElementId::End.as_u32(), 7);
    }
}
