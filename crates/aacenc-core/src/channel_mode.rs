//! 声道模式与声道元素划分.
//!
//! 每种声道模式对应一组固定的声道元素 (SCE/CPE/LFE), 输入声道按 MPEG 顺序
//! 依次分配给这些元素. 采用 WAV 声道顺序的输入会在去交错时重排.

use std::fmt;

/// 声道元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 单声道元素
    Sce,
    /// 声道对元素
    Cpe,
    /// 低频效果元素
    Lfe,
}

impl ElementType {
    /// 元素包含的声道数
    pub const fn channels(self) -> usize {
        match self {
            Self::Cpe => 2,
            Self::Sce | Self::Lfe => 1,
        }
    }
}

/// 声道元素描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    /// 元素类型
    pub kind: ElementType,
    /// 同类元素内的实例标签
    pub instance_tag: u8,
    /// 元素首声道在 MPEG 顺序中的下标
    pub channel_offset: usize,
}

/// 输入声道排列约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelOrder {
    /// MPEG 顺序 (中置在前)
    #[default]
    Mpeg,
    /// WAV 文件顺序 (左右在前)
    Wav,
}

/// 声道模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelMode {
    /// 单声道: C
    Mode1,
    /// 立体声: L R
    Mode2,
    /// 3 声道: C, L R
    Mode1_2,
    /// 4 声道: C, L R, S
    Mode1_2_1,
    /// 5 声道: C, L R, Ls Rs
    Mode1_2_2,
    /// 5.1: C, L R, Ls Rs, LFE
    Mode1_2_2_1,
    /// 7.1: C, Lc Rc, L R, Ls Rs, LFE
    Mode1_2_2_2_1,
}

impl ChannelMode {
    /// 全部声道模式
    pub const ALL: [ChannelMode; 7] = [
        Self::Mode1,
        Self::Mode2,
        Self::Mode1_2,
        Self::Mode1_2_1,
        Self::Mode1_2_2,
        Self::Mode1_2_2_1,
        Self::Mode1_2_2_2_1,
    ];

    /// 按声道数选择默认模式
    pub const fn from_channels(channels: u32) -> Option<Self> {
        Some(match channels {
            1 => Self::Mode1,
            2 => Self::Mode2,
            3 => Self::Mode1_2,
            4 => Self::Mode1_2_1,
            5 => Self::Mode1_2_2,
            6 => Self::Mode1_2_2_1,
            8 => Self::Mode1_2_2_2_1,
            _ => return None,
        })
    }

    /// 声道总数
    pub const fn channels(self) -> u32 {
        match self {
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode1_2 => 3,
            Self::Mode1_2_1 => 4,
            Self::Mode1_2_2 => 5,
            Self::Mode1_2_2_1 => 6,
            Self::Mode1_2_2_2_1 => 8,
        }
    }

    /// 有效声道数 (不计 LFE)
    pub const fn effective_channels(self) -> u32 {
        match self {
            Self::Mode1_2_2_1 | Self::Mode1_2_2_2_1 => self.channels() - 1,
            _ => self.channels(),
        }
    }

    /// MPEG-4 声道配置索引
    pub const fn channel_config(self) -> u8 {
        match self {
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode1_2 => 3,
            Self::Mode1_2_1 => 4,
            Self::Mode1_2_2 => 5,
            Self::Mode1_2_2_1 => 6,
            Self::Mode1_2_2_2_1 => 7,
        }
    }

    fn element_types(self) -> &'static [ElementType] {
        use ElementType::*;
        match self {
            Self::Mode1 => &[Sce],
            Self::Mode2 => &[Cpe],
            Self::Mode1_2 => &[Sce, Cpe],
            Self::Mode1_2_1 => &[Sce, Cpe, Sce],
            Self::Mode1_2_2 => &[Sce, Cpe, Cpe],
            Self::Mode1_2_2_1 => &[Sce, Cpe, Cpe, Lfe],
            Self::Mode1_2_2_2_1 => &[Sce, Cpe, Cpe, Cpe, Lfe],
        }
    }

    /// 声道元素个数
    pub fn element_count(self) -> usize {
        self.element_types().len()
    }

    /// 声道元素列表 (码流中的顺序)
    pub fn elements(self) -> Vec<ElementInfo> {
        let mut tags = [0u8; 3];
        let mut offset = 0;
        self.element_types()
            .iter()
            .map(|&kind| {
                let slot = match kind {
                    ElementType::Sce => 0,
                    ElementType::Cpe => 1,
                    ElementType::Lfe => 2,
                };
                let info = ElementInfo {
                    kind,
                    instance_tag: tags[slot],
                    channel_offset: offset,
                };
                tags[slot] += 1;
                offset += kind.channels();
                info
            })
            .collect()
    }

    /// WAV 顺序到 MPEG 顺序的映射: MPEG 声道 i 取自 WAV 声道 `map[i]`
    pub const fn wav_to_mpeg(self) -> &'static [usize] {
        match self {
            Self::Mode1 => &[0],
            Self::Mode2 => &[0, 1],
            Self::Mode1_2 => &[2, 0, 1],
            Self::Mode1_2_1 => &[2, 0, 1, 3],
            Self::Mode1_2_2 => &[2, 0, 1, 3, 4],
            Self::Mode1_2_2_1 => &[2, 0, 1, 4, 5, 3],
            Self::Mode1_2_2_2_1 => &[2, 0, 1, 6, 7, 4, 5, 3],
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mode1 => "1",
            Self::Mode2 => "2",
            Self::Mode1_2 => "1+2",
            Self::Mode1_2_1 => "1+2+1",
            Self::Mode1_2_2 => "1+2+2",
            Self::Mode1_2_2_1 => "1+2+2+1",
            Self::Mode1_2_2_2_1 => "1+2+2+2+1",
        };
        write!(f, "{name}")
    }
}
