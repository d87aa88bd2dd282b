//! 编码实例与生命周期.
//!
//! 状态转换: 打开 (Opened) -> 初始化 (Initialized) -> 编码中 (Encoding) -> 关闭.
//! 内部错误会使实例进入失效 (Failed) 状态, 此后只能关闭.
//!
//! 所有缓冲区在打开时按容量上限一次性分配, 重新初始化不会再分配.

use std::fmt;

use bitflags::bitflags;
use log::debug;

use aacenc_core::{AacEncError, AacEncResult, MdctState, WindowSlope};

use crate::coder::{ChannelCoder, UniformCoder};
use crate::config::{ActiveConfig, EncoderConfig, MAX_CHANNELS, validate};
use crate::payload::{MAX_CHANNEL_ELEMENTS, WrittenPayload};
use crate::rate::RateController;
use crate::transport::{StreamInfo, TransportEncoder};

/// 支持的最大帧长
pub const MAX_FRAME_LENGTH: usize = 1024;

bitflags! {
    /// 初始化范围
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InitFlags: u32 {
        /// 应用新配置
        const CONFIG    = 1 << 0;
        /// 重置变换与比特储备状态
        const STATES    = 1 << 1;
        /// 重新配置传输层
        const TRANSPORT = 1 << 2;
    }
}

/// 编码实例状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderState {
    /// 已分配, 尚未初始化
    Opened,
    /// 已初始化, 尚未编码
    Initialized,
    /// 至少成功编码过一帧
    Encoding,
    /// 发生内部错误, 只能关闭
    Failed,
    /// 已关闭
    Closed,
}

/// 单帧编码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// 输出字节数 (含传输层帧头)
    pub num_out_bytes: usize,
    /// 写入的扩展载荷
    pub ext_payloads: Vec<WrittenPayload>,
}

/// 按容量分配清零的缓冲区
fn alloc_buffer(len: usize, what: &str) -> AacEncResult<Vec<i32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| AacEncError::NoMemory(format!("{what}: {e}")))?;
    buf.resize(len, 0);
    Ok(buf)
}

fn alloc_list<T>(count: usize, what: &str) -> AacEncResult<Vec<T>> {
    let mut list = Vec::new();
    list.try_reserve_exact(count)
        .map_err(|e| AacEncError::NoMemory(format!("{what}: {e}")))?;
    Ok(list)
}

/// AAC 编码实例
pub struct AacEncoder {
    pub(crate) max_elements: usize,
    pub(crate) max_channels: usize,
    pub(crate) max_sub_frames: usize,
    pub(crate) state: EncoderState,
    pub(crate) active: Option<ActiveConfig>,
    pub(crate) rate: Option<RateController>,
    /// 每声道变换状态
    pub(crate) mdct: Vec<MdctState>,
    /// 编码中的暂存变换状态, 帧输出成功后与 `mdct` 交换
    pub(crate) staged: Vec<MdctState>,
    /// 时域工作缓冲区
    pub(crate) time: Vec<Vec<i32>>,
    /// 频谱工作缓冲区
    pub(crate) spectra: Vec<Vec<i32>>,
    pub(crate) slope: Option<WindowSlope>,
    /// 传输层帧头比特数
    pub(crate) static_bits: u32,
    pub(crate) coder: Box<dyn ChannelCoder>,
}

impl fmt::Debug for AacEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AacEncoder")
            .field("max_elements", &self.max_elements)
            .field("max_channels", &self.max_channels)
            .field("max_sub_frames", &self.max_sub_frames)
            .field("state", &self.state)
            .field("active", &self.active)
            .field("coder", &self.coder.name())
            .finish_non_exhaustive()
    }
}

impl AacEncoder {
    /// 打开编码实例, 使用默认的声道元素编码器
    pub fn open(max_elements: usize, max_channels: usize, max_sub_frames: usize) -> AacEncResult<Self> {
        Self::open_with_coder(
            max_elements,
            max_channels,
            max_sub_frames,
            Box::new(UniformCoder::new()),
        )
    }

    /// 打开编码实例, 按给定容量上限分配全部缓冲区
    pub fn open_with_coder(
        max_elements: usize,
        max_channels: usize,
        max_sub_frames: usize,
        coder: Box<dyn ChannelCoder>,
    ) -> AacEncResult<Self> {
        if max_channels == 0 || max_channels > MAX_CHANNELS as usize {
            return Err(AacEncError::InvalidChannelCount(max_channels as u32));
        }
        if max_elements == 0 || max_elements > MAX_CHANNEL_ELEMENTS {
            return Err(AacEncError::UnsupportedChannelConfig(format!(
                "声道元素数上限 {} 超出范围 1..={}",
                max_elements, MAX_CHANNEL_ELEMENTS
            )));
        }
        if max_sub_frames == 0 {
            return Err(AacEncError::UnsupportedBitrateMode(
                "子帧数上限不能为 0".into(),
            ));
        }

        let mut mdct = alloc_list(max_channels, "变换状态")?;
        let mut staged = alloc_list(max_channels, "暂存变换状态")?;
        for _ in 0..max_channels {
            let overlap = alloc_buffer(MAX_FRAME_LENGTH, "重叠缓冲区")?;
            mdct.push(MdctState::init(overlap, MAX_FRAME_LENGTH)?);
            let overlap = alloc_buffer(MAX_FRAME_LENGTH, "暂存重叠缓冲区")?;
            staged.push(MdctState::init(overlap, MAX_FRAME_LENGTH)?);
        }
        let n_work = max_elements.max(max_channels).max(max_sub_frames);
        let mut time = alloc_list(n_work, "时域缓冲区")?;
        let mut spectra = alloc_list(n_work, "频谱缓冲区")?;
        for _ in 0..n_work {
            time.push(alloc_buffer(MAX_FRAME_LENGTH, "时域缓冲区")?);
            spectra.push(alloc_buffer(MAX_FRAME_LENGTH, "频谱缓冲区")?);
        }

        debug!(
            "打开编码实例: 元素 {}, 声道 {}, 子帧 {}, 编码器 {}",
            max_elements,
            max_channels,
            max_sub_frames,
            coder.name()
        );
        Ok(Self {
            max_elements,
            max_channels,
            max_sub_frames,
            state: EncoderState::Opened,
            active: None,
            rate: None,
            mdct,
            staged,
            time,
            spectra,
            slope: None,
            static_bits: 0,
            coder,
        })
    }

    /// 初始化或重新初始化
    ///
    /// 首次初始化忽略 `flags`, 按全部范围执行. 任一校验失败时实例状态不变.
    pub fn initialize(
        &mut self,
        config: &EncoderConfig,
        transport: &mut dyn TransportEncoder,
        flags: InitFlags,
    ) -> AacEncResult<()> {
        match self.state {
            EncoderState::Closed => return Err(AacEncError::InvalidHandle("实例已关闭")),
            EncoderState::Failed => {
                return Err(AacEncError::InvalidHandle("实例已失效, 需要重新打开"));
            }
            _ => {}
        }
        let flags = match &self.active {
            None => InitFlags::all(),
            Some(_) => flags,
        };
        let config = match &self.active {
            Some(current) if !flags.contains(InitFlags::CONFIG) => current.config.clone(),
            _ => config.clone(),
        };

        let active = validate(&config, transport.transport_type())?;
        if active.n_channels() > self.max_channels {
            return Err(AacEncError::InvalidChannelCount(config.n_channels));
        }
        if active.elements.len() > self.max_elements {
            return Err(AacEncError::UnsupportedChannelConfig(format!(
                "声道模式 {} 需要 {} 个声道元素, 实例上限 {}",
                config.channel_mode,
                active.elements.len(),
                self.max_elements
            )));
        }
        if config.n_sub_frames as usize > self.max_sub_frames {
            return Err(AacEncError::UnsupportedBitrateMode(format!(
                "子帧数 {} 超过实例上限 {}",
                config.n_sub_frames, self.max_sub_frames
            )));
        }
        let static_bits = transport.static_bits();
        if static_bits % 8 != 0 {
            return Err(AacEncError::UnsupportedTransportType(format!(
                "{} 帧头 {} bits 不是整字节",
                transport.transport_type(),
                static_bits
            )));
        }
        active.check_frame_capacity(static_bits)?;
        let slope = WindowSlope::sine(active.frame_length())?;

        if flags.intersects(InitFlags::CONFIG | InitFlags::TRANSPORT) {
            transport.configure(&StreamInfo {
                audio_object_type: config.audio_object_type,
                sample_rate_index: active.sample_rate_index,
                channel_config: config.channel_mode.channel_config(),
                frame_length: config.frame_length,
            })?;
        }

        // 以下不再失败
        let geometry_changed = self.active.as_ref().is_none_or(|prev| {
            prev.frame_length() != active.frame_length() || prev.n_channels() != active.n_channels()
        });
        if flags.contains(InitFlags::CONFIG) || self.rate.is_none() {
            self.rate = Some(RateController::new(&active));
        }
        if flags.contains(InitFlags::STATES) || geometry_changed {
            for state in &mut self.mdct {
                state.reset();
            }
            if let Some(rate) = &mut self.rate {
                rate.reset();
            }
        }
        debug!(
            "初始化编码实例 ({:?}): {} Hz, {} 声道, {} bps, {}, 帧头 {} bits",
            flags,
            config.sample_rate,
            config.n_channels,
            active.bit_rate,
            transport.transport_type(),
            static_bits
        );
        self.static_bits = static_bits;
        self.slope = Some(slope);
        self.active = Some(active);
        self.state = EncoderState::Initialized;
        Ok(())
    }

    /// 关闭实例并清空句柄, 对空句柄无操作
    pub fn close(slot: &mut Option<AacEncoder>) {
        if let Some(mut encoder) = slot.take() {
            encoder.state = EncoderState::Closed;
            debug!("关闭编码实例: {:?}", encoder.state);
        }
    }

    /// 当前状态
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// 生效配置
    pub fn active_config(&self) -> Option<&ActiveConfig> {
        self.active.as_ref()
    }

    /// 当前比特储备
    pub fn reservoir_level(&self) -> Option<u32> {
        self.rate.as_ref().map(RateController::reservoir_level)
    }

    /// 指定声道的变换状态
    pub fn transform_state(&self, channel: usize) -> Option<&MdctState> {
        self.mdct.get(channel)
    }

    /// 容量上限: (声道元素, 声道, 子帧)
    pub fn capacity(&self) -> (usize, usize, usize) {
        (self.max_elements, self.max_channels, self.max_sub_frames)
    }

    /// 每帧需要的交错输入样本数
    pub fn input_samples_per_frame(&self) -> Option<usize> {
        self.active
            .as_ref()
            .map(|a| a.frame_length() * a.n_channels())
    }
}
