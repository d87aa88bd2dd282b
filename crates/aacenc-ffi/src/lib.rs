//! # aacenc-ffi
//!
//! AAC 编码器 C FFI 导出层.
//!
//! # 命名规范
//!
//! 所有导出函数以 `aacenc_` 前缀命名:
//! - `aacenc_open()` / `aacenc_close()` - 创建与释放编码实例
//! - `aacenc_initialize()` - 按配置初始化
//! - `aacenc_encode_frame()` - 编码一帧
//!
//! # 错误码
//!
//! 返回值为错误码, 调用方应按数值区间判断类别, 不要依赖具体数值:
//! - `0x0000` 成功
//! - `0x0002` 未知错误
//! - `0x2000..=0x3FFF` 初始化错误
//! - `0x4000..=0x4FFF` 编码错误
//!
//! # 内存管理
//!
//! - 编码实例由 `aacenc_open()` 分配, 必须通过 `aacenc_close()` 释放
//! - 输入 PCM、输出缓冲区与扩展载荷由调用方分配, 只需在调用期间有效

use std::os::raw::c_char;
use std::ptr;

use log::warn;

use aacenc_codec::{
    AacEncoder, AncillaryRate, BitrateMode, EncoderConfig, ExtPayloadType, ExtensionPayload,
    InitFlags, MemoryTransport, ToolFlags, TransportEncoder, default_config, vbr_bitrate,
};
use aacenc_core::{
    AacEncError, AudioObjectType, ChannelMode, ChannelOrder, ErrorCategory, TransportType,
};

/// 成功
pub const AACENC_OK: u32 = 0x0000;
/// 未知错误
pub const AACENC_UNKNOWN: u32 = 0x0002;
/// 初始化错误区间起点
pub const AACENC_INIT_ERROR: u32 = 0x2000;
/// 编码错误区间起点
pub const AACENC_ENCODE_ERROR: u32 = 0x4000;

/// 错误码
pub fn error_code(err: &AacEncError) -> u32 {
    use AacEncError::*;
    let offset = match err {
        Unknown(_) => return AACENC_UNKNOWN,
        InvalidFrameLength(_) => 0x01,
        InvalidChannelCount(_) => 0x02,
        UnsupportedAot(_) => 0x03,
        UnsupportedBitrate(_) => 0x04,
        UnsupportedBitrateMode(_) => 0x05,
        UnsupportedAncBitrate(_) => 0x06,
        UnsupportedAncMode(_) => 0x07,
        UnsupportedTransportType(_) => 0x08,
        UnsupportedErFormat(_) => 0x09,
        UnsupportedEpConfig(_) => 0x0A,
        UnsupportedChannelConfig(_) => 0x0B,
        UnsupportedSampleRate(_) => 0x0C,
        InvalidTransform(_) => 0x0D,
        InvalidInput(_) => 0x0E,
        InvalidHandle(_) => 0x20,
        NoMemory(_) => 0x100,
        QuantError { .. } => 0x01,
        WrittenBitsError { .. } => 0x02,
        PnsTableError(_) => 0x03,
        GlobalGainTooHigh(_) => 0x04,
        BitresTooLow { .. } => 0x05,
        BitresTooHigh { .. } => 0x06,
        InvalidChannelBitrate(_) => 0x07,
        InvalidExtPayload(_) => 0x08,
        WriteScalError => 0x09,
        WriteSecError => 0x0A,
        WriteSpecError => 0x0B,
        InvalidSfbTable => 0x101,
        PeInitTableNotFound => 0x102,
        InvalidElementInfoType(_) => 0x103,
    };
    match err.category() {
        ErrorCategory::Validation | ErrorCategory::Resource => AACENC_INIT_ERROR + offset,
        ErrorCategory::PerFrame | ErrorCategory::Internal => AACENC_ENCODE_ERROR + offset,
        ErrorCategory::Unknown => AACENC_UNKNOWN,
    }
}

fn report(err: &AacEncError) -> u32 {
    warn!("aacenc: {}", err);
    error_code(err)
}

/// C 侧编码配置
///
/// 可选字段以负数表示 "未指定".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacencConfig {
    pub sample_rate: u32,
    pub bit_rate: u32,
    /// 0 = CBR, 1-5 = VBR, 6 = 固定帧, 7 = 超帧
    pub bitrate_mode: i32,
    pub n_channels: u32,
    /// 0 = MPEG, 1 = WAV
    pub channel_order: u32,
    /// MPEG 声道配置索引 1-7
    pub channel_mode: u32,
    pub frame_length: u32,
    pub audio_object_type: u32,
    /// 位 0 TNS, 位 1 PNS, 位 2 强度立体声, 位 3 量化细化
    pub tools: u32,
    /// 负数表示不使用
    pub ep_config: i32,
    /// 0 = 不携带, 负数 = 默认上限, 正数 = 预留码率
    pub anc_rate: i32,
    pub min_bits_per_frame: i32,
    pub max_bits_per_frame: i32,
    pub bit_reservoir: i32,
    pub n_sub_frames: u32,
    /// 0 = 自动
    pub band_width: u32,
    /// 0 = raw, 1 = ADIF, 2 = ADTS, 6 = LATM (mcp1), 7 = LATM (mcp0), 10 = LOAS
    pub transport_type: u32,
}

fn optional(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

fn channel_mode_from_config(index: u32) -> Option<ChannelMode> {
    ChannelMode::ALL
        .into_iter()
        .find(|m| m.channel_config() as u32 == index)
}

fn transport_from_u32(value: u32) -> Option<TransportType> {
    Some(match value {
        0 => TransportType::Raw,
        1 => TransportType::Adif,
        2 => TransportType::Adts,
        6 => TransportType::LatmMcp1,
        7 => TransportType::LatmMcp0,
        10 => TransportType::Loas,
        _ => return None,
    })
}

fn transport_to_u32(value: TransportType) -> u32 {
    match value {
        TransportType::Raw => 0,
        TransportType::Adif => 1,
        TransportType::Adts => 2,
        TransportType::LatmMcp1 => 6,
        TransportType::LatmMcp0 => 7,
        TransportType::Loas => 10,
    }
}

impl AacencConfig {
    fn from_config(cfg: &EncoderConfig, transport: TransportType) -> Self {
        let opt = |v: Option<u32>| v.map_or(-1, |x| x as i32);
        Self {
            sample_rate: cfg.sample_rate,
            bit_rate: cfg.bit_rate,
            bitrate_mode: match cfg.bitrate_mode {
                BitrateMode::Cbr => 0,
                BitrateMode::FixedFrame => 6,
                BitrateMode::SuperFrame => 7,
                m => m.vbr_tier().map_or(0, i32::from),
            },
            n_channels: cfg.n_channels,
            channel_order: match cfg.channel_order {
                ChannelOrder::Mpeg => 0,
                ChannelOrder::Wav => 1,
            },
            channel_mode: cfg.channel_mode.channel_config() as u32,
            frame_length: cfg.frame_length,
            audio_object_type: cfg.audio_object_type.as_u32(),
            tools: cfg.tools.bits(),
            ep_config: cfg.ep_config.unwrap_or(-1),
            anc_rate: match cfg.anc_rate {
                AncillaryRate::Disabled => 0,
                AncillaryRate::Default => -1,
                AncillaryRate::Rate(r) => r as i32,
            },
            min_bits_per_frame: opt(cfg.min_bits_per_frame),
            max_bits_per_frame: opt(cfg.max_bits_per_frame),
            bit_reservoir: opt(cfg.bit_reservoir),
            n_sub_frames: cfg.n_sub_frames,
            band_width: cfg.band_width.unwrap_or(0),
            transport_type: transport_to_u32(transport),
        }
    }

    fn to_config(&self) -> Result<(EncoderConfig, TransportType), AacEncError> {
        let bitrate_mode = BitrateMode::from_i32(self.bitrate_mode).ok_or_else(|| {
            AacEncError::UnsupportedBitrateMode(format!("未知码率模式 {}", self.bitrate_mode))
        })?;
        let channel_mode = channel_mode_from_config(self.channel_mode).ok_or_else(|| {
            AacEncError::UnsupportedChannelConfig(format!("未知声道配置 {}", self.channel_mode))
        })?;
        let audio_object_type = AudioObjectType::from_u32(self.audio_object_type)
            .ok_or(AacEncError::UnsupportedAot(self.audio_object_type))?;
        let transport = transport_from_u32(self.transport_type).ok_or_else(|| {
            AacEncError::UnsupportedTransportType(format!("未知封装 {}", self.transport_type))
        })?;
        let channel_order = match self.channel_order {
            0 => ChannelOrder::Mpeg,
            1 => ChannelOrder::Wav,
            other => {
                return Err(AacEncError::UnsupportedChannelConfig(format!(
                    "未知声道排列 {}",
                    other
                )));
            }
        };
        let anc_rate = match self.anc_rate {
            0 => AncillaryRate::Disabled,
            r if r < 0 => AncillaryRate::Default,
            r => AncillaryRate::Rate(r as u32),
        };
        let config = EncoderConfig {
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            bitrate_mode,
            n_channels: self.n_channels,
            channel_order,
            channel_mode,
            frame_length: self.frame_length,
            audio_object_type,
            tools: ToolFlags::from_bits_truncate(self.tools),
            ep_config: (self.ep_config >= 0).then_some(self.ep_config),
            anc_rate,
            min_bits_per_frame: optional(self.min_bits_per_frame),
            max_bits_per_frame: optional(self.max_bits_per_frame),
            bit_reservoir: optional(self.bit_reservoir),
            n_sub_frames: self.n_sub_frames,
            band_width: (self.band_width > 0).then_some(self.band_width),
        };
        Ok((config, transport))
    }
}

/// C 侧扩展载荷
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AacencExtPayload {
    pub data: *const u8,
    pub data_bits: u32,
    /// 4 bit 扩展类型, 2 为辅助数据
    pub payload_type: u32,
    pub associated_ch_element: u32,
}

/// 不透明编码句柄
pub struct AacencHandle {
    encoder: AacEncoder,
    transport: MemoryTransport,
}

/// 获取版本号字符串
///
/// 返回的字符串指针为静态分配, 无需释放.
#[unsafe(no_mangle)]
pub extern "C" fn aacenc_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// 获取版本号的数字表示
///
/// 格式: (主版本 << 16) | (次版本 << 8) | 修订版本
#[unsafe(no_mangle)]
pub extern "C" fn aacenc_version_int() -> u32 {
    let (major, minor, patch): (u32, u32, u32) = (0, 1, 0);
    (major << 16) | (minor << 8) | patch
}

/// 创建编码实例
///
/// # Safety
///
/// `handle` 必须指向可写的句柄指针.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aacenc_open(
    handle: *mut *mut AacencHandle,
    max_elements: u32,
    max_channels: u32,
    max_sub_frames: u32,
) -> u32 {
    if handle.is_null() {
        return error_code(&AacEncError::InvalidHandle("句柄指针为空"));
    }
    match AacEncoder::open(
        max_elements as usize,
        max_channels as usize,
        max_sub_frames as usize,
    ) {
        Ok(encoder) => {
            let boxed = Box::new(AacencHandle {
                encoder,
                transport: MemoryTransport::new(TransportType::Raw),
            });
            // SAFETY: 调用方保证 handle 可写
            unsafe { *handle = Box::into_raw(boxed) };
            AACENC_OK
        }
        Err(err) => {
            // SAFETY: 同上
            unsafe { *handle = ptr::null_mut() };
            report(&err)
        }
    }
}

/// 填充默认配置 (48 kHz 立体声 AAC-LC, CBR 128 kbps, 裸访问单元)
///
/// # Safety
///
/// `config` 必须指向可写的 [`AacencConfig`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aacenc_default_config(config: *mut AacencConfig) -> u32 {
    if config.is_null() {
        return error_code(&AacEncError::InvalidHandle("配置指针为空"));
    }
    let cfg = AacencConfig::from_config(&default_config(), TransportType::Raw);
    // SAFETY: 调用方保证 config 可写
    unsafe { *config = cfg };
    AACENC_OK
}

/// 初始化编码实例
///
/// # Safety
///
/// `handle` 必须来自 [`aacenc_open`] 且尚未关闭, `config` 必须有效.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aacenc_initialize(
    handle: *mut AacencHandle,
    config: *const AacencConfig,
    init_flags: u32,
) -> u32 {
    // SAFETY: 调用方保证指针有效或为空
    let (Some(h), Some(cfg)) = (unsafe { handle.as_mut() }, unsafe { config.as_ref() }) else {
        return error_code(&AacEncError::InvalidHandle("句柄或配置为空"));
    };
    let (config, transport_type) = match cfg.to_config() {
        Ok(v) => v,
        Err(err) => return report(&err),
    };
    let flags = InitFlags::from_bits_truncate(init_flags);
    // 更换封装时先配置新的传输层, 初始化成功后才替换
    let result = if transport_type != h.transport.transport_type() {
        let mut candidate = MemoryTransport::new(transport_type);
        let result = h
            .encoder
            .initialize(&config, &mut candidate, flags | InitFlags::TRANSPORT);
        if result.is_ok() {
            h.transport = candidate;
        }
        result
    } else {
        h.encoder.initialize(&config, &mut h.transport, flags)
    };
    match result {
        Ok(()) => AACENC_OK,
        Err(err) => report(&err),
    }
}

/// 编码一帧
///
/// - `pcm`: 交错 16 位 PCM, `n_samples` = 帧长 * 声道数
/// - `payloads`: `n_payloads` 个扩展载荷, 可为空
/// - `out`: 输出缓冲区, 容量不小于每帧最大字节数
///
/// # Safety
///
/// 所有指针必须在调用期间有效, 长度参数与实际缓冲区一致.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aacenc_encode_frame(
    handle: *mut AacencHandle,
    pcm: *const i16,
    n_samples: usize,
    payloads: *const AacencExtPayload,
    n_payloads: usize,
    out: *mut u8,
    out_capacity: usize,
    out_bytes: *mut usize,
) -> u32 {
    // SAFETY: 调用方保证指针有效或为空
    let Some(h) = (unsafe { handle.as_mut() }) else {
        return error_code(&AacEncError::InvalidHandle("句柄为空"));
    };
    if pcm.is_null() || out.is_null() || out_bytes.is_null() {
        return error_code(&AacEncError::InvalidInput("缓冲区指针为空".into()));
    }
    if let Some(active) = h.encoder.active_config() {
        let max_bytes = active.max_bits as usize / 8;
        if out_capacity < max_bytes {
            return report(&AacEncError::InvalidInput(format!(
                "输出缓冲区 {} 字节小于每帧上限 {} 字节",
                out_capacity, max_bytes
            )));
        }
    }
    // SAFETY: 调用方保证 pcm 含 n_samples 个样本
    let input = unsafe { std::slice::from_raw_parts(pcm, n_samples) };

    let raw_payloads: &[AacencExtPayload] = if payloads.is_null() || n_payloads == 0 {
        &[]
    } else {
        // SAFETY: 调用方保证 payloads 含 n_payloads 项
        unsafe { std::slice::from_raw_parts(payloads, n_payloads) }
    };
    let mut ext = Vec::with_capacity(raw_payloads.len());
    for p in raw_payloads {
        let Some(payload_type) = ExtPayloadType::from_u32(p.payload_type) else {
            return report(&AacEncError::InvalidExtPayload(format!(
                "未知载荷类型 {}",
                p.payload_type
            )));
        };
        let len = (p.data_bits as usize).div_ceil(8);
        let data: &[u8] = if len == 0 {
            &[]
        } else if p.data.is_null() {
            return report(&AacEncError::InvalidExtPayload("载荷数据为空".into()));
        } else {
            // SAFETY: 调用方保证 data 含 data_bits 个比特
            unsafe { std::slice::from_raw_parts(p.data, len) }
        };
        ext.push(ExtensionPayload {
            data,
            data_bits: p.data_bits as usize,
            payload_type,
            associated_ch_element: p.associated_ch_element as usize,
        });
    }

    let frame = match h.encoder.encode_frame(&mut h.transport, input, &ext) {
        Ok(frame) => frame,
        Err(err) => return report(&err),
    };
    let mut written = 0;
    for unit in h.transport.take_units() {
        let n = unit.len().min(out_capacity - written);
        // SAFETY: out 至少有 out_capacity 字节
        unsafe { ptr::copy_nonoverlapping(unit.as_ptr(), out.add(written), n) };
        written += n;
    }
    debug_assert_eq!(written, frame.num_out_bytes);
    // SAFETY: 调用方保证 out_bytes 可写
    unsafe { *out_bytes = written };
    AACENC_OK
}

/// 关闭编码实例并把句柄置空, 对空句柄无操作
///
/// # Safety
///
/// `handle` 为空或指向由 [`aacenc_open`] 得到的句柄指针.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn aacenc_close(handle: *mut *mut AacencHandle) {
    if handle.is_null() {
        return;
    }
    // SAFETY: 调用方保证 handle 可读写
    let raw = unsafe { std::mem::replace(&mut *handle, ptr::null_mut()) };
    if raw.is_null() {
        return;
    }
    // SAFETY: raw 由 Box::into_raw 得到且只释放一次
    let boxed = unsafe { Box::from_raw(raw) };
    let mut slot = Some(boxed.encoder);
    AacEncoder::close(&mut slot);
}

/// VBR 档位对应的近似码率, 非 VBR 模式或未知声道配置返回 0
#[unsafe(no_mangle)]
pub extern "C" fn aacenc_vbr_bitrate(bitrate_mode: i32, channel_mode: u32) -> u32 {
    let (Some(mode), Some(cm)) = (
        BitrateMode::from_i32(bitrate_mode),
        channel_mode_from_config(channel_mode),
    ) else {
        return 0;
    };
    vbr_bitrate(mode, cm).unwrap_or(0)
}
