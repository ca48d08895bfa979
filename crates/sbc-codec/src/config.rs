//! 编解码器配置.
//!
//! `SbcConfig` 列出所有可配置项及其默认值, 编码器与解码器都从它构造.
//! 校验统一由 [`FrameGeometry::new`] 完成.

use std::fmt;

use sbc_core::SbcResult;

use crate::geometry::FrameGeometry;

/// 无法识别的采样率代码对应的返回值
pub const UNKNOWN_SAMPLE_RATE: u32 = 0;

/// 采样率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingFrequency {
    /// 16 kHz
    Hz16000,
    /// 32 kHz
    Hz32000,
    /// 44.1 kHz
    Hz44100,
    /// 48 kHz
    Hz48000,
}

impl SamplingFrequency {
    /// 从帧头中的 2 位代码解析
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Hz16000),
            1 => Some(Self::Hz32000),
            2 => Some(Self::Hz44100),
            3 => Some(Self::Hz48000),
            _ => None,
        }
    }

    /// 帧头中的 2 位代码
    pub const fn code(&self) -> u8 {
        match self {
            Self::Hz16000 => 0,
            Self::Hz32000 => 1,
            Self::Hz44100 => 2,
            Self::Hz48000 => 3,
        }
    }

    /// 采样率 (Hz)
    pub const fn hz(&self) -> u32 {
        match self {
            Self::Hz16000 => 16000,
            Self::Hz32000 => 32000,
            Self::Hz44100 => 44100,
            Self::Hz48000 => 48000,
        }
    }

    /// 从采样率 (Hz) 查找
    pub const fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            16000 => Some(Self::Hz16000),
            32000 => Some(Self::Hz32000),
            44100 => Some(Self::Hz44100),
            48000 => Some(Self::Hz48000),
            _ => None,
        }
    }
}

impl fmt::Display for SamplingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// 将采样率代码转换为 Hz, 未知代码返回 [`UNKNOWN_SAMPLE_RATE`]
pub fn sample_rate_hz(code: u32) -> u32 {
    u8::try_from(code)
        .ok()
        .and_then(SamplingFrequency::from_code)
        .map_or(UNKNOWN_SAMPLE_RATE, |freq| freq.hz())
}

/// 声道模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// 单声道
    Mono,
    /// 双声道 (两个独立单声道, 各自占用完整 bitpool)
    DualChannel,
    /// 立体声 (两声道共享 bitpool)
    Stereo,
    /// 联合立体声 (按子带选择 L/R 或 M/S 编码)
    JointStereo,
}

impl ChannelMode {
    /// 从帧头中的 2 位代码解析
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Mono),
            1 => Some(Self::DualChannel),
            2 => Some(Self::Stereo),
            3 => Some(Self::JointStereo),
            _ => None,
        }
    }

    /// 帧头中的 2 位代码
    pub const fn code(&self) -> u8 {
        match self {
            Self::Mono => 0,
            Self::DualChannel => 1,
            Self::Stereo => 2,
            Self::JointStereo => 3,
        }
    }

    /// 声道数
    pub const fn channels(&self) -> usize {
        match self {
            Self::Mono => 1,
            _ => 2,
        }
    }

    /// 两声道是否共享同一 bitpool
    pub const fn shares_bitpool(&self) -> bool {
        matches!(self, Self::Stereo | Self::JointStereo)
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mono => "mono",
            Self::DualChannel => "dual-channel",
            Self::Stereo => "stereo",
            Self::JointStereo => "joint-stereo",
        };
        write!(f, "{name}")
    }
}

/// 比特分配方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationMethod {
    /// 响度 (按子带加权)
    Loudness,
    /// 信噪比 (直接按比例因子)
    Snr,
}

impl AllocationMethod {
    /// 从帧头中的 1 位代码解析
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Loudness),
            1 => Some(Self::Snr),
            _ => None,
        }
    }

    /// 帧头中的 1 位代码
    pub const fn code(&self) -> u8 {
        match self {
            Self::Loudness => 0,
            Self::Snr => 1,
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loudness => "loudness",
            Self::Snr => "snr",
        };
        write!(f, "{name}")
    }
}

/// 编解码器配置
///
/// 默认值: 8 子带, 16 块, 16 kHz, 单声道, 响度分配, bitpool 32, 非 mSBC.
/// `msbc` 为真时其余字段被忽略, 使用 mSBC 固定参数.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbcConfig {
    /// 子带数 (4 或 8)
    pub subbands: usize,
    /// 每帧块数 (4, 8, 12 或 16)
    pub blocks: usize,
    /// 采样率
    pub sampling_frequency: SamplingFrequency,
    /// 声道模式
    pub channel_mode: ChannelMode,
    /// 比特分配方法
    pub allocation_method: AllocationMethod,
    /// 每块比特预算
    pub bitpool: u8,
    /// 是否使用 mSBC (宽带语音) 固定参数
    pub msbc: bool,
}

impl Default for SbcConfig {
    fn default() -> Self {
        Self {
            subbands: 8,
            blocks: 16,
            sampling_frequency: SamplingFrequency::Hz16000,
            channel_mode: ChannelMode::Mono,
            allocation_method: AllocationMethod::Loudness,
            bitpool: 32,
            msbc: false,
        }
    }
}

impl SbcConfig {
    /// mSBC 配置
    pub fn msbc() -> Self {
        Self {
            msbc: true,
            ..Self::default()
        }
    }

    pub fn with_subbands(mut self, subbands: usize) -> Self {
        self.subbands = subbands;
        self
    }

    pub fn with_blocks(mut self, blocks: usize) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_sampling_frequency(mut self, freq: SamplingFrequency) -> Self {
        self.sampling_frequency = freq;
        self
    }

    pub fn with_channel_mode(mut self, mode: ChannelMode) -> Self {
        self.channel_mode = mode;
        self
    }

    pub fn with_allocation_method(mut self, method: AllocationMethod) -> Self {
        self.allocation_method = method;
        self
    }

    pub fn with_bitpool(mut self, bitpool: u8) -> Self {
        self.bitpool = bitpool;
        self
    }

    /// 校验配置并得到帧几何参数
    pub fn geometry(&self) -> SbcResult<FrameGeometry> {
        if self.msbc {
            return Ok(FrameGeometry::msbc());
        }
        FrameGeometry::new(
            self.subbands,
            self.blocks,
            self.sampling_frequency,
            self.channel_mode,
            self.allocation_method,
            self.bitpool,
            false,
        )
    }
}

impl From<FrameGeometry> for SbcConfig {
    fn from(geometry: FrameGeometry) -> Self {
        Self {
            subbands: geometry.subbands(),
            blocks: geometry.blocks(),
            sampling_frequency: geometry.sampling_frequency(),
            channel_mode: geometry.channel_mode(),
            allocation_method: geometry.allocation_method(),
            bitpool: geometry.bitpool(),
            msbc: geometry.is_msbc(),
        }
    }
}
