//! 帧几何参数及其校验.
//!
//! 帧长度与码率都是几何参数的纯函数: 固定参数下每帧字节数恒定.

use sbc_core::{SbcError, SbcResult};

use crate::config::{AllocationMethod, ChannelMode, SamplingFrequency};

/// 最大子带数
pub const MAX_SUBBANDS: usize = 8;
/// 最大每帧块数
pub const MAX_BLOCKS: usize = 16;
/// 最大声道数
pub const MAX_CHANNELS: usize = 2;
/// 最小 bitpool
pub const MIN_BITPOOL: u8 = 2;
/// bitpool 字段绝对上限
const BITPOOL_CEILING: i64 = 250;
/// mSBC 固定 bitpool
pub const MSBC_BITPOOL: u8 = 26;
/// 帧头字节数 (同步字 + 2 字节参数 + CRC)
pub const HEADER_SIZE: usize = 4;

/// 已校验的帧几何参数
///
/// 只能通过 [`FrameGeometry::new`] 或 [`FrameGeometry::msbc`] 构造,
/// 因此持有的值总是合法的.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameGeometry {
    subbands: usize,
    blocks: usize,
    sampling_frequency: SamplingFrequency,
    channel_mode: ChannelMode,
    allocation_method: AllocationMethod,
    bitpool: u8,
    msbc: bool,
}

impl FrameGeometry {
    /// 校验参数并构造帧几何
    ///
    /// 子带数必须为 4 或 8, 块数必须为 4/8/12/16,
    /// bitpool 必须落在 [`bitpool_range`] 给出的闭区间内.
    /// `msbc` 为真时其余参数必须与 mSBC 固定参数一致.
    pub fn new(
        subbands: usize,
        blocks: usize,
        sampling_frequency: SamplingFrequency,
        channel_mode: ChannelMode,
        allocation_method: AllocationMethod,
        bitpool: u8,
        msbc: bool,
    ) -> SbcResult<Self> {
        if subbands != 4 && subbands != 8 {
            return Err(SbcError::InvalidParameter(format!(
                "子带数必须为 4 或 8, 实际 {}",
                subbands,
            )));
        }
        if !matches!(blocks, 4 | 8 | 12 | 16) {
            return Err(SbcError::InvalidParameter(format!(
                "块数必须为 4/8/12/16, 实际 {}",
                blocks,
            )));
        }

        let geometry = Self {
            subbands,
            blocks,
            sampling_frequency,
            channel_mode,
            allocation_method,
            bitpool,
            msbc,
        };

        if msbc && geometry != Self::msbc() {
            return Err(SbcError::InvalidParameter(format!(
                "mSBC 要求 8 子带/16 块/16 kHz/单声道/响度分配/bitpool {}",
                MSBC_BITPOOL,
            )));
        }

        let (min, max) = bitpool_range(subbands, blocks, channel_mode);
        if bitpool < min || bitpool > max {
            return Err(SbcError::InvalidParameter(format!(
                "bitpool {} 超出范围 [{}, {}] ({} 子带, {} 块, {})",
                bitpool, min, max, subbands, blocks, channel_mode,
            )));
        }

        Ok(geometry)
    }

    /// mSBC 固定几何参数
    pub const fn msbc() -> Self {
        Self {
            subbands: 8,
            blocks: 16,
            sampling_frequency: SamplingFrequency::Hz16000,
            channel_mode: ChannelMode::Mono,
            allocation_method: AllocationMethod::Loudness,
            bitpool: MSBC_BITPOOL,
            msbc: true,
        }
    }

    pub const fn subbands(&self) -> usize {
        self.subbands
    }

    pub const fn blocks(&self) -> usize {
        self.blocks
    }

    pub const fn sampling_frequency(&self) -> SamplingFrequency {
        self.sampling_frequency
    }

    pub const fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    pub const fn allocation_method(&self) -> AllocationMethod {
        self.allocation_method
    }

    pub const fn bitpool(&self) -> u8 {
        self.bitpool
    }

    pub const fn is_msbc(&self) -> bool {
        self.msbc
    }

    /// 声道数
    pub const fn channels(&self) -> usize {
        self.channel_mode.channels()
    }

    /// 采样率 (Hz)
    pub const fn sample_rate_hz(&self) -> u32 {
        self.sampling_frequency.hz()
    }

    /// 每声道每帧的 PCM 采样数
    pub const fn frame_samples(&self) -> usize {
        self.blocks * self.subbands
    }

    /// 编码一帧所需的交错 PCM 采样总数
    pub const fn pcm_samples(&self) -> usize {
        self.frame_samples() * self.channels()
    }

    /// 联合立体声标志位 + 比例因子的位数 (CRC 覆盖区域中帧头之后的部分)
    pub const fn side_info_bits(&self) -> usize {
        side_info_bits(self.subbands, self.channel_mode)
    }

    /// 帧长度 (字节)
    pub const fn frame_size(&self) -> usize {
        frame_len(self.subbands, self.blocks, self.channel_mode, self.bitpool)
    }

    /// 码率 (bit/s)
    pub const fn bitrate(&self) -> u32 {
        let bits = 8 * self.frame_size() as u64 * self.sample_rate_hz() as u64;
        (bits / self.frame_samples() as u64) as u32
    }
}

/// 给定子带数/块数/声道模式下 bitpool 的合法闭区间
///
/// 上限取以下三者的最小值: 帧不大于原始 PCM 的最大值、`(16 << stereo) · subbands`、250.
pub fn bitpool_range(subbands: usize, blocks: usize, channel_mode: ChannelMode) -> (u8, u8) {
    let nch = channel_mode.channels() as i64;
    let nsb = subbands as i64;
    let join = i64::from(channel_mode == ChannelMode::JointStereo);
    let dual = u32::from(channel_mode == ChannelMode::DualChannel);
    let stereo = u32::from(channel_mode.shares_bitpool());

    let raw_bits = 16 * nsb * blocks as i64 * nch;
    let raw_bound = (raw_bits - 32 - 4 * nsb * nch - join * nsb) / ((blocks as i64) << dual);
    let max = raw_bound.min((16i64 << stereo) * nsb).min(BITPOOL_CEILING);
    (MIN_BITPOOL, max.max(i64::from(MIN_BITPOOL)) as u8)
}

pub(crate) const fn side_info_bits(subbands: usize, channel_mode: ChannelMode) -> usize {
    let join = if matches!(channel_mode, ChannelMode::JointStereo) {
        subbands
    } else {
        0
    };
    4 * subbands * channel_mode.channels() + join
}

/// 由原始帧头字段计算帧长度, bitpool 尚未校验时也可用
pub(crate) const fn frame_len(
    subbands: usize,
    blocks: usize,
    channel_mode: ChannelMode,
    bitpool: u8,
) -> usize {
    let dual = if matches!(channel_mode, ChannelMode::DualChannel) {
        1
    } else {
        0
    };
    let bits = side_info_bits(subbands, channel_mode) + ((blocks * bitpool as usize) << dual);
    HEADER_SIZE + bits.div_ceil(8)
}
