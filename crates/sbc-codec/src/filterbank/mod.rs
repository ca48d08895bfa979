//! 余弦调制多相滤波器组.
//!
//! 分析端把 PCM 分解为 M 个子带 (M = 4 或 8), 合成端把子带样本还原为 PCM.
//! 全部运算为定点: 窗口 Q20, 余弦矩阵 Q14, 子带样本 Q8, 64 位累加, 四舍五入移位.
//!
//! 历史缓冲在同一编码器/解码器内跨帧保留, 整体延迟为 `9M + 1` 个采样.

pub mod analysis;
pub mod synthesis;
mod tables;

pub use analysis::AnalysisFilter;
pub use synthesis::SynthesisFilter;

use crate::geometry::{MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS};

/// 一帧的子带样本矩阵: `[声道][块][子带]`, Q8
pub type SubbandSamples = [[[i32; MAX_SUBBANDS]; MAX_BLOCKS]; MAX_CHANNELS];

/// 子带样本定点精度 (Q8)
pub const SUBBAND_FRAC_BITS: u32 = 8;

/// 分析 + 合成的整体延迟 (采样数)
pub const fn filterbank_delay(subbands: usize) -> usize {
    9 * subbands + 1
}

/// 四舍五入算术右移
#[inline]
fn round_shift(value: i64, shift: u32) -> i64 {
    (value + (1i64 << (shift - 1))) >> shift
}
