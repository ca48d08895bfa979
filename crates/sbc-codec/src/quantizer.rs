//! 比例因子、量化与反量化.
//!
//! 子带样本为 Q8 定点数 (PCM 单位 × 256). 比例因子 `sf` 表示子带幅度落在
//! `±2^(sf+1)` PCM 单位以内, 量化在该区间上均匀划分 `2^b - 1` 级.

use crate::filterbank::SUBBAND_FRAC_BITS;

/// 最大比例因子
pub const MAX_SCALE_FACTOR: u8 = 15;

/// 子带样本的合法幅度上限 (Q8), 超出部分在量化前截断
pub const SUBBAND_LIMIT: i32 = (1 << (MAX_SCALE_FACTOR as u32 + 1 + SUBBAND_FRAC_BITS)) - 1;

#[inline]
fn half_range(sf: u8) -> i64 {
    1i64 << (u32::from(sf) + 1 + SUBBAND_FRAC_BITS)
}

/// 计算一组子带样本的比例因子
///
/// 取满足所有样本 `|x| < 2^(sf+1)` (PCM 单位) 的最小 `sf`, 不超过 15.
pub fn scale_factor(samples: impl IntoIterator<Item = i32>) -> u8 {
    let peak = samples
        .into_iter()
        .map(|x| i64::from(x).abs())
        .max()
        .unwrap_or(0);
    (0..MAX_SCALE_FACTOR)
        .find(|&sf| peak < half_range(sf))
        .unwrap_or(MAX_SCALE_FACTOR)
}

/// 量化一个子带样本, 返回 `0..=2^bits - 2` 之间的码字
///
/// `bits` 必须在 `1..=16` 之间.
pub fn quantize(sample: i32, sf: u8, bits: u8) -> u16 {
    let range = half_range(sf);
    let x = i64::from(sample).clamp(1 - range, range - 1);
    let levels = (1i64 << bits) - 1;
    (((x + range) * levels) >> (u32::from(sf) + 2 + SUBBAND_FRAC_BITS)) as u16
}

/// 反量化一个码字, 得到该量化区间中点对应的子带样本
///
/// `bits == 0` 时子带没有分配比特, 重建为 0.
pub fn dequantize(code: u16, sf: u8, bits: u8) -> i32 {
    if bits == 0 {
        return 0;
    }
    let range = half_range(sf);
    let levels = (1i64 << bits) - 1;
    let value = ((2 * i64::from(code) + 1) * range) / levels - range;
    value as i32
}
