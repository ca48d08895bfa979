//! 比特分配.
//!
//! 编码端和解码端都仅凭帧几何参数与比例因子计算每个子带的量化位宽,
//! 分配表本身不写入码流, 因此两端的计算必须逐位一致.
//!
//! 流程:
//! 1. 由比例因子计算每个子带的 bitneed (响度法按子带偏移加权, SNR 法直接取比例因子)
//! 2. 从最大 bitneed 向下逐级切片, 直到再切一级就会超出 bitpool
//! 3. 按切片结果给出初始位宽, 剩余比特分两轮补齐
//!
//! 单声道/双声道每个声道独立分配; 立体声/联合立体声两声道共享 bitpool,
//! 按子带交替 (声道 0, 声道 1) 进行补齐.

use crate::config::{AllocationMethod, SamplingFrequency};
use crate::geometry::{FrameGeometry, MAX_CHANNELS, MAX_SUBBANDS};

/// 单个子带最大位宽
pub const MAX_BITS: u8 = 16;

/// 比例因子表: `[声道][子带]`, 每项 4 位
pub type ScaleFactors = [[u8; MAX_SUBBANDS]; MAX_CHANNELS];

/// 比特分配表: `[声道][子带]`, 每项 0..=16
pub type BitAllocation = [[u8; MAX_SUBBANDS]; MAX_CHANNELS];

/// 4 子带响度偏移
const LOUDNESS_OFFSET_4: [[i32; 4]; 4] = [
    [-1, 0, 0, 0],
    [-2, 0, 0, 1],
    [-2, 0, 0, 1],
    [-2, 0, 0, 1],
];

/// 8 子带响度偏移
const LOUDNESS_OFFSET_8: [[i32; 8]; 4] = [
    [-2, 0, 0, 0, 0, 0, 0, 1],
    [-3, 0, 0, 0, 0, 0, 1, 2],
    [-4, 0, 0, 0, 0, 0, 1, 2],
    [-4, 0, 0, 0, 0, 0, 1, 2],
];

fn loudness_offset(freq: SamplingFrequency, subbands: usize, sb: usize) -> i32 {
    let row = freq.code() as usize;
    if subbands == 4 {
        LOUDNESS_OFFSET_4[row][sb]
    } else {
        LOUDNESS_OFFSET_8[row][sb]
    }
}

/// 计算一个声道各子带的 bitneed
fn bitneed(geometry: &FrameGeometry, scale_factors: &[u8; MAX_SUBBANDS]) -> [i32; MAX_SUBBANDS] {
    let subbands = geometry.subbands();
    let mut need = [0i32; MAX_SUBBANDS];

    for sb in 0..subbands {
        let sf = i32::from(scale_factors[sb]);
        need[sb] = match geometry.allocation_method() {
            AllocationMethod::Snr => sf,
            AllocationMethod::Loudness => {
                if sf == 0 {
                    -5
                } else {
                    let loudness = sf - loudness_offset(geometry.sampling_frequency(), subbands, sb);
                    if loudness > 0 { loudness / 2 } else { loudness }
                }
            }
        };
    }
    need
}

/// 在一组子带 (按补齐顺序排列) 上分配 `bitpool` 个比特
///
/// 每个子带最多可吸收 16 比特, 调用方保证 `bitpool <= 16 * need.len()`,
/// 切片循环因此必定终止.
fn slice_bits(need: &[i32], bitpool: i32, bits: &mut [u8]) {
    let max_bitneed = need.iter().copied().max().unwrap_or(0);

    let mut bitcount = 0;
    let mut slicecount = 0;
    let mut bitslice = max_bitneed + 1;
    loop {
        bitslice -= 1;
        bitcount += slicecount;
        slicecount = 0;
        for &n in need {
            if n > bitslice + 1 && n < bitslice + 16 {
                slicecount += 1;
            } else if n == bitslice + 1 {
                slicecount += 2;
            }
        }
        if bitcount + slicecount >= bitpool {
            break;
        }
    }
    if bitcount + slicecount == bitpool {
        bitcount += slicecount;
        bitslice -= 1;
    }

    for (b, &n) in bits.iter_mut().zip(need) {
        *b = if n < bitslice + 2 {
            0
        } else {
            (n - bitslice).min(i32::from(MAX_BITS)) as u8
        };
    }

    // 第一轮: 已分配子带各加 1 位, 恰好差一级的子带直接给 2 位
    let mut i = 0;
    while bitcount < bitpool && i < need.len() {
        if bits[i] >= 2 && bits[i] < MAX_BITS {
            bits[i] += 1;
            bitcount += 1;
        } else if need[i] == bitslice + 1 && bitpool > bitcount + 1 {
            bits[i] = 2;
            bitcount += 2;
        }
        i += 1;
    }

    // 第二轮: 剩余比特依次补给未满的子带
    let mut i = 0;
    while bitcount < bitpool && i < need.len() {
        if bits[i] < MAX_BITS {
            bits[i] += 1;
            bitcount += 1;
        }
        i += 1;
    }
}

/// 计算整帧的比特分配表
///
/// 相同的几何参数与比例因子总是得到相同的结果.
pub fn allocate(geometry: &FrameGeometry, scale_factors: &ScaleFactors) -> BitAllocation {
    let subbands = geometry.subbands();
    let bitpool = i32::from(geometry.bitpool());
    let mut bits = [[0u8; MAX_SUBBANDS]; MAX_CHANNELS];

    if geometry.channel_mode().shares_bitpool() {
        let need0 = bitneed(geometry, &scale_factors[0]);
        let need1 = bitneed(geometry, &scale_factors[1]);

        let mut need = [0i32; MAX_SUBBANDS * MAX_CHANNELS];
        for sb in 0..subbands {
            need[2 * sb] = need0[sb];
            need[2 * sb + 1] = need1[sb];
        }
        let mut shared = [0u8; MAX_SUBBANDS * MAX_CHANNELS];
        slice_bits(&need[..2 * subbands], bitpool, &mut shared[..2 * subbands]);

        for sb in 0..subbands {
            bits[0][sb] = shared[2 * sb];
            bits[1][sb] = shared[2 * sb + 1];
        }
    } else {
        for ch in 0..geometry.channels() {
            let need = bitneed(geometry, &scale_factors[ch]);
            slice_bits(&need[..subbands], bitpool, &mut bits[ch][..subbands]);
        }
    }

    bits
}

/// 分配表实际消耗的比特数 (每块)
pub fn bits_per_block(geometry: &FrameGeometry, bits: &BitAllocation) -> usize {
    bits[..geometry.channels()]
        .iter()
        .flat_map(|ch| &ch[..geometry.subbands()])
        .map(|&b| usize::from(b))
        .sum()
}
