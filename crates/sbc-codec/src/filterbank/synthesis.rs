//! 合成滤波器组 (仅解码端使用).

use super::tables::{COS_FRAC_BITS, WINDOW_FRAC_BITS, filter_tables};
use super::{SUBBAND_FRAC_BITS, round_shift};
use crate::geometry::MAX_SUBBANDS;

/// 单声道合成滤波器状态
#[derive(Debug, Clone)]
pub struct SynthesisFilter {
    subbands: usize,
    /// FIFO V, 长度 20M, Q8
    fifo: [i32; 20 * MAX_SUBBANDS],
}

impl SynthesisFilter {
    pub fn new(subbands: usize) -> Self {
        Self {
            subbands,
            fifo: [0; 20 * MAX_SUBBANDS],
        }
    }

    pub fn subbands(&self) -> usize {
        self.subbands
    }

    /// 清空历史
    pub fn reset(&mut self) {
        self.fifo = [0; 20 * MAX_SUBBANDS];
    }

    /// 处理一个块: `input` 为 M 个 Q8 子带样本, `output` 接收时间顺序的 M 个 PCM 样本
    pub fn process(&mut self, input: &[i32], output: &mut [i16]) {
        let m = self.subbands;
        let tables = filter_tables(m);
        let v = &mut self.fifo[..20 * m];

        v.copy_within(0..18 * m, 2 * m);
        for (k, vk) in v[..2 * m].iter_mut().enumerate() {
            let row = &tables.synthesis_matrix[k * m..(k + 1) * m];
            let acc: i64 = row
                .iter()
                .zip(&input[..m])
                .map(|(&c, &s)| i64::from(c) * i64::from(s))
                .sum();
            *vk = round_shift(acc, COS_FRAC_BITS) as i32;
        }

        let mut u = [0i32; 10 * MAX_SUBBANDS];
        for i in 0..5 {
            for j in 0..m {
                u[i * 2 * m + j] = v[i * 4 * m + j];
                u[i * 2 * m + m + j] = v[i * 4 * m + 3 * m + j];
            }
        }

        let shift = WINDOW_FRAC_BITS + SUBBAND_FRAC_BITS;
        for (j, out) in output[..m].iter_mut().enumerate() {
            let acc: i64 = (0..10)
                .map(|i| {
                    let idx = j + m * i;
                    i64::from(tables.synthesis_window[idx]) * i64::from(u[idx])
                })
                .sum();
            *out = round_shift(acc, shift).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
        }
    }
}
