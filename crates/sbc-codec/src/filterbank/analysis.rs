//! 分析滤波器组 (仅编码端使用).

use super::tables::{COS_FRAC_BITS, WINDOW_FRAC_BITS, filter_tables};
use super::{SUBBAND_FRAC_BITS, round_shift};
use crate::geometry::MAX_SUBBANDS;

/// 单声道分析滤波器状态
#[derive(Debug, Clone)]
pub struct AnalysisFilter {
    subbands: usize,
    /// 输入历史 X, 长度 10M, X[0] 为最新样本
    history: [i32; 10 * MAX_SUBBANDS],
}

impl AnalysisFilter {
    pub fn new(subbands: usize) -> Self {
        Self {
            subbands,
            history: [0; 10 * MAX_SUBBANDS],
        }
    }

    pub fn subbands(&self) -> usize {
        self.subbands
    }

    /// 清空历史
    pub fn reset(&mut self) {
        self.history = [0; 10 * MAX_SUBBANDS];
    }

    /// 处理一个块: `input` 为时间顺序的 M 个 PCM 样本, `output` 接收 M 个 Q8 子带样本
    pub fn process(&mut self, input: &[i16], output: &mut [i32]) {
        let m = self.subbands;
        let tables = filter_tables(m);
        let x = &mut self.history[..10 * m];

        x.copy_within(0..9 * m, m);
        for (i, &sample) in input[..m].iter().enumerate() {
            x[m - 1 - i] = i32::from(sample);
        }

        let mut y = [0i64; 2 * MAX_SUBBANDS];
        for (i, yi) in y[..2 * m].iter_mut().enumerate() {
            *yi = (0..5)
                .map(|j| {
                    let idx = i + 2 * m * j;
                    i64::from(tables.analysis_window[idx]) * i64::from(x[idx])
                })
                .sum();
        }

        let shift = WINDOW_FRAC_BITS + COS_FRAC_BITS - SUBBAND_FRAC_BITS;
        for (k, out) in output[..m].iter_mut().enumerate() {
            let row = &tables.analysis_matrix[k * 2 * m..(k + 1) * 2 * m];
            let acc: i64 = row
                .iter()
                .zip(&y[..2 * m])
                .map(|(&c, &yi)| i64::from(c) * yi)
                .sum();
            *out = round_shift(acc, shift) as i32;
        }
    }
}
