//! SBC 编码器.
//!
//! 每次调用 `encode` 消耗恰好一帧 PCM (`blocks × subbands` 个采样/声道),
//! 输出恰好 `frame_size()` 字节. 分析滤波器历史在帧之间保留.

use log::debug;
use sbc_core::{SbcError, SbcResult};

use crate::allocation::allocate;
use crate::bitstream::{FrameData, write_frame};
use crate::config::{ChannelMode, SbcConfig};
use crate::filterbank::{AnalysisFilter, SubbandSamples};
use crate::geometry::{FrameGeometry, MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS};
use crate::quantizer::{SUBBAND_LIMIT, quantize, scale_factor};

/// SBC 编码器
pub struct SbcEncoder {
    geometry: FrameGeometry,
    /// 每声道一个分析滤波器
    filters: Vec<AnalysisFilter>,
}

impl SbcEncoder {
    /// 从配置创建编码器, 参数非法时不会构造出编码器
    pub fn new(config: &SbcConfig) -> SbcResult<Self> {
        Ok(Self::with_geometry(config.geometry()?))
    }

    /// 从已校验的几何参数创建编码器
    pub fn with_geometry(geometry: FrameGeometry) -> Self {
        debug!(
            "打开 SBC 编码器: {} 子带, {} 块, {}, {}, {}, bitpool={}, 帧长={} 字节{}",
            geometry.subbands(),
            geometry.blocks(),
            geometry.sampling_frequency(),
            geometry.channel_mode(),
            geometry.allocation_method(),
            geometry.bitpool(),
            geometry.frame_size(),
            if geometry.is_msbc() { " (mSBC)" } else { "" },
        );
        let filters = (0..geometry.channels())
            .map(|_| AnalysisFilter::new(geometry.subbands()))
            .collect();
        Self { geometry, filters }
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// 帧长度 (字节)
    pub fn frame_size(&self) -> usize {
        self.geometry.frame_size()
    }

    /// 码率 (bit/s)
    pub fn bitrate(&self) -> u32 {
        self.geometry.bitrate()
    }

    /// 每声道每帧采样数
    pub fn frame_samples(&self) -> usize {
        self.geometry.frame_samples()
    }

    pub fn channels(&self) -> usize {
        self.geometry.channels()
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.geometry.sample_rate_hz()
    }

    /// 清空滤波器历史, 保留配置
    pub fn reset(&mut self) {
        debug!("重置 SBC 编码器");
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    /// 编码一帧交错 PCM (双声道时为 L, R, L, R, ...)
    pub fn encode(&mut self, pcm: &[i16]) -> SbcResult<Vec<u8>> {
        let expected = self.geometry.pcm_samples();
        if pcm.len() != expected {
            return Err(SbcError::SizeMismatch {
                expected,
                actual: pcm.len(),
            });
        }
        let channels = self.channels();
        Ok(self.encode_with(|ch, t| pcm[t * channels + ch]))
    }

    /// 编码一帧平面 PCM, 每个切片对应一个声道
    pub fn encode_planar(&mut self, planes: &[&[i16]]) -> SbcResult<Vec<u8>> {
        if planes.len() != self.channels() {
            return Err(SbcError::InvalidParameter(format!(
                "声道数不匹配: 期望 {}, 实际 {}",
                self.channels(),
                planes.len(),
            )));
        }
        let expected = self.frame_samples();
        if let Some(plane) = planes.iter().find(|p| p.len() != expected) {
            return Err(SbcError::SizeMismatch {
                expected,
                actual: plane.len(),
            });
        }
        Ok(self.encode_with(|ch, t| planes[ch][t]))
    }

    /// 编码核心: `sample(ch, t)` 返回声道 `ch` 第 `t` 个采样
    fn encode_with(&mut self, sample: impl Fn(usize, usize) -> i16) -> Vec<u8> {
        let g = self.geometry;
        let subbands = g.subbands();
        let blocks = g.blocks();
        let channels = g.channels();

        let mut sb: SubbandSamples = [[[0; MAX_SUBBANDS]; MAX_BLOCKS]; MAX_CHANNELS];
        let mut input = [0i16; MAX_SUBBANDS];
        for blk in 0..blocks {
            for ch in 0..channels {
                for (i, x) in input[..subbands].iter_mut().enumerate() {
                    *x = sample(ch, blk * subbands + i);
                }
                let out = &mut sb[ch][blk][..subbands];
                self.filters[ch].process(&input[..subbands], out);
                for s in out.iter_mut() {
                    *s = (*s).clamp(-SUBBAND_LIMIT, SUBBAND_LIMIT);
                }
            }
        }

        let mut frame = FrameData::new(g);
        for ch in 0..channels {
            for k in 0..subbands {
                frame.scale_factors[ch][k] = scale_factor((0..blocks).map(|b| sb[ch][b][k]));
            }
        }

        if g.channel_mode() == ChannelMode::JointStereo {
            select_joint_subbands(&g, &mut sb, &mut frame);
        }

        frame.bits = allocate(&g, &frame.scale_factors);

        for blk in 0..blocks {
            for ch in 0..channels {
                for k in 0..subbands {
                    let bits = frame.bits[ch][k];
                    if bits > 0 {
                        frame.codes[blk][ch][k] =
                            quantize(sb[ch][blk][k], frame.scale_factors[ch][k], bits);
                    }
                }
            }
        }

        write_frame(&frame)
    }
}

/// 逐子带比较 L/R 与 M/S 的比例因子之和, M/S 更小时改用和差编码
///
/// 最后一个子带始终保持 L/R.
fn select_joint_subbands(geometry: &FrameGeometry, sb: &mut SubbandSamples, frame: &mut FrameData) {
    let blocks = geometry.blocks();
    let [left, right] = sb;

    for k in 0..geometry.subbands() - 1 {
        let mut mid = [0i32; MAX_BLOCKS];
        let mut side = [0i32; MAX_BLOCKS];
        for b in 0..blocks {
            mid[b] = (left[b][k] + right[b][k]) >> 1;
            side[b] = (left[b][k] - right[b][k]) >> 1;
        }
        let sf_mid = scale_factor(mid[..blocks].iter().copied());
        let sf_side = scale_factor(side[..blocks].iter().copied());

        let [sf_left, sf_right] = [frame.scale_factors[0][k], frame.scale_factors[1][k]];
        if sf_mid + sf_side < sf_left + sf_right {
            frame.join[k] = true;
            frame.scale_factors[0][k] = sf_mid;
            frame.scale_factors[1][k] = sf_side;
            for b in 0..blocks {
                left[b][k] = mid[b];
                right[b][k] = side[b];
            }
        }
    }
}
