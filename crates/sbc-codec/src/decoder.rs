//! SBC 解码器.
//!
//! 每次调用 `decode` 消耗一帧, 输出 `blocks × subbands` 个采样/声道.
//! 帧头描述的参数与当前不同时以码流为准: 解码器切换到新参数,
//! 若子带数或声道数变化则同时清空合成滤波器历史.

use log::debug;
use sbc_core::SbcResult;

use crate::bitstream::read_frame;
use crate::config::SbcConfig;
use crate::filterbank::{SubbandSamples, SynthesisFilter};
use crate::geometry::{FrameGeometry, MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS};
use crate::quantizer::dequantize;

/// SBC 解码器
pub struct SbcDecoder {
    geometry: FrameGeometry,
    /// 每声道一个合成滤波器
    filters: Vec<SynthesisFilter>,
}

impl SbcDecoder {
    /// 从配置创建解码器
    pub fn new(config: &SbcConfig) -> SbcResult<Self> {
        Ok(Self::with_geometry(config.geometry()?))
    }

    /// 从已校验的几何参数创建解码器
    pub fn with_geometry(geometry: FrameGeometry) -> Self {
        debug!(
            "打开 SBC 解码器: {} 子带, {} 块, {}, {}",
            geometry.subbands(),
            geometry.blocks(),
            geometry.sampling_frequency(),
            geometry.channel_mode(),
        );
        Self {
            geometry,
            filters: Self::build_filters(&geometry),
        }
    }

    fn build_filters(geometry: &FrameGeometry) -> Vec<SynthesisFilter> {
        (0..geometry.channels())
            .map(|_| SynthesisFilter::new(geometry.subbands()))
            .collect()
    }

    /// 当前几何参数 (最近一次成功解码的帧头)
    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn frame_size(&self) -> usize {
        self.geometry.frame_size()
    }

    pub fn bitrate(&self) -> u32 {
        self.geometry.bitrate()
    }

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
        debug!("重置 SBC 解码器");
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    /// 解码一帧, 输出交错 PCM (双声道时为 L, R, L, R, ...)
    pub fn decode(&mut self, frame: &[u8]) -> SbcResult<Vec<i16>> {
        let sb = self.decode_subbands(frame)?;
        let channels = self.channels();
        let mut pcm = vec![0i16; self.geometry.pcm_samples()];
        self.synthesize(&sb, |ch, t, sample| pcm[t * channels + ch] = sample);
        Ok(pcm)
    }

    /// 解码一帧, 每个声道输出一个 Vec
    pub fn decode_planar(&mut self, frame: &[u8]) -> SbcResult<Vec<Vec<i16>>> {
        let sb = self.decode_subbands(frame)?;
        let mut planes = vec![vec![0i16; self.frame_samples()]; self.channels()];
        self.synthesize(&sb, |ch, t, sample| planes[ch][t] = sample);
        Ok(planes)
    }

    /// 解析码流并反量化, 得到子带样本 (联合立体声已还原为 L/R)
    fn decode_subbands(&mut self, data: &[u8]) -> SbcResult<SubbandSamples> {
        let frame = read_frame(data)?;
        self.adopt(frame.geometry);

        let g = frame.geometry;
        let mut sb: SubbandSamples = [[[0; MAX_SUBBANDS]; MAX_BLOCKS]; MAX_CHANNELS];
        for blk in 0..g.blocks() {
            for ch in 0..g.channels() {
                for k in 0..g.subbands() {
                    sb[ch][blk][k] = dequantize(
                        frame.codes[blk][ch][k],
                        frame.scale_factors[ch][k],
                        frame.bits[ch][k],
                    );
                }
            }
        }

        let [left, right] = &mut sb;
        for k in (0..g.subbands()).filter(|&k| frame.join[k]) {
            for blk in 0..g.blocks() {
                let (mid, side) = (left[blk][k], right[blk][k]);
                left[blk][k] = mid + side;
                right[blk][k] = mid - side;
            }
        }

        Ok(sb)
    }

    /// 切换到帧头给出的几何参数
    fn adopt(&mut self, geometry: FrameGeometry) {
        if geometry == self.geometry {
            return;
        }
        let reshaped = geometry.subbands() != self.geometry.subbands()
            || geometry.channels() != self.geometry.channels();
        debug!(
            "SBC 帧参数变化: {} 子带/{}/bitpool {} -> {} 子带/{}/bitpool {}",
            self.geometry.subbands(),
            self.geometry.channel_mode(),
            self.geometry.bitpool(),
            geometry.subbands(),
            geometry.channel_mode(),
            geometry.bitpool(),
        );
        if reshaped {
            self.filters = Self::build_filters(&geometry);
        }
        self.geometry = geometry;
    }

    fn synthesize(&mut self, sb: &SubbandSamples, mut sink: impl FnMut(usize, usize, i16)) {
        let subbands = self.geometry.subbands();
        let mut out = [0i16; MAX_SUBBANDS];
        for blk in 0..self.geometry.blocks() {
            for (ch, filter) in self.filters.iter_mut().enumerate() {
                filter.process(&sb[ch][blk][..subbands], &mut out[..subbands]);
                for (i, &sample) in out[..subbands].iter().enumerate() {
                    sink(ch, blk * subbands + i, sample);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelMode, SamplingFrequency};
    use crate::encoder::SbcEncoder;
    use sbc_core::SbcError;

    #[test]
    fn test_silent_frame_decodes_to_zero() {
        let mut frame = vec![0x9C, 0x31, 0x20, 0x7E, 0, 0, 0, 0];
        frame.extend_from_slice(&[0x77; 64]);
        let mut dec = SbcDecoder::new(&SbcConfig::default()).unwrap();
        for _ in 0..3 {
            assert_eq!(dec.decode(&frame).unwrap(), vec![0i16; 128]);
        }
    }

    #[test]
    fn test_error_kinds() {
        let mut dec = SbcDecoder::new(&SbcConfig::default()).unwrap();
        assert_eq!(dec.decode(&[0x00; 72]), Err(SbcError::UnrecognizedSync(0x00)));
        assert!(matches!(
            dec.decode(&[0x9C, 0x31]),
            Err(SbcError::TruncatedFrame { needed: 4, actual: 2 })
        ));

        let mut frame = vec![0x9C, 0x31, 0x20, 0x7E, 0, 0, 0, 0];
        frame.extend_from_slice(&[0x77; 64]);
        frame[5] ^= 0x10;
        assert!(matches!(
            dec.decode(&frame),
            Err(SbcError::CorruptFrame { expected: 0x7E, .. })
        ));
    }

    #[test]
    fn test_adopts_stream_geometry() {
        let stereo = SbcConfig::default()
            .with_channel_mode(ChannelMode::Stereo)
            .with_sampling_frequency(SamplingFrequency::Hz48000)
            .with_subbands(4)
            .with_blocks(8);
        let mut enc = SbcEncoder::new(&stereo).unwrap();
        let frame = enc.encode(&[100; 64]).unwrap();

        // 解码器按默认单声道配置打开
        let mut dec = SbcDecoder::new(&SbcConfig::default()).unwrap();
        let pcm = dec.decode(&frame).unwrap();
        assert_eq!(pcm.len(), 64);
        assert_eq!(dec.channels(), 2);
        assert_eq!(dec.sample_rate_hz(), 48000);
        assert_eq!(dec.geometry(), enc.geometry());
    }

    #[test]
    fn test_planar_matches_interleaved() {
        let config = SbcConfig::default().with_channel_mode(ChannelMode::DualChannel);
        let mut enc = SbcEncoder::new(&config).unwrap();
        let pcm: Vec<i16> = (0..256).map(|i| ((i * 97) % 8000) as i16 - 4000).collect();
        let frame = enc.encode(&pcm).unwrap();

        let mut a = SbcDecoder::new(&config).unwrap();
        let mut b = SbcDecoder::new(&config).unwrap();
        let interleaved = a.decode(&frame).unwrap();
        let planes = b.decode_planar(&frame).unwrap();
        assert_eq!(planes.len(), 2);
        for t in 0..128 {
            assert_eq!(interleaved[2 * t], planes[0][t]);
            assert_eq!(interleaved[2 * t + 1], planes[1][t]);
        }
    }

    #[test]
    fn test_reset_matches_fresh_decoder() {
        let mut enc = SbcEncoder::new(&SbcConfig::default()).unwrap();
        let pcm: Vec<i16> = (0..128).map(|i| (i * 150) as i16 - 9000).collect();
        let f1 = enc.encode(&pcm).unwrap();
        let f2 = enc.encode(&pcm).unwrap();

        let mut dec = SbcDecoder::new(&SbcConfig::default()).unwrap();
        let first = dec.decode(&f2).unwrap();
        dec.decode(&f1).unwrap();
        dec.reset();
        assert_eq!(dec.decode(&f2).unwrap(), first);
    }
}
