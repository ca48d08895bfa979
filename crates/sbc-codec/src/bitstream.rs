//! 帧码流读写.
//!
//! ```text
//! +--------+----------------------------------+-------+
//! | 0x9C   | freq(2) blocks(2) mode(2)        | CRC-8 |
//! | / 0xAD | alloc(1) subbands(1) bitpool(8)  |       |
//! +--------+----------------------------------+-------+
//! | join[M] (仅联合立体声)                              |
//! | scale_factor[ch][sb] × 4 bit                        |
//! +-----------------------------------------------------+
//! | sample[blk][ch][sb] × bits[ch][sb]                  |
//! | 0 填充至字节边界                                    |
//! +-----------------------------------------------------+
//! ```
//!
//! 所有字段高位在前. mSBC 帧的第 1-2 字节保留为 0, 几何参数由同步字决定.
//! CRC 覆盖第 1-2 字节、联合立体声标志位和比例因子.
//! 联合立体声标志位位于比例因子之前, 与 A2DP 码流一致.
//! 校验顺序: 同步字、CRC 区域长度、CRC、几何参数、整帧长度.

use sbc_core::crc::{SBC_CRC_INIT, crc8_update};
use sbc_core::{BitReader, BitWriter, SbcError, SbcResult};

use crate::allocation::{BitAllocation, ScaleFactors, allocate};
use crate::config::{AllocationMethod, ChannelMode, SamplingFrequency};
use crate::geometry::{
    FrameGeometry, HEADER_SIZE, MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS, frame_len, side_info_bits,
};

/// SBC 同步字
pub const SBC_SYNCWORD: u8 = 0x9C;
/// mSBC 同步字
pub const MSBC_SYNCWORD: u8 = 0xAD;

/// 量化码字: `[块][声道][子带]`
pub type SampleCodes = [[[u16; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS];

/// 一帧的全部码流字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameData {
    pub geometry: FrameGeometry,
    /// 联合立体声标志, 下标为子带
    pub join: [bool; MAX_SUBBANDS],
    pub scale_factors: ScaleFactors,
    /// 由比例因子推导的分配表, 不写入码流
    pub bits: BitAllocation,
    pub codes: SampleCodes,
}

impl FrameData {
    /// 创建全零帧数据
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            join: [false; MAX_SUBBANDS],
            scale_factors: [[0; MAX_SUBBANDS]; MAX_CHANNELS],
            bits: [[0; MAX_SUBBANDS]; MAX_CHANNELS],
            codes: [[[0; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS],
        }
    }
}

/// 校验时要求的数据范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Coverage {
    /// 只要求 CRC 覆盖区域完整
    CrcRegion,
    /// 要求整帧完整
    FullFrame,
}

/// 帧头原始字段, bitpool 尚未校验
struct RawHeader {
    msbc: bool,
    subbands: usize,
    blocks: usize,
    sampling_frequency: SamplingFrequency,
    channel_mode: ChannelMode,
    allocation_method: AllocationMethod,
    bitpool: u8,
}

impl RawHeader {
    fn parse(data: &[u8]) -> SbcResult<Self> {
        let Some(&sync) = data.first() else {
            return Err(SbcError::TruncatedFrame {
                needed: HEADER_SIZE,
                actual: 0,
            });
        };
        if sync != SBC_SYNCWORD && sync != MSBC_SYNCWORD {
            return Err(SbcError::UnrecognizedSync(sync));
        }
        if data.len() < HEADER_SIZE {
            return Err(SbcError::TruncatedFrame {
                needed: HEADER_SIZE,
                actual: data.len(),
            });
        }

        if sync == MSBC_SYNCWORD {
            let g = FrameGeometry::msbc();
            return Ok(Self {
                msbc: true,
                subbands: g.subbands(),
                blocks: g.blocks(),
                sampling_frequency: g.sampling_frequency(),
                channel_mode: g.channel_mode(),
                allocation_method: g.allocation_method(),
                bitpool: g.bitpool(),
            });
        }

        let mut br = BitReader::new(&data[1..3]);
        let freq = br.read_bits(2)? as u8;
        let blocks = br.read_bits(2)? as usize;
        let mode = br.read_bits(2)? as u8;
        let alloc = br.read_bits(1)? as u8;
        let subbands = br.read_bits(1)?;
        let bitpool = br.read_bits(8)? as u8;

        // 2 位/1 位字段的所有取值都有定义
        let field = |name: &str| SbcError::InvalidParameter(format!("帧头字段 {} 无效", name));
        Ok(Self {
            msbc: false,
            subbands: if subbands == 1 { 8 } else { 4 },
            blocks: 4 * (blocks + 1),
            sampling_frequency: SamplingFrequency::from_code(freq).ok_or_else(|| field("freq"))?,
            channel_mode: ChannelMode::from_code(mode).ok_or_else(|| field("mode"))?,
            allocation_method: AllocationMethod::from_code(alloc).ok_or_else(|| field("alloc"))?,
            bitpool,
        })
    }

    fn side_info_bits(&self) -> usize {
        side_info_bits(self.subbands, self.channel_mode)
    }

    fn frame_size(&self) -> usize {
        frame_len(self.subbands, self.blocks, self.channel_mode, self.bitpool)
    }

    fn geometry(&self) -> SbcResult<FrameGeometry> {
        FrameGeometry::new(
            self.subbands,
            self.blocks,
            self.sampling_frequency,
            self.channel_mode,
            self.allocation_method,
            self.bitpool,
            self.msbc,
        )
    }
}

/// 计算帧的 CRC: 第 1-2 字节 + 第 4 字节起的 `side_bits` 位
fn frame_crc(data: &[u8], side_bits: usize) -> u8 {
    let crc = crc8_update(SBC_CRC_INIT, &data[1..3], 16);
    crc8_update(crc, &data[HEADER_SIZE..], side_bits)
}

/// 按 同步字 -> CRC 区域长度 -> CRC -> 几何参数 -> 整帧长度 的顺序校验帧头
///
/// 整帧长度由帧头字段推导, 只有 CRC 通过后才可信.
pub(crate) fn validate_header(data: &[u8], coverage: Coverage) -> SbcResult<FrameGeometry> {
    let header = RawHeader::parse(data)?;

    let side_bits = header.side_info_bits();
    let crc_region = HEADER_SIZE + side_bits.div_ceil(8);
    if data.len() < crc_region {
        return Err(SbcError::TruncatedFrame {
            needed: crc_region,
            actual: data.len(),
        });
    }

    let computed = frame_crc(data, side_bits);
    if computed != data[3] {
        return Err(SbcError::CorruptFrame {
            expected: data[3],
            computed,
        });
    }

    let geometry = header.geometry()?;
    if coverage == Coverage::FullFrame && data.len() < header.frame_size() {
        return Err(SbcError::TruncatedFrame {
            needed: header.frame_size(),
            actual: data.len(),
        });
    }
    Ok(geometry)
}

/// 将帧数据打包为字节, 长度恒为 `geometry.frame_size()`
pub fn write_frame(frame: &FrameData) -> Vec<u8> {
    let g = &frame.geometry;
    let subbands = g.subbands();
    let channels = g.channels();
    let frame_size = g.frame_size();

    let mut bw = BitWriter::with_capacity(frame_size);
    if g.is_msbc() {
        bw.write_bits(u32::from(MSBC_SYNCWORD), 8);
        bw.write_bits(0, 16);
    } else {
        bw.write_bits(u32::from(SBC_SYNCWORD), 8);
        bw.write_bits(u32::from(g.sampling_frequency().code()), 2);
        bw.write_bits((g.blocks() / 4 - 1) as u32, 2);
        bw.write_bits(u32::from(g.channel_mode().code()), 2);
        bw.write_bits(u32::from(g.allocation_method().code()), 1);
        bw.write_bits(u32::from(subbands == 8), 1);
        bw.write_bits(u32::from(g.bitpool()), 8);
    }
    // CRC 占位, 打包完成后回填
    bw.write_bits(0, 8);

    if g.channel_mode() == ChannelMode::JointStereo {
        for &join in &frame.join[..subbands] {
            bw.write_flag(join);
        }
    }
    for ch in 0..channels {
        for &sf in &frame.scale_factors[ch][..subbands] {
            bw.write_bits(u32::from(sf), 4);
        }
    }

    for blk in 0..g.blocks() {
        for ch in 0..channels {
            for sb in 0..subbands {
                let bits = frame.bits[ch][sb];
                if bits > 0 {
                    bw.write_bits(u32::from(frame.codes[blk][ch][sb]), u32::from(bits));
                }
            }
        }
    }

    let mut out = bw.finish();
    // 分配表未用满 bitpool 时补齐到固定帧长
    out.resize(frame_size, 0);
    out[3] = frame_crc(&out, g.side_info_bits());
    out
}

/// 解析一帧, 多余的尾部字节被忽略
pub fn read_frame(data: &[u8]) -> SbcResult<FrameData> {
    let geometry = validate_header(data, Coverage::FullFrame)?;
    let subbands = geometry.subbands();
    let channels = geometry.channels();

    let mut frame = FrameData::new(geometry);
    let mut br = BitReader::new(&data[HEADER_SIZE..geometry.frame_size()]);

    if geometry.channel_mode() == ChannelMode::JointStereo {
        for join in &mut frame.join[..subbands] {
            *join = br.read_flag()?;
        }
    }
    for ch in 0..channels {
        for sf in &mut frame.scale_factors[ch][..subbands] {
            *sf = br.read_bits(4)? as u8;
        }
    }

    frame.bits = allocate(&geometry, &frame.scale_factors);

    for blk in 0..geometry.blocks() {
        for ch in 0..channels {
            for sb in 0..subbands {
                let bits = frame.bits[ch][sb];
                if bits > 0 {
                    frame.codes[blk][ch][sb] = br.read_bits(u32::from(bits))? as u16;
                }
            }
        }
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SbcConfig;

    fn zero_frame(geometry: FrameGeometry) -> FrameData {
        let mut frame = FrameData::new(geometry);
        frame.bits = allocate(&geometry, &frame.scale_factors);
        frame
    }

    #[test]
    fn test_header_layout() {
        let g = SbcConfig::default().geometry().unwrap();
        let data = write_frame(&zero_frame(g));
        assert_eq!(data.len(), 72);
        assert_eq!(data[0], SBC_SYNCWORD);
        // 16kHz(00) 16块(11) 单声道(00) 响度(0) 8子带(1)
        assert_eq!(data[1], 0b0011_0001);
        assert_eq!(data[2], 32);
    }

    #[test]
    fn test_msbc_reserved_header_bytes() {
        let data = write_frame(&zero_frame(FrameGeometry::msbc()));
        assert_eq!(data[0], MSBC_SYNCWORD);
        assert_eq!(&data[1..3], &[0, 0]);
        assert_eq!(data.len(), 60);
        assert_eq!(read_frame(&data).unwrap().geometry, FrameGeometry::msbc());
    }

    #[test]
    fn test_joint_stereo_write_read() {
        let g = SbcConfig::default()
            .with_channel_mode(ChannelMode::JointStereo)
            .with_sampling_frequency(SamplingFrequency::Hz44100)
            .with_bitpool(35)
            .geometry()
            .unwrap();
        let mut frame = FrameData::new(g);
        frame.join = [true, false, true, true, false, false, true, false];
        frame.scale_factors = [[9, 8, 7, 6, 5, 4, 3, 2], [1, 3, 5, 7, 9, 11, 13, 15]];
        frame.bits = allocate(&g, &frame.scale_factors);
        for blk in 0..g.blocks() {
            for ch in 0..2 {
                for sb in 0..8 {
                    let bits = frame.bits[ch][sb];
                    if bits > 0 {
                        let max = (1u32 << bits) - 2;
                        frame.codes[blk][ch][sb] = ((blk * 7 + ch * 3 + sb) as u32 % (max + 1)) as u16;
                    }
                }
            }
        }

        let data = write_frame(&frame);
        assert_eq!(data.len(), g.frame_size());
        // 联合立体声标志紧跟 CRC, 其后才是比例因子
        assert_eq!(data[4], 0b1011_0010);
        assert_eq!(data[5], 0x98);
        assert_eq!(read_frame(&data).unwrap(), frame);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let g = SbcConfig::default().geometry().unwrap();
        let mut data = write_frame(&zero_frame(g));
        let frame = read_frame(&data).unwrap();
        data.extend_from_slice(&[0xFF; 10]);
        assert_eq!(read_frame(&data).unwrap(), frame);
    }

    #[test]
    fn test_校验顺序() {
        let g = SbcConfig::default().geometry().unwrap();
        let data = write_frame(&zero_frame(g));

        // 同步字优先于长度
        assert_eq!(read_frame(&[0x12]), Err(SbcError::UnrecognizedSync(0x12)));
        assert_eq!(
            read_frame(&[]),
            Err(SbcError::TruncatedFrame {
                needed: 4,
                actual: 0
            })
        );
        // CRC 区域不完整
        assert_eq!(
            read_frame(&data[..6]),
            Err(SbcError::TruncatedFrame {
                needed: 8,
                actual: 6
            })
        );
        // CRC 通过后才检查整帧长度
        assert_eq!(
            read_frame(&data[..71]),
            Err(SbcError::TruncatedFrame {
                needed: 72,
                actual: 71
            })
        );
        // CRC 优先于几何参数: 改成非法 bitpool 但不修正 CRC
        let mut bad = data.clone();
        bad[2] = 1;
        assert!(matches!(read_frame(&bad), Err(SbcError::CorruptFrame { .. })));
    }

    #[test]
    fn test_header_bit_flip_is_corrupt_not_truncated() {
        let g = SbcConfig::default().geometry().unwrap();
        let data = write_frame(&zero_frame(g));
        // 第 12 位为声道模式高位: 单声道 -> 双声道, 推导帧长变大
        let mut bad = data.clone();
        bad[1] ^= 0x08;
        assert!(matches!(read_frame(&bad), Err(SbcError::CorruptFrame { .. })));
        // bitpool 翻转最高位
        let mut bad = data.clone();
        bad[2] ^= 0x80;
        assert!(matches!(read_frame(&bad), Err(SbcError::CorruptFrame { .. })));
    }

    #[test]
    fn test_valid_crc_invalid_bitpool() {
        let g = SbcConfig::default().geometry().unwrap();
        let mut data = write_frame(&zero_frame(g));
        data[2] = 1;
        let side_bits = g.side_info_bits();
        data[3] = frame_crc(&data, side_bits);
        assert!(matches!(
            read_frame(&data),
            Err(SbcError::InvalidParameter(_))
        ));
    }
}
