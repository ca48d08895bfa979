//! MSB 优先的比特读取器.
//!
//! SBC 帧内的所有字段 (帧头, 联合立体声标志, 比例因子, 样本码字) 都按高位在前
//! 紧密排列, 不做字节对齐. 读取器只维护一个位偏移.

use crate::{SbcError, SbcResult};

/// 比特读取器
///
/// ```
/// use sbc_core::BitReader;
///
/// // 0x31: 16 kHz, 16 块, 单声道, 响度分配, 8 子带
/// let mut br = BitReader::new(&[0x31, 0x20]);
/// assert_eq!(br.read_bits(2).unwrap(), 0);
/// assert_eq!(br.read_bits(2).unwrap(), 3);
/// br.skip(3).unwrap();
/// assert!(br.read_flag().unwrap());
/// assert_eq!(br.read_bits(8).unwrap(), 32);
/// assert_eq!(br.remaining(), 0);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已消费的位数
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已读取的位数
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可读位数
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// 读取 1 位标志
    pub fn read_flag(&mut self) -> SbcResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// 读取 `n` 位 (0..=32), 结果右对齐
    pub fn read_bits(&mut self, n: u32) -> SbcResult<u32> {
        if n > 32 {
            return Err(SbcError::InvalidParameter(format!("一次最多读取 32 位, 请求 {n}")));
        }
        if n == 0 {
            return Ok(0);
        }
        let n = n as usize;
        if n > self.remaining() {
            return Err(SbcError::Eof);
        }

        // 覆盖目标位的字节窗口最多 5 字节
        let first = self.pos / 8;
        let last = (self.pos + n - 1) / 8;
        let window = self.data[first..=last]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        let tail = (last - first + 1) * 8 - self.pos % 8 - n;

        self.pos += n;
        Ok(((window >> tail) & ((1u64 << n) - 1)) as u32)
    }

    /// 跳过 `n` 位
    pub fn skip(&mut self, n: usize) -> SbcResult<()> {
        if n > self.remaining() {
            return Err(SbcError::Eof);
        }
        self.pos += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_across_bytes() {
        // 4 位比例因子交替, 随后一个跨 3 字节的 13 位码字
        let data = [0x5A, 0xF0, 0x0F, 0xFF];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(4).unwrap(), 0x5);
        assert_eq!(br.read_bits(4).unwrap(), 0xA);
        assert_eq!(br.read_bits(3).unwrap(), 0b111);
        assert_eq!(br.read_bits(13).unwrap(), 0b1_0000_0000_1111);
        assert_eq!(br.position(), 24);
        assert_eq!(br.read_bits(8).unwrap(), 0xFF);
    }

    #[test]
    fn test_unaligned_32_bit_read() {
        let data = [0x80, 0x12, 0x34, 0x56, 0x78, 0x80];
        let mut br = BitReader::new(&data);
        assert!(br.read_flag().unwrap());
        br.skip(7).unwrap();
        assert_eq!(br.read_bits(32).unwrap(), 0x1234_5678);
        assert!(br.read_flag().unwrap());
        assert_eq!(br.remaining(), 7);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut br = BitReader::new(&[0xAB]);
        assert_eq!(br.read_bits(9), Err(SbcError::Eof));
        // 失败的读取不移动位置
        assert_eq!(br.position(), 0);
        assert_eq!(br.read_bits(0).unwrap(), 0);
        assert!(matches!(br.read_bits(33), Err(SbcError::InvalidParameter(_))));
        br.skip(8).unwrap();
        assert_eq!(br.read_flag(), Err(SbcError::Eof));
        assert_eq!(br.skip(1), Err(SbcError::Eof));
    }
}
