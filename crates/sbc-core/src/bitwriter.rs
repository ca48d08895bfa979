//! MSB 优先的比特写入器, 与 [`BitReader`](crate::BitReader) 的位序一致.

/// 比特写入器
///
/// 未满 8 位的部分暂存在累加器中, [`finish`](Self::finish) 时以 0 补足最后一字节.
///
/// ```
/// use sbc_core::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0x9C, 8);
/// bw.write_bits(0b0011, 4);
/// bw.write_flag(true);
/// assert_eq!(bw.bit_len(), 13);
/// assert_eq!(bw.finish(), vec![0x9C, 0b0011_1000]);
/// ```
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// 尚未成字节的低位
    acc: u64,
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预分配 `bytes` 字节
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// 已写入的位数
    pub fn bit_len(&self) -> usize {
        self.buf.len() * 8 + self.pending as usize
    }

    pub fn write_flag(&mut self, flag: bool) {
        self.write_bits(u32::from(flag), 1);
    }

    /// 写入 `value` 的低 `n` 位 (0..=32)
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "一次最多写入 32 位, 请求 {n}");
        if n == 0 {
            return;
        }
        let bits = u64::from(value) & ((1u64 << n) - 1);
        self.acc = (self.acc << n) | bits;
        self.pending += n;
        while self.pending >= 8 {
            self.pending -= 8;
            self.buf.push((self.acc >> self.pending) as u8);
        }
        self.acc &= (1u64 << self.pending) - 1;
    }

    /// 结束写入, 不足一字节的尾部补 0
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending > 0 {
            self.buf.push((self.acc << (8 - self.pending)) as u8);
        }
        self.buf
    }
}
