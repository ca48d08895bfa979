//! CRC 校验和计算.
//!
//! SBC 帧头使用 CRC-8 (多项式 x^8+x^4+x^3+x^2+1, 即 0x1D, 初始值 0x0F).
//! 校验范围包括帧头第 1-2 字节以及后续的联合立体声标志位和比例因子,
//! 后者的长度不一定是整字节, 因此提供按位长度计算的接口.

/// SBC CRC-8 多项式
pub const SBC_CRC_POLY: u8 = 0x1D;

/// SBC CRC-8 初始值
pub const SBC_CRC_INIT: u8 = 0x0F;

/// CRC-8 查找表 (多项式 0x1D)
const CRC8_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0u16;
    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;
        while j < 8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ SBC_CRC_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// 在已有 CRC 值上继续累加 `nbits` 个位
///
/// 前 `nbits / 8` 个整字节查表处理, 剩余不足一字节的位从下一字节的最高位开始逐位处理.
/// `data` 必须至少包含 `ceil(nbits / 8)` 个字节.
pub fn crc8_update(crc: u8, data: &[u8], nbits: usize) -> u8 {
    let octets = nbits / 8;
    let mut crc = crc;
    for &byte in &data[..octets] {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }

    let tail = nbits % 8;
    if tail > 0 {
        let mut octet = data[octets];
        for _ in 0..tail {
            let bit = (octet ^ crc) & 0x80;
            crc <<= 1;
            if bit != 0 {
                crc ^= SBC_CRC_POLY;
            }
            octet <<= 1;
        }
    }
    crc
}

/// 计算整字节数据的 SBC CRC-8
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(SBC_CRC_INIT, data, data.len() * 8)
}
