//! 原始 s16le PCM 读写与声道拆分.

use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 读取整个 s16le 文件, 末尾不足一个采样的字节被丢弃
pub fn read_s16le(path: &Path) -> Result<Vec<i16>> {
    let bytes =
        fs::read(path).with_context(|| format!("无法读取输入文件 '{}'", path.display()))?;
    Ok(bytes_to_samples(&bytes))
}

pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    if bytes.len() % 2 != 0 {
        warn!("PCM 数据长度为奇数 ({} 字节), 丢弃最后 1 字节", bytes.len());
    }
    let mut samples = vec![0i16; bytes.len() / 2];
    LittleEndian::read_i16_into(&bytes[..samples.len() * 2], &mut samples);
    samples
}

/// 写出 s16le 文件
pub fn write_s16le(path: &Path, samples: &[i16]) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("无法创建输出文件 '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_samples(&mut writer, samples)?;
    writer.flush().context("写出 PCM 失败")
}

/// 追加写出一段采样
pub fn write_samples(writer: &mut impl Write, samples: &[i16]) -> Result<()> {
    let mut buf = vec![0u8; samples.len() * 2];
    LittleEndian::write_i16_into(samples, &mut buf);
    writer.write_all(&buf).context("写出 PCM 失败")
}

/// 交错 PCM 拆成 `channels` 个平面, 不完整的最后一组按 0 补齐
pub fn deinterleave(samples: &[i16], channels: usize) -> Vec<Vec<i16>> {
    let frames = samples.len().div_ceil(channels);
    let mut planes = vec![Vec::with_capacity(frames); channels];
    for group in samples.chunks(channels) {
        for (ch, plane) in planes.iter_mut().enumerate() {
            plane.push(group.get(ch).copied().unwrap_or(0));
        }
    }
    planes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_字节序() {
        assert_eq!(bytes_to_samples(&[0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80]), vec![1, -1, i16::MIN]);
        assert_eq!(bytes_to_samples(&[0x34, 0x12, 0x99]), vec![0x1234]);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcm");
        let samples = vec![0, 1, -2, i16::MAX, i16::MIN];
        write_s16le(&path, &samples).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 10);
        assert_eq!(read_s16le(&path).unwrap(), samples);
    }

    #[test]
    fn test_deinterleave() {
        let planes = deinterleave(&[1, 2, 3, 4, 5, 6, 7], 3);
        assert_eq!(planes, vec![vec![1, 4, 7], vec![2, 5, 0], vec![3, 6, 0]]);
        assert_eq!(deinterleave(&[], 2), vec![Vec::<i16>::new(); 2]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_s16le(&dir.path().join("missing.pcm")).unwrap_err();
        assert!(err.to_string().contains("无法读取输入文件"));
    }
}
