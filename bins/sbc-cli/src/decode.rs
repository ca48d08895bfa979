//! decode 子命令: SBC 码流 -> 原始 s16le PCM.

use anyhow::{Context, Result};
use clap::Args;
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

use sbc_codec::{FrameParser, SbcConfig, SbcDecoder};

use crate::pcm::write_samples;

/// 每次从输入读取的字节数
const READ_CHUNK: usize = 4096;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 输入 SBC 码流文件
    #[arg(short, long)]
    pub input: PathBuf,

    /// 输出文件 (s16le 原始 PCM, 多声道交错)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// 解码统计
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub frames: u64,
    /// 输出的采样总数 (所有声道)
    pub samples: u64,
    pub channels: usize,
    pub sample_rate: u32,
    /// 失步丢弃的字节数
    pub skipped_bytes: usize,
    /// 解码失败而丢弃的帧数
    pub dropped_frames: u64,
}

/// 执行 decode 子命令
pub fn run(args: &DecodeArgs) -> Result<()> {
    let input = File::open(&args.input)
        .with_context(|| format!("无法打开输入文件 '{}'", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("无法创建输出文件 '{}'", args.output.display()))?;
    let mut writer = BufWriter::new(output);

    let summary = decode_stream(input, &mut writer)?;
    writer.flush().context("写出 PCM 失败")?;

    info!(
        "解码完成: {} 帧, {} 个采样, {} 声道, {} Hz, 丢弃 {} 字节",
        summary.frames,
        summary.samples,
        summary.channels,
        summary.sample_rate,
        summary.skipped_bytes,
    );
    Ok(())
}

/// 从 `reader` 读取码流, 解码后写入 `writer`
pub fn decode_stream(mut reader: impl Read, writer: &mut impl Write) -> Result<DecodeSummary> {
    let mut parser = FrameParser::new();
    // 首帧到来前的占位配置, 解码时会切换到码流中的参数
    let mut decoder = SbcDecoder::new(&SbcConfig::default())?;
    let mut summary = DecodeSummary::default();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).context("读取输入失败")?;
        if n == 0 {
            break;
        }
        parser.push(&buf[..n]);

        while let Some(frame) = parser.next_frame() {
            match decoder.decode(&frame) {
                Ok(pcm) => {
                    if summary.frames > 0 && decoder.channels() != summary.channels {
                        warn!(
                            "声道数在码流中变化: {} -> {}",
                            summary.channels,
                            decoder.channels()
                        );
                    }
                    summary.frames += 1;
                    summary.samples += pcm.len() as u64;
                    summary.channels = decoder.channels();
                    summary.sample_rate = decoder.sample_rate_hz();
                    write_samples(writer, &pcm)?;
                }
                Err(e) => {
                    warn!("丢弃无法解码的帧 #{}: {e}", parser.frame_count());
                    summary.dropped_frames += 1;
                }
            }
        }
    }

    if let Err(e) = parser.finish() {
        warn!("忽略码流末尾的残缺数据: {e}");
    }
    summary.skipped_bytes = parser.skipped_bytes();
    Ok(summary)
}
