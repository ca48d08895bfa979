//! encode 子命令: 原始 s16le PCM -> SBC 码流.
//!
//! 最后一帧不足时由这里补零, 编码器本身只接受完整帧.
//! 多于两个输入声道 (或指定 `--split`) 时按声道拆成独立的单声道码流,
//! 各声道编码器互不共享状态, 用 rayon 并行处理.

use anyhow::{Context, Result, bail};
use clap::Args;
use log::{debug, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use sbc_codec::{AllocationMethod, ChannelMode, SamplingFrequency, SbcConfig, SbcEncoder};

use crate::pcm::{deinterleave, read_s16le};

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// 输入文件 (s16le 原始 PCM, 多声道交错)
    #[arg(short, long)]
    pub input: PathBuf,

    /// 输出文件 (拆分声道时作为文件名模板)
    #[arg(short, long)]
    pub output: PathBuf,

    /// 采样率 (16000/32000/44100/48000)
    #[arg(short, long, default_value_t = 16000)]
    pub rate: u32,

    /// 输入声道数
    #[arg(short = 'c', long = "input-channels", default_value_t = 1)]
    pub input_channels: usize,

    /// 声道模式 (mono/dual/stereo/joint), 缺省时单声道为 mono, 双声道为 joint
    #[arg(short, long, value_parser = parse_channel_mode)]
    pub mode: Option<ChannelMode>,

    /// 子带数 (4/8)
    #[arg(long, default_value_t = 8)]
    pub subbands: usize,

    /// 块数 (4/8/12/16)
    #[arg(long, default_value_t = 16)]
    pub blocks: usize,

    #[arg(long, default_value_t = 32)]
    pub bitpool: u8,

    /// 使用 SNR 分配方法 (默认 Loudness)
    #[arg(long)]
    pub snr: bool,

    /// mSBC (宽带语音) 模式, 忽略其它编码参数
    #[arg(long)]
    pub msbc: bool,

    /// 每个声道输出一个单声道码流
    #[arg(long)]
    pub split: bool,
}

fn parse_channel_mode(s: &str) -> Result<ChannelMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "mono" => Ok(ChannelMode::Mono),
        "dual" | "dual-channel" => Ok(ChannelMode::DualChannel),
        "stereo" => Ok(ChannelMode::Stereo),
        "joint" | "joint-stereo" => Ok(ChannelMode::JointStereo),
        _ => Err(format!("未知声道模式 '{s}', 可选 mono/dual/stereo/joint")),
    }
}

impl EncodeArgs {
    fn splits_channels(&self) -> bool {
        self.split || self.input_channels > 2
    }

    /// 由命令行参数构建编码配置, `channels` 为每个编码器的声道数
    fn config(&self, channels: usize) -> Result<SbcConfig> {
        if self.msbc {
            if channels != 1 {
                bail!("mSBC 只支持单声道, 多声道输入请加 --split");
            }
            return Ok(SbcConfig::msbc());
        }

        let freq = SamplingFrequency::from_hz(self.rate)
            .with_context(|| format!("不支持的采样率 {} Hz", self.rate))?;
        let mode = match (self.mode, channels) {
            (Some(mode), n) if mode.channels() == n => mode,
            (Some(mode), n) => bail!("声道模式 {mode} 需要 {} 个声道, 实际 {n}", mode.channels()),
            (None, 1) => ChannelMode::Mono,
            (None, _) => ChannelMode::JointStereo,
        };
        let method = if self.snr {
            AllocationMethod::Snr
        } else {
            AllocationMethod::Loudness
        };

        let config = SbcConfig::default()
            .with_subbands(self.subbands)
            .with_blocks(self.blocks)
            .with_sampling_frequency(freq)
            .with_channel_mode(mode)
            .with_allocation_method(method)
            .with_bitpool(self.bitpool);
        config.geometry().context("编码参数无效")?;
        Ok(config)
    }
}

/// 执行 encode 子命令
pub fn run(args: &EncodeArgs) -> Result<()> {
    if args.input_channels == 0 {
        bail!("输入声道数必须大于 0");
    }
    let samples = read_s16le(&args.input)?;
    info!(
        "读取 {}: {} 个采样, {} 声道",
        args.input.display(),
        samples.len(),
        args.input_channels
    );

    if args.splits_channels() {
        let config = args.config(1)?;
        let planes = deinterleave(&samples, args.input_channels);
        let streams = planes
            .par_iter()
            .map(|plane| encode_stream(&config, plane))
            .collect::<Result<Vec<_>>>()?;
        for (ch, stream) in streams.iter().enumerate() {
            let path = channel_path(&args.output, ch);
            fs::write(&path, stream)
                .with_context(|| format!("无法写出 '{}'", path.display()))?;
            info!("声道 {ch} -> {} ({} 字节)", path.display(), stream.len());
        }
        return Ok(());
    }

    let config = args.config(args.input_channels)?;
    let stream = encode_stream(&config, &samples)?;
    fs::write(&args.output, &stream)
        .with_context(|| format!("无法写出 '{}'", args.output.display()))?;
    info!("写出 {} ({} 字节)", args.output.display(), stream.len());
    Ok(())
}

/// 编码一段交错 PCM, 返回拼接后的帧
pub fn encode_stream(config: &SbcConfig, samples: &[i16]) -> Result<Vec<u8>> {
    let mut encoder = SbcEncoder::new(config)?;
    let block = encoder.geometry().pcm_samples();
    let frames = samples.len().div_ceil(block);
    let mut out = Vec::with_capacity(frames * encoder.frame_size());

    for chunk in samples.chunks(block) {
        let frame = if chunk.len() == block {
            encoder.encode(chunk)?
        } else {
            debug!("末帧补零: {} -> {} 个采样", chunk.len(), block);
            let mut padded = chunk.to_vec();
            padded.resize(block, 0);
            encoder.encode(&padded)?
        };
        out.extend_from_slice(&frame);
    }

    debug!(
        "编码完成: {frames} 帧, {} 字节, {} bps",
        out.len(),
        encoder.bitrate()
    );
    Ok(out)
}

/// `out.sbc` -> `out.ch0.sbc`
fn channel_path(output: &Path, channel: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| "out".into(), |s| s.to_string_lossy().into_owned());
    let name = match output.extension() {
        Some(ext) => format!("{stem}.ch{channel}.{}", ext.to_string_lossy()),
        None => format!("{stem}.ch{channel}"),
    };
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::write_s16le;
    use sbc_codec::{FrameParser, probe};

    fn args(input: PathBuf, output: PathBuf) -> EncodeArgs {
        EncodeArgs {
            input,
            output,
            rate: 16000,
            input_channels: 1,
            mode: None,
            subbands: 8,
            blocks: 16,
            bitpool: 32,
            snr: false,
            msbc: false,
            split: false,
        }
    }

    #[test]
    fn test_parse_channel_mode() {
        assert_eq!(parse_channel_mode("Joint"), Ok(ChannelMode::JointStereo));
        assert_eq!(parse_channel_mode("dual"), Ok(ChannelMode::DualChannel));
        assert!(parse_channel_mode("surround").is_err());
    }

    #[test]
    fn test_config_from_args() {
        let mut a = args(PathBuf::new(), PathBuf::new());
        assert_eq!(a.config(1).unwrap().channel_mode, ChannelMode::Mono);
        assert_eq!(a.config(2).unwrap().channel_mode, ChannelMode::JointStereo);

        a.mode = Some(ChannelMode::Mono);
        assert!(a.config(2).is_err());

        a.mode = None;
        a.rate = 22050;
        assert!(a.config(1).is_err());

        a.rate = 16000;
        a.bitpool = 200;
        assert!(a.config(1).is_err());

        a.msbc = true;
        assert_eq!(a.config(1).unwrap(), SbcConfig::msbc());
        assert!(a.config(2).is_err());
    }

    #[test]
    fn test_末帧补零() {
        let config = SbcConfig::default();
        let stream = encode_stream(&config, &[1000; 200]).unwrap();
        assert_eq!(stream.len(), 2 * 72);
        assert!(encode_stream(&config, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_channel_path() {
        assert_eq!(
            channel_path(Path::new("/tmp/x/out.sbc"), 3),
            PathBuf::from("/tmp/x/out.ch3.sbc")
        );
        assert_eq!(channel_path(Path::new("raw"), 0), PathBuf::from("raw.ch0"));
    }

    #[test]
    fn test_split_channels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pcm");
        let samples: Vec<i16> = (0..3 * 300).map(|i| (i % 3 * 1000) as i16).collect();
        write_s16le(&input, &samples).unwrap();

        let mut a = args(input, dir.path().join("out.sbc"));
        a.input_channels = 3;
        run(&a).unwrap();

        for ch in 0..3 {
            let data = fs::read(dir.path().join(format!("out.ch{ch}.sbc"))).unwrap();
            // 300 个采样 -> 3 帧
            assert_eq!(data.len(), 3 * 72);
            assert_eq!(probe(&data).unwrap().channels(), 1);
        }
    }

    #[test]
    fn test_stereo_encode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pcm");
        let samples: Vec<i16> = (0..2 * 512).map(|i| ((i * 37) % 2000) as i16).collect();
        write_s16le(&input, &samples).unwrap();

        let mut a = args(input, dir.path().join("out.sbc"));
        a.input_channels = 2;
        run(&a).unwrap();

        let data = fs::read(dir.path().join("out.sbc")).unwrap();
        let geometry = probe(&data).unwrap();
        assert_eq!(geometry.channel_mode(), ChannelMode::JointStereo);

        let mut parser = FrameParser::new();
        parser.push(&data);
        let mut frames = 0;
        while parser.next_frame().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 4);
        assert!(parser.finish().is_ok());
    }
}
