//! SBC 编解码性能基准测试.
//!
//! 覆盖编码、解码、帧头探测与码流切分等核心路径.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sbc::codec::{
    ChannelMode, FrameParser, SamplingFrequency, SbcConfig, SbcDecoder, SbcEncoder, probe,
};

/// A2DP 常用高质量配置: 44.1 kHz 联合立体声, bitpool 53
fn a2dp_config() -> SbcConfig {
    SbcConfig::default()
        .with_sampling_frequency(SamplingFrequency::Hz44100)
        .with_channel_mode(ChannelMode::JointStereo)
        .with_bitpool(53)
}

/// 创建交错 S16 测试 PCM
fn make_pcm(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| ((i % 256) as i16).wrapping_mul(100))
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("sbc_encode_joint_8x16", |b| {
        let mut enc = SbcEncoder::new(&a2dp_config()).unwrap();
        let pcm = make_pcm(enc.geometry().pcm_samples());
        b.iter(|| {
            let frame = enc.encode(black_box(&pcm)).unwrap();
            black_box(frame);
        });
    });

    c.bench_function("msbc_encode", |b| {
        let mut enc = SbcEncoder::new(&SbcConfig::msbc()).unwrap();
        let pcm = make_pcm(enc.geometry().pcm_samples());
        b.iter(|| {
            let frame = enc.encode(black_box(&pcm)).unwrap();
            black_box(frame);
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("sbc_decode_joint_8x16", |b| {
        let config = a2dp_config();
        let mut enc = SbcEncoder::new(&config).unwrap();
        let frame = enc.encode(&make_pcm(enc.geometry().pcm_samples())).unwrap();
        let mut dec = SbcDecoder::new(&config).unwrap();
        b.iter(|| {
            let pcm = dec.decode(black_box(&frame)).unwrap();
            black_box(pcm);
        });
    });
}

fn bench_probe(c: &mut Criterion) {
    c.bench_function("sbc_probe", |b| {
        let mut enc = SbcEncoder::new(&a2dp_config()).unwrap();
        let frame = enc.encode(&make_pcm(enc.geometry().pcm_samples())).unwrap();
        b.iter(|| black_box(probe(black_box(&frame)).unwrap()));
    });
}

fn bench_parser(c: &mut Criterion) {
    c.bench_function("sbc_parse_100_frames", |b| {
        let mut enc = SbcEncoder::new(&a2dp_config()).unwrap();
        let pcm = make_pcm(enc.geometry().pcm_samples());
        let stream: Vec<u8> = (0..100).flat_map(|_| enc.encode(&pcm).unwrap()).collect();
        b.iter(|| {
            let mut parser = FrameParser::new();
            parser.push(black_box(&stream));
            let mut count = 0;
            while let Some(frame) = parser.next_frame() {
                count += frame.len();
            }
            black_box(count);
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_probe, bench_parser);
criterion_main!(benches);
