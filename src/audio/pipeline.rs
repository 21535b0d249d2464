//! Block-wise conversion of a WAV stream through a [`Resampler`].

use std::io::{Read, Write};
use std::mem;

use tracing::{debug, warn};

use crate::audio::constants::CHANNELS;
use crate::audio::resample::Resampler;
use crate::audio::wav::{WavReader, WavWriter};
use crate::common::errors::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub input_frames: u64,
    pub output_frames: u64,
    pub blocks: usize,
}

/// Stream every frame of `reader` through `resampler` into `writer`.
///
/// Blocks are `block_frames` long, raised to the resampler's
/// [`safe_block_frames`](Resampler::safe_block_frames) if needed. A short
/// trailing block is merged into the one before it; a stream shorter than
/// one minimum block is zero-padded to that length.
pub fn convert<R: Read, W: Write>(
    reader: &mut WavReader<R>,
    writer: &mut WavWriter<W>,
    resampler: &mut Resampler,
    block_frames: usize,
) -> Result<ConvertStats, PipelineError> {
    let floor = resampler.safe_block_frames();
    let block_frames = block_frames.max(floor);

    let mut stats = ConvertStats::default();
    let mut block = Vec::with_capacity(2 * block_frames * CHANNELS);
    let mut next = Vec::with_capacity(block_frames * CHANNELS);
    let mut out = Vec::with_capacity(resampler.max_output_frames(2 * block_frames) * CHANNELS);

    let mut frames = reader.read_block(block_frames, &mut block)?;
    if frames == 0 {
        warn!("Input holds no sample frames");
        return Ok(stats);
    }

    loop {
        let at_end = frames < block_frames;
        let mut next_frames = if at_end {
            0
        } else {
            reader.read_block(block_frames, &mut next)?
        };

        if next_frames > 0 && next_frames < floor {
            debug!("Merging {} trailing frames into the last block", next_frames);
            block.extend_from_slice(&next);
            frames += next_frames;
            next.clear();
            next_frames = 0;
        }

        stats.input_frames += frames as u64;

        let required = resampler.min_block_frames();
        if frames < required {
            debug!("Padding {} input frames to {}", frames, required);
            block.resize(required * CHANNELS, 0);
        }

        out.clear();
        let produced = resampler.process(&block, &mut out)?;
        writer.write_samples(&out)?;
        stats.output_frames += produced as u64;
        stats.blocks += 1;

        if next_frames == 0 {
            break;
        }
        mem::swap(&mut block, &mut next);
        frames = next_frames;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::resample::Quality;
    use std::io::Cursor;

    fn wav_bytes(samples: &[i16], rate: u32) -> Vec<u8> {
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), rate).unwrap();
        writer.write_samples(samples).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn run(samples: &[i16], factor: f64, quality: Quality, block_frames: usize) -> (ConvertStats, Vec<i16>) {
        let mut reader = WavReader::new(Cursor::new(wav_bytes(samples, 44_100))).unwrap();
        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 48_000).unwrap();
        let mut r = Resampler::new(factor, quality, true).unwrap();
        let stats = convert(&mut reader, &mut writer, &mut r, block_frames).unwrap();

        let bytes = writer.finish().unwrap().into_inner();
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        reader.read_block(1 << 20, &mut out).unwrap();
        (stats, out)
    }

    fn ramp(frames: usize) -> Vec<i16> {
        (0..frames)
            .flat_map(|i| {
                let s = ((i * 37) % 4_000) as i16 - 2_000;
                [s, -s]
            })
            .collect()
    }

    #[test]
    fn block_size_does_not_change_output() {
        let input = ramp(5_000);
        let (whole, a) = run(&input, 1.0884, Quality::Medium, 8_192);
        let (split, b) = run(&input, 1.0884, Quality::Medium, 700);

        assert_eq!(whole.blocks, 1);
        assert!(split.blocks > 1);
        assert_eq!(whole.input_frames, 5_000);
        assert_eq!(split.input_frames, 5_000);
        assert_eq!(a, b);
        assert_eq!(whole.output_frames as usize, a.len() / CHANNELS);
    }

    #[test]
    fn short_tail_is_merged() {
        // 1000 = 3 * 330 + 10; the 10-frame tail cannot stand alone.
        let (stats, _) = run(&ramp(1_000), 0.5, Quality::Low, 330);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.input_frames, 1_000);
    }

    #[test]
    fn tiny_stream_is_padded() {
        let (stats, out) = run(&ramp(5), 1.0, Quality::Basic, 2_048);
        assert_eq!(stats.input_frames, 5);
        assert_eq!(stats.blocks, 1);
        // Padded to 2 * xoff frames; at unity every input frame yields one.
        assert_eq!(out.len() / CHANNELS, 20);
        assert_eq!(&out[..20], &[0i16; 20]);
        assert_eq!(&out[20..30], ramp(5).as_slice());
    }

    #[test]
    fn empty_stream_writes_only_a_header() {
        let (stats, out) = run(&[], 2.0, Quality::Low, 1_024);
        assert_eq!(stats, ConvertStats::default());
        assert!(out.is_empty());
    }
}
