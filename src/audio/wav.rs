//! Canonical 44-byte-header WAV reading and writing for stereo 16-bit PCM.
//!
//! Only the fields the converter needs are interpreted; unexpected formats
//! are logged, not rejected.

use std::io::{self, Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::warn;

use crate::audio::constants::{BYTES_PER_FRAME, CHANNELS};
use crate::common::errors::WavError;

/// RIFF size written while the final length is unknown.
const STREAMING_RIFF_LEN: u32 = 0xffff_ff24;
/// Data size written while the final length is unknown.
const STREAMING_DATA_LEN: u32 = 0xffff_ff00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_len: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    pub const LEN: usize = 44;

    /// PCM, 2 channels, 16 bits, with streaming placeholder sizes.
    pub fn stereo16(sample_rate: u32) -> Self {
        Self {
            riff_len: STREAMING_RIFF_LEN,
            audio_format: 1,
            channels: CHANNELS as u16,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(BYTES_PER_FRAME as u32),
            block_align: BYTES_PER_FRAME as u16,
            bits_per_sample: 16,
            data_len: STREAMING_DATA_LEN,
        }
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, WavError> {
        let mut tag = [0u8; 4];

        r.read_exact(&mut tag)?;
        if &tag != b"RIFF" {
            return Err(WavError::NotRiff);
        }
        let riff_len = r.read_u32::<LittleEndian>()?;
        r.read_exact(&mut tag)?;
        if &tag != b"WAVE" {
            return Err(WavError::NotRiff);
        }

        r.read_exact(&mut tag)?;
        if &tag != b"fmt " {
            warn!("Unexpected chunk {:?} where 'fmt ' was expected", String::from_utf8_lossy(&tag));
        }
        let _fmt_len = r.read_u32::<LittleEndian>()?;
        let audio_format = r.read_u16::<LittleEndian>()?;
        let channels = r.read_u16::<LittleEndian>()?;
        let sample_rate = r.read_u32::<LittleEndian>()?;
        let byte_rate = r.read_u32::<LittleEndian>()?;
        let block_align = r.read_u16::<LittleEndian>()?;
        let bits_per_sample = r.read_u16::<LittleEndian>()?;

        r.read_exact(&mut tag)?;
        if &tag != b"data" {
            warn!("Unexpected chunk {:?} where 'data' was expected", String::from_utf8_lossy(&tag));
        }
        let data_len = r.read_u32::<LittleEndian>()?;

        let header = Self {
            riff_len,
            audio_format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_len,
        };
        if audio_format != 1 || usize::from(channels) != CHANNELS || bits_per_sample != 16 {
            warn!(
                "Input is format {} with {} channels at {} bits; it will be read as stereo 16-bit PCM",
                audio_format, channels, bits_per_sample
            );
        }
        Ok(header)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), WavError> {
        w.write_all(b"RIFF")?;
        w.write_u32::<LittleEndian>(self.riff_len)?;
        w.write_all(b"WAVE")?;
        w.write_all(b"fmt ")?;
        w.write_u32::<LittleEndian>(16)?;
        w.write_u16::<LittleEndian>(self.audio_format)?;
        w.write_u16::<LittleEndian>(self.channels)?;
        w.write_u32::<LittleEndian>(self.sample_rate)?;
        w.write_u32::<LittleEndian>(self.byte_rate)?;
        w.write_u16::<LittleEndian>(self.block_align)?;
        w.write_u16::<LittleEndian>(self.bits_per_sample)?;
        w.write_all(b"data")?;
        w.write_u32::<LittleEndian>(self.data_len)?;
        Ok(())
    }
}

/// Reads interleaved stereo frames after the header.
pub struct WavReader<R> {
    inner: R,
    header: WavHeader,
    bytes: Vec<u8>,
}

impl<R: Read> WavReader<R> {
    pub fn new(mut inner: R) -> Result<Self, WavError> {
        let header = WavHeader::read(&mut inner)?;
        Ok(Self {
            inner,
            header,
            bytes: Vec::new(),
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Replace `block` with up to `frames` frames. Returns the frames read;
    /// fewer than requested only at end of stream. A trailing partial frame
    /// is dropped.
    pub fn read_block(&mut self, frames: usize, block: &mut Vec<i16>) -> Result<usize, WavError> {
        self.bytes.resize(frames * BYTES_PER_FRAME, 0);

        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.inner.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let got = filled / BYTES_PER_FRAME;
        block.resize(got * CHANNELS, 0);
        LittleEndian::read_i16_into(&self.bytes[..got * BYTES_PER_FRAME], block);
        Ok(got)
    }
}

/// Writes a header followed by interleaved stereo frames.
pub struct WavWriter<W> {
    inner: W,
    header: WavHeader,
    frames: u64,
    bytes: Vec<u8>,
}

impl<W: Write> WavWriter<W> {
    pub fn new(mut inner: W, sample_rate: u32) -> Result<Self, WavError> {
        let header = WavHeader::stereo16(sample_rate);
        header.write(&mut inner)?;
        Ok(Self {
            inner,
            header,
            frames: 0,
            bytes: Vec::new(),
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), WavError> {
        self.bytes.resize(samples.len() * 2, 0);
        LittleEndian::write_i16_into(samples, &mut self.bytes);
        self.inner.write_all(&self.bytes)?;
        self.frames += (samples.len() / CHANNELS) as u64;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

impl<W: Write + Seek> WavWriter<W> {
    /// Patch the RIFF and data sizes now that the length is known.
    pub fn finish(mut self) -> Result<W, WavError> {
        let data_len = self.frames * BYTES_PER_FRAME as u64;
        match u32::try_from(data_len + WavHeader::LEN as u64 - 8) {
            Ok(riff_len) => {
                self.header.riff_len = riff_len;
                self.header.data_len = data_len as u32;
                self.inner.seek(SeekFrom::Start(0))?;
                self.header.write(&mut self.inner)?;
                self.inner.seek(SeekFrom::End(0))?;
            }
            Err(_) => warn!("Output exceeds 4 GiB, keeping streaming header sizes"),
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout_matches_canonical_wav() {
        let mut bytes = Vec::new();
        WavHeader::stereo16(44_100).write(&mut bytes).unwrap();

        assert_eq!(bytes.len(), WavHeader::LEN);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &[0x24, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        // 44100 Hz, little-endian.
        assert_eq!(&bytes[24..28], &[0x44, 0xac, 0x00, 0x00]);
        // 176400 bytes/s.
        assert_eq!(&bytes[28..32], &[0x10, 0xb1, 0x02, 0x00]);
        assert_eq!(&bytes[32..36], &[4, 0, 16, 0]);
        assert_eq!(&bytes[36..44], &[b'd', b'a', b't', b'a', 0x00, 0xff, 0xff, 0xff]);

        let parsed = WavHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed, WavHeader::stereo16(44_100));
    }

    #[test]
    fn rejects_non_riff() {
        let bytes = b"RIFX\0\0\0\0WAVEfmt ".to_vec();
        assert!(matches!(
            WavHeader::read(&mut Cursor::new(bytes)),
            Err(WavError::NotRiff)
        ));
    }

    #[test]
    fn truncated_header_is_io_error() {
        let bytes = b"RIFF\0\0".to_vec();
        assert!(matches!(
            WavHeader::read(&mut Cursor::new(bytes)),
            Err(WavError::Io(_))
        ));
    }

    #[test]
    fn writer_patches_sizes_and_reader_reads_blocks() {
        let samples: Vec<i16> = (0..10).flat_map(|i| [i * 100, -i * 100]).collect();

        let mut writer = WavWriter::new(Cursor::new(Vec::new()), 48_000).unwrap();
        writer.write_samples(&samples).unwrap();
        assert_eq!(writer.frames_written(), 10);
        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(bytes.len(), WavHeader::LEN + 40);

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.header().sample_rate, 48_000);
        assert_eq!(reader.header().data_len, 40);
        assert_eq!(reader.header().riff_len, 36 + 40);

        let mut block = Vec::new();
        assert_eq!(reader.read_block(4, &mut block).unwrap(), 4);
        assert_eq!(block, samples[..8]);
        assert_eq!(reader.read_block(4, &mut block).unwrap(), 4);
        assert_eq!(reader.read_block(4, &mut block).unwrap(), 2);
        assert_eq!(block, samples[16..]);
        assert_eq!(reader.read_block(4, &mut block).unwrap(), 0);
        assert!(block.is_empty());
    }

    #[test]
    fn partial_trailing_frame_is_dropped() {
        let mut bytes = Vec::new();
        WavHeader::stereo16(8_000).write(&mut bytes).unwrap();
        bytes.extend_from_slice(&[1, 0, 2, 0, 3, 0]);

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let mut block = Vec::new();
        assert_eq!(reader.read_block(8, &mut block).unwrap(), 1);
        assert_eq!(block, vec![1, 2]);
    }
}
