// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary reel files (`.pxpr`).
//!
//! Layout, little-endian:
//!
//! ```text
//! "PXPR"                      4 bytes
//! version                     i32 (1 or 2)
//! name                        7-bit length prefix + UTF-8
//! default_frame_time_ms       i32
//! looping                     bool (1 byte)
//! ping_pong                   bool
//! [v2] frame_width            i32
//! [v2] frame_height           i32
//! frame_count                 i32
//! per frame:
//!   tile_x, tile_y            i32, i32
//!   has_custom_duration       bool
//!   duration_ms               i32, only when has_custom_duration
//!   [v2] has_pixels           bool
//!   [v2] byte_len + bytes     i32 + raw RGBA, only when has_pixels
//! ```
//!
//! Version 1 files only reference tile positions and need a host document to
//! render; version 2 embeds the pixels so the reel stands alone.

use crate::error::{TimelineError, TimelineResult};
use crate::pixels::PixelBuffer;
use crate::reel::{ReelFrame, TileAnimationReel};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Magic token at the start of every reel file
pub const REEL_MAGIC: [u8; 4] = *b"PXPR";

/// Tile positions only
pub const REEL_VERSION_TILES: i32 = 1;

/// Tile positions plus embedded frame pixels
pub const REEL_VERSION_EMBEDDED: i32 = 2;

/// File extension for reel files
pub const REEL_EXTENSION: &str = "pxpr";

/// Largest name accepted when reading
const MAX_NAME_LEN: usize = 64 * 1024;

/// Largest frame count accepted when reading
const MAX_FRAMES: i32 = 1 << 20;

struct ReelWriter<W: Write> {
    inner: W,
}

impl<W: Write> ReelWriter<W> {
    fn i32(&mut self, value: i32) -> TimelineResult<()> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn bool(&mut self, value: bool) -> TimelineResult<()> {
        self.inner.write_all(&[u8::from(value)])?;
        Ok(())
    }

    fn string(&mut self, value: &str) -> TimelineResult<()> {
        let mut len = value.len();
        loop {
            let mut byte = (len & 0x7f) as u8;
            len >>= 7;
            if len != 0 {
                byte |= 0x80;
            }
            self.inner.write_all(&[byte])?;
            if len == 0 {
                break;
            }
        }
        self.inner.write_all(value.as_bytes())?;
        Ok(())
    }

    fn len_i32(&mut self, len: usize, what: &str) -> TimelineResult<()> {
        let len = i32::try_from(len)
            .map_err(|_| TimelineError::Malformed(format!("{} too large: {}", what, len)))?;
        self.i32(len)
    }
}

struct ReelReader<R: Read> {
    inner: R,
}

impl<R: Read> ReelReader<R> {
    fn exact<const N: usize>(&mut self, what: &str) -> TimelineResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
        Ok(buf)
    }

    fn i32(&mut self, what: &str) -> TimelineResult<i32> {
        Ok(i32::from_le_bytes(self.exact::<4>(what)?))
    }

    fn bool(&mut self, what: &str) -> TimelineResult<bool> {
        match self.exact::<1>(what)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(TimelineError::Malformed(format!("{}: invalid bool {}", what, other))),
        }
    }

    fn string(&mut self, what: &str) -> TimelineResult<String> {
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let byte = self.exact::<1>(what)?[0];
            len |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 28 {
                return Err(TimelineError::Malformed(format!("{}: bad length prefix", what)));
            }
        }
        if len > MAX_NAME_LEN {
            return Err(TimelineError::Malformed(format!("{}: length {} too large", what, len)));
        }
        let mut bytes = vec![0u8; len];
        self.inner.read_exact(&mut bytes).map_err(|e| truncated(e, what))?;
        String::from_utf8(bytes).map_err(|_| TimelineError::Malformed(format!("{}: invalid UTF-8", what)))
    }

    fn bytes(&mut self, len: usize, what: &str) -> TimelineResult<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        self.inner.read_exact(&mut bytes).map_err(|e| truncated(e, what))?;
        Ok(bytes)
    }
}

fn truncated(e: std::io::Error, what: &str) -> TimelineError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        TimelineError::Malformed(format!("unexpected end of data reading {}", what))
    } else {
        TimelineError::Io(e)
    }
}

fn non_negative(value: i32, what: &str) -> TimelineResult<u32> {
    u32::try_from(value).map_err(|_| TimelineError::Malformed(format!("{} is negative: {}", what, value)))
}

/// Version a reel is written with
pub fn version_for(reel: &TileAnimationReel) -> i32 {
    if reel.frames.iter().any(|f| f.embedded_pixels.is_some()) {
        REEL_VERSION_EMBEDDED
    } else {
        REEL_VERSION_TILES
    }
}

/// Write a reel to any writer
pub fn write_reel<W: Write>(reel: &TileAnimationReel, writer: W) -> TimelineResult<()> {
    let version = version_for(reel);
    let mut w = ReelWriter { inner: writer };

    w.inner.write_all(&REEL_MAGIC)?;
    w.i32(version)?;
    w.string(&reel.name)?;
    w.i32(reel.default_frame_time_ms)?;
    w.bool(reel.looping)?;
    w.bool(reel.ping_pong)?;
    if version >= REEL_VERSION_EMBEDDED {
        w.len_i32(reel.frame_width as usize, "frame width")?;
        w.len_i32(reel.frame_height as usize, "frame height")?;
    }
    w.len_i32(reel.frames.len(), "frame count")?;

    for frame in &reel.frames {
        w.i32(frame.tile_x)?;
        w.i32(frame.tile_y)?;
        w.bool(frame.duration_ms.is_some())?;
        if let Some(duration) = frame.duration_ms {
            w.i32(duration)?;
        }
        if version >= REEL_VERSION_EMBEDDED {
            w.bool(frame.embedded_pixels.is_some())?;
            if let Some(pixels) = &frame.embedded_pixels {
                w.len_i32(pixels.byte_len(), "frame pixels")?;
                w.inner.write_all(pixels.as_bytes())?;
            }
        }
    }
    w.inner.flush()?;
    Ok(())
}

/// Read a reel from any reader
pub fn read_reel<R: Read>(reader: R) -> TimelineResult<TileAnimationReel> {
    let mut r = ReelReader { inner: reader };

    let magic = r.exact::<4>("magic")?;
    if magic != REEL_MAGIC {
        return Err(TimelineError::BadMagic { found: magic });
    }
    let version = r.i32("version")?;
    if !(REEL_VERSION_TILES..=REEL_VERSION_EMBEDDED).contains(&version) {
        return Err(TimelineError::UnsupportedVersion(version));
    }

    let name = r.string("name")?;
    let default_frame_time_ms = r.i32("default frame time")?;
    let looping = r.bool("loop flag")?;
    let ping_pong = r.bool("ping-pong flag")?;
    let (frame_width, frame_height) = if version >= REEL_VERSION_EMBEDDED {
        (
            non_negative(r.i32("frame width")?, "frame width")?,
            non_negative(r.i32("frame height")?, "frame height")?,
        )
    } else {
        (0, 0)
    };

    let frame_count = r.i32("frame count")?;
    if !(0..=MAX_FRAMES).contains(&frame_count) {
        return Err(TimelineError::Malformed(format!("invalid frame count {}", frame_count)));
    }

    let mut reel = TileAnimationReel::new(name, frame_width, frame_height);
    reel.default_frame_time_ms = default_frame_time_ms;
    reel.looping = looping;
    reel.ping_pong = ping_pong;

    for i in 0..frame_count {
        let mut frame = ReelFrame::new(r.i32("tile x")?, r.i32("tile y")?);
        if r.bool("custom duration flag")? {
            frame.duration_ms = Some(r.i32("frame duration")?);
        }
        if version >= REEL_VERSION_EMBEDDED && r.bool("pixel flag")? {
            let len = non_negative(r.i32("pixel length")?, "pixel length")? as usize;
            let expected = frame_width as usize * frame_height as usize * 4;
            if len != expected {
                return Err(TimelineError::Malformed(format!(
                    "frame {} carries {} bytes, expected {}",
                    i, len, expected
                )));
            }
            let bytes = r.bytes(len, "frame pixels")?;
            frame.embedded_pixels = Some(PixelBuffer::from_rgba(frame_width, frame_height, bytes)?);
        }
        reel.frames.push(frame);
    }

    tracing::debug!(
        "Read reel '{}' v{} with {} frames",
        reel.name,
        version,
        reel.frames.len()
    );
    Ok(reel)
}

/// Save a reel to a file
pub fn save_reel(reel: &TileAnimationReel, path: &Path) -> TimelineResult<()> {
    let file = File::create(path)?;
    write_reel(reel, BufWriter::new(file))?;
    tracing::info!("Saved reel '{}' to {:?}", reel.name, path);
    Ok(())
}

/// Load a reel from a file; a missing file is [`TimelineError::MissingResource`]
pub fn load_reel(path: &Path) -> TimelineResult<TileAnimationReel> {
    if !path.exists() {
        return Err(TimelineError::MissingResource(path.to_path_buf()));
    }
    let file = File::open(path)?;
    read_reel(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reel() -> TileAnimationReel {
        let mut reel = TileAnimationReel::new("Run Cycle", 2, 2);
        reel.default_frame_time_ms = 80;
        reel.looping = false;
        reel.ping_pong = true;
        reel.add_frame(ReelFrame::new(0, 1));
        reel.add_frame(ReelFrame::new(1, 1).with_duration(120));
        reel.add_frame(ReelFrame::new(-2, 7));
        reel
    }

    fn assert_same_timing(a: &TileAnimationReel, b: &TileAnimationReel) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.default_frame_time_ms, b.default_frame_time_ms);
        assert_eq!(a.looping, b.looping);
        assert_eq!(a.ping_pong, b.ping_pong);
        assert_eq!(a.frames, b.frames);
    }

    #[test]
    fn test_roundtrip_v1() {
        let reel = sample_reel();
        let mut bytes = Vec::new();
        write_reel(&reel, &mut bytes).unwrap();

        assert_eq!(&bytes[..4], b"PXPR");
        assert_eq!(i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 1);

        let loaded = read_reel(bytes.as_slice()).unwrap();
        assert_same_timing(&reel, &loaded);
    }

    #[test]
    fn test_roundtrip_v2_embeds_pixels() {
        let mut reel = sample_reel();
        for frame in &mut reel.frames {
            frame.embedded_pixels = Some(PixelBuffer::filled(2, 2, [frame.tile_x as u8, 1, 2, 255]));
        }
        let mut bytes = Vec::new();
        write_reel(&reel, &mut bytes).unwrap();

        let loaded = read_reel(bytes.as_slice()).unwrap();
        assert_same_timing(&reel, &loaded);
        assert_eq!((loaded.frame_width, loaded.frame_height), (2, 2));
        assert!(loaded.is_self_contained());
    }

    #[test]
    fn test_long_names_use_multibyte_prefix() {
        let mut reel = sample_reel();
        reel.name = "x".repeat(300);
        let mut bytes = Vec::new();
        write_reel(&reel, &mut bytes).unwrap();
        assert_eq!(&bytes[8..10], &[0xAC, 0x02]);
        assert_eq!(read_reel(bytes.as_slice()).unwrap().name.len(), 300);
    }

    #[test]
    fn test_bad_magic_fails() {
        let err = read_reel(&b"NOPE\x01\x00\x00\x00"[..]).unwrap_err();
        assert!(matches!(err, TimelineError::BadMagic { found } if &found == b"NOPE"));
    }

    #[test]
    fn test_unsupported_version_fails() {
        let mut bytes = b"PXPR".to_vec();
        bytes.extend_from_slice(&7i32.to_le_bytes());
        let err = read_reel(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, TimelineError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_truncated_data_fails() {
        let mut bytes = Vec::new();
        write_reel(&sample_reel(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(read_reel(bytes.as_slice()), Err(TimelineError::Malformed(_))));
    }

    #[test]
    fn test_missing_file_is_missing_resource() {
        let path = std::env::temp_dir().join("pixelforge-does-not-exist.pxpr");
        assert!(matches!(load_reel(&path), Err(TimelineError::MissingResource(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("pixelforge-reel-{}.pxpr", uuid::Uuid::new_v4()));
        let reel = sample_reel();
        save_reel(&reel, &path).unwrap();
        let loaded = load_reel(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_same_timing(&reel, &loaded);
    }
}
