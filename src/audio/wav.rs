//! WAV duration probe.
//!
//! Walks a canonical RIFF/WAVE header to compute the playable duration of a
//! synthesized clip. The companion refuses to keep clips longer than
//! [`MAX_CLIP_SECS`]; the probe is the measurement half of that policy.

/// Clips measuring longer than this are not persisted or played.
pub const MAX_CLIP_SECS: f64 = 10.0;

/// Errors produced while walking a WAV header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WavFormatError {
    /// The buffer ended before the header did.
    #[error("WAV header truncated at byte {offset}")]
    Truncated {
        /// Byte offset where more data was expected.
        offset: usize,
    },

    /// A fixed four-byte tag did not match.
    #[error("expected {expected:?} tag at byte {offset}")]
    BadTag {
        /// The tag that should have been present.
        expected: &'static str,
        /// Byte offset of the mismatch.
        offset: usize,
    },

    /// A field that participates in the duration computation is zero.
    #[error("WAV header field {field} is zero")]
    ZeroField {
        /// Name of the offending header field.
        field: &'static str,
    },
}

/// Byte cursor over a WAV header.
struct HeaderReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> HeaderReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WavFormatError> {
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(WavFormatError::Truncated {
                offset: self.offset,
            })?;
        self.offset = end;
        Ok(slice)
    }

    fn expect_tag(&mut self, expected: &'static str) -> Result<(), WavFormatError> {
        let offset = self.offset;
        let tag = self.take(4)?;
        if tag != expected.as_bytes() {
            return Err(WavFormatError::BadTag { expected, offset });
        }
        Ok(())
    }

    fn skip(&mut self, len: usize) -> Result<(), WavFormatError> {
        self.take(len).map(|_| ())
    }

    fn read_u16(&mut self) -> Result<u16, WavFormatError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, WavFormatError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Compute the playable duration of a canonical PCM WAV buffer in seconds.
///
/// Expects the 44-byte layout: `RIFF` / chunk size / `WAVE` / `fmt ` chunk /
/// `data` chunk. Extra chunks between `fmt ` and `data` are not handled;
/// the synthesis server emits the canonical layout.
pub fn duration_secs(bytes: &[u8]) -> Result<f64, WavFormatError> {
    let mut reader = HeaderReader::new(bytes);

    reader.expect_tag("RIFF")?;
    reader.skip(4)?; // RIFF chunk size
    reader.expect_tag("WAVE")?;

    reader.expect_tag("fmt ")?;
    reader.skip(4)?; // fmt chunk size
    reader.skip(2)?; // audio format code
    let channels = reader.read_u16()?;
    let sample_rate = reader.read_u32()?;
    reader.skip(4)?; // byte rate
    reader.skip(2)?; // block align
    let bits_per_sample = reader.read_u16()?;

    reader.expect_tag("data")?;
    let data_size = reader.read_u32()?;

    if channels == 0 {
        return Err(WavFormatError::ZeroField { field: "channels" });
    }
    if sample_rate == 0 {
        return Err(WavFormatError::ZeroField {
            field: "sample_rate",
        });
    }
    if bits_per_sample < 8 {
        return Err(WavFormatError::ZeroField {
            field: "bits_per_sample",
        });
    }

    let bytes_per_frame = f64::from(bits_per_sample / 8) * f64::from(channels);
    Ok(f64::from(data_size) / bytes_per_frame / f64::from(sample_rate))
}

/// Whether a clip measures over [`MAX_CLIP_SECS`] and must be dropped.
///
/// A buffer the probe cannot parse measures as zero and is NOT rejected;
/// only well-formed oversized clips are. Callers wanting strict handling
/// should use [`duration_secs`] directly and treat `Err` as a rejection.
pub fn exceeds_cap(bytes: &[u8]) -> bool {
    duration_secs(bytes).is_ok_and(|secs| secs > MAX_CLIP_SECS)
}
