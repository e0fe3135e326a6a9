//! Persisted calibration image
//!
//! [`ImageData`] is everything that survives a power cycle. It is encoded
//! into the fixed little-endian layout described in
//! [`crate::constants::layout`] and protected by a trailing CRC-32.
//!
//! ## Encoding by Window
//!
//! The store is written one page at a time, so the encoder never builds the
//! whole image in RAM. It streams the image into a [`Sink`]:
//!
//! - a CRC digest, to compute the trailer
//! - a [`PageWindow`], which keeps only the bytes of one page
//!
//! ## Load Outcome
//!
//! ```text
//! header all 0xFF           -> Blank
//! bad magic / other version -> Corrupt
//! CRC mismatch              -> Corrupt   (torn or interrupted commit)
//! otherwise                 -> Intact
//! ```

use core::ops::Range;

use crc::{Crc, Digest, CRC_32_ISO_HDLC};
use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::calibration::{
    CAL_TEMP_POINTS, DEFAULT_CALIBRATION_TEMPERATURE_C, SERIAL_NUMBER_LEN, TOTAL_ENTRIES,
};
use crate::constants::layout::{
    COLD_JUNCTION_LEN, COLD_JUNCTION_OFFSET, CRC_OFFSET, ENTRIES_OFFSET, ENTRY_LEN,
    ERASED_BYTE, HEADER_LEN, IMAGE_LEN, IMAGE_MAGIC, LAYOUT_VERSION, PAGE_SIZE,
    SERIAL_OFFSET, TEMPERATURES_LEN, TEMPERATURES_OFFSET, VALID_LEN, VALID_MARKER,
    VALID_OFFSET,
};
use crate::entries::{CalibrationEntry, ColdJunctionCalibration, EntryRecord};
use crate::errors::CalResult;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Receives encoded image bytes in order
pub trait Sink {
    /// Append bytes
    fn put(&mut self, bytes: &[u8]);
}

/// Supplies image bytes in order
pub trait Source {
    /// Fill `out` with the next bytes of the image
    fn take(&mut self, out: &mut [u8]) -> CalResult<()>;
}

impl Sink for Digest<'_, u32> {
    fn put(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

impl Source for &[u8] {
    fn take(&mut self, out: &mut [u8]) -> CalResult<()> {
        let n = out.len().min(self.len());
        out[..n].copy_from_slice(&self[..n]);
        out[n..].fill(ERASED_BYTE);
        *self = &self[n..];
        Ok(())
    }
}

/// Keeps the bytes of one page out of a full image stream
pub struct PageWindow<'a> {
    start: usize,
    pos: usize,
    buf: &'a mut [u8; PAGE_SIZE],
}

impl<'a> PageWindow<'a> {
    /// Window over image page `page`; bytes past the image stay erased
    pub fn new(page: usize, buf: &'a mut [u8; PAGE_SIZE]) -> Self {
        buf.fill(ERASED_BYTE);
        Self { start: page * PAGE_SIZE, pos: 0, buf }
    }
}

impl Sink for PageWindow<'_> {
    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        let window_end = self.start + PAGE_SIZE;
        if end > self.start && self.pos < window_end {
            let from = self.start.max(self.pos);
            let to = window_end.min(end);
            self.buf[from - self.start..to - self.start]
                .copy_from_slice(&bytes[from - self.pos..to - self.pos]);
        }
        self.pos = end;
    }
}

/// Why a stored image was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Corruption {
    /// Header does not carry the image magic
    Magic,
    /// Image written by another layout revision
    Version(u16),
    /// Checksum mismatch
    Checksum,
}

/// Result of decoding a stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageStatus {
    /// Store never written
    Blank,
    /// Store holds an unusable image
    Corrupt(Corruption),
    /// Image loaded and verified
    Intact,
}

/// Part of the image touched by a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// One entry record, by global slot
    Entry(usize),
    /// Calibration temperature list
    Temperatures,
    /// Cold-junction constants
    ColdJunction,
    /// Serial number
    Serial,
    /// Validity marker
    Valid,
}

impl Region {
    /// Byte range of the region within the image
    pub const fn span(self) -> Range<usize> {
        match self {
            Self::Entry(slot) => {
                let start = ENTRIES_OFFSET + slot * ENTRY_LEN;
                start..start + ENTRY_LEN
            }
            Self::Temperatures => TEMPERATURES_OFFSET..TEMPERATURES_OFFSET + TEMPERATURES_LEN,
            Self::ColdJunction => COLD_JUNCTION_OFFSET..COLD_JUNCTION_OFFSET + COLD_JUNCTION_LEN,
            Self::Serial => SERIAL_OFFSET..SERIAL_OFFSET + SERIAL_NUMBER_LEN,
            Self::Valid => VALID_OFFSET..VALID_OFFSET + VALID_LEN,
        }
    }

    /// Image pages covered by the region
    pub const fn pages(self) -> Range<usize> {
        let span = self.span();
        span.start / PAGE_SIZE..(span.end - 1) / PAGE_SIZE + 1
    }
}

/// Calibration state that is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Entry records, indexed by global slot
    pub records: [EntryRecord; TOTAL_ENTRIES],
    /// Shared calibration temperatures (°C)
    pub temperatures: [f32; CAL_TEMP_POINTS],
    /// Cold-junction constants
    pub cold_junction: ColdJunctionCalibration,
    /// Board serial number
    pub serial: String<SERIAL_NUMBER_LEN>,
    /// Calibration completed and marked valid
    pub valid: bool,
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            records: [EntryRecord::BLANK; TOTAL_ENTRIES],
            temperatures: [DEFAULT_CALIBRATION_TEMPERATURE_C; CAL_TEMP_POINTS],
            cold_junction: ColdJunctionCalibration::default(),
            serial: String::new(),
            valid: false,
        }
    }
}

impl ImageData {
    /// Stream every byte before the CRC trailer
    pub fn encode_body<K: Sink>(&self, sink: &mut K) {
        sink.put(&IMAGE_MAGIC.to_le_bytes());
        sink.put(&LAYOUT_VERSION.to_le_bytes());
        sink.put(&[0, 0]);

        for record in &self.records {
            sink.put(&record.entry.offset.to_le_bytes());
            sink.put(&record.entry.gain.to_le_bytes());
            sink.put(&record.entry.base_gain.to_le_bytes());
            for factor in &record.corrections {
                sink.put(&factor.to_le_bytes());
            }
        }

        for temperature in &self.temperatures {
            sink.put(&temperature.to_le_bytes());
        }

        sink.put(&self.cold_junction.offset.to_le_bytes());
        sink.put(&self.cold_junction.gain.to_le_bytes());

        let mut serial = [0u8; SERIAL_NUMBER_LEN];
        serial[..self.serial.len()].copy_from_slice(self.serial.as_bytes());
        sink.put(&serial);

        let marker = if self.valid { VALID_MARKER } else { 0 };
        sink.put(&marker.to_le_bytes());
    }

    /// CRC-32 of the image body
    pub fn checksum(&self) -> u32 {
        let mut digest = CRC32.digest();
        self.encode_body(&mut digest);
        digest.finalize()
    }

    /// Stream the complete image, trailer included
    pub fn encode<K: Sink>(&self, sink: &mut K) {
        let crc = self.checksum();
        self.encode_body(sink);
        sink.put(&crc.to_le_bytes());
    }

    /// Encode one image page, given the precomputed checksum
    pub fn encode_page(&self, page: usize, crc: u32, buf: &mut [u8; PAGE_SIZE]) {
        let mut window = PageWindow::new(page, buf);
        self.encode_body(&mut window);
        window.put(&crc.to_le_bytes());
    }

    /// Decode an image from `source`
    ///
    /// Returns the status and, when `Intact`, the decoded data.
    pub fn decode<R: Source>(source: &mut R) -> CalResult<(ImageStatus, Option<Self>)> {
        let mut digest = CRC32.digest();

        let mut header = [0u8; HEADER_LEN];
        source.take(&mut header)?;
        if header.iter().all(|&b| b == ERASED_BYTE) {
            return Ok((ImageStatus::Blank, None));
        }
        digest.update(&header);

        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != IMAGE_MAGIC {
            return Ok((ImageStatus::Corrupt(Corruption::Magic), None));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != LAYOUT_VERSION {
            return Ok((ImageStatus::Corrupt(Corruption::Version(version)), None));
        }

        let mut data = Self::default();
        let mut reader = DigestReader { source: &mut *source, digest: &mut digest };

        for record in data.records.iter_mut() {
            record.entry = CalibrationEntry {
                offset: reader.u32()?,
                gain: reader.u32()?,
                base_gain: reader.u32()?,
            };
            for factor in record.corrections.iter_mut() {
                *factor = reader.f32()?;
            }
        }

        for temperature in data.temperatures.iter_mut() {
            *temperature = reader.f32()?;
        }

        data.cold_junction = ColdJunctionCalibration {
            offset: reader.u32()?,
            gain: reader.u32()?,
        };

        let mut serial = [0u8; SERIAL_NUMBER_LEN];
        reader.bytes(&mut serial)?;
        data.serial = decode_serial(&serial);

        data.valid = reader.u32()? == VALID_MARKER;

        let mut stored = [0u8; 4];
        source.take(&mut stored)?;
        if u32::from_le_bytes(stored) != digest.finalize() {
            return Ok((ImageStatus::Corrupt(Corruption::Checksum), None));
        }

        Ok((ImageStatus::Intact, Some(data)))
    }
}

/// Reads from a source while feeding the CRC digest
struct DigestReader<'r, 'd, R: Source> {
    source: &'r mut R,
    digest: &'r mut Digest<'d, u32>,
}

impl<R: Source> DigestReader<'_, '_, R> {
    fn bytes(&mut self, out: &mut [u8]) -> CalResult<()> {
        self.source.take(out)?;
        self.digest.update(out);
        Ok(())
    }

    fn u32(&mut self) -> CalResult<u32> {
        let mut raw = [0u8; 4];
        self.bytes(&mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    fn f32(&mut self) -> CalResult<f32> {
        let mut raw = [0u8; 4];
        self.bytes(&mut raw)?;
        Ok(f32::from_le_bytes(raw))
    }
}

/// Serial number up to the first NUL; invalid UTF-8 is cut at the last valid byte
fn decode_serial(raw: &[u8; SERIAL_NUMBER_LEN]) -> String<SERIAL_NUMBER_LEN> {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = match core::str::from_utf8(&raw[..len]) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or_default(),
    };
    let mut serial = String::new();
    // Cannot overflow: at most SERIAL_NUMBER_LEN bytes.
    let _ = serial.push_str(text);
    serial
}

const _: () = assert!(Region::Valid.span().end == CRC_OFFSET);
const _: () = assert!(CRC_OFFSET + 4 == IMAGE_LEN);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::layout::IMAGE_PAGES;

    struct VecSink(Vec<u8>);

    impl Sink for VecSink {
        fn put(&mut self, bytes: &[u8]) {
            self.0.extend_from_slice(bytes);
        }
    }

    fn encoded(data: &ImageData) -> Vec<u8> {
        let mut sink = VecSink(Vec::new());
        data.encode(&mut sink);
        sink.0
    }

    fn sample() -> ImageData {
        let mut data = ImageData::default();
        data.records[3].entry = CalibrationEntry { offset: 10, gain: 20, base_gain: 30 };
        data.records[TOTAL_ENTRIES - 1].corrections[2] = 1.015;
        data.temperatures = [0.0, 10.0, 20.0, 30.0, 40.0];
        data.cold_junction = ColdJunctionCalibration { offset: 7, gain: 9 };
        data.serial.push_str("TKQ-00042").unwrap();
        data.valid = true;
        data
    }

    #[test]
    fn encoded_length_matches_layout() {
        assert_eq!(encoded(&ImageData::default()).len(), IMAGE_LEN);
    }

    #[test]
    fn fields_land_at_layout_offsets() {
        let bytes = encoded(&sample());
        assert_eq!(&bytes[0..4], &IMAGE_MAGIC.to_le_bytes());
        let entry = Region::Entry(3).span();
        assert_eq!(&bytes[entry.start..entry.start + 4], &10u32.to_le_bytes());
        let serial = Region::Serial.span();
        assert_eq!(&bytes[serial.start..serial.start + 9], b"TKQ-00042");
        assert_eq!(bytes[serial.start + 9], 0);
        let valid = Region::Valid.span();
        assert_eq!(&bytes[valid], &VALID_MARKER.to_le_bytes());
    }

    #[test]
    fn decode_restores_content() {
        let data = sample();
        let bytes = encoded(&data);
        let (status, decoded) = ImageData::decode(&mut &bytes[..]).unwrap();
        assert_eq!(status, ImageStatus::Intact);
        assert_eq!(decoded.unwrap(), data);
    }

    #[test]
    fn erased_image_is_blank() {
        let bytes = [ERASED_BYTE; IMAGE_LEN];
        let (status, decoded) = ImageData::decode(&mut &bytes[..]).unwrap();
        assert_eq!(status, ImageStatus::Blank);
        assert!(decoded.is_none());
    }

    #[test]
    fn flipped_bit_fails_checksum() {
        let mut bytes = encoded(&sample());
        bytes[Region::Temperatures.span().start] ^= 0x01;
        let (status, _) = ImageData::decode(&mut &bytes[..]).unwrap();
        assert_eq!(status, ImageStatus::Corrupt(Corruption::Checksum));
    }

    #[test]
    fn other_layout_version_is_rejected() {
        let mut bytes = encoded(&sample());
        bytes[4] = 9;
        let (status, _) = ImageData::decode(&mut &bytes[..]).unwrap();
        assert_eq!(status, ImageStatus::Corrupt(Corruption::Version(9)));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encoded(&sample());
        bytes[0] = 0;
        let (status, _) = ImageData::decode(&mut &bytes[..]).unwrap();
        assert_eq!(status, ImageStatus::Corrupt(Corruption::Magic));
    }

    #[test]
    fn page_windows_reassemble_the_image() {
        let data = sample();
        let full = encoded(&data);
        let crc = data.checksum();

        let mut pages = Vec::new();
        for page in 0..IMAGE_PAGES {
            let mut buf = [0u8; PAGE_SIZE];
            data.encode_page(page, crc, &mut buf);
            pages.extend_from_slice(&buf);
        }

        assert_eq!(&pages[..IMAGE_LEN], &full[..]);
        assert!(pages[IMAGE_LEN..].iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn region_pages() {
        assert_eq!(Region::Entry(0).pages(), 0..1);
        // Entry 7 spans bytes 232..264, straddling pages 0 and 1.
        assert_eq!(Region::Entry(7).pages(), 0..2);
        assert_eq!(Region::Valid.pages(), IMAGE_PAGES - 1..IMAGE_PAGES);
    }

    #[test]
    fn invalid_serial_bytes_are_cut() {
        let mut raw = [0u8; SERIAL_NUMBER_LEN];
        raw[..4].copy_from_slice(b"AB\xFFC");
        assert_eq!(decode_serial(&raw).as_str(), "AB");
    }
}
