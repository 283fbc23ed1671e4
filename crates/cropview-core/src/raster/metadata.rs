//! EXIF carry-over from the source file to the cropped JPEG.
//!
//! Only a whitelist of capture tags survives. Orientation is reset because
//! the crop is already rendered upright, and the pixel dimensions are
//! rewritten to match the output.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use tracing::{debug, warn};

use super::RasterError;

/// Tags copied from the source when metadata copy is enabled.
pub const DEFAULT_METADATA_WHITELIST: &[Tag] = &[
    Tag::FNumber,
    Tag::DateTime,
    Tag::DateTimeDigitized,
    Tag::ExposureTime,
    Tag::Flash,
    Tag::FocalLength,
    Tag::GPSVersionID,
    Tag::GPSAltitude,
    Tag::GPSAltitudeRef,
    Tag::GPSDateStamp,
    Tag::GPSLatitude,
    Tag::GPSLatitudeRef,
    Tag::GPSLongitude,
    Tag::GPSLongitudeRef,
    Tag::GPSProcessingMethod,
    Tag::GPSTimeStamp,
    Tag::PhotographicSensitivity,
    Tag::Make,
    Tag::Model,
    Tag::WhiteBalance,
];

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const APP1_MARKER: [u8; 2] = [0xFF, 0xE1];
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Copy whitelisted EXIF tags from `source` into the `encoded` JPEG.
///
/// # Arguments
///
/// * `source` - Original file bytes (any container kamadak-exif can read)
/// * `encoded` - Freshly encoded JPEG of the crop
/// * `whitelist` - Primary-IFD tags to carry over
/// * `width`, `height` - Output dimensions written into the new EXIF block
///
/// # Returns
///
/// The JPEG with an EXIF APP1 segment inserted after SOI. When the source
/// carries no readable EXIF, or none of its tags are whitelisted, `encoded`
/// is returned unchanged.
///
/// # Errors
///
/// Returns `RasterError::Metadata` if `encoded` is not a JPEG stream or the
/// new EXIF block cannot be written.
pub fn copy_exif(
    source: &[u8],
    encoded: Vec<u8>,
    whitelist: &[Tag],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RasterError> {
    if !encoded.starts_with(&JPEG_SOI) {
        return Err(RasterError::Metadata(
            "destination is not a JPEG stream".to_string(),
        ));
    }

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(source)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            debug!("source has no EXIF block, nothing to copy");
            return Ok(encoded);
        }
        Err(e) => {
            warn!(error = %e, "source EXIF unreadable, skipping metadata copy");
            return Ok(encoded);
        }
    };

    let mut fields: Vec<Field> = exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY && whitelist.contains(&f.tag))
        .cloned()
        .collect();

    if fields.is_empty() {
        debug!("no whitelisted EXIF tags in source");
        return Ok(encoded);
    }
    let copied = fields.len();

    fields.push(primary_field(Tag::Orientation, Value::Short(vec![0])));
    fields.push(primary_field(Tag::ImageWidth, Value::Long(vec![width])));
    fields.push(primary_field(Tag::ImageLength, Value::Long(vec![height])));

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, exif.little_endian())
        .map_err(|e| RasterError::Metadata(e.to_string()))?;

    debug!(tags = copied, "copied EXIF tags into crop output");
    splice_app1(encoded, &tiff.into_inner())
}

fn primary_field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Insert an EXIF APP1 segment directly after the SOI marker.
fn splice_app1(jpeg: Vec<u8>, tiff: &[u8]) -> Result<Vec<u8>, RasterError> {
    // Segment length counts itself (2 bytes) plus the payload
    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();
    let segment_len = u16::try_from(segment_len).map_err(|_| {
        RasterError::Metadata(format!("EXIF block of {segment_len} bytes exceeds APP1 limit"))
    })?;

    let mut out = Vec::with_capacity(jpeg.len() + segment_len as usize + 2);
    out.extend_from_slice(&JPEG_SOI);
    out.extend_from_slice(&APP1_MARKER);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[JPEG_SOI.len()..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::encode_jpeg;

    fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
        encode_jpeg(&vec![100u8; (width * height * 3) as usize], width, height, 90).unwrap()
    }

    /// A JPEG whose EXIF holds Make, Model, Software and Orientation.
    fn jpeg_with_exif() -> Vec<u8> {
        let fields = [
            primary_field(Tag::Make, Value::Ascii(vec![b"Acme".to_vec()])),
            primary_field(Tag::Model, Value::Ascii(vec![b"Box 1".to_vec()])),
            primary_field(Tag::Software, Value::Ascii(vec![b"editor".to_vec()])),
            primary_field(Tag::Orientation, Value::Short(vec![6])),
        ];
        let mut writer = Writer::new();
        for f in &fields {
            writer.push_field(f);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        splice_app1(plain_jpeg(16, 16), &tiff.into_inner()).unwrap()
    }

    fn copy_default(source: &[u8], encoded: Vec<u8>) -> Result<Vec<u8>, RasterError> {
        copy_exif(source, encoded, DEFAULT_METADATA_WHITELIST, 8, 4)
    }

    fn read_exif(bytes: &[u8]) -> exif::Exif {
        exif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .unwrap()
    }

    #[test]
    fn test_copy_keeps_whitelisted_tags_only() {
        let out = copy_default(&jpeg_with_exif(), plain_jpeg(8, 4)).unwrap();
        let exif = read_exif(&out);

        let make = exif.get_field(Tag::Make, In::PRIMARY).unwrap();
        assert!(matches!(&make.value, Value::Ascii(v) if v[0] == b"Acme"));
        assert!(exif.get_field(Tag::Model, In::PRIMARY).is_some());
        assert!(exif.get_field(Tag::Software, In::PRIMARY).is_none());
    }

    #[test]
    fn test_copy_resets_orientation_and_size() {
        let out = copy_default(&jpeg_with_exif(), plain_jpeg(8, 4)).unwrap();
        let exif = read_exif(&out);

        let orientation = exif.get_field(Tag::Orientation, In::PRIMARY).unwrap();
        assert_eq!(orientation.value.get_uint(0), Some(0));
        let width = exif.get_field(Tag::ImageWidth, In::PRIMARY).unwrap();
        assert_eq!(width.value.get_uint(0), Some(8));
        let height = exif.get_field(Tag::ImageLength, In::PRIMARY).unwrap();
        assert_eq!(height.value.get_uint(0), Some(4));
    }

    #[test]
    fn test_output_still_decodes() {
        let out = copy_default(&jpeg_with_exif(), plain_jpeg(8, 4)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_source_without_exif_passes_through() {
        let encoded = plain_jpeg(8, 4);
        let out = copy_default(&plain_jpeg(16, 16), encoded.clone()).unwrap();
        assert_eq!(out, encoded);
    }

    #[test]
    fn test_garbage_source_passes_through() {
        let encoded = plain_jpeg(8, 4);
        let out = copy_default(b"not an image", encoded.clone()).unwrap();
        assert_eq!(out, encoded);
    }

    #[test]
    fn test_empty_whitelist_passes_through() {
        let encoded = plain_jpeg(8, 4);
        let out = copy_exif(&jpeg_with_exif(), encoded.clone(), &[], 8, 4).unwrap();
        assert_eq!(out, encoded);
    }

    #[test]
    fn test_non_jpeg_destination_is_rejected() {
        let result = copy_default(&jpeg_with_exif(), vec![0x89, b'P', b'N', b'G']);
        assert!(matches!(result, Err(RasterError::Metadata(_))));
    }

    #[test]
    fn test_splice_layout() {
        let out = splice_app1(vec![0xFF, 0xD8, 0xFF, 0xD9], &[1, 2, 3]).unwrap();
        assert_eq!(
            out,
            vec![
                0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x0B, b'E', b'x', b'i', b'f', 0, 0, 1, 2, 3, 0xFF,
                0xD9
            ]
        );
    }

    #[test]
    fn test_splice_rejects_oversized_block() {
        let tiff = vec![0u8; 70_000];
        assert!(matches!(
            splice_app1(vec![0xFF, 0xD8], &tiff),
            Err(RasterError::Metadata(_))
        ));
    }
}
