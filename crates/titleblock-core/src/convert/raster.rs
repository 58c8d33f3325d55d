use crate::config::schema::TiffSettings;
use crate::convert::CadConverter;
use crate::error::TitleBlockError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

const POINTS_PER_INCH: f64 = 72.0;
const CM_PER_INCH: f64 = 2.54;

/// Rasterizes every page of a (multi-page) TIFF into a PDF, one image per
/// page, with the page sized from the scan resolution.
pub struct TiffConverter {
    extensions: Vec<String>,
    default_dpi: f64,
}

impl TiffConverter {
    pub fn new(settings: &TiffSettings) -> Self {
        TiffConverter {
            extensions: settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .collect(),
            default_dpi: settings.default_dpi,
        }
    }

    /// Convert TIFF data from any seekable reader.
    pub fn convert_reader<R: Read + Seek>(&self, reader: R) -> Result<Vec<u8>, TitleBlockError> {
        let mut decoder = Decoder::new(reader)?;
        let mut frames = Vec::new();
        loop {
            frames.push(self.read_frame(&mut decoder)?);
            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }
        debug!(pages = frames.len(), "decoded TIFF");
        build_pdf(&frames)
    }

    fn read_frame<R: Read + Seek>(
        &self,
        decoder: &mut Decoder<R>,
    ) -> Result<Frame, TitleBlockError> {
        let (width, height) = decoder.dimensions()?;
        let colortype = decoder.colortype()?;
        let (x_dpi, y_dpi) = resolution(decoder, self.default_dpi)?;
        let pixels = decoder.read_image()?;
        let (color_space, bits, data) = pdf_pixels(colortype, pixels)?;
        Ok(Frame {
            width,
            height,
            page_width: width as f64 * POINTS_PER_INCH / x_dpi,
            page_height: height as f64 * POINTS_PER_INCH / y_dpi,
            color_space,
            bits,
            data,
        })
    }
}

impl CadConverter for TiffConverter {
    fn name(&self) -> &str {
        "tiff"
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn convert(&mut self, source: &Path) -> Result<Vec<u8>, TitleBlockError> {
        let file = std::fs::File::open(source)?;
        self.convert_reader(BufReader::new(file))
            .map_err(|e| match e {
                TitleBlockError::Io(_) => e,
                other => TitleBlockError::ConversionFailed {
                    source_path: source.to_path_buf(),
                    reason: other.to_string(),
                },
            })
    }
}

/// One decoded TIFF page ready to embed.
struct Frame {
    width: u32,
    height: u32,
    page_width: f64,
    page_height: f64,
    color_space: &'static str,
    bits: u8,
    data: Vec<u8>,
}

/// Horizontal and vertical resolution in dots per inch.
fn resolution<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    default_dpi: f64,
) -> Result<(f64, f64), TitleBlockError> {
    let unit = decoder
        .find_tag(Tag::ResolutionUnit)?
        .and_then(value_as_f64)
        .unwrap_or(2.0);
    let scale = match unit as u32 {
        // No absolute unit: the ratio is meaningless for page size.
        1 => return Ok((default_dpi, default_dpi)),
        3 => CM_PER_INCH,
        _ => 1.0,
    };

    let mut axis = |tag| -> Result<f64, TitleBlockError> {
        Ok(decoder
            .find_tag(tag)?
            .and_then(value_as_f64)
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v * scale)
            .unwrap_or(default_dpi))
    };
    let x = axis(Tag::XResolution)?;
    let y = axis(Tag::YResolution)?;
    Ok((x, y))
}

fn value_as_f64(value: Value) -> Option<f64> {
    match value {
        Value::Rational(n, d) if d != 0 => Some(n as f64 / d as f64),
        Value::Short(v) => Some(v as f64),
        Value::Unsigned(v) => Some(v as f64),
        Value::Float(v) => Some(v as f64),
        Value::Double(v) => Some(v),
        Value::List(values) => values.into_iter().next().and_then(value_as_f64),
        _ => None,
    }
}

/// Map decoded pixels onto a PDF colour space, dropping alpha and reducing
/// 16-bit samples to 8 bits.
fn pdf_pixels(
    colortype: ColorType,
    pixels: DecodingResult,
) -> Result<(&'static str, u8, Vec<u8>), TitleBlockError> {
    let unsupported = || TitleBlockError::UnsupportedImage(format!("TIFF pixel format {colortype:?}"));

    let samples = match pixels {
        DecodingResult::U8(data) => data,
        DecodingResult::U16(data) => data.into_iter().map(|v| (v >> 8) as u8).collect(),
        _ => return Err(unsupported()),
    };

    match colortype {
        ColorType::Gray(1) => Ok(("DeviceGray", 1, samples)),
        ColorType::Gray(8) | ColorType::Gray(16) => Ok(("DeviceGray", 8, samples)),
        ColorType::GrayA(8) | ColorType::GrayA(16) => Ok(("DeviceGray", 8, drop_alpha(samples, 2))),
        ColorType::RGB(8) | ColorType::RGB(16) => Ok(("DeviceRGB", 8, samples)),
        ColorType::RGBA(8) | ColorType::RGBA(16) => Ok(("DeviceRGB", 8, drop_alpha(samples, 4))),
        ColorType::CMYK(8) => Ok(("DeviceCMYK", 8, samples)),
        _ => Err(unsupported()),
    }
}

fn drop_alpha(samples: Vec<u8>, channels: usize) -> Vec<u8> {
    samples
        .chunks_exact(channels)
        .flat_map(|px| px[..channels - 1].iter().copied())
        .collect()
}

fn build_pdf(frames: &[Frame]) -> Result<Vec<u8>, TitleBlockError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(frames.len());

    for frame in frames {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&frame.data)?;
        let compressed = encoder.finish()?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(frame.width),
                "Height" => i64::from(frame.height),
                "ColorSpace" => frame.color_space,
                "BitsPerComponent" => i64::from(frame.bits),
                "Filter" => "FlateDecode",
            },
            compressed,
        ));

        let w = frame.page_width as f32;
        let h = frame.page_height as f32;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, Rational, TiffEncoder};

    fn converter() -> TiffConverter {
        TiffConverter::new(&TiffSettings::default())
    }

    fn gray_pages(pages: usize, width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut enc = TiffEncoder::new(&mut buf).unwrap();
            let data = vec![200u8; (width * height) as usize];
            for _ in 0..pages {
                enc.write_image::<colortype::Gray8>(width, height, &data)
                    .unwrap();
            }
        }
        buf.into_inner()
    }

    fn page_sizes(pdf: &[u8]) -> Vec<(f32, f32)> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
                (number(&mb[2]), number(&mb[3]))
            })
            .collect()
    }

    /// 8x8 all-white bilevel page, CCITT Group 4 compressed, WhiteIsZero.
    fn fax4_page() -> Vec<u8> {
        // Eight V0 codes (one per row), then EOFB.
        let data = [0xFFu8, 0x00, 0x10, 0x01];
        let entries: [(u16, u16, u32); 9] = [
            (256, 3, 8),                 // ImageWidth
            (257, 3, 8),                 // ImageLength
            (258, 3, 1),                 // BitsPerSample
            (259, 3, 4),                 // Compression = CCITT T.6
            (262, 3, 0),                 // PhotometricInterpretation = WhiteIsZero
            (273, 4, 122),               // StripOffsets
            (277, 3, 1),                 // SamplesPerPixel
            (278, 3, 8),                 // RowsPerStrip
            (279, 4, data.len() as u32), // StripByteCounts
        ];
        let mut buf = b"II".to_vec();
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, kind, value) in entries {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&kind.to_le_bytes());
            buf.extend_from_slice(&1u32.to_le_bytes());
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(buf.len(), 122);
        buf.extend_from_slice(&data);
        buf
    }

    fn image_dict(pdf: &[u8]) -> lopdf::Dictionary {
        let doc = Document::load_mem(pdf).unwrap();
        doc.objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| matches!(s.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Image")))
            .map(|s| s.dict.clone())
            .unwrap()
    }

    fn number(obj: &Object) -> f32 {
        match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("not a number: {other:?}"),
        }
    }

    #[test]
    fn test_multi_page_tiff_becomes_multi_page_pdf() {
        let pdf = converter()
            .convert_reader(Cursor::new(gray_pages(3, 144, 72)))
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));
        let sizes = page_sizes(&pdf);
        assert_eq!(sizes.len(), 3);
        // No resolution tags -> 72 dpi -> one point per pixel.
        assert_eq!(sizes[0], (144.0, 72.0));
    }

    #[test]
    fn test_page_size_follows_resolution() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut enc = TiffEncoder::new(&mut buf).unwrap();
            let mut image = enc.new_image::<colortype::RGB8>(300, 150).unwrap();
            image.resolution(tiff::tags::ResolutionUnit::Inch, Rational { n: 150, d: 1 });
            image.write_data(&vec![0u8; 300 * 150 * 3]).unwrap();
        }
        let pdf = converter().convert_reader(Cursor::new(buf.into_inner())).unwrap();
        assert_eq!(page_sizes(&pdf), vec![(144.0, 72.0)]);
    }

    #[test]
    fn test_group4_fax_scan_becomes_bilevel_page() {
        let pdf = converter().convert_reader(Cursor::new(fax4_page())).unwrap();
        assert_eq!(page_sizes(&pdf), vec![(8.0, 8.0)]);

        let image = image_dict(&pdf);
        assert_eq!(number(image.get(b"BitsPerComponent").unwrap()), 1.0);
        assert_eq!(
            image.get(b"ColorSpace").and_then(Object::as_name).unwrap(),
            b"DeviceGray"
        );
        assert_eq!(number(image.get(b"Width").unwrap()), 8.0);
    }

    #[test]
    fn test_bilevel_pixels_stay_one_bit_gray() {
        let (space, bits, data) =
            pdf_pixels(ColorType::Gray(1), DecodingResult::U8(vec![0xFF; 8])).unwrap();
        assert_eq!(space, "DeviceGray");
        assert_eq!(bits, 1);
        assert_eq!(data, vec![0xFF; 8]);
    }

    #[test]
    fn test_unsupported_pixel_format_is_reported() {
        let err = pdf_pixels(ColorType::Gray(4), DecodingResult::U8(vec![0; 4])).unwrap_err();
        assert!(matches!(err, TitleBlockError::UnsupportedImage(_)));
    }

    #[test]
    fn test_drop_alpha() {
        assert_eq!(drop_alpha(vec![1, 2, 3, 255, 4, 5, 6, 0], 4), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(drop_alpha(vec![9, 255, 8, 255], 2), vec![9, 8]);
    }

    #[test]
    fn test_garbage_input_fails() {
        let mut conv = converter();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tif");
        std::fs::write(&path, b"not a tiff").unwrap();
        let err = conv.convert(&path).unwrap_err();
        assert!(matches!(err, TitleBlockError::ConversionFailed { .. }));
    }
}
