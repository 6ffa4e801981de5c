//! PDF text and image extraction using lopdf and pdf-extract.

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn decode_image(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                // Raw stream content is the JPEG file itself.
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Skipping unsupported image filter {:?}", filter_name);
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        raw_to_image(&data, width, height, color_space, bits)
    }

    /// Resources of a page, following `Parent` links for inherited ones.
    ///
    /// A `Parent` chain that loops back on itself yields `None`.
    fn resources(&self, doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
        let mut visited = HashSet::new();
        let mut node_id = page_id;

        loop {
            if !visited.insert(node_id) {
                debug!("Parent cycle at object {:?}", node_id);
                return None;
            }

            let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
                return None;
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }
}

/// Build an image from uncompressed 8-bit RGB or gray samples.
fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;

    match color_space {
        b"DeviceRGB" | b"RGB" => {
            let len = pixels.checked_mul(3)?;
            let samples = data.get(..len)?.to_vec();
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" => {
            let samples = data.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        other => {
            trace!(
                "Unsupported color space {}",
                String::from_utf8_lossy(other)
            );
            None
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads bytes, so keep the decrypted form around.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.decode_image(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    fn document_images(&self) -> Vec<DynamicImage> {
        let Some(doc) = self.document.as_ref() else {
            return Vec::new();
        };

        let images: Vec<DynamicImage> = doc
            .objects
            .values()
            .filter_map(|object| self.decode_image(doc, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use lopdf::dictionary;

    /// A page and its `Pages` node, each naming the other as `Parent`.
    fn looped_parents(pages_resources: Option<Dictionary>) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Parent" => page_id,
        };
        if let Some(resources) = pages_resources {
            pages.set("Resources", resources);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        (doc, page_id)
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.document_images().is_empty());
    }

    #[test]
    fn test_unloaded_extractor_errors() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.extract_text(), Err(PdfError::Parse(_))));
        assert!(matches!(extractor.extract_images(1), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_raw_gray_image() {
        let data = vec![0u8, 64, 128, 255, 10, 20];
        let img = raw_to_image(&data, 3, 2, b"DeviceGray", 8).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
    }

    #[test]
    fn test_raw_rgb_image_too_short() {
        let data = vec![0u8; 5];
        assert!(raw_to_image(&data, 2, 1, b"DeviceRGB", 8).is_none());
        assert!(raw_to_image(&[0u8; 6], 2, 1, b"DeviceRGB", 8).is_some());
    }

    #[test]
    fn test_raw_image_unsupported_depth() {
        assert!(raw_to_image(&[0u8; 4], 2, 2, b"DeviceGray", 1).is_none());
        assert!(raw_to_image(&[0u8; 16], 2, 2, b"DeviceCMYK", 8).is_none());
    }

    #[test]
    fn test_resources_parent_cycle_ends() {
        let (doc, page_id) = looped_parents(None);
        assert!(PdfExtractor::new().resources(&doc, page_id).is_none());
    }

    #[test]
    fn test_resources_inherited_from_parent() {
        let (doc, page_id) = looped_parents(Some(dictionary! {
            "ProcSet" => vec![Object::Name(b"PDF".to_vec())],
        }));

        let resources = PdfExtractor::new().resources(&doc, page_id).unwrap();
        assert!(resources.has(b"ProcSet"));
    }
}
