//! End-to-end tests: PDFs built in memory, OCR replaced by a stub engine.

use std::cell::Cell;

use finstat_core::error::{FinstatError, OcrError};
use finstat_core::models::config::PdfConfig;
use finstat_core::ocr::{self, OcrEngine, OcrResult, TextBox};
use finstat_core::{LineRecord, ParsedDocument, StatementExtractor, TextSource};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;

/// Returns one canned page of text per call, in order.
struct ScriptedOcr {
    pages: Vec<&'static str>,
    calls: Cell<usize>,
}

impl ScriptedOcr {
    fn new(pages: &[&'static str]) -> Self {
        Self {
            pages: pages.to_vec(),
            calls: Cell::new(0),
        }
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, image: &DynamicImage) -> ocr::Result<OcrResult> {
        let call = self.calls.get();
        self.calls.set(call + 1);

        let text = self
            .pages
            .get(call)
            .ok_or_else(|| OcrError::Recognition(format!("unexpected page {}", call + 1)))?;

        let boxes = text
            .lines()
            .enumerate()
            .map(|(row, line)| {
                let y = row as f32 * 40.0;
                TextBox {
                    bbox: [0.0, y, 200.0, y, 200.0, y + 12.0, 0.0, y + 12.0],
                    text: line.to_string(),
                    score: 0.95,
                }
            })
            .collect();

        Ok(OcrResult::from_boxes(boxes, 20.0, 1, (image.width(), image.height())))
    }
}

/// A PDF whose pages each carry one small gray image and no text.
fn scanned_pdf(pages: usize) -> Vec<u8> {
    scanned_pdf_with_images(&vec![true; pages])
}

/// A PDF with no text, one page per flag. Flagged pages carry one small gray
/// image; the others are blank.
fn scanned_pdf_with_images(pages: &[bool]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for &has_image in pages {
        if !has_image {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {},
            });
            kids.push(page_id.into());
            continue;
        }

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![255u8; 8],
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![400.into(), 0.into(), 0.into(), 200.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
            "Contents" => content_id,
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

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A single-page PDF with a Helvetica text layer, one line per entry.
fn text_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![50.into(), 750.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-20).into()]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().unwrap(),
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn scanned_pdf_is_read_with_ocr_in_page_order() {
    let ocr = ScriptedOcr::new(&["Total Revenue: $1,234,567.89", "Net Income (Loss) 45,000"]);
    let extractor = StatementExtractor::new(PdfConfig::default()).with_ocr(&ocr);

    let extraction = extractor.extract_pdf(&scanned_pdf(2)).unwrap();

    assert_eq!(extraction.source, TextSource::Ocr);
    assert_eq!(extraction.page_count, 2);
    assert_eq!(
        extraction.raw_text,
        "Total Revenue: $1,234,567.89\nNet Income (Loss) 45,000"
    );
    assert_eq!(
        extraction.document,
        ParsedDocument::Structured(vec![
            LineRecord::new("Total Revenue", "1234567.89"),
            LineRecord::new("Net Income (Loss)", "45000"),
        ])
    );
}

#[test]
fn max_pages_limits_ocr() {
    let ocr = ScriptedOcr::new(&["Cash: 100", "Debt: 200"]);
    let config = PdfConfig {
        max_pages: 1,
        ..PdfConfig::default()
    };
    let extractor = StatementExtractor::new(config).with_ocr(&ocr);

    let extraction = extractor.extract_pdf(&scanned_pdf(2)).unwrap();

    assert_eq!(ocr.calls.get(), 1);
    assert_eq!(extraction.document.records(), &[LineRecord::new("Cash", "100")]);
}

#[test]
fn ocr_failure_names_the_page() {
    // Only one canned page: the second call fails.
    let ocr = ScriptedOcr::new(&["Cash: 100"]);
    let extractor = StatementExtractor::new(PdfConfig::default()).with_ocr(&ocr);

    let err = extractor.extract_pdf(&scanned_pdf(2)).unwrap_err();

    assert!(matches!(
        err,
        FinstatError::Ocr(OcrError::Page { page: 2, .. })
    ));
}

#[test]
fn blank_pages_are_skipped_but_keep_their_numbers() {
    let ocr = ScriptedOcr::new(&["Cash: 100"]);
    let extractor = StatementExtractor::new(PdfConfig::default()).with_ocr(&ocr);

    let extraction = extractor
        .extract_pdf(&scanned_pdf_with_images(&[false, true, false]))
        .unwrap();

    assert_eq!(ocr.calls.get(), 1);
    assert_eq!(extraction.page_count, 3);
    assert_eq!(extraction.raw_text, "Cash: 100");

    let failing = ScriptedOcr::new(&[]);
    let extractor = StatementExtractor::new(PdfConfig::default()).with_ocr(&failing);

    let err = extractor
        .extract_pdf(&scanned_pdf_with_images(&[false, true]))
        .unwrap_err();

    assert!(matches!(
        err,
        FinstatError::Ocr(OcrError::Page { page: 2, .. })
    ));
}

#[test]
fn scanned_pdf_without_engine_is_unavailable() {
    let extractor = StatementExtractor::new(PdfConfig::default());

    let err = extractor.extract_pdf(&scanned_pdf(1)).unwrap_err();

    assert!(matches!(err, FinstatError::Ocr(OcrError::Unavailable(_))));
}

#[test]
fn text_layer_is_preferred_over_ocr() {
    let pdf = text_pdf(&[
        "Consolidated Balance Sheet",
        "Total Revenue: 1,234,567.89",
        "Operating Expenses: 987,000",
    ]);
    let ocr = ScriptedOcr::new(&[]);
    let extractor = StatementExtractor::new(PdfConfig::default()).with_ocr(&ocr);

    let extraction = extractor.extract_pdf(&pdf).unwrap();

    assert_eq!(extraction.source, TextSource::Embedded);
    assert_eq!(ocr.calls.get(), 0);
    assert!(extraction
        .document
        .records()
        .contains(&LineRecord::new("Total Revenue", "1234567.89")));
}

#[test]
fn short_text_layer_is_used_when_no_engine() {
    let pdf = text_pdf(&["Cash: 42"]);
    let extractor = StatementExtractor::new(PdfConfig::default());

    let extraction = extractor.extract_pdf(&pdf).unwrap();

    assert_eq!(extraction.source, TextSource::Embedded);
    assert_eq!(extraction.document.records(), &[LineRecord::new("Cash", "42")]);
}
