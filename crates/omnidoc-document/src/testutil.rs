// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared test helpers: synthetic in-memory PDFs built with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Build an N-page PDF where page i prints "Page i" in Helvetica.
///
/// Each page gets its own content stream and a shared Type1 font resource so
/// text extraction works on the result.
pub(crate) fn build_test_pdf(num_pages: u32) -> Vec<u8> {
    build_test_pdf_with_rotations(&vec![0; num_pages as usize])
}

/// Build a PDF with one page per entry, each page carrying the given
/// `/Rotate` value.
pub(crate) fn build_test_pdf_with_rotations(rotations: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(font_id),
        },
    });

    let mut kids = Vec::new();
    for (i, &rotation) in rotations.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("content encodes"),
        ));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        };
        if rotation != 0 {
            page.set("Rotate", Object::Integer(rotation));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(rotations.len() as i64),
        "Kids" => Object::Array(kids),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("synthetic PDF saves");
    buffer
}

/// Build a single-page PDF whose only content is an embedded grayscale image
/// XObject of the given dimensions, mimicking a scanned page. The media box
/// is sized `width_pts` x `height_pts`.
pub(crate) fn build_scanned_pdf(
    img_width: u32,
    img_height: u32,
    width_pts: f32,
    height_pts: f32,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // Raw 8-bit grayscale pixels, mid-gray.
    let pixels = vec![0x80u8; (img_width * img_height) as usize];
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(img_width as i64),
            "Height" => Object::Integer(img_height as i64),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        },
        pixels,
    );
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width_pts),
                    0.into(),
                    0.into(),
                    Object::Real(height_pts),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("content encodes"),
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(width_pts),
            Object::Real(height_pts),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        },
        "Contents" => Object::Reference(content_id),
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(1),
        "Kids" => vec![Object::Reference(page_id)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("synthetic PDF saves");
    buffer
}
