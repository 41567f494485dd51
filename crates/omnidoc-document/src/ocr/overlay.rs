// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invisible text layer for searchable PDFs.
//
// Recognized tokens are drawn in text rendering mode 3 (neither filled nor
// stroked) at their projected positions, appended as an extra content stream
// so the page's visible rendering is untouched while text search and
// selection see the words.

use std::fmt::Write as _;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use omnidoc_core::error::{OmnidocError, Result};
use tracing::{debug, instrument};

use crate::ocr::ProjectedToken;

/// Resource name of the overlay font registered on each page.
const OVERLAY_FONT: &str = "FOcr";

/// Font size clamp for degenerate token boxes.
const MIN_FONT_SIZE: f32 = 4.0;
const MAX_FONT_SIZE: f32 = 72.0;

/// Append an invisible text layer for `tokens` onto `page_id`.
///
/// `page_height_pts` converts the tokens' top-left-origin coordinates into
/// PDF's bottom-left origin.
#[instrument(skip(doc, tokens), fields(?page_id, tokens = tokens.len()))]
pub fn add_invisible_text_layer(
    doc: &mut Document,
    page_id: ObjectId,
    tokens: &[ProjectedToken],
    page_height_pts: f32,
) -> Result<()> {
    if tokens.is_empty() {
        return Ok(());
    }

    let content = build_overlay_content(tokens, page_height_pts);
    ensure_overlay_font(doc, page_id)?;
    append_content_to_page(doc, page_id, &content)?;

    debug!("Invisible text layer appended");
    Ok(())
}

/// Build the overlay content stream.
fn build_overlay_content(tokens: &[ProjectedToken], page_height_pts: f32) -> String {
    let mut content = String::from("q\nBT\n3 Tr\n");

    for token in tokens {
        let font_size = token.height_pts.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        // Baseline sits at the bottom of the projected box.
        let y = page_height_pts - (token.y_pts + token.height_pts);

        let _ = writeln!(content, "/{OVERLAY_FONT} {font_size:.2} Tf");
        let _ = writeln!(content, "1 0 0 1 {:.2} {:.2} Tm", token.x_pts, y);
        let _ = writeln!(content, "({}) Tj", escape_pdf_string(&token.text));
    }

    content.push_str("ET\nQ\n");
    content
}

/// Escape a string for a PDF literal string. Characters outside Latin-1 are
/// replaced, matching the WinAnsi encoding of the overlay font.
fn escape_pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' | '\r' | '\t' => out.push(' '),
            c if (c as u32) < 256 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Register the Helvetica overlay font in the page's resources, creating the
/// `/Resources` or `/Font` dictionaries when missing. Both dictionaries may
/// be inline or held by reference.
fn ensure_overlay_font(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let font_id = doc.add_object(lopdf::dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let resources_ref = {
        let page = page_dict(doc, page_id)?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    // A /Font table held by reference gets the entry added in place.
    let fonts_ref = {
        let resources_dict = match resources_ref {
            Some(id) => doc.get_object(id).ok().and_then(|o| o.as_dict().ok()),
            None => page_dict(doc, page_id)?
                .get(b"Resources")
                .ok()
                .and_then(|o| o.as_dict().ok()),
        };
        resources_dict.and_then(|dict| match dict.get(b"Font") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        })
    };
    if let Some(fonts_id) = fonts_ref {
        if let Ok(Object::Dictionary(fonts)) = doc.get_object_mut(fonts_id) {
            fonts.set(OVERLAY_FONT, Object::Reference(font_id));
            return Ok(());
        }
        return Err(OmnidocError::Pdf(
            "page /Font entry is not a dictionary".to_string(),
        ));
    }

    match resources_ref {
        Some(resources_id) => {
            if let Ok(Object::Dictionary(resources)) = doc.get_object_mut(resources_id) {
                set_font_entry(resources, font_id);
                Ok(())
            } else {
                Err(OmnidocError::Pdf(
                    "page /Resources entry is not a dictionary".to_string(),
                ))
            }
        }
        None => {
            let page = page_dict_mut(doc, page_id)?;
            if let Ok(Object::Dictionary(resources)) = page.get_mut(b"Resources") {
                set_font_entry(resources, font_id);
            } else {
                let mut resources = Dictionary::new();
                set_font_entry(&mut resources, font_id);
                page.set("Resources", Object::Dictionary(resources));
            }
            Ok(())
        }
    }
}

/// Add the overlay font to an inline `/Font` dictionary, creating it if the
/// resources carry none.
fn set_font_entry(resources: &mut Dictionary, font_id: ObjectId) {
    match resources.get_mut(b"Font") {
        Ok(Object::Dictionary(fonts)) => {
            fonts.set(OVERLAY_FONT, Object::Reference(font_id));
        }
        _ => {
            let mut fonts = Dictionary::new();
            fonts.set(OVERLAY_FONT, Object::Reference(font_id));
            resources.set("Font", Object::Dictionary(fonts));
        }
    }
}

/// Append a content stream after the page's existing content.
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, content: &str) -> Result<()> {
    let content_stream = Stream::new(Dictionary::new(), content.as_bytes().to_vec());
    let content_id = doc.add_object(Object::Stream(content_stream));

    let page = page_dict_mut(doc, page_id)?;
    let existing = page.get(b"Contents").ok().cloned();

    match existing {
        Some(Object::Reference(existing_id)) => {
            page.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(existing_id),
                    Object::Reference(content_id),
                ]),
            );
        }
        Some(Object::Array(mut arr)) => {
            arr.push(Object::Reference(content_id));
            page.set("Contents", Object::Array(arr));
        }
        _ => {
            page.set("Contents", Object::Reference(content_id));
        }
    }
    Ok(())
}

fn page_dict<'a>(doc: &'a Document, page_id: ObjectId) -> Result<&'a Dictionary> {
    doc.get_object(page_id)
        .ok()
        .and_then(|obj| obj.as_dict().ok())
        .ok_or_else(|| OmnidocError::Pdf(format!("page {:?} is not a dictionary", page_id)))
}

fn page_dict_mut<'a>(doc: &'a mut Document, page_id: ObjectId) -> Result<&'a mut Dictionary> {
    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        _ => Err(OmnidocError::Pdf(format!(
            "page {:?} is not a dictionary",
            page_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::testutil::build_scanned_pdf;

    fn token(text: &str, x: f32, y: f32, w: f32, h: f32) -> ProjectedToken {
        ProjectedToken {
            text: text.to_string(),
            line: 0,
            x_pts: x,
            y_pts: y,
            width_pts: w,
            height_pts: h,
        }
    }

    #[test]
    fn escaping_covers_pdf_specials() {
        assert_eq!(escape_pdf_string("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_pdf_string("tab\there"), "tab here");
        assert_eq!(escape_pdf_string("naïve"), "naïve");
        assert_eq!(escape_pdf_string("日本"), "??");
    }

    #[test]
    fn overlay_uses_invisible_render_mode() {
        let content = build_overlay_content(&[token("hello", 10.0, 20.0, 50.0, 12.0)], 792.0);
        assert!(content.contains("3 Tr"));
        assert!(content.contains("(hello) Tj"));
        // Baseline: 792 - (20 + 12) = 760.
        assert!(content.contains("1 0 0 1 10.00 760.00 Tm"));
    }

    #[test]
    fn layer_appends_without_replacing_page_content() {
        let bytes = build_scanned_pdf(100, 100, 500.0, 500.0);
        let mut doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();

        add_invisible_text_layer(
            &mut doc,
            page_id,
            &[token("word", 5.0, 5.0, 40.0, 10.0)],
            500.0,
        )
        .unwrap();

        // Contents must now be an array: original stream + overlay stream.
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let contents = page.get(b"Contents").unwrap();
        assert!(matches!(contents, Object::Array(arr) if arr.len() == 2));

        // The font landed in the page resources.
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.get(OVERLAY_FONT.as_bytes()).is_ok());

        // The mutated document still saves and reloads.
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        let reloaded = Document::load_mem(&out).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[test]
    fn empty_token_list_is_a_noop() {
        let bytes = build_scanned_pdf(50, 50, 200.0, 200.0);
        let mut doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let before = format!("{:?}", doc.get_object(page_id).unwrap());

        add_invisible_text_layer(&mut doc, page_id, &[], 200.0).unwrap();
        let after = format!("{:?}", doc.get_object(page_id).unwrap());
        assert_eq!(before, after);
    }
}
