// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the omnidoc-document crate: range-expression
// parsing and document assembly over a synthetic in-memory PDF.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use omnidoc_document::pdf::assembler::{DocumentAssembler, PageDraw};
use omnidoc_document::pdf::range::parse_range_set;

/// Build an N-page synthetic PDF (one short text stream per page).
fn build_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
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
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(num_pages as i64),
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

/// Benchmark parsing a range expression with many tokens against a large
/// document, including leftover computation.
fn bench_range_parse(c: &mut Criterion) {
    let expression = "1-20,25,30-45,50,60-75,80,90-99,120,150-199,210";

    c.bench_function("parse_range_set (10 tokens, 500 pages)", |b| {
        b.iter(|| {
            let set = parse_range_set(black_box(expression), black_box(500)).unwrap();
            black_box(set);
        });
    });
}

/// Benchmark assembling a reversed 20-page document, the hot path shared by
/// split, merge, and reorder.
fn bench_assemble(c: &mut Criterion) {
    let bytes = build_pdf(20);

    c.bench_function("assemble (20 pages reversed)", |b| {
        b.iter(|| {
            let mut assembler = DocumentAssembler::new();
            let src = assembler.add_source(Document::load_mem(&bytes).unwrap(), "bench");
            let draws: Vec<PageDraw> = (0..20).rev().map(|i| PageDraw::page(src, i)).collect();
            let out = assembler.assemble_to_bytes(&draws).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_range_parse, bench_assemble);
criterion_main!(benches);
