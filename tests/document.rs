mod common;

use miniz_oxide::inflate::decompress_to_vec_zlib;
use pdf_forge::{
    colours,
    message::{codes, CollectingSink},
    resources::{fontspec::FontSpec, ResourceContext},
    sink::MemorySink,
    ConfigurationError, Document, ExecContext, PDFError, Page, Profile, Pt, SerializationError, LETTER,
};
use std::sync::Arc;

fn profile(options: &[(&str, &str)]) -> Profile {
    let mut profile = Profile::new();
    for (name, value) in options {
        profile.set(name, value).unwrap();
    }
    profile
}

fn document(options: &[(&str, &str)]) -> (Document, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let exec = ExecContext::with_sink(profile(options), sink.clone());
    let doc = Document::with_context(exec, Arc::new(ResourceContext::with_defaults())).unwrap();
    (doc, sink)
}

#[test]
fn one_empty_page_uncompressed() {
    let (mut doc, _) = document(&[("doc.compressed", "0")]);
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    let pdf = doc.to_bytes().unwrap();

    assert!(pdf.starts_with(b"%PDF-1.5\n"));
    let (objects, size) = common::walk_xref(&pdf);
    // catalog, page tree, page, info
    assert_eq!(objects.len(), 4);
    assert_eq!(size, 5);

    let text = common::text(&pdf);
    assert!(text.contains("/Size 5 "));
    assert_eq!(common::count(&text, "/Type /Page /"), 1);
    assert!(!text.contains("/Filter"));
    assert!(!text.contains("/Contents"));
    assert!(text.contains("/Kids [3 0 R] /Count 1"));
}

#[test]
fn empty_document_warns_and_still_has_a_page_tree() {
    let (doc, sink) = document(&[]);
    let pdf = doc.to_bytes().unwrap();
    assert_eq!(sink.codes(), vec![codes::EMPTY_DOCUMENT]);
    let text = common::text(&pdf);
    assert!(text.contains("/Kids [] /Count 0"));
    common::walk_xref(&pdf);
}

#[test]
fn two_pages_share_one_font_object() {
    let (mut doc, _) = document(&[("doc.compressed", "0")]);
    let small = doc.font_load("standard;name=Times-Roman;size=10").unwrap();
    let large = doc.font_load("standard;name=Times-Roman;size=20").unwrap();
    for font in [small, large] {
        let mut page = Page::new(LETTER.0, LETTER.1);
        page.add_span(doc.span(font, "hello", (Pt(72.0), Pt(700.0)), colours::BLACK));
        doc.add_page(page);
    }
    let pdf = common::text(&doc.to_bytes().unwrap());

    assert_eq!(common::count(&pdf, "/Type /Font"), 1);
    assert_eq!(common::count(&pdf, "/BaseFont /Times-Roman"), 1);
    assert!(pdf.contains("/F0 10 Tf"));
    assert!(pdf.contains("/F1 20 Tf"));
}

#[test]
fn unused_fonts_are_not_emitted() {
    let (mut doc, sink) = document(&[("doc.compressed", "0")]);
    let used = doc.font_load("standard;name=Helvetica").unwrap();
    doc.font_load("standard;name=Courier").unwrap();
    let mut page = Page::new(LETTER.0, LETTER.1);
    page.add_span(doc.span(used, "x", (Pt(10.0), Pt(10.0)), colours::BLACK));
    doc.add_page(page);
    let resources = doc.resources().clone();
    let pdf = common::text(&doc.to_bytes().unwrap());

    assert!(pdf.contains("/BaseFont /Helvetica"));
    assert!(!pdf.contains("Courier"));
    assert!(sink.codes().contains(&codes::UNUSED_RESOURCE));

    let spec: FontSpec = "standard;name=Courier".parse().unwrap();
    let exec = ExecContext::default();
    let courier = resources.resolve_font(&spec, &exec).unwrap();
    assert!(!resources.is_materialized(courier.handle));
}

#[test]
fn xref_offsets_match_and_lopdf_reads_it() {
    let (mut doc, _) = document(&[]);
    let font = doc.default_font().unwrap();
    for text in ["first", "second"] {
        let mut page = Page::new(LETTER.0, LETTER.1);
        page.add_span(doc.span(font, text, (Pt(72.0), Pt(720.0)), colours::BLUE));
        doc.add_page(page);
    }
    let pdf = doc.to_bytes().unwrap();
    common::walk_xref(&pdf);

    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    let pages = parsed.get_pages();
    assert_eq!(pages.len(), 2);
    let content = parsed.get_page_content(pages[&1]).unwrap();
    assert!(common::text(&content).contains("<6669727374> Tj"));
}

#[test]
fn content_streams_are_compressed() {
    let (mut doc, _) = document(&[]);
    let mut page = Page::new(LETTER.0, LETTER.1);
    page.add_raw(b"0 0 m 100 100 l S".to_vec());
    doc.add_page(page);
    let pdf = doc.to_bytes().unwrap();

    // catalog, page tree, page, content
    let object = common::text(&common::object(&pdf, 4));
    assert!(object.contains("/Filter /FlateDecode"));
    let data = common::stream_data(&pdf, 4);
    assert!(object.contains(&format!("/Length {}", data.len())));
    let inflated = decompress_to_vec_zlib(&data).unwrap();
    assert_eq!(inflated, b"q\n0 0 m 100 100 l S\nQ\n");
}

#[test]
fn a_document_is_finalized_once() {
    let (mut doc, _) = document(&[]);
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    let sink = doc.finalize_to(MemorySink::in_memory()).unwrap();
    common::walk_xref(sink.bytes());

    let again = doc.finalize_to(MemorySink::in_memory());
    assert!(matches!(
        again,
        Err(PDFError::Serialization(SerializationError::Finalized))
    ));
}

#[test]
fn pages_can_be_inserted_anywhere() {
    let (mut doc, _) = document(&[("doc.compressed", "0")]);
    let first = doc.add_page(Page::new(Pt(100.0), Pt(100.0)));
    let last = doc.add_page(Page::new(Pt(300.0), Pt(300.0)));
    let middle = doc.insert_page_after_id(Page::new(Pt(200.0), Pt(200.0)), first);
    let front = doc.insert_page_before_id(Page::new(Pt(50.0), Pt(50.0)), first);

    assert_eq!(doc.index_of_page(front), Some(0));
    assert_eq!(doc.index_of_page(middle), Some(2));
    assert_eq!(doc.id_of_page_index(3), Some(last));
    assert!(doc.page_mut(middle).is_some());

    let pdf = doc.to_bytes().unwrap();
    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(parsed.get_pages().len(), 4);
}

#[test]
fn info_and_catalog_options() {
    let (mut doc, _) = document(&[
        ("doc.compressed", "0"),
        ("doc.page_layout", "TwoColumnLeft"),
        ("info.creation_date", "0"),
        ("info.static_producer", "1"),
    ]);
    doc.info.title("Quarterly").author("A. Writer");
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    let pdf = common::text(&doc.to_bytes().unwrap());

    assert!(pdf.contains("/PageLayout /TwoColumnLeft"));
    assert!(pdf.contains("/Title (Quarterly)"));
    assert!(pdf.contains("/Author (A. Writer)"));
    assert!(pdf.contains("/Producer (pdf-forge)"));
}

#[test]
fn static_file_ids_are_reproducible() {
    let build = || {
        let (mut doc, _) = document(&[("doc.static_file_id", "1"), ("info.creation_date", "0")]);
        doc.add_page(Page::new(LETTER.0, LETTER.1));
        doc.to_bytes().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn unknown_options_are_rejected() {
    let mut profile = Profile::new();
    assert!(matches!(
        profile.set("doc.colour", "1"),
        Err(ConfigurationError::UnknownOption(_))
    ));
    assert!(profile.set("doc.version", "9").is_err());
}

#[test]
fn save_writes_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let (mut doc, _) = document(&[]);
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    doc.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.ends_with(b"%%EOF\n"));
    common::walk_xref(&bytes);
}

#[test]
fn text_in_an_unresolved_font_fails_the_document() {
    let (mut doc, sink) = document(&[]);
    let font = doc.font_load("file=/nonexistent/font.ttf").unwrap();
    assert!(!doc.is_font_resolved(font));
    assert!(sink.codes().contains(&codes::FONT_NOT_FOUND));

    let mut page = Page::new(LETTER.0, LETTER.1);
    page.add_span(doc.span(font, "x", (Pt(0.0), Pt(0.0)), colours::BLACK));
    doc.add_page(page);
    assert!(matches!(doc.to_bytes(), Err(PDFError::Resource(_))));
}
