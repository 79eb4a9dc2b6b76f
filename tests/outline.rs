mod common;

use pdf_forge::{
    resources::ResourceContext, BookmarkStyle, ConfigurationError, Destination, Document, ExecContext, Fit, PDFError,
    Page, Profile, Pt, Rect, LETTER,
};
use std::sync::Arc;

fn document(options: &[(&str, &str)]) -> Document {
    let mut profile = Profile::new().with("doc.compressed", "0").unwrap();
    for (name, value) in options {
        profile.set(name, value).unwrap();
    }
    Document::with_context(ExecContext::new(profile), Arc::new(ResourceContext::with_defaults())).unwrap()
}

#[test]
fn nested_bookmarks_are_read_back() {
    let mut doc = document(&[]);
    let first = doc.add_page(Page::new(LETTER.0, LETTER.1));
    let second = doc.add_page(Page::new(Pt(300.0), Pt(400.0)));
    let third = doc.add_page(Page::new(LETTER.0, LETTER.1));

    let intro = doc.add_bookmark(None, "Introduction", first).unwrap();
    doc.add_bookmark(Some(intro), "Motivation", second).unwrap();
    doc.add_bookmark(Some(intro), "Scope", third).unwrap();
    doc.add_bookmark_destination(None, "Appendix", Destination::new(third, Fit::Page))
        .unwrap();

    let pdf = doc.to_bytes().unwrap();
    common::walk_xref(&pdf);
    let text = common::text(&pdf);
    assert!(text.contains("/Type /Outlines"));
    assert!(text.contains("/Count -2"));
    assert!(text.contains(" /XYZ null 400 null]"));
    assert!(text.contains(" /Fit]"));

    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    let toc = parsed.get_toc().unwrap();
    let entries: Vec<(usize, &str, usize)> = toc
        .toc
        .iter()
        .map(|entry| (entry.level, entry.title.as_str(), entry.page))
        .collect();
    assert_eq!(
        entries,
        vec![
            (1, "Introduction", 1),
            (2, "Motivation", 2),
            (2, "Scope", 3),
            (1, "Appendix", 3),
        ]
    );
}

#[test]
fn documents_without_bookmarks_have_no_outline() {
    let mut doc = document(&[]);
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    let text = common::text(&doc.to_bytes().unwrap());
    assert!(!text.contains("/Outlines"));
}

#[test]
fn bookmarks_need_a_page_of_the_document() {
    let mut other = document(&[]);
    let foreign = other.add_page(Page::new(LETTER.0, LETTER.1));

    let mut doc = document(&[]);
    doc.add_page(Page::new(LETTER.0, LETTER.1));
    assert!(matches!(
        doc.add_bookmark(None, "Elsewhere", foreign),
        Err(PDFError::Configuration(ConfigurationError::UnknownPage(_)))
    ));
}

#[test]
fn bookmark_styles_need_pdf_1_4() {
    let mut doc = document(&[]);
    let page = doc.add_page(Page::new(LETTER.0, LETTER.1));
    let bookmark = doc.add_bookmark(None, "Red", page).unwrap();
    let style = BookmarkStyle {
        colour: Some((1.0, 0.0, 0.0)),
        bold: true,
        italic: false,
    };
    doc.set_bookmark_style(bookmark, style).unwrap();
    let text = common::text(&doc.to_bytes().unwrap());
    assert!(text.contains("/F 2 /C [1 0 0]"));

    let mut old = document(&[("doc.version", "3")]);
    let page = old.add_page(Page::new(LETTER.0, LETTER.1));
    let bookmark = old.add_bookmark(None, "Red", page).unwrap();
    assert!(matches!(
        old.set_bookmark_style(bookmark, style),
        Err(PDFError::Configuration(ConfigurationError::VersionTooLow { required: 4, .. }))
    ));
}

#[test]
fn links_point_at_pages_and_uris() {
    let mut doc = document(&[]);
    let first = doc.add_page(Page::new(LETTER.0, LETTER.1));
    let last = doc.add_page(Page::new(LETTER.0, LETTER.1));
    let area = Rect::new(Pt(72.0), Pt(700.0), Pt(200.0), Pt(720.0));
    let page = doc.page_mut(first).unwrap();
    page.add_intradocument_link(area, Destination::new(last, Fit::Horizontal { top: None }));
    page.add_uri_link(area, "https://example.com/report");

    let pdf = doc.to_bytes().unwrap();
    common::walk_xref(&pdf);

    let parsed = lopdf::Document::load_mem(&pdf).unwrap();
    let pages = parsed.get_pages();
    let annots = parsed
        .get_dictionary(pages[&1])
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(annots.len(), 2);

    let goto = parsed.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
    assert_eq!(goto.get(b"Subtype").unwrap().as_name().unwrap(), b"Link");
    let dest = goto.get(b"Dest").unwrap().as_array().unwrap();
    assert_eq!(dest[0].as_reference().unwrap(), pages[&2]);
    assert_eq!(dest[1].as_name().unwrap(), b"FitH");

    let uri = parsed.get_dictionary(annots[1].as_reference().unwrap()).unwrap();
    let action = uri.get(b"A").unwrap().as_dict().unwrap();
    assert_eq!(action.get(b"S").unwrap().as_name().unwrap(), b"URI");
    assert_eq!(action.get(b"URI").unwrap().as_str().unwrap(), b"https://example.com/report");
}

#[test]
fn links_to_foreign_pages_fail_the_document() {
    let mut other = document(&[]);
    let foreign = other.add_page(Page::new(LETTER.0, LETTER.1));

    let mut doc = document(&[]);
    let mut page = Page::new(LETTER.0, LETTER.1);
    page.add_intradocument_link(Rect::from_size(Pt(10.0), Pt(10.0)), Destination::new(foreign, Fit::Page));
    doc.add_page(page);
    assert!(matches!(
        doc.to_bytes(),
        Err(PDFError::Configuration(ConfigurationError::UnknownPage(_)))
    ));
}

#[test]
fn link_uris_are_encrypted() {
    let mut doc = document(&[("doc.encryption", "standard")]);
    let mut page = Page::new(LETTER.0, LETTER.1);
    page.add_uri_link(Rect::from_size(Pt(10.0), Pt(10.0)), "https://example.com/secret");
    doc.add_page(page);
    let text = common::text(&doc.to_bytes().unwrap());
    assert!(text.contains("/Subtype /Link"));
    assert!(!text.contains("example.com"));
}
