#![allow(dead_code)]

use std::sync::Arc;

include!("font_fixture.rs");

pub fn font_bytes() -> Arc<[u8]> {
    test_font().into()
}

pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Walk the cross-reference table from `startxref`, checking that every in-use entry
/// points at the matching `N G obj` line. Returns the in-use `(number, offset)` pairs
/// and the declared table size.
pub fn walk_xref(pdf: &[u8]) -> (Vec<(u32, u64)>, usize) {
    let marker = rfind(pdf, b"startxref\n").expect("no startxref");
    let tail = text(&pdf[marker + 10..]);
    let startxref: usize = tail.lines().next().unwrap().trim().parse().unwrap();
    assert!(tail.trim_end().ends_with("%%EOF"));

    let table = &pdf[startxref..];
    assert!(table.starts_with(b"xref\n0 "));
    let header_end = find(&table[5..], b"\n").unwrap() + 5;
    let count: usize = text(&table[7..header_end]).parse().unwrap();

    let mut in_use = Vec::new();
    for number in 0..count {
        let start = header_end + 1 + number * 20;
        let entry = &table[start..start + 20];
        assert_eq!(&entry[18..], b" \n", "entry {number} is not 20 bytes");
        let entry = text(&entry[..18]);
        let mut fields = entry.split(' ');
        let offset: u64 = fields.next().unwrap().parse().unwrap();
        let generation: u16 = fields.next().unwrap().parse().unwrap();
        match fields.next().unwrap() {
            "n" => {
                let expected = format!("{number} {generation} obj");
                assert!(
                    pdf[offset as usize..].starts_with(expected.as_bytes()),
                    "object {number} is not at {offset}"
                );
                in_use.push((number as u32, offset));
            }
            "f" if number == 0 => assert_eq!(generation, 65535),
            "f" => {}
            other => panic!("bad xref entry type {other}"),
        }
    }
    (in_use, count)
}

/// The text of object `number` from `N 0 obj` up to `endobj`
pub fn object(pdf: &[u8], number: u32) -> Vec<u8> {
    let start = find(pdf, format!("\n{number} 0 obj\n").as_bytes()).expect("object not found") + 1;
    let end = find(&pdf[start..], b"endobj").unwrap() + start;
    pdf[start..end].to_vec()
}

/// The raw (still filtered) data of stream object `number`
pub fn stream_data(pdf: &[u8], number: u32) -> Vec<u8> {
    let object = object(pdf, number);
    let start = find(&object, b"\nstream\n").expect("not a stream") + 8;
    let end = rfind(&object, b"\nendstream").unwrap();
    object[start..end].to_vec()
}

pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
