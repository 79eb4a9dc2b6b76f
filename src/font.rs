//! Font objects: standard 14 faces as simple Type1 fonts, TrueType faces as subset
//! Type0/CIDFontType2 fonts with a ToUnicode map. CIDs are the glyph ids of the full
//! face; the CID-to-GID map points them into the subset.

use crate::{
    error::{PDFError, ResourceError},
    object::{Dictionary, Name, Object, ObjectId, PdfString, Stream},
    resources::{
        subset,
        typeman::{TrueTypeFace, Typeface, TypefaceKind, UsedGlyphs},
    },
    sink::ByteSink,
    writer::ObjectWriter,
};
use pdf_writer::types::FontFlags;
use std::collections::HashMap;

/// Index of a font loaded into a document. Content refers to it as `/F{index}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FontId(pub(crate) usize);

impl FontId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Six uppercase letters derived from the glyph set, so different subsets of the same
/// font get different names
fn subset_tag(used: &UsedGlyphs) -> String {
    let mut ctx = md5::Context::new();
    for (gid, _) in used.iter() {
        ctx.consume(gid.to_be_bytes());
    }
    let digest = ctx.finalize();
    digest.0[..6].iter().map(|b| (b'A' + b % 26) as char).collect()
}

/// Commit the font object `id` and everything it points to
pub(crate) fn write_font<S: ByteSink>(
    writer: &mut ObjectWriter<S>,
    id: ObjectId,
    typeface: &Typeface,
    used: &UsedGlyphs,
) -> Result<(), PDFError> {
    match typeface.kind() {
        TypefaceKind::Standard(name) => {
            let mut font = Dictionary::new()
                .with("Type", Name::from("Font"))
                .with("Subtype", Name::from("Type1"))
                .with("BaseFont", Name::from(*name));
            if !matches!(*name, "Symbol" | "ZapfDingbats") {
                font.set("Encoding", Name::from("WinAnsiEncoding"));
            }
            writer.commit(id, font)
        }
        TypefaceKind::TrueType(face) => write_type0(writer, id, face, used),
    }
}

fn write_type0<S: ByteSink>(
    writer: &mut ObjectWriter<S>,
    id: ObjectId,
    face: &TrueTypeFace,
    used: &UsedGlyphs,
) -> Result<(), PDFError> {
    let subset = subset::subset(face.data(), 0, &used.codes()).map_err(|e| ResourceError::MalformedFont {
        name: face.postscript_name(),
        reason: e.to_string(),
    })?;
    let base_font = format!("{}+{}", subset_tag(used), face.postscript_name());

    let cid_font_id = writer.allocate_id();
    let descriptor_id = writer.allocate_id();
    let font_file_id = writer.allocate_id();
    let to_unicode_id = writer.allocate_id();
    let cid_to_gid_id = writer.allocate_id();

    writer.commit(
        id,
        Dictionary::new()
            .with("Type", Name::from("Font"))
            .with("Subtype", Name::from("Type0"))
            .with("BaseFont", Name::from(base_font.as_str()))
            .with("Encoding", Name::from("Identity-H"))
            .with("DescendantFonts", vec![cid_font_id])
            .with("ToUnicode", to_unicode_id),
    )?;

    let (default_width, widths) = widths(face, used);
    writer.commit(
        cid_font_id,
        Dictionary::new()
            .with("Type", Name::from("Font"))
            .with("Subtype", Name::from("CIDFontType2"))
            .with("BaseFont", Name::from(base_font.as_str()))
            .with(
                "CIDSystemInfo",
                Dictionary::new()
                    .with("Registry", PdfString::literal("Adobe"))
                    .with("Ordering", PdfString::literal("Identity"))
                    .with("Supplement", 0),
            )
            .with("FontDescriptor", descriptor_id)
            .with("DW", default_width)
            .with("W", widths)
            .with("CIDToGIDMap", cid_to_gid_id),
    )?;

    writer.commit(descriptor_id, descriptor(face, &base_font, font_file_id))?;

    let map = subset.cid_to_gid_map();
    let program = subset.program;
    let length1 = program.len();
    writer.commit(font_file_id, Stream::new(Dictionary::new().with("Length1", length1), program))?;

    writer.commit(
        to_unicode_id,
        Stream::new(Dictionary::new(), to_unicode(used).into_bytes()),
    )?;
    writer.commit(cid_to_gid_id, Stream::new(Dictionary::new(), map))
}

/// The most common advance as `/DW`, and a `/W` array of runs of consecutive glyph ids
fn widths(face: &TrueTypeFace, used: &UsedGlyphs) -> (f32, Vec<Object>) {
    let id_widths: Vec<(u16, f32)> = used.iter().map(|(gid, _)| (gid, face.advance(gid).round())).collect();

    // find the most popular width to use as the default
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for (_, width) in id_widths.iter() {
        *counts.entry(*width as i64).or_insert(0) += 1;
    }
    let default_width = counts
        .iter()
        .max_by_key(|(&width, &count)| (count, width))
        .map(|(&width, _)| width as f32)
        .unwrap_or(1000.0);

    let mut w: Vec<Object> = Vec::new();
    let mut run: Vec<Object> = Vec::new();
    let mut run_start: Option<u16> = None;
    let mut previous: u16 = 0;
    for (gid, width) in id_widths {
        if width == default_width {
            continue;
        }
        match run_start {
            Some(_) if gid.checked_sub(1) == Some(previous) => {}
            Some(start) => {
                w.push(i64::from(start).into());
                w.push(Object::Array(std::mem::take(&mut run)));
                run_start = Some(gid);
            }
            None => run_start = Some(gid),
        }
        run.push(width.into());
        previous = gid;
    }
    if let Some(start) = run_start {
        w.push(i64::from(start).into());
        w.push(Object::Array(run));
    }
    (default_width, w)
}

fn descriptor(face: &TrueTypeFace, base_font: &str, font_file: ObjectId) -> Dictionary {
    let ttf = face.face();
    let scaling = face.scaling();

    let mut flags = FontFlags::NON_SYMBOLIC;
    if ttf.is_monospaced() {
        flags.insert(FontFlags::FIXED_PITCH);
    }
    if ttf.is_italic() {
        flags.insert(FontFlags::ITALIC);
    }

    let bbox = ttf.global_bounding_box();
    let ascent = ttf.ascender() as f32 * scaling;
    let cap_height = ttf.capital_height().map(|h| h as f32 * scaling).unwrap_or(ascent);

    let mut descriptor = Dictionary::new()
        .with("Type", Name::from("FontDescriptor"))
        .with("FontName", Name::from(base_font));
    if let Some(family) = face.family() {
        descriptor.set("FontFamily", PdfString::text(&family));
    }
    descriptor
        .with("Flags", flags.bits())
        .with(
            "FontBBox",
            vec![
                bbox.x_min as f32 * scaling,
                bbox.y_min as f32 * scaling,
                bbox.x_max as f32 * scaling,
                bbox.y_max as f32 * scaling,
            ],
        )
        .with("ItalicAngle", ttf.italic_angle())
        .with("Ascent", ascent)
        .with("Descent", ttf.descender() as f32 * scaling)
        .with("CapHeight", cap_height)
        // not recoverable from TrueType tables; the customary guess
        .with("StemV", 80)
        .with("FontFile2", font_file)
}

/// A CMap from glyph ids back to the characters they were shown for
fn to_unicode(used: &UsedGlyphs) -> String {
    let mut map: String = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
"#
    .replace("\r\n", "\n");

    // at most 100 entries per bfchar block
    let entries: Vec<(u16, char)> = used.iter().collect();
    for block in entries.chunks(100) {
        map.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, ch) in block {
            let mut utf16 = [0u16; 2];
            let hex: String = ch.encode_utf16(&mut utf16).iter().map(|u| format!("{u:04X}")).collect();
            map.push_str(&format!("<{gid:04X}> <{hex}>\n"));
        }
        map.push_str("endbfchar\n");
    }

    map.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    map
}
