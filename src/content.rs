//! Turns page contents into content stream operators, recording which glyphs each
//! font shows.

use crate::{
    colour::Colour,
    config::ExecContext,
    error::{PDFError, ResourceError},
    message::codes,
    page::{PageContents, SpanFont, SpanLayout},
    resources::typeman::{Typeface, UsedGlyphs},
};
use std::{collections::BTreeSet, io::Write, sync::Arc};

/// Slant of the text matrix for synthesized italics (about 12 degrees)
const FAUX_ITALIC_SKEW: f32 = 0.21;
/// Outline width for synthesized bold, relative to the font size
const FAUX_BOLD_STROKE: f32 = 0.03;

/// A font as a document uses it while rendering
pub(crate) struct RenderFont {
    /// Describes the font in messages
    pub label: String,
    /// `None` when the font could not be resolved
    pub typeface: Option<Arc<Typeface>>,
    pub used: UsedGlyphs,
    warned: BTreeSet<char>,
}

impl RenderFont {
    pub fn new(label: String, typeface: Option<Arc<Typeface>>) -> RenderFont {
        RenderFont {
            label,
            typeface,
            used: UsedGlyphs::default(),
            warned: BTreeSet::new(),
        }
    }
}

/// Renders page contents to a content stream
#[allow(clippy::write_with_newline)]
pub(crate) fn render_contents(
    contents: &[PageContents],
    fonts: &mut [RenderFont],
    exec: &ExecContext,
) -> Result<Vec<u8>, PDFError> {
    let mut content: Vec<u8> = Vec::default();

    for page_content in contents.iter() {
        match page_content {
            PageContents::Text(spans) => {
                render_text_spans(&mut content, spans, fonts, exec)?;
            }
            PageContents::Image(image) => {
                write!(&mut content, "q\n")?;
                write!(
                    &mut content,
                    "{} 0 0 {} {} {} cm\n",
                    image.position.width().0,
                    image.position.height().0,
                    image.position.x1.0,
                    image.position.y1.0
                )?;
                write!(&mut content, "/I{} Do\n", image.image.index())?;
                write!(&mut content, "Q\n")?;
            }
            PageContents::RawContent(c) => {
                write!(&mut content, "q\n")?;
                content.write_all(c.as_slice())?;
                write!(&mut content, "\nQ\n")?;
            }
        }
    }

    Ok(content)
}

fn font_for<'a>(fonts: &'a mut [RenderFont], font: SpanFont) -> Result<(&'a mut RenderFont, Arc<Typeface>), ResourceError> {
    let slot = fonts
        .get_mut(font.id.index())
        .ok_or_else(|| ResourceError::Required(format!("font #{}", font.id.index())))?;
    let typeface = slot
        .typeface
        .clone()
        .ok_or_else(|| ResourceError::Required(slot.label.clone()))?;
    Ok((slot, typeface))
}

#[allow(clippy::write_with_newline)]
fn render_text_spans(
    content: &mut Vec<u8>,
    spans: &[SpanLayout],
    fonts: &mut [RenderFont],
    exec: &ExecContext,
) -> Result<(), PDFError> {
    let first = match spans.first() {
        Some(first) => first,
        None => return Ok(()),
    };

    write!(content, "q\n")?;

    let mut current_font: SpanFont = first.font;
    let mut current_colour: Colour = first.colour;

    write!(content, "/F{} {} Tf\n", current_font.id.index(), current_font.size.0)?;
    current_colour.write_fill(content)?;

    for span in spans.iter() {
        if span.font != current_font {
            current_font = span.font;
            write!(content, "/F{} {} Tf\n", current_font.id.index(), current_font.size.0)?;
        }
        if span.colour != current_colour {
            current_colour = span.colour;
            current_colour.write_fill(content)?;
        }

        let (slot, typeface) = font_for(fonts, span.font)?;
        let synthesized = typeface.synthesized();

        if synthesized.bold {
            current_colour.write_stroke(content)?;
            write!(content, "2 Tr\n{} w\n", span.font.size.0 * FAUX_BOLD_STROKE)?;
        }
        write!(content, "BT\n")?;
        if synthesized.italic {
            write!(
                content,
                "1 0 {FAUX_ITALIC_SKEW} 1 {} {} Tm\n",
                span.coords.0 .0, span.coords.1 .0
            )?;
        } else {
            write!(content, "{} {} Td\n", span.coords.0 .0, span.coords.1 .0)?;
        }

        write!(content, "<")?;
        for ch in span.text.chars() {
            let code = match typeface.encode(ch) {
                Some(code) => Some(code),
                None => {
                    if slot.warned.insert(ch) {
                        let (code, what) = if typeface.is_standard() {
                            (codes::UNMAPPABLE_CHAR, "cannot be encoded in")
                        } else {
                            (codes::MISSING_GLYPH, "has no glyph in")
                        };
                        exec.warn(code, &format!("character {ch:?} {what} {}", slot.label));
                    }
                    typeface.replacement()
                }
            };
            let code = match code {
                Some(code) => code,
                None => continue,
            };
            slot.used.insert(code, ch);
            if typeface.is_standard() {
                write!(content, "{:02X}", code)?;
            } else {
                write!(content, "{:04X}", code)?;
            }
        }
        write!(content, "> Tj\n")?;
        write!(content, "ET\n")?;
        if synthesized.bold {
            write!(content, "0 Tr\n")?;
        }
    }

    write!(content, "Q\n")?;
    Ok(())
}
