//! Turning font specs into typefaces: loading font programs, mapping the standard 14
//! families onto their physical faces, and deciding which styles must be synthesized.

use super::{
    fontspec::{FontSource, FontSpec, TypefaceSpec},
    ResourceContext, ResourceHandle, ResourceSpec,
};
use crate::{
    config::ExecContext,
    encoding::win_ansi_code,
    error::ResourceError,
    message::codes,
};
use owned_ttf_parser::{name_id, AsFaceRef, Face, OwnedFace};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Loads font programs on behalf of the resolver
pub trait FontLoader: Send + Sync {
    fn load(&self, source: &FontSource) -> Result<OwnedFace, ResourceError>;
}

/// Reads TrueType programs from files or memory. Faces requested by name alone are
/// never found: there is no system font lookup.
#[derive(Debug, Default, Copy, Clone)]
pub struct TtfLoader;

impl FontLoader for TtfLoader {
    fn load(&self, source: &FontSource) -> Result<OwnedFace, ResourceError> {
        let bytes = match source {
            FontSource::File(path) => std::fs::read(path)
                .map_err(|e| ResourceError::NotFound(format!("{}: {e}", path.display())))?,
            FontSource::Bytes(bytes) => bytes.to_vec(),
            FontSource::Name(name) | FontSource::Standard(name) => {
                return Err(ResourceError::NotFound(name.clone()))
            }
        };
        OwnedFace::from_vec(bytes, 0).map_err(|e| ResourceError::MalformedFont {
            name: source.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Styles that the font program lacks and that are faked when drawing
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub bold: bool,
    pub italic: bool,
}

impl Synthesis {
    pub fn any(&self) -> bool {
        self.bold || self.italic
    }
}

pub struct TrueTypeFace {
    face: OwnedFace,
}

impl TrueTypeFace {
    pub fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    /// The raw font program
    pub fn data(&self) -> &[u8] {
        self.face.as_slice()
    }

    fn name(&self, id: u16) -> Option<String> {
        self.face()
            .names()
            .into_iter()
            .find(|name| name.name_id == id && name.is_unicode())
            .and_then(|name| name.to_string())
    }

    /// PostScript name with anything a PDF name would need escaped removed
    pub fn postscript_name(&self) -> String {
        let name = self
            .name(name_id::POST_SCRIPT_NAME)
            .or_else(|| self.name(name_id::FULL_NAME))
            .unwrap_or_else(|| "Embedded".to_string());
        let cleaned: String = name
            .chars()
            .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%#".contains(*c))
            .collect();
        if cleaned.is_empty() {
            "Embedded".to_string()
        } else {
            cleaned
        }
    }

    pub fn family(&self) -> Option<String> {
        self.name(name_id::FAMILY)
    }

    /// Font units to text space units (thousandths of the font size)
    pub fn scaling(&self) -> f32 {
        1000.0 / self.face().units_per_em() as f32
    }

    /// Horizontal advance in thousandths of the font size
    pub fn advance(&self, gid: u16) -> f32 {
        self.face()
            .glyph_hor_advance(owned_ttf_parser::GlyphId(gid))
            .map(|w| w as f32 * self.scaling())
            .unwrap_or(0.0)
    }
}

pub enum TypefaceKind {
    /// One of the standard 14 faces, by its PostScript name
    Standard(&'static str),
    TrueType(TrueTypeFace),
}

/// A loaded font program in one style, shared by every font size that uses it
pub struct Typeface {
    kind: TypefaceKind,
    synthesized: Synthesis,
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeface")
            .field("name", &self.base_name())
            .field("synthesized", &self.synthesized)
            .finish()
    }
}

impl Typeface {
    pub fn kind(&self) -> &TypefaceKind {
        &self.kind
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.kind, TypefaceKind::Standard(_))
    }

    pub fn synthesized(&self) -> Synthesis {
        self.synthesized
    }

    pub fn base_name(&self) -> String {
        match &self.kind {
            TypefaceKind::Standard(name) => name.to_string(),
            TypefaceKind::TrueType(face) => face.postscript_name(),
        }
    }

    /// The code a character is shown with: a WinAnsi byte for the standard faces, a
    /// glyph id for embedded ones. `None` when the face cannot show it.
    pub fn encode(&self, ch: char) -> Option<u16> {
        match &self.kind {
            TypefaceKind::Standard("Symbol") | TypefaceKind::Standard("ZapfDingbats") => {
                u8::try_from(u32::from(ch)).ok().map(u16::from)
            }
            TypefaceKind::Standard(_) => win_ansi_code(ch).map(u16::from),
            TypefaceKind::TrueType(face) => face
                .face()
                .glyph_index(ch)
                .map(|gid| gid.0)
                .filter(|gid| *gid != 0),
        }
    }

    /// Glyph shown when a character has none of its own
    pub fn replacement(&self) -> Option<u16> {
        match &self.kind {
            TypefaceKind::Standard(_) => win_ansi_code('?').map(u16::from),
            TypefaceKind::TrueType(face) => face
                .face()
                .glyph_index('\u{FFFD}')
                .map(|gid| gid.0)
                .or(Some(0)),
        }
    }
}

/// The physical standard face for a family and style, and the part of the style the
/// face cannot provide
fn standard_face(family: &str, bold: bool, italic: bool) -> Option<(&'static str, Synthesis)> {
    let faces: [&'static str; 4] = match family {
        "Courier" => ["Courier", "Courier-Bold", "Courier-Oblique", "Courier-BoldOblique"],
        "Helvetica" => ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique", "Helvetica-BoldOblique"],
        "Times-Roman" => ["Times-Roman", "Times-Bold", "Times-Italic", "Times-BoldItalic"],
        "Symbol" => return Some(("Symbol", Synthesis { bold, italic })),
        "ZapfDingbats" => return Some(("ZapfDingbats", Synthesis { bold, italic })),
        _ => return None,
    };
    let index = usize::from(bold) + 2 * usize::from(italic);
    Some((faces[index], Synthesis::default()))
}

/// The glyphs a document shows through one typeface, with the character each came from
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsedGlyphs(BTreeMap<u16, char>);

impl UsedGlyphs {
    pub fn insert(&mut self, code: u16, ch: char) {
        self.0.entry(code).or_insert(ch);
    }

    pub fn codes(&self) -> BTreeSet<u16> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, char)> + '_ {
        self.0.iter().map(|(&code, &ch)| (code, ch))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A font spec bound to a typeface held in a [ResourceContext]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    pub handle: ResourceHandle,
    /// The spec that actually resolved, which differs from the request after a fallback
    pub spec: FontSpec,
    pub fallback: bool,
}

/// Loads typefaces for a resource context and keeps count of the work done
pub struct TypeResolver {
    loader: Box<dyn FontLoader>,
    typefaces_loaded: AtomicUsize,
    fonts_resolved: AtomicUsize,
}

impl Default for TypeResolver {
    fn default() -> Self {
        TypeResolver::new(Box::new(TtfLoader))
    }
}

impl TypeResolver {
    pub fn new(loader: Box<dyn FontLoader>) -> TypeResolver {
        TypeResolver {
            loader,
            typefaces_loaded: AtomicUsize::new(0),
            fonts_resolved: AtomicUsize::new(0),
        }
    }

    /// Number of typefaces constructed, standard faces included
    pub fn typefaces_loaded(&self) -> usize {
        self.typefaces_loaded.load(Ordering::Relaxed)
    }

    /// Number of successful [TypeResolver::resolve] calls
    pub fn fonts_resolved(&self) -> usize {
        self.fonts_resolved.load(Ordering::Relaxed)
    }

    /// Build the typeface for a spec. Called by the resource context on a miss, with
    /// its registry locked.
    pub(crate) fn load(&self, spec: &TypefaceSpec) -> Result<Typeface, ResourceError> {
        let typeface = match &spec.source {
            FontSource::Standard(family) => {
                let (name, synthesized) = standard_face(family, spec.bold, spec.italic)
                    .ok_or_else(|| ResourceError::NotFound(family.clone()))?;
                Typeface {
                    kind: TypefaceKind::Standard(name),
                    synthesized,
                }
            }
            source => {
                let face = self.loader.load(source)?;
                if face.as_face_ref().tables().glyf.is_none() {
                    return Err(ResourceError::MalformedFont {
                        name: source.to_string(),
                        reason: "only TrueType outlines can be embedded".to_string(),
                    });
                }
                let synthesized = Synthesis {
                    bold: spec.bold && !face.as_face_ref().is_bold(),
                    italic: spec.italic && !(face.as_face_ref().is_italic() || face.as_face_ref().is_oblique()),
                };
                Typeface {
                    kind: TypefaceKind::TrueType(TrueTypeFace { face }),
                    synthesized,
                }
            }
        };
        self.typefaces_loaded.fetch_add(1, Ordering::Relaxed);
        log::debug!("loaded typeface {} from {}", typeface.base_name(), spec.source);
        Ok(typeface)
    }

    fn acquire(&self, ctx: &ResourceContext, spec: &FontSpec, exec: &ExecContext) -> Result<ResourceHandle, ResourceError> {
        let handle = ctx.get_or_create(&ResourceSpec::Typeface(spec.typeface_spec()))?;
        let synthesized = ctx
            .typeface(handle)
            .map(|typeface| typeface.synthesized().any())
            .unwrap_or(false);
        if synthesized && !exec.profile().get_bool("fonts.synthesized").unwrap_or(true) {
            ctx.release(handle);
            return Err(ResourceError::SynthesisDisabled(spec.source.to_string()));
        }
        Ok(handle)
    }

    /// Resolve a font spec through the context, falling back to `fonts.fallback` when
    /// the requested font program cannot be loaded. The returned handle holds one
    /// reference on the context.
    pub fn resolve(&self, ctx: &ResourceContext, spec: &FontSpec, exec: &ExecContext) -> Result<ResolvedFont, ResourceError> {
        let err = match self.acquire(ctx, spec, exec) {
            Ok(handle) => {
                self.fonts_resolved.fetch_add(1, Ordering::Relaxed);
                return Ok(ResolvedFont {
                    handle,
                    spec: spec.clone(),
                    fallback: false,
                });
            }
            Err(e) => e,
        };

        // the fallback stands in for a font program that cannot be loaded; a refused
        // synthesis would be refused for the fallback too
        let fallback = exec.profile().get("fonts.fallback").unwrap_or("");
        if matches!(err, ResourceError::SynthesisDisabled(_)) || fallback.is_empty() {
            exec.warn(codes::FONT_NOT_FOUND, &err.to_string());
            return Err(err);
        }

        let mut fallback: FontSpec = match fallback.parse() {
            Ok(fallback) => fallback,
            Err(e) => {
                exec.warn(codes::FONT_NOT_FOUND, &e.to_string());
                return Err(err);
            }
        };
        fallback.size = spec.size;
        fallback.bold |= spec.bold;
        fallback.italic |= spec.italic;

        match self.acquire(ctx, &fallback, exec) {
            Ok(handle) => {
                exec.warn(
                    codes::FONT_FALLBACK,
                    &format!("{err}; using {} instead", fallback.source),
                );
                self.fonts_resolved.fetch_add(1, Ordering::Relaxed);
                Ok(ResolvedFont {
                    handle,
                    spec: fallback,
                    fallback: true,
                })
            }
            Err(fallback_err) => {
                exec.warn(codes::FONT_NOT_FOUND, &format!("{err}; fallback failed: {fallback_err}"));
                Err(err)
            }
        }
    }
}
