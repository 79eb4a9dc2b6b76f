use crate::error::ConfigurationError;
use ordered_float::OrderedFloat;
use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

/// The families of the 14 standard Type 1 fonts every reader provides
pub const STANDARD_FAMILIES: [&str; 5] = ["Courier", "Helvetica", "Times-Roman", "Symbol", "ZapfDingbats"];

/// Where a font program comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontSource {
    /// One of the standard 14 fonts, by family
    Standard(String),
    /// A face looked up by name through the font loader
    Name(String),
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Standard(name) | FontSource::Name(name) => f.write_str(name),
            FontSource::File(path) => write!(f, "{}", path.display()),
            FontSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Identity of a loaded typeface: one font program in one style. Fonts that differ
/// only in size share a typeface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypefaceSpec {
    pub source: FontSource,
    pub bold: bool,
    pub italic: bool,
}

/// A request for a font, usually written as a string such as
/// `standard;name=Helvetica;size=12` or `file=/fonts/a.ttf;size=10;bold`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub source: FontSource,
    pub size: OrderedFloat<f32>,
    pub encoding: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

/// Split a standard font name into its family and style, accepting the variant names
/// (`Helvetica-BoldOblique`, `Times-Italic`) as well as the bare family
fn standard_family(name: &str) -> Option<(&'static str, bool, bool)> {
    let (family, style) = match name.split_once('-') {
        Some((family, style)) => (family, style),
        None => (name, ""),
    };
    let family = match family {
        "Courier" => "Courier",
        "Helvetica" | "Arial" => "Helvetica",
        "Times" => "Times-Roman",
        "Symbol" => "Symbol",
        "ZapfDingbats" => "ZapfDingbats",
        _ => return None,
    };
    let (bold, italic) = match style {
        "" | "Roman" => (false, false),
        "Bold" => (true, false),
        "Oblique" | "Italic" => (false, true),
        "BoldOblique" | "BoldItalic" => (true, true),
        _ => return None,
    };
    Some((family, bold, italic))
}

impl FontSpec {
    pub fn standard(name: &str, size: f32) -> Result<FontSpec, ConfigurationError> {
        format!("standard;name={name};size={size}").parse()
    }

    pub fn from_file<P: Into<PathBuf>>(path: P, size: f32) -> FontSpec {
        FontSpec {
            source: FontSource::File(path.into()),
            size: OrderedFloat(size),
            encoding: None,
            bold: false,
            italic: false,
        }
    }

    pub fn from_bytes(bytes: Arc<[u8]>, size: f32) -> FontSpec {
        FontSpec {
            source: FontSource::Bytes(bytes),
            size: OrderedFloat(size),
            encoding: None,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self, bold: bool) -> FontSpec {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> FontSpec {
        self.italic = italic;
        self
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.source, FontSource::Standard(_))
    }

    pub fn typeface_spec(&self) -> TypefaceSpec {
        TypefaceSpec {
            source: self.source.clone(),
            bold: self.bold,
            italic: self.italic,
        }
    }
}

impl FromStr for FontSpec {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &'static str| ConfigurationError::FontSpec {
            spec: s.to_string(),
            reason,
        };

        let mut name: Option<&str> = None;
        let mut file: Option<&str> = None;
        let mut size: f32 = 12.0;
        let mut encoding = None;
        let (mut bold, mut italic, mut standard) = (false, false, false);

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some(("name", value)) => name = Some(value.trim()),
                Some(("file", value)) => file = Some(value.trim()),
                Some(("enc", value)) => encoding = Some(value.trim().to_string()),
                Some(("size", value)) => {
                    size = value.trim().parse().map_err(|_| fail("size is not a number"))?;
                }
                Some(_) => return Err(fail("unknown keyword")),
                None => match part {
                    "bold" => bold = true,
                    "italic" => italic = true,
                    "standard" => standard = true,
                    _ => return Err(fail("unknown flag")),
                },
            }
        }

        if !(size > 0.0 && size.is_finite()) {
            return Err(fail("size must be positive"));
        }

        let source = match (name, file) {
            (Some(_), Some(_)) => return Err(fail("name and file are mutually exclusive")),
            (None, None) => return Err(fail("either name or file is required")),
            (None, Some(_)) if standard => return Err(fail("standard fonts are given by name")),
            (None, Some(file)) => FontSource::File(PathBuf::from(file)),
            (Some(name), None) => match standard_family(name) {
                Some((family, b, i)) => {
                    bold |= b;
                    italic |= i;
                    FontSource::Standard(family.to_string())
                }
                None if standard => return Err(fail("not one of the standard 14 fonts")),
                None => FontSource::Name(name.to_string()),
            },
        };

        Ok(FontSpec {
            source,
            size: OrderedFloat(size),
            encoding,
            bold,
            italic,
        })
    }
}
