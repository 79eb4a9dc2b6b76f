//! Document options and the execution context that carries them.

use crate::{
    encoding::TextEncoding,
    error::ConfigurationError,
    message::{codes, LogSink, MessageSink, Severity},
    resources::fontspec::FontSpec,
    security::Permissions,
};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::{fmt, str::FromStr, sync::Arc};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Kind {
    Int { min: i64, max: i64 },
    Bool,
    Text,
    Choice(&'static [&'static str]),
    /// A text encoding name, or empty for the locale
    Encoding,
    /// A font spec string; `optional` admits the empty value
    Font { optional: bool },
    Permissions,
}

impl Kind {
    fn check(self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        let valid = match self {
            Kind::Int { min, max } => value
                .parse::<i64>()
                .map(|v| (min..=max).contains(&v))
                .unwrap_or(false),
            Kind::Bool => parse_bool(value).is_some(),
            Kind::Text => true,
            Kind::Choice(choices) => choices.contains(&value),
            Kind::Encoding => {
                if !value.is_empty() {
                    TextEncoding::from_name(value)?;
                }
                true
            }
            Kind::Font { optional } => {
                if !(optional && value.is_empty()) {
                    let spec: FontSpec = value.parse()?;
                    if let Some(encoding) = &spec.encoding {
                        TextEncoding::from_name(encoding)?;
                    }
                }
                true
            }
            Kind::Permissions => {
                Permissions::parse(value)?;
                true
            }
        };
        if valid {
            Ok(())
        } else {
            Err(invalid(name, value))
        }
    }
}

struct OptionDef {
    name: &'static str,
    default: &'static str,
    kind: Kind,
}

const fn opt(name: &'static str, default: &'static str, kind: Kind) -> OptionDef {
    OptionDef {
        name,
        default,
        kind,
    }
}

const PAGE_LAYOUTS: &[&str] = &[
    "",
    "SinglePage",
    "OneColumn",
    "TwoColumnLeft",
    "TwoColumnRight",
    "TwoPageLeft",
    "TwoPageRight",
];
const PAGE_MODES: &[&str] = &["", "UseNone", "UseOutlines", "UseThumbs", "FullScreen"];

const OPTIONS: &[OptionDef] = &[
    opt("doc.version", "5", Kind::Int { min: 2, max: 7 }),
    opt("doc.encryption", "", Kind::Choice(&["", "standard"])),
    opt("doc.static_file_id", "0", Kind::Bool),
    opt("doc.compressed", "1", Kind::Bool),
    opt("doc.strict_mode", "1", Kind::Bool),
    opt("doc.page_layout", "", Kind::Choice(PAGE_LAYOUTS)),
    opt("doc.page_mode", "", Kind::Choice(PAGE_MODES)),
    opt("text.encoding", "", Kind::Encoding),
    opt("fonts.synthesized", "1", Kind::Bool),
    opt("fonts.fallback", "", Kind::Font { optional: true }),
    opt("fonts.default", "standard;name=Helvetica;size=12", Kind::Font { optional: false }),
    opt("images.interpolated", "0", Kind::Bool),
    opt("info.title", "", Kind::Text),
    opt("info.author", "", Kind::Text),
    opt("info.subject", "", Kind::Text),
    opt("info.keywords", "", Kind::Text),
    opt("info.creator", "", Kind::Text),
    opt("info.creation_date", "1", Kind::Bool),
    opt("info.static_producer", "0", Kind::Bool),
    opt("stdsh.pwd_owner", "", Kind::Text),
    opt("stdsh.pwd_user", "", Kind::Text),
    opt("stdsh.permissions", "", Kind::Permissions),
];

fn definition(name: &str) -> Result<&'static OptionDef, ConfigurationError> {
    OPTIONS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| ConfigurationError::UnknownOption(name.to_string()))
}

fn invalid(name: &str, value: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// The full set of recognized options, each holding its default until set. Unknown
/// option names are always rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    values: IndexMap<&'static str, String>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            values: OPTIONS
                .iter()
                .map(|def| (def.name, def.default.to_string()))
                .collect(),
        }
    }
}

impl Profile {
    pub fn new() -> Profile {
        Profile::default()
    }

    /// Set an option. The value is checked against the option's type before anything
    /// is changed.
    pub fn set<V: AsRef<str>>(&mut self, name: &str, value: V) -> Result<&mut Self, ConfigurationError> {
        let def = definition(name)?;
        let value = value.as_ref().trim();
        def.kind.check(name, value)?;
        self.values.insert(def.name, value.to_string());
        Ok(self)
    }

    /// Builder-style variant of [Profile::set]
    pub fn with<V: AsRef<str>>(mut self, name: &str, value: V) -> Result<Self, ConfigurationError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&str, ConfigurationError> {
        let def = definition(name)?;
        Ok(self.values.get(def.name).map(String::as_str).unwrap_or(def.default))
    }

    pub fn get_int(&self, name: &str) -> Result<i64, ConfigurationError> {
        let value = self.get(name)?;
        value.parse().map_err(|_| invalid(name, value))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ConfigurationError> {
        let value = self.get(name)?;
        parse_bool(value).ok_or_else(|| invalid(name, value))
    }

    /// The minor PDF version, `5` for PDF 1.5
    pub fn version(&self) -> u8 {
        self.get_int("doc.version").map(|v| v as u8).unwrap_or(5)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.values.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // keep passwords out of debug output
        let mut map = f.debug_map();
        for (name, value) in self.iter() {
            if name.starts_with("stdsh.pwd") && !value.is_empty() {
                map.entry(&name, &"***");
            } else {
                map.entry(&name, &value);
            }
        }
        map.finish()
    }
}

/// Parses `name = value` lines; blank lines and `#` comments are skipped
impl FromStr for Profile {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut profile = Profile::new();
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, value) = line.split_once('=').ok_or_else(|| invalid(line, ""))?;
            profile.set(name.trim(), value.trim())?;
        }
        Ok(profile)
    }
}

/// Everything a document consults while it is built: the options, where diagnostics
/// go, and the default text encoding.
pub struct ExecContext {
    profile: Profile,
    sink: Arc<dyn MessageSink>,
    text_encoding: OnceCell<TextEncoding>,
}

impl ExecContext {
    pub fn new(profile: Profile) -> ExecContext {
        ExecContext::with_sink(profile, Arc::new(LogSink))
    }

    pub fn with_sink(profile: Profile, sink: Arc<dyn MessageSink>) -> ExecContext {
        ExecContext {
            profile,
            sink,
            text_encoding: OnceCell::new(),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn version(&self) -> u8 {
        self.profile.version()
    }

    pub fn message(&self, code: u32, severity: Severity, text: &str) {
        self.sink.message(code, severity, text);
    }

    pub fn warn(&self, code: u32, text: &str) {
        self.message(code, Severity::Warning, text);
    }

    /// The encoding assumed for byte text. Resolved on first use from `text.encoding`,
    /// then the locale environment, then UTF-8; fixed from then on.
    pub fn default_text_encoding(&self) -> TextEncoding {
        *self.text_encoding.get_or_init(|| {
            // `text.encoding` is checked when set, so only the empty value falls through
            let configured = self.profile.get("text.encoding").unwrap_or("");
            TextEncoding::from_name(configured)
                .ok()
                .or_else(locale_encoding)
                .unwrap_or(TextEncoding::Utf8)
        })
    }

    /// Fix the default text encoding before anything has asked for it
    pub fn bind_default_text_encoding(&self, encoding: TextEncoding) -> Result<(), ConfigurationError> {
        self.text_encoding
            .set(encoding)
            .map_err(|_| ConfigurationError::TextEncodingResolved(format!("{:?}", self.default_text_encoding())))
    }

    /// Check that a feature fits the configured version. In strict mode a miss is an
    /// error; otherwise it is reported and `false` tells the caller to leave the
    /// feature out.
    pub fn ensure_version(&self, feature: &'static str, required: u8) -> Result<bool, ConfigurationError> {
        let configured = self.version();
        if configured >= required {
            return Ok(true);
        }
        if self.profile.get_bool("doc.strict_mode")? {
            return Err(ConfigurationError::VersionTooLow {
                feature,
                required,
                configured,
            });
        }
        self.warn(
            codes::VERSION_TOO_LOW,
            &format!("{feature} needs PDF 1.{required}, omitted from a PDF 1.{configured} document"),
        );
        Ok(false)
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        ExecContext::new(Profile::default())
    }
}

fn locale_encoding() -> Option<TextEncoding> {
    let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())?;
    let codeset = locale.split('.').nth(1)?;
    let codeset = codeset.split('@').next().unwrap_or(codeset);
    TextEncoding::from_name(codeset).ok()
}
