use crate::{
    config::Profile,
    error::ConfigurationError,
    object::{Dictionary, PdfString},
};
use chrono::{DateTime, Local, Offset, TimeZone};

const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// General document metadata such as title, author, etc
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Info {
    pub title: Option<String>,
    /// The author(s) of the document. No prescribed format.
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Keywords for the document. No prescribed format, though Adobe Acrobat suggests
    /// using a comma separated list of keywords
    pub keywords: Option<String>,
    /// The application that created the original content
    pub creator: Option<String>,
    /// Whether to write `/CreationDate`
    pub creation_date: bool,
    /// Write `/Producer` without a version, for reproducible output
    pub static_producer: bool,
}

fn non_empty(profile: &Profile, name: &str) -> Result<Option<String>, ConfigurationError> {
    let value = profile.get(name)?;
    Ok((!value.is_empty()).then(|| value.to_string()))
}

impl Info {
    pub fn new() -> Info {
        Info {
            creation_date: true,
            ..Info::default()
        }
    }

    /// Metadata as given by the `info.*` options
    pub fn from_profile(profile: &Profile) -> Result<Info, ConfigurationError> {
        Ok(Info {
            title: non_empty(profile, "info.title")?,
            author: non_empty(profile, "info.author")?,
            subject: non_empty(profile, "info.subject")?,
            keywords: non_empty(profile, "info.keywords")?,
            creator: non_empty(profile, "info.creator")?,
            creation_date: profile.get_bool("info.creation_date")?,
            static_producer: profile.get_bool("info.static_producer")?,
        })
    }

    pub fn title<S: ToString>(&mut self, title: S) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author<S: ToString>(&mut self, author: S) -> &mut Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn subject<S: ToString>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn keywords<S: ToString>(&mut self, keywords: S) -> &mut Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    pub fn creator<S: ToString>(&mut self, creator: S) -> &mut Self {
        self.creator = Some(creator.to_string());
        self
    }

    pub(crate) fn to_dictionary(&self) -> Dictionary {
        let mut info = Dictionary::new();
        for (key, value) in [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
        ] {
            if let Some(value) = value {
                info.set(key, PdfString::text(value));
            }
        }
        let producer = if self.static_producer {
            env!("CARGO_PKG_NAME")
        } else {
            PRODUCER
        };
        info.set("Producer", PdfString::text(producer));
        if self.creation_date {
            info.set("CreationDate", PdfString::literal(pdf_date(&Local::now())));
        }
        info
    }
}

/// `D:YYYYMMDDHHmmSSOHH'mm'`
fn pdf_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let offset = date.offset().fix().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{sign}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        offset / 3600,
        (offset % 3600) / 60
    )
}
