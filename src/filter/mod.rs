//! Ordered byte transforms applied to stream data before it is committed.
//!
//! A pipeline is declared once per document as a [PipelineSpec] and validated when it
//! is built. Every stream then gets its own [FilterChain], so stateful filters
//! (compressors, ciphers) never leak state from one object into the next.

mod arcfour;
mod flate;

pub use arcfour::{object_key, ArcFour};
pub use flate::FlateEncoder;

use crate::{error::ConfigurationError, object::ObjectId};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("compression failed: {0}")]
    Compression(String),

    #[error("filter used after finish")]
    Finished,
}

pub type FilterResult<T> = Result<T, FilterError>;

/// A streaming byte transform. `consume` may buffer internally; whatever is left is
/// returned by `finish`, after which the filter must not be fed again.
pub trait Filter {
    fn consume(&mut self, chunk: &[u8]) -> FilterResult<Vec<u8>>;

    fn finish(&mut self) -> FilterResult<Vec<u8>>;
}

/// The filters a pipeline can be built from
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Identity,
    Flate,
    ArcFour,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Result<FilterKind, ConfigurationError> {
        match name {
            "Identity" => Ok(FilterKind::Identity),
            "Fl" | "FlateDecode" => Ok(FilterKind::Flate),
            "ArcFour" | "RC4" => Ok(FilterKind::ArcFour),
            _ => Err(ConfigurationError::UnsupportedFilter(name.to_string())),
        }
    }

    /// The name written to a stream's `/Filter` entry. Encryption is declared by the
    /// `/Encrypt` dictionary instead, so it has none.
    pub fn decode_name(&self) -> Option<&'static str> {
        match self {
            FilterKind::Flate => Some("FlateDecode"),
            FilterKind::Identity | FilterKind::ArcFour => None,
        }
    }

    fn is_compression(&self) -> bool {
        matches!(self, FilterKind::Flate)
    }
}

/// A live filter instance
pub enum StreamFilter {
    Identity,
    Flate(Box<FlateEncoder>),
    ArcFour(ArcFour),
}

impl Filter for StreamFilter {
    fn consume(&mut self, chunk: &[u8]) -> FilterResult<Vec<u8>> {
        match self {
            StreamFilter::Identity => Ok(chunk.to_vec()),
            StreamFilter::Flate(filter) => filter.consume(chunk),
            StreamFilter::ArcFour(filter) => filter.consume(chunk),
        }
    }

    fn finish(&mut self) -> FilterResult<Vec<u8>> {
        match self {
            StreamFilter::Identity => Ok(Vec::new()),
            StreamFilter::Flate(filter) => filter.finish(),
            StreamFilter::ArcFour(filter) => filter.finish(),
        }
    }
}

/// Filters composed in application order; itself a [Filter]
pub struct FilterChain {
    filters: Vec<StreamFilter>,
    finished: bool,
}

impl FilterChain {
    pub fn new(filters: Vec<StreamFilter>) -> FilterChain {
        FilterChain {
            filters,
            finished: false,
        }
    }

    /// Run a whole buffer through the chain in chunks of `chunk_size`
    pub fn run(mut self, data: &[u8], chunk_size: usize) -> FilterResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks(chunk_size.max(1)) {
            out.extend(self.consume(chunk)?);
        }
        out.extend(self.finish()?);
        Ok(out)
    }
}

impl Filter for FilterChain {
    fn consume(&mut self, chunk: &[u8]) -> FilterResult<Vec<u8>> {
        if self.finished {
            return Err(FilterError::Finished);
        }
        let mut bytes = chunk.to_vec();
        for filter in self.filters.iter_mut() {
            bytes = filter.consume(&bytes)?;
        }
        Ok(bytes)
    }

    fn finish(&mut self) -> FilterResult<Vec<u8>> {
        if self.finished {
            return Err(FilterError::Finished);
        }
        self.finished = true;
        // each filter's tail still has to pass through every filter after it
        let mut carry: Vec<u8> = Vec::new();
        for filter in self.filters.iter_mut() {
            let mut out = if carry.is_empty() {
                Vec::new()
            } else {
                filter.consume(&carry)?
            };
            out.extend(filter.finish()?);
            carry = out;
        }
        Ok(carry)
    }
}

/// A validated, ordered list of filters plus the document key used to derive
/// per-object encryption keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    kinds: Vec<FilterKind>,
    key: Option<Arc<[u8]>>,
}

impl PipelineSpec {
    /// Validate an ordered filter list. Compression may not follow encryption, and
    /// encryption needs a document key.
    pub fn new(kinds: &[FilterKind], key: Option<&[u8]>) -> Result<PipelineSpec, ConfigurationError> {
        let mut encrypted = false;
        for kind in kinds {
            match kind {
                FilterKind::ArcFour => {
                    if key.is_none() {
                        return Err(ConfigurationError::MissingEncryptionKey);
                    }
                    encrypted = true;
                }
                kind if kind.is_compression() && encrypted => {
                    return Err(ConfigurationError::EncryptionBeforeCompression);
                }
                _ => {}
            }
        }

        log::debug!("filter pipeline: {kinds:?}");
        Ok(PipelineSpec {
            kinds: kinds.to_vec(),
            key: key.map(Arc::from),
        })
    }

    /// Like [PipelineSpec::new], from filter names such as `FlateDecode` or `RC4`
    pub fn from_names(names: &[&str], key: Option<&[u8]>) -> Result<PipelineSpec, ConfigurationError> {
        let kinds = names
            .iter()
            .map(|name| FilterKind::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        PipelineSpec::new(&kinds, key)
    }

    pub fn identity() -> PipelineSpec {
        PipelineSpec {
            kinds: Vec::new(),
            key: None,
        }
    }

    pub fn kinds(&self) -> &[FilterKind] {
        &self.kinds
    }

    pub fn is_encrypted(&self) -> bool {
        self.kinds.contains(&FilterKind::ArcFour)
    }

    /// The RC4 key for strings and streams of object `id`, if encryption is active
    pub fn object_key(&self, id: ObjectId) -> Option<Vec<u8>> {
        match (&self.key, self.is_encrypted()) {
            (Some(key), true) => Some(object_key(key, id)),
            _ => None,
        }
    }

    /// Filters that will actually run for a stream, in application order
    pub fn active_kinds(&self, compress: bool) -> impl Iterator<Item = FilterKind> + '_ {
        self.kinds
            .iter()
            .copied()
            .filter(move |kind| compress || !kind.is_compression())
            .filter(|kind| *kind != FilterKind::Identity)
    }

    /// Build the live chain for one stream object
    pub fn chain_for(&self, id: ObjectId, compress: bool) -> FilterChain {
        let filters = self
            .active_kinds(compress)
            .filter_map(|kind| match kind {
                FilterKind::Identity => None,
                FilterKind::Flate => Some(StreamFilter::Flate(Box::new(FlateEncoder::new()))),
                FilterKind::ArcFour => self
                    .key
                    .as_ref()
                    .map(|key| StreamFilter::ArcFour(ArcFour::new(&object_key(key, id)))),
            })
            .collect();
        FilterChain::new(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_before_compression_is_rejected() {
        assert_eq!(
            PipelineSpec::new(&[FilterKind::ArcFour, FilterKind::Flate], Some(b"key")),
            Err(ConfigurationError::EncryptionBeforeCompression)
        );
        assert!(PipelineSpec::new(&[FilterKind::Flate, FilterKind::ArcFour], Some(b"key")).is_ok());
    }

    #[test]
    fn encryption_needs_a_key() {
        assert_eq!(
            PipelineSpec::new(&[FilterKind::Flate, FilterKind::ArcFour], None),
            Err(ConfigurationError::MissingEncryptionKey)
        );
    }

    #[test]
    fn unknown_filter_names_are_rejected() {
        assert_eq!(
            PipelineSpec::from_names(&["FlateDecode", "LZWDecode"], None),
            Err(ConfigurationError::UnsupportedFilter("LZWDecode".into()))
        );
        let spec = PipelineSpec::from_names(&["Fl", "RC4"], Some(b"k")).unwrap();
        assert_eq!(spec.kinds(), &[FilterKind::Flate, FilterKind::ArcFour]);
    }

    #[test]
    fn identity_passes_bytes_through() {
        let chain = PipelineSpec::identity().chain_for(ObjectId::new(1, 0), true);
        assert_eq!(chain.run(b"hello world", 3).unwrap(), b"hello world");
    }

    #[test]
    fn compression_can_be_skipped_per_stream() {
        let spec = PipelineSpec::new(&[FilterKind::Flate], None).unwrap();
        let kinds: Vec<_> = spec.active_kinds(false).collect();
        assert!(kinds.is_empty());
        let raw = spec.chain_for(ObjectId::new(1, 0), false).run(b"abc", 2).unwrap();
        assert_eq!(raw, b"abc");
    }

    #[test]
    fn compress_then_encrypt_round_trips() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let id = ObjectId::new(12, 0);
        let spec =
            PipelineSpec::new(&[FilterKind::Flate, FilterKind::ArcFour], Some(&[1, 2, 3, 4, 5]))
                .unwrap();
        let encoded = spec.chain_for(id, true).run(&data, 777).unwrap();

        let key = spec.object_key(id).unwrap();
        let compressed = ArcFour::new(&key).process(&encoded);
        let decoded = miniz_oxide::inflate::decompress_to_vec_zlib(&compressed).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn chain_refuses_input_after_finish() {
        let mut chain = PipelineSpec::identity().chain_for(ObjectId::new(1, 0), true);
        chain.finish().unwrap();
        assert_eq!(chain.consume(b"late"), Err(FilterError::Finished));
        assert_eq!(chain.finish(), Err(FilterError::Finished));
    }
}
