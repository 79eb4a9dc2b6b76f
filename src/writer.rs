//! Serializes indirect objects to a [ByteSink] and finishes the file with the
//! cross-reference table and trailer.

use crate::{
    error::{PDFError, SerializationError},
    filter::{FilterKind, PipelineSpec},
    object::{Dictionary, Name, Object, ObjectId, Payload, PdfString, Stream},
    sink::ByteSink,
    xref::CrossReferenceTable,
};

/// Stream data is fed to the filter pipeline in pieces of this size
const CHUNK_SIZE: usize = 16 * 1024;

/// What the trailer points at
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    pub root: ObjectId,
    pub info: Option<ObjectId>,
    pub encrypt: Option<ObjectId>,
    pub file_id: Vec<u8>,
}

/// Writes objects in commit order and remembers where each one starts. Ids are handed
/// out by [ObjectWriter::allocate_id]; an object may reference any allocated id, even
/// one that has not been committed yet.
pub struct ObjectWriter<S: ByteSink> {
    sink: S,
    xref: CrossReferenceTable,
    pipeline: PipelineSpec,
    unencrypted: Option<ObjectId>,
    finalized: bool,
}

impl<S: ByteSink> ObjectWriter<S> {
    /// Start a document: writes the header for PDF `1.{version}`
    pub fn new(mut sink: S, version: u8, pipeline: PipelineSpec) -> Result<ObjectWriter<S>, PDFError> {
        sink.write_all(format!("%PDF-1.{version}\n").as_bytes())?;
        // a comment of high bytes marks the file as binary for transfer tools
        sink.write_all(&[b'%', 0xD8, 0xE5, 0xE5, 0xD8, b'\n'])?;
        Ok(ObjectWriter {
            sink,
            xref: CrossReferenceTable::new(),
            pipeline,
            unencrypted: None,
            finalized: false,
        })
    }

    pub fn allocate_id(&mut self) -> ObjectId {
        self.xref.allocate()
    }

    /// Exempt one object (the encryption dictionary) from encryption
    pub fn set_unencrypted(&mut self, id: ObjectId) {
        self.unencrypted = Some(id);
    }

    /// Take an allocated or committed id out of use; the number goes back on the free
    /// list with the next generation
    pub fn free(&mut self, id: ObjectId) -> Result<(), PDFError> {
        if self.finalized {
            return Err(SerializationError::Finalized.into());
        }
        self.xref.free(id)?;
        log::trace!("freed object {id}");
        Ok(())
    }

    /// Serialize `payload` as object `id`. Streams are run through the pipeline first,
    /// so `/Length` is the filtered size.
    pub fn commit<P: Into<Payload>>(&mut self, id: ObjectId, payload: P) -> Result<(), PDFError> {
        if self.finalized {
            return Err(SerializationError::Finalized.into());
        }
        let payload = payload.into();
        self.xref.check_live(id)?;
        if self.xref.offset_of(id).is_some() {
            return Err(SerializationError::DoubleCommit(id).into());
        }
        for reference in payload.references() {
            self.xref.check_live(reference)?;
        }

        let key = match self.unencrypted {
            Some(exempt) if exempt == id => None,
            _ => self.pipeline.object_key(id),
        };

        let mut bytes = format!("{id} obj\n").into_bytes();
        match payload {
            Payload::Object(object) => object.write(&mut bytes, key.as_deref()),
            Payload::Stream(stream) => self.write_stream(&mut bytes, id, stream, key.as_deref())?,
        }
        bytes.extend_from_slice(b"\nendobj\n");

        let offset = self.sink.position();
        self.sink.write_all(&bytes)?;
        self.xref.record(id, offset)?;
        log::trace!("committed object {id} at {offset}, {} bytes", bytes.len());
        Ok(())
    }

    fn write_stream(&self, out: &mut Vec<u8>, id: ObjectId, stream: Stream, key: Option<&[u8]>) -> Result<(), PDFError> {
        let Stream {
            mut dict,
            data,
            encoded_with,
            compress,
        } = stream;

        let chain = if key.is_none() && self.pipeline.is_encrypted() {
            // exempt object in an encrypted document: compression only
            let kinds: Vec<FilterKind> = self
                .pipeline
                .kinds()
                .iter()
                .copied()
                .filter(|kind| *kind != FilterKind::ArcFour)
                .collect();
            PipelineSpec::new(&kinds, None)?.chain_for(id, compress)
        } else {
            self.pipeline.chain_for(id, compress)
        };
        let data = chain.run(&data, CHUNK_SIZE).map_err(SerializationError::from)?;

        // readers undo filters in the listed order, so the last one applied comes first
        let mut filters: Vec<Name> = self
            .pipeline
            .active_kinds(compress)
            .filter_map(|kind| kind.decode_name())
            .map(Name::from)
            .collect();
        filters.reverse();
        filters.extend(encoded_with.into_iter().rev());

        dict.set("Length", data.len());
        match filters.len() {
            0 => {
                dict.remove("Filter");
            }
            1 => {
                dict.set("Filter", filters.remove(0));
            }
            _ => {
                dict.set("Filter", filters);
            }
        }

        dict.write(out, key);
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&data);
        out.extend_from_slice(b"\nendstream");
        Ok(())
    }

    /// Write the cross-reference table and trailer. Can only happen once, and only
    /// when every allocated id has been committed or freed.
    pub fn finalize(&mut self, trailer: &Trailer) -> Result<(), PDFError> {
        if self.finalized {
            return Err(SerializationError::Finalized.into());
        }
        self.xref.check_live(trailer.root)?;
        for id in trailer.info.iter().chain(trailer.encrypt.iter()) {
            self.xref.check_live(*id)?;
        }
        let entries = self.xref.entries()?;

        let startxref = self.sink.position();
        let mut out = format!("xref\n0 {}\n", entries.len()).into_bytes();
        for entry in entries.iter() {
            out.extend_from_slice(entry.to_string().as_bytes());
        }

        let mut dict = Dictionary::new()
            .with("Size", self.xref.size())
            .with("Root", trailer.root);
        if let Some(info) = trailer.info {
            dict.set("Info", info);
        }
        if let Some(encrypt) = trailer.encrypt {
            dict.set("Encrypt", encrypt);
        }
        let id = PdfString::hex(trailer.file_id.clone());
        dict.set("ID", vec![Object::String(id.clone()), Object::String(id)]);

        out.extend_from_slice(b"trailer\n");
        dict.write(&mut out, None);
        out.extend_from_slice(format!("\nstartxref\n{startxref}\n%%EOF\n").as_bytes());

        self.sink.write_all(&out)?;
        self.sink.flush()?;
        self.finalized = true;
        log::debug!(
            "finalized document: {} objects, xref at {startxref}",
            self.xref.committed_count()
        );
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn committed_count(&self) -> usize {
        self.xref.committed_count()
    }

    pub fn offset_of(&self, id: ObjectId) -> Option<u64> {
        self.xref.offset_of(id)
    }

    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
