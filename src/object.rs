//! The in-memory object model that the [ObjectWriter](crate::ObjectWriter) serializes.

use crate::filter::ArcFour;
use indexmap::IndexMap;
use std::fmt;

/// The identity of an indirect object: its object number and generation
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub number: u32,
    pub generation: u16,
}

impl ObjectId {
    pub const fn new(number: u32, generation: u16) -> ObjectId {
        ObjectId { number, generation }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.generation)
    }
}

/// A PDF name, stored without the leading solidus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(pub Vec<u8>);

impl Name {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.as_bytes().to_vec())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name(s.into_bytes())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hex,
}

/// A PDF string. Strings are encrypted along with the object that contains them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    pub bytes: Vec<u8>,
    pub format: StringFormat,
}

impl PdfString {
    pub fn literal<B: Into<Vec<u8>>>(bytes: B) -> PdfString {
        PdfString {
            bytes: bytes.into(),
            format: StringFormat::Literal,
        }
    }

    pub fn hex<B: Into<Vec<u8>>>(bytes: B) -> PdfString {
        PdfString {
            bytes: bytes.into(),
            format: StringFormat::Hex,
        }
    }

    /// A text string: printable ASCII is kept as is, anything else becomes UTF-16BE
    /// with a byte order mark
    pub fn text(s: &str) -> PdfString {
        if s.bytes().all(|b| (0x20..0x7f).contains(&b)) {
            return PdfString::literal(s);
        }
        let mut bytes = vec![0xfe, 0xff];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        PdfString::hex(bytes)
    }
}

/// A direct object
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Name),
    String(PdfString),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Reference(ObjectId),
}

impl Object {
    pub fn name(name: &str) -> Object {
        Object::Name(Name::from(name))
    }

    /// Every indirect reference reachable from this object
    pub(crate) fn collect_references(&self, out: &mut Vec<ObjectId>) {
        match self {
            Object::Reference(id) => out.push(*id),
            Object::Array(items) => items.iter().for_each(|item| item.collect_references(out)),
            Object::Dictionary(dict) => dict.collect_references(out),
            _ => {}
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>, key: Option<&[u8]>) {
        match self {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => write_real(out, *r),
            Object::Name(name) => write_name(out, name),
            Object::String(s) => write_string(out, s, key),
            Object::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write(out, key);
                }
                out.push(b']');
            }
            Object::Dictionary(dict) => dict.write(out, key),
            Object::Reference(id) => out.extend_from_slice(format!("{id} R").as_bytes()),
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Bool(b)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<u32> for Object {
    fn from(i: u32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<usize> for Object {
    fn from(i: usize) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<f32> for Object {
    fn from(r: f32) -> Self {
        Object::Real(r)
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Object::Name(n)
    }
}

impl From<PdfString> for Object {
    fn from(s: PdfString) -> Self {
        Object::String(s)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl<T: Into<Object>> From<Vec<T>> for Object {
    fn from(items: Vec<T>) -> Self {
        Object::Array(items.into_iter().map(Into::into).collect())
    }
}

/// A dictionary that keeps its keys in insertion order, so output is stable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Name, Object>);

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }

    /// Set a key, replacing any previous value
    pub fn set<K: Into<Name>, V: Into<Object>>(&mut self, key: K, value: V) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [Dictionary::set]
    pub fn with<K: Into<Name>, V: Into<Object>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(&Name::from(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.0.shift_remove(&Name::from(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Name, Object> {
        self.0.iter()
    }

    pub(crate) fn collect_references(&self, out: &mut Vec<ObjectId>) {
        for value in self.0.values() {
            value.collect_references(out);
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>, key: Option<&[u8]>) {
        out.extend_from_slice(b"<<");
        for (name, value) in self.0.iter() {
            out.push(b' ');
            write_name(out, name);
            out.push(b' ');
            value.write(out, key);
        }
        out.extend_from_slice(b" >>");
    }
}

/// The body of a stream object. `data` is fed through the document's filter pipeline
/// when the stream is committed; `encoded_with` names filters that were already applied
/// to `data` before it reached the writer (for example `DCTDecode` for JPEG images).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub data: Vec<u8>,
    pub encoded_with: Vec<Name>,
    /// Whether the pipeline's compression stage applies to this stream
    pub compress: bool,
}

impl Stream {
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Stream {
        Stream {
            dict,
            data,
            encoded_with: Vec::new(),
            compress: true,
        }
    }

    /// Mark `data` as already encoded with `filter`; compression is skipped
    pub fn pre_encoded<N: Into<Name>>(mut self, filter: N) -> Stream {
        self.encoded_with.push(filter.into());
        self.compress = false;
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Dictionary,
    Array,
    Stream,
    Reference,
    Other,
}

/// What gets committed under an object id
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Object(Object),
    Stream(Stream),
}

impl Payload {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Payload::Stream(_) => ObjectKind::Stream,
            Payload::Object(Object::Dictionary(_)) => ObjectKind::Dictionary,
            Payload::Object(Object::Array(_)) => ObjectKind::Array,
            Payload::Object(Object::Reference(_)) => ObjectKind::Reference,
            Payload::Object(_) => ObjectKind::Other,
        }
    }

    pub(crate) fn references(&self) -> Vec<ObjectId> {
        let mut refs = Vec::new();
        match self {
            Payload::Object(object) => object.collect_references(&mut refs),
            Payload::Stream(stream) => stream.dict.collect_references(&mut refs),
        }
        refs
    }
}

impl From<Object> for Payload {
    fn from(o: Object) -> Self {
        Payload::Object(o)
    }
}

impl From<Dictionary> for Payload {
    fn from(d: Dictionary) -> Self {
        Payload::Object(Object::Dictionary(d))
    }
}

impl From<Stream> for Payload {
    fn from(s: Stream) -> Self {
        Payload::Stream(s)
    }
}

fn write_real(out: &mut Vec<u8>, r: f32) {
    if !r.is_finite() {
        out.push(b'0');
        return;
    }
    let s = format!("{r:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => out.push(b'0'),
        s => out.extend_from_slice(s.as_bytes()),
    }
}

fn write_name(out: &mut Vec<u8>, name: &Name) {
    out.push(b'/');
    for &b in name.as_bytes() {
        let delimiter = matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        );
        if !(0x21..=0x7e).contains(&b) || delimiter {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        } else {
            out.push(b);
        }
    }
}

fn write_string(out: &mut Vec<u8>, s: &PdfString, key: Option<&[u8]>) {
    match key {
        Some(key) => {
            // encrypted strings are binary, so always hex
            let encrypted = ArcFour::new(key).process(&s.bytes);
            write_hex(out, &encrypted);
        }
        None if s.format == StringFormat::Hex => write_hex(out, &s.bytes),
        None => {
            out.push(b'(');
            for &b in s.bytes.iter() {
                match b {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(b);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    0x20..=0x7e => out.push(b),
                    _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
                }
            }
            out.push(b')');
        }
    }
}

fn write_hex(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'<');
    for b in bytes {
        out.extend_from_slice(format!("{b:02X}").as_bytes());
    }
    out.push(b'>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(object: &Object) -> String {
        let mut out = Vec::new();
        object.write(&mut out, None);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn reals_are_trimmed() {
        assert_eq!(render(&Object::Real(12.0)), "12");
        assert_eq!(render(&Object::Real(0.5)), "0.5");
        assert_eq!(render(&Object::Real(-3.25)), "-3.25");
        assert_eq!(render(&Object::Real(-0.00001)), "0");
        assert_eq!(render(&Object::Real(f32::NAN)), "0");
    }

    #[test]
    fn names_escape_delimiters() {
        assert_eq!(render(&Object::name("Type")), "/Type");
        assert_eq!(render(&Object::name("A B")), "/A#20B");
        assert_eq!(render(&Object::name("x/y#")), "/x#2Fy#23");
    }

    #[test]
    fn literal_strings_escape() {
        let s = Object::String(PdfString::literal("a(b)\\c\n\x01"));
        assert_eq!(render(&s), "(a\\(b\\)\\\\c\\n\\001)");
    }

    #[test]
    fn text_strings_use_utf16_when_needed() {
        assert_eq!(PdfString::text("plain").format, StringFormat::Literal);
        let s = PdfString::text("é");
        assert_eq!(s.bytes, vec![0xfe, 0xff, 0x00, 0xe9]);
        assert_eq!(render(&Object::String(s)), "<FEFF00E9>");
    }

    #[test]
    fn dictionaries_keep_insertion_order() {
        let dict = Dictionary::new()
            .with("Type", Name::from("Page"))
            .with("Parent", ObjectId::new(2, 0))
            .with("Kids", vec![ObjectId::new(3, 0), ObjectId::new(4, 1)]);
        assert_eq!(
            render(&Object::Dictionary(dict)),
            "<< /Type /Page /Parent 2 0 R /Kids [3 0 R 4 1 R] >>"
        );
    }

    #[test]
    fn encrypted_strings_are_hex() {
        let mut out = Vec::new();
        Object::String(PdfString::literal("Plaintext")).write(&mut out, Some(b"Key"));
        assert_eq!(out, b"<BBF316E8D940AF0AD3>");
    }

    #[test]
    fn references_are_collected_recursively() {
        let dict = Dictionary::new()
            .with("A", ObjectId::new(7, 0))
            .with("B", vec![Object::from(ObjectId::new(8, 0)), Object::Null])
            .with("C", Dictionary::new().with("D", ObjectId::new(9, 2)));
        let payload = Payload::from(dict);
        assert_eq!(payload.kind(), ObjectKind::Dictionary);
        assert_eq!(
            payload.references(),
            vec![ObjectId::new(7, 0), ObjectId::new(8, 0), ObjectId::new(9, 2)]
        );
    }
}
