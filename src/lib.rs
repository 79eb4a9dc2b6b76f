mod colour;
pub use colour::*;

mod destination;
pub use destination::*;

mod document;
pub use document::*;

mod font;
pub use font::*;

mod image;
pub use self::image::*;

mod info;
pub use info::*;

mod outline;
pub use outline::*;

mod page;
pub use page::*;

mod rect;
pub use rect::*;

mod units;
pub use units::*;

mod error;
pub use error::*;

mod content;

/// Options, and the execution context documents are built in
pub mod config;
pub use config::{ExecContext, Profile};

/// Byte text decoding
pub mod encoding;

/// Stream filters: Flate compression and RC4 encryption
pub mod filter;

/// Diagnostics that do not stop a document from being written
pub mod message;

/// PDF objects as they are committed to a writer
pub mod object;

/// Fonts, images and colour profiles shared between documents
pub mod resources;

pub mod security;

pub mod sink;

/// The low level object writer, usable without a [Document]
pub mod writer;
pub use writer::{ObjectWriter, Trailer};

mod xref;
