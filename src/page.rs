use crate::{
    colour::Colour,
    destination::Destination,
    error::PDFError,
    font::FontId,
    image::ImageId,
    object::{Dictionary, Name, ObjectId, PdfString},
    rect::Rect,
    units::Pt,
};
use id_arena::Id;
use std::collections::{BTreeSet, HashMap};

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SpanFont {
    pub id: FontId,
    pub size: Pt,
}

/// A run of text drawn in one font and colour, starting at a baseline position
#[derive(Clone, PartialEq, Debug)]
pub struct SpanLayout {
    pub text: String,
    pub font: SpanFont,
    pub colour: Colour,
    pub coords: (Pt, Pt),
}

#[derive(Clone, PartialEq, Debug)]
pub struct ImageLayout {
    pub image: ImageId,
    pub position: Rect,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PageContents {
    Text(Vec<SpanLayout>),
    Image(ImageLayout),
    /// Content stream operators, written as given between `q` and `Q`
    RawContent(Vec<u8>),
}

/// Where a link goes
#[derive(Clone, PartialEq, Debug)]
pub enum LinkTarget {
    Uri(String),
    Destination(Destination),
}

/// A clickable area, written as a borderless link annotation
#[derive(Clone, PartialEq, Debug)]
pub struct Link {
    pub rect: Rect,
    pub target: LinkTarget,
}

impl Link {
    pub(crate) fn to_dictionary(&self, pages: &HashMap<Id<Page>, ObjectId>) -> Result<Dictionary, PDFError> {
        let mut annot = Dictionary::new()
            .with("Type", Name::from("Annot"))
            .with("Subtype", Name::from("Link"))
            .with("Rect", self.rect)
            .with("Border", vec![0, 0, 0]);
        match &self.target {
            LinkTarget::Uri(uri) => {
                annot.set(
                    "A",
                    Dictionary::new()
                        .with("S", Name::from("URI"))
                        .with("URI", PdfString::literal(uri.as_str())),
                );
            }
            LinkTarget::Destination(dest) => {
                annot.set("Dest", dest.to_object(pages)?);
            }
        }
        Ok(annot)
    }
}

pub struct Page {
    /// The size of the page
    pub media_box: Rect,
    pub contents: Vec<PageContents>,
    pub links: Vec<Link>,
}

impl Page {
    pub fn new<P: Into<Pt>>(width: P, height: P) -> Page {
        Page {
            media_box: Rect::from_size(width.into(), height.into()),
            contents: Vec::default(),
            links: Vec::default(),
        }
    }

    pub fn add_span(&mut self, span: SpanLayout) {
        self.contents.push(PageContents::Text(vec![span]));
    }

    pub fn add_spans(&mut self, spans: Vec<SpanLayout>) {
        self.contents.push(PageContents::Text(spans));
    }

    pub fn add_image(&mut self, image: ImageLayout) {
        self.contents.push(PageContents::Image(image));
    }

    pub fn add_raw<B: Into<Vec<u8>>>(&mut self, content: B) {
        self.contents.push(PageContents::RawContent(content.into()));
    }

    /// Make `rect` a link to a view of a page of the same document
    pub fn add_intradocument_link(&mut self, rect: Rect, destination: Destination) {
        self.links.push(Link {
            rect,
            target: LinkTarget::Destination(destination),
        });
    }

    pub fn add_uri_link<S: Into<String>>(&mut self, rect: Rect, uri: S) {
        self.links.push(Link {
            rect,
            target: LinkTarget::Uri(uri.into()),
        });
    }

    /// True when nothing has been placed on the page
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.links.is_empty()
    }

    /// Fonts used by the page's text, in index order
    pub fn fonts(&self) -> BTreeSet<usize> {
        self.spans().map(|span| span.font.id.index()).collect()
    }

    pub fn images(&self) -> BTreeSet<usize> {
        self.contents
            .iter()
            .filter_map(|content| match content {
                PageContents::Image(layout) => Some(layout.image.index()),
                _ => None,
            })
            .collect()
    }

    /// Colour profiles named by ICC coloured text
    pub fn profiles(&self) -> BTreeSet<usize> {
        self.spans()
            .filter_map(|span| span.colour.profile())
            .map(|profile| profile.index())
            .collect()
    }

    fn spans(&self) -> impl Iterator<Item = &SpanLayout> + '_ {
        self.contents
            .iter()
            .filter_map(|content| match content {
                PageContents::Text(spans) => Some(spans.iter()),
                _ => None,
            })
            .flatten()
    }
}
