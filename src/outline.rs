use crate::{
    destination::Destination,
    error::PDFError,
    object::{Dictionary, Name, ObjectId, PdfString},
    page::Page,
    sink::ByteSink,
    writer::ObjectWriter,
};
use id_arena::Id;
use std::collections::HashMap;

/// A bookmark in the document outline
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BookmarkId(usize);

impl BookmarkId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How a viewer draws a bookmark's title
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BookmarkStyle {
    pub colour: Option<(f32, f32, f32)>,
    pub bold: bool,
    pub italic: bool,
}

impl BookmarkStyle {
    fn flags(&self) -> i64 {
        (self.italic as i64) | ((self.bold as i64) << 1)
    }
}

#[derive(Debug)]
pub struct OutlineEntry {
    pub title: String,
    pub destination: Destination,
    pub style: BookmarkStyle,
    parent: Option<BookmarkId>,
    children: Vec<BookmarkId>,
}

impl OutlineEntry {
    pub fn parent(&self) -> Option<BookmarkId> {
        self.parent
    }

    pub fn children(&self) -> &[BookmarkId] {
        &self.children
    }
}

/// The bookmark tree. Every bookmark with children starts out closed.
#[derive(Default, Debug)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
    roots: Vec<BookmarkId>,
}

impl Outline {
    /// Add a bookmark as the last child of `parent`, or at the top level when there is no
    /// parent (or no bookmark identified by `parent`)
    pub fn add_bookmark(&mut self, parent: Option<BookmarkId>, title: String, destination: Destination) -> BookmarkId {
        let id = BookmarkId(self.entries.len());
        let parent = parent.filter(|p| p.0 < self.entries.len());
        match parent {
            Some(parent) => self.entries[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.entries.push(OutlineEntry {
            title,
            destination,
            style: BookmarkStyle::default(),
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: BookmarkId) -> Option<&OutlineEntry> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: BookmarkId) -> Option<&mut OutlineEntry> {
        self.entries.get_mut(id.0)
    }

    /// Top level bookmarks in order
    pub fn roots(&self) -> &[BookmarkId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commit the outline dictionary and one object per bookmark, returning the
    /// dictionary's id for the catalog's `/Outlines`
    pub(crate) fn write<S: ByteSink>(
        &self,
        writer: &mut ObjectWriter<S>,
        pages: &HashMap<Id<Page>, ObjectId>,
    ) -> Result<Option<ObjectId>, PDFError> {
        let (first, last) = match (self.roots.first(), self.roots.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(None),
        };

        let root_id = writer.allocate_id();
        let ids: Vec<ObjectId> = self.entries.iter().map(|_| writer.allocate_id()).collect();

        writer.commit(
            root_id,
            Dictionary::new()
                .with("Type", Name::from("Outlines"))
                .with("First", ids[first.0])
                .with("Last", ids[last.0])
                .with("Count", self.roots.len()),
        )?;

        for (index, entry) in self.entries.iter().enumerate() {
            let siblings = match entry.parent {
                Some(parent) => &self.entries[parent.0].children,
                None => &self.roots,
            };
            let position = siblings.iter().position(|s| s.0 == index).unwrap_or(0);

            let mut item = Dictionary::new()
                .with("Title", PdfString::text(&entry.title))
                .with("Parent", entry.parent.map(|p| ids[p.0]).unwrap_or(root_id));
            if let Some(prev) = position.checked_sub(1).and_then(|i| siblings.get(i)) {
                item.set("Prev", ids[prev.0]);
            }
            if let Some(next) = siblings.get(position + 1) {
                item.set("Next", ids[next.0]);
            }
            if let (Some(first), Some(last)) = (entry.children.first(), entry.children.last()) {
                item.set("First", ids[first.0]);
                item.set("Last", ids[last.0]);
                // closed: negative count of what opening it would show
                item.set("Count", -(entry.children.len() as i64));
            }
            item.set("Dest", entry.destination.to_object(pages)?);

            if entry.style.flags() != 0 {
                item.set("F", entry.style.flags());
            }
            if let Some((r, g, b)) = entry.style.colour {
                item.set("C", vec![r, g, b]);
            }
            writer.commit(ids[index], item)?;
        }

        log::debug!("outline of {} bookmarks", self.entries.len());
        Ok(Some(root_id))
    }
}
