use crate::{
    error::ConfigurationError,
    object::{Object, ObjectId},
    page::Page,
    rect::Rect,
    units::Pt,
};
use id_arena::Id;
use std::collections::HashMap;

/// How the viewer fits the target page into its window. `None` coordinates keep the
/// viewer's current value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Fit {
    Xyz {
        left: Option<Pt>,
        top: Option<Pt>,
        zoom: Option<f32>,
    },
    /// The whole page
    Page,
    Horizontal { top: Option<Pt> },
    Vertical { left: Option<Pt> },
    Rect(Rect),
    /// The page's bounding box
    Bounds,
    BoundsHorizontal { top: Option<Pt> },
    BoundsVertical { left: Option<Pt> },
}

/// A page and a view of it, the target of bookmarks and links
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Destination {
    pub page: Id<Page>,
    pub fit: Fit,
}

fn coordinate(value: Option<Pt>) -> Object {
    value.map(|v| Object::Real(v.0)).unwrap_or(Object::Null)
}

impl Destination {
    pub fn new(page: Id<Page>, fit: Fit) -> Destination {
        Destination { page, fit }
    }

    /// The top of the page at the current zoom
    pub fn top_of(page: Id<Page>, page_height: Pt) -> Destination {
        Destination::new(
            page,
            Fit::Xyz {
                left: None,
                top: Some(page_height),
                zoom: None,
            },
        )
    }

    /// The explicit destination array, `[page /Mode args...]`
    pub(crate) fn to_object(&self, pages: &HashMap<Id<Page>, ObjectId>) -> Result<Object, ConfigurationError> {
        let page = *pages
            .get(&self.page)
            .ok_or(ConfigurationError::UnknownPage(self.page.index()))?;
        let mut dest: Vec<Object> = vec![page.into()];
        match self.fit {
            Fit::Xyz { left, top, zoom } => {
                dest.push(Object::name("XYZ"));
                dest.push(coordinate(left));
                dest.push(coordinate(top));
                dest.push(zoom.map(Object::Real).unwrap_or(Object::Null));
            }
            Fit::Page => dest.push(Object::name("Fit")),
            Fit::Horizontal { top } => dest.extend([Object::name("FitH"), coordinate(top)]),
            Fit::Vertical { left } => dest.extend([Object::name("FitV"), coordinate(left)]),
            Fit::Rect(rect) => {
                dest.push(Object::name("FitR"));
                dest.extend([rect.x1, rect.y1, rect.x2, rect.y2].map(|v| Object::Real(v.0)));
            }
            Fit::Bounds => dest.push(Object::name("FitB")),
            Fit::BoundsHorizontal { top } => dest.extend([Object::name("FitBH"), coordinate(top)]),
            Fit::BoundsVertical { left } => dest.extend([Object::name("FitBV"), coordinate(left)]),
        }
        Ok(Object::Array(dest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id_arena::Arena;

    fn written(dest: Destination, pages: &HashMap<Id<Page>, ObjectId>) -> String {
        let mut out = Vec::new();
        dest.to_object(pages).unwrap().write(&mut out, None);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn destination_arrays() {
        let mut arena: Arena<Page> = Arena::new();
        let page = arena.alloc(Page::new(Pt(100.0), Pt(200.0)));
        let pages: HashMap<_, _> = [(page, ObjectId::new(7, 0))].into_iter().collect();

        assert_eq!(written(Destination::top_of(page, Pt(200.0)), &pages), "[7 0 R /XYZ null 200 null]");
        assert_eq!(written(Destination::new(page, Fit::Page), &pages), "[7 0 R /Fit]");
        assert_eq!(
            written(Destination::new(page, Fit::Horizontal { top: Some(Pt(50.5)) }), &pages),
            "[7 0 R /FitH 50.5]"
        );
        assert_eq!(
            written(
                Destination::new(page, Fit::Rect(Rect::new(Pt(0.0), Pt(1.0), Pt(2.0), Pt(3.0)))),
                &pages
            ),
            "[7 0 R /FitR 0 1 2 3]"
        );
        assert_eq!(
            written(Destination::new(page, Fit::BoundsVertical { left: None }), &pages),
            "[7 0 R /FitBV null]"
        );
    }

    #[test]
    fn pages_outside_the_document_are_rejected() {
        let mut arena: Arena<Page> = Arena::new();
        let page = arena.alloc(Page::new(Pt(100.0), Pt(200.0)));
        assert_eq!(
            Destination::new(page, Fit::Page).to_object(&HashMap::new()),
            Err(ConfigurationError::UnknownPage(0))
        );
    }
}
