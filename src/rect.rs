use crate::{object::Object, units::Pt};

/// A rectangle, specified by two opposite corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    /// The x-coordinate of the first (typically, lower-left) corner.
    pub x1: Pt,
    /// The y-coordinate of the first (typically, lower-left) corner.
    pub y1: Pt,
    /// The x-coordinate of the second (typically, upper-right) corner.
    pub x2: Pt,
    /// The y-coordinate of the second (typically, upper-right) corner.
    pub y2: Pt,
}

impl Rect {
    pub fn new<P: Into<Pt>>(x1: P, y1: P, x2: P, y2: P) -> Rect {
        Rect {
            x1: x1.into(),
            y1: y1.into(),
            x2: x2.into(),
            y2: y2.into(),
        }
    }

    /// A rectangle with its lower-left corner at the origin
    pub fn from_size<P: Into<Pt>>(width: P, height: P) -> Rect {
        Rect::new(Pt(0.0), Pt(0.0), width.into(), height.into())
    }

    pub fn width(&self) -> Pt {
        Pt(self.x2.0 - self.x1.0)
    }

    pub fn height(&self) -> Pt {
        Pt(self.y2.0 - self.y1.0)
    }
}

impl From<Rect> for Object {
    fn from(r: Rect) -> Self {
        Object::Array(vec![r.x1.0.into(), r.y1.0.into(), r.x2.0.into(), r.y2.0.into()])
    }
}

/// US Letter, portrait
pub const LETTER: (Pt, Pt) = (Pt(8.5 * 72.0), Pt(11.0 * 72.0));
/// ISO A4, portrait
pub const A4: (Pt, Pt) = (Pt(210.0 * 72.0 / 25.4), Pt(297.0 * 72.0 / 25.4));
