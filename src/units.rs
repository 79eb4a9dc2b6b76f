use derive_more::{Add, AddAssign, Display, From, Into, Mul, MulAssign, Sum};

/// A length in PDF user space units (1/72 inch)
#[derive(
    Debug, Default, Copy, Clone, PartialEq, PartialOrd, Add, AddAssign, Mul, MulAssign, Sum, From, Into, Display,
)]
#[display("{_0}pt")]
pub struct Pt(pub f32);

#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, Add, Mul, From, Into, Display)]
#[display("{_0}in")]
pub struct In(pub f32);

#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, Add, Mul, From, Into, Display)]
#[display("{_0}mm")]
pub struct Mm(pub f32);

impl From<In> for Pt {
    fn from(v: In) -> Pt {
        Pt(v.0 * 72.0)
    }
}

impl From<Mm> for Pt {
    fn from(v: Mm) -> Pt {
        Pt(v.0 * 72.0 / 25.4)
    }
}
