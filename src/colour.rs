use std::io::{self, Write};

/// Index of a colour profile loaded into a document, see
/// [Document::color_profile_load](crate::Document::color_profile_load)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProfileId(pub(crate) usize);

impl ProfileId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A fill colour
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Colour {
    /// DeviceRGB; r, g, b range from 0.0 to 1.0
    RGB { r: f32, g: f32, b: f32 },
    /// DeviceCMYK; c, m, y, and k range from 0.0 to 1.0
    CMYK { c: f32, m: f32, y: f32, k: f32 },
    /// DeviceGray
    Grey { g: f32 },
    /// Components in an ICC based colour space; only the first `n` values are used
    Icc { profile: ProfileId, values: [f32; 4], n: u8 },
}

impl Colour {
    pub fn new_rgb(r: f32, g: f32, b: f32) -> Colour {
        Colour::RGB { r, g, b }
    }

    /// r, g, and b range from 0 to 255
    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour::RGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn new_cmyk(c: f32, m: f32, y: f32, k: f32) -> Colour {
        Colour::CMYK { c, m, y, k }
    }

    pub fn new_grey(g: f32) -> Colour {
        Colour::Grey { g }
    }

    /// A colour in a loaded profile's space. Extra values beyond four are ignored.
    pub fn new_icc(profile: ProfileId, components: &[f32]) -> Colour {
        let mut values = [0.0; 4];
        let n = components.len().min(4);
        values[..n].copy_from_slice(&components[..n]);
        Colour::Icc {
            profile,
            values,
            n: n as u8,
        }
    }

    /// The profile this colour needs in the page resources, if any
    pub fn profile(&self) -> Option<ProfileId> {
        match self {
            Colour::Icc { profile, .. } => Some(*profile),
            _ => None,
        }
    }

    /// Write the non-stroking colour operators. ICC colours name their space as
    /// `/CS{index}`.
    pub(crate) fn write_fill<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_operators(out, false)
    }

    pub(crate) fn write_stroke<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_operators(out, true)
    }

    #[allow(clippy::write_with_newline)]
    fn write_operators<W: Write>(&self, out: &mut W, stroke: bool) -> io::Result<()> {
        let op = |fill: &'static str, stroking: &'static str| if stroke { stroking } else { fill };
        match self {
            Colour::RGB { r, g, b } => write!(out, "{r} {g} {b} {}\n", op("rg", "RG")),
            Colour::CMYK { c, m, y, k } => write!(out, "{c} {m} {y} {k} {}\n", op("k", "K")),
            Colour::Grey { g } => write!(out, "{g} {}\n", op("g", "G")),
            Colour::Icc { profile, values, n } => {
                write!(out, "/CS{} {}\n", profile.0, op("cs", "CS"))?;
                for v in values.iter().take(*n as usize) {
                    write!(out, "{v} ")?;
                }
                write!(out, "{}\n", op("sc", "SC"))
            }
        }
    }
}

impl<T: Into<f32>> From<[T; 3]> for Colour {
    fn from(c: [T; 3]) -> Self {
        let [r, g, b] = c;
        Colour::new_rgb(r.into(), g.into(), b.into())
    }
}

/// A list of pre-defined colour constants
pub mod colours {
    use super::*;

    pub const BLACK: Colour = Colour::Grey { g: 0.0 };
    pub const WHITE: Colour = Colour::Grey { g: 1.0 };
    pub const RED: Colour = Colour::RGB { r: 1.0, g: 0.0, b: 0.0 };
    pub const GREEN: Colour = Colour::RGB { r: 0.0, g: 1.0, b: 0.0 };
    pub const BLUE: Colour = Colour::RGB { r: 0.0, g: 0.0, b: 1.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(colour: Colour) -> String {
        let mut out = Vec::new();
        colour.write_fill(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn device_colours() {
        assert_eq!(fill(colours::RED), "1 0 0 rg\n");
        assert_eq!(fill(Colour::new_grey(0.5)), "0.5 g\n");
        assert_eq!(fill(Colour::new_cmyk(0.0, 1.0, 0.0, 0.25)), "0 1 0 0.25 k\n");
    }

    #[test]
    fn icc_colours_name_their_space() {
        let colour = Colour::new_icc(ProfileId(2), &[0.1, 0.2, 0.3]);
        assert_eq!(colour.profile(), Some(ProfileId(2)));
        assert_eq!(fill(colour), "/CS2 cs\n0.1 0.2 0.3 sc\n");
    }

    #[test]
    fn stroking_operators_are_uppercase() {
        let mut out = Vec::new();
        colours::BLUE.write_stroke(&mut out).unwrap();
        assert_eq!(out, b"0 0 1 RG\n");
    }
}
