//! Conversion of byte text into characters, and characters into WinAnsi codes.

use crate::error::ConfigurationError;

/// The encodings byte text may be declared in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    WinAnsi,
}

impl TextEncoding {
    pub fn from_name(name: &str) -> Result<TextEncoding, ConfigurationError> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "iso88591" | "latin1" => Ok(TextEncoding::Latin1),
            "windows1252" | "cp1252" | "winansi" => Ok(TextEncoding::WinAnsi),
            _ => Err(ConfigurationError::UnknownEncoding(name.to_string())),
        }
    }
}

// 0x80..=0x9f in windows-1252; zero marks an unassigned code
const WIN_ANSI_HIGH: [u16; 32] = [
    0x20ac, 0, 0x201a, 0x0192, 0x201e, 0x2026, 0x2020, 0x2021, 0x02c6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017d, 0, 0, 0x2018, 0x2019, 0x201c, 0x201d, 0x2022, 0x2013, 0x2014, 0x02dc,
    0x2122, 0x0161, 0x203a, 0x0153, 0, 0x017e, 0x0178,
];

/// Decode `bytes` declared as `encoding`. Invalid UTF-8 and unassigned codes become
/// U+FFFD.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        TextEncoding::WinAnsi => bytes
            .iter()
            .map(|&b| match b {
                0x80..=0x9f => char::from_u32(WIN_ANSI_HIGH[(b - 0x80) as usize] as u32)
                    .filter(|c| *c != '\0')
                    .unwrap_or('\u{fffd}'),
                b => b as char,
            })
            .collect(),
    }
}

/// The WinAnsi code for `ch`, if it has one
pub fn win_ansi_code(ch: char) -> Option<u8> {
    let cp = ch as u32;
    match cp {
        0x20..=0x7e | 0xa0..=0xff => Some(cp as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|&high| high != 0 && high as u32 == cp)
            .map(|i| 0x80 + i as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        assert_eq!(TextEncoding::from_name("UTF-8"), Ok(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_name("ISO_8859-1"), Ok(TextEncoding::Latin1));
        assert_eq!(TextEncoding::from_name("CP1252"), Ok(TextEncoding::WinAnsi));
        assert!(TextEncoding::from_name("ebcdic").is_err());
    }

    #[test]
    fn decodes_each_encoding() {
        assert_eq!(decode("héllo".as_bytes(), TextEncoding::Utf8), "héllo");
        assert_eq!(decode(&[0x68, 0xe9], TextEncoding::Latin1), "hé");
        assert_eq!(decode(&[0x80, 0x81, 0x99], TextEncoding::WinAnsi), "€\u{fffd}™");
    }

    #[test]
    fn win_ansi_codes() {
        assert_eq!(win_ansi_code('A'), Some(0x41));
        assert_eq!(win_ansi_code('é'), Some(0xe9));
        assert_eq!(win_ansi_code('€'), Some(0x80));
        assert_eq!(win_ansi_code('\u{2014}'), Some(0x97));
        assert_eq!(win_ansi_code('\u{3042}'), None);
        assert_eq!(win_ansi_code('\n'), None);
    }
}
