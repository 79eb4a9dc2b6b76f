//! The standard security handler: password-based RC4 encryption, revisions 2 and 3.

use crate::{
    config::Profile,
    error::ConfigurationError,
    filter::ArcFour,
    object::{Dictionary, Name, PdfString},
};
use std::sync::atomic::{AtomicU64, Ordering};

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

const STATIC_FILE_ID: [u8; 16] = [
    0xc0, 0x8b, 0x63, 0xf2, 0xf5, 0x33, 0x27, 0x30, 0xfe, 0xf6, 0xd2, 0x9d, 0xc2, 0x2e, 0x85, 0x3a,
];

/// The first element of the trailer's `/ID`. With `fixed` set every document gets the
/// same identifier, which keeps output reproducible.
pub fn file_id(fixed: bool) -> [u8; 16] {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    if fixed {
        return STATIC_FILE_ID;
    }
    let now = chrono::Utc::now();
    let mut ctx = md5::Context::new();
    ctx.consume(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    ctx.consume(std::process::id().to_le_bytes());
    ctx.consume(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    ctx.finalize().0
}

/// Access permissions granted to users who open the document with the user password
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Permissions(u32);

impl Permissions {
    pub const NO_PRINT: u32 = 1 << 2;
    pub const NO_MODIFY: u32 = 1 << 3;
    pub const NO_COPY: u32 = 1 << 4;
    pub const NO_MODIFY_EX: u32 = 1 << 5;
    pub const NO_FORMS: u32 = 1 << 8;
    pub const NO_EXTRACT_ACCESSIBILITY: u32 = 1 << 9;
    pub const NO_ASSEMBLE: u32 = 1 << 10;
    pub const NO_HIRES_PRINT: u32 = 1 << 11;

    pub fn all() -> Permissions {
        Permissions(0xFFFF_FFFC)
    }

    pub fn deny(self, flag: u32) -> Permissions {
        Permissions(self.0 & !flag)
    }

    /// Parse a `;` or `,` separated list such as `no_print;no_copy`
    pub fn parse(list: &str) -> Result<Permissions, ConfigurationError> {
        let mut permissions = Permissions::all();
        for item in list.split([';', ',']).map(str::trim).filter(|s| !s.is_empty()) {
            let flag = match item {
                "no_print" => Self::NO_PRINT,
                "no_modify" => Self::NO_MODIFY,
                "no_copy" => Self::NO_COPY,
                "no_modify_ex" => Self::NO_MODIFY_EX,
                "no_forms" => Self::NO_FORMS,
                "no_extract_accessibility" => Self::NO_EXTRACT_ACCESSIBILITY,
                "no_assemble" => Self::NO_ASSEMBLE,
                "no_hires_print" => Self::NO_HIRES_PRINT,
                _ => {
                    return Err(ConfigurationError::InvalidValue {
                        name: "stdsh.permissions".into(),
                        value: item.to_string(),
                    })
                }
            };
            permissions = permissions.deny(flag);
        }
        Ok(permissions)
    }

    /// The `/P` value for a handler revision. Revision 2 has no notion of bits 9-12,
    /// which must read as set.
    pub fn value(&self, revision: u8) -> i32 {
        let bits = if revision < 3 { self.0 | 0xF00 } else { self.0 };
        bits as i32
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::all()
    }
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

/// 19 extra RC4 passes with the key XORed by the round number
fn xor_rounds(key: &[u8], data: &mut Vec<u8>, rounds: impl Iterator<Item = u8>) {
    for round in rounds {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        *data = ArcFour::new(&round_key).process(data);
    }
}

/// Holds the values of the encryption dictionary and the document key derived from
/// them
#[derive(Clone)]
pub struct SecurityHandler {
    revision: u8,
    key_length: usize,
    owner_entry: Vec<u8>,
    user_entry: Vec<u8>,
    permissions: i32,
    file_id: Vec<u8>,
    key: Vec<u8>,
}

impl std::fmt::Debug for SecurityHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityHandler")
            .field("revision", &self.revision)
            .field("key_length", &self.key_length)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl SecurityHandler {
    /// Revision 3 with a 128-bit key for PDF 1.4 and later, otherwise revision 2 with
    /// a 40-bit key
    pub fn new(
        owner_password: &[u8],
        user_password: &[u8],
        permissions: Permissions,
        file_id: &[u8],
        version: u8,
    ) -> SecurityHandler {
        let (revision, key_length) = if version >= 4 { (3, 16) } else { (2, 5) };
        let owner_password = if owner_password.is_empty() {
            user_password
        } else {
            owner_password
        };

        let owner_entry = Self::owner_entry(owner_password, user_password, revision, key_length);
        let p = permissions.value(revision);
        let key = Self::derive_key(user_password, &owner_entry, p, file_id, revision, key_length);
        let user_entry = Self::user_entry(&key, file_id, revision);

        log::debug!("standard security handler, revision {revision}, {} bit key", key_length * 8);
        SecurityHandler {
            revision,
            key_length,
            owner_entry,
            user_entry,
            permissions: p,
            file_id: file_id.to_vec(),
            key,
        }
    }

    /// Build a handler from `doc.encryption` and the `stdsh.*` options, or `None` when
    /// the document is not encrypted
    pub fn from_profile(profile: &Profile, file_id: &[u8]) -> Result<Option<SecurityHandler>, ConfigurationError> {
        match profile.get("doc.encryption")? {
            "" => Ok(None),
            "standard" => {
                let permissions = Permissions::parse(profile.get("stdsh.permissions")?)?;
                Ok(Some(SecurityHandler::new(
                    profile.get("stdsh.pwd_owner")?.as_bytes(),
                    profile.get("stdsh.pwd_user")?.as_bytes(),
                    permissions,
                    file_id,
                    profile.version(),
                )))
            }
            other => Err(ConfigurationError::InvalidValue {
                name: "doc.encryption".into(),
                value: other.to_string(),
            }),
        }
    }

    fn owner_entry(owner_password: &[u8], user_password: &[u8], revision: u8, n: usize) -> Vec<u8> {
        let mut hash = md5::compute(pad_password(owner_password)).0;
        if revision >= 3 {
            for _ in 0..50 {
                hash = md5::compute(hash).0;
            }
        }
        let key = &hash[..n];

        let mut entry = ArcFour::new(key).process(&pad_password(user_password));
        if revision >= 3 {
            xor_rounds(key, &mut entry, 1..20);
        }
        entry
    }

    fn derive_key(password: &[u8], owner_entry: &[u8], p: i32, file_id: &[u8], revision: u8, n: usize) -> Vec<u8> {
        let mut ctx = md5::Context::new();
        ctx.consume(pad_password(password));
        ctx.consume(owner_entry);
        ctx.consume(p.to_le_bytes());
        ctx.consume(file_id);
        let mut hash = ctx.finalize().0;
        if revision >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..n]).0;
            }
        }
        hash[..n].to_vec()
    }

    fn user_entry(key: &[u8], file_id: &[u8], revision: u8) -> Vec<u8> {
        if revision < 3 {
            return ArcFour::new(key).process(&PASSWORD_PADDING);
        }
        let mut ctx = md5::Context::new();
        ctx.consume(PASSWORD_PADDING);
        ctx.consume(file_id);
        let mut entry = ArcFour::new(key).process(&ctx.finalize().0);
        xor_rounds(key, &mut entry, 1..20);
        // only the first 16 bytes are checked; the rest is filler
        entry.extend_from_slice(&PASSWORD_PADDING[..16]);
        entry
    }

    /// The document key that per-object keys are derived from
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// Whether `password` opens the document as a user
    pub fn authenticate_user(&self, password: &[u8]) -> bool {
        let key = Self::derive_key(
            password,
            &self.owner_entry,
            self.permissions,
            &self.file_id,
            self.revision,
            self.key_length,
        );
        let entry = Self::user_entry(&key, &self.file_id, self.revision);
        entry[..16] == self.user_entry[..16]
    }

    /// Whether `password` is the owner password, by recovering the user password from
    /// `/O`
    pub fn authenticate_owner(&self, password: &[u8]) -> bool {
        let mut hash = md5::compute(pad_password(password)).0;
        if self.revision >= 3 {
            for _ in 0..50 {
                hash = md5::compute(hash).0;
            }
        }
        let key = &hash[..self.key_length];
        let user_password = if self.revision >= 3 {
            let mut data = self.owner_entry.clone();
            xor_rounds(key, &mut data, (0..20).rev());
            data
        } else {
            ArcFour::new(key).process(&self.owner_entry)
        };
        self.authenticate_user(&user_password)
    }

    /// The `/Encrypt` dictionary. It is written without encryption.
    pub fn dictionary(&self) -> Dictionary {
        let version: i64 = if self.revision >= 3 { 2 } else { 1 };
        Dictionary::new()
            .with("Filter", Name::from("Standard"))
            .with("V", version)
            .with("R", self.revision as i64)
            .with("Length", (self.key_length * 8) as i64)
            .with("O", PdfString::hex(self.owner_entry.clone()))
            .with("U", PdfString::hex(self.user_entry.clone()))
            .with("P", self.permissions as i64)
    }
}
