use super::{Filter, FilterResult};
use crate::object::ObjectId;

/// RC4 keystream state. The state advances with every byte, so a stream may be fed in
/// chunks of any size and still produce the same ciphertext.
#[derive(Clone)]
pub struct ArcFour {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl ArcFour {
    pub fn new(key: &[u8]) -> ArcFour {
        let mut s = [0u8; 256];
        for (i, v) in s.iter_mut().enumerate() {
            *v = i as u8;
        }
        if !key.is_empty() {
            let mut j: u8 = 0;
            for i in 0..256 {
                j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
                s.swap(i, j as usize);
            }
        }
        ArcFour { s, i: 0, j: 0 }
    }

    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.s[self.i as usize]);
            self.s.swap(self.i as usize, self.j as usize);
            let k = self.s[self.s[self.i as usize].wrapping_add(self.s[self.j as usize]) as usize];
            *byte ^= k;
        }
    }

    /// Encrypt (or decrypt) `data` with the current state
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply(&mut out);
        out
    }
}

impl Filter for ArcFour {
    fn consume(&mut self, chunk: &[u8]) -> FilterResult<Vec<u8>> {
        Ok(self.process(chunk))
    }

    fn finish(&mut self) -> FilterResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Derive the RC4 key for one object: MD5 over the document key, the low three bytes of
/// the object number and the low two bytes of the generation, cut to `n + 5` bytes
/// (at most 16).
pub fn object_key(base: &[u8], id: ObjectId) -> Vec<u8> {
    let mut ctx = md5::Context::new();
    ctx.consume(base);
    ctx.consume(&id.number.to_le_bytes()[..3]);
    ctx.consume(id.generation.to_le_bytes());
    let digest = ctx.finalize().0;
    let len = (base.len() + 5).min(16);
    digest[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            ArcFour::new(b"Key").process(b"Plaintext"),
            [0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]
        );
        assert_eq!(
            ArcFour::new(b"Secret").process(b"Attack at dawn"),
            [0x45, 0xA0, 0x1F, 0x64, 0x5F, 0xC3, 0x5B, 0x38, 0x35, 0x52, 0x54, 0x4B, 0x9B, 0xF5]
        );
    }

    #[test]
    fn chunking_does_not_change_output() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 256) as u8).collect();
        let whole = ArcFour::new(b"chunky").process(&data);

        for chunk_size in [1, 3, 64, 999] {
            let mut cipher = ArcFour::new(b"chunky");
            let mut out = Vec::new();
            for chunk in data.chunks(chunk_size) {
                out.extend(cipher.consume(chunk).unwrap());
            }
            out.extend(cipher.finish().unwrap());
            assert_eq!(out, whole, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn cipher_is_symmetric() {
        let data = b"the quick brown fox".to_vec();
        let encrypted = ArcFour::new(b"k").process(&data);
        assert_ne!(encrypted, data);
        assert_eq!(ArcFour::new(b"k").process(&encrypted), data);
    }

    #[test]
    fn object_keys_depend_on_id() {
        let base = [0x01, 0x02, 0x03, 0x04, 0x05];
        let a = object_key(&base, ObjectId::new(1, 0));
        let b = object_key(&base, ObjectId::new(2, 0));
        let c = object_key(&base, ObjectId::new(1, 1));
        assert_eq!(a.len(), 10);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(object_key(&[0u8; 16], ObjectId::new(1, 0)).len(), 16);
    }
}
