//! Context keys: the window of most recent bytes.

use std::fmt;
use std::hash::{BuildHasherDefault, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Trailing window of up to `max_length` recently seen bytes, most recent last.
///
/// Keys compare by their byte sequence only. Hashing feeds the bytes (and
/// nothing else) to the hasher, so with [`Djb2Hasher`] a key hashes to its
/// DJB2 string hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContextKey {
    max_length: u32,
    #[serde(rename = "Key")]
    bytes: Vec<u8>,
}

impl ContextKey {
    /// The empty (order-0) key.
    pub fn empty(max_length: u32) -> Self {
        Self {
            max_length,
            bytes: Vec::new(),
        }
    }

    /// Builds a key from the last `max_length` bytes of `bytes`.
    pub fn from_bytes(max_length: u32, bytes: &[u8]) -> Self {
        let skip = bytes.len().saturating_sub(max_length as usize);
        Self {
            max_length,
            bytes: bytes[skip..].to_vec(),
        }
    }

    /// The window contents, oldest first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Window capacity.
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Number of bytes in the window (the key's order).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for the order-0 key.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `true` once the window is full.
    pub fn is_max_order(&self) -> bool {
        self.bytes.len() == self.max_length as usize
    }

    /// The key with the oldest byte dropped, or `None` for the empty key.
    pub fn lesser(&self) -> Option<ContextKey> {
        if self.bytes.is_empty() {
            return None;
        }
        Some(Self {
            max_length: self.max_length,
            bytes: self.bytes[1..].to_vec(),
        })
    }

    /// The key after observing `byte`, sliding the window if it is full.
    pub fn extended(&self, byte: u8) -> ContextKey {
        let mut bytes = Vec::with_capacity(self.max_length as usize);
        let keep = if self.is_max_order() {
            self.bytes.len().saturating_sub(1)
        } else {
            self.bytes.len()
        };
        bytes.extend_from_slice(&self.bytes[self.bytes.len() - keep..]);
        if self.max_length > 0 {
            bytes.push(byte);
        }
        Self {
            max_length: self.max_length,
            bytes,
        }
    }

    /// DJB2 hash of the window.
    pub fn djb2(&self) -> u32 {
        djb2(&self.bytes)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.bytes.len() <= self.max_length as usize
    }
}

impl PartialEq for ContextKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ContextKey {}

impl Hash for ContextKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.bytes);
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}

const DJB2_SEED: u32 = 5381;

fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(DJB2_SEED, |hash, &b| {
        hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(u32::from(b))
    })
}

/// [`Hasher`] computing the DJB2 string hash of everything written to it.
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher {
    hash: u32,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { hash: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash = self
                .hash
                .wrapping_shl(5)
                .wrapping_add(self.hash)
                .wrapping_add(u32::from(b));
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.hash)
    }
}

/// Hasher builder for maps keyed by [`ContextKey`].
pub type Djb2Build = BuildHasherDefault<Djb2Hasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::hash::BuildHasher;

    #[test]
    fn test_extend_slides_window() {
        let key = ContextKey::empty(3);
        let key = key.extended(b'A').extended(b'B').extended(b'C');
        assert_eq!(key.as_bytes(), b"ABC");
        assert!(key.is_max_order());
        let key = key.extended(b'D');
        assert_eq!(key.as_bytes(), b"BCD");
    }

    #[test]
    fn test_lesser_drops_oldest() {
        let key = ContextKey::from_bytes(3, b"ABC");
        assert_eq!(key.lesser().unwrap().as_bytes(), b"BC");
        assert_eq!(ContextKey::empty(3).lesser(), None);
    }

    #[test]
    fn test_order_zero_model_never_grows() {
        let key = ContextKey::empty(0);
        assert!(key.is_max_order());
        assert!(key.extended(b'x').is_empty());
    }

    #[test]
    fn test_equality_ignores_capacity() {
        assert_eq!(
            ContextKey::from_bytes(2, b"AB"),
            ContextKey::from_bytes(5, b"AB")
        );
        assert_ne!(
            ContextKey::from_bytes(3, b"AB"),
            ContextKey::from_bytes(3, b"BA")
        );
    }

    #[test]
    fn test_hash_is_djb2() {
        let key = ContextKey::from_bytes(3, b"ab");
        // 5381 * 33 + 'a' = 177670, * 33 + 'b' = 5863208
        assert_eq!(key.djb2(), 5_863_208);
        assert_eq!(Djb2Build::default().hash_one(&key), 5_863_208);
    }

    #[test]
    fn test_map_lookup() {
        let mut map: HashMap<ContextKey, u32, Djb2Build> = HashMap::default();
        map.insert(ContextKey::from_bytes(3, b"xyz"), 1);
        map.insert(ContextKey::empty(3), 0);
        assert_eq!(map.get(&ContextKey::from_bytes(3, b"xyz")), Some(&1));
        assert_eq!(map.get(&ContextKey::from_bytes(3, b"yz")), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ContextKey::from_bytes(2, &[0x41, 0x0a]).to_string(), "[41 0a]");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&ContextKey::from_bytes(3, b"AB")).unwrap();
        assert_eq!(json, r#"{"MaxLength":3,"Key":[65,66]}"#);
    }
}
