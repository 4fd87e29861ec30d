//! Fixed-width flag words with optional names per bit.

use core::fmt::{self, Debug, Display};
use core::hash::{Hash, Hasher};

use crate::codec::{Decode, Encode, Reader};
use crate::{SecurityError, SecurityResult};

/// Names for the bits of a flag word.
///
/// A meaning table is metadata only: two [`Bitset`]s with the same bits but
/// different tables encode to the same bytes and compare equal.
#[derive(Debug, PartialEq, Eq)]
pub struct Meaning {
    name: &'static str,
    width: usize,
    bits: &'static [(&'static str, u8)],
}

impl Meaning {
    /// Creates a table for a `width`-bit word.
    #[must_use]
    #[inline]
    pub const fn new(
        name: &'static str,
        width: usize,
        bits: &'static [(&'static str, u8)],
    ) -> Self {
        Self { name, width, bits }
    }

    /// Table name, used in diagnostics.
    #[must_use]
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Width in bits of the words this table describes.
    #[must_use]
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// `(name, bit index)` pairs.
    #[must_use]
    #[inline]
    pub const fn entries(&self) -> &'static [(&'static str, u8)] {
        self.bits
    }

    /// Bit index carrying `name`, compared case-insensitively.
    #[must_use]
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.bits
            .iter()
            .find(|(bit_name, _)| bit_name.eq_ignore_ascii_case(name))
            .map(|&(_, index)| index)
    }

    /// Name of the bit at `index`, if any.
    #[must_use]
    #[inline]
    pub fn name_of(&self, index: u8) -> Option<&'static str> {
        self.bits
            .iter()
            .find(|&&(_, bit)| bit == index)
            .map(|&(name, _)| name)
    }

    /// Whether every name maps to a distinct bit and every bit to a distinct name.
    #[must_use]
    #[inline]
    pub fn is_injective(&self) -> bool {
        self.bits.iter().enumerate().all(|(i, (name, index))| {
            self.bits.iter().skip(i + 1).all(|(other_name, other_index)| {
                !other_name.eq_ignore_ascii_case(name) && other_index != index
            })
        })
    }
}

/// An `N`-bit flag word (`N` is 8, 16 or 32) with an optional [`Meaning`].
///
/// Bit 0 is the low bit of byte 0; the binary form is the little-endian
/// packing of the word on `N / 8` bytes.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{AccessMask, meaning};
/// let mut mask =
///     AccessMask::from_named_bits(&meaning::FILE, ["FILE_READ_DATA", "SYNCHRONIZE"]).unwrap();
/// assert!(mask.get_named("synchronize"));
/// assert!(mask.set_named("DELETE", true));
/// assert!(!mask.set_named("NOT_A_BIT", true));
/// assert_eq!(mask.bits(), 0x0011_0001);
/// assert_eq!(mask.to_bytes(), [0x01, 0x00, 0x11, 0x00]);
/// ```
#[derive(Clone, Copy)]
pub struct Bitset<const N: usize> {
    bits: u32,
    meaning: Option<&'static Meaning>,
}

/// 32-bit access rights word.
pub type AccessMask = Bitset<32>;

impl<const N: usize> Bitset<N> {
    const WIDTH_CHECK: () =
        assert!(N == 8 || N == 16 || N == 32, "Bitset width must be 8, 16 or 32");

    /// Number of bytes of the binary form.
    pub const BYTES: usize = N / 8;

    const MASK: u32 = if N >= 32 { u32::MAX } else { (1u32 << N) - 1 };

    /// A word with no bit set and no meaning table.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        let () = Self::WIDTH_CHECK;
        Self {
            bits: 0,
            meaning: None,
        }
    }

    /// A word holding `bits`, truncated to `N` bits.
    #[must_use]
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        let () = Self::WIDTH_CHECK;
        Self {
            bits: bits & Self::MASK,
            meaning: None,
        }
    }

    /// Attaches a meaning table.
    ///
    /// # Errors
    /// [`SecurityError::InvalidMeaning`] if the table describes another width
    /// or names a bit that does not exist in an `N`-bit word.
    #[inline]
    pub fn with_meaning(mut self, meaning: &'static Meaning) -> SecurityResult<Self> {
        if let Some(&(name, _)) = meaning
            .entries()
            .iter()
            .find(|&&(_, index)| usize::from(index) >= N)
        {
            return Err(SecurityError::InvalidMeaning {
                table: meaning.name(),
                name: name.to_owned(),
            });
        }
        if meaning.width() != N {
            return Err(SecurityError::InvalidMeaning {
                table: meaning.name(),
                name: format!("<{N}-bit word>"),
            });
        }
        self.meaning = Some(meaning);
        Ok(self)
    }

    /// Builds a word from bit names looked up in `meaning`.
    ///
    /// # Errors
    /// [`SecurityError::InvalidMeaning`] for an unknown name or a table that
    /// does not fit `N` bits.
    #[inline]
    pub fn from_named_bits<'n, I>(meaning: &'static Meaning, names: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut set = Self::new().with_meaning(meaning)?;
        for name in names {
            if !set.set_named(name, true) {
                return Err(SecurityError::InvalidMeaning {
                    table: meaning.name(),
                    name: name.to_owned(),
                });
            }
        }
        Ok(set)
    }

    /// Decodes the first `N / 8` bytes of `bytes`.
    ///
    /// # Errors
    /// [`SecurityError::Truncated`] if fewer bytes are available.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// The raw word.
    #[must_use]
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// The attached meaning table.
    #[must_use]
    #[inline]
    pub const fn meaning(&self) -> Option<&'static Meaning> {
        self.meaning
    }

    /// Whether every bit of `mask` is set.
    #[must_use]
    #[inline]
    pub const fn contains(&self, mask: u32) -> bool {
        self.bits & mask == mask
    }

    /// Bit at `index`; `false` when `index` is outside the word.
    #[must_use]
    #[inline]
    pub const fn get(&self, index: usize) -> bool {
        index < N && self.bits & (1 << index) != 0
    }

    /// Sets the bit at `index`; returns `false` when `index` is outside the word.
    #[inline]
    pub const fn set(&mut self, index: usize, value: bool) -> bool {
        if index >= N {
            return false;
        }
        if value {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
        true
    }

    /// Bit called `name`; `false` when no meaning table names it.
    #[must_use]
    #[inline]
    pub fn get_named(&self, name: &str) -> bool {
        self.index_named(name)
            .is_some_and(|index| self.get(usize::from(index)))
    }

    /// Sets the bit called `name`; returns `false` when no meaning table names it.
    #[inline]
    pub fn set_named(&mut self, name: &str, value: bool) -> bool {
        self.index_named(name)
            .is_some_and(|index| self.set(usize::from(index), value))
    }

    fn index_named(&self, name: &str) -> Option<u8> {
        self.meaning.and_then(|meaning| meaning.index_of(name))
    }

    /// Names of the set bits that the meaning table knows.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.meaning
            .map(Meaning::entries)
            .unwrap_or_default()
            .iter()
            .filter(|&&(_, index)| self.get(usize::from(index)))
            .map(|&(name, _)| name)
    }

    /// Little-endian binary form on `N / 8` bytes.
    #[must_use]
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .to_le_bytes()
            .into_iter()
            .take(Self::BYTES)
            .collect()
    }
}

impl<const N: usize> Default for Bitset<N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<u32> for Bitset<N> {
    #[inline]
    fn from(bits: u32) -> Self {
        Self::from_bits(bits)
    }
}

impl<const N: usize> PartialEq for Bitset<N> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<const N: usize> Eq for Bitset<N> {}

impl<const N: usize> Hash for Bitset<N> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<const N: usize> Debug for Bitset<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = Self::BYTES * 2 + 2;
        write!(f, "Bitset<{N}>({:#0width$x}", self.bits)?;
        if let Some(meaning) = self.meaning {
            write!(f, ", {}", meaning.name())?;
        }
        f.write_str(")")
    }
}

/// Renders `NAME | NAME | 0x…`, the hex part holding bits without a name.
impl<const N: usize> Display for Bitset<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unnamed = self.bits;
        let mut first = true;
        for name in self.names() {
            if let Some(index) = self.index_named(name) {
                unnamed &= !(1u32 << index);
            }
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if unnamed != 0 || first {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{unnamed:#x}")?;
        }
        Ok(())
    }
}

impl<const N: usize> Encode for Bitset<N> {
    fn encoded_len(&self) -> usize {
        Self::BYTES
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        out.extend(self.bits.to_le_bytes().into_iter().take(Self::BYTES));
        Ok(())
    }
}

impl<const N: usize> Decode for Bitset<N> {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let bytes = reader.take(Self::BYTES, "flags")?;
        let mut word = [0u8; 4];
        for (slot, byte) in word.iter_mut().zip(bytes) {
            *slot = *byte;
        }
        Ok(Self::from_bits(u32::from_le_bytes(word)))
    }
}
