//! Seams towards the operating system and account databases.
//!
//! This crate never reads or writes a live object. Callers plug producers and
//! consumers of self-relative descriptor bytes, and SID name lookups, in through
//! these traits.

use crate::{SecurityDescriptor, SecurityError, Sid};

/// Something that yields self-relative security descriptor bytes: a file, a
/// registry key, an SDDL converter, a test fixture.
pub trait DescriptorSource {
    /// Error reported by the source itself.
    type Error;

    /// The raw descriptor.
    ///
    /// # Errors
    /// Whatever the source fails with.
    fn read_descriptor(&self) -> Result<Vec<u8>, Self::Error>;
}

/// Something that accepts self-relative security descriptor bytes.
pub trait DescriptorSink {
    /// Error reported by the sink itself.
    type Error;

    /// Applies or stores `descriptor`.
    ///
    /// # Errors
    /// Whatever the sink fails with.
    fn write_descriptor(&mut self, descriptor: &[u8]) -> Result<(), Self::Error>;
}

/// Maps a SID to a human-readable account name.
pub trait SidNameResolver {
    /// `DOMAIN\name` or similar, `None` when the SID is unknown.
    fn resolve(&self, sid: &Sid) -> Option<String>;
}

/// Failure while moving a descriptor across a [`DescriptorSource`] or [`DescriptorSink`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransferError<E> {
    /// The source or sink failed.
    #[error("descriptor transfer failed")]
    Io(E),
    /// The bytes did not decode or the model did not encode.
    #[error(transparent)]
    Codec(#[from] SecurityError),
}

impl SecurityDescriptor {
    /// Reads and decodes a descriptor from `source`.
    ///
    /// # Errors
    /// [`TransferError::Io`] if the source fails, [`TransferError::Codec`] if
    /// its bytes are not a valid self-relative descriptor.
    #[inline]
    pub fn load_from<S: DescriptorSource + ?Sized>(
        source: &S,
    ) -> Result<Self, TransferError<S::Error>> {
        let bytes = source.read_descriptor().map_err(TransferError::Io)?;
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Encodes the descriptor and hands it to `sink`.
    ///
    /// # Errors
    /// [`TransferError::Codec`] if encoding fails, [`TransferError::Io`] if
    /// the sink refuses the bytes.
    #[inline]
    pub fn store_into<S: DescriptorSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<(), TransferError<S::Error>> {
        let bytes = self.to_bytes()?;
        sink.write_descriptor(&bytes).map_err(TransferError::Io)
    }
}

impl Sid {
    /// Account name from `resolver`, or the canonical string when it has none.
    #[must_use]
    #[inline]
    pub fn display_name<R: SidNameResolver + ?Sized>(&self, resolver: &R) -> String {
        resolver.resolve(self).unwrap_or_else(|| self.to_string())
    }
}

impl DescriptorSource for [u8] {
    type Error = core::convert::Infallible;

    #[inline]
    fn read_descriptor(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.to_vec())
    }
}

impl DescriptorSink for Vec<u8> {
    type Error = core::convert::Infallible;

    #[inline]
    fn write_descriptor(&mut self, descriptor: &[u8]) -> Result<(), Self::Error> {
        self.clear();
        self.extend_from_slice(descriptor);
        Ok(())
    }
}

impl<F> SidNameResolver for F
where
    F: Fn(&Sid) -> Option<String>,
{
    #[inline]
    fn resolve(&self, sid: &Sid) -> Option<String> {
        self(sid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use crate::well_known;

    struct Refusing;

    impl DescriptorSink for Refusing {
        type Error = &'static str;

        fn write_descriptor(&mut self, _: &[u8]) -> Result<(), Self::Error> {
            Err("read-only object")
        }
    }

    #[test]
    fn round_trip_through_buffer() {
        let sd = SecurityDescriptor::new().with_owner(well_known::LOCAL_SYSTEM);
        let mut buffer = Vec::new();
        sd.store_into(&mut buffer).unwrap();
        assert_eq!(SecurityDescriptor::load_from(buffer.as_slice()).unwrap(), sd);
    }

    #[test]
    fn errors_are_kept_apart() {
        let sd = SecurityDescriptor::new();
        assert_eq!(sd.store_into(&mut Refusing), Err(TransferError::Io("read-only object")));
        let garbage: &[u8] = &[1, 2];
        assert_eq!(
            SecurityDescriptor::load_from(garbage),
            Err(TransferError::Codec(SecurityError::MissingControl))
        );
    }

    #[test]
    fn display_name_falls_back() {
        let resolver = |sid: &Sid| {
            (*sid == well_known::BUILTIN_ADMINISTRATORS)
                .then(|| "BUILTIN\\Administrators".to_owned())
        };
        assert_eq!(
            well_known::BUILTIN_ADMINISTRATORS.to_sid().display_name(&resolver),
            "BUILTIN\\Administrators"
        );
        assert_eq!(well_known::WORLD.to_sid().display_name(&resolver), "S-1-1-0");
    }
}
