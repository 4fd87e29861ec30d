use crate::{AccessMask, Guid, SecurityError, SecurityResult, Sid};

use super::{
    Ace, AceFlags, AcePayload, AceShape, AceType, ApplicationData, BasicAce, ObjectAce,
    ObjectAceFlags,
};

/// Step-by-step construction of an [`Ace`] of any known type.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{AceBuilder, AceType, Guid, well_known};
/// let ace = AceBuilder::new(AceType::ACCESS_ALLOWED_OBJECT)
///     .sid(well_known::AUTHENTICATED_USERS)
///     .mask(0x0000_0100u32)
///     .object_type("bf967aba-0de6-11d0-a285-00aa003049e2".parse::<Guid>().unwrap())
///     .build()
///     .unwrap();
/// assert!(ace.ace_type().is_object());
///
/// assert!(AceBuilder::new(AceType::ACCESS_DENIED).mask(1u32).build().is_err());
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct AceBuilder {
    ace_type: AceType,
    flags: AceFlags,
    mask: Option<AccessMask>,
    sid: Option<Sid>,
    object_flags: ObjectAceFlags,
    object_type: Option<Guid>,
    inherited_object_type: Option<Guid>,
    data: ApplicationData,
}

impl AceBuilder {
    /// Starts an ACE of `ace_type` with no flags.
    #[inline]
    pub fn new(ace_type: AceType) -> Self {
        Self {
            ace_type,
            flags: AceFlags::new(),
            mask: None,
            sid: None,
            object_flags: ObjectAceFlags::new(),
            object_type: None,
            inherited_object_type: None,
            data: ApplicationData::None,
        }
    }

    /// Header flags.
    #[inline]
    pub fn flags(mut self, flags: AceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Access mask.
    #[inline]
    pub fn mask(mut self, mask: impl Into<AccessMask>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Trustee.
    #[inline]
    pub fn sid(mut self, sid: impl Into<Sid>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Object flags word; only kept by object types. The two presence bits
    /// are rewritten from the GUIDs.
    #[inline]
    pub fn object_flags(mut self, flags: impl Into<ObjectAceFlags>) -> Self {
        self.object_flags = flags.into();
        self
    }

    /// Object type GUID; only kept by object types.
    #[inline]
    pub fn object_type(mut self, guid: Guid) -> Self {
        self.object_type = Some(guid);
        self
    }

    /// Inherited object type GUID; only kept by object types.
    #[inline]
    pub fn inherited_object_type(mut self, guid: Guid) -> Self {
        self.inherited_object_type = Some(guid);
        self
    }

    /// Application data.
    #[inline]
    pub fn application_data(mut self, data: ApplicationData) -> Self {
        self.data = data;
        self
    }

    /// Builds the ACE.
    ///
    /// # Errors
    /// - [`SecurityError::Uninitialized`] if the SID or mask was never set.
    /// - [`SecurityError::PayloadShape`] for an unknown type, or application
    ///   data the type does not carry.
    /// - [`SecurityError::TooManyValues`] as in [`Ace::new`].
    #[inline]
    pub fn build(self) -> SecurityResult<Ace> {
        let shape = self.ace_type.shape().ok_or(SecurityError::PayloadShape {
            ace_type: self.ace_type.0,
        })?;
        let sid = self.sid.ok_or(SecurityError::Uninitialized("ACE SID"))?;
        let mask = self.mask.ok_or(SecurityError::Uninitialized("ACE access mask"))?;
        if !shape.has_data() && !self.data.is_none() {
            return Err(SecurityError::PayloadShape {
                ace_type: self.ace_type.0,
            });
        }
        let object = || ObjectAce {
            mask,
            flags: self.object_flags,
            object_type: self.object_type,
            inherited_object_type: self.inherited_object_type,
            sid: sid.clone(),
        };
        let payload = match shape {
            AceShape::Basic => AcePayload::Basic(BasicAce::new(mask, sid.clone())),
            AceShape::Object => AcePayload::Object(object()),
            AceShape::ObjectWithData => AcePayload::ObjectWithData(object(), self.data),
            AceShape::WithData => AcePayload::WithData(BasicAce::new(mask, sid.clone()), self.data),
        };
        Ace::new(self.ace_type, self.flags, payload)
    }
}
