use core::fmt::{self, Debug, Display};

/// Body layout shared by a family of ACE types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceShape {
    /// Access mask and SID.
    Basic,
    /// Access mask, object flags, optional GUIDs and SID.
    Object,
    /// [`AceShape::Object`] followed by application data.
    ObjectWithData,
    /// [`AceShape::Basic`] followed by application data.
    WithData,
}

impl AceShape {
    /// Whether the body carries object GUIDs.
    #[must_use]
    #[inline]
    pub const fn is_object(self) -> bool {
        matches!(self, Self::Object | Self::ObjectWithData)
    }

    /// Whether the body may end with application data.
    #[must_use]
    #[inline]
    pub const fn has_data(self) -> bool {
        matches!(self, Self::ObjectWithData | Self::WithData)
    }
}

/// What the application data of an ACE type holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// The type carries no application data.
    None,
    /// A conditional expression.
    Expression,
    /// A single-valued claim attribute.
    Attribute,
    /// Bytes this crate does not interpret.
    Opaque,
}

/// ACE type code.
///
/// Every code is representable; [`AceType::shape`] is `None` for codes this
/// crate does not know, whose bodies are kept as raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AceType(pub u8);

macro_rules! ace_types {
    ($( $(#[$doc:meta])* $name:ident = $code:literal, $shape:ident, $data:ident; )*) => {
        impl AceType {
            $(
                $(#[$doc])*
                pub const $name: Self = Self($code);
            )*

            /// Body layout, `None` for an unknown code.
            #[must_use]
            #[inline]
            pub const fn shape(self) -> Option<AceShape> {
                match self.0 {
                    $( $code => Some(AceShape::$shape), )*
                    _ => None,
                }
            }

            /// What the application data holds.
            #[must_use]
            #[inline]
            pub const fn data_kind(self) -> DataKind {
                match self.0 {
                    $( $code => DataKind::$data, )*
                    _ => DataKind::None,
                }
            }

            /// Symbolic name, `None` for an unknown code.
            #[must_use]
            #[inline]
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $code => Some(stringify!($name)), )*
                    _ => None,
                }
            }
        }
    };
}

ace_types! {
    /// `ACCESS_ALLOWED_ACE_TYPE`
    ACCESS_ALLOWED = 0x00, Basic, None;
    /// `ACCESS_DENIED_ACE_TYPE`
    ACCESS_DENIED = 0x01, Basic, None;
    /// `SYSTEM_AUDIT_ACE_TYPE`
    SYSTEM_AUDIT = 0x02, Basic, None;
    /// `SYSTEM_ALARM_ACE_TYPE`
    SYSTEM_ALARM = 0x03, Basic, None;
    /// `ACCESS_ALLOWED_OBJECT_ACE_TYPE`
    ACCESS_ALLOWED_OBJECT = 0x05, Object, None;
    /// `ACCESS_DENIED_OBJECT_ACE_TYPE`
    ACCESS_DENIED_OBJECT = 0x06, Object, None;
    /// `SYSTEM_AUDIT_OBJECT_ACE_TYPE`
    SYSTEM_AUDIT_OBJECT = 0x07, ObjectWithData, Opaque;
    /// `SYSTEM_ALARM_OBJECT_ACE_TYPE`
    SYSTEM_ALARM_OBJECT = 0x08, Object, None;
    /// `ACCESS_ALLOWED_CALLBACK_ACE_TYPE`
    ACCESS_ALLOWED_CALLBACK = 0x09, WithData, Expression;
    /// `ACCESS_DENIED_CALLBACK_ACE_TYPE`
    ACCESS_DENIED_CALLBACK = 0x0A, WithData, Expression;
    /// `ACCESS_ALLOWED_CALLBACK_OBJECT_ACE_TYPE`
    ACCESS_ALLOWED_CALLBACK_OBJECT = 0x0B, ObjectWithData, Expression;
    /// `ACCESS_DENIED_CALLBACK_OBJECT_ACE_TYPE`
    ACCESS_DENIED_CALLBACK_OBJECT = 0x0C, ObjectWithData, Expression;
    /// `SYSTEM_AUDIT_CALLBACK_ACE_TYPE`
    SYSTEM_AUDIT_CALLBACK = 0x0D, WithData, Expression;
    /// `SYSTEM_ALARM_CALLBACK_ACE_TYPE`
    SYSTEM_ALARM_CALLBACK = 0x0E, WithData, Opaque;
    /// `SYSTEM_AUDIT_CALLBACK_OBJECT_ACE_TYPE`
    SYSTEM_AUDIT_CALLBACK_OBJECT = 0x0F, ObjectWithData, Expression;
    /// `SYSTEM_ALARM_CALLBACK_OBJECT_ACE_TYPE`
    SYSTEM_ALARM_CALLBACK_OBJECT = 0x10, ObjectWithData, Opaque;
    /// `SYSTEM_MANDATORY_LABEL_ACE_TYPE`
    SYSTEM_MANDATORY_LABEL = 0x11, Basic, None;
    /// `SYSTEM_RESOURCE_ATTRIBUTE_ACE_TYPE`
    SYSTEM_RESOURCE_ATTRIBUTE = 0x12, WithData, Attribute;
    /// `SYSTEM_SCOPED_POLICY_ID_ACE_TYPE`
    SYSTEM_SCOPED_POLICY_ID = 0x13, Basic, None;
    /// `SYSTEM_PROCESS_TRUST_LABEL_ACE_TYPE`
    SYSTEM_PROCESS_TRUST_LABEL = 0x14, Basic, None;
    /// `SYSTEM_ACCESS_FILTER_ACE_TYPE`
    SYSTEM_ACCESS_FILTER = 0x15, WithData, Opaque;
}

impl AceType {
    /// Allow-kind types: the ones deny ACEs are placed in front of.
    #[must_use]
    #[inline]
    pub const fn is_allow(self) -> bool {
        matches!(
            self,
            Self::ACCESS_ALLOWED
                | Self::ACCESS_ALLOWED_OBJECT
                | Self::ACCESS_ALLOWED_CALLBACK
                | Self::ACCESS_ALLOWED_CALLBACK_OBJECT
        )
    }

    /// Deny-kind types.
    #[must_use]
    #[inline]
    pub const fn is_deny(self) -> bool {
        matches!(
            self,
            Self::ACCESS_DENIED
                | Self::ACCESS_DENIED_OBJECT
                | Self::ACCESS_DENIED_CALLBACK
                | Self::ACCESS_DENIED_CALLBACK_OBJECT
        )
    }

    /// Whether the body carries object GUIDs.
    #[must_use]
    #[inline]
    pub const fn is_object(self) -> bool {
        match self.shape() {
            Some(shape) => shape.is_object(),
            None => false,
        }
    }

    /// Whether the type is known.
    #[must_use]
    #[inline]
    pub const fn is_known(self) -> bool {
        self.shape().is_some()
    }
}

impl From<u8> for AceType {
    #[inline]
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<AceType> for u8 {
    #[inline]
    fn from(value: AceType) -> Self {
        value.0
    }
}

impl Display for AceType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}

impl Debug for AceType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AceType({self})")
    }
}
