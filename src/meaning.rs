//! Meaning tables for the flag words of the security model.
//!
//! Access masks share the standard and generic rights in their upper half;
//! the low 16 bits are object specific.

use crate::bitset::Meaning;

macro_rules! access_table {
    ($name:literal, [$(($bit:literal, $index:literal)),* $(,)?]) => {
        Meaning::new(
            $name,
            32,
            &[
                $(($bit, $index),)*
                ("DELETE", 16),
                ("READ_CONTROL", 17),
                ("WRITE_DAC", 18),
                ("WRITE_OWNER", 19),
                ("SYNCHRONIZE", 20),
                ("ACCESS_SYSTEM_SECURITY", 24),
                ("MAXIMUM_ALLOWED", 25),
                ("GENERIC_ALL", 28),
                ("GENERIC_EXECUTE", 29),
                ("GENERIC_WRITE", 30),
                ("GENERIC_READ", 31),
            ],
        )
    };
}

/// Standard and generic rights only.
pub static GENERIC: Meaning = access_table!("generic", []);

/// File object rights.
pub static FILE: Meaning = access_table!(
    "file",
    [
        ("FILE_READ_DATA", 0),
        ("FILE_WRITE_DATA", 1),
        ("FILE_APPEND_DATA", 2),
        ("FILE_READ_EA", 3),
        ("FILE_WRITE_EA", 4),
        ("FILE_EXECUTE", 5),
        ("FILE_READ_ATTRIBUTES", 7),
        ("FILE_WRITE_ATTRIBUTES", 8),
    ]
);

/// Directory object rights.
pub static DIRECTORY: Meaning = access_table!(
    "directory",
    [
        ("FILE_LIST_DIRECTORY", 0),
        ("FILE_ADD_FILE", 1),
        ("FILE_ADD_SUBDIRECTORY", 2),
        ("FILE_READ_EA", 3),
        ("FILE_WRITE_EA", 4),
        ("FILE_TRAVERSE", 5),
        ("FILE_DELETE_CHILD", 6),
        ("FILE_READ_ATTRIBUTES", 7),
        ("FILE_WRITE_ATTRIBUTES", 8),
    ]
);

/// Process object rights.
pub static PROCESS: Meaning = access_table!(
    "process",
    [
        ("PROCESS_TERMINATE", 0),
        ("PROCESS_CREATE_THREAD", 1),
        ("PROCESS_SET_SESSIONID", 2),
        ("PROCESS_VM_OPERATION", 3),
        ("PROCESS_VM_READ", 4),
        ("PROCESS_VM_WRITE", 5),
        ("PROCESS_DUP_HANDLE", 6),
        ("PROCESS_CREATE_PROCESS", 7),
        ("PROCESS_SET_QUOTA", 8),
        ("PROCESS_SET_INFORMATION", 9),
        ("PROCESS_QUERY_INFORMATION", 10),
        ("PROCESS_SUSPEND_RESUME", 11),
        ("PROCESS_QUERY_LIMITED_INFORMATION", 12),
        ("PROCESS_SET_LIMITED_INFORMATION", 13),
    ]
);

/// Access token rights.
pub static TOKEN: Meaning = access_table!(
    "token",
    [
        ("TOKEN_ASSIGN_PRIMARY", 0),
        ("TOKEN_DUPLICATE", 1),
        ("TOKEN_IMPERSONATE", 2),
        ("TOKEN_QUERY", 3),
        ("TOKEN_QUERY_SOURCE", 4),
        ("TOKEN_ADJUST_PRIVILEGES", 5),
        ("TOKEN_ADJUST_GROUPS", 6),
        ("TOKEN_ADJUST_DEFAULT", 7),
        ("TOKEN_ADJUST_SESSIONID", 8),
    ]
);

/// Registry key rights.
pub static REGISTRY: Meaning = access_table!(
    "registry",
    [
        ("KEY_QUERY_VALUE", 0),
        ("KEY_SET_VALUE", 1),
        ("KEY_CREATE_SUB_KEY", 2),
        ("KEY_ENUMERATE_SUB_KEYS", 3),
        ("KEY_NOTIFY", 4),
        ("KEY_CREATE_LINK", 5),
        ("KEY_WOW64_64KEY", 8),
        ("KEY_WOW64_32KEY", 9),
    ]
);

/// Mask of a mandatory label ACE.
pub static MANDATORY_LABEL: Meaning = Meaning::new(
    "mandatory-label",
    32,
    &[
        ("SYSTEM_MANDATORY_LABEL_NO_WRITE_UP", 0),
        ("SYSTEM_MANDATORY_LABEL_NO_READ_UP", 1),
        ("SYSTEM_MANDATORY_LABEL_NO_EXECUTE_UP", 2),
    ],
);

/// `AceFlags` of the ACE header.
pub static ACE_FLAGS: Meaning = Meaning::new(
    "ace-flags",
    8,
    &[
        ("OBJECT_INHERIT_ACE", 0),
        ("CONTAINER_INHERIT_ACE", 1),
        ("NO_PROPAGATE_INHERIT_ACE", 2),
        ("INHERIT_ONLY_ACE", 3),
        ("INHERITED_ACE", 4),
        ("CRITICAL_ACE_FLAG", 5),
        ("SUCCESSFUL_ACCESS_ACE_FLAG", 6),
        ("FAILED_ACCESS_ACE_FLAG", 7),
    ],
);

/// `Flags` of object ACEs, telling which GUIDs follow.
pub static OBJECT_ACE_FLAGS: Meaning = Meaning::new(
    "object-ace-flags",
    32,
    &[
        ("ACE_OBJECT_TYPE_PRESENT", 0),
        ("ACE_INHERITED_OBJECT_TYPE_PRESENT", 1),
    ],
);

/// `Control` word of a security descriptor.
pub static CONTROL: Meaning = Meaning::new(
    "control",
    16,
    &[
        ("SE_OWNER_DEFAULTED", 0),
        ("SE_GROUP_DEFAULTED", 1),
        ("SE_DACL_PRESENT", 2),
        ("SE_DACL_DEFAULTED", 3),
        ("SE_SACL_PRESENT", 4),
        ("SE_SACL_DEFAULTED", 5),
        ("SE_DACL_TRUSTED", 6),
        ("SE_SERVER_SECURITY", 7),
        ("SE_DACL_AUTO_INHERIT_REQ", 8),
        ("SE_SACL_AUTO_INHERIT_REQ", 9),
        ("SE_DACL_AUTO_INHERITED", 10),
        ("SE_SACL_AUTO_INHERITED", 11),
        ("SE_DACL_PROTECTED", 12),
        ("SE_SACL_PROTECTED", 13),
        ("SE_RM_CONTROL_VALID", 14),
        ("SE_SELF_RELATIVE", 15),
    ],
);

/// `Flags` of a claim security attribute.
pub static CLAIM_FLAGS: Meaning = Meaning::new(
    "claim-flags",
    32,
    &[
        ("CLAIM_SECURITY_ATTRIBUTE_NON_INHERITABLE", 0),
        ("CLAIM_SECURITY_ATTRIBUTE_VALUE_CASE_SENSITIVE", 1),
        ("CLAIM_SECURITY_ATTRIBUTE_USE_FOR_DENY_ONLY", 2),
        ("CLAIM_SECURITY_ATTRIBUTE_DISABLED_BY_DEFAULT", 3),
        ("CLAIM_SECURITY_ATTRIBUTE_DISABLED", 4),
        ("CLAIM_SECURITY_ATTRIBUTE_MANDATORY", 5),
    ],
);

/// Frequently used access rights.
pub mod rights {
    /// `DELETE`
    pub const DELETE: u32 = 0x0001_0000;
    /// `READ_CONTROL`
    pub const READ_CONTROL: u32 = 0x0002_0000;
    /// `WRITE_DAC`
    pub const WRITE_DAC: u32 = 0x0004_0000;
    /// `WRITE_OWNER`
    pub const WRITE_OWNER: u32 = 0x0008_0000;
    /// `SYNCHRONIZE`
    pub const SYNCHRONIZE: u32 = 0x0010_0000;
    /// `GENERIC_ALL`
    pub const GENERIC_ALL: u32 = 0x1000_0000;
    /// `GENERIC_EXECUTE`
    pub const GENERIC_EXECUTE: u32 = 0x2000_0000;
    /// `GENERIC_WRITE`
    pub const GENERIC_WRITE: u32 = 0x4000_0000;
    /// `GENERIC_READ`
    pub const GENERIC_READ: u32 = 0x8000_0000;
    /// `FILE_ALL_ACCESS`
    pub const FILE_ALL_ACCESS: u32 = 0x001F_01FF;
}
