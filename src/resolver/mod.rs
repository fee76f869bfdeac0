//! Mapping log signatures to member identities.
//!
//! The log names methods as `java/lang/String hashCode ()I` (class, name,
//! descriptor separated by spaces) or in the compact `a/B.c()V` form.
//! Resolution never fails loudly: an unknown signature is `None`, and the
//! caller reports it with line context.

pub mod class_model;

pub use class_model::{read_class_header, ClassFileHeader, ClassModel};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a compiled method or constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberIdentity {
    pub class_name: String,
    pub member_name: String,
    pub descriptor: String,
}

impl MemberIdentity {
    pub fn new(
        class_name: impl Into<String>,
        member_name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            member_name: member_name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.member_name == "<init>"
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class_name, self.member_name, self.descriptor)
    }
}

/// Resolves a normalized log signature to a member identity
///
/// Implementations must be referentially stable: the same signature
/// always yields an equal identity.
pub trait MemberResolver {
    fn resolve(&self, signature: &str) -> Option<MemberIdentity>;
}

/// Resolves any well-formed signature, without consulting class metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureResolver;

impl MemberResolver for SignatureResolver {
    fn resolve(&self, signature: &str) -> Option<MemberIdentity> {
        parse_signature(signature)
    }
}

/// Convert path separators in a log signature to member-name separators
pub fn normalize_signature(raw: &str) -> String {
    raw.trim().replace('/', ".")
}

/// Split a normalized signature into class, member name and descriptor
pub fn parse_signature(signature: &str) -> Option<MemberIdentity> {
    let signature = signature.trim();
    let parts: Vec<&str> = signature.split_whitespace().collect();

    match parts.as_slice() {
        [class, name, descriptor] if descriptor.starts_with('(') => {
            Some(MemberIdentity::new(*class, *name, *descriptor))
        }
        [compact] => {
            let paren = compact.find('(')?;
            let (qualified, descriptor) = compact.split_at(paren);
            let dot = qualified.rfind('.')?;
            let (class, name) = (&qualified[..dot], &qualified[dot + 1..]);
            if class.is_empty() || name.is_empty() {
                return None;
            }
            Some(MemberIdentity::new(class, name, descriptor))
        }
        _ => None,
    }
}
