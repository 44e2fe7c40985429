//! JVM access flag constants and predicates.

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;
pub const ACC_MODULE: u16 = 0x8000;
pub const ACC_BRIDGE: u16 = 0x0040;

/// The subset of raw class access bits that survives into a derived
/// inner-class access value.
pub const INNER_ACCESS_MASK: u16 = ACC_PUBLIC
    | ACC_PRIVATE
    | ACC_PROTECTED
    | ACC_STATIC
    | ACC_FINAL
    | ACC_INTERFACE
    | ACC_ABSTRACT
    | ACC_SYNTHETIC
    | ACC_ANNOTATION
    | ACC_ENUM
    | ACC_MODULE;

#[inline]
pub fn is_public(access: u16) -> bool {
    access & ACC_PUBLIC != 0
}

#[inline]
pub fn is_private(access: u16) -> bool {
    access & ACC_PRIVATE != 0
}

#[inline]
pub fn is_protected(access: u16) -> bool {
    access & ACC_PROTECTED != 0
}

/// No visibility bit at all (the default visibility in source).
#[inline]
pub fn is_package_private(access: u16) -> bool {
    access & (ACC_PUBLIC | ACC_PRIVATE | ACC_PROTECTED) == 0
}

#[inline]
pub fn is_static(access: u16) -> bool {
    access & ACC_STATIC != 0
}

#[inline]
pub fn is_final(access: u16) -> bool {
    access & ACC_FINAL != 0
}

#[inline]
pub fn is_interface(access: u16) -> bool {
    access & ACC_INTERFACE != 0
}

#[inline]
pub fn is_synthetic(access: u16) -> bool {
    access & ACC_SYNTHETIC != 0
}

#[inline]
pub fn is_bridge(access: u16) -> bool {
    access & ACC_BRIDGE != 0
}

#[inline]
pub fn is_enum(access: u16) -> bool {
    access & ACC_ENUM != 0
}
