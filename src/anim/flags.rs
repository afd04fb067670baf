//! Per-key attribute flags (`KeyAttrFlags`).
//!
//! Bit values follow the FBX SDK `FbxAnimCurveDef` enums.

use std::fmt;

/// Bit set describing a key's interpolation, tangent mode and weighting.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyFlags(pub u32);

impl KeyFlags {
    // Interpolation
    pub const INTERPOLATION_CONSTANT: Self = Self(0x0000_0002);
    pub const INTERPOLATION_LINEAR: Self = Self(0x0000_0004);
    pub const INTERPOLATION_CUBIC: Self = Self(0x0000_0008);

    // Constant mode
    pub const CONSTANT_STANDARD: Self = Self(0x0000_0000);
    pub const CONSTANT_NEXT: Self = Self(0x0000_0100);

    // Tangent mode
    pub const TANGENT_AUTO: Self = Self(0x0000_0100);
    pub const TANGENT_TCB: Self = Self(0x0000_0200);
    pub const TANGENT_USER: Self = Self(0x0000_0400);
    pub const TANGENT_GENERIC_BREAK: Self = Self(0x0000_0800);
    pub const TANGENT_BREAK: Self = Self(0x0000_0800 | 0x0000_0400);
    pub const TANGENT_AUTO_BREAK: Self = Self(0x0000_0800 | 0x0000_0100);
    pub const TANGENT_GENERIC_CLAMP: Self = Self(0x0000_1000);
    pub const TANGENT_GENERIC_TIME_INDEPENDENT: Self = Self(0x0000_2000);
    pub const TANGENT_GENERIC_CLAMP_PROGRESSIVE: Self = Self(0x0000_4000 | 0x0000_2000);

    // Weighted mode
    pub const WEIGHTED_NONE: Self = Self(0x0000_0000);
    pub const WEIGHTED_RIGHT: Self = Self(0x0100_0000);
    pub const WEIGHTED_NEXT_LEFT: Self = Self(0x0200_0000);
    pub const WEIGHTED_ALL: Self = Self(0x0100_0000 | 0x0200_0000);

    // Velocity mode
    pub const VELOCITY_RIGHT: Self = Self(0x1000_0000);
    pub const VELOCITY_NEXT_LEFT: Self = Self(0x2000_0000);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw `KeyAttrFlags` entry; the file stores it as a signed int.
    #[inline]
    pub const fn from_i32(bits: i32) -> Self {
        Self(bits as u32)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Every bit of `other` is set. Multi-bit flags need all their bits.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_constant(self) -> bool {
        self.contains(Self::INTERPOLATION_CONSTANT)
    }

    #[inline]
    pub fn is_linear(self) -> bool {
        self.contains(Self::INTERPOLATION_LINEAR)
    }

    #[inline]
    pub fn is_cubic(self) -> bool {
        self.contains(Self::INTERPOLATION_CUBIC)
    }

    #[inline]
    pub fn is_auto(self) -> bool {
        self.contains(Self::TANGENT_AUTO)
    }

    #[inline]
    pub fn is_tcb(self) -> bool {
        self.contains(Self::TANGENT_TCB)
    }

    #[inline]
    pub fn is_user(self) -> bool {
        self.contains(Self::TANGENT_USER)
    }

    #[inline]
    pub fn is_break(self) -> bool {
        self.contains(Self::TANGENT_GENERIC_BREAK)
    }

    #[inline]
    pub fn is_clamp(self) -> bool {
        self.contains(Self::TANGENT_GENERIC_CLAMP)
    }

    #[inline]
    pub fn is_time_independent(self) -> bool {
        self.contains(Self::TANGENT_GENERIC_TIME_INDEPENDENT)
    }

    #[inline]
    pub fn is_clamp_progressive(self) -> bool {
        self.contains(Self::TANGENT_GENERIC_CLAMP_PROGRESSIVE)
    }

    #[inline]
    pub fn is_weighted_right(self) -> bool {
        self.contains(Self::WEIGHTED_RIGHT)
    }

    #[inline]
    pub fn is_weighted_next_left(self) -> bool {
        self.contains(Self::WEIGHTED_NEXT_LEFT)
    }
}

impl std::ops::BitOr for KeyFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for KeyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyFlags(0x{:08x})", self.0)
    }
}

/// Behavior of a curve before its first or after its last key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtrapolationMode {
    #[default]
    Constant,
    Repetition,
    MirrorRepetition,
    KeepSlope,
}

impl ExtrapolationMode {
    /// From the first character of the `Type` child (`C`, `R`, `M`, `K`).
    pub fn from_token(token: &str) -> Self {
        match token.as_bytes().first() {
            Some(b'K') => Self::KeepSlope,
            Some(b'M') => Self::MirrorRepetition,
            Some(b'R') => Self::Repetition,
            _ => Self::Constant,
        }
    }
}

/// Extrapolation of one end of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extrapolation {
    pub mode: ExtrapolationMode,
    /// Repetition count; `-1` when the file does not say.
    pub repetition: i32,
}

impl Default for Extrapolation {
    fn default() -> Self {
        Self { mode: ExtrapolationMode::Constant, repetition: -1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_bit_flags_need_all_bits() {
        let auto = KeyFlags::INTERPOLATION_CUBIC | KeyFlags::TANGENT_AUTO;
        assert!(auto.is_cubic());
        assert!(auto.is_auto());
        assert!(!auto.is_break());
        assert!(!auto.is_user());

        let time_independent = KeyFlags::TANGENT_GENERIC_TIME_INDEPENDENT;
        assert!(time_independent.is_time_independent());
        assert!(!time_independent.is_clamp_progressive());
        assert!(KeyFlags::TANGENT_GENERIC_CLAMP_PROGRESSIVE.is_time_independent());
    }

    #[test]
    fn test_break_contains_user() {
        let user_break = KeyFlags::INTERPOLATION_CUBIC | KeyFlags::TANGENT_BREAK;
        assert!(user_break.is_user());
        assert!(user_break.is_break());
    }

    #[test]
    fn test_from_signed() {
        let f = KeyFlags::from_i32(0x0100_0108);
        assert!(f.is_weighted_right());
        assert!(f.is_cubic());
        assert_eq!(f.bits(), 0x0100_0108);
    }

    #[test]
    fn test_extrapolation_tokens() {
        assert_eq!(ExtrapolationMode::from_token("KeepSlope"), ExtrapolationMode::KeepSlope);
        assert_eq!(ExtrapolationMode::from_token("M"), ExtrapolationMode::MirrorRepetition);
        assert_eq!(ExtrapolationMode::from_token("R"), ExtrapolationMode::Repetition);
        assert_eq!(ExtrapolationMode::from_token(""), ExtrapolationMode::Constant);
        assert_eq!(Extrapolation::default().repetition, -1);
    }
}
