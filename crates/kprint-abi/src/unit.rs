use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::console::{self, Console};

/// Linear identity of an execution unit inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnitId(pub u32);

impl UnitId {
    /// The unit that prints under leader-only emission.
    pub const LEADER: UnitId = UnitId(0);

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_leader(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for UnitId {
    fn from(id: u32) -> Self {
        UnitId(id)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-bit set of unit identities allowed to print under masked emission.
///
/// Serializes as the plain integer, so configs can carry a default mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask(pub u32);

impl Mask {
    pub const ALL: Mask = Mask(u32::MAX);
    pub const NONE: Mask = Mask(0);
    /// Number of identities a mask can address.
    pub const WIDTH: u32 = u32::BITS;

    /// Identities at or beyond `WIDTH` are never selected.
    #[inline]
    pub fn contains(self, unit: UnitId) -> bool {
        1u32.checked_shl(unit.0).map_or(false, |bit| bit & self.0 != 0)
    }

    pub fn with(self, unit: UnitId) -> Mask {
        Mask(self.0 | 1u32.checked_shl(unit.0).unwrap_or(0))
    }

    pub fn from_units<I>(units: I) -> Mask
    where
        I: IntoIterator<Item = UnitId>,
    {
        units.into_iter().fold(Mask::NONE, Mask::with)
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:b}", self.0)
    }
}

/// Accepts `0b…`, `0x…` or plain decimal.
impl FromStr for Mask {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().replace('_', "");
        let bits = if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
            u32::from_str_radix(bin, 2)?
        } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16)?
        } else {
            s.parse::<u32>()?
        };
        Ok(Mask(bits))
    }
}

/// Capability a substrate exposes to the unit that is currently executing.
///
/// Native-parallel substrates answer from ambient per-thread state
/// ([`crate::AmbientUnit`]); emulated substrates hand each unit an explicit
/// value implementing this trait.
pub trait ExecutionUnit {
    fn unit_id(&self) -> UnitId;

    fn group_size(&self) -> u32;

    /// Hand one fully formatted block to the substrate's console.
    fn write_console(&self, block: &[u8]);
}

impl<T> ExecutionUnit for &T
where
    T: ExecutionUnit + ?Sized,
{
    fn unit_id(&self) -> UnitId {
        (**self).unit_id()
    }

    fn group_size(&self) -> u32 {
        (**self).group_size()
    }

    fn write_console(&self, block: &[u8]) {
        (**self).write_console(block)
    }
}

/// Fixed single-unit context: identity 0 in a group of one, printing to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloUnit;

impl ExecutionUnit for SoloUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::LEADER
    }

    fn group_size(&self) -> u32 {
        1
    }

    fn write_console(&self, block: &[u8]) {
        console::stdout().write_block(UnitId::LEADER, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mask_selects_set_bits_only() {
        let mask = Mask(0b0101);
        let selected: Vec<u32> = (0..4).filter(|&i| mask.contains(UnitId(i))).collect();
        assert_eq!(selected, vec![0, 2]);
    }

    #[test]
    fn mask_ignores_identities_past_width() {
        assert!(Mask::ALL.contains(UnitId(31)));
        assert!(!Mask::ALL.contains(UnitId(32)));
        assert!(!Mask::ALL.contains(UnitId(u32::MAX)));
        assert_eq!(Mask::NONE.with(UnitId(40)), Mask::NONE);
    }

    #[test]
    fn mask_from_units_and_parse() {
        let mask = Mask::from_units([UnitId(0), UnitId(2)]);
        assert_eq!(mask, Mask(0b0101));
        assert_eq!(mask.count(), 2);
        assert_eq!("0b0101".parse::<Mask>().unwrap(), mask);
        assert_eq!("0x5".parse::<Mask>().unwrap(), mask);
        assert_eq!("5".parse::<Mask>().unwrap(), mask);
        assert_eq!("0b1111_0000".parse::<Mask>().unwrap(), Mask(0xF0));
        assert!("0b2".parse::<Mask>().is_err());
        assert_eq!(mask.to_string(), "0b101");
    }

    #[test]
    fn solo_unit_is_a_group_of_one_leader() {
        assert_eq!(SoloUnit.unit_id(), UnitId::LEADER);
        assert_eq!(SoloUnit.group_size(), 1);
        assert!(SoloUnit.unit_id().is_leader());
    }
}
