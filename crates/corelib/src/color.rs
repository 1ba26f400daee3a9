use std::fmt;

use crate::error::{LoadError, LoadResult};

/// Skin color selection, always within `0..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinColor(u8);

impl SkinColor {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 6;

    pub const ALL: [SkinColor; 7] = [
        SkinColor(0),
        SkinColor(1),
        SkinColor(2),
        SkinColor(3),
        SkinColor(4),
        SkinColor(5),
        SkinColor(6),
    ];

    /// Validate a raw color selection.
    pub fn new(color: i64) -> LoadResult<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&color) {
            Ok(SkinColor(color as u8))
        } else {
            Err(LoadError::InvalidArgument { color })
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SkinColor {
    type Error = LoadError;

    fn try_from(value: i64) -> LoadResult<Self> {
        Self::new(value)
    }
}

impl fmt::Display for SkinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_closed_range() {
        for c in 0..=6 {
            assert_eq!(SkinColor::new(c).unwrap().index() as i64, c);
        }
        assert_eq!(SkinColor::ALL.len(), 7);
    }

    #[test]
    fn rejects_out_of_range() {
        for c in [-100, -1, 7, 8, 255, i64::MAX, i64::MIN] {
            match SkinColor::new(c) {
                Err(LoadError::InvalidArgument { color }) => assert_eq!(color, c),
                other => panic!("expected InvalidArgument for {c}, got {other:?}"),
            }
        }
    }
}
