use std::ops::{AddAssign, SubAssign};

/// A time value split into its whole part and fractional remainder.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FixedTime {
    whole: i32,
    frac: f32,
}

impl FixedTime {
    pub fn new(t: f32) -> Self {
        let whole = t as i32;
        Self { whole, frac: t - whole as f32 }
    }

    pub fn whole(self) -> i32 {
        self.whole
    }

    pub fn frac(self) -> f32 {
        self.frac
    }

    pub fn as_f32(self) -> f32 {
        self.whole as f32 + self.frac
    }
}

impl From<f32> for FixedTime {
    fn from(t: f32) -> Self {
        Self::new(t)
    }
}

impl From<FixedTime> for f32 {
    fn from(t: FixedTime) -> Self {
        t.as_f32()
    }
}

impl AddAssign<f32> for FixedTime {
    fn add_assign(&mut self, rhs: f32) {
        *self = Self::new(self.as_f32() + rhs);
    }
}

impl SubAssign<f32> for FixedTime {
    fn sub_assign(&mut self, rhs: f32) {
        *self = Self::new(self.as_f32() - rhs);
    }
}
