/*!
    Rational number type for frame rates and time bases.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for frame rates (e.g., 30000/1001 for 29.97 fps) and for the
    frame-interval time base derived from them.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        Convert to f64.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Invert the rational (swap numerator and denominator).

        A frame rate inverted this way is the duration of one frame.

        # Panics

        Panics if numerator is zero.
    */
    #[inline]
    pub const fn invert(self) -> Self {
        assert!(self.num != 0, "cannot invert zero");
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Returns true if both numerator and denominator are positive.

        Frame rates must satisfy this before a [`crate::Session`] will
        accept them.
    */
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /**
        Rescale `value` from this time base into `target`, rounding half
        away from zero.

        This is the rounding FFmpeg's `av_rescale_q` applies by default,
        and the session buffer sizing depends on it: one frame interval at
        30 fps is exactly 1470 samples at 44100 Hz, while 29.97 fps rounds
        1471.47 samples up to 1471.
    */
    pub fn rescale(self, value: i64, target: Rational) -> i64 {
        let num = value * self.num as i64 * target.den as i64;
        let den = self.den as i64 * target.num as i64;
        if num >= 0 {
            (num + den / 2) / den
        } else {
            (num - den / 2) / den
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rational() {
        let r = Rational::new(30000, 1001);
        assert_eq!(r.num, 30000);
        assert_eq!(r.den, 1001);
    }

    #[test]
    #[should_panic(expected = "denominator cannot be zero")]
    fn zero_denominator_panics() {
        Rational::new(1, 0);
    }

    #[test]
    fn to_f64_conversion() {
        assert_eq!(Rational::new(1, 2).to_f64(), 0.5);
        assert_eq!(Rational::new(30000, 1001).to_f64(), 30000.0 / 1001.0);
    }

    #[test]
    fn invert() {
        let r = Rational::new(30, 1);
        let inv = r.invert();
        assert_eq!(inv.num, 1);
        assert_eq!(inv.den, 30);
    }

    #[test]
    fn is_positive() {
        assert!(Rational::new(30, 1).is_positive());
        assert!(!Rational::new(-30, 1).is_positive());
        assert!(!Rational::new(0, 1).is_positive());
        assert!(!Rational::new(30, -1).is_positive());
    }

    #[test]
    fn rescale_exact() {
        // One frame interval at 30 fps in a 1/44100 time base
        let interval = Rational::new(1, 30);
        assert_eq!(interval.rescale(1, Rational::new(1, 44100)), 1470);
    }

    #[test]
    fn rescale_rounds_to_nearest() {
        // 29.97 fps: 44100 * 1001 / 30000 = 1471.47 -> 1471
        let interval = Rational::new(1001, 30000);
        assert_eq!(interval.rescale(1, Rational::new(1, 44100)), 1471);
        // 24 fps: 1837.5 rounds away from zero -> 1838
        let interval = Rational::new(1, 24);
        assert_eq!(interval.rescale(1, Rational::new(1, 44100)), 1838);
    }

    #[test]
    fn rescale_negative() {
        let tb = Rational::new(1, 10);
        assert_eq!(tb.rescale(-25, Rational::new(1, 2)), -5);
    }

    #[test]
    fn from_tuple_and_i32() {
        let r: Rational = (25, 1).into();
        assert_eq!(r, Rational::new(25, 1));
        let r: Rational = 30.into();
        assert_eq!(r, Rational::new(30, 1));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Rational::new(30000, 1001)), "30000/1001");
    }
}
