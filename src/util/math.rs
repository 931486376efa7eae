use crate::sample::Scalar;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Approximates `atan2(y, x)` in radians with a first order correction of
/// the `z * pi/4` line. The absolute error stays below 0.005 rad, which is
/// well under the resolution of the integer outputs it feeds.
///
/// # Examples
///
/// ```
/// use comms_demod::util::math::fast_atan2;
///
/// let angle = fast_atan2(1.0, -1.0);
/// assert!((angle - 3.0 * std::f32::consts::FRAC_PI_4).abs() < 5e-3);
/// ```
pub fn fast_atan2(y: f32, x: f32) -> f32 {
    fn fast_atan(z: f32) -> f32 {
        z * (FRAC_PI_4 + 0.273 * (1.0 - z.abs()))
    }

    if x == 0.0 {
        return if y > 0.0 {
            FRAC_PI_2
        } else if y < 0.0 {
            -FRAC_PI_2
        } else {
            0.0
        };
    }

    if y.abs() <= x.abs() {
        let base = fast_atan(y / x);
        if x > 0.0 {
            base
        } else if y >= 0.0 {
            base + PI
        } else {
            base - PI
        }
    } else {
        let base = fast_atan(x / y);
        if y > 0.0 {
            FRAC_PI_2 - base
        } else {
            -FRAC_PI_2 - base
        }
    }
}

/// Output types of the FM discriminator.
///
/// Floating point outputs carry the angle in radians. Signed integer outputs
/// are fixed point, with pi mapped to the largest value of the type.
pub trait PhaseScalar: Scalar {
    /// The angle of `re + j*im`.
    fn angle(re: f64, im: f64) -> Self;
}

impl PhaseScalar for f32 {
    fn angle(re: f64, im: f64) -> Self {
        (im as f32).atan2(re as f32)
    }
}

impl PhaseScalar for f64 {
    fn angle(re: f64, im: f64) -> Self {
        im.atan2(re)
    }
}

macro_rules! impl_fixed_phase {
    ($($t:ty),*) => {
        $(
            impl PhaseScalar for $t {
                fn angle(re: f64, im: f64) -> Self {
                    let scale = <$t>::max_value() as f32 / PI;
                    (fast_atan2(im as f32, re as f32) * scale) as $t
                }
            }
        )*
    };
}

impl_fixed_phase!(i8, i16, i32);
