//! Element types that can travel through a demodulation chain.
//!
//! Every buffer is tagged with a `SampleType`, and stages check the tag of an
//! incoming configuration against the type they were instantiated with. The
//! `Sample` and `Scalar` traits are sealed: only the primitive numeric types
//! listed in `ScalarType` (and `Complex` of those) can be stored in a
//! `Buffer`, which is what allows the buffer to hand out typed views of its
//! raw storage.

use num::Complex;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The real scalar types supported by the stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    U8,
    S8,
    U16,
    S16,
    S32,
    F32,
    F64,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ScalarType::U8 => "u8",
            ScalarType::S8 => "s8",
            ScalarType::U16 => "u16",
            ScalarType::S16 => "s16",
            ScalarType::S32 => "s32",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// Type identifier of a buffer element. A complex sample of some scalar has
/// a different identifier than the scalar itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Real(ScalarType),
    Complex(ScalarType),
}

impl SampleType {
    /// Returns the underlying scalar type.
    pub fn scalar(&self) -> ScalarType {
        match *self {
            SampleType::Real(s) | SampleType::Complex(s) => s,
        }
    }

    pub fn is_complex(&self) -> bool {
        match *self {
            SampleType::Complex(_) => true,
            SampleType::Real(_) => false,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SampleType::Real(s) => write!(f, "{}", s),
            SampleType::Complex(s) => write!(f, "c{}", s),
        }
    }
}

mod private {
    pub trait Sealed {}
}

/// A plain-old-data value that can be stored in a `Buffer`.
///
/// Implementors are `Copy`, valid for the all-zero bit pattern and aligned to
/// at most 8 bytes. The trait is sealed so that these guarantees hold.
pub trait Sample: Copy + Default + fmt::Debug + PartialEq + 'static + private::Sealed {
    /// Type identifier carried in configuration descriptors.
    const TYPE: SampleType;
}

/// A real scalar that stages can be instantiated with.
pub trait Scalar: Sample + Num + PartialOrd + fmt::Display {
    const SCALAR: ScalarType;

    /// Computation type wide enough that adding two scalars cannot overflow.
    type Wide: Num + Copy;

    fn widen(self) -> Self::Wide;

    /// Converts back from the wide type. The value must be in range.
    fn narrow(wide: Self::Wide) -> Self;

    fn as_f64(self) -> f64;

    /// Converts from `f64`, saturating at the bounds of integer types.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty => $id:ident, $wide:ty;)*) => {
        $(
            impl private::Sealed for $t {}

            impl Sample for $t {
                const TYPE: SampleType = SampleType::Real(ScalarType::$id);
            }

            impl Scalar for $t {
                const SCALAR: ScalarType = ScalarType::$id;
                type Wide = $wide;

                #[inline]
                fn widen(self) -> $wide {
                    self as $wide
                }

                #[inline]
                fn narrow(wide: $wide) -> Self {
                    wide as $t
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_scalar! {
    u8 => U8, u16;
    i8 => S8, i16;
    u16 => U16, u32;
    i16 => S16, i32;
    i32 => S32, i64;
    f32 => F32, f32;
    f64 => F64, f64;
}

impl<S: Scalar> private::Sealed for Complex<S> {}

impl<S: Scalar> Sample for Complex<S> {
    const TYPE: SampleType = SampleType::Complex(S::SCALAR);
}
