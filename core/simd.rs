use crate::{macros::vocabulary, set::Set};

vocabulary! {
    /// SIMD floating-point exception.
    pub enum SimdException(SimdException) {
        Invalid = "IE",
        Denormal = "DE",
        DivideByZero = "ZE",
        Overflow = "OE",
        Underflow = "UE",
        Precision = "PE",
    }
}

pub type SimdExceptions = Set<SimdException>;
