//! Universal "not yet set" markers for scalar kinds.
//!
//! Generated code passes [`Sentinel::SENTINEL`] as the engine fallback and
//! treats a decoded sentinel as an absent key. The markers are reserved:
//! storing one of them reads back as absent.

pub trait Sentinel: Copy {
    const SENTINEL: Self;

    fn is_sentinel(self) -> bool;
}

impl Sentinel for i32 {
    const SENTINEL: Self = i32::MIN;

    fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

impl Sentinel for i64 {
    const SENTINEL: Self = i64::MIN;

    fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

// Quiet NaNs with a fixed payload; compared bitwise.
impl Sentinel for f32 {
    const SENTINEL: Self = f32::from_bits(0x7fc5_5a5a);

    fn is_sentinel(self) -> bool {
        self.to_bits() == Self::SENTINEL.to_bits()
    }
}

impl Sentinel for f64 {
    const SENTINEL: Self = f64::from_bits(0x7ff8_5a5a_5a5a_5a5a);

    fn is_sentinel(self) -> bool {
        self.to_bits() == Self::SENTINEL.to_bits()
    }
}

pub fn sentinel<T: Sentinel>() -> T {
    T::SENTINEL
}

pub fn is_sentinel<T: Sentinel>(value: T) -> bool {
    value.is_sentinel()
}
