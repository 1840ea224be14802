//! Debug-only precondition checks.
//!
//! These catch misuse during development. In release builds every check
//! compiles to nothing, so call sites stay identical across configurations.

/// Asserts a precondition in debug builds only.
///
/// ```rust,ignore
/// strata::debug_check!(opacity.is_finite(), "opacity must be finite, got {opacity}");
/// ```
#[macro_export]
macro_rules! debug_check {
    ($cond:expr $(,)?) => {
        debug_assert!($cond)
    };
    ($cond:expr, $($arg:tt)+) => {
        debug_assert!($cond, $($arg)+)
    };
}

/// Checks that `value` lies in `[min, max]`.
#[inline]
pub fn check_range(value: f32, min: f32, max: f32, name: &str) {
    crate::debug_check!(
        (min..=max).contains(&value),
        "{name} out of range: {value} not in [{min}, {max}]"
    );
}

/// Checks that a float is neither NaN nor infinite.
#[inline]
pub fn check_finite(value: f32, name: &str) {
    crate::debug_check!(value.is_finite(), "{name} must be finite, got {value}");
}

/// Checks that a string is not empty.
#[inline]
pub fn check_not_empty(value: &str, name: &str) {
    crate::debug_check!(!value.is_empty(), "{name} must not be empty");
}
