//! Render pass identifiers and the engine-wide pass order.

use std::fmt;

use smallvec::SmallVec;

use crate::core::interner::{self, Symbol};

pub const OPAQUE: &str = "opaque";
pub const TRANSPARENT: &str = "transparent";
pub const LINE: &str = "line";
pub const POST_PROCESS: &str = "post_process";

/// Opacity at or above which content is drawn in the opaque pass.
pub const OPAQUE_THRESHOLD: f32 = 1.0 - crate::core::math::EQUALITY_TOLERANCE;

/// Interned pass name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(Symbol);

impl PassId {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(interner::intern(name))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        interner::resolve(self.0)
    }

    #[must_use]
    pub fn opaque() -> Self {
        Self::new(OPAQUE)
    }

    #[must_use]
    pub fn transparent() -> Self {
        Self::new(TRANSPARENT)
    }

    #[must_use]
    pub fn line() -> Self {
        Self::new(LINE)
    }

    #[must_use]
    pub fn post_process() -> Self {
        Self::new(POST_PROCESS)
    }

    /// Opaque or transparent, depending on `opacity`.
    #[must_use]
    pub fn for_opacity(opacity: f32) -> Self {
        if opacity >= OPAQUE_THRESHOLD {
            Self::opaque()
        } else {
            Self::transparent()
        }
    }
}

impl fmt::Debug for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pass({})", self.name())
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed order in which passes are rendered within a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct PassOrder {
    passes: SmallVec<[PassId; 8]>,
}

impl Default for PassOrder {
    fn default() -> Self {
        Self::from_names([OPAQUE, TRANSPARENT, LINE, POST_PROCESS])
    }
}

impl PassOrder {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            passes: names.into_iter().map(PassId::new).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = PassId> + '_ {
        self.passes.iter().copied()
    }

    #[must_use]
    pub fn position(&self, pass: PassId) -> Option<usize> {
        self.passes.iter().position(|p| *p == pass)
    }

    #[must_use]
    pub fn contains(&self, pass: PassId) -> bool {
        self.passes.contains(&pass)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_selects_pass() {
        assert_eq!(PassId::for_opacity(1.0), PassId::opaque());
        assert_eq!(PassId::for_opacity(0.5), PassId::transparent());
        assert_eq!(PassId::for_opacity(0.0), PassId::transparent());
    }

    #[test]
    fn default_order() {
        let order = PassOrder::default();
        assert_eq!(order.position(PassId::opaque()), Some(0));
        assert_eq!(order.position(PassId::post_process()), Some(3));
        assert!(!order.contains(PassId::new("shadow")));
    }
}
