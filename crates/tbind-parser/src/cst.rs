//! Rowan-based concrete syntax tree types.
//!
//! `HostLanguage` connects [`SyntaxKind`] to rowan's generic tree types.

use crate::syntax_kind::SyntaxKind;

/// Marker type for the host language in rowan's generic tree system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostLanguage {}

impl rowan::Language for HostLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::STEP_LIST as u16);
        // Safety: SyntaxKind is #[repr(u16)] with contiguous discriminants
        // starting at zero, and the range was checked above.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<HostLanguage>;

pub type SyntaxToken = rowan::SyntaxToken<HostLanguage>;

pub type SyntaxElement = rowan::SyntaxElement<HostLanguage>;
