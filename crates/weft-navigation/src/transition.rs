//! Page transition types
//!
//! How the user arrived at a page: a core type plus a set of qualifier bits.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionType {
    /// Followed a link
    Link,
    /// Typed in the location bar
    Typed,
    /// Picked from a bookmark or suggestion
    AutoBookmark,
    /// Subframe load the user did not ask for
    AutoSubframe,
    /// Subframe load the user asked for (e.g. clicked inside a frame)
    ManualSubframe,
    /// Generated by the location bar (e.g. a search suggestion)
    Generated,
    /// Start page on launch
    StartPage,
    FormSubmit,
    Reload,
    /// Search keyword typed in the location bar
    Keyword,
}

impl TransitionType {
    fn code(self) -> u32 {
        match self {
            Self::Link => 0,
            Self::Typed => 1,
            Self::AutoBookmark => 2,
            Self::AutoSubframe => 3,
            Self::ManualSubframe => 4,
            Self::Generated => 5,
            Self::StartPage => 6,
            Self::FormSubmit => 7,
            Self::Reload => 8,
            Self::Keyword => 9,
        }
    }

    fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Link,
            1 => Self::Typed,
            2 => Self::AutoBookmark,
            3 => Self::AutoSubframe,
            4 => Self::ManualSubframe,
            5 => Self::Generated,
            6 => Self::StartPage,
            7 => Self::FormSubmit,
            8 => Self::Reload,
            9 => Self::Keyword,
            _ => return None,
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TransitionQualifiers: u32 {
        const FORWARD_BACK     = 0x0100_0000;
        const FROM_ADDRESS_BAR = 0x0200_0000;
        const HOME_PAGE        = 0x0400_0000;
        const CHAIN_START      = 0x1000_0000;
        const CHAIN_END        = 0x2000_0000;
        const CLIENT_REDIRECT  = 0x4000_0000;
        const SERVER_REDIRECT  = 0x8000_0000;
    }
}

const CORE_MASK: u32 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageTransition {
    pub core: TransitionType,
    pub qualifiers: TransitionQualifiers,
}

impl PageTransition {
    pub fn new(core: TransitionType) -> Self {
        Self {
            core,
            qualifiers: TransitionQualifiers::empty(),
        }
    }

    pub fn with(mut self, qualifiers: TransitionQualifiers) -> Self {
        self.qualifiers |= qualifiers;
        self
    }

    /// The transition without its qualifiers.
    pub fn strip_qualifier(self) -> TransitionType {
        self.core
    }

    pub fn is_main_frame(self) -> bool {
        !matches!(
            self.core,
            TransitionType::AutoSubframe | TransitionType::ManualSubframe
        )
    }

    pub fn is_form_submit(self) -> bool {
        self.core == TransitionType::FormSubmit
    }

    pub fn is_redirect(self) -> bool {
        self.qualifiers
            .intersects(TransitionQualifiers::CLIENT_REDIRECT | TransitionQualifiers::SERVER_REDIRECT)
    }

    pub fn is_forward_back(self) -> bool {
        self.qualifiers.contains(TransitionQualifiers::FORWARD_BACK)
    }

    /// Packed form used by the history store.
    pub fn bits(self) -> u32 {
        self.core.code() | self.qualifiers.bits()
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(Self {
            core: TransitionType::from_code(bits & CORE_MASK)?,
            qualifiers: TransitionQualifiers::from_bits_truncate(bits & !CORE_MASK),
        })
    }
}

impl Default for PageTransition {
    fn default() -> Self {
        Self::new(TransitionType::Link)
    }
}

impl From<TransitionType> for PageTransition {
    fn from(core: TransitionType) -> Self {
        Self::new(core)
    }
}
