//! Render modes, their fixed state bundles and the re-entry policy.
//!
//! Each mode owns one blend/depth pair out of a static table; sprites own
//! two depth variants since depth testing is chosen per call. Vertex
//! attribute usage per mode is part of the same description so that the
//! render state only has to walk it.

use crate::state::{BlendState, DepthState};

/// Number of vertex attribute slots any mode touches.
pub const MODE_ATTRIB_SLOTS: usize = 3;

/// The active rendering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Clean state after a reset, nothing bound on purpose.
    #[default]
    Unknown,
    /// Opaque chunk faces.
    ChunkPass1,
    /// Second chunk pass drawn over the first.
    ChunkPass2,
    Lines,
    /// 2D or billboarded sprites from an arbitrary atlas.
    Sprites,
}

/// What entering a mode does when that mode is already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reentry {
    /// Nothing: the bound state is already correct.
    Skip,
    /// Re-apply everything. Sprite entry takes an atlas and a depth flag that
    /// may differ between calls, so an active sprite mode proves nothing.
    Reapply,
}

/// Outcome of requesting a mode while another one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Skip,
    Enter,
}

/// Blend and depth state applied on entry to a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateBundle {
    pub blend: BlendState,
    pub depth: DepthState,
}

const DEPTH_DISABLED_SPRITES: DepthState = DepthState {
    depth_test_enabled: false,
    ..DepthState::LESS_EQUAL
};

const CHUNK_PASS1: usize = 0;
const CHUNK_PASS2: usize = 1;
const LINES: usize = 2;
const SPRITES_DEPTH_ENABLED: usize = 3;
const SPRITES_DEPTH_DISABLED: usize = 4;

/// Every state bundle, built at compile time and never mutated.
pub static STATE_BUNDLES: [StateBundle; 5] = [
    // CHUNK_PASS1
    StateBundle {
        blend: BlendState::DEFAULT,
        depth: DepthState::LESS_EQUAL,
    },
    // CHUNK_PASS2
    StateBundle {
        blend: BlendState::DEFAULT,
        depth: DepthState::LESS_EQUAL,
    },
    // LINES
    StateBundle {
        blend: BlendState::DEFAULT,
        depth: DepthState::LESS_EQUAL,
    },
    // SPRITES_DEPTH_ENABLED
    StateBundle {
        blend: BlendState::DEFAULT,
        depth: DepthState::LESS_EQUAL,
    },
    // SPRITES_DEPTH_DISABLED
    StateBundle {
        blend: BlendState::DEFAULT,
        depth: DEPTH_DISABLED_SPRITES,
    },
];

impl Mode {
    pub const fn reentry(self) -> Reentry {
        match self {
            Mode::Sprites => Reentry::Reapply,
            Mode::Unknown | Mode::ChunkPass1 | Mode::ChunkPass2 | Mode::Lines => Reentry::Skip,
        }
    }

    /// Decides whether moving from `self` to `requested` touches the GPU.
    pub fn transition(self, requested: Mode) -> Transition {
        match (self == requested, requested.reentry()) {
            (true, Reentry::Skip) => Transition::Skip,
            (true, Reentry::Reapply) | (false, _) => Transition::Enter,
        }
    }

    /// The bundle applied on entry. `depth_test` only matters for sprites;
    /// [`Mode::Unknown`] has no bundle.
    pub fn bundle(self, depth_test: bool) -> Option<&'static StateBundle> {
        let index = match self {
            Mode::Unknown => return None,
            Mode::ChunkPass1 => CHUNK_PASS1,
            Mode::ChunkPass2 => CHUNK_PASS2,
            Mode::Lines => LINES,
            Mode::Sprites if depth_test => SPRITES_DEPTH_ENABLED,
            Mode::Sprites => SPRITES_DEPTH_DISABLED,
        };
        Some(&STATE_BUNDLES[index])
    }

    /// Vertex attribute slots the mode's vertex layout uses. Slots marked
    /// `false` are explicitly disabled on entry.
    pub const fn attribs(self) -> [bool; MODE_ATTRIB_SLOTS] {
        match self {
            Mode::Unknown => [false; MODE_ATTRIB_SLOTS],
            Mode::Lines => [true, true, false],
            Mode::ChunkPass1 | Mode::ChunkPass2 | Mode::Sprites => [true; MODE_ATTRIB_SLOTS],
        }
    }
}
