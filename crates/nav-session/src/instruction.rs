//! Exactly-once banner delivery.

use nav_route::{BannerInstruction, VoiceInstruction};

/// The most recently surfaced banner and the index the engine gave it.
#[derive(Clone, Debug, PartialEq)]
pub struct LatestInstructionWrapper {
    pub index:  u32,
    pub banner: BannerInstruction,
}

/// Latest banner wrapper and last voice instruction, captured before an
/// async operation so that its completion can invalidate exactly these.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstructionSnapshot {
    pub banner: Option<LatestInstructionWrapper>,
    pub voice:  Option<VoiceInstruction>,
}

/// Decides whether a banner candidate is new.
///
/// A banner triggers when it differs by value from the latest surfaced one.
/// Repeats of the same payload never re-trigger until something else is
/// surfaced or the latest wrapper is invalidated.
#[derive(Clone, Debug, Default)]
pub struct InstructionDeduper {
    current: Option<BannerInstruction>,
    latest:  Option<LatestInstructionWrapper>,
}

impl InstructionDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `candidate` as the current banner and report whether it should
    /// be delivered.
    ///
    /// A candidate without an index is recorded but never delivered.
    pub fn evaluate(&mut self, candidate: Option<BannerInstruction>, index: Option<u32>) -> bool {
        self.current = candidate;
        let (Some(banner), Some(index)) = (self.current.as_ref(), index) else {
            return false;
        };
        if self.latest.as_ref().is_some_and(|w| w.banner == *banner) {
            return false;
        }
        self.latest = Some(LatestInstructionWrapper { index, banner: banner.clone() });
        true
    }

    /// The candidate seen on the last `evaluate` call.
    pub fn current(&self) -> Option<&BannerInstruction> {
        self.current.as_ref()
    }

    pub fn latest(&self) -> Option<&LatestInstructionWrapper> {
        self.latest.as_ref()
    }

    /// Clear the latest wrapper if it still equals `expected`.
    ///
    /// A stale `expected` (superseded since it was captured) leaves the
    /// newer wrapper in place.  Returns whether anything was cleared.
    pub fn invalidate(&mut self, expected: Option<&LatestInstructionWrapper>) -> bool {
        if expected.is_some() && self.latest.as_ref() == expected {
            self.latest = None;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.latest = None;
    }
}
