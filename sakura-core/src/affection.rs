//! Affection tally and per-choice deltas.
//!
//! The tally always holds exactly one score per [`CharacterId`]; it is a
//! struct rather than a map so the key set cannot drift. Scores have no
//! floor or ceiling, but additions saturate at the `i32` range instead of
//! overflowing.

use serde::{Deserialize, Serialize};

use crate::roster::CharacterId;

/// Running affection score for each heroine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affection {
    pub yuki: i32,
    pub haruka: i32,
    pub aoi: i32,
}

impl Affection {
    /// All scores zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CharacterId) -> i32 {
        match id {
            CharacterId::Yuki => self.yuki,
            CharacterId::Haruka => self.haruka,
            CharacterId::Aoi => self.aoi,
        }
    }

    fn slot(&mut self, id: CharacterId) -> &mut i32 {
        match id {
            CharacterId::Yuki => &mut self.yuki,
            CharacterId::Haruka => &mut self.haruka,
            CharacterId::Aoi => &mut self.aoi,
        }
    }

    /// Add `amount` to one character's score.
    pub fn add(&mut self, id: CharacterId, amount: i32) {
        let slot = self.slot(id);
        *slot = slot.saturating_add(amount);
    }

    /// Add every entry of a delta; omitted keys contribute nothing.
    pub fn apply(&mut self, delta: &AffectionDelta) {
        for id in CharacterId::ALL {
            self.add(id, delta.get(id));
        }
    }

    /// The tally after applying `delta`, leaving `self` untouched.
    pub fn applied(mut self, delta: &AffectionDelta) -> Self {
        self.apply(delta);
        self
    }

    /// Scores in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (CharacterId, i32)> + '_ {
        CharacterId::ALL.into_iter().map(|id| (id, self.get(id)))
    }

    /// The character with the strictly greatest score.
    ///
    /// Ties go to whichever tied character comes first in roster order
    /// (`yuki`, `haruka`, `aoi`).
    pub fn favorite(&self) -> CharacterId {
        let mut best = CharacterId::ALL[0];
        for id in CharacterId::ALL.into_iter().skip(1) {
            if self.get(id) > self.get(best) {
                best = id;
            }
        }
        best
    }
}

/// Partial affection change attached to a choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectionDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yuki: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haruka: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi: Option<i32>,
}

impl AffectionDelta {
    /// A delta that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// A delta for a single character.
    pub fn single(id: CharacterId, amount: i32) -> Self {
        Self::none().with(id, amount)
    }

    /// Set one character's change.
    pub fn with(mut self, id: CharacterId, amount: i32) -> Self {
        match id {
            CharacterId::Yuki => self.yuki = Some(amount),
            CharacterId::Haruka => self.haruka = Some(amount),
            CharacterId::Aoi => self.aoi = Some(amount),
        }
        self
    }

    /// Change for one character, zero when omitted.
    pub fn get(&self, id: CharacterId) -> i32 {
        match id {
            CharacterId::Yuki => self.yuki,
            CharacterId::Haruka => self.haruka,
            CharacterId::Aoi => self.aoi,
        }
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        CharacterId::ALL.into_iter().all(|id| self.get(id) == 0)
    }
}
