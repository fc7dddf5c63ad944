use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use stagehand_formats::{SplineFile, StageGeometry, Vec3};

use crate::request::LevelId;

/// Slots in a custom texture list.
pub const TEXTURE_SLOT_CAPACITY: usize = 256;
/// The host renderer rejects lists longer than this.
pub const HOST_TEXTURE_CEILING: usize = 500;

const _: () = assert!(TEXTURE_SLOT_CAPACITY <= HOST_TEXTURE_CEILING);

/// Renderer slot every custom stage publishes its texture list into.
pub const CUSTOM_STAGE_TEXLIST_SLOT: &str = "texlist_stg_custom";

/// The host's currently tracked player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CharacterId(pub i32);

impl CharacterId {
    pub const DEFAULT: CharacterId = CharacterId(0);
}

/// Host game-state word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    Ingame,
    NormalRestart,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TextureSlot {
    pub name: Option<String>,
    pub handle: u32,
}

/// Fixed-capacity texture slot table. Slots start zeroed; the host's texture
/// streaming fills them after a stage installs.
#[derive(Debug)]
pub struct TextureList {
    slots: RefCell<Vec<TextureSlot>>,
}

impl Default for TextureList {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureList {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(vec![TextureSlot::default(); TEXTURE_SLOT_CAPACITY]),
        }
    }

    pub fn capacity(&self) -> usize {
        TEXTURE_SLOT_CAPACITY
    }

    /// Assigns names to slots in order, stopping at capacity. Returns how
    /// many slots were filled.
    pub fn fill(&self, names: impl Iterator<Item = String>) -> usize {
        let mut slots = self.slots.borrow_mut();
        let mut filled = 0;
        for (slot, name) in slots.iter_mut().zip(names) {
            slot.name = Some(name);
            slot.handle = filled as u32 + 1;
            filled += 1;
        }
        filled
    }

    pub fn filled_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.name.is_some())
            .count()
    }

    pub fn slot_name(&self, index: usize) -> Option<String> {
        self.slots
            .borrow()
            .get(index)
            .and_then(|slot| slot.name.clone())
    }
}

/// In-memory stage descriptor occupying a pre-allocated host slot. Installing
/// a custom stage overwrites the slot value; host code keeps referencing the
/// slot itself, so clones share geometry and texture data.
#[derive(Debug, Clone, Default)]
pub struct LandTable {
    pub geometry: Option<Rc<StageGeometry>>,
    pub texture_archive: Option<String>,
    pub texture_list: Option<Rc<TextureList>>,
}

impl LandTable {
    pub fn is_custom(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.geometry
            .as_ref()
            .map(|geometry| geometry.chunks.len())
            .unwrap_or(0)
    }
}

/// One spawn-table entry. The same position backs the single-player slot and
/// both multiplayer slots; rotations stay zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnRecord {
    pub level: LevelId,
    pub rotations: [i32; 3],
    pub positions: [Vec3; 3],
}

impl SpawnRecord {
    pub fn at(level: LevelId, position: Vec3) -> Self {
        Self {
            level,
            rotations: [0; 3],
            positions: [position; 3],
        }
    }
}

/// Ordered guided-path group handed to the host path subsystem.
#[derive(Debug, Clone, Default)]
pub struct SplineSet {
    pub paths: Vec<Rc<SplineFile>>,
}

impl SplineSet {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.paths.iter().map(|path| path.points.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_list_fill_stops_at_capacity() {
        let list = TextureList::new();
        let names = (0..TEXTURE_SLOT_CAPACITY + 40).map(|index| format!("tex{index}"));
        let filled = list.fill(names);
        assert_eq!(filled, TEXTURE_SLOT_CAPACITY);
        assert_eq!(list.filled_count(), TEXTURE_SLOT_CAPACITY);
        assert_eq!(list.slot_name(0).as_deref(), Some("tex0"));
        assert_eq!(list.slot_name(TEXTURE_SLOT_CAPACITY), None);
    }

    #[test]
    fn spawn_record_replicates_position() {
        let record = SpawnRecord::at(LevelId(13), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(record.rotations, [0; 3]);
        assert_eq!(record.positions[0], record.positions[2]);
        assert_eq!(record.positions[1].y, 2.0);
    }
}
