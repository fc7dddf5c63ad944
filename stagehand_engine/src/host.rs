use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use log::{debug, warn};
use stagehand_formats::{PakArchive, Vec3};

use crate::request::LevelId;
use crate::tables::{CharacterId, GameState, LandTable, SpawnRecord, SplineSet, TextureList};

/// The narrow surface the import layer needs from the surrounding game
/// process. The rehearsal host implements it in-repo; a deployment supplies
/// an implementation that reaches into the retail executable instead.
pub trait HostBridge {
    fn current_level(&self) -> LevelId;
    fn current_sub_area(&self) -> i32;
    fn current_character(&self) -> CharacterId;
    fn protagonist_position(&self) -> Option<Vec3>;
    fn trigger_restart(&mut self);
    fn register_start_position(&mut self, character: CharacterId, record: SpawnRecord);
    fn register_end_position(&mut self, character: CharacterId, record: SpawnRecord);
    fn install_paths(&mut self, set: &SplineSet);
    fn publish_texture_list(&mut self, slot: &str, list: Rc<TextureList>);
    /// Resolves a land-table symbol to its pre-allocated slot. Writing
    /// through the slot is what makes a custom stage visible to the host.
    fn land_table_slot(&mut self, name: &str) -> Option<&mut LandTable>;
}

const GARDEN_TABLES: [&str; 3] = ["objLandTableDark", "objLandTableHero", "objLandTableNeutral"];
const RETAIL_LEVEL_MAX: i32 = 64;

/// Simulated game host: owns the state a retail process would, so the import
/// lifecycle can be exercised without the game. Records a structured event
/// log for reports and tests.
pub struct RehearsalHost {
    level: LevelId,
    sub_area: i32,
    character: CharacterId,
    protagonist: Option<Vec3>,
    state: GameState,
    land_tables: BTreeMap<String, LandTable>,
    start_positions: BTreeMap<(CharacterId, LevelId), SpawnRecord>,
    end_positions: BTreeMap<(CharacterId, LevelId), SpawnRecord>,
    installed_paths: Option<SplineSet>,
    texture_slots: BTreeMap<String, Rc<TextureList>>,
    events: Vec<String>,
}

impl RehearsalHost {
    pub fn new() -> Self {
        let mut land_tables = BTreeMap::new();
        for id in 0..=RETAIL_LEVEL_MAX {
            land_tables.insert(LevelId(id).land_table_name(), LandTable::default());
        }
        land_tables.insert(LevelId::GARDEN.land_table_name(), LandTable::default());
        for name in GARDEN_TABLES {
            land_tables.insert(name.to_string(), LandTable::default());
        }

        Self {
            level: LevelId::INVALID,
            sub_area: 0,
            character: CharacterId::DEFAULT,
            protagonist: None,
            state: GameState::Ingame,
            land_tables,
            start_positions: BTreeMap::new(),
            end_positions: BTreeMap::new(),
            installed_paths: None,
            texture_slots: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn log_event(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn set_level(&mut self, level: LevelId) {
        self.level = level;
        self.log_event(format!("level.enter {}", level.0));
    }

    pub fn set_character(&mut self, character: CharacterId) {
        self.character = character;
    }

    pub fn place_protagonist(&mut self, position: Vec3) {
        self.protagonist = Some(position);
    }

    /// Clears a pending restart so the next level can be rehearsed.
    pub fn resume(&mut self) {
        self.state = GameState::Ingame;
    }

    pub fn land_table(&self, name: &str) -> Option<&LandTable> {
        self.land_tables.get(name)
    }

    pub fn start_position(&self, character: CharacterId, level: LevelId) -> Option<&SpawnRecord> {
        self.start_positions.get(&(character, level))
    }

    pub fn end_position(&self, character: CharacterId, level: LevelId) -> Option<&SpawnRecord> {
        self.end_positions.get(&(character, level))
    }

    pub fn installed_paths(&self) -> Option<&SplineSet> {
        self.installed_paths.as_ref()
    }

    pub fn texture_slot(&self, slot: &str) -> Option<&Rc<TextureList>> {
        self.texture_slots.get(slot)
    }

    /// The renderer step a retail host performs after a load: opens the
    /// bound archive of each named stage slot and fills its texture list.
    /// Returns the total number of slots filled.
    pub fn stream_textures(&mut self, texture_dir: &Path, names: &[String]) -> usize {
        let targets: Vec<(String, Rc<TextureList>)> = names
            .iter()
            .filter_map(|name| self.land_tables.get(name))
            .filter(|table| table.is_custom())
            .filter_map(|table| {
                match (table.texture_archive.as_ref(), table.texture_list.as_ref()) {
                    (Some(archive), Some(list)) => Some((archive.clone(), list.clone())),
                    _ => None,
                }
            })
            .collect();

        let mut total = 0;
        for (archive, list) in targets {
            let path = texture_dir.join(format!("{archive}.pak"));
            match PakArchive::open(&path) {
                Ok(pak) => {
                    if pak.entries().len() > list.capacity() {
                        warn!(
                            "{archive} holds {} textures, list caps at {}",
                            pak.entries().len(),
                            list.capacity()
                        );
                    }
                    let filled = list.fill(pak.entries().iter().map(|entry| entry.name.clone()));
                    self.log_event(format!("textures.stream {archive} {filled}"));
                    total += filled;
                }
                Err(err) => {
                    warn!("texture streaming skipped for {}: {err:#}", path.display());
                }
            }
        }
        total
    }
}

impl Default for RehearsalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBridge for RehearsalHost {
    fn current_level(&self) -> LevelId {
        self.level
    }

    fn current_sub_area(&self) -> i32 {
        self.sub_area
    }

    fn current_character(&self) -> CharacterId {
        self.character
    }

    fn protagonist_position(&self) -> Option<Vec3> {
        self.protagonist
    }

    fn trigger_restart(&mut self) {
        self.state = GameState::NormalRestart;
        self.log_event("game.restart normal".to_string());
    }

    fn register_start_position(&mut self, character: CharacterId, record: SpawnRecord) {
        self.log_event(format!(
            "spawn.start level {} character {}",
            record.level.0, character.0
        ));
        self.start_positions.insert((character, record.level), record);
    }

    fn register_end_position(&mut self, character: CharacterId, record: SpawnRecord) {
        self.log_event(format!(
            "spawn.victory level {} character {}",
            record.level.0, character.0
        ));
        self.end_positions.insert((character, record.level), record);
    }

    fn install_paths(&mut self, set: &SplineSet) {
        self.log_event(format!("paths.install {}", set.len()));
        self.installed_paths = Some(set.clone());
    }

    fn publish_texture_list(&mut self, slot: &str, list: Rc<TextureList>) {
        debug!("texture list published to {slot}");
        self.log_event(format!("texlist.publish {slot}"));
        self.texture_slots.insert(slot.to_string(), list);
    }

    fn land_table_slot(&mut self, name: &str) -> Option<&mut LandTable> {
        self.land_tables.get_mut(name)
    }
}
