use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::builder;
use crate::config::ConfigReader;
use crate::host::HostBridge;
use crate::installer;
use crate::locator::{self, ModPaths};
use crate::positions::{self, PositionKind};
use crate::request::{ImportRequest, LevelId, LevelOptions};
use crate::tables::{LandTable, SplineSet};

/// A stage currently installed in a host slot, with the built table keeping
/// its geometry and texture data alive.
pub struct InstalledStage {
    pub land_table_name: String,
    pub table: LandTable,
}

#[derive(Default)]
struct ActiveLevelResources {
    tables: Vec<InstalledStage>,
    splines: Vec<SplineSet>,
    options: LevelOptions,
}

/// Drives the import lifecycle: request registration, level-load builds and
/// installs, per-frame checks, and cleanup. One instance per process,
/// constructed at initialization and driven by the host's lifecycle calls.
pub struct ImportOrchestrator {
    paths: ModPaths,
    host: Rc<RefCell<dyn HostBridge>>,
    config: Option<ConfigReader>,
    pending: Vec<ImportRequest>,
    active: ActiveLevelResources,
}

impl ImportOrchestrator {
    /// Builds the orchestrator and registers every request the mod
    /// descriptor names. Descriptor problems log a warning and leave the
    /// pending list empty; they never fail initialization.
    pub fn initialize(mod_root: impl Into<PathBuf>, host: Rc<RefCell<dyn HostBridge>>) -> Self {
        let paths = ModPaths::new(mod_root);
        let config = ConfigReader::new(paths.clone());
        let requests = match config.read_import_requests() {
            Ok(requests) => requests,
            Err(err) => {
                warn!("import descriptor unavailable: {err:#}");
                Vec::new()
            }
        };

        let mut orchestrator = Self {
            paths,
            host,
            config: Some(config),
            pending: Vec::new(),
            active: ActiveLevelResources::default(),
        };
        orchestrator.register_imports(requests);
        orchestrator
    }

    /// Queues one import and registers its spawn positions with the host.
    /// Whichever addressing key is missing is derived from the other; empty
    /// file fields fall back to the first matching asset on disk. Requests
    /// that still lack a table name or an asset are dropped silently.
    pub fn register_import(&mut self, request: ImportRequest) {
        let mut request = request;

        if request.land_table.is_empty() && request.level.is_valid() {
            request.land_table = request.level.land_table_name();
        }
        if !request.level.is_valid() {
            request.level = LevelId::from_land_table_name(&request.land_table);
        }

        if request.geometry_file.is_empty() {
            if let Some(name) = locator::detect_file(&self.paths.geometry_dir(), "blvl") {
                request.geometry_file = name;
            }
        }
        if request.texture_archive.is_empty() {
            if let Some(name) = locator::detect_file(&self.paths.texture_dir(), "pak") {
                request.texture_archive = name;
            }
        }

        if request.land_table.is_empty() {
            debug!("skipping import with no land table name");
            return;
        }
        if request.geometry_file.is_empty() || request.texture_archive.is_empty() {
            debug!("skipping import {}: no assets resolved", request.land_table);
            return;
        }

        let level = request.level;
        let start = request.options.start_position;
        let end = request.options.end_position;
        self.pending.push(request);

        // Spawn tables must be populated before the host's own load logic
        // consults them.
        let host = self.host.clone();
        let mut host = host.borrow_mut();
        positions::register_position(&mut *host, start, level, PositionKind::Start);
        positions::register_position(&mut *host, end, level, PositionKind::Victory);
    }

    pub fn register_imports(&mut self, requests: Vec<ImportRequest>) {
        for request in requests {
            self.register_import(request);
        }
    }

    /// Level-load entry point. Frees the previous level's resources first,
    /// unconditionally, then builds and installs every pending request that
    /// addresses the level the host is entering. A failed request is skipped
    /// without disturbing the others.
    pub fn on_level_load(&mut self) {
        self.free_level_resources();

        let host_rc = self.host.clone();
        let current = host_rc.borrow().current_level();
        let lone_request = self.pending.len() == 1;

        for index in 0..self.pending.len() {
            if !request_applies(&self.pending[index], current) {
                continue;
            }
            let request = self.pending[index].clone();

            let mut host = host_rc.borrow_mut();
            if !request.level.is_valid() {
                debug!(
                    "garden install {} (sub area {})",
                    request.land_table,
                    host.current_sub_area()
                );
            }
            let table = match builder::build_stage(&self.paths, &request, &mut *host) {
                Ok(table) => table,
                Err(err) => {
                    warn!("build failed for {}: {err}", request.land_table);
                    continue;
                }
            };

            if let Err(err) = installer::install_stage(&mut *host, &request.land_table, &table) {
                warn!("install failed for {}: {err}", request.land_table);
                continue;
            }

            info!(
                "installed {} ({} chunks)",
                request.land_table,
                table.chunk_count()
            );
            self.active.tables.push(InstalledStage {
                land_table_name: request.land_table.clone(),
                table,
            });

            // An explicit path list always loads; the directory probe only
            // runs when this is the lone pending request.
            let splines = if !request.options.spline_files.is_empty() {
                self.config
                    .as_ref()
                    .and_then(|config| config.read_spline_set(&request.options.spline_files))
            } else if lone_request {
                self.config.as_ref().and_then(|config| config.read_spline_set(&[]))
            } else {
                None
            };
            if let Some(set) = splines {
                host.install_paths(&set);
                self.active.splines.push(set);
            }

            self.active.options = request.options.clone();
        }
    }

    /// Per-frame death-plane check. Constant-time; does nothing unless a
    /// custom level is active and the feature is enabled.
    pub fn on_frame(&mut self) {
        if self.active.tables.is_empty() {
            return;
        }
        let Some(threshold) = self.active.options.death_plane else {
            return;
        };
        let host = self.host.clone();
        let mut host = host.borrow_mut();
        let Some(position) = host.protagonist_position() else {
            return;
        };
        if position.y <= threshold {
            debug!("death plane crossed at y {}", position.y);
            host.trigger_restart();
        }
    }

    /// Final teardown: releases live level resources and the descriptor
    /// reader. The pending list survives for the life of the process.
    pub fn shutdown(&mut self) {
        self.free_level_resources();
        self.config = None;
    }

    fn free_level_resources(&mut self) {
        if !self.active.tables.is_empty() || !self.active.splines.is_empty() {
            debug!(
                "releasing {} stage tables and {} path sets",
                self.active.tables.len(),
                self.active.splines.len()
            );
        }
        self.active = ActiveLevelResources::default();
    }

    pub fn pending(&self) -> &[ImportRequest] {
        &self.pending
    }

    pub fn installed_stages(&self) -> &[InstalledStage] {
        &self.active.tables
    }

    pub fn active_options(&self) -> &LevelOptions {
        &self.active.options
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            pending: self
                .pending
                .iter()
                .map(|request| RequestSnapshot {
                    level: request.level,
                    land_table: request.land_table.clone(),
                    geometry_file: request.geometry_file.clone(),
                    texture_archive: request.texture_archive.clone(),
                    death_plane: request.options.death_plane,
                })
                .collect(),
            installed: self
                .active
                .tables
                .iter()
                .map(|stage| stage.land_table_name.clone())
                .collect(),
            spline_sets: self.active.splines.len(),
            options: self.active.options.clone(),
        }
    }
}

fn request_applies(request: &ImportRequest, current: LevelId) -> bool {
    request.level == current
        || (current == LevelId::GARDEN
            && !request.level.is_valid()
            && !request.land_table.is_empty())
}

/// Serializable view of the orchestrator for reports and tests.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub pending: Vec<RequestSnapshot>,
    pub installed: Vec<String>,
    pub spline_sets: usize,
    pub options: LevelOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub level: LevelId,
    pub land_table: String,
    pub geometry_file: String,
    pub texture_archive: String,
    pub death_plane: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RehearsalHost;
    use crate::request::LevelId;
    use crate::tables::{CharacterId, GameState};
    use std::fs;
    use std::path::Path;
    use stagehand_formats::Vec3;
    use tempfile::{tempdir, TempDir};

    fn blvl_bytes(chunks: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BLVL");
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&2000.0f32.to_le_bytes());
        data.extend_from_slice(&chunks.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for _ in 0..chunks {
            data.extend_from_slice(&3u32.to_le_bytes());
            for value in [0.0f32, 0.0, 0.0, 1.0] {
                data.extend_from_slice(&value.to_le_bytes());
            }
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
        }
        data
    }

    fn pak_bytes(names: &[&str]) -> Vec<u8> {
        let mut name_table = Vec::new();
        let mut name_offsets = Vec::new();
        for name in names {
            name_offsets.push(name_table.len() as u32);
            name_table.extend_from_slice(name.as_bytes());
            name_table.push(0);
        }
        let blobs_start = (16 + names.len() * 20 + name_table.len()) as u32;

        let mut data = Vec::new();
        data.extend_from_slice(b"PAKF");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(names.len() as u32).to_le_bytes());
        data.extend_from_slice(&(name_table.len() as u32).to_le_bytes());
        for (index, _) in names.iter().enumerate() {
            data.extend_from_slice(&name_offsets[index].to_le_bytes());
            data.extend_from_slice(&(blobs_start + index as u32 * 4).to_le_bytes());
            data.extend_from_slice(&4u32.to_le_bytes());
            data.extend_from_slice(&8u16.to_le_bytes());
            data.extend_from_slice(&8u16.to_le_bytes());
            data.extend_from_slice(b"RGB\0");
        }
        data.extend_from_slice(&name_table);
        for _ in names {
            data.extend_from_slice(b"\0\0\0\0");
        }
        data
    }

    fn write_mod(dir: &Path, geometry: &[(&str, u32)], archives: &[&str]) {
        let assets = dir.join("assets");
        fs::create_dir_all(assets.join("textures")).unwrap();
        for (name, chunks) in geometry {
            fs::write(assets.join(format!("{name}.blvl")), blvl_bytes(*chunks)).unwrap();
        }
        for name in archives {
            fs::write(
                assets.join("textures").join(format!("{name}.pak")),
                pak_bytes(&["grass", "sky"]),
            )
            .unwrap();
        }
    }

    struct Fixture {
        dir: TempDir,
        host: Rc<RefCell<RehearsalHost>>,
        orchestrator: ImportOrchestrator,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let host = Rc::new(RefCell::new(RehearsalHost::new()));
        let bridge: Rc<RefCell<dyn HostBridge>> = host.clone();
        let orchestrator = ImportOrchestrator::initialize(dir.path(), bridge);
        Fixture {
            dir,
            host,
            orchestrator,
        }
    }

    #[test]
    fn empty_request_registration_is_a_no_op() {
        let mut fx = fixture();
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));

        assert!(fx.orchestrator.pending().is_empty());
        let host = fx.host.borrow();
        assert!(
            host.start_position(CharacterId::DEFAULT, LevelId(13))
                .is_none()
        );
        assert!(host.events().is_empty());
    }

    #[test]
    fn nameless_request_is_dropped_even_with_assets_present() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);

        fx.orchestrator
            .register_import(ImportRequest::for_land_table(""));

        assert!(fx.orchestrator.pending().is_empty());
        assert!(fx.host.borrow().events().is_empty());
    }

    #[test]
    fn registration_derives_missing_keys_and_spawns() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);

        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));

        let pending = fx.orchestrator.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].land_table, "objLandTable0013");
        assert_eq!(pending[0].geometry_file, "ruins");
        assert_eq!(pending[0].texture_archive, "stones");

        let host = fx.host.borrow();
        assert!(
            host.start_position(CharacterId::DEFAULT, LevelId(13))
                .is_some()
        );
        assert!(
            host.end_position(CharacterId::DEFAULT, LevelId(13))
                .is_some()
        );
    }

    #[test]
    fn level_load_installs_matching_request() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        assert_eq!(fx.orchestrator.installed_stages().len(), 1);
        let host = fx.host.borrow();
        let table = host.land_table("objLandTable0013").unwrap();
        assert!(table.is_custom());
        assert_eq!(table.chunk_count(), 2);
        // Other slots stay untouched.
        assert!(!host.land_table("objLandTable0012").unwrap().is_custom());
    }

    #[test]
    fn level_load_ignores_other_levels() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));

        fx.host.borrow_mut().set_level(LevelId(14));
        fx.orchestrator.on_level_load();

        assert!(fx.orchestrator.installed_stages().is_empty());
        assert!(!fx.host.borrow().land_table("objLandTable0013").unwrap().is_custom());
    }

    #[test]
    fn cleanup_runs_every_load_and_is_idempotent() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);
        let request = ImportRequest::for_level(LevelId(13)).with_options(LevelOptions {
            death_plane: Some(-20.0),
            ..LevelOptions::default()
        });
        fx.orchestrator.register_import(request);

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();
        assert_eq!(fx.orchestrator.installed_stages().len(), 1);
        assert_eq!(fx.orchestrator.active_options().death_plane, Some(-20.0));

        fx.host.borrow_mut().set_level(LevelId(40));
        fx.orchestrator.on_level_load();
        assert!(fx.orchestrator.installed_stages().is_empty());
        assert_eq!(fx.orchestrator.active_options().death_plane, None);

        fx.orchestrator.on_level_load();
        assert!(fx.orchestrator.installed_stages().is_empty());

        // The host keeps its copy of the last install; release never
        // reaches into the slot.
        assert!(fx.host.borrow().land_table("objLandTable0013").unwrap().is_custom());
    }

    #[test]
    fn later_request_wins_the_host_slot() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("first", 1), ("second", 3)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)).with_files("first", "stones"));
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)).with_files("second", "stones"));

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        assert_eq!(fx.orchestrator.installed_stages().len(), 2);
        let host = fx.host.borrow();
        assert_eq!(host.land_table("objLandTable0013").unwrap().chunk_count(), 3);
    }

    #[test]
    fn texture_streaming_covers_only_the_fresh_install() {
        let mut fx = fixture();
        write_mod(
            fx.dir.path(),
            &[("first", 1), ("second", 1)],
            &["stones", "pearls"],
        );
        let texture_dir = fx.dir.path().join("assets").join("textures");
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)).with_files("first", "stones"));
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(21)).with_files("second", "pearls"));

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();
        let installed = fx.orchestrator.snapshot().installed;
        assert_eq!(
            fx.host.borrow_mut().stream_textures(&texture_dir, &installed),
            2
        );

        // Level 13's slot stays overwritten after cleanup; streaming for the
        // next level must not touch it again.
        fx.host.borrow_mut().set_level(LevelId(21));
        fx.orchestrator.on_level_load();
        let installed = fx.orchestrator.snapshot().installed;
        assert_eq!(installed, ["objLandTable0021"]);
        assert_eq!(
            fx.host.borrow_mut().stream_textures(&texture_dir, &installed),
            2
        );

        let host = fx.host.borrow();
        let streams: Vec<String> = host
            .events()
            .iter()
            .filter(|event| event.starts_with("textures.stream"))
            .cloned()
            .collect();
        assert_eq!(
            streams,
            ["textures.stream stones 2", "textures.stream pearls 2"]
        );
    }

    #[test]
    fn garden_accepts_named_tables_only_there() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("garden", 1)], &["petals"]);
        fx.orchestrator.register_import(
            ImportRequest::for_land_table("objLandTableDark").with_files("garden", "petals"),
        );

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();
        assert!(fx.orchestrator.installed_stages().is_empty());

        fx.host.borrow_mut().set_level(LevelId::GARDEN);
        fx.orchestrator.on_level_load();
        assert_eq!(fx.orchestrator.installed_stages().len(), 1);
        assert!(fx.host.borrow().land_table("objLandTableDark").unwrap().is_custom());
    }

    #[test]
    fn unknown_symbol_skips_request_but_not_others() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("garden", 1)], &["petals"]);
        fx.orchestrator.register_import(
            ImportRequest::for_land_table("objLandTableMissing").with_files("garden", "petals"),
        );
        fx.orchestrator.register_import(
            ImportRequest::for_land_table("objLandTableDark").with_files("garden", "petals"),
        );

        fx.host.borrow_mut().set_level(LevelId::GARDEN);
        fx.orchestrator.on_level_load();

        assert_eq!(fx.orchestrator.installed_stages().len(), 1);
        assert_eq!(
            fx.orchestrator.installed_stages()[0].land_table_name,
            "objLandTableDark"
        );
    }

    #[test]
    fn death_plane_boundary_is_inclusive() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 1)], &["stones"]);
        let request = ImportRequest::for_level(LevelId(13)).with_options(LevelOptions {
            death_plane: Some(100.0),
            ..LevelOptions::default()
        });
        fx.orchestrator.register_import(request);
        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        fx.host
            .borrow_mut()
            .place_protagonist(Vec3::new(0.0, 100.01, 0.0));
        fx.orchestrator.on_frame();
        assert_eq!(fx.host.borrow().state(), GameState::Ingame);

        fx.host
            .borrow_mut()
            .place_protagonist(Vec3::new(0.0, 100.0, 0.0));
        fx.orchestrator.on_frame();
        assert_eq!(fx.host.borrow().state(), GameState::NormalRestart);
    }

    #[test]
    fn disabled_death_plane_never_restarts() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 1)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));
        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        fx.host
            .borrow_mut()
            .place_protagonist(Vec3::new(0.0, -10_000.0, 0.0));
        fx.orchestrator.on_frame();
        assert_eq!(fx.host.borrow().state(), GameState::Ingame);
    }

    #[test]
    fn auto_detected_import_ends_installed() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 2)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(21)));

        fx.host.borrow_mut().set_level(LevelId(21));
        fx.orchestrator.on_level_load();

        let snapshot = fx.orchestrator.snapshot();
        assert_eq!(snapshot.installed, vec!["objLandTable0021".to_string()]);
        assert_eq!(snapshot.options, fx.orchestrator.pending()[0].options);
        let host = fx.host.borrow();
        let table = host.land_table("objLandTable0021").unwrap();
        assert_eq!(table.texture_archive.as_deref(), Some("stones"));
        assert!(table.texture_list.is_some());
    }

    #[test]
    fn explicit_spline_list_loads_and_installs() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 1)], &["stones"]);
        let paths_dir = fx.dir.path().join("assets").join("paths");
        fs::create_dir_all(&paths_dir).unwrap();
        fs::write(
            paths_dir.join("rail_a.path"),
            "kind rail\nnumpoints 2\npoints:\n0 0 0 0\n1 0 0 1\n",
        )
        .unwrap();

        let request = ImportRequest::for_level(LevelId(13)).with_options(LevelOptions {
            spline_files: vec!["rail_a".to_string()],
            ..LevelOptions::default()
        });
        fx.orchestrator.register_import(request);
        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        let host = fx.host.borrow();
        let installed = host.installed_paths().expect("paths installed");
        assert_eq!(installed.len(), 1);
        assert_eq!(fx.orchestrator.snapshot().spline_sets, 1);
    }

    #[test]
    fn default_probe_only_runs_for_a_lone_request() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("first", 1), ("second", 1)], &["stones"]);
        let paths_dir = fx.dir.path().join("assets").join("paths");
        fs::create_dir_all(&paths_dir).unwrap();
        fs::write(
            paths_dir.join("rail_a.path"),
            "kind rail\nnumpoints 2\npoints:\n0 0 0 0\n1 0 0 1\n",
        )
        .unwrap();

        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)).with_files("first", "stones"));
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(14)).with_files("second", "stones"));

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();
        assert!(fx.host.borrow().installed_paths().is_none());
        assert_eq!(fx.orchestrator.snapshot().spline_sets, 0);
    }

    #[test]
    fn default_probe_loads_paths_for_a_lone_request() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 1)], &["stones"]);
        let paths_dir = fx.dir.path().join("assets").join("paths");
        fs::create_dir_all(&paths_dir).unwrap();
        fs::write(
            paths_dir.join("rail_a.path"),
            "kind rail\nnumpoints 2\npoints:\n0 0 0 0\n1 0 0 1\n",
        )
        .unwrap();

        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));

        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        let host = fx.host.borrow();
        let installed = host.installed_paths().expect("paths installed");
        assert_eq!(installed.len(), 1);
        assert_eq!(installed.paths[0].points.len(), 2);
        assert_eq!(fx.orchestrator.snapshot().spline_sets, 1);
    }

    #[test]
    fn shutdown_releases_resources_and_config() {
        let mut fx = fixture();
        write_mod(fx.dir.path(), &[("ruins", 1)], &["stones"]);
        fx.orchestrator
            .register_import(ImportRequest::for_level(LevelId(13)));
        fx.host.borrow_mut().set_level(LevelId(13));
        fx.orchestrator.on_level_load();

        fx.orchestrator.shutdown();
        assert!(fx.orchestrator.installed_stages().is_empty());
        assert_eq!(fx.orchestrator.pending().len(), 1);
    }
}
