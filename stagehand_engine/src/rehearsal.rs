use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Serialize;
use stagehand_formats::Vec3;

use crate::cli::{InspectArgs, RehearseArgs};
use crate::host::{HostBridge, RehearsalHost};
use crate::locator::ModPaths;
use crate::orchestrator::{ImportOrchestrator, RequestSnapshot};
use crate::request::LevelId;
use crate::tables::{CUSTOM_STAGE_TEXLIST_SLOT, CharacterId, GameState};

#[derive(Debug, Serialize)]
struct RehearsalReport {
    mod_root: String,
    pending: Vec<RequestSnapshot>,
    levels: Vec<LevelReport>,
    host_events: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LevelReport {
    level: i32,
    installed: Vec<String>,
    spline_sets: usize,
    textures_streamed: usize,
    restart_frame: Option<u32>,
    death_plane: Option<f32>,
}

/// Runs the full lifecycle against the simulated host: registers every
/// descriptor request, enters each target level, streams textures, and
/// walks the protagonist downward for the requested number of frames.
pub fn execute(args: RehearseArgs) -> Result<()> {
    let RehearseArgs {
        mod_root,
        levels,
        frames,
        descent,
        character,
        report_json,
        verbose,
    } = args;
    let character = CharacterId(character);

    let paths = ModPaths::new(&mod_root);
    let host = Rc::new(RefCell::new(RehearsalHost::new()));
    host.borrow_mut().set_character(character);
    let bridge: Rc<RefCell<dyn HostBridge>> = host.clone();
    let mut orchestrator = ImportOrchestrator::initialize(&mod_root, bridge);

    let pending = orchestrator.snapshot().pending;
    println!(
        "Registered {} import request(s) from {}",
        pending.len(),
        paths.root().display()
    );
    for request in &pending {
        println!(
            "  - {} (level {}) geometry {} textures {}",
            request.land_table, request.level.0, request.geometry_file, request.texture_archive
        );
    }

    let targets = if levels.is_empty() {
        infer_levels(&pending)
    } else {
        levels.into_iter().map(LevelId).collect()
    };
    if targets.is_empty() {
        eprintln!("[stagehand_engine] warning: nothing to rehearse");
    }

    let mut level_reports = Vec::new();
    for level in targets {
        let report = rehearse_level(
            &mut orchestrator,
            &host,
            &paths.texture_dir(),
            level,
            character,
            frames,
            descent,
        );
        println!(
            "Level {}: {} stage(s) installed, {} path set(s), {} texture slot(s) streamed",
            report.level,
            report.installed.len(),
            report.spline_sets,
            report.textures_streamed
        );
        if verbose {
            for stage in orchestrator.installed_stages() {
                println!(
                    "    installed {} ({} chunks)",
                    stage.land_table_name,
                    stage.table.chunk_count()
                );
            }
            let host_ref = host.borrow();
            if let Some(set) = host_ref.installed_paths() {
                println!("    paths {} file(s), {} points", set.len(), set.total_points());
            }
            if let Some(list) = host_ref.texture_slot(CUSTOM_STAGE_TEXLIST_SLOT) {
                if let Some(first) = list.slot_name(0) {
                    println!("    textures {} slot(s), first {first}", list.filled_count());
                }
            }
            if let Some(record) = host_ref.end_position(character, level) {
                let position = record.positions[0];
                println!(
                    "    victory spawn ({}, {}, {})",
                    position.x, position.y, position.z
                );
            }
        }
        match report.restart_frame {
            Some(frame) => println!("  death plane restart at frame {frame}"),
            None if report.death_plane.is_some() => {
                println!("  death plane armed but never crossed")
            }
            None => {}
        }
        level_reports.push(report);
    }

    orchestrator.shutdown();

    println!("\nHost event log:");
    for event in host.borrow().events() {
        println!("  {event}");
    }

    if let Some(path) = report_json {
        let report = RehearsalReport {
            mod_root: mod_root.display().to_string(),
            pending,
            levels: level_reports,
            host_events: host.borrow().events().to_vec(),
        };
        let json = serde_json::to_string_pretty(&report)
            .context("serializing rehearsal report to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("writing rehearsal report to {}", path.display()))?;
        println!("Saved rehearsal report to {}", path.display());
    }

    Ok(())
}

/// Lists the requests the descriptor produced without entering any level.
pub fn inspect(args: InspectArgs) -> Result<()> {
    let InspectArgs { mod_root, verbose } = args;

    let host = Rc::new(RefCell::new(RehearsalHost::new()));
    let bridge: Rc<RefCell<dyn HostBridge>> = host.clone();
    let orchestrator = ImportOrchestrator::initialize(&mod_root, bridge);

    let pending = orchestrator.pending();
    if pending.is_empty() {
        println!("No imports registered from {}", mod_root.display());
        return Ok(());
    }

    println!("Imports registered from {}:", mod_root.display());
    let host_ref = host.borrow();
    for request in pending {
        let resolved = host_ref.land_table(&request.land_table).is_some();
        println!(
            "  - {} (level {}) geometry {} textures {}{}",
            request.land_table,
            request.level.0,
            request.geometry_file,
            request.texture_archive,
            if resolved { "" } else { "  [unresolved symbol]" }
        );
        if verbose {
            let options = &request.options;
            println!(
                "      start ({}, {}, {}) victory ({}, {}, {})",
                options.start_position.x,
                options.start_position.y,
                options.start_position.z,
                options.end_position.x,
                options.end_position.y,
                options.end_position.z
            );
            match options.death_plane {
                Some(threshold) => println!("      death plane at y {threshold}"),
                None => println!("      death plane disabled"),
            }
            if !options.spline_files.is_empty() {
                println!("      paths {}", options.spline_files.join(", "));
            }
        }
    }

    Ok(())
}

/// Rehearsal targets when none are given explicitly: each pending request's
/// level in registration order, with name-addressed requests folded into a
/// single garden visit.
fn infer_levels(pending: &[RequestSnapshot]) -> Vec<LevelId> {
    let mut targets = Vec::new();
    for request in pending {
        let level = if request.level.is_valid() {
            request.level
        } else {
            LevelId::GARDEN
        };
        if !targets.contains(&level) {
            targets.push(level);
        }
    }
    targets
}

fn rehearse_level(
    orchestrator: &mut ImportOrchestrator,
    host: &Rc<RefCell<RehearsalHost>>,
    texture_dir: &Path,
    level: LevelId,
    character: CharacterId,
    frames: u32,
    descent: f32,
) -> LevelReport {
    host.borrow_mut().set_level(level);
    orchestrator.on_level_load();

    let snapshot = orchestrator.snapshot();
    let textures_streamed = host
        .borrow_mut()
        .stream_textures(texture_dir, &snapshot.installed);
    let death_plane = orchestrator.active_options().death_plane;
    let start = host
        .borrow()
        .start_position(character, level)
        .map(|record| record.positions[0])
        .unwrap_or_default();
    host.borrow_mut().place_protagonist(start);

    let mut restart_frame = None;
    for frame in 1..=frames {
        let position = Vec3::new(start.x, start.y - descent * frame as f32, start.z);
        host.borrow_mut().place_protagonist(position);
        orchestrator.on_frame();
        if host.borrow().state() == GameState::NormalRestart {
            restart_frame = Some(frame);
            break;
        }
    }
    host.borrow_mut().resume();

    LevelReport {
        level: level.0,
        installed: snapshot.installed,
        spline_sets: snapshot.spline_sets,
        textures_streamed,
        restart_frame,
        death_plane,
    }
}
