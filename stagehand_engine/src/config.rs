use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use stagehand_formats::{SplineFile, Vec3};

use crate::locator::ModPaths;
use crate::request::{ImportRequest, LevelId, LevelOptions};
use crate::tables::SplineSet;

/// Reads the mod descriptor and resolves guided-path files.
pub struct ConfigReader {
    paths: ModPaths,
}

impl ConfigReader {
    pub fn new(paths: ModPaths) -> Self {
        Self { paths }
    }

    /// Parses `stage_imports.ini` into requests, preserving file order.
    pub fn read_import_requests(&self) -> Result<Vec<ImportRequest>> {
        let descriptor = self.paths.descriptor();
        let text = fs::read_to_string(&descriptor)
            .with_context(|| format!("reading import descriptor {}", descriptor.display()))?;
        parse_descriptor(&text)
            .with_context(|| format!("parsing import descriptor {}", descriptor.display()))
    }

    /// Loads the named guided paths from the paths directory. An empty name
    /// list is the default probe: every `*.path` file, sorted. Unparsable
    /// files are skipped with a warning; `None` when nothing loads.
    pub fn read_spline_set(&self, names: &[String]) -> Option<SplineSet> {
        let files: Vec<PathBuf> = if names.is_empty() {
            let dir = self.paths.path_dir();
            let mut found = Vec::new();
            if let Ok(entries) = fs::read_dir(&dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let matches = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("path"))
                        .unwrap_or(false);
                    if matches {
                        found.push(path);
                    }
                }
            }
            found.sort();
            found
        } else {
            names.iter().map(|name| self.paths.path_file(name)).collect()
        };

        let mut set = SplineSet::default();
        for file in files {
            match SplineFile::load(&file) {
                Ok(spline) => set.paths.push(Rc::new(spline)),
                Err(err) => warn!("skipping guided path {}: {err:#}", file.display()),
            }
        }

        if set.is_empty() { None } else { Some(set) }
    }
}

fn parse_descriptor(text: &str) -> Result<Vec<ImportRequest>> {
    let mut requests = Vec::new();
    let mut current: Option<RequestBuilder> = None;
    let mut skipping_section = false;

    for (number, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| anyhow!("line {}: unterminated section header", number + 1))?
                .trim();
            if let Some(builder) = current.take() {
                requests.push(builder.finish());
            }
            if name.eq_ignore_ascii_case("import") {
                skipping_section = false;
                current = Some(RequestBuilder::default());
            } else {
                debug!("ignoring descriptor section [{name}]");
                skipping_section = true;
            }
            continue;
        }

        let Some(builder) = current.as_mut() else {
            if !skipping_section {
                return Err(anyhow!("line {}: key outside of [import] section", number + 1));
            }
            continue;
        };

        let (key, value) = line
            .split_once('=')
            .map(|(key, value)| (key.trim(), value.trim()))
            .ok_or_else(|| anyhow!("line {}: expected key = value", number + 1))?;
        builder
            .consume(key, value)
            .with_context(|| format!("line {}", number + 1))?;
    }

    if let Some(builder) = current.take() {
        requests.push(builder.finish());
    }

    Ok(requests)
}

#[derive(Default)]
struct RequestBuilder {
    level: Option<i32>,
    land_table: Option<String>,
    geometry: Option<String>,
    textures: Option<String>,
    start: Option<Vec3>,
    victory: Option<Vec3>,
    death_plane: Option<f32>,
    paths: Vec<String>,
}

impl RequestBuilder {
    fn consume(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            "level" => self.level = Some(value.parse().context("level must be an integer")?),
            "land_table" => self.land_table = Some(value.to_string()),
            "geometry" => self.geometry = Some(value.to_string()),
            "textures" => self.textures = Some(value.to_string()),
            "start" => self.start = Some(parse_position(value)?),
            "victory" => self.victory = Some(parse_position(value)?),
            "death_plane" => {
                self.death_plane = Some(value.parse().context("death_plane must be a number")?)
            }
            "paths" => self.paths = parse_tokens(value),
            other => debug!("ignoring descriptor key {other}"),
        }
        Ok(())
    }

    fn finish(self) -> ImportRequest {
        let mut request = match self.level {
            Some(id) => ImportRequest::for_level(LevelId(id)),
            None => ImportRequest::for_land_table(String::new()),
        };
        if let Some(name) = self.land_table {
            request.land_table = name;
        }
        request
            .with_files(
                self.geometry.unwrap_or_default(),
                self.textures.unwrap_or_default(),
            )
            .with_options(LevelOptions {
                start_position: self.start.unwrap_or_default(),
                end_position: self.victory.unwrap_or_default(),
                death_plane: self.death_plane,
                spline_files: self.paths,
            })
    }
}

/// Parses a comma-separated `x, y, z` triple.
pub fn parse_position(raw: &str) -> Result<Vec3> {
    let parts: Vec<&str> = raw.split(',').map(|part| part.trim()).collect();
    if parts.len() != 3 {
        return Err(anyhow!("expected x, y, z but found: {raw}"));
    }
    Ok(Vec3 {
        x: parts[0].parse()?,
        y: parts[1].parse()?,
        z: parts[2].parse()?,
    })
}

/// Splits a comma-separated list, dropping empty entries.
pub fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find([';', '#']) {
        Some(index) => &line[..index],
        None => line,
    }
}
