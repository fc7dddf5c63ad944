use serde::Serialize;
use stagehand_formats::Vec3;

const LAND_TABLE_PREFIX: &str = "objLandTable00";

/// Host level slot identifier. Negative values never address a real level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LevelId(pub i32);

impl LevelId {
    /// Unset sentinel used while a request is still being resolved.
    pub const INVALID: LevelId = LevelId(-1);
    /// The hub garden. Its custom tables are addressed by name, not id.
    pub const GARDEN: LevelId = LevelId(90);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Canonical land-table symbol for this level: 13 -> "objLandTable0013".
    pub fn land_table_name(self) -> String {
        format!("{LAND_TABLE_PREFIX}{}", self.0)
    }

    /// Inverse of [`LevelId::land_table_name`]: parses the digit run that
    /// starts inside the fixed prefix. Names without digits (the garden's
    /// custom tables) map to [`LevelId::INVALID`].
    pub fn from_land_table_name(name: &str) -> LevelId {
        let Some(start) = name.find(|c: char| c.is_ascii_digit()) else {
            return LevelId::INVALID;
        };
        let digits = &name[start..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        match digits[..end].parse::<i32>() {
            Ok(value) => LevelId(value),
            Err(_) => LevelId::INVALID,
        }
    }
}

/// Per-level behavior attached to an import request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelOptions {
    pub start_position: Vec3,
    pub end_position: Vec3,
    /// Restart the level when the protagonist falls to or below this Y.
    /// `None` disables the check.
    pub death_plane: Option<f32>,
    /// Guided-path files to load alongside the stage. Empty means the
    /// default probe of the paths directory may apply.
    pub spline_files: Vec<String>,
}

/// One queued stage import. Immutable once registered.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub level: LevelId,
    pub land_table: String,
    pub geometry_file: String,
    pub texture_archive: String,
    pub options: LevelOptions,
}

impl ImportRequest {
    pub fn for_level(level: LevelId) -> Self {
        Self {
            level,
            land_table: String::new(),
            geometry_file: String::new(),
            texture_archive: String::new(),
            options: LevelOptions::default(),
        }
    }

    pub fn for_land_table(name: impl Into<String>) -> Self {
        Self {
            level: LevelId::INVALID,
            land_table: name.into(),
            geometry_file: String::new(),
            texture_archive: String::new(),
            options: LevelOptions::default(),
        }
    }

    pub fn with_files(mut self, geometry: impl Into<String>, textures: impl Into<String>) -> Self {
        self.geometry_file = geometry.into();
        self.texture_archive = textures.into();
        self
    }

    pub fn with_options(mut self, options: LevelOptions) -> Self {
        self.options = options;
        self
    }
}
