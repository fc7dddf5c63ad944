use std::rc::Rc;

use log::warn;
use stagehand_formats::StageGeometry;
use thiserror::Error;

use crate::host::HostBridge;
use crate::locator::{self, ModPaths};
use crate::request::ImportRequest;
use crate::tables::{CUSTOM_STAGE_TEXLIST_SLOT, LandTable, TextureList};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("stage asset {path} failed to load: {source}")]
    InvalidAsset {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Builds the in-memory stage for one import request: loads the geometry,
/// allocates a fresh texture list, binds the archive name, and publishes the
/// list into the reserved renderer slot before returning.
pub fn build_stage(
    paths: &ModPaths,
    request: &ImportRequest,
    host: &mut dyn HostBridge,
) -> Result<LandTable, BuildError> {
    let geometry_path = paths.geometry_file(&request.geometry_file);
    let geometry =
        StageGeometry::load(&geometry_path).map_err(|source| BuildError::InvalidAsset {
            path: geometry_path.display().to_string(),
            source,
        })?;

    let archive_path = paths.texture_file(&request.texture_archive);
    if !archive_path.is_file() {
        warn!(
            "texture archive {} not found, streaming will fill nothing",
            archive_path.display()
        );
    }

    let texture_list = Rc::new(TextureList::new());
    let table = LandTable {
        geometry: Some(Rc::new(geometry)),
        texture_archive: Some(locator::strip_extension(&request.texture_archive).to_string()),
        texture_list: Some(texture_list.clone()),
    };

    host.publish_texture_list(CUSTOM_STAGE_TEXLIST_SLOT, texture_list);

    Ok(table)
}
