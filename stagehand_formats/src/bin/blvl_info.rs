use std::env;

use anyhow::{Context, Result};
use stagehand_formats::StageGeometry;

fn main() -> Result<()> {
    let path = env::args().nth(1).context("usage: blvl_info <BLVL file>")?;
    let stage = StageGeometry::load(&path)?;
    let metadata = stage.metadata();
    println!(
        "BLVL v{} {} chunks ({} visible, {} solid), {} texture refs, far clip {:.1} in {}",
        metadata.version,
        metadata.chunk_count,
        stage.visible_count(),
        stage.solid_count(),
        metadata.texture_ref_count,
        metadata.far_clip,
        path
    );
    for (index, chunk) in stage.chunks.iter().enumerate() {
        println!(
            "{index:>4} flags={flags:#06x} verts={verts:>6} tris={tris:>6} radius={radius:>9.1}",
            flags = chunk.flags,
            verts = chunk.vertices.len(),
            tris = chunk.triangles.len(),
            radius = chunk.radius
        );
    }
    for name in &stage.texture_refs {
        println!("texture {name}");
    }
    Ok(())
}
