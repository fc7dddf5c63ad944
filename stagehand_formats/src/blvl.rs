use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

const BLVL_MAGIC: u32 = 0x4c564c42; // 'BLVL' little-endian
const SUPPORTED_VERSION: u16 = 1;

/// Fully decoded stage geometry.
#[derive(Debug, Clone, Serialize)]
pub struct StageGeometry {
    pub far_clip: f32,
    pub chunks: Vec<StageChunk>,
    pub texture_refs: Vec<String>,
}

impl StageGeometry {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .with_context(|| format!("reading stage geometry {}", path.as_ref().display()))?;
        decode_blvl(&bytes)
            .with_context(|| format!("decoding stage geometry {}", path.as_ref().display()))
    }

    pub fn metadata(&self) -> BlvlMetadata {
        BlvlMetadata {
            version: SUPPORTED_VERSION,
            far_clip: self.far_clip,
            chunk_count: self.chunks.len() as u32,
            texture_ref_count: self.texture_refs.len() as u32,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.is_visible()).count()
    }

    pub fn solid_count(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.is_solid()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageChunk {
    pub flags: u32,
    pub center: [f32; 3],
    pub radius: f32,
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<[u16; 3]>,
}

impl StageChunk {
    pub const FLAG_VISIBLE: u32 = 1 << 0;
    pub const FLAG_SOLID: u32 = 1 << 1;

    pub fn is_visible(&self) -> bool {
        self.flags & Self::FLAG_VISIBLE != 0
    }

    pub fn is_solid(&self) -> bool {
        self.flags & Self::FLAG_SOLID != 0
    }

    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let flags = cursor.read_u32::<LittleEndian>()?;
        let center = read_vec3(cursor)?;
        let radius = cursor.read_f32::<LittleEndian>()?;

        let num_vertices: usize = cursor
            .read_u32::<LittleEndian>()?
            .try_into()
            .context("vertex count does not fit usize")?;
        let num_triangles: usize = cursor
            .read_u32::<LittleEndian>()?
            .try_into()
            .context("triangle count does not fit usize")?;

        let vertices = read_vec3_list(cursor, num_vertices)?;
        let mut triangles = Vec::with_capacity(num_triangles);
        for _ in 0..num_triangles {
            triangles.push([
                cursor.read_u16::<LittleEndian>()?,
                cursor.read_u16::<LittleEndian>()?,
                cursor.read_u16::<LittleEndian>()?,
            ]);
        }

        Ok(StageChunk {
            flags,
            center,
            radius,
            vertices,
            triangles,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlvlMetadata {
    pub version: u16,
    pub far_clip: f32,
    pub chunk_count: u32,
    pub texture_ref_count: u32,
}

fn parse_blvl_header(cursor: &mut Cursor<&[u8]>) -> Result<BlvlMetadata> {
    let magic = cursor.read_u32::<LittleEndian>()?;
    if magic != BLVL_MAGIC {
        bail!("unexpected BLVL magic {magic:#010x}");
    }
    let version = cursor.read_u16::<LittleEndian>()?;
    if version != SUPPORTED_VERSION {
        bail!("unsupported BLVL version {version}, expected {SUPPORTED_VERSION}");
    }
    // Reserved.
    cursor.read_u16::<LittleEndian>()?;
    let far_clip = cursor.read_f32::<LittleEndian>()?;
    let chunk_count = cursor.read_u32::<LittleEndian>()?;
    let texture_ref_count = cursor.read_u32::<LittleEndian>()?;

    Ok(BlvlMetadata {
        version,
        far_clip,
        chunk_count,
        texture_ref_count,
    })
}

pub fn peek_blvl_metadata(bytes: &[u8]) -> Result<BlvlMetadata> {
    let mut cursor = Cursor::new(bytes);
    parse_blvl_header(&mut cursor)
}

pub fn decode_blvl(bytes: &[u8]) -> Result<StageGeometry> {
    let mut cursor = Cursor::new(bytes);
    let metadata = parse_blvl_header(&mut cursor)?;

    let num_chunks: usize = metadata
        .chunk_count
        .try_into()
        .context("chunk count does not fit usize")?;
    let mut chunks = Vec::with_capacity(num_chunks);
    for _ in 0..num_chunks {
        chunks.push(StageChunk::read(&mut cursor)?);
    }

    let num_refs: usize = metadata
        .texture_ref_count
        .try_into()
        .context("texture reference count does not fit usize")?;
    let mut texture_refs = Vec::with_capacity(num_refs);
    for _ in 0..num_refs {
        texture_refs.push(read_name(&mut cursor)?);
    }

    Ok(StageGeometry {
        far_clip: metadata.far_clip,
        chunks,
        texture_refs,
    })
}

fn read_vec3(cursor: &mut Cursor<&[u8]>) -> Result<[f32; 3]> {
    Ok([
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
    ])
}

fn read_vec3_list(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<[f32; 3]>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(read_vec3(cursor)?);
    }
    Ok(values)
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor.read_u16::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    String::from_utf8(buf).context("texture reference was not valid UTF-8")
}
