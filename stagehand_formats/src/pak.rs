use std::fs::File;
use std::io::{Cursor, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::{Mmap, MmapOptions};

const PAK_MAGIC: u32 = 0x464b4150; // 'PAKF' little-endian
const HEADER_SIZE: usize = 16;
const ENTRY_SIZE: usize = 20;

/// One texture inside a PAK archive.
#[derive(Debug, Clone)]
pub struct PakEntry {
    pub name: String,
    pub offset: u64,
    pub size: u32,
    pub width: u16,
    pub height: u16,
    pub fourcc: [u8; 4],
}

impl PakEntry {
    pub fn data_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.size as usize;
        start..end
    }

    /// Pixel-format tag with trailing NULs stripped, e.g. "DXT1" or "RGB".
    pub fn format_tag(&self) -> String {
        String::from_utf8_lossy(&self.fourcc)
            .trim_end_matches('\0')
            .to_string()
    }
}

#[derive(Debug)]
pub struct PakArchive {
    path: PathBuf,
    mmap: Mmap,
    entries: Vec<PakEntry>,
}

impl PakArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening PAK archive at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping PAK archive {}", path_buf.display()))?;

        let entries = parse_entries(&mmap)
            .with_context(|| format!("parsing PAK archive {}", path_buf.display()))?;

        Ok(PakArchive {
            path: path_buf,
            mmap,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    pub fn find_entry(&self, name: &str) -> Option<&PakEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn read_entry_bytes(&self, entry: &PakEntry) -> &[u8] {
        let range = entry.data_range();
        &self.mmap[range]
    }
}

struct PakHeader {
    entry_count: usize,
    name_table_len: usize,
}

fn parse_pak_header(cursor: &mut Cursor<&[u8]>) -> Result<PakHeader> {
    let magic = cursor.read_u32::<LittleEndian>()?;
    if magic != PAK_MAGIC {
        bail!("PAK archive missing PAKF signature");
    }
    // Reserved.
    cursor.read_u32::<LittleEndian>()?;
    let entry_count = cursor.read_u32::<LittleEndian>()? as usize;
    let name_table_len = cursor.read_u32::<LittleEndian>()? as usize;

    Ok(PakHeader {
        entry_count,
        name_table_len,
    })
}

fn parse_entries(mmap: &Mmap) -> Result<Vec<PakEntry>> {
    ensure!(
        mmap.len() >= HEADER_SIZE,
        "PAK archive is too small to contain a header"
    );

    let mut cursor = Cursor::new(&mmap[..]);
    let header = parse_pak_header(&mut cursor)?;

    let entries_bytes_len = header
        .entry_count
        .checked_mul(ENTRY_SIZE)
        .ok_or_else(|| anyhow!("PAK archive entry count overflow"))?;
    let names_offset = HEADER_SIZE + entries_bytes_len;
    let names_end = names_offset
        .checked_add(header.name_table_len)
        .ok_or_else(|| anyhow!("PAK archive name table overflow"))?;
    ensure!(
        names_end <= mmap.len(),
        "PAK archive truncated before name table"
    );
    let names_block = &mmap[names_offset..names_end];

    // The cursor sits at the entry table now; each pass consumes one
    // ENTRY_SIZE record.
    let mut entries = Vec::with_capacity(header.entry_count);
    for index in 0..header.entry_count {
        let name_offset = cursor.read_u32::<LittleEndian>()? as usize;
        let data_offset = cursor.read_u32::<LittleEndian>()? as usize;
        let size = cursor.read_u32::<LittleEndian>()?;
        let width = cursor.read_u16::<LittleEndian>()?;
        let height = cursor.read_u16::<LittleEndian>()?;
        let mut fourcc = [0u8; 4];
        cursor.read_exact(&mut fourcc)?;

        ensure!(
            name_offset < header.name_table_len,
            "PAK entry {index} has invalid name offset {name_offset}"
        );
        let end = data_offset
            .checked_add(size as usize)
            .ok_or_else(|| anyhow!("PAK entry {index} size overflow"))?;
        ensure!(
            end <= mmap.len(),
            "PAK entry {index} data extends beyond file"
        );

        let name = read_c_string(names_block, name_offset)
            .with_context(|| format!("reading name for entry {index}"))?;

        entries.push(PakEntry {
            name,
            offset: data_offset as u64,
            size,
            width,
            height,
            fourcc,
        });
    }

    Ok(entries)
}

fn read_c_string(table: &[u8], offset: usize) -> Result<String> {
    let tail = table
        .get(offset..)
        .ok_or_else(|| anyhow!("name offset beyond table length"))?;
    let len = tail.iter().position(|&byte| byte == 0).unwrap_or(tail.len());
    ensure!(len > 0, "empty PAK entry name");
    Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
}
