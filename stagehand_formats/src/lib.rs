pub mod blvl;
pub mod pak;
pub mod spline;

pub use blvl::{BlvlMetadata, StageChunk, StageGeometry, decode_blvl, peek_blvl_metadata};
pub use pak::{PakArchive, PakEntry};
pub use spline::{SplineFile, SplinePoint, SplineRole, Vec3};
