use thiserror::Error;

use crate::host::HostBridge;
use crate::tables::LandTable;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("land table symbol {0} did not resolve to a host slot")]
    UnknownSymbol(String),
}

/// Overwrites the pre-allocated host slot for `name` with the built table.
/// Host code references the slot location, never the value, so this write is
/// the entire install step.
pub fn install_stage(
    host: &mut dyn HostBridge,
    name: &str,
    table: &LandTable,
) -> Result<(), InstallError> {
    let slot = host
        .land_table_slot(name)
        .ok_or_else(|| InstallError::UnknownSymbol(name.to_string()))?;
    *slot = table.clone();
    Ok(())
}
