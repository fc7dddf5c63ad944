use stagehand_formats::Vec3;

use crate::host::HostBridge;
use crate::request::LevelId;
use crate::tables::SpawnRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    Start,
    Victory,
}

/// Registers a spawn-table entry for the currently tracked character. The
/// host keys records by (character, level), so re-registration overwrites.
pub fn register_position(
    host: &mut dyn HostBridge,
    position: Vec3,
    level: LevelId,
    kind: PositionKind,
) {
    let character = host.current_character();
    let record = SpawnRecord::at(level, position);
    match kind {
        PositionKind::Start => host.register_start_position(character, record),
        PositionKind::Victory => host.register_end_position(character, record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RehearsalHost;
    use crate::tables::CharacterId;

    #[test]
    fn registers_for_the_tracked_character() {
        let mut host = RehearsalHost::new();
        host.set_character(CharacterId(2));
        register_position(
            &mut host,
            Vec3::new(0.0, 80.0, 0.0),
            LevelId(13),
            PositionKind::Start,
        );
        register_position(
            &mut host,
            Vec3::new(5.0, 0.0, 5.0),
            LevelId(13),
            PositionKind::Victory,
        );

        assert!(host.start_position(CharacterId(2), LevelId(13)).is_some());
        assert!(host.end_position(CharacterId(2), LevelId(13)).is_some());
        assert!(
            host.start_position(CharacterId::DEFAULT, LevelId(13))
                .is_none()
        );
    }
}
