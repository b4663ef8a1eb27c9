//! Integration test for the inspector's file path: write, load, report.

#[path = "../../trlevel_core/tests/common/mod.rs"]
mod common;

use std::fs;

use common::Fixture;
use trlevel::inspect::{self, InspectError};
use trlevel::{DecodeError, DecoderConfig, GameVersion};

fn write_level(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("trlevel_it_{}_{name}", std::process::id()));
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_summary_report_for_every_generation() {
    for (version, bytes) in common::all_levels() {
        let path = write_level(&format!("{version}.bin"), &bytes);
        let level = inspect::load_level(&path, &DecoderConfig::default(), None).unwrap();
        let report = inspect::render_summary(&level);
        assert!(report.starts_with(&format!("version           {version}\n")), "{report}");
        assert!(report.contains("rooms             3\n"));
        assert!(report.contains("meshes            1 (2 pointers)\n"));
        assert!(report.ends_with("entities          2\n"));
        fs::remove_file(path).unwrap();
    }
}

#[test]
fn test_room_report_lists_water() {
    let path = write_level("rooms.tr2", &Fixture::new(GameVersion::Tr2).build());
    let level = inspect::load_level(&path, &DecoderConfig::default(), None).unwrap();
    let report = inspect::render_rooms(&level);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("water"));
    assert!(lines[1].starts_with("room    1  at (4096, 0, 0)  4 vertices  2 faces  1 portals  1 sectors"));
    fs::remove_file(path).unwrap();
}

#[test]
fn test_forced_generation() {
    let path = write_level("forced.tr4", &Fixture::new(GameVersion::Tr4).build());
    let config = DecoderConfig::default();
    let level = inspect::load_level(&path, &config, Some(GameVersion::Tr4)).unwrap();
    assert_eq!(level.version(), GameVersion::Tr4);
    let err = inspect::load_level(&path, &config, Some(GameVersion::Tr1)).unwrap_err();
    assert!(matches!(err, InspectError::Decode(DecodeError::MalformedChunk { chunk: "version", .. })));
    fs::remove_file(path).unwrap();
}

#[test]
fn test_demo_flag() {
    let mut fixture = Fixture::new(GameVersion::Tr1);
    fixture.demo_layout = true;
    let path = write_level("demo.phd", &fixture.build());
    let config = inspect::load_config(None, true).unwrap();
    let level = inspect::load_level(&path, &config, None).unwrap();
    assert_eq!(level.summary().entities, 2);
    fs::remove_file(path).unwrap();
}
