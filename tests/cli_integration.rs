use std::path::{Path, PathBuf};
use std::process::Command;

use mvtread::pbf::MessageWriter;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_mvtread").to_string()
}

/// A tile with a "water" layer (one polygon) and an empty "roads" layer.
fn write_tile(dir: &Path) -> PathBuf {
    let mut kind = MessageWriter::new();
    kind.string(1, "lake");
    let mut feature = MessageWriter::new();
    feature
        .varint(1, 42)
        .packed_varints(2, [0u32, 0])
        .varint(3, 3)
        .packed_varints(4, [9u32, 0, 0, 26, 20, 0, 0, 20, 19, 0, 15]);
    let mut water = MessageWriter::new();
    water
        .varint(15, 2)
        .string(1, "water")
        .message(2, &feature)
        .string(3, "kind")
        .message(4, &kind)
        .varint(5, 4096);
    let mut roads = MessageWriter::new();
    roads.string(1, "roads");

    let mut t = MessageWriter::new();
    t.message(3, &water).message(3, &roads);

    let path = dir.join("tile.mvt");
    std::fs::write(&path, t.finish()).unwrap();
    path
}

#[test]
fn cli_lists_layers() {
    let dir = tempdir().unwrap();
    let tile = write_tile(dir.path());

    let out = Command::new(bin()).arg("layers").arg(&tile).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "0\twater\tversion=2\textent=4096\tfeatures=1");
    assert_eq!(lines[1], "1\troads\tversion=1\textent=4096\tfeatures=0");
}

#[test]
fn cli_layers_json() {
    let dir = tempdir().unwrap();
    let tile = write_tile(dir.path());

    let out = Command::new(bin())
        .args(["--json", "layers"])
        .arg(&tile)
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json[0]["name"], "water");
    assert_eq!(json[0]["features"], 1);
    assert_eq!(json[1]["version"], 1);
}

#[test]
fn cli_dumps_features() {
    let dir = tempdir().unwrap();
    let tile = write_tile(dir.path());

    let out = Command::new(bin())
        .args(["-q", "features", "--layer", "water", "--geometry"])
        .arg(&tile)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(
        stdout.trim_end(),
        "0\tid=42\tPolygon\tkind=\"lake\"\t[0,0 10,0 10,10 0,10 0,0]"
    );
}

#[test]
fn cli_features_json() {
    let dir = tempdir().unwrap();
    let tile = write_tile(dir.path());

    let out = Command::new(bin())
        .args(["--json", "features", "-l", "water", "-n", "1"])
        .arg(&tile)
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json[0]["id"], 42);
    assert_eq!(json[0]["type"], "Polygon");
    assert_eq!(json[0]["properties"]["kind"], "lake");
    assert!(json[0].get("geometry").is_none());
}

#[test]
fn cli_unknown_layer_fails() {
    let dir = tempdir().unwrap();
    let tile = write_tile(dir.path());

    let st = Command::new(bin())
        .args(["features", "--layer", "buildings"])
        .arg(&tile)
        .status()
        .unwrap();
    assert_eq!(st.code(), Some(1));
}

#[test]
fn cli_malformed_tile_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.mvt");
    std::fs::write(&path, [0x1A, 0x40, 0x0A]).unwrap();

    let out = Command::new(bin()).arg("layers").arg(&path).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("malformed"));
}

#[test]
fn cli_missing_file_fails() {
    let dir = tempdir().unwrap();
    let st = Command::new(bin())
        .arg("layers")
        .arg(dir.path().join("absent.mvt"))
        .status()
        .unwrap();
    assert_eq!(st.code(), Some(1));
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("DEFAULT_EXTENT=4096"));
}
