use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Copy a fixture into the temp dir so the run's position write-back does not
/// touch the checked-in file.
fn stage_fixture(dir: &Path, name: &str) -> PathBuf {
    let staged = dir.join(name);
    fs::copy(Path::new("tests/fixtures").join(name), &staged).expect("fixture should copy");
    staged
}

fn run_graphzoom(source: &Path, output: &Path) -> std::process::ExitStatus {
    Command::new(env!("CARGO_BIN_EXE_graphzoom"))
        .arg(source)
        .arg(output)
        .status()
        .expect("failed to execute graphzoom")
}

#[test]
fn renders_a_path_graph_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = stage_fixture(dir.path(), "path.json");
    let output = dir.path().join("viz");

    let status = run_graphzoom(&source, &output);
    assert!(status.success(), "graphzoom exited with error");

    let tiles_dir = dir.path().join("viz_files");
    assert!(tiles_dir.is_dir(), "tile directory was not created");
    assert!(
        dir.path().join("viz.dzi").is_file(),
        "manifest was not written"
    );

    // Every level directory from root to finest holds at least one tile.
    let mut levels: Vec<u32> = fs::read_dir(&tiles_dir)
        .unwrap()
        .map(|e| {
            e.unwrap()
                .file_name()
                .to_str()
                .unwrap()
                .parse::<u32>()
                .expect("level directories are numeric")
        })
        .collect();
    levels.sort_unstable();
    assert_eq!(levels[0], 0, "root level missing");
    for level in &levels {
        let tiles = fs::read_dir(tiles_dir.join(level.to_string())).unwrap().count();
        assert!(tiles >= 1, "level {level} has no tiles");
    }
    let root_tiles = fs::read_dir(tiles_dir.join("0")).unwrap().count();
    assert_eq!(root_tiles, 1, "level 0 must hold exactly the root tile");

    // Positions were persisted back into the source file.
    let text = fs::read_to_string(&source).unwrap();
    let data: serde_json::Value = serde_json::from_str(&text).unwrap();
    for node in data["nodes"].as_array().unwrap() {
        assert!(node["x"].is_number(), "node {} lost its position", node["id"]);
        assert!(node["y"].is_number());
    }

    let manifest = fs::read_to_string(dir.path().join("viz.dzi")).unwrap();
    assert!(manifest.contains(r#"Overlap="0""#));
    assert!(manifest.contains(r#"Format="png""#));
}

#[test]
fn single_node_graph_yields_one_tile_at_every_level() {
    let dir = tempfile::tempdir().unwrap();
    let source = stage_fixture(dir.path(), "single.json");
    let output = dir.path().join("one");

    let status = run_graphzoom(&source, &output);
    assert!(status.success());

    let tiles_dir = dir.path().join("one_files");
    let levels: Vec<_> = fs::read_dir(&tiles_dir).unwrap().collect();
    assert!(!levels.is_empty());
    for level in levels {
        let level_dir = level.unwrap().path();
        let tiles = fs::read_dir(&level_dir).unwrap().count();
        assert_eq!(
            tiles,
            1,
            "{} should hold exactly one tile",
            level_dir.display()
        );
    }
}

#[test]
fn empty_graph_succeeds_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let source = stage_fixture(dir.path(), "empty.json");
    let output = dir.path().join("nothing");

    let status = run_graphzoom(&source, &output);
    assert!(status.success(), "empty graph must not be an error");
    assert!(!dir.path().join("nothing_files").exists());
    assert!(!dir.path().join("nothing.dzi").exists());
}

#[test]
fn unreadable_source_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_graphzoom(&dir.path().join("missing.json"), &dir.path().join("out"));
    assert!(!status.success(), "missing source must be fatal");
}

#[test]
fn identical_runs_persist_identical_positions() {
    let dir = tempfile::tempdir().unwrap();

    let positions = |name: &str| -> serde_json::Value {
        let source = stage_fixture(dir.path(), "path.json");
        let renamed = dir.path().join(name);
        fs::rename(&source, &renamed).unwrap();
        let status = run_graphzoom(&renamed, &dir.path().join(name).with_extension("out"));
        assert!(status.success());
        serde_json::from_str(&fs::read_to_string(&renamed).unwrap()).unwrap()
    };

    let first = positions("run_a.json");
    let second = positions("run_b.json");
    assert_eq!(first["nodes"], second["nodes"]);
}
