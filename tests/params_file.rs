//! Parameter files for the preset architectures.

use monkey_cnn::params::{init, text};
use monkey_cnn::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("monkey-cnn-{}-{name}", std::process::id()))
}

#[test]
fn deep_file_has_twelve_groups_and_reads_back() {
    let plan = ArchitectureSpec::deep().plan().unwrap();
    let params = init::he(&plan, &mut StdRng::seed_from_u64(21));
    let rendered = text::write(&params);

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[0].split(' ').count(), 16 * 3 * 3 * 3);
    assert_eq!(lines[1].split(' ').count(), 16);
    assert_eq!(lines[6].split(' ').count(), 128 * 4096);
    assert_eq!(lines[11].split(' ').count(), 10);

    let back = text::parse(&plan, &rendered).unwrap();
    assert_eq!(back, params);
}

#[test]
fn flat_token_stream_matches_line_format() {
    let plan = ArchitectureSpec::shallow().plan().unwrap();
    let params = init::he(&plan, &mut StdRng::seed_from_u64(22));
    let rendered = text::write(&params);
    let flat = Parameters::load_tokens(&plan, rendered.split_whitespace()).unwrap();
    assert_eq!(flat, params);
}

#[test]
fn file_short_by_one_token_fails_to_load() {
    let plan = ArchitectureSpec::shallow().plan().unwrap();
    let params = init::he(&plan, &mut StdRng::seed_from_u64(23));
    let mut rendered = text::write(&params);
    // Drop the last bias value.
    let cut = rendered.trim_end().rfind(' ').unwrap();
    rendered.truncate(cut);

    let err = text::parse(&plan, &rendered).unwrap_err();
    assert!(matches!(err, ParamError::GroupLength { group: 1, expected: 16, found: 15, .. }));

    let err = Parameters::load_tokens(&plan, rendered.split_whitespace()).unwrap_err();
    assert!(matches!(err, ParamError::Truncated { layer: 0, expected: 448, found: 447 }));
}

#[test]
fn missing_file_reports_its_path() {
    let plan = ArchitectureSpec::deep().plan().unwrap();
    let path = temp_path("absent.txt");
    match text::read_file(&plan, &path) {
        Err(ParamError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn json_parameters_are_checked_against_the_plan() {
    let deep = ArchitectureSpec::deep().plan().unwrap();
    let shallow = ArchitectureSpec::shallow().plan().unwrap();
    let params = init::he(&shallow, &mut StdRng::seed_from_u64(24));
    let path = temp_path("params.json");
    params.save_json(&path).unwrap();

    let back = Parameters::load_json(&shallow, &path).unwrap();
    let wrong = Parameters::load_json(&deep, &path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(back, params);
    assert!(matches!(wrong, Err(ParamError::LayerCount { expected: 6, found: 1 })));
}

#[test]
fn architecture_json_round_trips_through_a_file() {
    let path = temp_path("arch.json");
    let path_str = path.to_str().unwrap();
    ArchitectureSpec::deep().save_json(path_str).unwrap();
    let back = ArchitectureSpec::load_json(path_str).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(back, ArchitectureSpec::deep());
}
