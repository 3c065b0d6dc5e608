use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_slice-trace");

fn cube_log() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/cube_layers.log")
}

fn run(args: &[&std::ffi::OsStr]) -> Output {
    Command::new(BIN).args(args).output().expect("failed to run slice-trace")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_render_writes_layer_images() {
    let dir = tempfile::tempdir().unwrap();
    let log = cube_log();
    let out = run(&[
        "render".as_ref(),
        log.as_os_str(),
        "-o".as_ref(),
        dir.path().as_os_str(),
        "--width".as_ref(),
        "64".as_ref(),
        "--height".as_ref(),
        "64".as_ref(),
    ]);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("Parsed 3 layers, 6 polygons, 24 points."), "{text}");
    assert!(text.contains("Wrote 3 layer images"), "{text}");
    assert!(text.contains("(0 failed)"), "{text}");
    for i in 0..3 {
        assert!(dir.path().join(format!("layer_{i}.png")).exists());
    }
}

#[test]
fn test_summary_prints_one_line_per_layer() {
    let log = cube_log();
    let out = run(&["-q".as_ref(), "summary".as_ref(), log.as_os_str()]);
    assert!(out.status.success());

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    for (i, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("layer {i:>5}")), "{line}");
        assert!(line.contains("polygons     2"), "{line}");
        // 20mm and 10mm squares: 400 + 100 mm2.
        assert!(line.contains("area 500.000 mm2"), "{line}");
    }
}

#[test]
fn test_log_without_coordinates_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("empty.log");
    std::fs::write(&log, "[info] nothing sliced\n").unwrap();

    let out = run(&[
        "render".as_ref(),
        log.as_os_str(),
        "-o".as_ref(),
        dir.path().join("out").as_os_str(),
    ]);
    assert!(!out.status.success());
    // `main` reports errors in their Debug form.
    assert!(String::from_utf8_lossy(&out.stderr).contains("EmptyTrace"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_strict_rejects_malformed_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("bad.log");
    std::fs::write(&log, "layer 0\n1 2\n3 four\n5 6\n").unwrap();

    let lenient = run(&["summary".as_ref(), log.as_os_str()]);
    assert!(lenient.status.success());

    let strict = run(&["summary".as_ref(), log.as_os_str(), "--strict".as_ref()]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("line: 3"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let log = cube_log();
    let out = run(&["-v".as_ref(), "-q".as_ref(), "summary".as_ref(), log.as_os_str()]);
    assert!(!out.status.success());
}

#[cfg(unix)]
#[test]
fn test_slice_passes_arguments_and_survives_slicer_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let slicer = dir.path().join("fake-slicer");
    let args_file = dir.path().join("args.txt");
    std::fs::write(
        &slicer,
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nprintf 'layer 0\\n0 0\\n100 0\\n100 100\\n'\nexit 1\n",
            args_file.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&slicer, std::fs::Permissions::from_mode(0o755)).unwrap();

    let out_dir = dir.path().join("out");
    let saved = dir.path().join("saved.log");
    let out = run(&[
        "slice".as_ref(),
        "--slicer".as_ref(),
        slicer.as_os_str(),
        "-j".as_ref(),
        "fdmprinter.def.json".as_ref(),
        "-s".as_ref(),
        "extruder_nr=1".as_ref(),
        "-l".as_ref(),
        "20mm_cube.stl".as_ref(),
        "-o".as_ref(),
        out_dir.as_os_str(),
        "--save-log".as_ref(),
        saved.as_os_str(),
        "--width".as_ref(),
        "32".as_ref(),
        "--height".as_ref(),
        "32".as_ref(),
    ]);

    // The fake slicer exits 1; its output is still rendered.
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let args = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        vec!["slice", "-v", "-j", "fdmprinter.def.json", "-s", "extruder_nr=1", "-l", "20mm_cube.stl"]
    );
    assert!(out_dir.join("layer_0.png").exists());
    assert!(std::fs::read_to_string(&saved).unwrap().starts_with("layer 0\n"));
}

#[test]
fn test_bad_setting_is_rejected_by_argument_parser() {
    let out = run(&[
        "slice".as_ref(),
        "-j".as_ref(),
        "def.json".as_ref(),
        "-s".as_ref(),
        "no_equals_sign".as_ref(),
        "-l".as_ref(),
        "m.stl".as_ref(),
    ]);
    assert_eq!(out.status.code(), Some(2));
}
