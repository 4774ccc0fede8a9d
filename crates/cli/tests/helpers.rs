#![allow(dead_code)]

pub const V1: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../core/tests/fixtures/firmware_v1.map");
pub const V2: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../core/tests/fixtures/firmware_v2.map");

pub fn mapdiff() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mapdiff");
    cmd.env_remove("MAPDIFF_LOG");
    cmd
}

/// Run `mapdiff` with `args` and parse its stdout as JSON.
pub fn json_output(args: &[&str]) -> serde_json::Value {
    let output = mapdiff().args(args).output().expect("run mapdiff");
    assert!(output.status.success(), "mapdiff failed: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}
