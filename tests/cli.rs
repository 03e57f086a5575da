use std::fs::File;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn missing_arguments_print_usage() {
    Command::cargo_bin("render")
        .unwrap()
        .args(&["64", "100"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("USAGE"));
}

#[test]
fn too_many_arguments_are_rejected() {
    Command::cargo_bin("render")
        .unwrap()
        .args(&["64", "100", "2", "10", "extra"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn malformed_numbers_are_rejected_not_zeroed() {
    Command::cargo_bin("render")
        .unwrap()
        .args(&["sixty-four", "100", "2", "10"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not parse image size"));

    Command::cargo_bin("render")
        .unwrap()
        .args(&["64", "100", "0", "10"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Thread count must be between"));
}

#[test]
fn renders_a_sixteen_bit_grayscale_png() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("brot.png");
    Command::cargo_bin("render")
        .unwrap()
        .args(&["32", "100", "2", "12", "--seed", "9", "-o"])
        .arg(&path)
        .assert()
        .success();

    let image = image::open(&path).unwrap();
    assert_eq!(image.color(), image::ColorType::L16);
    let gray = image.into_luma16();
    assert_eq!(gray.dimensions(), (32, 32));
    assert!(gray.pixels().any(|p| p[0] == 65535));
}

#[test]
fn default_output_name_carries_the_parameters() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("render")
        .unwrap()
        .current_dir(dir.path())
        .args(&["16", "50", "1", "8", "--strategy", "quadtree", "--max-depth", "32"])
        .assert()
        .success();
    assert!(dir.path().join("buddhabrot_16_50_8_quadtree.png").exists());
}

#[test]
fn cubehelix_colours_a_render() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("brot.png");
    Command::cargo_bin("render")
        .unwrap()
        .args(&["24", "60", "1", "8", "--seed", "3", "-o"])
        .arg(&path)
        .assert()
        .success();

    Command::cargo_bin("cubehelix")
        .unwrap()
        .arg(&path)
        .arg("2.5")
        .assert()
        .success();

    let decoder = png::Decoder::new(File::open(dir.path().join("cubehelix_brot.png")).unwrap());
    let reader = decoder.read_info().unwrap();
    let info = reader.info();
    assert_eq!(info.color_type, png::ColorType::Indexed);
    assert_eq!((info.width, info.height), (24, 24));
    assert_eq!(info.palette.as_ref().map(|p| p.len()), Some(256 * 3));
}

#[test]
fn cubehelix_needs_an_input() {
    Command::cargo_bin("cubehelix")
        .unwrap()
        .assert()
        .failure()
        .code(1);
}
