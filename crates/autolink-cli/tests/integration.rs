//! Integration tests for autolink

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CAMERA_MARKER: &str = r#"{
    "name": "camera",
    "platforms": ["apple", "android"],
    "apple": { "modules": ["CameraModule"] },
    "android": { "modules": ["expo.modules.camera.CameraModule"] }
}"#;

/// A throwaway app project plus a private cache directory for the log file
struct Project {
    dir: TempDir,
    cache: TempDir,
}

impl Project {
    fn new(root_manifest: &str) -> io::Result<Self> {
        let project = Project {
            dir: TempDir::new()?,
            cache: TempDir::new()?,
        };
        fs::write(project.root().join("package.json"), root_manifest)?;
        Ok(project)
    }

    /// Root depends on `expo-camera` 16 directly and on `kit`, which nests `expo-camera` 15
    fn camera() -> io::Result<Self> {
        let project = Project::new(
            r#"{ "name": "app", "version": "1.0.0", "dependencies": { "expo-camera": "*", "kit": "*" } }"#,
        )?;
        let modules = project.root().join("node_modules");
        write_native_package(&modules.join("expo-camera"), "expo-camera", "16.0.0", CAMERA_MARKER)?;
        write_package(
            &modules.join("kit"),
            r#"{ "name": "kit", "version": "1.0.0", "dependencies": { "expo-camera": "*" } }"#,
        )?;
        write_native_package(
            &modules.join("kit/node_modules/expo-camera"),
            "expo-camera",
            "15.0.0",
            CAMERA_MARKER,
        )?;
        Ok(project)
    }

    /// Root depends on `expo-camera` only
    fn single_camera() -> io::Result<Self> {
        let project = Project::new(
            r#"{ "name": "app", "version": "1.0.0", "dependencies": { "expo-camera": "*" } }"#,
        )?;
        write_native_package(
            &project.root().join("node_modules/expo-camera"),
            "expo-camera",
            "16.0.0",
            CAMERA_MARKER,
        )?;
        Ok(project)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("autolink");
        cmd.env("XDG_CACHE_HOME", self.cache.path())
            .env_remove("RUST_LOG")
            .current_dir(self.root());
        cmd
    }
}

fn write_package(dir: &Path, manifest: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("package.json"), manifest)
}

fn write_native_package(dir: &Path, name: &str, version: &str, marker: &str) -> io::Result<()> {
    write_package(
        dir,
        &format!(r#"{{ "name": "{}", "version": "{}" }}"#, name, version),
    )?;
    fs::write(dir.join("expo-module.config.json"), marker)?;
    fs::create_dir_all(dir.join("ios"))?;
    fs::write(dir.join("ios/ExpoCamera.podspec"), "Pod::Spec.new")?;
    fs::create_dir_all(dir.join("android"))?;
    Ok(())
}

fn ios_provider_path(root: &Path) -> PathBuf {
    root.join("ios/build/generated/autolinking/ExpoModulesProvider.swift")
}

#[test]
fn test_version() {
    cargo_bin_cmd!("autolink")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("autolink"));
}

#[test]
fn test_help() {
    cargo_bin_cmd!("autolink")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate-modules-provider"))
        .stdout(predicate::str::contains("apply-mods"));
}

#[test]
fn test_invalid_command() {
    cargo_bin_cmd!("autolink").arg("invalid").assert().failure();
}

#[test]
fn test_resolve_requires_platform() -> io::Result<()> {
    let project = Project::single_camera()?;
    project.command().arg("resolve").assert().failure();
    Ok(())
}

#[test]
fn test_resolve_without_package_json_fails() -> io::Result<()> {
    let project = Project::new("{}")?;
    fs::remove_file(project.root().join("package.json"))?;
    project
        .command()
        .args(["resolve", "--platform", "ios"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no package.json"));
    Ok(())
}

#[test]
fn test_resolve_json_picks_shallowest_camera() -> io::Result<()> {
    let project = Project::camera()?;
    project
        .command()
        .args(["resolve", "--platform", "ios", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""packageVersion": "16.0.0""#))
        .stdout(predicate::str::contains(r#""reason": "duplicate-module""#))
        .stdout(predicate::str::contains(r#""packageVersion": "15.0.0""#).not());
    Ok(())
}

#[test]
fn test_resolve_exclude_flag() -> io::Result<()> {
    let project = Project::single_camera()?;
    project
        .command()
        .args(["resolve", "--platform", "android", "--json", "--exclude", "camera"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""modules": []"#))
        .stdout(predicate::str::contains("excluded-by-config"));
    Ok(())
}

#[test]
fn test_search_lists_every_candidate() -> io::Result<()> {
    let project = Project::camera()?;
    project
        .command()
        .args(["search", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""version": "16.0.0""#))
        .stdout(predicate::str::contains(r#""version": "15.0.0""#));
    Ok(())
}

#[test]
fn test_verify_clean_project() -> io::Result<()> {
    let project = Project::single_camera()?;
    project
        .command()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found."));
    Ok(())
}

#[test]
fn test_verify_reports_duplicates_without_failing() -> io::Result<()> {
    let project = Project::camera()?;
    project
        .command()
        .args(["verify", "--platform", "ios"])
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate-module"));
    Ok(())
}

#[test]
fn test_verify_fails_on_malformed_manifest() -> io::Result<()> {
    let project = Project::new(
        r#"{ "name": "app", "version": "1.0.0", "dependencies": { "broken": "*" } }"#,
    )?;
    write_package(&project.root().join("node_modules/broken"), "{ not json")?;
    project
        .command()
        .args(["verify", "--platform", "android"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid-manifest"));
    Ok(())
}

#[test]
fn test_generate_writes_provider_once() -> io::Result<()> {
    let project = Project::single_camera()?;
    project
        .command()
        .args(["generate-modules-provider", "--platform", "ios"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ExpoModulesProvider.swift"));

    let provider = ios_provider_path(project.root());
    let first = fs::read_to_string(&provider)?;
    assert!(first.contains("CameraModule.self"));
    let modified = fs::metadata(&provider)?.modified()?;

    project
        .command()
        .args(["generate-modules-provider", "--platform", "ios"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&provider)?, first);
    assert_eq!(fs::metadata(&provider)?.modified()?, modified);
    Ok(())
}

#[test]
fn test_generate_to_custom_output() -> io::Result<()> {
    let project = Project::single_camera()?;
    let output = project.root().join("out/PackageList.java");
    project
        .command()
        .args(["generate-modules-provider", "--platform", "android", "--output"])
        .arg(&output)
        .assert()
        .success();
    let contents = fs::read_to_string(&output)?;
    assert!(contents.contains("expo.modules.camera.CameraModule.class"));
    Ok(())
}

#[test]
fn test_generate_rejects_web() -> io::Result<()> {
    let project = Project::single_camera()?;
    project
        .command()
        .args(["generate-modules-provider", "--platform", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No provider source is generated for web"));
    Ok(())
}

#[test]
fn test_generate_fails_on_invalid_identifier() -> io::Result<()> {
    let project = Project::new(
        r#"{ "name": "app", "version": "1.0.0", "dependencies": { "expo-camera": "*" } }"#,
    )?;
    write_native_package(
        &project.root().join("node_modules/expo-camera"),
        "expo-camera",
        "16.0.0",
        r#"{ "name": "camera", "apple": { "modules": ["Camera-Module"] } }"#,
    )?;
    project
        .command()
        .args(["generate-modules-provider", "--platform", "ios"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Camera-Module"));

    // The provider is still written without the rejected class
    let provider = fs::read_to_string(ios_provider_path(project.root()))?;
    assert!(!provider.contains("Camera-Module"));
    Ok(())
}

#[test]
fn test_apply_mods_updates_styles() -> io::Result<()> {
    let project = Project::single_camera()?;
    fs::write(
        project.root().join("app.json"),
        r#"{ "expo": { "name": "foo", "slug": "bar", "androidStatusBar": { "barStyle": "dark-content" } } }"#,
    )?;
    project
        .command()
        .arg("apply-mods")
        .assert()
        .success()
        .stdout(predicate::str::contains("styles.xml"));

    let styles = fs::read_to_string(
        project
            .root()
            .join("android/app/src/main/res/values/styles.xml"),
    )?;
    assert!(styles.contains(r#"<item name="android:windowLightStatusBar">true</item>"#));

    project
        .command()
        .arg("apply-mods")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
    Ok(())
}

#[test]
fn test_apply_mods_unknown_plugin_fails() -> io::Result<()> {
    let project = Project::single_camera()?;
    fs::write(
        project.root().join("app.json"),
        r#"{ "expo": { "plugins": ["statusBar", "expo-unknown"] } }"#,
    )?;
    project
        .command()
        .arg("apply-mods")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown mod 'expo-unknown'"));
    assert!(!project
        .root()
        .join("android/app/src/main/res/values/styles.xml")
        .exists());
    Ok(())
}

#[test]
fn test_apply_mods_rejects_resolver_flags() -> io::Result<()> {
    let project = Project::single_camera()?;
    project
        .command()
        .args(["apply-mods", "--exclude", "camera"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--exclude"));
    Ok(())
}
