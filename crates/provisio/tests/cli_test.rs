#![allow(deprecated)] // TODO: Command::cargo_bin を cargo_bin_cmd! に置き換える

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// 設定ファイルも環境変数も無い状態で provisio を実行する
fn provisio(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("provisio").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("PROVISIO_CONFIG_PATH")
        .env_remove("PROVISIO_API_URL")
        .env_remove("PROVISIO_TOKEN")
        .env_remove("PROVISIO_POLL_INTERVAL")
        .env_remove("PROVISIO_NOT_FOUND_GRACE")
        .env_remove("PROVISIO_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプにサブコマンドが並ぶことを確認
#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wait"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("kinds"));
}

#[test]
fn test_wait_help() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .args(["wait", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--location"))
        .stdout(predicate::str::contains("--absent"))
        .stdout(predicate::str::contains("--timeout"));
}

/// kinds は設定も API も不要
#[test]
fn test_kinds_lists_registered_kinds() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("server"))
        .stdout(predicate::str::contains("k8s-cluster"))
        .stdout(predicate::str::contains("request"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .args(["wait", "--kind", "toaster", "--id", "t-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("toaster"));
}

#[test]
fn test_wait_requires_location_or_id() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .args(["wait", "--kind", "server"])
        .assert()
        .failure();
}

#[test]
fn test_location_and_id_conflict() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .args([
            "wait",
            "--kind",
            "request",
            "--location",
            "/requests/1/status",
            "--id",
            "1",
        ])
        .assert()
        .failure();
}

/// API の URL が無ければ問い合わせ前に失敗する
#[test]
fn test_wait_without_api_url() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .args(["wait", "--kind", "server", "--id", "srv-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PROVISIO_API_URL"));
}

#[test]
fn test_broken_settings_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("provisio.yaml"), "poll_interval_secs: [\n").unwrap();

    provisio(home.path())
        .args(["wait", "--kind", "server", "--id", "srv-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("provisio.yaml"));
}

/// 到達できない API はタイムアウト (終了コード 2) として報告される
#[test]
fn test_unreachable_api_times_out() {
    let home = tempfile::tempdir().unwrap();
    provisio(home.path())
        .env("PROVISIO_API_URL", "http://127.0.0.1:9")
        .env("PROVISIO_POLL_INTERVAL", "1")
        .args(["wait", "--kind", "server", "--id", "srv-1", "--timeout", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("タイムアウト"))
        .stderr(predicate::str::contains("進行中の可能性"));
}

/// 壊れた設定ファイルがあっても kinds は動く
#[test]
fn test_kinds_ignores_settings_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("provisio.yaml"), "poll_interval_secs: [\n").unwrap();

    provisio(home.path())
        .arg("kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("server"));
}
