#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn vigil(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vigil").unwrap();
    cmd.current_dir(dir.path())
        .env("VIGIL_VAULT", dir.path())
        .env_remove("VIGIL_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn drop_folder(dir: &TempDir) -> PathBuf {
    let drop = dir.path().join("drop");
    std::fs::create_dir_all(&drop).unwrap();
    drop
}

fn files_in(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|x| x.to_str()) == Some(ext))
        .collect();
    out.sort();
    out
}

// ---------------------------------------------------------------------------
// vigil init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_vault_folders() {
    let dir = TempDir::new().unwrap();
    vigil(&dir).arg("init").assert().success();

    for folder in ["Needs_Action", "Plans", "Done", "Pending_Approval", "Logs"] {
        assert!(dir.path().join(folder).is_dir(), "{folder} missing");
    }
    assert!(dir.path().join(".vigil.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    vigil(&dir).arg("init").assert().success();
    vigil(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .vigil.yaml"));
}

// ---------------------------------------------------------------------------
// vigil watch files
// ---------------------------------------------------------------------------

#[test]
fn watch_files_once_creates_record_and_audit_entry() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("report.pdf"), vec![0u8; 2048]).unwrap();

    vigil(&dir)
        .args(["watch", "files", "--once", "--watch"])
        .arg(&drop)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created"));

    let record = dir.path().join("Needs_Action/FILE_report.pdf.md");
    let text = std::fs::read_to_string(&record).unwrap();
    assert!(text.starts_with("---\ntype: file_drop\n"));
    assert!(text.contains("original_name: report.pdf"));
    assert!(text.contains("size_bytes: 2048"));
    assert!(dir.path().join("Needs_Action/report.pdf").exists());

    let logs = files_in(&dir.path().join("Logs"), "json");
    assert_eq!(logs.len(), 1);
    let entries: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&logs[0]).unwrap()).unwrap();
    assert_eq!(entries[0]["action_type"], "file_detected");
    assert_eq!(entries[0]["watcher"], "FileSystemWatcher");
}

#[test]
fn watch_files_once_twice_records_once() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("a.txt"), "hello").unwrap();

    for _ in 0..2 {
        vigil(&dir)
            .args(["watch", "files", "--once", "--watch"])
            .arg(&drop)
            .assert()
            .success();
    }

    let records = files_in(&dir.path().join("Needs_Action"), "md");
    assert_eq!(records.len(), 1);
    let saved = std::fs::read_to_string(dir.path().join(".processed_files")).unwrap();
    assert_eq!(saved, r#"["a.txt"]"#);
}

#[test]
fn watch_files_once_json_report() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("notes.md"), "x").unwrap();

    let out = vigil(&dir)
        .args(["--json", "watch", "files", "--once", "--watch"])
        .arg(&drop)
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["new_items"], 1);
    assert_eq!(report["created"][0]["filename"], "FILE_notes.md");
    assert!(report["error"].is_null());
}

#[test]
fn watch_files_demo_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("invoice.pdf"), "x").unwrap();

    vigil(&dir)
        .args(["watch", "files", "--demo", "--watch"])
        .arg(&drop)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create 1 action files"))
        .stdout(predicate::str::contains("invoice.pdf"));

    assert!(files_in(&dir.path().join("Needs_Action"), "md").is_empty());
    assert!(files_in(&dir.path().join("Logs"), "json").is_empty());
    assert!(!dir.path().join(".processed_files").exists());
}

#[test]
fn watch_files_missing_folder_fails() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["watch", "files", "--once", "--watch"])
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn watch_files_without_target_fails() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["watch", "files", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("watch folder"));
}

#[test]
fn watch_files_uses_configured_folder() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("b.txt"), "b").unwrap();
    std::fs::write(
        dir.path().join(".vigil.yaml"),
        format!("files:\n  watch: {}\n", drop.display()),
    )
    .unwrap();

    vigil(&dir)
        .args(["watch", "files", "--once"])
        .assert()
        .success();
    assert!(dir.path().join("Needs_Action/FILE_b.txt.md").exists());
}

#[test]
fn watch_rejects_demo_with_once() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    vigil(&dir)
        .args(["watch", "files", "--demo", "--once", "--watch"])
        .arg(&drop)
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// vigil watch inbox / chat / network
// ---------------------------------------------------------------------------

#[test]
fn watch_inbox_once_from_spool() {
    let dir = TempDir::new().unwrap();
    let spool = dir.path().join("mail");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(
        spool.join("m1.json"),
        r#"{"id":"m1","from":"Ann Lee <ann@example.com>","subject":"Invoice 42","body":"Please pay."}"#,
    )
    .unwrap();

    vigil(&dir)
        .args(["watch", "inbox", "--once", "--spool"])
        .arg(&spool)
        .assert()
        .success();

    let text =
        std::fs::read_to_string(dir.path().join("Needs_Action/EMAIL_m1_Ann_Lee.md")).unwrap();
    assert!(text.contains("type: email"));
    assert!(text.contains("subject: Invoice 42"));
}

#[test]
fn watch_chat_keyword_override() {
    let dir = TempDir::new().unwrap();
    let spool = dir.path().join("chat");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(
        spool.join("1.json"),
        r#"{"chat":"Ops","preview":"rollout blocked","received":"2026-02-01T12:00:00Z"}"#,
    )
    .unwrap();

    vigil(&dir)
        .args(["watch", "chat", "--once", "--keyword", "blocked", "--spool"])
        .arg(&spool)
        .assert()
        .success();

    let records = files_in(&dir.path().join("Needs_Action"), "md");
    assert_eq!(records.len(), 1);
    let text = std::fs::read_to_string(&records[0]).unwrap();
    assert!(text.contains("priority: high"));
    assert!(text.contains("urgent: true"));
}

#[test]
fn watch_network_missing_spool_fails() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["watch", "network", "--once", "--spool"])
        .arg(dir.path().join("absent"))
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// vigil log / pending
// ---------------------------------------------------------------------------

#[test]
fn log_shows_todays_entries() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("c.txt"), "c").unwrap();
    vigil(&dir)
        .args(["watch", "files", "--once", "--watch"])
        .arg(&drop)
        .assert()
        .success();

    vigil(&dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("file_detected"))
        .stdout(predicate::str::contains("FileSystemWatcher"));
}

#[test]
fn log_empty_day() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["log", "--date", "2020-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries for 2020-01-01"));
}

#[test]
fn log_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["log", "--date", "yesterday"])
        .assert()
        .failure();
}

#[test]
fn pending_lists_records() {
    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("d.txt"), "d").unwrap();
    vigil(&dir)
        .args(["watch", "files", "--once", "--watch"])
        .arg(&drop)
        .assert()
        .success();
    std::fs::write(dir.path().join("Needs_Action/broken.md"), "no header here").unwrap();

    let out = vigil(&dir).args(["--json", "pending"]).output().unwrap();
    assert!(out.status.success());
    let records: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["file"], "FILE_d.txt.md");
    assert_eq!(records[0]["kind"], "file_drop");
    assert_eq!(records[0]["status"], "pending");
}

#[test]
fn pending_on_empty_vault() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing waiting"));
}

// ---------------------------------------------------------------------------
// vigil config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_defaults() {
    let dir = TempDir::new().unwrap();
    vigil(&dir).arg("init").assert().success();
    vigil(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".vigil.yaml"), "chat:\n  interval_secs: 0\n").unwrap();
    vigil(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] chat.interval_secs"));
}

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("interval_secs: 300"));
}

// ---------------------------------------------------------------------------
// continuous mode
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn continuous_watch_exits_cleanly_on_sigterm() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let dir = TempDir::new().unwrap();
    let drop = drop_folder(&dir);
    std::fs::write(drop.join("e.txt"), "e").unwrap();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("vigil"))
        .args(["watch", "files", "--interval", "60", "--watch"])
        .arg(&drop)
        .env("VIGIL_VAULT", dir.path())
        .env_remove("VIGIL_LOG_FILE")
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The first tick has run once the dedup state is on disk.
    let started = Instant::now();
    while !dir.path().join(".processed_files").exists() {
        assert!(started.elapsed() < Duration::from_secs(20), "first tick never ran");
        std::thread::sleep(Duration::from_millis(50));
    }
    std::thread::sleep(Duration::from_millis(300));

    let sent = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let waited = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if waited.elapsed() > Duration::from_secs(10) {
            child.kill().unwrap();
            panic!("watcher did not stop after SIGTERM");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success(), "exit status: {status:?}");
    assert!(dir.path().join("Needs_Action/FILE_e.txt.md").exists());
}
