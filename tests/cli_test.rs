use anyhow::Result;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_mamscan(workdir: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_mamscan"))
        .current_dir(workdir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()?)
}

fn files_under(dir: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            found.extend(files_under(&path)?);
        } else {
            found.push(path.display().to_string());
        }
    }
    Ok(found)
}

/// 參數錯誤：用法印到 stdout、結束碼 1、不寫任何檔案
fn assert_usage_failure(args: &[&str]) -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_mamscan(temp_dir.path(), args)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "args {:?}: {}", args, stdout);
    assert!(
        stdout.contains("Usage: mamscan project=<name>"),
        "args {:?} printed: {}",
        args,
        stdout
    );
    assert!(!temp_dir.path().join("result.tsv").exists());
    assert!(files_under(temp_dir.path())?.is_empty());

    Ok(())
}

#[test]
fn test_missing_project_argument() -> Result<()> {
    assert_usage_failure(&[])
}

#[test]
fn test_project_name_too_short() -> Result<()> {
    assert_usage_failure(&["project=ab"])
}

#[test]
fn test_wrong_argument_key() -> Result<()> {
    assert_usage_failure(&["name=magneto"])
}

#[test]
fn test_dry_run_lists_pending_searches_without_writing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let project_dir = temp_dir.path().join("magneto");
    std::fs::create_dir_all(&project_dir)?;
    std::fs::write(project_dir.join("organisms"), "Magnetococcus marinus\n")?;

    let output = run_mamscan(temp_dir.path(), &["project=magneto", "--dry-run"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", stdout);
    assert!(stdout.contains("pending  Magnetococcus_marinus-MamA"));
    assert!(stdout.contains("8 searches planned, 0 cached, 8 pending"));
    assert!(!project_dir.join("result.tsv").exists());
    assert!(!project_dir.join("saved_data").exists());

    Ok(())
}
