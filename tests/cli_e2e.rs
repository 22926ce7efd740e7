//! End-to-end CLI tests for chatzip.
//!
//! These tests verify the complete CLI workflow by running the actual binary
//! with various arguments and checking the output.
//!
//! # Test Categories
//!
//! - **Listing**: text, CSV and JSON output, filters, owner detection
//! - **Splitting**: default output name, media selection flags, progress
//! - **Media**: inventory and reference counts
//! - **Error handling**: Proper error messages for bad input
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test cli_e2e
//! ```

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};
use zip::write::SimpleFileOptions;

// ============================================================================
// Test Fixtures
// ============================================================================

const CHAT: &str = "\
10/01/2024, 08:00 - Messages and calls are end-to-end encrypted.
10/01/2024, 08:00 - Alice: Good morning
12/01/2024, 09:15 - Bob: IMG-20240112-WA0001.jpg (file attached)
holiday photo
15/01/2024, 10:30 - Alice: Holiday plans?
20/01/2024, 18:30 - Bob: PTT-20240120-WA0002.opus (file attached)
25/01/2024, 12:00 - Alice: see you";

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();
    fs::write(path, bytes).unwrap();
}

/// Creates a temporary directory holding `chat.zip` and a few bad inputs.
fn setup_fixtures() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");

    write_zip(
        &dir.path().join("chat.zip"),
        &[
            ("_chat.txt", CHAT.as_bytes()),
            ("IMG-20240112-WA0001.jpg", b"jpeg-bytes"),
            ("PTT-20240120-WA0002.opus", b"opus-bytes"),
            ("STK-20240125-WA0003.webp", b"webp-bytes"),
        ],
    );

    fs::write(dir.path().join("not_a_zip.zip"), "just some text").unwrap();

    dir
}

fn chatzip_cmd() -> Command {
    Command::from_std(std::process::Command::new(env!("CARGO_BIN_EXE_chatzip")))
}

fn fixture(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

fn output_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Reads every entry of a ZIP file into (name, contents) pairs, sorted by name.
fn zip_contents(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.push((file.name().to_string(), data));
    }
    entries.sort();
    entries
}

fn entry_names(path: &Path) -> Vec<String> {
    zip_contents(path).into_iter().map(|(name, _)| name).collect()
}

// ============================================================================
// Listing
// ============================================================================

mod listing {
    use super::*;

    #[test]
    fn test_list_text_reproduces_lines() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip")])
            .assert()
            .success()
            .stdout(predicate::str::contains("10/01/2024, 08:00 - Alice: Good morning"))
            .stdout(predicate::str::contains(
                "12/01/2024, 09:15 - Bob: IMG-20240112-WA0001.jpg (file attached)\nholiday photo",
            ))
            .stdout(predicate::str::contains("end-to-end encrypted").not())
            .stderr(predicate::str::contains("📦 chat.zip: 5 messages, 3 media"));
    }

    #[test]
    fn test_list_alias() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["ls", &fixture(&dir, "chat.zip")])
            .assert()
            .success()
            .stdout(predicate::str::contains("see you"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip"), "--search", "HOLIDAY"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Holiday plans?"))
            .stdout(predicate::str::contains("holiday photo"))
            .stdout(predicate::str::contains("Good morning").not())
            .stderr(predicate::str::contains("🔍 2 of 5 messages matched"));
    }

    #[test]
    fn test_date_range_end_is_inclusive() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args([
                "list",
                &fixture(&dir, "chat.zip"),
                "--after",
                "2024-01-15",
                "--before",
                "2024-01-20",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Holiday plans?"))
            .stdout(predicate::str::contains("PTT-20240120-WA0002.opus"))
            .stdout(predicate::str::contains("see you").not())
            .stdout(predicate::str::contains("Good morning").not());
    }

    #[test]
    fn test_sender_filter_csv() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip"), "--from", "bob", "-f", "csv", "-t"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Timestamp;Sender;Text"))
            .stdout(predicate::str::contains("2024-01-20 18:30:00;Bob;"))
            .stdout(predicate::str::contains("Alice").not());
    }

    #[test]
    fn test_json_with_attachments() {
        let dir = setup_fixtures();

        let output = chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip"), "-f", "json", "-a"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[1]["attachments"][0], "IMG-20240112-WA0001.jpg");
        assert_eq!(records[0]["attachments"], serde_json::json!([]));
    }

    #[test]
    fn test_output_file() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "listing.jsonl");

        chatzip_cmd()
            .args([
                "list",
                &fixture(&dir, "chat.zip"),
                "-f",
                "jsonl",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("💾 Wrote 5 messages"));

        assert_eq!(fs::read_to_string(&output).unwrap().lines().count(), 5);
    }

    #[test]
    fn test_owner_detected_and_configured() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip")])
            .assert()
            .success()
            .stderr(predicate::str::contains("👤 Owner: Alice (3 own messages)"));

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip"), "--owner", "Bob"])
            .assert()
            .success()
            .stderr(predicate::str::contains("👤 Owner: Bob (2 own messages)"));
    }

    #[test]
    fn test_month_first_flag() {
        let dir = setup_fixtures();

        // 10/01 read as October 1st falls outside January
        chatzip_cmd()
            .args([
                "--month-first",
                "list",
                &fixture(&dir, "chat.zip"),
                "--after",
                "2024-10-01",
                "--before",
                "2024-10-01",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Good morning"))
            .stdout(predicate::str::contains("Holiday plans?").not());
    }
}

// ============================================================================
// Splitting
// ============================================================================

mod splitting {
    use super::*;

    #[test]
    fn test_split_default_output_name() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .current_dir(dir.path())
            .args(["split", "chat.zip", "--start", "2024-01-12", "--end", "2024-01-20"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "✅ Done! Split saved to chat-split-202401120000-202401202359.zip",
            ))
            .stdout(predicate::str::contains("Messages:     3"));

        let split = output_path(&dir, "chat-split-202401120000-202401202359.zip");
        let contents = zip_contents(&split);
        let names: Vec<&str> = contents.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec!["IMG-20240112-WA0001.jpg", "PTT-20240120-WA0002.opus", "_chat.txt"]
        );

        let transcript = String::from_utf8(contents[2].1.clone()).unwrap();
        assert_eq!(
            transcript,
            "\
12/01/2024, 09:15 - Bob: IMG-20240112-WA0001.jpg (file attached)
holiday photo
15/01/2024, 10:30 - Alice: Holiday plans?
20/01/2024, 18:30 - Bob: PTT-20240120-WA0002.opus (file attached)"
        );
        assert_eq!(contents[0].1, b"jpeg-bytes");
    }

    #[test]
    fn test_split_no_media() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "text_only.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-01",
                "--end",
                "2024-01-31",
                "--no-media",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert_eq!(entry_names(&output), vec!["_chat.txt"]);
    }

    #[test]
    fn test_split_no_chat() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "media_only.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-01",
                "--end",
                "2024-01-31",
                "--no-chat",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert_eq!(
            entry_names(&output),
            vec!["IMG-20240112-WA0001.jpg", "PTT-20240120-WA0002.opus"]
        );
    }

    #[test]
    fn test_split_media_extension_allow_list() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "jpg_only.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-01",
                "--end",
                "2024-01-31",
                "--media-ext",
                ".JPG",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Skipped PTT-20240120-WA0002.opus: extension not allowed",
            ));

        assert_eq!(
            entry_names(&output),
            vec!["IMG-20240112-WA0001.jpg", "_chat.txt"]
        );
    }

    #[test]
    fn test_split_all_media() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "everything.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-10",
                "--end",
                "2024-01-10",
                "--all-media",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert_eq!(entry_names(&output).len(), 4);
    }

    #[test]
    fn test_split_in_range_media_policy() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "dated.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-25",
                "--end",
                "2024-01-25",
                "--media",
                "in-range",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert_eq!(
            entry_names(&output),
            vec!["STK-20240125-WA0003.webp", "_chat.txt"]
        );
    }

    #[test]
    fn test_split_empty_range() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "empty.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2023-01-01",
                "--end",
                "2023-12-31",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("No messages fall inside the range"));

        assert!(entry_names(&output).is_empty());
    }

    #[test]
    fn test_split_with_progress() {
        let dir = setup_fixtures();
        let output = output_path(&dir, "progress.zip");

        chatzip_cmd()
            .args([
                "split",
                &fixture(&dir, "chat.zip"),
                "--start",
                "2024-01-01",
                "--end",
                "2024-01-31",
                "--progress",
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert!(output.exists());
    }

    #[test]
    fn test_split_reversed_range_fails() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .current_dir(dir.path())
            .args(["split", "chat.zip", "--start", "2024-01-20", "--end", "2024-01-10"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error"))
            .stderr(predicate::str::contains("Invalid range"));

        // nothing written
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}

// ============================================================================
// Media inventory
// ============================================================================

mod media {
    use super::*;

    #[test]
    fn test_media_listing() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["media", &fixture(&dir, "chat.zip")])
            .assert()
            .success()
            .stdout(predicate::str::contains("📄 transcript  _chat.txt"))
            .stdout(predicate::str::contains("image     IMG-20240112-WA0001.jpg"))
            .stdout(predicate::str::contains("audio     PTT-20240120-WA0002.opus"))
            .stdout(predicate::str::contains("sticker   STK-20240125-WA0003.webp"))
            .stdout(predicate::str::contains("📊 3 media, 2 referenced, 1 unreferenced"));
    }

    #[test]
    fn test_media_linked_counts() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["media", &fixture(&dir, "chat.zip"), "--linked"])
            .assert()
            .success()
            .stdout(predicate::str::contains("IMG-20240112-WA0001.jpg  (1 refs)"))
            .stdout(predicate::str::contains("STK-20240125-WA0003.webp  (0 refs)"));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn test_nonexistent_file() {
        chatzip_cmd()
            .args(["list", "/nonexistent/path/chat.zip"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error"));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["media", &fixture(&dir, "not_a_zip.zip")])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot read archive"));
    }

    #[test]
    fn test_invalid_date_format() {
        let dir = setup_fixtures();

        chatzip_cmd()
            .args(["list", &fixture(&dir, "chat.zip"), "--after", "01/15/2024"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid date"));
    }

    #[test]
    fn test_missing_range_arguments() {
        chatzip_cmd()
            .args(["split", "chat.zip", "--start", "2024-01-01"])
            .assert()
            .failure();
    }

    #[test]
    fn test_invalid_format_option() {
        chatzip_cmd()
            .args(["list", "chat.zip", "-f", "xml"])
            .assert()
            .failure();
    }

    #[test]
    fn test_all_media_conflicts_with_media_policy() {
        chatzip_cmd()
            .args([
                "split", "chat.zip", "--start", "2024-01-01", "--end", "2024-01-02",
                "--all-media", "--media", "linked",
            ])
            .assert()
            .failure();
    }
}

// ============================================================================
// Help and version
// ============================================================================

mod meta {
    use super::*;

    #[test]
    fn test_help() {
        chatzip_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("chatzip"))
            .stdout(predicate::str::contains("split"));
    }

    #[test]
    fn test_version() {
        chatzip_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_no_subcommand_fails() {
        chatzip_cmd().assert().failure();
    }
}
