//! Integration tests for full pipeline runs
//!
//! Builds real ZIP archives in a temporary directory and checks the NDJSON
//! output and failure log after each run.

use harvest_archive::{expand_patterns, ArchiveSet};
use harvest_pipeline::{
    CancellationToken, Pipeline, PipelineConfig, ProgressObserver, RejectionKind, RunSummary,
};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Helper: FB2 document with the given genre and language
fn book_xml(genre: &str, lang: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
  <description>
    <title-info>
      <genre>{genre}</genre>
      <author><first-name>Аркадий</first-name><last-name>Стругацкий</last-name></author>
      <book-title>Пикник на обочине</book-title>
      <annotation><p>Аннотация</p></annotation>
      <lang>{lang}</lang>
    </title-info>
  </description>
  <body><section><p>{body}</p></section></body>
</FictionBook>"#
    )
}

/// Helper: write a ZIP archive with the given entries
fn write_zip(dir: &Path, name: &str, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();
    for (entry_name, contents) in entries {
        zip.start_file(entry_name.as_str(), options).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// Helper: stored (uncompressed) archive whose `2.fb2` fails its CRC check
fn write_corrupt_zip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for i in 0..4 {
        let body = if i == 2 { "DAMAGED-RECORD".to_string() } else { format!("Текст {i}") };
        zip.start_file(format!("{i}.fb2"), options).unwrap();
        zip.write_all(book_xml("sf_space", "ru", &body).as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let marker = b"DAMAGED-RECORD";
    let at = bytes
        .windows(marker.len())
        .position(|window| window == marker)
        .unwrap();
    bytes[at] = b'X';
    fs::write(&path, bytes).unwrap();
    path
}

/// Helper: a mixed archive of fiction, non-fiction, foreign and broken entries
fn mixed_entries(count: usize) -> Vec<(String, Vec<u8>)> {
    (0..count)
        .map(|i| {
            let contents = match i % 5 {
                0 => book_xml("sf_space", "ru", &format!("Фантастика {i}")),
                1 => book_xml("prose_classic", "ru", &format!("Проза {i}")),
                2 => book_xml("sf_space", "en", "English"),
                3 => "<FictionBook><description>".to_string(),
                _ => book_xml("det_classic", "ru", &format!("Детектив {i}")),
            };
            (format!("{i}.fb2"), contents.into_bytes())
        })
        .collect()
}

fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig::new(dir.join("books.ndjson"), dir.join("failures.log"))
}

fn run(config: PipelineConfig, archives: &ArchiveSet) -> RunSummary {
    Pipeline::new(config).unwrap().run(archives).unwrap()
}

fn output_lines(dir: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(dir.join("books.ndjson"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Failure-log lines without their timestamp columns
fn failure_lines(dir: &Path) -> BTreeSet<String> {
    fs::read_to_string(dir.join("failures.log"))
        .unwrap()
        .lines()
        .map(|line| line.splitn(3, ' ').nth(2).unwrap().to_string())
        .collect()
}

#[test]
fn test_results_independent_of_concurrency() {
    let fixtures = TempDir::new().unwrap();
    let archive = write_zip(fixtures.path(), "lib.zip", &mixed_entries(60));
    let archives = ArchiveSet::from_paths([archive]);

    let mut outputs = Vec::new();
    for concurrency in [1, 8] {
        let out = TempDir::new().unwrap();
        let mut config = config(out.path());
        config.concurrency = concurrency;
        config.seed = Some(99);
        let summary = run(config, &archives);

        assert_eq!(summary.entries_finished(), 60);

        let ids: BTreeSet<String> = output_lines(out.path())
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        outputs.push((ids, failure_lines(out.path()), summary.accepted, summary.filtered));
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_malformed_entries_are_isolated() {
    let fixtures = TempDir::new().unwrap();
    let entries = vec![
        ("good.fb2".to_string(), book_xml("sf_space", "ru", "Текст").into_bytes()),
        ("broken.fb2".to_string(), b"<FictionBook><description><title-info>".to_vec()),
        ("binary.fb2".to_string(), vec![0x50, 0x4b, 0x00, 0x00, 0xff]),
        (
            "nobody.fb2".to_string(),
            book_xml("sf_space", "ru", "x")
                .replace("<body><section><p>x</p></section></body>", "")
                .into_bytes(),
        ),
        ("good2.fb2".to_string(), book_xml("sf_epic", "ru", "Ещё").into_bytes()),
    ];
    let archive = write_zip(fixtures.path(), "lib.zip", &entries);

    let out = TempDir::new().unwrap();
    let summary = run(config(out.path()), &ArchiveSet::from_paths([archive.clone()]));

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected_count(RejectionKind::MalformedMarkup), 1);
    assert_eq!(summary.rejected_count(RejectionKind::DecodeError), 1);
    assert_eq!(summary.rejected_count(RejectionKind::MissingBody), 1);

    let log = failure_lines(out.path());
    let prefix = archive.display().to_string();
    assert!(log.contains(&format!(
        "ERROR missing_body {prefix}/nobody.fb2: Expected exactly one body, found 0"
    )));
    assert!(log.iter().any(|l| l.starts_with(&format!("ERROR decode_error {prefix}/binary.fb2: "))));
    assert!(log.iter().any(|l| l.starts_with(&format!("ERROR malformed_markup {prefix}/broken.fb2: "))));

    let books = output_lines(out.path());
    let good = books.iter().find(|b| b["file_name"] == "good.fb2").unwrap();
    assert_eq!(good["id"], format!("{prefix}/good.fb2"));
    assert_eq!(good["book_title"], "Пикник на обочине");
    assert_eq!(good["annotation"], "Аннотация");
    assert_eq!(good["author"][0]["first_name"], "Аркадий");
    assert_eq!(good["author"][0]["middle_name"], "");
}

#[test]
fn test_unopenable_archive_does_not_stop_run() {
    let fixtures = TempDir::new().unwrap();
    let broken = fixtures.path().join("a-broken.zip");
    fs::write(&broken, b"not a zip archive").unwrap();
    let good = write_zip(
        fixtures.path(),
        "b-good.zip",
        &[("1.fb2".to_string(), book_xml("sf_space", "ru", "Текст").into_bytes())],
    );

    let archives = expand_patterns(&format!("{}/*.zip", fixtures.path().display())).unwrap();
    assert_eq!(archives.paths(), [broken.clone(), good]);

    let out = TempDir::new().unwrap();
    let summary = run(config(out.path()), &archives);

    assert_eq!(summary.archives_total, 2);
    assert_eq!(summary.archives_failed, 1);
    assert_eq!(summary.archives_processed, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected_total(), 0);

    let log = failure_lines(out.path());
    assert!(log
        .iter()
        .any(|l| l.starts_with(&format!("ERROR archive_open_error {}: ", broken.display()))));
}

#[test]
fn test_corrupt_entry_does_not_stop_archive_or_run() {
    let fixtures = TempDir::new().unwrap();
    let first = write_corrupt_zip(fixtures.path(), "a.zip");
    let second = write_corrupt_zip(fixtures.path(), "b.zip");

    let out = TempDir::new().unwrap();
    let summary = run(
        config(out.path()),
        &ArchiveSet::from_paths([first.clone(), second.clone()]),
    );

    assert_eq!(summary.archives_processed, 2);
    assert_eq!(summary.archives_failed, 0);
    assert_eq!(summary.accepted, 6);
    assert_eq!(summary.rejected_count(RejectionKind::EntryReadError), 2);
    assert_eq!(summary.entries_finished(), 8);

    let log = failure_lines(out.path());
    assert_eq!(log.len(), 2);
    for archive in [&first, &second] {
        let prefix = format!("ERROR entry_read_error {}/2.fb2: ", archive.display());
        assert!(log.iter().any(|l| l.starts_with(&prefix)), "no read error for {prefix}");
    }

    let ids: BTreeSet<String> = output_lines(out.path())
        .iter()
        .map(|v| v["file_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, BTreeSet::from(["0.fb2", "1.fb2", "3.fb2"].map(str::to_string)));
}

#[test]
fn test_language_mismatch_logged_at_info() {
    let fixtures = TempDir::new().unwrap();
    let archive = write_zip(
        fixtures.path(),
        "lib.zip",
        &[("en.fb2".to_string(), book_xml("sf_space", "en", "Text").into_bytes())],
    );

    let out = TempDir::new().unwrap();
    let summary = run(config(out.path()), &ArchiveSet::from_paths([archive.clone()]));

    assert_eq!(summary.expected_rejections(), 1);
    assert_eq!(summary.defects(), 0);
    let log = failure_lines(out.path());
    assert_eq!(
        log.into_iter().collect::<Vec<_>>(),
        [format!(
            "INFO language_mismatch {}/en.fb2: Entry is not in Russian: lang is 'en'",
            archive.display()
        )]
    );
}

#[test]
fn test_fiction_kept_when_everything_else_is_discarded() {
    let fixtures = TempDir::new().unwrap();
    let entries: Vec<_> = (0..20)
        .map(|i| {
            let genre = if i % 2 == 0 { "litrpg" } else { "nonf_biography" };
            (format!("{i}.fb2"), book_xml(genre, "ru", "Текст").into_bytes())
        })
        .collect();
    let archive = write_zip(fixtures.path(), "lib.zip", &entries);

    let out = TempDir::new().unwrap();
    let mut config = config(out.path());
    config.discard_probability = 1.0;
    config.audit_filtered = true;
    let summary = run(config, &ArchiveSet::from_paths([archive]));

    assert_eq!(summary.accepted, 10);
    assert_eq!(summary.filtered, 10);
    assert!(output_lines(out.path())
        .iter()
        .all(|b| b["genre"][0] == "litrpg"));

    let log = failure_lines(out.path());
    assert_eq!(log.len(), 10);
    assert!(log.iter().all(|l| l.starts_with("INFO sampled_out ")));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let fixtures = TempDir::new().unwrap();
    let entries: Vec<_> = (0..200)
        .map(|i| (format!("{i}.fb2"), book_xml("prose_classic", "ru", "Текст").into_bytes()))
        .collect();
    let archive = write_zip(fixtures.path(), "lib.zip", &entries);
    let archives = ArchiveSet::from_paths([archive]);

    let ids = |concurrency: usize| {
        let out = TempDir::new().unwrap();
        let mut config = config(out.path());
        config.seed = Some(2024);
        config.concurrency = concurrency;
        let summary = run(config, &archives);
        let ids: BTreeSet<String> = output_lines(out.path())
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        (summary.accepted, ids)
    };

    let (kept, first) = ids(4);
    assert_eq!(ids(2).1, first);
    // about a quarter of non-fiction survives
    assert!((25..=80).contains(&kept), "kept {kept} of 200");
}

#[test]
fn test_body_truncated_by_characters() {
    let fixtures = TempDir::new().unwrap();
    let archive = write_zip(
        fixtures.path(),
        "lib.zip",
        &[("1.fb2".to_string(), book_xml("sf_space", "ru", "  Съешь же ещё этих мягких  ").into_bytes())],
    );

    let out = TempDir::new().unwrap();
    let mut config = config(out.path());
    config.truncate_to = 5;
    run(config, &ArchiveSet::from_paths([archive]));

    assert_eq!(output_lines(out.path())[0]["body"], "Съешь");
}

#[test]
fn test_windows_1251_entry() {
    let fixtures = TempDir::new().unwrap();
    let xml = book_xml("sf_space", "ru", "Тёмная сторона")
        .replace("encoding=\"utf-8\"", "encoding=\"windows-1251\"");
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(&xml);
    assert!(!had_errors);
    let archive = write_zip(fixtures.path(), "lib.zip", &[("cp.fb2".to_string(), bytes.into_owned())]);

    let out = TempDir::new().unwrap();
    let summary = run(config(out.path()), &ArchiveSet::from_paths([archive]));

    assert_eq!(summary.accepted, 1);
    assert_eq!(output_lines(out.path())[0]["body"], "Тёмная сторона");
}

#[test]
fn test_cancelled_run_submits_nothing() {
    let fixtures = TempDir::new().unwrap();
    let archive = write_zip(fixtures.path(), "lib.zip", &mixed_entries(10));

    let out = TempDir::new().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let summary = Pipeline::new(config(out.path()))
        .unwrap()
        .with_cancellation(token)
        .run(&ArchiveSet::from_paths([archive]))
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.entries_finished(), 0);
    assert_eq!(summary.archives_processed, 0);
    assert!(fs::read_to_string(out.path().join("books.ndjson")).unwrap().is_empty());
}

#[test]
fn test_outputs_truncated_on_start() {
    let out = TempDir::new().unwrap();
    fs::write(out.path().join("books.ndjson"), "stale\n").unwrap();
    fs::write(out.path().join("failures.log"), "stale\n").unwrap();

    let summary = run(config(out.path()), &ArchiveSet::default());

    assert_eq!(summary.archives_total, 0);
    assert!(fs::read_to_string(out.path().join("books.ndjson")).unwrap().is_empty());
    assert!(fs::read_to_string(out.path().join("failures.log")).unwrap().is_empty());
}

#[derive(Default)]
struct Counts {
    started: AtomicUsize,
    announced: AtomicUsize,
    finished: AtomicUsize,
    closed: AtomicUsize,
}

struct Counter(Arc<Counts>);

impl ProgressObserver for Counter {
    fn archive_started(&self, _path: &Path, entries: usize) {
        self.0.started.fetch_add(1, Ordering::SeqCst);
        self.0.announced.fetch_add(entries, Ordering::SeqCst);
    }

    fn entry_finished(&self, _path: &Path) {
        self.0.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn archive_finished(&self, _path: &Path) {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_observer_sees_every_entry() {
    let fixtures = TempDir::new().unwrap();
    let first = write_zip(fixtures.path(), "a.zip", &mixed_entries(12));
    let second = write_zip(fixtures.path(), "b.zip", &mixed_entries(7));

    let out = TempDir::new().unwrap();
    let counter = Arc::new(Counts::default());
    let summary = Pipeline::new(config(out.path()))
        .unwrap()
        .with_observer(Counter(Arc::clone(&counter)))
        .run(&ArchiveSet::from_paths([first, second]))
        .unwrap();

    assert_eq!(summary.entries_finished(), 19);
    assert_eq!(counter.started.load(Ordering::SeqCst), 2);
    assert_eq!(counter.announced.load(Ordering::SeqCst), 19);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 19);
    assert_eq!(counter.closed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unwritable_output_is_an_error() {
    let out = TempDir::new().unwrap();
    let mut config = config(out.path());
    config.output_path = out.path().join("missing-dir").join("books.ndjson");

    let err = Pipeline::new(config).unwrap().run(&ArchiveSet::default()).unwrap_err();
    assert!(matches!(err, harvest_pipeline::PipelineError::Output { .. }));
}
