//! Command-line interface for fb2-harvest
//!
//! This crate provides the `fb2-harvest` tool, which extracts Russian-language
//! FB2 books from ZIP archives into newline-delimited JSON.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/harvest-cli
//! ```
//!
//! # Quick Start
//!
//! ```bash
//! # Every archive in a directory
//! fb2-harvest --zip-files 'library/*.zip' --output books.ndjson --log failures.log
//!
//! # Several patterns, shorter bodies, reproducible sampling
//! fb2-harvest -z 'a/*.zip,b/fb2-0*.zip' -o books.ndjson -l failures.log \
//!     --truncate-to 10000 --seed 42
//!
//! # Keep only fiction
//! fb2-harvest -z 'library/*.zip' -o books.ndjson -l failures.log --discard-probability 1
//! ```
//!
//! # Output
//!
//! `--output` receives one JSON object per accepted book:
//!
//! ```json
//! {"id":"library/f.zip/42.fb2","genre":["sf_space"],
//!  "author":[{"first_name":"Иван","last_name":"Ефремов","middle_name":"","nick_name":""}],
//!  "book_title":"Туманность Андромеды","body":"...","annotation":"","file_name":"42.fb2"}
//! ```
//!
//! `--log` receives one line per entry that produced no record:
//!
//! ```text
//! 2024/03/01 12:00:00 INFO language_mismatch library/f.zip/43.fb2: Entry is not in Russian: lang is 'en'
//! ```
//!
//! # Configuration
//!
//! See [`config`] for the `.fb2-harvest.toml` format and precedence rules.
//!
//! # Logging
//!
//! Diagnostics go to stderr. `--verbose` raises the level to `info`,
//! `--quiet` lowers it to `error`; `RUST_LOG` overrides both.
//!
//! # Exit Codes
//!
//! - `0` - Run completed (individual entries may still have failed)
//! - `1` - Invalid configuration or output files could not be written
//! - `2` - Invalid arguments

pub mod config;
pub mod progress;
