//! Local city notebook: search a fixed catalog of Dutch cities, save the ones
//! you care about, and keep free-text notes on them that persist on disk.
//!
//! The interesting part is the persistence layer. A [`collection::CollectionStore`]
//! owns the saved list in memory, notifies subscribers on every change, and
//! queues full-snapshot writes to a durable key-value backend through a single
//! writer task, so writes land in mutation order and never block the caller.
//! [`autosave::NotesEditor`] debounces note edits on top of it.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`catalog`] — Read-only city catalog and `find_best_match` search
//! - [`collection`] — Saved-city store, snapshot types, and the durable write queue
//! - [`autosave`] — Debounced notes editing driven by an injectable clock
//! - [`storage`] — Key-value backend trait with SQLite and in-memory implementations
//! - [`db`] — SQLite database initialization, schema, migrations, and health checks

pub mod autosave;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod db;
pub mod storage;
