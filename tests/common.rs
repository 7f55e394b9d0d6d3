//! Common test utilities and helpers
#![allow(dead_code)]

use axum::Router;
use dbx_catalog::{ConnectionProvider, DatabaseExplorer};
use dbx_core::DbxConfig;
use dbx_server::{AuthGate, BearerTokenGate, create_router};
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Site schema: studios with contacts, an FAQ, venues with gallery images,
/// and a registry claiming the studio and gallery tables.
const SITE_SCHEMA: &[&str] = &[
    "CREATE TABLE studios (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT)",
    "INSERT INTO studios VALUES (1, 'Lumen Studio', 'Berlin'), (2, 'Studio Nord', 'Hamburg'), (3, 'Blue Room', NULL)",
    "CREATE TABLE studio_contacts (
        id INTEGER PRIMARY KEY,
        studio_id INTEGER NOT NULL REFERENCES studios(id),
        email TEXT UNIQUE
    )",
    "INSERT INTO studio_contacts VALUES (1, 1, 'hi@lumen.example'), (2, 3, 'blue@room.example')",
    "CREATE TABLE faq (
        id INTEGER PRIMARY KEY,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        sort_order INTEGER NOT NULL
    )",
    "INSERT INTO faq VALUES
        (1, 'How do I book?', 'Online.', 0),
        (2, 'Can I cancel?', 'Yes.', 1),
        (3, 'Is there parking?', 'Nearby.', 2)",
    "CREATE TABLE venues (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "INSERT INTO venues VALUES (1, 'Main Hall')",
    "CREATE TABLE gallery_images (
        id INTEGER PRIMARY KEY,
        venue_id INTEGER REFERENCES venues(id),
        image BLOB
    )",
    "INSERT INTO gallery_images VALUES (1, 1, X'FFD8FF')",
    "CREATE TABLE database_registry (name TEXT, prefix TEXT, description TEXT, import_date TEXT)",
    "INSERT INTO database_registry VALUES
        ('Studios', 'studio', 'Studio directory', '2024-05-01'),
        ('Gallery', 'gallery', NULL, NULL)",
];

/// Configuration pointing at a fresh SQLite file inside `dir`
pub fn config_for(dir: &TempDir) -> DbxConfig {
    DbxConfig::test_defaults(format!(
        "sqlite://{}/site.db?mode=rwc",
        dir.path().display()
    ))
}

pub async fn seed(provider: &ConnectionProvider) {
    for sql in SITE_SCHEMA {
        provider.run(sql, &[]).await.expect("seed statement failed");
    }
}

/// Explorer over a seeded database; keep the `TempDir` alive for the test
pub async fn seeded_explorer() -> (TempDir, Arc<DatabaseExplorer>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let explorer = DatabaseExplorer::from_config(&config_for(&dir)).expect("valid config");
    seed(explorer.provider()).await;
    (dir, Arc::new(explorer))
}

/// Full router over a seeded database, guarded by [`ADMIN_TOKEN`]
pub async fn seeded_app() -> (TempDir, Router) {
    let (dir, explorer) = seeded_explorer().await;
    let gate: Arc<dyn AuthGate> = Arc::new(BearerTokenGate::new(Some(ADMIN_TOKEN.to_string())));
    (dir, create_router(explorer, gate))
}
