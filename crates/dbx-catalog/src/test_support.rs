//! Seeded SQLite fixture shared by the unit tests

use crate::catalog::CatalogReader;
use crate::connection::ConnectionProvider;
use dbx_core::{CatalogConfig, DatabaseConfig};
use std::sync::Arc;
use tempfile::TempDir;

const SEED: &[&str] = &[
    "CREATE TABLE studios (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        city VARCHAR(80),
        created_at TEXT
    )",
    "INSERT INTO studios (id, name, city, created_at) VALUES
        (1, 'Lumen Studio', 'Berlin', '2024-01-10'),
        (2, 'Studio Red Door', 'Berlin', '2024-02-01'),
        (3, 'North Light', NULL, NULL)",
    "CREATE TABLE contacts (
        id INTEGER PRIMARY KEY,
        studio_id INTEGER REFERENCES studios(id),
        email TEXT UNIQUE,
        phone TEXT
    )",
    "CREATE INDEX idx_contacts_phone ON contacts(phone)",
    "INSERT INTO contacts (id, studio_id, email, phone) VALUES
        (1, 1, 'hello@lumen.example', '+49 30 1234'),
        (2, 2, 'info@reddoor.example', NULL)",
    "CREATE TABLE faq (
        id INTEGER PRIMARY KEY,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )",
    "INSERT INTO faq (id, question, answer, sort_order) VALUES
        (1, 'How do I book a studio?', 'Use the booking form.', 0),
        (2, 'Can I cancel?', 'Up to 48 hours before.', 1),
        (3, 'Is parking available?', 'Yes, on site.', 2)",
    "CREATE TABLE venues (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        venue_type TEXT,
        capacity INTEGER
    )",
    "INSERT INTO venues (id, name, venue_type, capacity) VALUES
        (1, 'Main Hall', 'hall', 120),
        (2, 'Loft', 'loft', 40)",
    "CREATE TABLE gallery_images (
        id INTEGER PRIMARY KEY,
        venue_id INTEGER REFERENCES venues(id),
        caption TEXT,
        thumbnail BLOB
    )",
    "INSERT INTO gallery_images (id, venue_id, caption, thumbnail) VALUES
        (1, 1, 'Photo of the main hall', X'89504E47'),
        (2, 2, NULL, NULL)",
    "CREATE TABLE database_registry (
        name TEXT NOT NULL,
        prefix TEXT NOT NULL,
        description TEXT,
        import_date TEXT
    )",
    "INSERT INTO database_registry (name, prefix, description, import_date) VALUES
        ('Studio Directory', 'studio', 'Studios imported from the legacy CSV', '2024-03-01'),
        ('Media', 'gallery', 'Gallery uploads', NULL)",
];

/// Provider over a fresh `explorer.db` holding the fixture tables
pub(crate) async fn seeded() -> (TempDir, Arc<ConnectionProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/explorer.db?mode=rwc", dir.path().display());
    let provider = Arc::new(
        ConnectionProvider::new(DatabaseConfig {
            url,
            ..Default::default()
        })
        .unwrap(),
    );

    for statement in SEED {
        provider.run(statement, &[]).await.unwrap();
    }

    (dir, provider)
}

pub(crate) async fn seeded_reader() -> (TempDir, CatalogReader) {
    let (dir, provider) = seeded().await;
    (dir, CatalogReader::new(provider, CatalogConfig::default()))
}
