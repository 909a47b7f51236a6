//! SQL migration definitions for the leadkit database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: leads",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS leads (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name   TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
    last_name    TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
    email        TEXT NOT NULL CHECK (length(trim(email)) > 0),
    job_title    TEXT,
    country_code TEXT,
    company_name TEXT,
    gender       TEXT,
    -- dedup_key(first_name, last_name), written by the application
    name_key     TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- Duplicate lookups match on the folded name pair
CREATE INDEX IF NOT EXISTS idx_leads_name_key ON leads(name_key);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Enrichment columns: message, email_verified",
            sql: r#"
ALTER TABLE leads ADD COLUMN message TEXT;
ALTER TABLE leads ADD COLUMN email_verified INTEGER;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
