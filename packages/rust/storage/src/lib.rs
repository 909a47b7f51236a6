//! libSQL storage layer for leads (embedded, offline mode).
//!
//! The [`Storage`] struct wraps a local libSQL database holding the `leads`
//! table and implements [`LeadStore`] for the import and enrichment flows.
//!
//! **Access rules:**
//! - CLI commands that write: read-write via [`Storage::open`]
//! - Reporting commands: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use leadkit_shared::{
    Lead, LeadId, LeadStore, LeadUpdate, LeadkitError, NewLead, Result, dedup_key,
};
use libsql::{Connection, Database, params};

/// Column list shared by every lead query; [`row_to_lead`] reads in this order.
const LEAD_COLUMNS: &str = "id, first_name, last_name, email, job_title, country_code, \
     company_name, gender, message, email_verified, created_at, updated_at";

/// Name keys per lookup statement, keeping bound parameters well under
/// SQLite's limit.
const NAME_PAIR_CHUNK: usize = 250;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LeadkitError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        LeadkitError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(LeadkitError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lead writes
    // -----------------------------------------------------------------------

    /// Insert a lead and return the stored record.
    pub async fn insert_lead(&self, lead: &NewLead) -> Result<Lead> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let name_key = lead.dedup_key();
        let sql = format!(
            "INSERT INTO leads (first_name, last_name, email, job_title, country_code,
                                company_name, gender, name_key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {LEAD_COLUMNS}"
        );
        let mut rows = self
            .conn
            .query(
                &sql,
                params![
                    lead.first_name.as_str(),
                    lead.last_name.as_str(),
                    lead.email.as_str(),
                    lead.job_title.as_deref(),
                    lead.country_code.as_deref(),
                    lead.company_name.as_deref(),
                    lead.gender.as_deref(),
                    name_key.as_str(),
                    now.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_lead(&row),
            Ok(None) => Err(LeadkitError::Storage("insert returned no row".into())),
            Err(e) => Err(LeadkitError::Storage(e.to_string())),
        }
    }

    /// Patch first name and/or email. Returns the updated lead.
    pub async fn update_lead(&self, id: LeadId, update: &LeadUpdate) -> Result<Lead> {
        self.check_writable()?;
        let existing = self
            .get_lead(id)
            .await?
            .ok_or_else(|| LeadkitError::NotFound(format!("lead {id}")))?;

        let now = Utc::now().to_rfc3339();
        let first_name = update
            .first_name
            .as_deref()
            .map_or(existing.first_name.as_str(), str::trim);
        let email = update
            .email
            .as_deref()
            .map_or(existing.email.as_str(), str::trim);
        let name_key = dedup_key(first_name, &existing.last_name);

        let affected = self
            .conn
            .execute(
                "UPDATE leads SET first_name = ?1, email = ?2, name_key = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![first_name, email, name_key.as_str(), now.as_str(), id],
            )
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(LeadkitError::NotFound(format!("lead {id}")));
        }
        self.get_lead(id)
            .await?
            .ok_or_else(|| LeadkitError::NotFound(format!("lead {id}")))
    }

    /// Set a single nullable text column and bump `updated_at`.
    async fn set_column(&self, id: LeadId, column: &str, value: libsql::Value) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let sql = format!("UPDATE leads SET {column} = ?1, updated_at = ?2 WHERE id = ?3");
        let affected = self
            .conn
            .execute(&sql, params![value, now.as_str(), id])
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(LeadkitError::NotFound(format!("lead {id}")));
        }
        Ok(())
    }

    /// Store the canonical gender for a lead.
    pub async fn set_gender(&self, id: LeadId, gender: &str) -> Result<()> {
        self.set_column(id, "gender", libsql::Value::Text(gender.to_string()))
            .await
    }

    /// Store a generated outreach message for a lead.
    pub async fn set_message(&self, id: LeadId, message: &str) -> Result<()> {
        self.set_column(id, "message", libsql::Value::Text(message.to_string()))
            .await
    }

    /// Record the outcome of an email verification.
    pub async fn set_email_verified(&self, id: LeadId, verified: bool) -> Result<()> {
        self.set_column(id, "email_verified", libsql::Value::Integer(i64::from(verified)))
            .await
    }

    /// Delete a lead by ID. Returns whether a row was removed.
    pub async fn delete_lead(&self, id: LeadId) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?1", params![id])
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;
        Ok(affected > 0)
    }

    /// Delete every lead in `ids`. Returns the number of rows removed.
    pub async fn delete_leads(&self, ids: &[LeadId]) -> Result<u64> {
        self.check_writable()?;
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!("DELETE FROM leads WHERE id IN ({})", placeholders(ids.len()));
        self.conn
            .execute(&sql, libsql::params_from_iter(ids.iter().copied()))
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Lead reads
    // -----------------------------------------------------------------------

    /// Get a lead by ID.
    pub async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![id])
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_lead(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LeadkitError::Storage(e.to_string())),
        }
    }

    /// List all leads, oldest first.
    pub async fn list_leads(&self) -> Result<Vec<Lead>> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY id");
        self.query_leads(&sql, params![]).await
    }

    /// Leads whose id is in `ids`, ordered by id.
    pub async fn find_leads_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        self.query_leads(&sql, libsql::params_from_iter(ids.iter().copied()))
            .await
    }

    /// Leads matching any (first name, last name) pair, case-insensitively.
    ///
    /// Matches on the stored `name_key`, which holds [`dedup_key`] of the
    /// lead's names so folding follows Rust's Unicode lower-casing.
    pub async fn find_leads_by_name_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<Lead>> {
        let mut keys: Vec<String> = pairs
            .iter()
            .map(|(first, last)| dedup_key(first, last))
            .collect();
        keys.sort();
        keys.dedup();

        let mut found = Vec::new();
        for chunk in keys.chunks(NAME_PAIR_CHUNK) {
            let sql = format!(
                "SELECT {LEAD_COLUMNS} FROM leads WHERE name_key IN ({})",
                placeholders(chunk.len())
            );
            let values: Vec<String> = chunk.to_vec();
            found.extend(
                self.query_leads(&sql, libsql::params_from_iter(values))
                    .await?,
            );
        }

        found.sort_by_key(|l| l.id);
        Ok(found)
    }

    async fn query_leads(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Lead>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| LeadkitError::Storage(e.to_string()))?
        {
            results.push(row_to_lead(&row)?);
        }
        Ok(results)
    }
}

impl LeadStore for Storage {
    async fn find_by_name_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<Lead>> {
        self.find_leads_by_name_pairs(pairs).await
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead> {
        self.insert_lead(lead).await
    }

    async fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>> {
        self.find_leads_by_ids(ids).await
    }

    async fn update_gender(&self, id: LeadId, gender: &str) -> Result<()> {
        self.set_gender(id, gender).await
    }

    async fn update_message(&self, id: LeadId, message: &str) -> Result<()> {
        self.set_message(id, message).await
    }

    async fn update_email_verified(&self, id: LeadId, verified: bool) -> Result<()> {
        self.set_email_verified(id, verified).await
    }
}

/// `?1, ?2, ..., ?n`
fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LeadkitError::Storage(format!("invalid date: {e}")))
}

/// Convert a database row selected with [`LEAD_COLUMNS`] to a [`Lead`].
fn row_to_lead(row: &libsql::Row) -> Result<Lead> {
    let text = |idx: i32| {
        row.get::<String>(idx)
            .map_err(|e| LeadkitError::Storage(e.to_string()))
    };

    Ok(Lead {
        id: row
            .get::<i64>(0)
            .map_err(|e| LeadkitError::Storage(e.to_string()))?,
        first_name: text(1)?,
        last_name: text(2)?,
        email: text(3)?,
        job_title: row.get::<String>(4).ok(),
        country_code: row.get::<String>(5).ok(),
        company_name: row.get::<String>(6).ok(),
        gender: row.get::<String>(7).ok(),
        message: row.get::<String>(8).ok(),
        email_verified: row.get::<i64>(9).ok().map(|v| v != 0),
        created_at: parse_timestamp(&text(10)?)?,
        updated_at: parse_timestamp(&text(11)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("leadkit_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn new_lead(first: &str, last: &str) -> NewLead {
        NewLead::new(first, last, format!("{}@example.com", first.to_lowercase()))
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("leadkit_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn lead_crud() {
        let storage = test_storage().await;

        let mut lead = new_lead("John", "Doe");
        lead.company_name = Some("Tech Corp".into());
        let created = storage.insert_lead(&lead).await.expect("insert lead");
        assert!(created.id > 0);
        assert_eq!(created.company_name.as_deref(), Some("Tech Corp"));
        assert_eq!(created.job_title, None);
        assert_eq!(created.email_verified, None);

        let found = storage.get_lead(created.id).await.expect("get lead");
        assert_eq!(found.as_ref(), Some(&created));

        let updated = storage
            .update_lead(
                created.id,
                &LeadUpdate {
                    first_name: Some(" Johnny ".into()),
                    email: None,
                },
            )
            .await
            .expect("update lead");
        assert_eq!(updated.first_name, "Johnny");
        assert_eq!(updated.email, "john@example.com");

        storage.insert_lead(&new_lead("Jane", "Smith")).await.unwrap();
        let all = storage.list_leads().await.expect("list leads");
        assert_eq!(all.len(), 2);

        assert!(storage.delete_lead(created.id).await.unwrap());
        assert!(!storage.delete_lead(created.id).await.unwrap());
        assert!(storage.get_lead(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_lead_is_not_found() {
        let storage = test_storage().await;
        let err = storage
            .update_lead(999, &LeadUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LeadkitError::NotFound(_)));

        let err = storage.set_gender(999, "male").await.unwrap_err();
        assert!(matches!(err, LeadkitError::NotFound(_)));
    }

    #[tokio::test]
    async fn name_pair_lookup_is_case_insensitive() {
        let storage = test_storage().await;
        storage.insert_lead(&new_lead("John", "Doe")).await.unwrap();
        storage.insert_lead(&new_lead("Jane", "Smith")).await.unwrap();
        storage.insert_lead(&new_lead("John", "Smith")).await.unwrap();

        let found = storage
            .find_leads_by_name_pairs(&[
                ("JOHN".into(), " doe ".into()),
                ("jane".into(), "SMITH".into()),
                ("Nobody".into(), "Here".into()),
            ])
            .await
            .expect("lookup");
        let names: Vec<_> = found.iter().map(Lead::display_name).collect();
        assert_eq!(names, ["John Doe", "Jane Smith"]);

        let none = storage.find_leads_by_name_pairs(&[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn name_pair_lookup_spans_chunks() {
        let storage = test_storage().await;
        storage.insert_lead(&new_lead("Ann", "Last")).await.unwrap();
        storage.insert_lead(&new_lead("Zed", "Last")).await.unwrap();

        let mut pairs: Vec<(String, String)> = (0..NAME_PAIR_CHUNK + 10)
            .map(|i| (format!("first{i}"), format!("last{i}")))
            .collect();
        pairs.push(("ann".into(), "last".into()));
        pairs.push(("ZED".into(), "last".into()));
        pairs.insert(0, ("Ann".into(), "Last".into()));

        let found = storage.find_leads_by_name_pairs(&pairs).await.unwrap();
        let names: Vec<_> = found.iter().map(Lead::display_name).collect();
        assert_eq!(names, ["Ann Last", "Zed Last"]);
    }

    #[tokio::test]
    async fn name_pair_lookup_folds_non_ascii_case() {
        let storage = test_storage().await;
        storage
            .insert_lead(&NewLead::new("ÉLODIE", "MÜLLER", "elodie@example.com"))
            .await
            .unwrap();

        let found = storage
            .find_leads_by_name_pairs(&[("élodie".into(), "müller".into())])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "ÉLODIE");
    }

    #[tokio::test]
    async fn renamed_lead_matches_new_name_only() {
        let storage = test_storage().await;
        let lead = storage.insert_lead(&new_lead("John", "Doe")).await.unwrap();
        storage
            .update_lead(
                lead.id,
                &LeadUpdate {
                    first_name: Some("Jonathan".into()),
                    email: None,
                },
            )
            .await
            .unwrap();

        let old = storage
            .find_leads_by_name_pairs(&[("john".into(), "doe".into())])
            .await
            .unwrap();
        assert!(old.is_empty());
        let new = storage
            .find_leads_by_name_pairs(&[("JONATHAN".into(), "Doe".into())])
            .await
            .unwrap();
        assert_eq!(new.len(), 1);
    }

    #[tokio::test]
    async fn lead_store_calls_run_on_spawned_tasks() {
        let storage = std::sync::Arc::new(test_storage().await);
        storage.insert_lead(&new_lead("Ana", "Silva")).await.unwrap();

        let store = storage.clone();
        let found = tokio::spawn(async move {
            let pairs = [("ana".to_string(), "silva".to_string())];
            LeadStore::find_by_name_pairs(&*store, &pairs).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(found.len(), 1);

        let store = storage.clone();
        let id = found[0].id;
        tokio::spawn(async move { LeadStore::update_gender(&*store, id, "female").await })
            .await
            .unwrap()
            .unwrap();
        let lead = storage.get_lead(id).await.unwrap().unwrap();
        assert_eq!(lead.gender.as_deref(), Some("female"));
    }

    #[tokio::test]
    async fn find_and_delete_by_ids() {
        let storage = test_storage().await;
        let a = storage.insert_lead(&new_lead("A", "One")).await.unwrap();
        let b = storage.insert_lead(&new_lead("B", "Two")).await.unwrap();
        let c = storage.insert_lead(&new_lead("C", "Three")).await.unwrap();

        let found = storage.find_leads_by_ids(&[c.id, a.id, 4242]).await.unwrap();
        let ids: Vec<_> = found.iter().map(|l| l.id).collect();
        assert_eq!(ids, [a.id, c.id]);

        let deleted = storage.delete_leads(&[a.id, b.id, 4242]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(storage.list_leads().await.unwrap().len(), 1);
        assert_eq!(storage.delete_leads(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn enrichment_columns() {
        let storage = test_storage().await;
        let lead = storage.insert_lead(&new_lead("Kim", "Lee")).await.unwrap();

        storage.set_gender(lead.id, "female").await.unwrap();
        storage.set_message(lead.id, "Hi Kim").await.unwrap();
        storage.set_email_verified(lead.id, true).await.unwrap();

        let lead = storage.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(lead.gender.as_deref(), Some("female"));
        assert_eq!(lead.message.as_deref(), Some("Hi Kim"));
        assert_eq!(lead.email_verified, Some(true));
    }

    #[tokio::test]
    async fn blank_required_field_violates_constraint() {
        let storage = test_storage().await;
        let lead = NewLead::new("  ", "Doe", "x@example.com");
        let err = storage.insert_lead(&lead).await.unwrap_err();
        assert!(matches!(err, LeadkitError::Storage(_)));
    }

    #[tokio::test]
    async fn lead_store_trait_delegates() {
        let storage = test_storage().await;
        let created = LeadStore::create(&storage, &new_lead("Zoe", "Park"))
            .await
            .unwrap();
        let found = LeadStore::find_by_name_pairs(&storage, &[("zoe".into(), "park".into())])
            .await
            .unwrap();
        assert_eq!(found, [created]);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("leadkit_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.insert_lead(&new_lead("Ro", "Test")).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.list_leads().await.unwrap().len(), 1);
        let result = ro.insert_lead(&new_lead("Ro", "Again")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }
}
