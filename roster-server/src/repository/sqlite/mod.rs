//! SQLite implementation of the repository traits.
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table that tracks the schema
//! version. When the schema needs to change, increment
//! `CURRENT_SCHEMA_VERSION` and add a migration in `run_migrations()`.
//! Migrations run sequentially from the current version to the target
//! version.


use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use roster_core::model::{
    AssignmentStats, PullRequest, PullRequestAssignment, PullRequestShort, PullRequestStatus,
    Team, TeamMember, User,
};
use roster_core::DomainError;

use super::{PullRequestRepository, TeamRepository, UserRepository};

/// Current schema version. Increment this when making schema changes and
/// add corresponding migration logic in `run_migrations()`.
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed repository serving all three collaborator contracts.
///
/// Uses `tokio::task::spawn_blocking` to run synchronous rusqlite
/// operations without blocking the async runtime. The `Mutex` is
/// required because `rusqlite::Connection` is not `Sync`.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Create a new SQLite repository at the given path.
    ///
    /// Creates the database file and schema if they don't exist. Runs
    /// any pending migrations if the database exists but has an older
    /// schema. The connection is configured with `journal_mode = WAL`
    /// and a 5s busy timeout.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DomainError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy();

        if path_str != ":memory:" && !path_str.is_empty() {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DomainError::storage(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| DomainError::storage("open database", e.to_string()))?;

        // In-memory databases report journal_mode = "memory"; that is
        // fine, they are ephemeral.
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| DomainError::storage("set journal_mode", e.to_string()))?;
        let is_in_memory = path_str == ":memory:";
        if !journal_mode.eq_ignore_ascii_case("wal")
            && !(is_in_memory && journal_mode.eq_ignore_ascii_case("memory"))
        {
            return Err(DomainError::storage(
                "set journal_mode",
                format!("unexpected journal mode {journal_mode}"),
            ));
        }

        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| DomainError::storage("configure pragmas", e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| DomainError::storage("create schema_version table", e.to_string()))?;

        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new in-memory SQLite repository (for testing).
    pub fn new_in_memory() -> Result<Self, DomainError> {
        Self::new(":memory:")
    }

    /// Run migrations from `from_version` to `CURRENT_SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), DomainError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(DomainError::storage(
                "schema version",
                format!(
                    "database schema version {} is newer than supported version {}",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        if from_version < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS teams (
                    team_name TEXT PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS users (
                    user_id TEXT PRIMARY KEY,
                    username TEXT NOT NULL,
                    team_name TEXT NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1
                );
                CREATE INDEX IF NOT EXISTS idx_users_team ON users(team_name);

                CREATE TABLE IF NOT EXISTS pull_requests (
                    pull_request_id TEXT PRIMARY KEY,
                    pull_request_name TEXT NOT NULL,
                    author_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at TEXT,
                    merged_at TEXT
                );

                CREATE TABLE IF NOT EXISTS pull_request_reviewers (
                    pull_request_id TEXT NOT NULL,
                    reviewer_id TEXT NOT NULL,
                    PRIMARY KEY (pull_request_id, reviewer_id)
                );
                CREATE INDEX IF NOT EXISTS idx_reviewers_by_user
                    ON pull_request_reviewers(reviewer_id);
                "#,
            )
            .map_err(|e| DomainError::storage("migration v1", e.to_string()))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| DomainError::storage("update schema version", e.to_string()))?;

        Ok(())
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// A comma-separated `?` list for an `IN (...)` clause.
fn placeholders(n: usize) -> String {
    let mut s = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}

fn parse_timestamp(
    value: Option<String>,
    operation: &'static str,
) -> Result<Option<DateTime<Utc>>, DomainError> {
    match value {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                DomainError::storage(operation, format!("invalid timestamp {s:?}: {e}"))
            }),
    }
}

fn parse_status(value: &str, operation: &'static str) -> Result<PullRequestStatus, DomainError> {
    PullRequestStatus::parse(value).ok_or_else(|| {
        DomainError::storage(operation, format!("invalid pull request status {value:?}"))
    })
}

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        team_name: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn read_reviewers(conn: &Connection, pr_id: &str) -> Result<Vec<String>, DomainError> {
    let mut stmt = conn
        .prepare(
            "SELECT reviewer_id FROM pull_request_reviewers
             WHERE pull_request_id = ?1 ORDER BY reviewer_id",
        )
        .map_err(|e| DomainError::storage("list reviewers", e.to_string()))?;

    let rows = stmt
        .query_map(params![pr_id], |row| row.get::<_, String>(0))
        .map_err(|e| DomainError::storage("list reviewers", e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<String>>>()
        .map_err(|e| DomainError::storage("list reviewers", e.to_string()))
}

fn read_pull_request(
    conn: &Connection,
    pr_id: &str,
    operation: &'static str,
) -> Result<PullRequest, DomainError> {
    let row: Option<(String, String, String, String, Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
             FROM pull_requests WHERE pull_request_id = ?1",
            params![pr_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .optional()
        .map_err(|e| DomainError::storage(operation, e.to_string()))?;

    let Some((id, name, author_id, status, created_at, merged_at)) = row else {
        return Err(DomainError::not_found("resource not found"));
    };

    let assigned_reviewers = read_reviewers(conn, &id)?;

    Ok(PullRequest {
        id,
        name,
        author_id,
        status: parse_status(&status, operation)?,
        assigned_reviewers,
        created_at: parse_timestamp(created_at, operation)?,
        merged_at: parse_timestamp(merged_at, operation)?,
    })
}

fn join_error(operation: &'static str) -> impl FnOnce(tokio::task::JoinError) -> DomainError {
    move |e| DomainError::storage(operation, e.to_string())
}

// =============================================================================
// UserRepository
// =============================================================================

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_by_id(&self, user_id: &str) -> Result<User, DomainError> {
        let conn = self.conn.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.query_row(
                "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?1",
                params![user_id],
                read_user,
            )
            .optional()
            .map_err(|e| DomainError::storage("get user", e.to_string()))?
            .ok_or_else(|| DomainError::not_found("resource not found"))
        })
        .await
        .map_err(join_error("get user"))?
    }

    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, DomainError> {
        let conn = self.conn.clone();
        let team_name = team_name.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT user_id, username, team_name, is_active FROM users
                     WHERE team_name = ?1 ORDER BY user_id",
                )
                .map_err(|e| DomainError::storage("list team users", e.to_string()))?;

            let rows = stmt
                .query_map(params![team_name], read_user)
                .map_err(|e| DomainError::storage("list team users", e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<User>>>()
                .map_err(|e| DomainError::storage("list team users", e.to_string()))
        })
        .await
        .map_err(join_error("list team users"))?
    }

    async fn upsert(&self, users: &[User]) -> Result<(), DomainError> {
        if users.is_empty() {
            return Ok(());
        }

        let conn = self.conn.clone();
        let users = users.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap();
            let tx = conn
                .transaction()
                .map_err(|e| DomainError::storage("upsert users", e.to_string()))?;

            for user in &users {
                tx.execute(
                    "INSERT INTO users (user_id, username, team_name, is_active)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (user_id) DO UPDATE SET
                         username = excluded.username,
                         team_name = excluded.team_name,
                         is_active = excluded.is_active",
                    params![user.id, user.username, user.team_name, user.is_active],
                )
                .map_err(|e| DomainError::storage("upsert users", e.to_string()))?;
            }

            tx.commit()
                .map_err(|e| DomainError::storage("upsert users", e.to_string()))
        })
        .await
        .map_err(join_error("upsert users"))?
    }

    async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, DomainError> {
        let conn = self.conn.clone();
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.query_row(
                "UPDATE users SET is_active = ?2 WHERE user_id = ?1
                 RETURNING user_id, username, team_name, is_active",
                params![user_id, is_active],
                read_user,
            )
            .optional()
            .map_err(|e| DomainError::storage("set user active flag", e.to_string()))?
            .ok_or_else(|| DomainError::not_found("resource not found"))
        })
        .await
        .map_err(join_error("set user active flag"))?
    }

    async fn list_by_ids(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<User>, DomainError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.clone();
        let team_name = team_name.to_string();
        let user_ids = user_ids.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let sql = format!(
                "SELECT user_id, username, team_name, is_active FROM users
                 WHERE team_name = ? AND user_id IN ({}) ORDER BY user_id",
                placeholders(user_ids.len())
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| DomainError::storage("list users by ids", e.to_string()))?;

            let bound = std::iter::once(team_name).chain(user_ids);
            let rows = stmt
                .query_map(params_from_iter(bound), read_user)
                .map_err(|e| DomainError::storage("list users by ids", e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<User>>>()
                .map_err(|e| DomainError::storage("list users by ids", e.to_string()))
        })
        .await
        .map_err(join_error("list users by ids"))?
    }

    async fn deactivate_users(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<Vec<String>, DomainError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.clone();
        let team_name = team_name.to_string();
        let user_ids = user_ids.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let sql = format!(
                "UPDATE users SET is_active = 0
                 WHERE team_name = ? AND user_id IN ({})
                 RETURNING user_id",
                placeholders(user_ids.len())
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| DomainError::storage("deactivate users", e.to_string()))?;

            let bound = std::iter::once(team_name).chain(user_ids);
            let rows = stmt
                .query_map(params_from_iter(bound), |row| row.get::<_, String>(0))
                .map_err(|e| DomainError::storage("deactivate users", e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<String>>>()
                .map_err(|e| DomainError::storage("deactivate users", e.to_string()))
        })
        .await
        .map_err(join_error("deactivate users"))?
    }
}

// =============================================================================
// TeamRepository
// =============================================================================

#[async_trait]
impl TeamRepository for SqliteRepository {
    async fn create(&self, team_name: &str) -> Result<(), DomainError> {
        let conn = self.conn.clone();
        let team_name = team_name.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            match conn.execute("INSERT INTO teams (team_name) VALUES (?1)", params![team_name]) {
                Ok(_) => Ok(()),
                Err(e) if is_constraint_violation(&e) => Err(DomainError::TeamExists),
                Err(e) => Err(DomainError::storage("create team", e.to_string())),
            }
        })
        .await
        .map_err(join_error("create team"))?
    }

    async fn exists(&self, team_name: &str) -> Result<bool, DomainError> {
        let conn = self.conn.clone();
        let team_name = team_name.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM teams WHERE team_name = ?1",
                    params![team_name],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| DomainError::storage("check team exists", e.to_string()))?;
            Ok(found.is_some())
        })
        .await
        .map_err(join_error("check team exists"))?
    }

    async fn get_by_name(&self, team_name: &str) -> Result<Team, DomainError> {
        let conn = self.conn.clone();
        let team_name = team_name.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let name: Option<String> = conn
                .query_row(
                    "SELECT team_name FROM teams WHERE team_name = ?1",
                    params![team_name],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| DomainError::storage("get team", e.to_string()))?;

            let Some(name) = name else {
                return Err(DomainError::not_found("resource not found"));
            };

            let mut stmt = conn
                .prepare(
                    "SELECT user_id, username, is_active FROM users
                     WHERE team_name = ?1 ORDER BY user_id",
                )
                .map_err(|e| DomainError::storage("get team", e.to_string()))?;

            let rows = stmt
                .query_map(params![name], |row| {
                    Ok(TeamMember {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        is_active: row.get(2)?,
                    })
                })
                .map_err(|e| DomainError::storage("get team", e.to_string()))?;

            let members = rows
                .collect::<rusqlite::Result<Vec<TeamMember>>>()
                .map_err(|e| DomainError::storage("get team", e.to_string()))?;

            Ok(Team { name, members })
        })
        .await
        .map_err(join_error("get team"))?
    }
}

// =============================================================================
// PullRequestRepository
// =============================================================================

#[async_trait]
impl PullRequestRepository for SqliteRepository {
    async fn create(
        &self,
        pr: &PullRequest,
        reviewer_ids: &[String],
    ) -> Result<PullRequest, DomainError> {
        let conn = self.conn.clone();
        let pr = pr.clone();
        let reviewer_ids = reviewer_ids.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap();
            let tx = conn
                .transaction()
                .map_err(|e| DomainError::storage("create pull request", e.to_string()))?;

            let inserted = tx.execute(
                "INSERT INTO pull_requests
                     (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    pr.id,
                    pr.name,
                    pr.author_id,
                    pr.status.as_str(),
                    pr.created_at.map(|t| t.to_rfc3339()),
                    pr.merged_at.map(|t| t.to_rfc3339()),
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => return Err(DomainError::PrExists),
                Err(e) => {
                    return Err(DomainError::storage("create pull request", e.to_string()))
                }
            }

            for reviewer_id in &reviewer_ids {
                tx.execute(
                    "INSERT INTO pull_request_reviewers (pull_request_id, reviewer_id)
                     VALUES (?1, ?2)",
                    params![pr.id, reviewer_id],
                )
                .map_err(|e| DomainError::storage("create pull request", e.to_string()))?;
            }

            tx.commit()
                .map_err(|e| DomainError::storage("create pull request", e.to_string()))?;

            read_pull_request(&conn, &pr.id, "create pull request")
        })
        .await
        .map_err(join_error("create pull request"))?
    }

    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, DomainError> {
        let conn = self.conn.clone();
        let pr_id = pr_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            read_pull_request(&conn, &pr_id, "get pull request")
        })
        .await
        .map_err(join_error("get pull request"))?
    }

    async fn update_status(
        &self,
        pr_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<PullRequest, DomainError> {
        let conn = self.conn.clone();
        let pr_id = pr_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let updated = conn
                .execute(
                    "UPDATE pull_requests SET status = ?2, merged_at = ?3
                     WHERE pull_request_id = ?1",
                    params![pr_id, status.as_str(), merged_at.map(|t| t.to_rfc3339())],
                )
                .map_err(|e| DomainError::storage("update pull request status", e.to_string()))?;

            if updated == 0 {
                return Err(DomainError::not_found("resource not found"));
            }

            read_pull_request(&conn, &pr_id, "update pull request status")
        })
        .await
        .map_err(join_error("update pull request status"))?
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
        new_reviewer_id: &str,
    ) -> Result<PullRequest, DomainError> {
        let conn = self.conn.clone();
        let pr_id = pr_id.to_string();
        let old_reviewer_id = old_reviewer_id.to_string();
        let new_reviewer_id = new_reviewer_id.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap();
            let tx = conn
                .transaction()
                .map_err(|e| DomainError::storage("replace reviewer", e.to_string()))?;

            let deleted = tx
                .execute(
                    "DELETE FROM pull_request_reviewers
                     WHERE pull_request_id = ?1 AND reviewer_id = ?2",
                    params![pr_id, old_reviewer_id],
                )
                .map_err(|e| DomainError::storage("replace reviewer", e.to_string()))?;

            // Zero rows deleted means the assignment vanished (e.g. a
            // concurrent swap); the transaction rolls back on drop.
            if deleted == 0 {
                return Err(DomainError::NotAssigned);
            }

            tx.execute(
                "INSERT INTO pull_request_reviewers (pull_request_id, reviewer_id)
                 VALUES (?1, ?2)",
                params![pr_id, new_reviewer_id],
            )
            .map_err(|e| DomainError::storage("replace reviewer", e.to_string()))?;

            tx.commit()
                .map_err(|e| DomainError::storage("replace reviewer", e.to_string()))?;

            read_pull_request(&conn, &pr_id, "replace reviewer")
        })
        .await
        .map_err(join_error("replace reviewer"))?
    }

    async fn list_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, DomainError> {
        let conn = self.conn.clone();
        let reviewer_id = reviewer_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
                     FROM pull_requests pr
                     JOIN pull_request_reviewers prr
                         ON pr.pull_request_id = prr.pull_request_id
                     WHERE prr.reviewer_id = ?1
                     ORDER BY pr.created_at DESC",
                )
                .map_err(|e| DomainError::storage("list by reviewer", e.to_string()))?;

            let rows = stmt
                .query_map(params![reviewer_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| DomainError::storage("list by reviewer", e.to_string()))?;

            let raw = rows
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| DomainError::storage("list by reviewer", e.to_string()))?;

            raw.into_iter()
                .map(|(id, name, author_id, status)| {
                    Ok(PullRequestShort {
                        id,
                        name,
                        author_id,
                        status: parse_status(&status, "list by reviewer")?,
                    })
                })
                .collect()
        })
        .await
        .map_err(join_error("list by reviewer"))?
    }

    async fn list_open_assignments_by_reviewers(
        &self,
        reviewer_ids: &[String],
    ) -> Result<Vec<PullRequestAssignment>, DomainError> {
        if reviewer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.clone();
        let reviewer_ids = reviewer_ids.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let sql = format!(
                "SELECT prr.pull_request_id, prr.reviewer_id
                 FROM pull_request_reviewers prr
                 JOIN pull_requests pr ON prr.pull_request_id = pr.pull_request_id
                 WHERE pr.status = 'OPEN' AND prr.reviewer_id IN ({})
                 ORDER BY prr.pull_request_id, prr.reviewer_id",
                placeholders(reviewer_ids.len())
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| DomainError::storage("list open assignments", e.to_string()))?;

            let rows = stmt
                .query_map(params_from_iter(reviewer_ids), |row| {
                    Ok(PullRequestAssignment {
                        pull_request_id: row.get(0)?,
                        reviewer_id: row.get(1)?,
                    })
                })
                .map_err(|e| DomainError::storage("list open assignments", e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<PullRequestAssignment>>>()
                .map_err(|e| DomainError::storage("list open assignments", e.to_string()))
        })
        .await
        .map_err(join_error("list open assignments"))?
    }

    async fn assignment_stats(&self) -> Result<Vec<AssignmentStats>, DomainError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let mut stmt = conn
                .prepare(
                    "SELECT reviewer_id, COUNT(*) AS assignment_count
                     FROM pull_request_reviewers
                     GROUP BY reviewer_id
                     ORDER BY assignment_count DESC, reviewer_id",
                )
                .map_err(|e| DomainError::storage("assignment stats", e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(AssignmentStats {
                        user_id: row.get(0)?,
                        assignment_count: row.get(1)?,
                    })
                })
                .map_err(|e| DomainError::storage("assignment stats", e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<AssignmentStats>>>()
                .map_err(|e| DomainError::storage("assignment stats", e.to_string()))
        })
        .await
        .map_err(join_error("assignment stats"))?
    }
}
