use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::Store;
use super::schema::{MIGRATIONS, Migration, SCHEMA_VERSION, pending};
use crate::error::{Error, Result};
use crate::types::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read connections kept open between calls; extra ones are closed.
const MAX_IDLE_READERS: usize = 4;

const RELEASE_COLUMNS: &str = "r.id, r.project, r.version, r.semver, r.release_date, r.vcs_tag, \
     r.title, r.summary, r.changelog, r.discussion_url, r.public";

const FILE_COLUMNS: &str =
    "f.id, f.project, f.release, f.platform, f.filename, f.content_type, f.sha256, f.downloads";

/// SQLite-backed registry.
///
/// Migrations and writes go through one connection. Lookups and listings
/// borrow a separate read connection, so under WAL they never queue behind
/// a writer or each other.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    /// `None` for in-memory databases, which only the writer can see.
    path: Option<PathBuf>,
    idle_readers: Mutex<Vec<Connection>>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Self::configure(conn, Some(path))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, None)
    }

    fn configure(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            writer: Mutex::new(conn),
            path,
            idle_readers: Mutex::new(Vec::new()),
        })
    }

    fn writer(&self) -> MutexGuard<'_, Connection> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn idle_readers(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle_readers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` on a read connection. The pool lock is only held while a
    /// connection is taken or returned, never during the query.
    fn read<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let Some(path) = &self.path else {
            let conn = self.writer();
            return f(&*conn).map_err(Error::from);
        };

        let idle = self.idle_readers().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => open_reader(path)?,
        };

        let result = f(&conn);

        let mut idle = self.idle_readers();
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
        result.map_err(Error::from)
    }
}

fn open_reader(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "query_only", "ON")?;
    Ok(conn)
}

fn read_user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Applies every step between the stored version and `target` inside one
/// exclusive transaction. Returns the version the database ends up at.
///
/// The stamp is re-read once the lock is held, so a second process that
/// lost the race finds nothing left to do.
fn migrate(conn: &mut Connection, steps: &[Migration], target: u32) -> Result<u32> {
    let current = read_user_version(conn)?;
    if current >= target {
        if current > target {
            tracing::warn!(
                "Database schema version {} is newer than supported version {}; skipping migration",
                current,
                target
            );
        }
        return Ok(current);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    let current = read_user_version(&tx)?;
    if current >= target {
        return Ok(current);
    }

    for step in pending(steps, current, target) {
        tracing::info!("Migrating database schema to version {}", step.version);
        tx.execute_batch(step.sql).map_err(|source| Error::Migration {
            version: step.version,
            source,
        })?;
    }

    tx.pragma_update(None, "user_version", target)
        .map_err(|source| Error::Migration {
            version: target,
            source,
        })?;
    tx.commit().map_err(|source| Error::Migration {
        version: target,
        source,
    })?;

    tracing::info!("Database schema upgraded from version {} to {}", current, target);
    Ok(target)
}

/// Reads column `idx` as a `YYYY-MM-DD` date. Full timestamps written by
/// other tools are accepted too.
fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.date()))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        vcs_url: row.get(3)?,
        description: row.get(4)?,
    })
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<Release> {
    Ok(Release {
        id: row.get(0)?,
        project_id: row.get(1)?,
        version: row.get(2)?,
        semver: row.get(3)?,
        release_date: date_column(row, 4)?,
        vcs_tag: row.get(5)?,
        title: row.get(6)?,
        summary: row.get(7)?,
        changelog: row.get(8)?,
        discussion_url: row.get(9)?,
        public: row.get(10)?,
    })
}

fn platform_from_row(row: &Row<'_>) -> rusqlite::Result<Platform> {
    Ok(Platform {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: row.get(0)?,
        project_id: row.get(1)?,
        release_id: row.get(2)?,
        platform_id: row.get(3)?,
        filename: row.get(4)?,
        content_type: row.get(5)?,
        sha256: row.get(6)?,
        downloads: row.get(7)?,
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let mut conn = self.writer();
        migrate(&mut conn, MIGRATIONS, SCHEMA_VERSION)?;
        Ok(())
    }

    fn schema_version(&self) -> Result<u32> {
        read_user_version(&self.writer()).map_err(Error::from)
    }

    // Project operations

    fn create_project(&self, project: &NewProject) -> Result<i64> {
        let conn = self.writer();
        conn.execute(
            "INSERT INTO project (name, slug, vcs_url, description) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.name,
                project.slug,
                project.vcs_url,
                project.description
            ],
        )
        .map_err(|e| Error::from_insert(e, format!("project '{}'", project.slug)))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.read(|conn| {
            conn.query_row(
                "SELECT id, name, slug, vcs_url, description FROM project WHERE id = ?1",
                params![id],
                project_from_row,
            )
            .optional()
        })
    }

    fn get_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        self.read(|conn| {
            conn.query_row(
                "SELECT id, name, slug, vcs_url, description FROM project WHERE slug = ?1",
                params![slug],
                project_from_row,
            )
            .optional()
        })
    }

    fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, p.slug, p.vcs_url, p.description,
                        COUNT(DISTINCT r.id), COALESCE(SUM(f.downloads), 0)
                 FROM project p
                 LEFT JOIN release r ON r.project = p.id
                 LEFT JOIN file f ON f.release = r.id
                 GROUP BY p.id
                 ORDER BY p.name",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok(ProjectSummary {
                    project: project_from_row(row)?,
                    release_count: row.get(5)?,
                    total_downloads: row.get(6)?,
                })
            })?;
            rows.collect()
        })
    }

    // Release operations

    fn create_release(&self, release: &NewRelease) -> Result<i64> {
        let conn = self.writer();
        conn.execute(
            "INSERT INTO release (project, version, semver, release_date, vcs_tag, title, summary,
                                  changelog, discussion_url, public)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                release.project_id,
                release.version,
                release.semver,
                format_date(&release.release_date),
                release.vcs_tag,
                release.title,
                release.summary,
                release.changelog,
                release.discussion_url,
                release.public,
            ],
        )
        .map_err(|e| Error::from_insert(e, format!("release '{}'", release.version)))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_release(&self, id: i64) -> Result<Option<Release>> {
        self.read(|conn| {
            conn.query_row(
                &format!("SELECT {RELEASE_COLUMNS} FROM release r WHERE r.id = ?1"),
                params![id],
                release_from_row,
            )
            .optional()
        })
    }

    fn get_release_by_project_slug_and_version(
        &self,
        project_slug: &str,
        version: &str,
    ) -> Result<Option<Release>> {
        self.read(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {RELEASE_COLUMNS} FROM release r
                     JOIN project p ON p.id = r.project
                     WHERE p.slug = ?1 AND r.version = ?2"
                ),
                params![project_slug, version],
                release_from_row,
            )
            .optional()
        })
    }

    fn list_public_releases_by_project_slug(&self, project_slug: &str) -> Result<Vec<Release>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RELEASE_COLUMNS} FROM release r
                 JOIN project p ON p.id = r.project
                 WHERE p.slug = ?1 AND r.public = 1
                 ORDER BY r.release_date DESC, r.id DESC"
            ))?;

            let rows = stmt.query_map(params![project_slug], release_from_row)?;
            rows.collect()
        })
    }

    // Platform operations

    fn create_platform(&self, platform: &NewPlatform) -> Result<i64> {
        let conn = self.writer();
        conn.execute(
            "INSERT INTO platform (name, slug) VALUES (?1, ?2)",
            params![platform.name, platform.slug],
        )
        .map_err(|e| Error::from_insert(e, format!("platform '{}'", platform.slug)))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_platform(&self, id: i64) -> Result<Option<Platform>> {
        self.read(|conn| {
            conn.query_row(
                "SELECT id, name, slug FROM platform WHERE id = ?1",
                params![id],
                platform_from_row,
            )
            .optional()
        })
    }

    fn get_platform_by_slug(&self, slug: &str) -> Result<Option<Platform>> {
        self.read(|conn| {
            conn.query_row(
                "SELECT id, name, slug FROM platform WHERE slug = ?1",
                params![slug],
                platform_from_row,
            )
            .optional()
        })
    }

    fn list_platforms(&self) -> Result<Vec<Platform>> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, slug FROM platform ORDER BY name")?;
            let rows = stmt.query_map([], platform_from_row)?;
            rows.collect()
        })
    }

    // File operations

    fn create_file(&self, file: &NewFile) -> Result<i64> {
        let conn = self.writer();
        // The release must belong to the project the file claims.
        let rows = conn
            .execute(
                "INSERT INTO file (project, release, platform, filename, content_type, sha256)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6
                 WHERE EXISTS (SELECT 1 FROM release WHERE id = ?2 AND project = ?1)",
                params![
                    file.project_id,
                    file.release_id,
                    file.platform_id,
                    file.filename,
                    file.content_type,
                    file.sha256,
                ],
            )
            .map_err(|e| Error::from_insert(e, format!("file '{}'", file.filename)))?;

        if rows == 0 {
            return Err(Error::BadRequest(format!(
                "release {} does not belong to project {}",
                file.release_id, file.project_id
            )));
        }
        Ok(conn.last_insert_rowid())
    }

    fn get_file(&self, id: i64) -> Result<Option<File>> {
        self.read(|conn| {
            conn.query_row(
                &format!("SELECT {FILE_COLUMNS} FROM file f WHERE f.id = ?1"),
                params![id],
                file_from_row,
            )
            .optional()
        })
    }

    fn get_file_by_key(&self, key: &ArtifactKey) -> Result<Option<ResolvedFile>> {
        self.read(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {FILE_COLUMNS}, p.slug, pl.slug, r.version
                     FROM file f
                     JOIN release r ON r.id = f.release
                     JOIN project p ON p.id = r.project AND p.id = f.project
                     JOIN platform pl ON pl.id = f.platform
                     WHERE p.slug = ?1 AND pl.slug = ?2 AND r.version = ?3 AND f.filename = ?4"
                ),
                params![key.project, key.platform, key.version, key.filename],
                |row| {
                    Ok(ResolvedFile {
                        file: file_from_row(row)?,
                        project_slug: row.get(8)?,
                        platform_slug: row.get(9)?,
                        version: row.get(10)?,
                    })
                },
            )
            .optional()
        })
    }

    fn list_files_by_project(&self, project_id: i64) -> Result<Vec<FileListing>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FILE_COLUMNS}, pl.name, pl.slug
                 FROM file f
                 JOIN platform pl ON pl.id = f.platform
                 WHERE f.project = ?1
                 ORDER BY f.release, pl.name, f.filename"
            ))?;

            let rows = stmt.query_map(params![project_id], |row| {
                Ok(FileListing {
                    file: file_from_row(row)?,
                    platform_name: row.get(8)?,
                    platform_slug: row.get(9)?,
                })
            })?;
            rows.collect()
        })
    }

    fn increment_file_downloads(&self, id: i64) -> Result<bool> {
        let rows = self.writer().execute(
            "UPDATE file SET downloads = downloads + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(rows == 1)
    }

    fn close(&self) -> Result<()> {
        self.idle_readers().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn new_project(slug: &str) -> NewProject {
        NewProject {
            name: format!("Project {slug}"),
            slug: slug.to_string(),
            vcs_url: None,
            description: None,
        }
    }

    fn new_release(project_id: i64, version: &str, date: &str) -> NewRelease {
        NewRelease {
            project_id,
            version: version.to_string(),
            semver: version.to_string(),
            release_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            vcs_tag: None,
            title: None,
            summary: None,
            changelog: None,
            discussion_url: None,
            public: true,
        }
    }

    fn new_file(project_id: i64, release_id: i64, platform_id: i64, filename: &str) -> NewFile {
        NewFile {
            project_id,
            release_id,
            platform_id,
            filename: filename.to_string(),
            content_type: None,
            sha256: "00".repeat(32),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let conn = store.writer();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(tables, vec!["file", "platform", "project", "release"]);
        assert_eq!(read_user_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.db");

        let first = SqliteStore::new(&path).unwrap();
        first.initialize().unwrap();
        first.create_project(&new_project("acme")).unwrap();
        drop(first);

        let second = SqliteStore::new(&path).unwrap();
        second.initialize().unwrap();
        second.initialize().unwrap();

        assert_eq!(second.schema_version().unwrap(), SCHEMA_VERSION);
        assert!(second.get_project_by_slug("acme").unwrap().is_some());
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), 0);

        store.initialize().unwrap();
        let id = store.create_project(&new_project("acme")).unwrap();
        assert_eq!(store.get_project(id).unwrap().unwrap().slug, "acme");
    }

    #[test]
    fn test_future_schema_version_is_left_alone() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store
            .writer()
            .pragma_update(None, "user_version", SCHEMA_VERSION + 3)
            .unwrap();

        store.initialize().unwrap();

        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION + 3);
        let tables: i64 = store
            .writer()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();

        let steps = [
            Migration {
                version: 1,
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                sql: "CREATE TABLE second (id INTEGER PRIMARY KEY); NOT VALID SQL;",
            },
        ];

        let mut conn = store.writer();
        let result = migrate(&mut conn, &steps, 2);
        assert!(matches!(result, Err(Error::Migration { version: 2, .. })));

        assert_eq!(read_user_version(&conn).unwrap(), 0);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);

        // A fixed step list succeeds on the next attempt.
        let fixed = [
            Migration {
                version: 1,
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                sql: "CREATE TABLE second (id INTEGER PRIMARY KEY);",
            },
        ];
        assert_eq!(migrate(&mut conn, &fixed, 2).unwrap(), 2);
        assert_eq!(read_user_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_only_newer_steps_run() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        let mut conn = store.writer();

        let v1 = [Migration {
            version: 1,
            sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
        }];
        migrate(&mut conn, &v1, 1).unwrap();

        // Re-running v1's CREATE would fail, so success proves it was skipped.
        let v2 = [
            Migration {
                version: 1,
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                sql: "ALTER TABLE first ADD COLUMN name TEXT;",
            },
        ];
        assert_eq!(migrate(&mut conn, &v2, 2).unwrap(), 2);
    }

    #[test]
    fn test_project_crud() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let id = store
            .create_project(&NewProject {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                vcs_url: Some("https://example.com/acme.git".to_string()),
                description: None,
            })
            .unwrap();

        let fetched = store.get_project(id).unwrap().unwrap();
        assert_eq!(fetched.name, "Acme");
        assert_eq!(fetched.vcs_url.as_deref(), Some("https://example.com/acme.git"));

        let by_slug = store.get_project_by_slug("acme").unwrap().unwrap();
        assert_eq!(by_slug.id, id);

        assert!(store.get_project(id + 100).unwrap().is_none());
        assert!(store.get_project_by_slug("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_project_slug_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let id = store.create_project(&new_project("acme")).unwrap();
        let mut dup = new_project("acme");
        dup.name = "Other".to_string();

        let result = store.create_project(&dup);
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(store.get_project(id).unwrap().unwrap().name, "Project acme");
    }

    #[test]
    fn test_list_projects_counts() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        store.create_project(&new_project("empty")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();

        let r1 = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();
        let r2 = store.create_release(&new_release(acme, "1.1.0", "2024-02-01")).unwrap();
        let f1 = store.create_file(&new_file(acme, r1, linux, "a.tar.gz")).unwrap();
        let f2 = store.create_file(&new_file(acme, r1, linux, "b.tar.gz")).unwrap();
        let f3 = store.create_file(&new_file(acme, r2, linux, "c.tar.gz")).unwrap();
        for id in [f1, f2, f2, f3, f3, f3] {
            assert!(store.increment_file_downloads(id).unwrap());
        }

        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 2);

        let acme = projects.iter().find(|p| p.project.slug == "acme").unwrap();
        assert_eq!(acme.release_count, 2);
        assert_eq!(acme.total_downloads, 6);

        let empty = projects.iter().find(|p| p.project.slug == "empty").unwrap();
        assert_eq!(empty.release_count, 0);
        assert_eq!(empty.total_downloads, 0);
    }

    #[test]
    fn test_public_releases_ordered_by_date() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();
        store.create_release(&new_release(acme, "2.0.0", "2024-06-01")).unwrap();
        let mut hidden = new_release(acme, "3.0.0-rc1", "2024-09-01");
        hidden.public = false;
        let hidden_id = store.create_release(&hidden).unwrap();

        let releases = store.list_public_releases_by_project_slug("acme").unwrap();
        let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["2.0.0", "1.0.0"]);

        let private = store.get_release(hidden_id).unwrap().unwrap();
        assert!(!private.public);

        let by_version = store
            .get_release_by_project_slug_and_version("acme", "1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(
            by_version.release_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(store.list_public_releases_by_project_slug("nope").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_release_version_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        let other = store.create_project(&new_project("other")).unwrap();
        store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();

        let result = store.create_release(&new_release(acme, "1.0.0", "2024-03-01"));
        assert!(matches!(result, Err(Error::AlreadyExists(_))));

        // Same version under another project is fine.
        store.create_release(&new_release(other, "1.0.0", "2024-01-01")).unwrap();
    }

    #[test]
    fn test_release_for_missing_project_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let result = store.create_release(&new_release(42, "1.0.0", "2024-01-01"));
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_platform_crud() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let id = store
            .create_platform(&NewPlatform {
                name: "Windows".to_string(),
                slug: "windows".to_string(),
            })
            .unwrap();
        store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();

        assert_eq!(store.get_platform(id).unwrap().unwrap().slug, "windows");
        assert_eq!(store.get_platform_by_slug("windows").unwrap().unwrap().id, id);

        let names: Vec<String> = store
            .list_platforms()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Linux", "Windows"]);

        let dup = store.create_platform(&NewPlatform {
            name: "Win".to_string(),
            slug: "windows".to_string(),
        });
        assert!(matches!(dup, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_file_lookup_by_key() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();
        let release = store.create_release(&new_release(acme, "1.2.0", "2024-01-01")).unwrap();
        let id = store
            .create_file(&new_file(acme, release, linux, "acme-1.2.0-linux.tar.gz"))
            .unwrap();

        let key = ArtifactKey::new("acme", "linux", "1.2.0", "acme-1.2.0-linux.tar.gz");
        let resolved = store.get_file_by_key(&key).unwrap().unwrap();
        assert_eq!(resolved.file.id, id);
        assert_eq!(resolved.project_slug, "acme");
        assert_eq!(resolved.platform_slug, "linux");
        assert_eq!(resolved.version, "1.2.0");
        assert_eq!(resolved.file.downloads, 0);
        assert!(resolved.file.content_type.is_none());

        let miss = ArtifactKey::new("acme", "windows", "1.2.0", "acme-1.2.0-linux.tar.gz");
        assert!(store.get_file_by_key(&miss).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_file_rejected_and_counter_kept() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();
        let release = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();
        let id = store.create_file(&new_file(acme, release, linux, "a.zip")).unwrap();
        store.increment_file_downloads(id).unwrap();

        let mut dup = new_file(acme, release, linux, "a.zip");
        dup.sha256 = "ff".repeat(32);
        let result = store.create_file(&dup);
        assert!(matches!(result, Err(Error::AlreadyExists(_))));

        let original = store.get_file(id).unwrap().unwrap();
        assert_eq!(original.downloads, 1);
        assert_eq!(original.sha256, "00".repeat(32));
    }

    #[test]
    fn test_file_release_must_belong_to_project() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        let other = store.create_project(&new_project("other")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();
        let release = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();

        let result = store.create_file(&new_file(other, release, linux, "a.zip"));
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_list_files_by_project_joins_platform() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);

        let acme = store.create_project(&new_project("acme")).unwrap();
        let other = store.create_project(&new_project("other")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();
        let mac = store
            .create_platform(&NewPlatform {
                name: "macOS".to_string(),
                slug: "macos".to_string(),
            })
            .unwrap();
        let r = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();
        let r_other = store.create_release(&new_release(other, "1.0.0", "2024-01-01")).unwrap();
        store.create_file(&new_file(acme, r, mac, "acme.dmg")).unwrap();
        store.create_file(&new_file(acme, r, linux, "acme.tar.gz")).unwrap();
        store.create_file(&new_file(other, r_other, linux, "other.tar.gz")).unwrap();

        let files = store.list_files_by_project(acme).unwrap();
        let names: Vec<(&str, &str)> = files
            .iter()
            .map(|f| (f.platform_slug.as_str(), f.file.filename.as_str()))
            .collect();
        assert_eq!(names, vec![("linux", "acme.tar.gz"), ("macos", "acme.dmg")]);
        assert_eq!(files[1].platform_name, "macOS");
    }

    #[test]
    fn test_increment_missing_file() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        assert!(!store.increment_file_downloads(999).unwrap());
    }

    /// Project "acme" with one release and one linux file; returns the file id.
    fn seed_file(store: &SqliteStore) -> i64 {
        let acme = store.create_project(&new_project("acme")).unwrap();
        let linux = store
            .create_platform(&NewPlatform {
                name: "Linux".to_string(),
                slug: "linux".to_string(),
            })
            .unwrap();
        let release = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();
        store.create_file(&new_file(acme, release, linux, "a.zip")).unwrap()
    }

    #[test]
    fn test_reads_do_not_wait_for_the_writer() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(open(&temp));
        store.create_project(&new_project("acme")).unwrap();

        let writer = store.writer();
        let (tx, rx) = mpsc::channel();
        let reader = Arc::clone(&store);
        let handle = thread::spawn(move || {
            let found = reader.get_project_by_slug("acme").map(|p| p.is_some());
            tx.send(found).unwrap();
        });

        let found = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("read queued behind the writer connection");
        assert!(found.unwrap());

        drop(writer);
        handle.join().unwrap();
    }

    #[test]
    fn test_increments_from_separate_connections_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.db");
        let store = open(&temp);
        let id = seed_file(&store);

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let own = SqliteStore::new(&path).unwrap();
                    barrier.wait();
                    for _ in 0..PER_THREAD {
                        assert!(own.increment_file_downloads(id).unwrap());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            store.get_file(id).unwrap().unwrap().downloads,
            (THREADS * PER_THREAD) as i64
        );
    }

    #[test]
    fn test_racing_first_run_migrations() {
        const THREADS: usize = 6;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.db");

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || -> Result<()> {
                    barrier.wait();
                    SqliteStore::new(&path)?.initialize()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        store.create_project(&new_project("acme")).unwrap();
        assert_eq!(store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_unparseable_release_date_fails_the_read() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let acme = store.create_project(&new_project("acme")).unwrap();
        let id = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();

        store
            .writer()
            .execute("UPDATE release SET release_date = 'someday' WHERE id = ?1", params![id])
            .unwrap();

        assert!(matches!(store.get_release(id), Err(Error::Database(_))));
        assert!(store.list_public_releases_by_project_slug("acme").is_err());
    }

    #[test]
    fn test_release_date_accepts_timestamps() {
        let temp = TempDir::new().unwrap();
        let store = open(&temp);
        let acme = store.create_project(&new_project("acme")).unwrap();
        let id = store.create_release(&new_release(acme, "1.0.0", "2024-01-01")).unwrap();

        store
            .writer()
            .execute(
                "UPDATE release SET release_date = '2024-02-03 10:11:12' WHERE id = ?1",
                params![id],
            )
            .unwrap();

        assert_eq!(
            store.get_release(id).unwrap().unwrap().release_date,
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
        );
    }
}
