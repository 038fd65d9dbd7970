//! Versioned schema. The applied version lives in `PRAGMA user_version`.

/// Version the code expects the database to be at.
pub const SCHEMA_VERSION: u32 = 1;

/// A schema step that takes the database from `version - 1` to `version`.
pub struct Migration {
    pub version: u32,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: V1_SCHEMA,
}];

const V1_SCHEMA: &str = r#"
-- Projects are the top of the tree
CREATE TABLE project (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    vcs_url TEXT,
    description TEXT
);

-- Platforms are shared by every project
CREATE TABLE platform (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL
);

CREATE TABLE release (
    id INTEGER PRIMARY KEY,
    project INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
    version TEXT NOT NULL,
    semver TEXT NOT NULL,
    release_date TEXT NOT NULL,
    vcs_tag TEXT,
    title TEXT,
    summary TEXT,
    changelog TEXT,
    discussion_url TEXT,
    public INTEGER NOT NULL DEFAULT 1
);

-- `project` duplicates release.project to keep the natural-key join flat
CREATE TABLE file (
    id INTEGER PRIMARY KEY,
    project INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
    release INTEGER NOT NULL REFERENCES release(id) ON DELETE CASCADE,
    platform INTEGER NOT NULL REFERENCES platform(id),
    filename TEXT NOT NULL,
    content_type TEXT,
    sha256 TEXT NOT NULL,
    downloads INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX idx_project_slug ON project(slug);
CREATE UNIQUE INDEX idx_platform_slug ON platform(slug);
CREATE UNIQUE INDEX idx_release_project_version ON release(project, version);
CREATE UNIQUE INDEX idx_file_natural_key ON file(project, release, platform, filename);
CREATE INDEX idx_file_release ON file(release);
"#;

/// Steps that must run to move a database at `current` up to `target`.
/// A stamp at or above `target` yields nothing.
pub fn pending(
    steps: &[Migration],
    current: u32,
    target: u32,
) -> impl Iterator<Item = &Migration> {
    steps
        .iter()
        .filter(move |m| m.version > current && m.version <= target)
}
