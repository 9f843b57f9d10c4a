// ============================
// backend-lib/src/storage.rs
// ============================
//! Storage abstraction with a SQLite implementation.
//!
//! Tables:
//! - `users`: username, email (unique), password credential, created_at
//! - `posts`: creator, title, description, link (unique), image, tags (JSON), timestamps
//! - `tags`: name (unique), created_at
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkshelf_common::{Post, PostPage, RecordId};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row, Transaction};

use crate::auth::Credential;
use crate::error::AppError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        creator_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT,
        link TEXT NOT NULL UNIQUE,
        image TEXT NOT NULL,
        tags TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    );";

const POST_COLUMNS: &str =
    "id, creator_id, title, description, link, image, tags, created_at, updated_at";

/// A user about to be registered
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub credential: Credential,
}

/// A stored user, credential included; never serialized to clients
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
}

/// A validated post about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub image: String,
    pub tags: Vec<String>,
}

/// Validated replacement values for an existing post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub tags: Vec<String>,
}

/// Filtering and paging for post listings
#[derive(Debug, Clone)]
pub struct PostQuery {
    /// Matched against title or description
    pub search: Option<String>,
    /// Normalized tag names; a post must carry all of them
    pub tags: Vec<String>,
    /// 1-based
    pub page: u32,
    pub per_page: u32,
}

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a user; a duplicate email is a conflict
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, AppError>;

    /// Case-insensitive lookup by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// One page of posts, newest first
    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, AppError>;

    async fn get_post(&self, id: RecordId) -> Result<Option<Post>, AppError>;

    /// Insert a post and register its tags; a duplicate link is a conflict
    async fn create_post(&self, creator_id: RecordId, post: NewPost) -> Result<Post, AppError>;

    /// Replace the editable fields of a post, `None` if it does not exist
    async fn update_post(&self, id: RecordId, changes: PostChanges)
        -> Result<Option<Post>, AppError>;

    /// Delete a post, returning what was deleted
    async fn delete_post(&self, id: RecordId) -> Result<Option<Post>, AppError>;

    /// All known tag names, alphabetical
    async fn list_tags(&self) -> Result<Vec<String>, AppError>;
}

/// Convert a tags array to a JSON string for storage
pub fn serialize_tags(tags: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tags)
}

/// Parse a stored tags JSON string back into an array
pub fn deserialize_tags(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '\'`
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Raw `posts` row, tags still encoded
struct PostRow {
    id: RecordId,
    creator_id: RecordId,
    title: String,
    description: Option<String>,
    link: String,
    image: String,
    tags: String,
    created_at: i64,
    updated_at: i64,
}

impl PostRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            creator_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            link: row.get(4)?,
            image: row.get(5)?,
            tags: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_post(self) -> Result<Post, AppError> {
        Ok(Post {
            id: self.id,
            creator_id: self.creator_id,
            title: self.title,
            description: self.description,
            link: self.link,
            image: self.image,
            tags: deserialize_tags(&self.tags)?,
            created_at: to_datetime(self.created_at),
            updated_at: to_datetime(self.updated_at),
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        credential: Credential::from(row.get::<_, String>(3)?),
        created_at: to_datetime(row.get(4)?),
    })
}

fn select_post(conn: &Connection, id: RecordId) -> rusqlite::Result<Option<PostRow>> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        params![id],
        PostRow::from_row,
    )
    .optional()
}

fn insert_tags(tx: &Transaction<'_>, tags: &[String], now: i64) -> rusqlite::Result<()> {
    let mut stmt =
        tx.prepare_cached("INSERT INTO tags (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING")?;
    for tag in tags {
        stmt.execute(params![tag.to_lowercase(), now])?;
    }
    Ok(())
}

/// SQLite implementation of the Storage trait
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::init(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO users (username, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.username, user.email, user.credential.as_str(), now_secs()],
        );

        match inserted {
            Ok(_) => {},
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("User already exists!".to_string()));
            },
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        let record = conn.query_row(
            "SELECT id, username, email, password, created_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )?;
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT id, username, email, password, created_at FROM users WHERE email = ?1",
                params![email.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, AppError> {
        let per_page = query.per_page.max(1);
        let page = query.page.max(1);

        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            clauses.push("(title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')");
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern));
        }

        // Tags are stored as a JSON array, so match the quoted JSON string
        for tag in &query.tags {
            let quoted = serde_json::to_string(tag)?;
            clauses.push("tags LIKE ? ESCAPE '\\'");
            args.push(Value::Text(format!("%{}%", escape_like(&quoted))));
        }

        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM posts{filter}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let offset = i64::from(page - 1) * i64::from(per_page);
        args.push(Value::Integer(i64::from(per_page)));
        args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts{filter} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), PostRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let posts = rows
            .into_iter()
            .map(PostRow::into_post)
            .collect::<Result<Vec<_>, _>>()?;

        let total = total.max(0) as u64;
        let per_page = u64::from(per_page);
        Ok(PostPage {
            posts,
            current_page: page,
            next_page_exists: total > u64::from(page) * per_page,
            total_pages: total.div_ceil(per_page) as u32,
        })
    }

    async fn get_post(&self, id: RecordId) -> Result<Option<Post>, AppError> {
        let conn = self.conn.lock();
        select_post(&conn, id)?.map(PostRow::into_post).transpose()
    }

    async fn create_post(&self, creator_id: RecordId, post: NewPost) -> Result<Post, AppError> {
        let tags = serialize_tags(&post.tags)?;
        let now = now_secs();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO posts (creator_id, title, description, link, image, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![creator_id, post.title, post.description, post.link, post.image, tags, now],
        );
        match inserted {
            Ok(_) => {},
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "A post with this link already exists!".to_string(),
                ));
            },
            Err(e) => return Err(e.into()),
        }

        let id = tx.last_insert_rowid();
        insert_tags(&tx, &post.tags, now)?;
        let row = select_post(&tx, id)?
            .ok_or_else(|| AppError::Internal(format!("post {id} vanished after insert")))?;
        tx.commit()?;

        row.into_post()
    }

    async fn update_post(
        &self,
        id: RecordId,
        changes: PostChanges,
    ) -> Result<Option<Post>, AppError> {
        let tags = serialize_tags(&changes.tags)?;
        let now = now_secs();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE posts SET title = ?1, description = ?2, image = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6",
            params![changes.title, changes.description, changes.image, tags, now, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        insert_tags(&tx, &changes.tags, now)?;
        let row = select_post(&tx, id)?;
        tx.commit()?;

        row.map(PostRow::into_post).transpose()
    }

    async fn delete_post(&self, id: RecordId) -> Result<Option<Post>, AppError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(row) = select_post(&tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tx.commit()?;

        row.into_post().map(Some)
    }

    async fn list_tags(&self) -> Result<Vec<String>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}
