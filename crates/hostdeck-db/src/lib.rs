// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod import;
mod validation;

use anyhow::{Context, Result, anyhow, bail};
use hostdeck_app::{
    CursorPair, DetailRequest, InstanceId, Query, ResultPage, ResultRow, TaskEvent, TaskEventSeq,
    TaskStatus,
};
use hostdeck_testkit::HostFaker;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, UtcOffset};
use time::format_description::well_known::Rfc3339;

pub use import::ImportSummary;
pub use validation::{MAX_EVENT_DURATION_MS, MAX_NAME_LEN};

pub const APP_NAME: &str = "hostdeck";
pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 1000;

const DEMO_HOSTS_PER_GROUP: usize = 12;
// Host totals stop growing here so the column stays an INTEGER.
const MAX_HOST_DURATION_MS: i64 = i64::MAX / 2;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("instances", &["id", "created_at"]),
    (
        "task_events",
        &[
            "seq",
            "instance_id",
            "host",
            "host_group",
            "task",
            "status",
            "duration_ms",
            "created_at",
            "payload",
        ],
    ),
    (
        "hosts",
        &[
            "instance_id",
            "host",
            "host_group",
            "duration_ms",
            "updated_at",
        ],
    ),
];

struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_task_events_host",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_task_events_host ON task_events (instance_id, host, host_group, seq);",
    },
    RequiredIndex {
        name: "idx_hosts_group",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_hosts_group ON hosts (instance_id, host_group);",
    },
];

/// Task outcome to record. Deserializable so event exports can be imported
/// line by line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTaskEvent {
    #[serde(alias = "instanceId")]
    pub instance_id: InstanceId,
    pub host: String,
    #[serde(alias = "hostGroup")]
    pub host_group: String,
    pub task: String,
    pub status: TaskStatus,
    #[serde(default, alias = "duration")]
    pub duration_ms: u64,
    #[serde(default, with = "time::serde::rfc3339::option", alias = "createdAt")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    /// Stores one task outcome and folds it into the host aggregate.
    pub fn record_event(&self, event: &NewTaskEvent) -> Result<TaskEventSeq> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin event transaction")?;
        let seq = insert_event(&tx, event)?;
        tx.commit().context("commit task event")?;
        Ok(seq)
    }

    /// One page of hosts. The host filter matches a case-insensitive
    /// substring; the host group filter matches exactly.
    pub fn list_hosts(&self, instance_id: &InstanceId, query: &Query, limit: u64) -> Result<ResultPage> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            bail!("page size must be between 1 and {MAX_PAGE_SIZE}, got {limit}");
        }
        let offset = query.offset.unwrap_or(0);
        let sql_offset = i64::try_from(offset)
            .with_context(|| format!("page offset {offset} is too large"))?;
        // One extra row tells whether a next page exists.
        let sql_limit = i64::try_from(limit + 1).context("page size is too large")?;

        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT host, host_group, duration_ms
                FROM hosts
                WHERE instance_id = ?1
                  AND (?2 IS NULL OR instr(lower(host), lower(?2)) > 0)
                  AND (?3 IS NULL OR host_group = ?3)
                ORDER BY host ASC, host_group ASC
                LIMIT ?4 OFFSET ?5
                ",
            )
            .context("prepare hosts query")?;
        let rows = stmt
            .query_map(
                params![
                    instance_id.as_str(),
                    query.host,
                    query.host_group,
                    sql_limit,
                    sql_offset,
                ],
                |row| {
                    let duration_ms: i64 = row.get(2)?;
                    Ok(ResultRow {
                        host: row.get(0)?,
                        host_group: row.get(1)?,
                        duration_millis: u64::try_from(duration_ms).unwrap_or(0),
                    })
                },
            )
            .context("query hosts")?;
        let mut rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect hosts")?;

        let has_more = rows.len() as u64 > limit;
        rows.truncate(limit as usize);

        let cursors = CursorPair {
            prev_offset: (offset > 0).then(|| offset.saturating_sub(limit)),
            next_offset: has_more.then(|| offset + limit),
        };
        tracing::debug!(
            instance = %instance_id,
            offset,
            rows = rows.len(),
            ?cursors,
            "listed hosts"
        );
        Ok(ResultPage { rows, cursors })
    }

    /// Every host group of the instance, regardless of the current page.
    pub fn list_host_groups(&self, instance_id: &InstanceId) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT DISTINCT host_group
                FROM hosts
                WHERE instance_id = ?
                ORDER BY host_group ASC
                ",
            )
            .context("prepare host groups query")?;
        let rows = stmt
            .query_map(params![instance_id.as_str()], |row| row.get::<_, String>(0))
            .context("query host groups")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect host groups")
    }

    pub fn list_host_tasks(&self, request: &DetailRequest) -> Result<Vec<TaskEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT seq, host, host_group, task, status, duration_ms, created_at, payload
                FROM task_events
                WHERE instance_id = ? AND host = ? AND host_group = ?
                ORDER BY seq ASC
                ",
            )
            .context("prepare host tasks query")?;
        let rows = stmt
            .query_map(
                params![request.instance_id.as_str(), request.host, request.host_group],
                |row| {
                    let status_raw: String = row.get(4)?;
                    let status = TaskStatus::parse(&status_raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Text,
                            Box::new(std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                format!("unknown task status {status_raw}"),
                            )),
                        )
                    })?;
                    let duration_ms: i64 = row.get(5)?;
                    let created_at_raw: String = row.get(6)?;
                    let payload_raw: String = row.get(7)?;

                    Ok(TaskEvent {
                        seq: TaskEventSeq::new(row.get(0)?),
                        host: row.get(1)?,
                        host_group: row.get(2)?,
                        task: row.get(3)?,
                        status,
                        duration_millis: u64::try_from(duration_ms).unwrap_or(0),
                        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                        message: payload_message(&payload_raw),
                    })
                },
            )
            .with_context(|| format!("query tasks for host {}", request.host))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect host tasks")
    }

    /// Known instances, newest first.
    pub fn list_instances(&self) -> Result<Vec<InstanceId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM instances ORDER BY created_at DESC, id DESC")
            .context("prepare instances query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0).map(InstanceId::new))
            .context("query instances")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect instances")
    }

    pub fn latest_instance(&self) -> Result<Option<InstanceId>> {
        self.conn
            .query_row(
                "SELECT id FROM instances ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0).map(InstanceId::new),
            )
            .optional()
            .context("query latest instance")
    }

    pub fn instance_exists(&self, instance_id: &InstanceId) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM instances WHERE id = ?)",
                params![instance_id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("check instance {instance_id}"))?;
        Ok(exists == 1)
    }

    /// Records a generated playbook run and returns its instance id.
    pub fn seed_demo_data(&self, seed: u64) -> Result<InstanceId> {
        let mut faker = HostFaker::new(seed);
        let playbook = faker.playbook(DEMO_HOSTS_PER_GROUP);
        let instance_id = InstanceId::new(playbook.instance_id);

        for event in playbook.events {
            self.record_event(&NewTaskEvent {
                instance_id: instance_id.clone(),
                host: event.host,
                host_group: event.host_group,
                task: event.task,
                status: event.status,
                duration_ms: event.duration_ms,
                created_at: Some(event.created_at),
                message: event.message,
            })?;
        }
        tracing::info!(instance = %instance_id, seed, "seeded demo data");
        Ok(instance_id)
    }
}

/// Inserts one event and updates its host row. The caller owns the
/// transaction.
fn insert_event(conn: &Connection, event: &NewTaskEvent) -> Result<TaskEventSeq> {
    event.validate()?;

    let created_at = match event.created_at {
        Some(value) => value
            .to_offset(UtcOffset::UTC)
            .format(&Rfc3339)
            .context("format event timestamp")?,
        None => now_rfc3339()?,
    };
    let duration_ms = i64::try_from(event.duration_ms)
        .with_context(|| format!("event duration {} is too large", event.duration_ms))?;
    let payload = serde_json::json!({ "msg": event.message }).to_string();

    conn.execute(
        "INSERT OR IGNORE INTO instances (id, created_at) VALUES (?, ?)",
        params![event.instance_id.as_str(), created_at],
    )
    .with_context(|| format!("register instance {}", event.instance_id))?;
    conn.execute(
        "
        INSERT INTO task_events (
          instance_id, host, host_group, task, status, duration_ms, created_at, payload
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            event.instance_id.as_str(),
            event.host,
            event.host_group,
            event.task,
            event.status.as_str(),
            duration_ms,
            created_at,
            payload,
        ],
    )
    .context("insert task event")?;
    let seq = conn.last_insert_rowid();
    conn.execute(
        "
        INSERT INTO hosts (instance_id, host, host_group, duration_ms, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (instance_id, host, host_group) DO UPDATE SET
          duration_ms = MIN(duration_ms + excluded.duration_ms, ?6),
          updated_at = excluded.updated_at
        ",
        params![
            event.instance_id.as_str(),
            event.host,
            event.host_group,
            duration_ms,
            created_at,
            MAX_HOST_DURATION_MS,
        ],
    )
    .context("update host aggregate")?;

    Ok(TaskEventSeq::new(seq))
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("HOSTDECK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set HOSTDECK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("hostdeck.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn payload_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("msg")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a hostdeck database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; recreate the database or import into a fresh one",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; recreate the database",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("unsupported datetime format {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
