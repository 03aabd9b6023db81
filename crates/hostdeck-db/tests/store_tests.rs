// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use hostdeck_app::{DetailRequest, InstanceId, Query, RowKey, TaskStatus};
use hostdeck_db::{MAX_EVENT_DURATION_MS, NewTaskEvent, Store, validate_db_path};
use hostdeck_testkit::{fixture_datetime, temp_db_path};
use std::io::Cursor;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn event(instance: &str, host: &str, group: &str, duration_ms: u64) -> NewTaskEvent {
    NewTaskEvent {
        instance_id: InstanceId::new(instance),
        host: host.to_owned(),
        host_group: group.to_owned(),
        task: "Gathering Facts".to_owned(),
        status: TaskStatus::Ok,
        duration_ms,
        created_at: None,
        message: None,
    }
}

fn store_with_hosts(count: usize, group: &str) -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    for index in 0..count {
        store.record_event(&event("run-1", &format!("host-{index:03}"), group, 100))?;
    }
    Ok(store)
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/hostdeck.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        store.record_event(&event("run-1", "web-01", "web-servers", 10))?;
    }
    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.list_instances()?, vec![InstanceId::new("run-1")]);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.raw_connection().execute_batch(
        "
        DROP TABLE hosts;
        CREATE TABLE hosts (
          instance_id TEXT NOT NULL,
          host TEXT NOT NULL,
          host_group TEXT NOT NULL
        );
        ",
    )?;

    let error = store.bootstrap().expect_err("schema without duration_ms should fail");
    let message = format!("{error:#}");
    assert!(message.contains("hosts"), "{message}");
    assert!(message.contains("duration_ms"), "{message}");
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")?;
    let error = store.bootstrap().expect_err("unrelated database should fail");
    assert!(format!("{error:#}").contains("instances"));
    Ok(())
}

#[test]
fn record_event_accumulates_host_duration_per_group() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.record_event(&event("run-1", "web-01", "web-servers", 400))?;
    store.record_event(&event("run-1", "web-01", "web-servers", 600))?;
    store.record_event(&event("run-1", "web-01", "edge-proxies", 50))?;

    let page = store.list_hosts(&InstanceId::new("run-1"), &Query::first_page(), 50)?;
    let rows = page
        .rows
        .iter()
        .map(|row| (row.host_group.as_str(), row.duration_millis))
        .collect::<Vec<_>>();
    assert_eq!(rows, vec![("edge-proxies", 50), ("web-servers", 1_000)]);
    Ok(())
}

#[test]
fn record_event_rejects_blank_host() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let error = store
        .record_event(&event("run-1", " ", "web-servers", 1))
        .expect_err("blank host should be rejected");
    assert!(error.to_string().contains("host is required"));
    assert!(store.list_instances()?.is_empty());
    Ok(())
}

#[test]
fn zero_duration_hosts_are_listed_unmeasured() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.record_event(&NewTaskEvent {
        status: TaskStatus::Skipped,
        ..event("run-1", "db-01", "db-servers", 0)
    })?;

    let page = store.list_hosts(&InstanceId::new("run-1"), &Query::first_page(), 50)?;
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].measured_duration(), None);
    Ok(())
}

#[test]
fn list_hosts_pages_forward_and_back() -> Result<()> {
    let store = store_with_hosts(120, "db-servers")?;
    let instance = InstanceId::new("run-1");

    let first = store.list_hosts(&instance, &Query::first_page(), 50)?;
    assert_eq!(first.rows.len(), 50);
    assert_eq!(first.cursors.prev_offset, None);
    assert_eq!(first.cursors.next_offset, Some(50));

    let second = store.list_hosts(
        &instance,
        &Query {
            offset: Some(50),
            ..Query::default()
        },
        50,
    )?;
    assert_eq!(second.rows[0].host, "host-050");
    assert_eq!(second.cursors.prev_offset, Some(0));
    assert_eq!(second.cursors.next_offset, Some(100));

    let last = store.list_hosts(
        &instance,
        &Query {
            offset: Some(100),
            ..Query::default()
        },
        50,
    )?;
    assert_eq!(last.rows.len(), 20);
    assert_eq!(last.cursors.prev_offset, Some(50));
    assert_eq!(last.cursors.next_offset, None);
    Ok(())
}

#[test]
fn exact_page_boundary_has_no_next_cursor() -> Result<()> {
    let store = store_with_hosts(50, "web-servers")?;
    let page = store.list_hosts(&InstanceId::new("run-1"), &Query::first_page(), 50)?;
    assert_eq!(page.rows.len(), 50);
    assert_eq!(page.cursors.next_offset, None);
    Ok(())
}

#[test]
fn list_hosts_applies_host_substring_and_exact_group() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.record_event(&event("run-1", "web-01", "web-servers", 1))?;
    store.record_event(&event("run-1", "WEB-02", "web-servers", 1))?;
    store.record_event(&event("run-1", "web-01", "edge-proxies", 1))?;
    store.record_event(&event("run-1", "db-01", "db-servers", 1))?;
    store.record_event(&event("run-2", "web-03", "web-servers", 1))?;
    let instance = InstanceId::new("run-1");

    let by_host = store.list_hosts(
        &instance,
        &Query {
            host: Some("web".to_owned()),
            ..Query::default()
        },
        50,
    )?;
    assert_eq!(by_host.rows.len(), 3);

    let by_both = store.list_hosts(
        &instance,
        &Query {
            offset: None,
            host: Some("web-01".to_owned()),
            host_group: Some("web-servers".to_owned()),
        },
        50,
    )?;
    assert_eq!(
        by_both.rows.iter().map(|row| row.key()).collect::<Vec<_>>(),
        vec![RowKey::new("web-01", "web-servers")]
    );

    let partial_group = store.list_hosts(
        &instance,
        &Query {
            host_group: Some("web".to_owned()),
            ..Query::default()
        },
        50,
    )?;
    assert!(partial_group.rows.is_empty());
    Ok(())
}

#[test]
fn list_hosts_rejects_out_of_range_page_size() -> Result<()> {
    let store = store_with_hosts(1, "web-servers")?;
    let instance = InstanceId::new("run-1");
    assert!(store.list_hosts(&instance, &Query::first_page(), 0).is_err());
    assert!(store.list_hosts(&instance, &Query::first_page(), 1_001).is_err());
    Ok(())
}

#[test]
fn host_groups_are_distinct_and_sorted() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.record_event(&event("run-1", "web-01", "web-servers", 1))?;
    store.record_event(&event("run-1", "web-02", "web-servers", 1))?;
    store.record_event(&event("run-1", "db-01", "db-servers", 1))?;
    store.record_event(&event("run-2", "mon-01", "monitoring", 1))?;

    assert_eq!(
        store.list_host_groups(&InstanceId::new("run-1"))?,
        vec!["db-servers".to_owned(), "web-servers".to_owned()]
    );
    Ok(())
}

#[test]
fn host_tasks_come_back_in_record_order_with_messages() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let at = OffsetDateTime::parse(fixture_datetime(), &Rfc3339)?;
    store.record_event(&NewTaskEvent {
        task: "install base packages".to_owned(),
        created_at: Some(at),
        ..event("run-1", "web-01", "web-servers", 900)
    })?;
    store.record_event(&NewTaskEvent {
        task: "restart nginx".to_owned(),
        status: TaskStatus::Failed,
        message: Some("Service failed to start".to_owned()),
        created_at: Some(at),
        ..event("run-1", "web-01", "web-servers", 300)
    })?;
    store.record_event(&event("run-1", "web-01", "edge-proxies", 5))?;

    let tasks = store.list_host_tasks(&DetailRequest::for_row(
        &InstanceId::new("run-1"),
        &RowKey::new("web-01", "web-servers"),
    ))?;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].task, "install base packages");
    assert_eq!(tasks[0].message, None);
    assert_eq!(tasks[0].created_at, at);
    assert_eq!(tasks[1].status, TaskStatus::Failed);
    assert_eq!(tasks[1].message.as_deref(), Some("Service failed to start"));
    assert!(tasks[0].seq < tasks[1].seq);
    Ok(())
}

#[test]
fn latest_instance_prefers_newest_creation_time() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    assert_eq!(store.latest_instance()?, None);

    let older = OffsetDateTime::parse("2026-01-01T00:00:00Z", &Rfc3339)?;
    let newer = OffsetDateTime::parse("2026-03-01T00:00:00Z", &Rfc3339)?;
    store.record_event(&NewTaskEvent {
        created_at: Some(newer),
        ..event("run-new", "web-01", "web-servers", 1)
    })?;
    store.record_event(&NewTaskEvent {
        created_at: Some(older),
        ..event("run-old", "web-01", "web-servers", 1)
    })?;

    assert_eq!(store.latest_instance()?, Some(InstanceId::new("run-new")));
    assert!(store.instance_exists(&InstanceId::new("run-old"))?);
    assert!(!store.instance_exists(&InstanceId::new("run-missing"))?);
    Ok(())
}

#[test]
fn latest_instance_compares_timestamps_across_offsets() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    // 05:00 UTC, written with a local offset.
    let older = OffsetDateTime::parse("2026-01-01T10:00:00+05:00", &Rfc3339)?;
    let newer = OffsetDateTime::parse("2026-01-01T06:00:00Z", &Rfc3339)?;
    store.record_event(&NewTaskEvent {
        created_at: Some(older),
        ..event("older", "web-01", "web-servers", 1)
    })?;
    store.record_event(&NewTaskEvent {
        created_at: Some(newer),
        ..event("newer", "web-01", "web-servers", 1)
    })?;

    assert_eq!(store.latest_instance()?, Some(InstanceId::new("newer")));
    assert_eq!(
        store.list_instances()?,
        vec![InstanceId::new("newer"), InstanceId::new("older")]
    );

    let tasks = store.list_host_tasks(&DetailRequest::for_row(
        &InstanceId::new("older"),
        &RowKey::new("web-01", "web-servers"),
    ))?;
    assert_eq!(tasks[0].created_at, older);
    Ok(())
}

#[test]
fn oversized_durations_are_rejected_and_totals_stay_integral() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let error = store
        .record_event(&event(
            "run-1",
            "web-01",
            "web-servers",
            MAX_EVENT_DURATION_MS + 1,
        ))
        .expect_err("oversized duration should be rejected");
    assert!(error.to_string().contains("must be at most"), "{error}");
    assert!(store.list_instances()?.is_empty());

    store.record_event(&event("run-1", "web-01", "web-servers", MAX_EVENT_DURATION_MS))?;
    store.raw_connection().execute(
        "UPDATE hosts SET duration_ms = ?",
        [i64::MAX / 2 - 1],
    )?;
    store.record_event(&event("run-1", "web-01", "web-servers", MAX_EVENT_DURATION_MS))?;

    let page = store.list_hosts(&InstanceId::new("run-1"), &Query::first_page(), 50)?;
    assert_eq!(page.rows[0].duration_millis, (i64::MAX / 2) as u64);
    Ok(())
}

#[test]
fn import_jsonl_skips_blank_lines_and_accepts_camel_case() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let input = concat!(
        r#"{"instance_id":"run-1","host":"web-01","host_group":"web-servers","task":"ping","status":"ok","duration_ms":12}"#,
        "\n\n",
        r#"{"instanceId":"run-1","host":"db-01","hostGroup":"db-servers","task":"ping","status":"failed","duration":40,"msg":"timeout","createdAt":"2026-02-19T12:34:56Z"}"#,
        "\n",
    );

    let summary = store.import_events_jsonl(Cursor::new(input))?;
    assert_eq!(summary.events, 2);
    assert_eq!(summary.instances.len(), 1);

    let tasks = store.list_host_tasks(&DetailRequest::for_row(
        &InstanceId::new("run-1"),
        &RowKey::new("db-01", "db-servers"),
    ))?;
    assert_eq!(tasks[0].message.as_deref(), Some("timeout"));
    assert_eq!(tasks[0].duration_millis, 40);
    Ok(())
}

#[test]
fn import_jsonl_names_the_offending_line() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let input = concat!(
        r#"{"instance_id":"run-1","host":"web-01","host_group":"web-servers","task":"ping","status":"ok"}"#,
        "\n",
        r#"{"instance_id":"run-1","host":"web-02","host_group":"web-servers","task":"ping","status":"exploded"}"#,
        "\n",
    );

    let error = store
        .import_events_jsonl(Cursor::new(input))
        .expect_err("unknown status should fail");
    assert!(format!("{error:#}").contains("line 2"));
    Ok(())
}

#[test]
fn failed_import_leaves_store_untouched_and_retry_counts_once() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let good = concat!(
        r#"{"instance_id":"run-1","host":"web-01","host_group":"web-servers","task":"ping","status":"ok","duration_ms":5}"#,
        "\n",
        r#"{"instance_id":"run-1","host":"web-02","host_group":"web-servers","task":"ping","status":"ok","duration_ms":5}"#,
        "\n",
    );

    let broken = format!("{good}not json\n");
    let error = store
        .import_events_jsonl(Cursor::new(broken))
        .expect_err("bad line should fail the import");
    assert!(format!("{error:#}").contains("line 3"));
    assert!(store.list_instances()?.is_empty());

    let summary = store.import_events_jsonl(Cursor::new(good))?;
    assert_eq!(summary.events, 2);
    let page = store.list_hosts(&InstanceId::new("run-1"), &Query::first_page(), 50)?;
    assert_eq!(
        page.rows.iter().map(|row| row.duration_millis).collect::<Vec<_>>(),
        vec![5, 5]
    );
    Ok(())
}

#[test]
fn seed_demo_data_is_deterministic_and_browsable() -> Result<()> {
    let left = Store::open_memory()?;
    left.bootstrap()?;
    let right = Store::open_memory()?;
    right.bootstrap()?;

    let left_id = left.seed_demo_data(42)?;
    let right_id = right.seed_demo_data(42)?;
    assert_eq!(left_id, right_id);

    let groups = left.list_host_groups(&left_id)?;
    assert_eq!(groups.len(), 6);

    let page = left.list_hosts(&left_id, &Query::first_page(), 50)?;
    assert_eq!(page.rows.len(), 50);
    assert_eq!(page.cursors.next_offset, Some(50));
    assert_eq!(page, right.list_hosts(&right_id, &Query::first_page(), 50)?);
    Ok(())
}
