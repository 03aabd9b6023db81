// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use hostdeck_app::TaskStatus;
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const REFERENCE_YEAR: i32 = 2026;

const HOST_GROUPS: [(&str, &str); 6] = [
    ("web-servers", "web"),
    ("db-servers", "db"),
    ("cache", "redis"),
    ("workers", "worker"),
    ("edge-proxies", "edge"),
    ("monitoring", "mon"),
];

const DATACENTERS: [&str; 4] = ["dfw", "iad", "ord", "sjc"];

const TASK_NAMES: [&str; 16] = [
    "Gathering Facts",
    "install base packages",
    "configure ntp",
    "render nginx config",
    "restart nginx",
    "ensure postgres is running",
    "apply sysctl tuning",
    "create service user",
    "deploy application bundle",
    "run database migrations",
    "template systemd unit",
    "reload systemd",
    "open firewall ports",
    "rotate log files",
    "check disk space",
    "notify monitoring",
];

const FAILURE_MESSAGES: [&str; 6] = [
    "non-zero return code",
    "Failed to connect to the host via ssh",
    "package not found in repository",
    "Timeout when waiting for port 5432",
    "Destination directory does not exist",
    "Service failed to start",
];

/// One generated task outcome, independent of any storage layer.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub host: String,
    pub host_group: String,
    pub task: String,
    pub status: TaskStatus,
    pub duration_ms: u64,
    pub created_at: OffsetDateTime,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Playbook {
    pub instance_id: String,
    pub started_at: OffsetDateTime,
    pub events: Vec<TaskEvent>,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct HostFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl HostFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn instance_id(&mut self) -> String {
        format!(
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            self.rng.next_u64() as u32,
            self.rng.next_u64() as u16,
            (self.rng.next_u64() as u16 & 0x0fff) | 0x4000,
            (self.rng.next_u64() as u16 & 0x3fff) | 0x8000,
            self.rng.next_u64() & 0xffff_ffff_ffff,
        )
    }

    /// Inventory of `(host, host_group)` pairs; a few hosts belong to two
    /// groups, as real inventories do.
    pub fn inventory(&mut self, hosts_per_group: usize) -> Vec<(String, String)> {
        let mut inventory = Vec::new();
        for (group, prefix) in HOST_GROUPS {
            let dc = self.pick(&DATACENTERS);
            for index in 1..=hosts_per_group {
                inventory.push((format!("{prefix}-{dc}-{index:02}"), group.to_owned()));
            }
        }
        let shared = inventory
            .iter()
            .filter(|(_, group)| group == "web-servers")
            .take(2)
            .map(|(host, _)| (host.clone(), "edge-proxies".to_owned()))
            .collect::<Vec<_>>();
        inventory.extend(shared);
        inventory
    }

    /// A full playbook run over a generated inventory. Roughly one host in
    /// ten only has skipped zero-length tasks, so it reports no duration.
    pub fn playbook(&mut self, hosts_per_group: usize) -> Playbook {
        let instance_id = self.instance_id();
        let started_at = self.started_at();
        let inventory = self.inventory(hosts_per_group);
        let mut events = Vec::new();

        for (host, host_group) in inventory {
            let pending = self.int_n(10) == 0;
            let task_count = 3 + self.int_n(6);
            let mut clock = started_at + Duration::seconds(self.int_n(30) as i64);
            for _ in 0..task_count {
                let event = if pending {
                    self.task_event_with(&host, &host_group, TaskStatus::Skipped, 0, clock)
                } else {
                    let status = self.status();
                    let duration_ms = self.duration_ms(status);
                    self.task_event_with(&host, &host_group, status, duration_ms, clock)
                };
                clock += Duration::milliseconds(event.duration_ms as i64 + 150);
                let unreachable = event.status == TaskStatus::Unreachable;
                events.push(event);
                if unreachable {
                    break;
                }
            }
        }

        events.sort_by_key(|event| event.created_at);
        Playbook {
            instance_id,
            started_at,
            events,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn task_event_with(
        &mut self,
        host: &str,
        host_group: &str,
        status: TaskStatus,
        duration_ms: u64,
        created_at: OffsetDateTime,
    ) -> TaskEvent {
        let message = match status {
            TaskStatus::Failed | TaskStatus::Unreachable => {
                Some(self.pick(&FAILURE_MESSAGES).to_owned())
            }
            _ => None,
        };
        TaskEvent {
            host: host.to_owned(),
            host_group: host_group.to_owned(),
            task: self.pick(&TASK_NAMES).to_owned(),
            status,
            duration_ms,
            created_at,
            message,
        }
    }

    fn status(&mut self) -> TaskStatus {
        match self.int_n(100) {
            0..=54 => TaskStatus::Ok,
            55..=79 => TaskStatus::Changed,
            80..=91 => TaskStatus::Skipped,
            92..=97 => TaskStatus::Failed,
            _ => TaskStatus::Unreachable,
        }
    }

    fn duration_ms(&mut self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Skipped => self.int_n(40) as u64,
            TaskStatus::Unreachable => 10_000 + self.int_n(20_000) as u64,
            _ => 80 + self.int_n(45_000) as u64,
        }
    }

    fn started_at(&mut self) -> OffsetDateTime {
        let day = 1 + self.int_n(28) as u8;
        let month = Month::try_from(1 + self.int_n(12) as u8).unwrap_or(Month::January);
        midnight_utc(REFERENCE_YEAR, month, day)
            + Duration::seconds(self.int_n(86_400) as i64)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("hostdeck.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn host_groups() -> Vec<&'static str> {
    HOST_GROUPS.iter().map(|(group, _)| *group).collect()
}

pub fn task_names() -> &'static [&'static str] {
    &TASK_NAMES
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).unwrap_or(Date::MIN);
    date.with_time(Time::MIDNIGHT).assume_utc()
}

#[cfg(test)]
mod tests {
    use super::{HostFaker, host_groups, task_names};
    use hostdeck_app::TaskStatus;
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = HostFaker::new(42);
        let mut right = HostFaker::new(42);

        assert_eq!(left.instance_id(), right.instance_id());
        let left_run = left.playbook(3);
        let right_run = right.playbook(3);
        assert_eq!(left_run.events.len(), right_run.events.len());
        assert_eq!(left_run.events[0].host, right_run.events[0].host);
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(HostFaker::new(0).seed(), 1);
    }

    #[test]
    fn instance_id_looks_like_a_uuid() {
        let mut faker = HostFaker::new(7);
        let id = faker.instance_id();
        let parts = id.split('-').map(str::len).collect::<Vec<_>>();
        assert_eq!(parts, vec![8, 4, 4, 4, 12]);
        assert_eq!(id.chars().nth(14), Some('4'));
    }

    #[test]
    fn inventory_covers_every_group_and_shares_some_hosts() {
        let mut faker = HostFaker::new(3);
        let inventory = faker.inventory(4);

        let groups = inventory
            .iter()
            .map(|(_, group)| group.as_str())
            .collect::<BTreeSet<_>>();
        assert_eq!(groups, host_groups().into_iter().collect());

        let hosts_in_two_groups = inventory
            .iter()
            .filter(|(host, _)| inventory.iter().filter(|(other, _)| other == host).count() > 1)
            .count();
        assert_eq!(hosts_in_two_groups, 4);
    }

    #[test]
    fn playbook_events_are_time_ordered_and_stop_after_unreachable() {
        let mut faker = HostFaker::new(11);
        let playbook = faker.playbook(5);

        assert!(
            playbook
                .events
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at)
        );
        let mut unreachable = BTreeSet::new();
        for event in &playbook.events {
            let key = (event.host.as_str(), event.host_group.as_str());
            assert!(
                !unreachable.contains(&key),
                "{key:?} has an event after going unreachable"
            );
            if event.status == TaskStatus::Unreachable {
                unreachable.insert(key);
            }
            assert!(task_names().contains(&event.task.as_str()));
            if matches!(event.status, TaskStatus::Failed | TaskStatus::Unreachable) {
                assert!(event.message.is_some());
            }
        }
    }

    #[test]
    fn some_seed_produces_unmeasured_hosts() {
        let found = (1_u64..50).any(|seed| {
            let playbook = HostFaker::new(seed).playbook(4);
            let mut totals = std::collections::BTreeMap::<(String, String), u64>::new();
            for event in &playbook.events {
                *totals
                    .entry((event.host.clone(), event.host_group.clone()))
                    .or_default() += event.duration_ms;
            }
            totals.values().any(|total| *total == 0)
        });
        assert!(found);
    }
}
