//! Shared-goal task: a meeting every participant knows about.
//!
//! - **baseline**: each participant independently remembers the plan as a
//!   thought naming the time, the other participants, the place and the
//!   topic.
//! - **centralized**: baseline for everyone first, then a mandatory reminder
//!   appended to each participant's `currently` and the agent-level urgency
//!   raised to at least [`MEETING_URGENCY`].

use crate::error::TaskError;
use crate::mode::CollabMode;
use crate::report::{InjectionEntry, InjectionReport};
use crate::resolver::resolve_address;
use crate::writer::{append_reminder, elevate_urgency, write_thought};

use chrono::{Duration, NaiveDateTime};
use tracing::{info, warn};
use ville_env::{parse_stamp, ConceptTiming, Event, VilleClock, VilleWorld};

/// Poignancy floor of the meeting thought, in both modes.
pub const MEETING_POIGNANCY: u32 = 7;

/// Agent-level urgency floor applied in centralized mode.
pub const MEETING_URGENCY: u32 = 8;

/// The thought stays relevant until two days after the meeting.
const EXPIRY_DAYS: i64 = 2;

/// Peer phrase in the thought when the agent meets alone.
const ALONE_IN_THOUGHT: &str = "自己";

/// Peer phrase in the reminder when the agent meets alone.
const ALONE_IN_REMINDER: &str = "其他人";

pub(crate) const TASK_NAME: &str = "meeting";

/// A meeting at a fixed simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingTask {
    when: NaiveDateTime,
    topic: String,
    place_keyword: Option<String>,
}

impl MeetingTask {
    /// Creates a meeting task.
    ///
    /// # Arguments
    /// * `when` - Simulated meeting time
    /// * `topic` - What the meeting is about
    /// * `place_keyword` - Place looked up in each agent's spatial memory;
    ///   each agent's current tile is used if absent or unknown
    pub fn new(when: NaiveDateTime, topic: impl Into<String>, place_keyword: Option<String>) -> Self {
        Self {
            when,
            topic: topic.into(),
            place_keyword,
        }
    }

    /// Creates a meeting task from a `YYYYMMDD-HH:MM` time.
    pub fn parse(when: &str, topic: impl Into<String>, place_keyword: Option<String>) -> Result<Self, TaskError> {
        let when = parse_stamp(when).map_err(|e| TaskError::invalid(format!("meeting time: {}", e)))?;
        Ok(Self::new(when, topic, place_keyword))
    }

    pub fn when(&self) -> NaiveDateTime {
        self.when
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn place_keyword(&self) -> Option<&str> {
        self.place_keyword.as_deref()
    }

    /// Injects the meeting into every participant.
    pub fn setup<W>(
        &self,
        mode: CollabMode,
        participants: &[String],
        world: &mut W,
        clock: &dyn VilleClock,
    ) -> Result<InjectionReport, TaskError>
    where
        W: VilleWorld + ?Sized,
    {
        if participants.is_empty() {
            return Err(TaskError::NoParticipants(TASK_NAME));
        }

        info!(
            "[MEETING] mode={}, agents={:?}, when={}, place={:?}, topic={}",
            mode,
            participants,
            self.when.format("%Y%m%d-%H:%M"),
            self.place_keyword,
            self.topic
        );

        let mut report = InjectionReport::new(TASK_NAME, mode);
        self.inject_baseline(participants, world, clock.now(), &mut report);
        if mode == CollabMode::Centralized {
            self.inject_centralized(participants, world, &mut report);
        }
        Ok(report)
    }

    fn inject_baseline<W>(
        &self,
        participants: &[String],
        world: &mut W,
        now: NaiveDateTime,
        report: &mut InjectionReport,
    ) where
        W: VilleWorld + ?Sized,
    {
        let timing = ConceptTiming::new(now, self.when + Duration::days(EXPIRY_DAYS));

        for name in participants {
            let Some(agent) = world.agent_mut(name) else {
                warn!("[MEETING] {} is not a registered agent, skipped", name);
                report.skipped.push(name.clone());
                continue;
            };

            let address = resolve_address(&*agent, self.place_keyword());
            let peers = peer_phrase(participants, name, ALONE_IN_THOUGHT);
            let describe = format!(
                "{} 计划在 {} 和 {} 在 {} 开会，讨论 {}。",
                name,
                self.when.format("%m月%d日 %H:%M"),
                peers,
                address.leaf(),
                self.topic
            );

            let event = Event::new(name.as_str(), "计划", "开会", address.clone(), describe.clone());
            let thought = write_thought(agent, event, MEETING_POIGNANCY, timing);
            report.entries.push(InjectionEntry::new(name, None, address, describe, thought));
        }
    }

    fn inject_centralized<W>(&self, participants: &[String], world: &mut W, report: &mut InjectionReport)
    where
        W: VilleWorld + ?Sized,
    {
        for name in participants {
            let Some(agent) = world.agent_mut(name) else {
                continue;
            };

            let address = resolve_address(&*agent, self.place_keyword());
            let peers = peer_phrase(participants, name, ALONE_IN_REMINDER);
            let reminder = format!(
                "\n今天有一件非常重要的事情：{} 必须在 {} {} 和 {} 在 {} 开会，讨论 {}。\
                 请优先安排这个会议，即使需要调整日常计划。",
                name,
                self.when.format("%m月%d日"),
                self.when.format("%H:%M"),
                peers,
                address.leaf(),
                self.topic
            );

            let appended = append_reminder(agent, &reminder);
            let raised = elevate_urgency(agent, MEETING_URGENCY);
            if let Some(entry) = report.entry_mut(name) {
                entry.reminder_appended = appended;
                entry.urgency_raised = raised;
            }
        }
    }
}

/// Everyone except `name`, joined with `、`, or `alone` if nobody else.
fn peer_phrase(participants: &[String], name: &str, alone: &str) -> String {
    let peers: Vec<&str> = participants
        .iter()
        .map(String::as_str)
        .filter(|p| *p != name)
        .collect();
    if peers.is_empty() {
        alone.to_string()
    } else {
        peers.join("、")
    }
}
