//! Tagged task variants with a single injection entry point.

use crate::error::TaskError;
use crate::meeting::MeetingTask;
use crate::mode::CollabMode;
use crate::report::InjectionReport;
use crate::rescue::RescueTask;

use ville_env::{VilleClock, VilleWorld};

/// A coordination task injected once, before the first simulation step.
#[derive(Debug, Clone)]
pub enum Task {
    /// Shared goal: every participant learns the same meeting plan
    Meeting(MeetingTask),

    /// Partitioned goal: the rescue plan, optionally split by role
    Rescue(RescueTask),
}

impl Task {
    /// Returns the task name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Task::Meeting(_) => crate::meeting::TASK_NAME,
            Task::Rescue(_) => crate::rescue::TASK_NAME,
        }
    }

    /// Injects the task into the participants' memory and working state.
    ///
    /// Duplicate participant names are injected once. Side effects land on
    /// the agents; the task itself keeps no state.
    pub fn inject<W>(
        &self,
        mode: CollabMode,
        participants: &[String],
        world: &mut W,
        clock: &dyn VilleClock,
    ) -> Result<InjectionReport, TaskError>
    where
        W: VilleWorld + ?Sized,
    {
        let participants = distinct(participants);
        match self {
            Task::Meeting(task) => task.setup(mode, &participants, world, clock),
            Task::Rescue(task) => task.setup(mode, &participants, world, clock),
        }
    }
}

impl From<MeetingTask> for Task {
    fn from(task: MeetingTask) -> Self {
        Task::Meeting(task)
    }
}

impl From<RescueTask> for Task {
    fn from(task: RescueTask) -> Self {
        Task::Rescue(task)
    }
}

/// Drops repeated names, keeping first occurrences in order.
fn distinct(participants: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    participants
        .iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAgent, FakeClock, FakeWorld};

    #[test]
    fn test_duplicate_participants_injected_once() {
        let mut world = FakeWorld::with(vec![FakeAgent::full("简"), FakeAgent::full("汤姆")]);
        let clock = FakeClock::at("20250213-09:30");
        let task: Task = MeetingTask::parse("20250213-11:00", "讨论新项目", None).unwrap().into();

        let participants = vec!["简".to_string(), "汤姆".to_string(), "简".to_string()];
        let report = task
            .inject(CollabMode::Baseline, &participants, &mut world, &clock)
            .unwrap();

        assert_eq!(report.task, "meeting");
        assert_eq!(report.entries.len(), 2);
        assert_eq!(world.get("简").thoughts().len(), 1);
        assert!(!world.get("简").thoughts()[0].event.describe().contains("和 简、"));
    }

    #[test]
    fn test_rescue_variant_dispatch() {
        let mut world = FakeWorld::with(vec![FakeAgent::full("简"), FakeAgent::full("汤姆")]);
        let clock = FakeClock::at("20240213-09:30");
        let task = Task::from(RescueTask::new());

        let participants = vec!["简".to_string(), "汤姆".to_string()];
        let report = task
            .inject(CollabMode::Centralized, &participants, &mut world, &clock)
            .unwrap();

        assert_eq!(task.name(), "eddie_rescue");
        assert_eq!(report.mode, CollabMode::Centralized);
        assert_eq!(report.written_count(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let mut world = FakeWorld::with(vec![FakeAgent::full("简")]);
        let clock = FakeClock::at("20250213-09:30");
        let task: Task = MeetingTask::parse("20250213-11:00", "X", None).unwrap().into();

        let report = task
            .inject(CollabMode::Centralized, &["简".to_string()], &mut world, &clock)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["task"], "meeting");
        assert_eq!(json["mode"], "centralized");
        assert_eq!(json["entries"][0]["thought"]["outcome"], "recorded");
        assert_eq!(json["entries"][0]["thought"]["poignancy"], 7);
    }
}
