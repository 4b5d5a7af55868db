//! Partitioned-goal task: caring for a sick child.
//!
//! The goal is six sub-tasks spread over six fixed places. The two
//! coordination modes differ in who learns what:
//!
//! - **baseline**: everyone receives the identical, complete plan with all
//!   preconditions
//! - **centralized**: the plan is split into an acquisition chain (card,
//!   medicine, soup) and a support chain (blanket, harp, bedside comfort);
//!   each recipient only hears about its own chain
//!
//! Role assignment: the primary participant (if present, else the first
//! one) takes acquisition; every other participant takes support.

use crate::error::TaskError;
use crate::mode::CollabMode;
use crate::report::{InjectionEntry, InjectionReport};
use crate::writer::{append_reminder, write_thought};

use chrono::Duration;
use serde::Serialize;
use tracing::{info, warn};
use ville_env::{Address, ConceptTiming, Event, VilleClock, VilleWorld};

/// Poignancy floor of the complete plan in baseline mode.
pub const RESCUE_BASELINE_POIGNANCY: u32 = 8;

/// Participant that takes the acquisition chain when present.
pub const DEFAULT_PRIMARY: &str = "简";

/// The task thoughts stay relevant for one day after the simulation starts.
const EXPIRY_DAYS: i64 = 1;

const MIN_PARTICIPANTS: usize = 2;

pub(crate) const TASK_NAME: &str = "eddie_rescue";

/// The six fixed places of the scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueScenario {
    /// Where everything has to end up
    pub bedside: Address,
    pub insurance_card: Address,
    pub pharmacy_shelf: Address,
    pub kitchen: Address,
    pub blanket: Address,
    pub harp: Address,
}

impl Default for RescueScenario {
    fn default() -> Self {
        let place = |parts: [&str; 3]| Address::new(parts).expect("scenario places are non-empty");
        Self {
            bedside: place(["林氏家族的房子", "埃迪的卧室", "床"]),
            insurance_card: place(["林氏家族的房子", "公共休息室", "公共休息室桌子"]),
            pharmacy_shelf: place(["柳树市场和药店", "商店", "药店货架"]),
            kitchen: place(["塔玛拉和卡门的家", "厨房", "烹饪区"]),
            blanket: place(["亚当的家", "主人房", "床"]),
            harp: place(["莫雷诺家族的房子", "公共休息室", "竖琴"]),
        }
    }
}

impl RescueScenario {
    /// Place where `step` is carried out.
    pub fn place(&self, step: RescueStep) -> &Address {
        match step {
            RescueStep::InsuranceCard => &self.insurance_card,
            RescueStep::Medicine => &self.pharmacy_shelf,
            RescueStep::Soup => &self.kitchen,
            RescueStep::Blanket => &self.blanket,
            RescueStep::Harp => &self.harp,
            RescueStep::BedsideComfort => &self.bedside,
        }
    }

    fn at(&self, step: RescueStep) -> String {
        self.place(step).joined("，")
    }
}

/// One sub-task of the rescue, in plan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RescueStep {
    InsuranceCard,
    Medicine,
    Soup,
    Blanket,
    Harp,
    BedsideComfort,
}

impl RescueStep {
    /// All sub-tasks in plan order.
    pub fn all() -> [RescueStep; 6] {
        [
            RescueStep::InsuranceCard,
            RescueStep::Medicine,
            RescueStep::Soup,
            RescueStep::Blanket,
            RescueStep::Harp,
            RescueStep::BedsideComfort,
        ]
    }

    /// Role that owns this sub-task in centralized mode.
    pub fn role(&self) -> RescueRole {
        match self {
            RescueStep::InsuranceCard | RescueStep::Medicine | RescueStep::Soup => RescueRole::Acquisition,
            RescueStep::Blanket | RescueStep::Harp | RescueStep::BedsideComfort => RescueRole::Support,
        }
    }

    /// Wording in the complete plan, preconditions spelled out.
    fn full_instruction(&self, scenario: &RescueScenario) -> String {
        let here = scenario.at(*self);
        match self {
            RescueStep::InsuranceCard => format!("先去 {} 找到医保卡，之后买药才可以报销。", here),
            RescueStep::Medicine => format!(
                "带着医保卡，去 {} 购买适合儿童的感冒药，并顺便买煮一碗热汤需要的食材。",
                here
            ),
            RescueStep::Soup => format!("拿着食材，去 {} 煮一锅热汤。", here),
            RescueStep::Blanket => format!("去 {} 取一条备用的暖和毯子。", here),
            RescueStep::Harp => format!("去 {} 把竖琴带走，准备在孩子床边小声演奏安抚他。", here),
            RescueStep::BedsideComfort => format!(
                "最后，把感冒药、热汤、毯子和竖琴一起带到 {}，陪埃迪说几句话，让他安心休息。",
                here
            ),
        }
    }

    /// Wording in a role assignment.
    fn role_instruction(&self, scenario: &RescueScenario) -> String {
        let here = scenario.at(*self);
        match self {
            RescueStep::InsuranceCard => format!("先去 {} 找到医保卡。", here),
            RescueStep::Medicine => format!(
                "带着医保卡，去 {} 购买合适的感冒药，并买一份可以煮成热汤的食材。",
                here
            ),
            RescueStep::Soup => format!(
                "带着食材，去 {} 煮一锅热汤，然后把热汤和感冒药送到 {}，放在埃迪的床边，并安慰他一下。",
                here,
                scenario.at(RescueStep::BedsideComfort)
            ),
            RescueStep::Blanket => format!("去 {} 取一条暖和的备用毯子。", here),
            RescueStep::Harp => format!("去 {} 把竖琴带走，准备放在孩子床边演奏安抚他。", here),
            RescueStep::BedsideComfort => format!("把毯子和竖琴一起带到 {}，放在床边，并陪他待一会。", here),
        }
    }
}

/// Role in the centralized split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RescueRole {
    /// Insurance card, medicine and soup
    Acquisition,

    /// Blanket, harp and staying at the bedside
    Support,
}

impl RescueRole {
    pub fn name(&self) -> &'static str {
        match self {
            RescueRole::Acquisition => "acquisition",
            RescueRole::Support => "support",
        }
    }

    /// Sub-tasks owned by this role, in plan order.
    pub fn steps(&self) -> Vec<RescueStep> {
        RescueStep::all().into_iter().filter(|s| s.role() == *self).collect()
    }

    /// Poignancy floor of the role thought.
    pub fn poignancy(&self) -> u32 {
        match self {
            RescueRole::Acquisition => 7,
            RescueRole::Support => 8,
        }
    }

    fn object(&self) -> &'static str {
        match self {
            RescueRole::Acquisition => "为埃迪准备药物和热汤",
            RescueRole::Support => "为埃迪准备毯子和竖琴",
        }
    }

    fn describe(&self, name: &str, scenario: &RescueScenario) -> String {
        let (share, closing) = match self {
            RescueRole::Acquisition => (
                "你负责照顾任务中的一部分。\n",
                "其它物品（毯子、竖琴）会交给其他人负责，你不需要操心。",
            ),
            RescueRole::Support => (
                "你负责照顾任务中的另一部分。\n\n",
                "药物和热汤将由其他人准备，你只需要专注完成自己的部分。",
            ),
        };
        format!(
            "镇上的中央协调者告诉 {}：林氏家族的孩子埃迪生病了，{}你的具体任务是：\n{}\n{}",
            name,
            share,
            numbered(self.steps().iter().map(|s| s.role_instruction(scenario))),
            closing
        )
    }

    fn reminder(&self) -> &'static str {
        match self {
            RescueRole::Acquisition => {
                "\n今天镇上发生了一件紧急的事情：林氏家族的孩子埃迪生病了，\
                 中央只交给你负责医保卡、买药和煮汤的部分任务。\
                 请在不完全打乱日常生活的前提下优先完成。"
            }
            RescueRole::Support => {
                "\n今天镇上发生了一件紧急的事情：林氏家族的孩子埃迪生病了，\
                 中央只交给你准备毯子和竖琴的部分任务。\
                 请优先完成准备毯子和竖琴部分任务，日常任务可以暂时取消。"
            }
        }
    }
}

/// `1）...\n2）...\n` numbering.
fn numbered(lines: impl Iterator<Item = String>) -> String {
    lines
        .enumerate()
        .map(|(i, line)| format!("{}）{}\n", i + 1, line))
        .collect()
}

/// The rescue task.
#[derive(Debug, Clone)]
pub struct RescueTask {
    primary: String,
    scenario: RescueScenario,
}

impl Default for RescueTask {
    fn default() -> Self {
        Self::new()
    }
}

impl RescueTask {
    /// Creates the task with the default scenario and primary participant.
    pub fn new() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_string(),
            scenario: RescueScenario::default(),
        }
    }

    /// Sets the participant preferred for the acquisition chain.
    pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = primary.into();
        self
    }

    /// Sets the scenario places.
    pub fn with_scenario(mut self, scenario: RescueScenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn scenario(&self) -> &RescueScenario {
        &self.scenario
    }

    /// Assigns a role to each participant.
    ///
    /// A lone participant is given both roles.
    pub fn assign_roles(&self, participants: &[String]) -> Vec<(String, RescueRole)> {
        let Some(first) = participants.first() else {
            return Vec::new();
        };
        let primary = participants
            .iter()
            .find(|p| **p == self.primary)
            .unwrap_or(first);

        let mut roles = vec![(primary.clone(), RescueRole::Acquisition)];
        let others: Vec<&String> = participants.iter().filter(|p| *p != primary).collect();
        if others.is_empty() {
            roles.push((primary.clone(), RescueRole::Support));
        }
        roles.extend(others.into_iter().map(|p| (p.clone(), RescueRole::Support)));
        roles
    }

    /// Complete plan as every participant sees it in baseline mode.
    pub fn full_description(&self, name: &str) -> String {
        let bedside = self.scenario.bedside.joined("，");
        format!(
            "{} 得知：林氏家族的孩子埃迪突然发高烧，家里人都很慌张。\n\
             最终目标：在 {} 让埃迪的床边准备好感冒药、热汤、一条暖和的毯子和一件乐器（竖琴），让他安心休息。\n\n\
             要完成这个目标，需要按顺序完成以下子任务，并注意前置条件：\n{}",
            name,
            bedside,
            numbered(RescueStep::all().iter().map(|s| s.full_instruction(&self.scenario)))
        )
    }

    /// Injects the rescue into the participants.
    ///
    /// Needs at least two registered participants. The clock is read as the
    /// simulation start, since injection only happens before the first step.
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
        let registered = participants.iter().filter(|p| world.contains_agent(p)).count();
        if registered < MIN_PARTICIPANTS {
            return Err(TaskError::InsufficientParticipants {
                task: TASK_NAME,
                required: MIN_PARTICIPANTS,
                found: registered,
            });
        }

        info!("[TASK] setup Eddie-rescue task, mode={}, agents={:?}", mode, participants);

        let start = clock.now();
        let timing = ConceptTiming::new(start, start + Duration::days(EXPIRY_DAYS));
        let mut report = InjectionReport::new(TASK_NAME, mode);
        match mode {
            CollabMode::Baseline => self.inject_baseline(participants, world, timing, &mut report),
            CollabMode::Centralized => self.inject_centralized(participants, world, timing, &mut report),
        }
        Ok(report)
    }

    fn inject_baseline<W>(
        &self,
        participants: &[String],
        world: &mut W,
        timing: ConceptTiming,
        report: &mut InjectionReport,
    ) where
        W: VilleWorld + ?Sized,
    {
        for name in participants {
            let Some(agent) = world.agent_mut(name) else {
                warn!("[TASK] {} is not a registered agent, skipped", name);
                report.skipped.push(name.clone());
                continue;
            };

            let describe = self.full_description(name);
            let event = Event::new(
                name.as_str(),
                "承担任务",
                "照顾生病的埃迪",
                self.scenario.bedside.clone(),
                describe.clone(),
            );
            let thought = write_thought(agent, event, RESCUE_BASELINE_POIGNANCY, timing);
            report.entries.push(InjectionEntry::new(
                name,
                None,
                self.scenario.bedside.clone(),
                describe,
                thought,
            ));
        }
    }

    fn inject_centralized<W>(
        &self,
        participants: &[String],
        world: &mut W,
        timing: ConceptTiming,
        report: &mut InjectionReport,
    ) where
        W: VilleWorld + ?Sized,
    {
        for (name, role) in self.assign_roles(participants) {
            let Some(agent) = world.agent_mut(&name) else {
                warn!("[TASK] {} role recipient {} is not registered, skipped", role.name(), name);
                report.skipped.push(name);
                continue;
            };

            let describe = role.describe(&name, &self.scenario);
            let event = Event::new(
                name.as_str(),
                "承担任务",
                role.object(),
                self.scenario.bedside.clone(),
                describe.clone(),
            );
            let thought = write_thought(agent, event, role.poignancy(), timing);
            let appended = append_reminder(agent, role.reminder());

            let mut entry = InjectionEntry::new(
                &name,
                Some(role.name()),
                self.scenario.bedside.clone(),
                describe,
                thought,
            );
            entry.reminder_appended = appended;
            report.entries.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, FakeAgent, FakeClock, FakeWorld};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn world_of(list: &[&str]) -> FakeWorld {
        FakeWorld::with(list.iter().map(|n| FakeAgent::full(n)).collect())
    }

    #[test]
    fn test_baseline_identical_complete_plan() {
        let task = RescueTask::new();
        let mut world = world_of(&["简", "汤姆"]);
        let clock = FakeClock::at("20240213-09:30");

        let report = task
            .setup(CollabMode::Baseline, &names(&["简", "汤姆"]), &mut world, &clock)
            .unwrap();
        assert_eq!(report.written_count(), 2);

        let jane = world.get("简").thoughts()[0].clone();
        let tom = world.get("汤姆").thoughts()[0].clone();
        assert_eq!(jane.poignancy, RESCUE_BASELINE_POIGNANCY);
        assert_eq!(jane.event.address(), &task.scenario().bedside);
        assert_eq!(jane.expire, Some(at("20240214-09:30")));
        assert_eq!(
            jane.event.describe().replacen("简", "", 1),
            tom.event.describe().replacen("汤姆", "", 1)
        );
        for step in RescueStep::all() {
            let here = task.scenario().place(step).joined("，");
            assert!(jane.event.describe().contains(&here), "missing {:?}", step);
        }
        assert!(jane.event.describe().contains("6）"));
        assert_eq!(world.get("简").currently(), Some("简 正在过普通的一天"));
    }

    #[test]
    fn test_centralized_two_participants_partition() {
        let task = RescueTask::new();
        let mut world = world_of(&["简", "汤姆"]);
        let clock = FakeClock::at("20240213-09:30");

        let report = task
            .setup(CollabMode::Centralized, &names(&["汤姆", "简"]), &mut world, &clock)
            .unwrap();

        let jane = report.entry("简").unwrap();
        let tom = report.entry("汤姆").unwrap();
        assert_eq!(jane.role, Some("acquisition"));
        assert_eq!(tom.role, Some("support"));
        assert_eq!(world.get("简").thoughts()[0].poignancy, 7);
        assert_eq!(world.get("汤姆").thoughts()[0].poignancy, 8);

        let scenario = task.scenario();
        for step in RescueRole::Support.steps() {
            if step != RescueStep::BedsideComfort {
                assert!(!jane.describe.contains(&scenario.place(step).joined("，")));
            }
        }
        for step in RescueRole::Acquisition.steps() {
            assert!(!tom.describe.contains(&scenario.place(step).joined("，")));
        }

        assert!(world.get("简").currently().unwrap().contains("医保卡、买药和煮汤"));
        assert!(world.get("汤姆").currently().unwrap().contains("毯子和竖琴"));
        assert!(world.get("汤姆").currently().unwrap().starts_with("汤姆 正在过普通的一天"));
    }

    #[test]
    fn test_role_chains_cover_all_steps_once() {
        let acquisition: BTreeSet<_> = RescueRole::Acquisition.steps().into_iter().collect();
        let support: BTreeSet<_> = RescueRole::Support.steps().into_iter().collect();
        assert!(acquisition.is_disjoint(&support));

        let union: Vec<_> = acquisition.union(&support).copied().collect();
        assert_eq!(union, RescueStep::all().to_vec());
    }

    #[test]
    fn test_primary_absent_first_participant_leads() {
        let task = RescueTask::new();
        let roles = task.assign_roles(&names(&["汤姆", "埃迪"]));
        assert_eq!(
            roles,
            vec![
                ("汤姆".to_string(), RescueRole::Acquisition),
                ("埃迪".to_string(), RescueRole::Support),
            ]
        );
    }

    #[test]
    fn test_three_participants_share_support() {
        let task = RescueTask::new();
        let roles = task.assign_roles(&names(&["汤姆", "埃迪", "简"]));
        assert_eq!(roles[0], ("简".to_string(), RescueRole::Acquisition));
        assert_eq!(roles.len(), 3);
        assert!(roles[1..].iter().all(|(_, r)| *r == RescueRole::Support));
    }

    #[test]
    fn test_custom_primary() {
        let task = RescueTask::new().with_primary("汤姆");
        let roles = task.assign_roles(&names(&["简", "汤姆"]));
        assert_eq!(roles[0], ("汤姆".to_string(), RescueRole::Acquisition));
    }

    #[test]
    fn test_unregistered_recipient_skipped() {
        let task = RescueTask::new();
        let mut world = world_of(&["简", "汤姆"]);
        let clock = FakeClock::at("20240213-09:30");

        let report = task
            .setup(CollabMode::Centralized, &names(&["简", "幽灵", "汤姆"]), &mut world, &clock)
            .unwrap();

        assert_eq!(report.skipped, vec!["幽灵".to_string()]);
        assert_eq!(report.written_count(), 2);
        assert_eq!(world.get("汤姆").thoughts().len(), 1);
    }

    #[test]
    fn test_insufficient_participants() {
        let task = RescueTask::new();
        let mut world = world_of(&["简"]);
        let clock = FakeClock::at("20240213-09:30");

        let err = task
            .setup(CollabMode::Baseline, &names(&["简", "汤姆"]), &mut world, &clock)
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::InsufficientParticipants { required: 2, found: 1, .. }
        ));
        assert!(world.get("简").thoughts().is_empty());
    }

    #[test]
    fn test_partial_agent_still_gets_thought() {
        let task = RescueTask::new();
        let mut world = FakeWorld::with(vec![
            FakeAgent::full("简").without_scratch(),
            FakeAgent::full("汤姆").with_legacy_memory(),
        ]);
        let clock = FakeClock::at("20240213-09:30");

        let report = task
            .setup(CollabMode::Centralized, &names(&["简", "汤姆"]), &mut world, &clock)
            .unwrap();

        let jane = report.entry("简").unwrap();
        assert!(jane.thought.is_written());
        assert!(!jane.reminder_appended);
        assert!(report.entry("汤姆").unwrap().reminder_appended);
        assert_eq!(world.get("汤姆").thoughts()[0].create, None);
    }

    proptest! {
        #[test]
        fn prop_two_participants_get_disjoint_roles(swap in any::<bool>(), with_primary in any::<bool>()) {
            let first = if with_primary { DEFAULT_PRIMARY } else { "卡门" };
            let mut participants = names(&[first, "汤姆"]);
            if swap {
                participants.reverse();
            }

            let roles = RescueTask::new().assign_roles(&participants);
            prop_assert_eq!(roles.len(), 2);
            prop_assert_ne!(&roles[0].0, &roles[1].0);
            prop_assert_eq!(roles[0].1, RescueRole::Acquisition);
            prop_assert_eq!(roles[1].1, RescueRole::Support);
            if with_primary {
                prop_assert_eq!(roles[0].0.as_str(), DEFAULT_PRIMARY);
            } else {
                prop_assert_eq!(&roles[0].0, &participants[0]);
            }
        }
    }
}
