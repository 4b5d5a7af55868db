//! In-memory collaborators with switchable capabilities, for tests.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::collections::BTreeMap;
use ville_env::{
    parse_stamp, Address, AgentStatus, ConceptId, ConceptKind, ConceptMemory, ConceptNode,
    ConceptTiming, Conversation, EnvError, Event, RuntimeStatus, Scratch, SpatialMemory,
    ThinkOutput, UrgencyCarrier, VilleAgent, VilleClock, VilleWorld,
};

pub fn at(stamp: &str) -> NaiveDateTime {
    parse_stamp(stamp).unwrap()
}

pub struct FakePlaces(BTreeMap<String, Address>);

impl SpatialMemory for FakePlaces {
    fn find_address(&self, keyword: &str) -> Option<Address> {
        self.0.get(keyword).cloned()
    }
}

pub struct FakeMemory {
    nodes: Vec<ConceptNode>,
    legacy: bool,
    failing: bool,
    handles: bool,
    initial_poignancy: u32,
}

impl ConceptMemory for FakeMemory {
    fn add_concept(
        &mut self,
        kind: ConceptKind,
        event: Event,
        timing: Option<ConceptTiming>,
    ) -> Result<Option<ConceptId>, EnvError> {
        if self.failing {
            return Err(EnvError::memory("store offline"));
        }
        if self.legacy && timing.is_some() {
            return Err(EnvError::TimingUnsupported);
        }
        let node = ConceptNode::new(kind, event, timing.unwrap_or_default(), self.initial_poignancy);
        self.nodes.push(node);
        Ok(self.handles.then(|| ConceptId(self.nodes.len() - 1)))
    }

    fn concept_mut(&mut self, id: ConceptId) -> Option<&mut ConceptNode> {
        self.nodes.get_mut(id.0)
    }
}

pub enum FakeStatus {
    Fields(RuntimeStatus),
    Mapping(Map<String, Value>),
}

pub struct FakeAgent {
    name: String,
    tile: Address,
    places: Option<FakePlaces>,
    memory: Option<FakeMemory>,
    scratch: Option<Scratch>,
    status: Option<FakeStatus>,
}

impl FakeAgent {
    /// Agent with every capability and an empty place index.
    pub fn full(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tile: Address::new(["小镇".to_string(), format!("{}的家", name), "客厅".to_string()]).unwrap(),
            places: Some(FakePlaces(BTreeMap::new())),
            memory: Some(FakeMemory {
                nodes: Vec::new(),
                legacy: false,
                failing: false,
                handles: true,
                initial_poignancy: 1,
            }),
            scratch: Some(Scratch {
                currently: format!("{} 正在过普通的一天", name),
            }),
            status: Some(FakeStatus::Fields(RuntimeStatus { poignancy: 2 })),
        }
    }

    /// Agent with nothing but a name and a tile.
    pub fn bare(name: &str) -> Self {
        Self {
            places: None,
            memory: None,
            scratch: None,
            status: None,
            ..Self::full(name)
        }
    }

    pub fn with_place(mut self, keyword: &str, parts: &[&str]) -> Self {
        let address = Address::new(parts.iter().copied()).unwrap();
        self.places
            .get_or_insert_with(|| FakePlaces(BTreeMap::new()))
            .0
            .insert(keyword.to_string(), address);
        self
    }

    fn memory_settings(&mut self) -> &mut FakeMemory {
        self.memory.as_mut().expect("agent has no memory")
    }

    pub fn with_legacy_memory(mut self) -> Self {
        self.memory_settings().legacy = true;
        self
    }

    pub fn with_failing_memory(mut self) -> Self {
        self.memory_settings().failing = true;
        self
    }

    pub fn without_handles(mut self) -> Self {
        self.memory_settings().handles = false;
        self
    }

    pub fn with_initial_poignancy(mut self, poignancy: u32) -> Self {
        self.memory_settings().initial_poignancy = poignancy;
        self
    }

    pub fn with_currently(mut self, text: &str) -> Self {
        self.scratch = Some(Scratch {
            currently: text.to_string(),
        });
        self
    }

    pub fn without_scratch(mut self) -> Self {
        self.scratch = None;
        self
    }

    pub fn with_status_poignancy(mut self, poignancy: u32) -> Self {
        self.status = Some(FakeStatus::Fields(RuntimeStatus { poignancy }));
        self
    }

    pub fn with_map_status(mut self, poignancy: Option<Value>) -> Self {
        let mut map = Map::new();
        if let Some(p) = poignancy {
            map.insert("poignancy".into(), p);
        }
        self.status = Some(FakeStatus::Mapping(map));
        self
    }

    pub fn without_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn thoughts(&self) -> &[ConceptNode] {
        self.memory.as_ref().map(|m| m.nodes.as_slice()).unwrap_or(&[])
    }

    pub fn currently(&self) -> Option<&str> {
        self.scratch.as_ref().map(|s| s.currently.as_str())
    }

    pub fn status_poignancy(&self) -> Option<u32> {
        match self.status.as_ref()? {
            FakeStatus::Fields(status) => Some(status.poignancy),
            FakeStatus::Mapping(map) => map.poignancy().map(|p| p as u32),
        }
    }

    /// Raw `poignancy` entry of a map-carried status.
    pub fn map_status_value(&self) -> Option<&Value> {
        match self.status.as_ref()? {
            FakeStatus::Fields(_) => None,
            FakeStatus::Mapping(map) => map.get("poignancy"),
        }
    }
}

impl VilleAgent for FakeAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn tile_address(&self) -> Address {
        self.tile.clone()
    }

    fn spatial(&self) -> Option<&dyn SpatialMemory> {
        self.places.as_ref().map(|p| p as &dyn SpatialMemory)
    }

    fn memory_mut(&mut self) -> Option<&mut dyn ConceptMemory> {
        self.memory.as_mut().map(|m| m as &mut dyn ConceptMemory)
    }

    fn scratch_mut(&mut self) -> Option<&mut Scratch> {
        self.scratch.as_mut()
    }

    fn status_mut(&mut self) -> Option<&mut dyn UrgencyCarrier> {
        match self.status.as_mut()? {
            FakeStatus::Fields(status) => Some(status as &mut dyn UrgencyCarrier),
            FakeStatus::Mapping(map) => Some(map as &mut dyn UrgencyCarrier),
        }
    }

    fn to_dict(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.clone()));
        map
    }
}

#[derive(Default)]
pub struct FakeWorld {
    agents: BTreeMap<String, FakeAgent>,
    conversation: Conversation,
}

impl FakeWorld {
    pub fn with(agents: Vec<FakeAgent>) -> Self {
        Self {
            agents: agents.into_iter().map(|a| (a.name.clone(), a)).collect(),
            conversation: Conversation::new(),
        }
    }

    pub fn get(&self, name: &str) -> &FakeAgent {
        &self.agents[name]
    }
}

impl VilleWorld for FakeWorld {
    fn agent_names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    fn contains_agent(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    fn agent(&self, name: &str) -> Option<&dyn VilleAgent> {
        self.agents.get(name).map(|a| a as &dyn VilleAgent)
    }

    fn agent_mut(&mut self, name: &str) -> Option<&mut dyn VilleAgent> {
        self.agents.get_mut(name).map(|a| a as &mut dyn VilleAgent)
    }

    fn agent_think(&mut self, _name: &str, _status: &AgentStatus) -> Result<ThinkOutput, EnvError> {
        Ok(ThinkOutput::default())
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

pub struct FakeClock(Cell<NaiveDateTime>);

impl FakeClock {
    pub fn at(stamp: &str) -> Self {
        Self(Cell::new(at(stamp)))
    }
}

impl VilleClock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }

    fn forward(&self, minutes: i64) {
        self.0.set(self.0.get() + chrono::Duration::minutes(minutes));
    }
}
