//! ScriptedWorld - an in-process stand-in for the language-model world.
//!
//! Agents take seeded random walks on the tile grid and exchange a greeting
//! whenever two of them end a step on the same tile. Everything an agent
//! owns (memory records, `currently`, urgency) round-trips through its
//! checkpoint entry, so a resumed run sees what the previous run injected.

use crate::config::SimulationConfig;
use crate::error::SimError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;
use ville_env::{
    Address, AgentStatus, ConceptId, ConceptKind, ConceptMemory, ConceptNode, ConceptTiming,
    Conversation, Coord, EnvError, Event, Plan, RuntimeStatus, Scratch, SpatialMemory,
    ThinkOutput, UrgencyCarrier, VilleAgent, VilleWorld,
};

/// Longest walk planned in one step.
const MAX_WALK: usize = 3;

/// Derives a per-agent seed from the master seed.
///
/// Adding or removing agents does not change the seeds of the others.
pub fn agent_seed(master_seed: u64, index: u64) -> u64 {
    master_seed
        .wrapping_mul(0x9e3779b97f4a7c15)
        .wrapping_add(index.wrapping_mul(0x517cc1b727220a95))
}

/// Keyword index of the town's places, shared by every agent.
#[derive(Debug, Clone, Default)]
pub struct PlaceIndex(BTreeMap<String, Address>);

impl PlaceIndex {
    /// Parses `{"keyword": ["world", "sector", "arena"], ...}`.
    pub fn from_value(value: &Value) -> Result<Self, SimError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_value(value.clone())
            .map_err(|e| SimError::config(format!("places: {}", e)))?;

        let mut places = BTreeMap::new();
        for (keyword, parts) in raw {
            let address =
                Address::new(parts).map_err(|e| SimError::config(format!("place '{}': {}", keyword, e)))?;
            places.insert(keyword, address);
        }
        Ok(Self(places))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SpatialMemory for PlaceIndex {
    fn find_address(&self, keyword: &str) -> Option<Address> {
        self.0.get(keyword).cloned()
    }
}

/// Append-only record store with index handles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMemory {
    nodes: Vec<ConceptNode>,
}

impl ScriptedMemory {
    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }
}

impl ConceptMemory for ScriptedMemory {
    fn add_concept(
        &mut self,
        kind: ConceptKind,
        event: Event,
        timing: Option<ConceptTiming>,
    ) -> Result<Option<ConceptId>, EnvError> {
        self.nodes
            .push(ConceptNode::new(kind, event, timing.unwrap_or_default(), 1));
        Ok(Some(ConceptId(self.nodes.len() - 1)))
    }

    fn concept_mut(&mut self, id: ConceptId) -> Option<&mut ConceptNode> {
        self.nodes.get_mut(id.0)
    }
}

/// A scripted villager.
#[derive(Debug)]
pub struct ScriptedAgent {
    name: String,
    home: Address,
    places: Arc<PlaceIndex>,
    memory: ScriptedMemory,
    scratch: Scratch,
    status: RuntimeStatus,
    rng: ChaCha8Rng,

    /// Tile the agent ended its last step on
    coord: Option<Coord>,

    /// Fail the next cognition call
    fail_next_think: bool,
}

impl ScriptedAgent {
    /// Creates an agent from its checkpoint entry.
    fn from_entry(
        name: &str,
        entry: &Map<String, Value>,
        places: Arc<PlaceIndex>,
        seed: u64,
    ) -> Result<Self, SimError> {
        let home = match entry.get("home") {
            Some(value) => {
                let parts: Vec<String> = serde_json::from_value(value.clone())
                    .map_err(|e| SimError::config(format!("{}: home: {}", name, e)))?;
                Address::new(parts)?
            }
            None => Address::new(["the Ville".to_string(), format!("{}的家", name)])?,
        };

        let memory = match entry.get("memory") {
            Some(value) => ScriptedMemory {
                nodes: serde_json::from_value(value.clone())
                    .map_err(|e| SimError::config(format!("{}: memory: {}", name, e)))?,
            },
            None => ScriptedMemory::default(),
        };

        let currently = entry
            .get("currently")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} 在小镇上过着平常的一天", name));

        let mut status = RuntimeStatus::default();
        if let Some(poignancy) = entry.poignancy() {
            status.poignancy = poignancy.max(0.0).round() as u32;
        }

        let coord = entry
            .get("coord")
            .and_then(|c| serde_json::from_value(c.clone()).ok());

        Ok(Self {
            name: name.to_string(),
            home,
            places,
            memory,
            scratch: Scratch { currently },
            status,
            rng: ChaCha8Rng::seed_from_u64(seed),
            coord,
            fail_next_think: false,
        })
    }

    pub fn memory(&self) -> &ScriptedMemory {
        &self.memory
    }

    pub fn currently(&self) -> &str {
        &self.scratch.currently
    }

    pub fn urgency(&self) -> u32 {
        self.status.poignancy
    }

    pub fn coord(&self) -> Option<Coord> {
        self.coord
    }

    /// Plans a walk of up to `MAX_WALK` unit moves from `from`.
    fn plan_walk(&mut self, from: Coord) -> Vec<Coord> {
        let steps = self.rng.gen_range(0..=MAX_WALK);
        let mut at = from;
        let mut path = Vec::with_capacity(steps);
        for _ in 0..steps {
            at = match self.rng.gen_range(0..4) {
                0 => Coord(at.0 + 1, at.1),
                1 => Coord(at.0 - 1, at.1),
                2 => Coord(at.0, at.1 + 1),
                _ => Coord(at.0, at.1 - 1),
            };
            path.push(at);
        }
        path
    }
}

impl VilleAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn tile_address(&self) -> Address {
        self.home.clone()
    }

    fn spatial(&self) -> Option<&dyn SpatialMemory> {
        Some(self.places.as_ref() as &dyn SpatialMemory)
    }

    fn memory_mut(&mut self) -> Option<&mut dyn ConceptMemory> {
        Some(&mut self.memory as &mut dyn ConceptMemory)
    }

    fn scratch_mut(&mut self) -> Option<&mut Scratch> {
        Some(&mut self.scratch)
    }

    fn status_mut(&mut self) -> Option<&mut dyn UrgencyCarrier> {
        Some(&mut self.status as &mut dyn UrgencyCarrier)
    }

    fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("home".into(), Value::from(Vec::from(self.home.clone())));
        dict.insert("currently".into(), Value::from(self.scratch.currently.clone()));
        dict.insert("poignancy".into(), Value::from(self.status.poignancy));
        dict.insert(
            "memory".into(),
            serde_json::to_value(&self.memory.nodes).unwrap_or(Value::Array(Vec::new())),
        );
        dict
    }
}

/// World of scripted agents.
#[derive(Debug)]
pub struct ScriptedWorld {
    agents: BTreeMap<String, ScriptedAgent>,
    conversation: Conversation,
}

impl ScriptedWorld {
    /// Builds the world for `config`, restoring whatever its agent entries
    /// carry from a previous run.
    ///
    /// The random walks are seeded from `seed` and the config's step count,
    /// so a resumed run does not replay the walks of the first one.
    pub fn from_config(
        config: &SimulationConfig,
        conversation: Conversation,
        seed: u64,
    ) -> Result<Self, SimError> {
        let places = match config.extra.get("places") {
            Some(value) => PlaceIndex::from_value(value)?,
            None => PlaceIndex::default(),
        };
        let places = Arc::new(places);
        let run_seed = seed.wrapping_add(config.step);

        let mut agents = BTreeMap::new();
        for (index, (name, entry)) in config.agents.iter().enumerate() {
            let agent = ScriptedAgent::from_entry(
                name,
                entry,
                Arc::clone(&places),
                agent_seed(run_seed, index as u64),
            )?;
            agents.insert(name.clone(), agent);
        }

        debug!("scripted world: {} agents, {} places", agents.len(), places.len());
        Ok(Self {
            agents,
            conversation,
        })
    }

    /// Typed access to an agent.
    pub fn scripted(&self, name: &str) -> Option<&ScriptedAgent> {
        self.agents.get(name)
    }

    /// Makes the next cognition call for `name` fail.
    pub fn fail_next_think(&mut self, name: &str) {
        if let Some(agent) = self.agents.get_mut(name) {
            agent.fail_next_think = true;
        }
    }

    /// Records a greeting between every pair of agents sharing `name`'s tile.
    fn greet_neighbours(&mut self, name: &str, coord: Coord) {
        let neighbours: BTreeSet<String> = self
            .agents
            .values()
            .filter(|a| a.name != name && a.coord == Some(coord))
            .map(|a| a.name.clone())
            .collect();

        for other in neighbours {
            let (a, b) = if name < other.as_str() {
                (name, other.as_str())
            } else {
                (other.as_str(), name)
            };
            let key = format!("{} -> {}", a, b);
            let line = Value::Array(vec![
                Value::from(name),
                Value::from(format!("{}，真巧，你也在这里。", other)),
            ]);
            match self.conversation.get_mut(&key) {
                Some(Value::Array(lines)) => lines.push(line),
                _ => {
                    self.conversation.insert(key, Value::Array(vec![line]));
                }
            }
        }
    }
}

impl VilleWorld for ScriptedWorld {
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

    fn agent_think(&mut self, name: &str, status: &AgentStatus) -> Result<ThinkOutput, EnvError> {
        let agent = self
            .agents
            .get_mut(name)
            .ok_or_else(|| EnvError::UnknownAgent(name.to_string()))?;

        if agent.fail_next_think {
            agent.fail_next_think = false;
            return Err(EnvError::cognition("scripted cognition failure"));
        }

        let path = agent.plan_walk(status.coord);
        let end = path.last().copied().unwrap_or(status.coord);
        agent.coord = Some(end);
        debug!("{} walks {} tiles to {:?}", name, path.len(), end);

        self.greet_neighbours(name, end);
        Ok(ThinkOutput { plan: Plan { path } })
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{fresh_config, DEFAULT_ASSETS_ROOT};
    use serde_json::json;

    fn config() -> SimulationConfig {
        let personas = vec!["简".to_string(), "汤姆".to_string()];
        let mut config = fresh_config("20240213-09:30", 10, &personas, DEFAULT_ASSETS_ROOT, None);
        config
            .extra
            .insert("places".into(), json!({"汤姆和简的卧室": ["the Ville", "林家", "卧室"]}));
        config
    }

    #[test]
    fn test_agent_seeds_are_distinct_and_stable() {
        assert_eq!(agent_seed(42, 3), agent_seed(42, 3));
        assert_ne!(agent_seed(42, 0), agent_seed(42, 1));
        assert_ne!(agent_seed(42, 0), agent_seed(43, 0));
    }

    #[test]
    fn test_same_seed_same_walks() {
        let mut a = ScriptedWorld::from_config(&config(), Conversation::new(), 7).unwrap();
        let mut b = ScriptedWorld::from_config(&config(), Conversation::new(), 7).unwrap();
        let status = AgentStatus::at(Coord(10, 10));

        for _ in 0..5 {
            assert_eq!(
                a.agent_think("简", &status).unwrap(),
                b.agent_think("简", &status).unwrap()
            );
        }
    }

    #[test]
    fn test_walk_is_contiguous_and_short() {
        let mut world = ScriptedWorld::from_config(&config(), Conversation::new(), 1).unwrap();
        let start = Coord(0, 0);

        for _ in 0..20 {
            let path = world.agent_think("汤姆", &AgentStatus::at(start)).unwrap().plan.path;
            assert!(path.len() <= MAX_WALK);
            let mut prev = start;
            for c in path {
                assert_eq!((c.0 - prev.0).abs() + (c.1 - prev.1).abs(), 1);
                prev = c;
            }
        }
    }

    #[test]
    fn test_places_are_shared_knowledge() {
        let world = ScriptedWorld::from_config(&config(), Conversation::new(), 1).unwrap();
        let agent = world.agent("简").unwrap();
        let found = agent.spatial().unwrap().find_address("汤姆和简的卧室").unwrap();
        assert_eq!(found.leaf(), "卧室");
        assert!(agent.spatial().unwrap().find_address("图书馆").is_none());
        assert_eq!(agent.tile_address().parts(), ["the Ville", "简的家"]);
    }

    #[test]
    fn test_unknown_agent_and_scripted_failure() {
        let mut world = ScriptedWorld::from_config(&config(), Conversation::new(), 1).unwrap();
        let status = AgentStatus::default();
        assert!(matches!(world.agent_think("埃迪", &status), Err(EnvError::UnknownAgent(_))));

        world.fail_next_think("简");
        assert!(matches!(world.agent_think("简", &status), Err(EnvError::CognitionError(_))));
        assert!(world.agent_think("简", &status).is_ok());
    }

    #[test]
    fn test_state_roundtrips_through_dict() {
        let mut world = ScriptedWorld::from_config(&config(), Conversation::new(), 1).unwrap();
        {
            let agent = world.agent_mut("简").unwrap();
            let home = agent.tile_address();
            agent
                .memory_mut()
                .unwrap()
                .add_concept(ConceptKind::Thought, Event::new("简", "计划", "开会", home, "开会"), None)
                .unwrap();
            agent.scratch_mut().unwrap().append_currently("\n记得开会。");
            agent.status_mut().unwrap().raise_poignancy(8);
        }

        let mut restored_config = config();
        restored_config
            .agents
            .insert("简".into(), world.agent("简").unwrap().to_dict());
        let restored = ScriptedWorld::from_config(&restored_config, Conversation::new(), 1).unwrap();
        let agent = restored.scripted("简").unwrap();

        assert_eq!(agent.memory().nodes().len(), 1);
        assert!(agent.currently().ends_with("\n记得开会。"));
        assert_eq!(agent.urgency(), 8);
    }

    #[test]
    fn test_greeting_on_shared_tile() {
        let mut world = ScriptedWorld::from_config(&config(), Conversation::new(), 1).unwrap();
        let here = Coord(4, 4);
        world.agents.get_mut("汤姆").unwrap().coord = Some(here);
        world.greet_neighbours("简", here);

        let lines = world.conversation()["汤姆 -> 简"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0], json!("简"));
    }
}
