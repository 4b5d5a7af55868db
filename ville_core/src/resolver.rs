//! Place keyword resolution with a current-location fallback.

use tracing::debug;
use ville_env::{Address, VilleAgent};

/// Resolves `keyword` to an address through the agent's spatial memory.
///
/// Falls back to the agent's current tile when no keyword is given, the
/// agent has no spatial memory, or the lookup misses. The result is never
/// empty.
pub fn resolve_address(agent: &dyn VilleAgent, keyword: Option<&str>) -> Address {
    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

    if let Some(keyword) = keyword {
        match agent.spatial() {
            Some(spatial) => {
                if let Some(address) = spatial.find_address(keyword) {
                    return address;
                }
                debug!("{}: no place matches '{}', using current tile", agent.name(), keyword);
            }
            None => {
                debug!("{}: no spatial memory, using current tile", agent.name());
            }
        }
    }

    agent.tile_address()
}
