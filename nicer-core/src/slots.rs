use crate::slot_id::SlotId;
use std::collections::{HashMap, HashSet};
use transport::CancelToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSlot {
    pub id: SlotId,
    /// Id the fragment resolved to before de-duplication.
    pub base: SlotId,
    pub max_gti: Option<u32>,
}

#[derive(Debug, Clone)]
struct InFlight {
    seq: u64,
    cancel: CancelToken,
}

/// Plot slots of the current render and the refinement in flight for each.
///
/// Every bulk render starts a new generation; tickets from older
/// generations never settle.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    generation: u64,
    obs_id: String,
    slots: Vec<PlotSlot>,
    /// Element ids the page already uses outside the plot panel.
    reserved: HashSet<String>,
    in_flight: HashMap<SlotId, InFlight>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn obs_id(&self) -> &str {
        &self.obs_id
    }

    pub fn slots(&self) -> &[PlotSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: &SlotId) -> Option<&PlotSlot> {
        self.slots.iter().find(|slot| &slot.id == id)
    }

    pub fn contains(&self, id: &SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Drops all slots, cancels their refinements and opens a new generation.
    pub fn begin_render(&mut self, obs_id: &str) -> u64 {
        self.cancel_in_flight();
        self.slots.clear();
        self.reserved.clear();
        self.obs_id = obs_id.to_string();
        self.generation += 1;
        self.generation
    }

    /// Marks page element ids as taken for the rest of this generation.
    pub fn reserve<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(ids.into_iter().map(Into::into));
    }

    pub fn is_taken(&self, id: &SlotId) -> bool {
        self.contains(id) || self.reserved.contains(id.as_str())
    }

    fn unique_id(&self, base: &SlotId) -> SlotId {
        if !self.is_taken(base) {
            return base.clone();
        }
        (2..)
            .map(|n| SlotId::new(&format!("{base}_{n}")))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or_else(|| base.clone())
    }

    /// Registers a slot, suffixing `_2`, `_3`, ... when `base` is taken by
    /// another slot or a reserved page id.
    pub fn insert(&mut self, base: SlotId, max_gti: Option<u32>) -> SlotId {
        let id = self.unique_id(&base);
        self.slots.push(PlotSlot {
            id: id.clone(),
            base,
            max_gti,
        });
        id
    }

    /// Makes `seq` the live refinement for `id`, cancelling the previous one.
    pub fn track(&mut self, id: &SlotId, seq: u64, cancel: CancelToken) {
        if let Some(previous) = self.in_flight.insert(id.clone(), InFlight { seq, cancel }) {
            log::debug!("refinement #{} for {id} superseded by #{seq}", previous.seq);
            previous.cancel.cancel();
        }
    }

    pub fn in_flight(&self, id: &SlotId) -> Option<u64> {
        self.in_flight.get(id).map(|f| f.seq)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn cancel_in_flight(&mut self) -> usize {
        let count = self.in_flight.len();
        for (_, flight) in self.in_flight.drain() {
            flight.cancel.cancel();
        }
        count
    }

    /// Accepts a completion only if it is the live refinement for `id` in the
    /// current generation. Accepted tickets are no longer in flight.
    pub fn settle(&mut self, id: &SlotId, seq: u64, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.in_flight.get(id) {
            Some(flight) if flight.seq == seq => {
                self.in_flight.remove(id);
                true
            }
            _ => false,
        }
    }
}
