//! The cross-reference table: where every object starts, and which numbers are free.

use crate::{error::SerializationError, object::ObjectId};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

const BIG_LEN: usize = 10;
const SMALL_LEN: usize = 5;

/// Generation numbers stop here; an entry freed at this generation is never reused
pub const MAX_GENERATION: u16 = 65535;

/// One line of the emitted table
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Entry {
    Free { next: u32, generation: u16 },
    InUse { offset: u64, generation: u16 },
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // the trailing space keeps every entry at exactly 20 bytes with a bare LF
        match self {
            Entry::InUse { offset, generation } => {
                writeln!(f, "{offset:0BIG_LEN$} {generation:0SMALL_LEN$} n ")
            }
            Entry::Free { next, generation } => {
                writeln!(f, "{next:0BIG_LEN$} {generation:0SMALL_LEN$} f ")
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Slot {
    /// Handed out, not yet written
    Allocated { generation: u16 },
    Committed { offset: u64, generation: u16 },
    /// `generation` is the one the number gets when it is reused
    Free { generation: u16 },
}

/// Tracks object numbers from allocation to output. Slot `n - 1` holds object `n`;
/// object 0 is implicit as the head of the free list.
#[derive(Debug, Default)]
pub struct CrossReferenceTable {
    slots: Vec<Slot>,
    reusable: BTreeSet<u32>,
}

impl CrossReferenceTable {
    pub fn new() -> CrossReferenceTable {
        CrossReferenceTable::default()
    }

    /// The lowest free number if one can be reused, else the next fresh number
    pub fn allocate(&mut self) -> ObjectId {
        if let Some(number) = self.reusable.pop_first() {
            let slot = &mut self.slots[number as usize - 1];
            let generation = match *slot {
                Slot::Free { generation } => generation,
                _ => 0,
            };
            *slot = Slot::Allocated { generation };
            return ObjectId::new(number, generation);
        }

        self.slots.push(Slot::Allocated { generation: 0 });
        ObjectId::new(self.slots.len() as u32, 0)
    }

    fn slot(&self, id: ObjectId) -> Result<Slot, SerializationError> {
        if id.number == 0 {
            return Err(SerializationError::Unallocated(id));
        }
        let slot = self
            .slots
            .get(id.number as usize - 1)
            .copied()
            .ok_or(SerializationError::Unallocated(id))?;
        match slot {
            Slot::Free { .. } => Err(SerializationError::Freed(id)),
            Slot::Allocated { generation } | Slot::Committed { generation, .. }
                if generation != id.generation =>
            {
                Err(SerializationError::Unallocated(id))
            }
            slot => Ok(slot),
        }
    }

    /// Whether `id` may be referenced: allocated (committed or not) and not freed
    pub fn check_live(&self, id: ObjectId) -> Result<(), SerializationError> {
        self.slot(id).map(|_| ())
    }

    /// Record where `id` starts in the output
    pub fn record(&mut self, id: ObjectId, offset: u64) -> Result<(), SerializationError> {
        match self.slot(id)? {
            Slot::Committed { .. } => Err(SerializationError::DoubleCommit(id)),
            _ => {
                self.slots[id.number as usize - 1] = Slot::Committed {
                    offset,
                    generation: id.generation,
                };
                Ok(())
            }
        }
    }

    /// Take `id` out of use. Bytes already written for it stay in the file; the entry
    /// just stops pointing at them.
    pub fn free(&mut self, id: ObjectId) -> Result<(), SerializationError> {
        self.slot(id)?;
        let generation = id.generation.saturating_add(1);
        self.slots[id.number as usize - 1] = Slot::Free { generation };
        if generation < MAX_GENERATION {
            self.reusable.insert(id.number);
        }
        Ok(())
    }

    pub fn offset_of(&self, id: ObjectId) -> Option<u64> {
        match self.slot(id) {
            Ok(Slot::Committed { offset, .. }) => Some(offset),
            _ => None,
        }
    }

    /// Highest number handed out so far
    pub fn max_number(&self) -> u32 {
        self.slots.len() as u32
    }

    /// `/Size` for the trailer
    pub fn size(&self) -> u32 {
        self.max_number() + 1
    }

    pub fn committed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Committed { .. }))
            .count()
    }

    /// All entries from object 0 up, free entries chained in ascending order with the
    /// last one pointing back at 0. Fails if any number is still only allocated.
    pub fn entries(&self) -> Result<Vec<Entry>, SerializationError> {
        let free: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Free { .. }))
            .map(|(i, _)| i as u32 + 1)
            .collect();
        let next_free = |number: u32| free.iter().copied().find(|&n| n > number).unwrap_or(0);

        let mut entries = Vec::with_capacity(self.slots.len() + 1);
        entries.push(Entry::Free {
            next: next_free(0),
            generation: MAX_GENERATION,
        });
        for (i, slot) in self.slots.iter().enumerate() {
            let number = i as u32 + 1;
            entries.push(match *slot {
                Slot::Committed { offset, generation } => Entry::InUse { offset, generation },
                Slot::Free { generation } => Entry::Free {
                    next: next_free(number),
                    generation,
                },
                Slot::Allocated { generation } => {
                    return Err(SerializationError::Uncommitted(ObjectId::new(number, generation)))
                }
            });
        }
        Ok(entries)
    }
}
