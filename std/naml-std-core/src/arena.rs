///
/// Generational Slot Arena
///
/// Owns values in a slab of slots and hands out `SlotKey`s (index plus
/// generation). A key keeps naming the same value until it is removed;
/// after that the slot's generation moves on, so stale keys miss instead of
/// aliasing whatever reuses the slot.
///
/// Vacant slots are chained into a free list, so insert and remove are
/// O(1) amortized and memory is reused.
///

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: usize,
    generation: u64,
}

impl SlotKey {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { generation: u64, value: T },
    Vacant { generation: u64, next_free: Option<usize> },
}

#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> SlotKey {
        self.len += 1;
        if let Some(index) = self.free_head {
            if let Slot::Vacant { generation, next_free } = self.slots[index] {
                self.free_head = next_free;
                self.slots[index] = Slot::Occupied { generation, value };
                return SlotKey { index, generation };
            }
        }
        let index = self.slots.len();
        self.slots.push(Slot::Occupied { generation: 0, value });
        SlotKey { index, generation: 0 }
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        match self.slots.get(key.index)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        match self.slots.get_mut(key.index)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    /// Remove the value named by `key`. Stale or foreign keys are a no-op.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        let vacant = Slot::Vacant {
            generation: key.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        match std::mem::replace(&mut self.slots[key.index], vacant) {
            Slot::Occupied { value, .. } => {
                self.free_head = Some(key.index);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => None,
        }
    }

    /// Remove every value, in slot order. All outstanding keys go stale.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for index in 0..self.slots.len() {
            let generation = match &self.slots[index] {
                Slot::Occupied { generation, .. } => *generation,
                Slot::Vacant { .. } => continue,
            };
            let vacant = Slot::Vacant {
                generation: generation.wrapping_add(1),
                next_free: self.free_head,
            };
            let slot = std::mem::replace(&mut self.slots[index], vacant);
            if let Slot::Occupied { value, .. } = slot {
                self.free_head = Some(index);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }
}
