//! Sparse index-addressed storage
//!
//! Entries keep their index for their whole life. Vacant slots are explicit,
//! so pre-allocated spring slots and removed particles leave holes instead of
//! shifting everything after them.

#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, occupied or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn push(&mut self, value: T) -> usize {
        self.slots.push(Some(value));
        self.slots.len() - 1
    }

    pub fn push_vacant(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Store `value` at `index`, which must be an existing slot or the next
    /// free index. Hands the value back otherwise.
    pub fn put(&mut self, index: usize, value: T) -> Result<(), T> {
        if index < self.slots.len() {
            self.slots[index] = Some(value);
            Ok(())
        } else if index == self.slots.len() {
            self.slots.push(Some(value));
            Ok(())
        } else {
            Err(value)
        }
    }

    pub fn vacate(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Mutable access to two distinct occupied slots at once
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let lo_ref = head[lo].as_mut()?;
        let hi_ref = tail[0].as_mut()?;
        if a < b {
            Some((lo_ref, hi_ref))
        } else {
            Some((hi_ref, lo_ref))
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Occupied entries with their indices
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|v| (i, v)))
    }
}

impl<T> FromIterator<T> for SlotArena<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(Some).collect(),
        }
    }
}
