//! Housing registry: first-fit assignment of occupants to houses.
//!
//! Houses are kept in registration order; [`HousingRegistry::find_available`]
//! returns the first one with a free slot. Generic over the house and
//! occupant identifiers so the engine can use ECS entities directly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One house: a capacity and the occupants currently living there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingEntry<O> {
    capacity: u32,
    occupants: Vec<O>,
}

impl<O: PartialEq> HousingEntry<O> {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupants: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupants(&self) -> &[O] {
        &self.occupants
    }

    pub fn vacancies(&self) -> u32 {
        self.capacity.saturating_sub(self.occupants.len() as u32)
    }

    pub fn has_room(&self) -> bool {
        (self.occupants.len() as u32) < self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HousingError {
    UnknownHouse,
    HouseFull,
    AlreadyHoused,
}

impl fmt::Display for HousingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HousingError::UnknownHouse => write!(f, "house is not registered"),
            HousingError::HouseFull => write!(f, "house is full"),
            HousingError::AlreadyHoused => write!(f, "occupant already has a house"),
        }
    }
}

impl std::error::Error for HousingError {}

/// Registration-ordered set of houses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousingRegistry<H, O> {
    houses: Vec<(H, HousingEntry<O>)>,
}

impl<H, O> Default for HousingRegistry<H, O> {
    fn default() -> Self {
        Self { houses: Vec::new() }
    }
}

impl<H: Copy + PartialEq + fmt::Debug, O: Copy + PartialEq> HousingRegistry<H, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a house at the end of the search order. Registering an id twice
    /// keeps the original entry.
    pub fn register(&mut self, house: H, capacity: u32) {
        if self.entry(house).is_some() {
            log::warn!("House {:?} is already registered", house);
            return;
        }
        self.houses.push((house, HousingEntry::new(capacity)));
    }

    /// Remove a house, returning its entry. No-op if absent.
    pub fn unregister(&mut self, house: H) -> Option<HousingEntry<O>> {
        let index = self.houses.iter().position(|(h, _)| *h == house)?;
        Some(self.houses.remove(index).1)
    }

    /// First house, in registration order, with a free slot.
    pub fn find_available(&self) -> Option<H> {
        self.houses
            .iter()
            .find(|(_, entry)| entry.has_room())
            .map(|(h, _)| *h)
    }

    pub fn move_in(&mut self, house: H, occupant: O) -> Result<(), HousingError> {
        if self.house_of(occupant).is_some() {
            return Err(HousingError::AlreadyHoused);
        }
        let entry = self.entry_mut(house).ok_or(HousingError::UnknownHouse)?;
        if !entry.has_room() {
            return Err(HousingError::HouseFull);
        }
        entry.occupants.push(occupant);
        Ok(())
    }

    /// House the occupant in the first available house.
    pub fn house(&mut self, occupant: O) -> Option<H> {
        let house = self.find_available()?;
        self.move_in(house, occupant).ok()?;
        Some(house)
    }

    /// Remove an occupant (death or reassignment). Returns the house they left.
    pub fn move_out(&mut self, occupant: O) -> Option<H> {
        for (house, entry) in self.houses.iter_mut() {
            if let Some(index) = entry.occupants.iter().position(|o| *o == occupant) {
                entry.occupants.remove(index);
                return Some(*house);
            }
        }
        None
    }

    pub fn house_of(&self, occupant: O) -> Option<H> {
        self.houses
            .iter()
            .find(|(_, entry)| entry.occupants.contains(&occupant))
            .map(|(h, _)| *h)
    }

    pub fn entry(&self, house: H) -> Option<&HousingEntry<O>> {
        self.houses
            .iter()
            .find(|(h, _)| *h == house)
            .map(|(_, e)| e)
    }

    fn entry_mut(&mut self, house: H) -> Option<&mut HousingEntry<O>> {
        self.houses
            .iter_mut()
            .find(|(h, _)| *h == house)
            .map(|(_, e)| e)
    }

    /// Houses in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &HousingEntry<O>)> {
        self.houses.iter().map(|(h, e)| (*h, e))
    }

    pub fn total_vacancies(&self) -> u32 {
        self.houses.iter().map(|(_, e)| e.vacancies()).sum()
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}
