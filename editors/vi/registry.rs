//! Engines per host editor area.
//!
//! A host with several editor areas keeps one engine per area. The registry
//! maps the host's area id to its engine, creating engines on demand with
//! the shared register store, and drops them when the host closes the area.

use crate::engine::Engine;
use crate::register::SharedRegisters;
use crate::surface::TextSurface;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

pub struct EngineRegistry<K, S: TextSurface> {
    registers: SharedRegisters,
    engines: HashMap<K, Engine<S>>,
}

impl<K, S> EngineRegistry<K, S>
where
    K: Eq + Hash + std::fmt::Debug,
    S: TextSurface,
{
    pub fn new(registers: SharedRegisters) -> Self {
        Self {
            registers,
            engines: HashMap::new(),
        }
    }

    /// Engine for `id`, created from `make_surface` the first time.
    pub fn get_or_create(&mut self, id: K, make_surface: impl FnOnce() -> S) -> &mut Engine<S> {
        let registers = &self.registers;
        self.engines.entry(id).or_insert_with_key(|id| {
            debug!(?id, "create engine");
            Engine::new(make_surface(), registers.clone())
        })
    }

    pub fn get(&self, id: &K) -> Option<&Engine<S>> {
        self.engines.get(id)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut Engine<S>> {
        self.engines.get_mut(id)
    }

    /// Forget the engine of a closed area, returning it.
    pub fn remove(&mut self, id: &K) -> Option<Engine<S>> {
        debug!(?id, "remove engine");
        self.engines.remove(id)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn registers(&self) -> &SharedRegisters {
        &self.registers
    }
}
