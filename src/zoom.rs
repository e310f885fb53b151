//! Discrete zoom levels of the viewer.
//!
//! The state machine is owned by one viewer session and mutated through
//! `&mut self`. Other threads that only need to know the current level get a
//! [`ZoomObserver`], which reads an atomic copy kept in sync on every
//! transition.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coords::CellLevel;

/// Hierarchy level being displayed, ordered from coarsest to finest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoomLevel {
    #[default]
    Galaxy = 0,
    Quadrant = 1,
    Sector = 2,
    Subsector = 3,
}

impl ZoomLevel {
    /// All levels in order
    pub fn all() -> &'static [ZoomLevel] {
        &[ZoomLevel::Galaxy, ZoomLevel::Quadrant, ZoomLevel::Sector, ZoomLevel::Subsector]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZoomLevel::Galaxy => "Galaxy",
            ZoomLevel::Quadrant => "Quadrant",
            ZoomLevel::Sector => "Sector",
            ZoomLevel::Subsector => "Subsector",
        }
    }

    /// 0 for Galaxy up to 3 for Subsector
    pub fn depth(&self) -> u8 {
        *self as u8
    }

    pub fn from_depth(depth: u8) -> Option<ZoomLevel> {
        match depth {
            0 => Some(ZoomLevel::Galaxy),
            1 => Some(ZoomLevel::Quadrant),
            2 => Some(ZoomLevel::Sector),
            3 => Some(ZoomLevel::Subsector),
            _ => None,
        }
    }

    /// Next finer level, if any
    pub fn deeper(&self) -> Option<ZoomLevel> {
        ZoomLevel::from_depth(self.depth() + 1)
    }

    /// Next coarser level, if any
    pub fn shallower(&self) -> Option<ZoomLevel> {
        self.depth().checked_sub(1).and_then(ZoomLevel::from_depth)
    }

    /// Cell level shown at this zoom; the galaxy view has no single cell
    pub fn cell_level(&self) -> Option<CellLevel> {
        match self {
            ZoomLevel::Galaxy => None,
            ZoomLevel::Quadrant => Some(CellLevel::Quadrant),
            ZoomLevel::Sector => Some(CellLevel::Sector),
            ZoomLevel::Subsector => Some(CellLevel::Subsector),
        }
    }
}

impl std::fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A completed level change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomChange {
    pub from: ZoomLevel,
    pub to: ZoomLevel,
}

/// Signal to the system generator that a star's system should be opened.
///
/// The star seed is the only handle the system generator receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenSystemRequest {
    pub star_seed: u64,
}

type ZoomListener = Box<dyn FnMut(ZoomChange) + Send>;

/// Tracks the displayed hierarchy level.
pub struct ZoomStateMachine {
    level: ZoomLevel,
    shared: Arc<AtomicU8>,
    listeners: Vec<ZoomListener>,
}

impl Default for ZoomStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ZoomStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomStateMachine")
            .field("level", &self.level)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ZoomStateMachine {
    /// Start at the galaxy view
    pub fn new() -> Self {
        Self {
            level: ZoomLevel::Galaxy,
            shared: Arc::new(AtomicU8::new(ZoomLevel::Galaxy.depth())),
            listeners: Vec::new(),
        }
    }

    pub fn current_level(&self) -> ZoomLevel {
        self.level
    }

    /// Register a callback fired after every real level change
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(ZoomChange) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Thread-safe read handle to the current level
    pub fn observer(&self) -> ZoomObserver {
        ZoomObserver {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn can_zoom_in(&self) -> bool {
        self.level.deeper().is_some()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.level.shallower().is_some()
    }

    /// Go one level finer. No-op at Subsector.
    pub fn zoom_in(&mut self) -> Option<ZoomChange> {
        let target = self.level.deeper()?;
        self.transition_to(target)
    }

    /// Go one level coarser. No-op at Galaxy.
    pub fn zoom_out(&mut self) -> Option<ZoomChange> {
        let target = self.level.shallower()?;
        self.transition_to(target)
    }

    /// Jump straight to `level`. Jumping to the current level changes nothing
    /// and notifies no one.
    pub fn transition_to(&mut self, level: ZoomLevel) -> Option<ZoomChange> {
        if level == self.level {
            return None;
        }
        let change = ZoomChange {
            from: self.level,
            to: level,
        };
        self.level = level;
        self.shared.store(level.depth(), Ordering::Release);
        log::debug!("Zoom {} -> {}", change.from, change.to);
        for listener in &mut self.listeners {
            listener(change);
        }
        Some(change)
    }

    /// Opening a star system is only valid at the finest level
    pub fn can_open_system(&self) -> bool {
        self.level == ZoomLevel::Subsector
    }

    /// Request the system of the star with `star_seed`, if the level allows it
    pub fn open_system(&self, star_seed: u64) -> Option<OpenSystemRequest> {
        if self.can_open_system() {
            Some(OpenSystemRequest { star_seed })
        } else {
            log::debug!("Ignoring open-system request at {} level", self.level);
            None
        }
    }
}

/// Cloneable read-only view of a [`ZoomStateMachine`]'s level.
#[derive(Clone, Debug)]
pub struct ZoomObserver {
    shared: Arc<AtomicU8>,
}

impl ZoomObserver {
    pub fn current_level(&self) -> ZoomLevel {
        ZoomLevel::from_depth(self.shared.load(Ordering::Acquire)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording(machine: &mut ZoomStateMachine) -> Arc<Mutex<Vec<ZoomChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        machine.subscribe(move |change| sink.lock().unwrap().push(change));
        log
    }

    #[test]
    fn test_starts_at_galaxy() {
        let machine = ZoomStateMachine::new();
        assert_eq!(machine.current_level(), ZoomLevel::Galaxy);
        assert!(machine.can_zoom_in());
        assert!(!machine.can_zoom_out());
    }

    #[test]
    fn test_zoom_in_stops_at_subsector() {
        let mut machine = ZoomStateMachine::new();
        let changes = recording(&mut machine);

        let expected = [ZoomLevel::Quadrant, ZoomLevel::Sector, ZoomLevel::Subsector];
        for &level in &expected {
            let change = machine.zoom_in().unwrap();
            assert_eq!(change.to, level);
        }
        // Fourth zoom does not overshoot
        assert_eq!(machine.zoom_in(), None);
        assert_eq!(machine.current_level(), ZoomLevel::Subsector);
        assert!(!machine.can_zoom_in());
        assert!(machine.can_zoom_out());
        assert_eq!(changes.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_zoom_out_at_galaxy_is_noop() {
        let mut machine = ZoomStateMachine::new();
        let changes = recording(&mut machine);
        assert_eq!(machine.zoom_out(), None);
        assert_eq!(machine.current_level(), ZoomLevel::Galaxy);
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zoom_out_walks_back() {
        let mut machine = ZoomStateMachine::new();
        machine.transition_to(ZoomLevel::Subsector);
        let mut seen = Vec::new();
        while let Some(change) = machine.zoom_out() {
            seen.push(change.to);
        }
        assert_eq!(seen, vec![ZoomLevel::Sector, ZoomLevel::Quadrant, ZoomLevel::Galaxy]);
    }

    #[test]
    fn test_transition_to_current_is_silent() {
        let mut machine = ZoomStateMachine::new();
        machine.transition_to(ZoomLevel::Sector);
        let changes = recording(&mut machine);

        assert_eq!(machine.transition_to(ZoomLevel::Sector), None);
        assert!(changes.lock().unwrap().is_empty());

        let change = machine.transition_to(ZoomLevel::Galaxy).unwrap();
        assert_eq!(change, ZoomChange { from: ZoomLevel::Sector, to: ZoomLevel::Galaxy });
        assert_eq!(*changes.lock().unwrap(), vec![change]);
    }

    #[test]
    fn test_observer_follows_transitions() {
        let mut machine = ZoomStateMachine::new();
        let observer = machine.observer();
        machine.zoom_in();
        machine.zoom_in();
        let remote = observer.clone();
        let level = std::thread::spawn(move || remote.current_level()).join().unwrap();
        assert_eq!(level, ZoomLevel::Sector);
        assert_eq!(observer.current_level(), machine.current_level());
    }

    #[test]
    fn test_open_system_gated_by_level() {
        let mut machine = ZoomStateMachine::new();
        for _ in 0..3 {
            assert!(!machine.can_open_system());
            assert_eq!(machine.open_system(1234), None);
            machine.zoom_in();
        }
        assert!(machine.can_open_system());
        assert_eq!(machine.open_system(1234), Some(OpenSystemRequest { star_seed: 1234 }));
    }

    #[test]
    fn test_level_ordering_and_cells() {
        assert!(ZoomLevel::Galaxy < ZoomLevel::Quadrant);
        assert!(ZoomLevel::Sector < ZoomLevel::Subsector);
        for (i, level) in ZoomLevel::all().iter().enumerate() {
            assert_eq!(level.depth() as usize, i);
            assert_eq!(ZoomLevel::from_depth(i as u8), Some(*level));
        }
        assert_eq!(ZoomLevel::Galaxy.cell_level(), None);
        assert_eq!(ZoomLevel::Subsector.cell_level(), Some(CellLevel::Subsector));
        assert_eq!(ZoomLevel::Galaxy.shallower(), None);
        assert_eq!(ZoomLevel::Subsector.deeper(), None);
    }
}
