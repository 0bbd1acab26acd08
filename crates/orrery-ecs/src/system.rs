//! Systems and the ordered schedule that runs them.
//!
//! A [`System`] is any routine that takes `&mut World`. Closures qualify
//! through a blanket impl. The [`Schedule`] keeps systems in registration
//! order and [`World::run`](crate::world::World::run) invokes each of them
//! exactly once per call.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::world::World;

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// An update routine run once per [`World::run`](crate::world::World::run).
pub trait System: 'static {
    /// Execute the system against the world.
    fn run(&mut self, world: &mut World);

    /// Name used in diagnostics and tracing spans.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<F: FnMut(&mut World) + 'static> System for F {
    fn run(&mut self, world: &mut World) {
        (self)(world);
    }
}

/// A closure paired with a human-readable name.
pub struct NamedSystem<F> {
    name: String,
    func: F,
}

impl<F: FnMut(&mut World) + 'static> NamedSystem<F> {
    /// Wrap `func` under `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F: FnMut(&mut World) + 'static> System for NamedSystem<F> {
    fn run(&mut self, world: &mut World) {
        (self.func)(world);
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(self.name.clone())
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

pub(crate) type SharedSystem = Rc<RefCell<Box<dyn System>>>;

/// A system as held by the schedule.
#[derive(Clone)]
pub(crate) struct ScheduledSystem {
    /// Captured at registration so it can be read while the system runs.
    pub name: Cow<'static, str>,
    pub system: SharedSystem,
}

/// Ordered list of systems. No uniqueness constraint, no removal.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<ScheduledSystem>,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system to the end of the schedule.
    pub fn push(&mut self, system: Box<dyn System>) {
        let name = system.name();
        self.systems.push(ScheduledSystem {
            name,
            system: Rc::new(RefCell::new(system)),
        });
    }

    /// Number of systems in the schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names, in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| &*s.name).collect()
    }

    /// The systems registered so far. Systems appended after this call are
    /// not part of the returned list.
    pub(crate) fn snapshot(&self) -> Vec<ScheduledSystem> {
        self.systems.clone()
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("systems", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
