//! Static `(role, edge) -> action` table.

use core::fmt;

use heapless::Vec;

use crate::action::Action;
use crate::channel::{Edge, Role};

/// Most bindings a table can hold: a press and a release for each channel.
pub const MAX_BINDINGS: usize = 2 * crate::dispatch::MAX_CHANNELS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub role: Role,
    pub edge: Edge,
    pub action: Action,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Button {} {} -> {}", self.role, self.edge, self.action)
    }
}

/// Every button acts on release.
pub const REFERENCE_BINDINGS: [Binding; 3] = [
    Binding {
        role: Role::A,
        edge: Edge::Released,
        action: Action::CLICK_ONCE,
    },
    Binding {
        role: Role::B,
        edge: Edge::Released,
        action: Action::ENTER_PULSE,
    },
    Binding {
        role: Role::C,
        edge: Edge::Released,
        action: Action::CLICK_TRIPLE,
    },
];

/// Startup configuration mistakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("button {role} already has a {edge} binding")]
    DuplicateBinding { role: Role, edge: Edge },
    #[error("button {0} is declared twice")]
    DuplicateChannel(Role),
    #[error("too many bindings")]
    TooManyBindings,
    #[error("too many input channels")]
    TooManyChannels,
}

#[derive(Debug, Default)]
pub struct Bindings {
    entries: Vec<Binding, MAX_BINDINGS>,
}

impl Bindings {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_slice(bindings: &[Binding]) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for binding in bindings {
            table.insert(*binding)?;
        }
        Ok(table)
    }

    /// Add a binding. At most one per `(role, edge)`.
    pub fn insert(&mut self, binding: Binding) -> Result<(), ConfigError> {
        if self.lookup(binding.role, binding.edge).is_some() {
            return Err(ConfigError::DuplicateBinding {
                role: binding.role,
                edge: binding.edge,
            });
        }
        self.entries
            .push(binding)
            .map_err(|_| ConfigError::TooManyBindings)
    }

    pub fn lookup(&self, role: Role, edge: Edge) -> Option<&Action> {
        self.entries
            .iter()
            .find(|b| b.role == role && b.edge == edge)
            .map(|b| &b.action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
