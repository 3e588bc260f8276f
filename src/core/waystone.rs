use super::types::{BlockPos, Location, PlayerOrientation, TeleportDirection, TeleportTarget, WaystoneColor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::f32::consts::{FRAC_PI_2, PI};
use uuid::Uuid;

pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// Distance from the block centre at which travellers arrive.
const ARRIVAL_OFFSET: f64 = 1.1;

fn default_text_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

/// A single persisted waystone.
///
/// Fields are only mutated by the registry so that every change is followed
/// by a save request; readers get owned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Waystone {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) world: String,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
    pub(crate) yaw: f32,
    #[serde(rename = "OwnerUuid")]
    pub(crate) owner_id: String,
    pub(crate) owner_name: String,
    pub(crate) is_public: bool,
    #[serde(default)]
    pub(crate) priority: i32,
    #[serde(default)]
    pub(crate) editors: BTreeSet<String>,
    #[serde(default)]
    pub(crate) viewers: BTreeSet<String>,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default = "default_text_color")]
    pub(crate) text_color: String,
    #[serde(default)]
    pub(crate) teleport_direction: TeleportDirection,
    #[serde(default)]
    pub(crate) player_orientation: PlayerOrientation,
    #[serde(default)]
    pub(crate) server_owned: bool,
    #[serde(default)]
    pub(crate) default_discovered: bool,
    #[serde(default)]
    pub(crate) color: WaystoneColor,
}

impl Waystone {
    /// Creates a waystone with a freshly minted id and creation timestamp.
    pub fn new(
        name: impl Into<String>,
        location: Location,
        owner_id: impl Into<String>,
        owner_name: impl Into<String>,
        is_public: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            world: location.world,
            x: location.x,
            y: location.y,
            z: location.z,
            yaw: location.yaw,
            owner_id: owner_id.into(),
            owner_name: owner_name.into(),
            is_public,
            priority: 0,
            editors: BTreeSet::new(),
            viewers: BTreeSet::new(),
            created_at: Utc::now(),
            text_color: default_text_color(),
            teleport_direction: TeleportDirection::default(),
            player_orientation: PlayerOrientation::default(),
            server_owned: false,
            default_discovered: false,
            color: WaystoneColor::default(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_server_owned(mut self, server_owned: bool) -> Self {
        self.server_owned = server_owned;
        self
    }

    pub fn with_default_discovered(mut self, default_discovered: bool) -> Self {
        self.default_discovered = default_discovered;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn location(&self) -> Location {
        Location::new(self.world.clone(), self.x, self.y, self.z).with_yaw(self.yaw)
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::containing(self.x, self.y, self.z)
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn editors(&self) -> &BTreeSet<String> {
        &self.editors
    }

    pub fn viewers(&self) -> &BTreeSet<String> {
        &self.viewers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn text_color(&self) -> &str {
        &self.text_color
    }

    pub fn teleport_direction(&self) -> TeleportDirection {
        self.teleport_direction
    }

    pub fn player_orientation(&self) -> PlayerOrientation {
        self.player_orientation
    }

    pub fn is_server_owned(&self) -> bool {
        self.server_owned
    }

    pub fn is_default_discovered(&self) -> bool {
        self.default_discovered
    }

    pub fn color(&self) -> WaystoneColor {
        self.color
    }

    /// Public waystones are visible to everyone, private ones to their owner.
    pub fn is_visible_to(&self, principal: &str) -> bool {
        self.is_public || self.owner_id == principal
    }

    pub fn is_owned_by(&self, principal: &str) -> bool {
        self.owner_id == principal
    }

    pub fn is_editor(&self, principal: &str) -> bool {
        self.editors.contains(principal)
    }

    pub fn is_viewer(&self, principal: &str) -> bool {
        self.viewers.contains(principal)
    }

    /// Owner or an explicitly granted editor.
    pub fn can_edit(&self, principal: &str) -> bool {
        self.is_owned_by(principal) || self.is_editor(principal)
    }

    /// Visibility extended by the viewer and editor grants.
    pub fn can_view(&self, principal: &str) -> bool {
        self.is_visible_to(principal) || self.is_viewer(principal) || self.is_editor(principal)
    }

    pub(crate) fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Arrival point one block-and-a-bit off the configured side, facing
    /// away from or towards the waystone.
    pub fn teleport_target(&self) -> TeleportTarget {
        let mut x = self.x + 0.5;
        let y = self.y + 0.5;
        let mut z = self.z + 0.5;

        match self.teleport_direction {
            TeleportDirection::North => z -= ARRIVAL_OFFSET,
            TeleportDirection::South => z += ARRIVAL_OFFSET,
            TeleportDirection::East => x += ARRIVAL_OFFSET,
            TeleportDirection::West => x -= ARRIVAL_OFFSET,
        }

        let towards = self.player_orientation == PlayerOrientation::Towards;
        let yaw = match self.teleport_direction {
            TeleportDirection::North => {
                if towards {
                    PI
                } else {
                    0.0
                }
            }
            TeleportDirection::South => {
                if towards {
                    0.0
                } else {
                    PI
                }
            }
            TeleportDirection::East => {
                if towards {
                    FRAC_PI_2
                } else {
                    -FRAC_PI_2
                }
            }
            TeleportDirection::West => {
                if towards {
                    -FRAC_PI_2
                } else {
                    FRAC_PI_2
                }
            }
        };

        TeleportTarget {
            world: self.world.clone(),
            x,
            y,
            z,
            yaw,
        }
    }
}

/// Key used for name uniqueness: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// List order: priority descending, then name case-insensitively, then id so
/// that equal names still sort deterministically.
pub fn display_order(a: &Waystone, b: &Waystone) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}
