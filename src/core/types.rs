use super::{Result, WaystoneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer block coordinate, obtained by flooring a world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing the given world coordinate.
    ///
    /// Coordinates outside the `i32` range are clamped to `i32::MIN` or
    /// `i32::MAX` (NaN maps to 0), so distinct far-out positions can share
    /// one block.
    pub fn containing(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    /// The block `dy` cells higher, or `None` past the top of the `i32` range.
    pub const fn above(self, dy: i32) -> Option<Self> {
        match self.y.checked_add(dy) {
            Some(y) => Some(Self { x: self.x, y, z: self.z }),
            None => None,
        }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// World position and facing of a waystone.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::containing(self.x, self.y, self.z)
    }
}

/// Side of the waystone a traveller arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeleportDirection {
    #[default]
    North,
    South,
    East,
    West,
}

impl TeleportDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }
}

impl fmt::Display for TeleportDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeleportDirection {
    type Err = WaystoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Ok(Self::North),
            "south" => Ok(Self::South),
            "east" => Ok(Self::East),
            "west" => Ok(Self::West),
            _ => Err(WaystoneError::invalid_value("teleportDirection", s)),
        }
    }
}

/// Which way the traveller faces on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerOrientation {
    #[default]
    Away,
    Towards,
}

impl PlayerOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Away => "away",
            Self::Towards => "towards",
        }
    }
}

impl fmt::Display for PlayerOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerOrientation {
    type Err = WaystoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "away" => Ok(Self::Away),
            "towards" => Ok(Self::Towards),
            _ => Err(WaystoneError::invalid_value("playerOrientation", s)),
        }
    }
}

/// Block variant shown in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaystoneColor {
    #[default]
    Default,
    Red,
    Green,
}

impl WaystoneColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for WaystoneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaystoneColor {
    type Err = WaystoneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            _ => Err(WaystoneError::invalid_value("color", s)),
        }
    }
}

/// Arrival point computed from a waystone's position and settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportTarget {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Radians around the vertical axis.
    pub yaw: f32,
}
