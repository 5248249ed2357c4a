//! Order vocabulary of the turn protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Coordinate, Direction, RegionId};

/// Order announced by a submarine during its turn.
///
/// Only the fields the tracking engine consumes are kept: a `MOVE` issued
/// together with a power charge, a `SILENCE` carrying our own hidden
/// direction, or a `MINE` with its drop direction parse into the same
/// variants as the opponent's announced forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Single step in a known direction.
    Move {
        /// Direction of the step.
        direction: Direction,
    },
    /// Resurface inside the named region, clearing the visited history.
    Surface {
        /// Region where the submarine surfaced.
        region: RegionId,
    },
    /// Torpedo fired at a target cell.
    Torpedo {
        /// Cell the torpedo was aimed at.
        target: Coordinate,
    },
    /// Sonar probe of a region.
    Sonar {
        /// Region that was probed.
        region: RegionId,
    },
    /// Zero to four hidden steps in one undisclosed direction.
    Silence,
    /// Mine dropped next to the submarine.
    Mine,
    /// Previously dropped mine detonated at a cell.
    Trigger {
        /// Cell holding the detonated mine.
        target: Coordinate,
    },
}

impl Order {
    /// Parses a single order token such as `MOVE N` or `TORPEDO 3 5`.
    ///
    /// Unknown keywords, `MSG` tokens and tokens with missing or malformed
    /// arguments yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let mut words = token.split_whitespace();
        let keyword = words.next()?;
        match keyword {
            "MOVE" => {
                let direction = Direction::from_symbol(words.next()?)?;
                Some(Self::Move { direction })
            }
            "SURFACE" => Some(Self::Surface {
                region: parse_region(words.next()?)?,
            }),
            "TORPEDO" => Some(Self::Torpedo {
                target: parse_coordinate(words.next()?, words.next()?)?,
            }),
            "SONAR" => Some(Self::Sonar {
                region: parse_region(words.next()?)?,
            }),
            "SILENCE" => Some(Self::Silence),
            "MINE" => Some(Self::Mine),
            "TRIGGER" => Some(Self::Trigger {
                target: parse_coordinate(words.next()?, words.next()?)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { direction } => write!(f, "MOVE {direction}"),
            Self::Surface { region } => write!(f, "SURFACE {region}"),
            Self::Torpedo { target } => write!(f, "TORPEDO {target}"),
            Self::Sonar { region } => write!(f, "SONAR {region}"),
            Self::Silence => write!(f, "SILENCE"),
            Self::Mine => write!(f, "MINE"),
            Self::Trigger { target } => write!(f, "TRIGGER {target}"),
        }
    }
}

/// Parses a pipe-delimited order line, skipping tokens that are not orders.
#[must_use]
pub fn parse_orders(line: &str) -> Vec<Order> {
    line.split('|').filter_map(Order::parse).collect()
}

/// Outcome of our own sonar probe, reported at the start of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SonarResult {
    /// The opponent is inside the probed region (`Y`).
    Found,
    /// The opponent is outside the probed region (`N`).
    Missed,
    /// No probe was issued last turn (`NA`).
    Unavailable,
}

impl SonarResult {
    /// Parses the protocol token; anything unrecognised reads as unavailable.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "Y" => Self::Found,
            "N" => Self::Missed,
            _ => Self::Unavailable,
        }
    }
}

fn parse_region(word: &str) -> Option<RegionId> {
    let value = word.parse::<u32>().ok()?;
    (value > 0).then(|| RegionId::new(value))
}

fn parse_coordinate(x: &str, y: &str) -> Option<Coordinate> {
    Some(Coordinate::new(x.parse().ok()?, y.parse().ok()?))
}
