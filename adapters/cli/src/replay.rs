//! Offline inputs for the command line adapter: startup maps and recorded
//! opponent turns.

use std::{error::Error, fmt};

use sonar_hunt_core::{parse_orders, Coordinate, Order, RegionId, SonarResult};
use sonar_hunt_world::{Grid, GridError};

const COMMENT_PREFIX: char = '#';

/// Startup block of the turn protocol: `width height playerId` followed by
/// one terrain row per line.
#[derive(Clone, Debug)]
pub(crate) struct StartupMap {
    /// Parsed navigable map.
    pub(crate) grid: Grid,
    /// Identifier the referee assigned to us.
    pub(crate) player_id: u32,
}

impl StartupMap {
    /// Parses the startup block.
    pub(crate) fn parse(input: &str) -> Result<Self, ReplayError> {
        let mut lines = input.lines().map(str::trim).filter(|line| !line.is_empty());
        let header = lines.next().ok_or(ReplayError::EmptyMap)?;
        let mut words = header.split_whitespace();
        let width = parse_number::<u32>(words.next(), header)?;
        let height = parse_number::<u32>(words.next(), header)?;
        let player_id = parse_number::<u32>(words.next(), header)?;

        let rows: Vec<&str> = lines
            .take(usize::try_from(height).unwrap_or(usize::MAX))
            .collect();
        if u32::try_from(rows.len()).ok() != Some(height) {
            return Err(ReplayError::MissingRows {
                expected: height,
                actual: rows.len(),
            });
        }
        let grid = Grid::from_rows(&rows).map_err(ReplayError::InvalidMap)?;
        if grid.width() != width {
            return Err(ReplayError::WidthMismatch {
                expected: width,
                actual: grid.width(),
            });
        }
        Ok(Self { grid, player_id })
    }
}

/// One recorded event of the replay script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ReplayEvent {
    /// `turn <opponent life> <orders>`: the opponent's orders as announced
    /// together with its life reading at the start of our turn.
    Turn {
        /// Opponent life reading.
        opponent_life: u32,
        /// Orders announced by the opponent.
        orders: Vec<Order>,
    },
    /// `sonar <region> <Y|N|NA>`: result of our own sonar.
    Sonar {
        /// Region we scanned.
        region: RegionId,
        /// Reported result.
        result: SonarResult,
    },
    /// `attack <x> <y> <life lost>`: outcome of our own torpedo or mine.
    Attack {
        /// Impact cell.
        target: Coordinate,
        /// Life the opponent lost because of it.
        life_lost: u32,
    },
}

impl ReplayEvent {
    /// Parses a single non-comment script line.
    pub(crate) fn parse(line: &str) -> Result<Self, ReplayError> {
        let (keyword, rest) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| ReplayError::MalformedLine(line.to_owned()))?;
        let rest = rest.trim();
        match keyword {
            "turn" => {
                let (life, orders) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Ok(Self::Turn {
                    opponent_life: parse_number(Some(life), line)?,
                    orders: parse_orders(orders),
                })
            }
            "sonar" => {
                let mut words = rest.split_whitespace();
                let region = parse_number::<u32>(words.next(), line)?;
                if region == 0 {
                    return Err(ReplayError::MalformedLine(line.to_owned()));
                }
                let result = words
                    .next()
                    .map(SonarResult::parse)
                    .ok_or_else(|| ReplayError::MalformedLine(line.to_owned()))?;
                Ok(Self::Sonar {
                    region: RegionId::new(region),
                    result,
                })
            }
            "attack" => {
                let mut words = rest.split_whitespace();
                let x = parse_number::<i32>(words.next(), line)?;
                let y = parse_number::<i32>(words.next(), line)?;
                let life_lost = parse_number::<u32>(words.next(), line)?;
                Ok(Self::Attack {
                    target: Coordinate::new(x, y),
                    life_lost,
                })
            }
            other => Err(ReplayError::UnknownKeyword(other.to_owned())),
        }
    }
}

/// Parses a whole replay script, skipping blank lines and `#` comments.
pub(crate) fn parse_script(input: &str) -> Result<Vec<ReplayEvent>, ReplayError> {
    input
        .lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
        .map(|(number, line)| {
            ReplayEvent::parse(line).map_err(|error| ReplayError::AtLine {
                line: number,
                source: Box::new(error),
            })
        })
        .collect()
}

/// Errors emitted while reading maps or replay scripts.
#[derive(Debug)]
pub(crate) enum ReplayError {
    /// The map file holds no header line.
    EmptyMap,
    /// Fewer terrain rows than the header announced.
    MissingRows {
        /// Rows announced by the header.
        expected: u32,
        /// Rows found in the file.
        actual: usize,
    },
    /// The terrain rows are narrower or wider than the header announced.
    WidthMismatch {
        /// Width announced by the header.
        expected: u32,
        /// Width of the terrain rows.
        actual: u32,
    },
    /// The terrain rows do not form a valid grid.
    InvalidMap(GridError),
    /// A line is missing fields or holds an unparsable number.
    MalformedLine(String),
    /// A script line starts with an unsupported keyword.
    UnknownKeyword(String),
    /// Wraps an error with the one-based script line it occurred on.
    AtLine {
        /// Offending line number.
        line: usize,
        /// Underlying error.
        source: Box<ReplayError>,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMap => write!(f, "map file is empty"),
            Self::MissingRows { expected, actual } => {
                write!(f, "map announces {expected} rows but holds {actual}")
            }
            Self::WidthMismatch { expected, actual } => {
                write!(f, "map announces {expected} columns but rows hold {actual}")
            }
            Self::InvalidMap(error) => write!(f, "could not build grid: {error}"),
            Self::MalformedLine(line) => write!(f, "could not parse '{line}'"),
            Self::UnknownKeyword(keyword) => write!(f, "unknown script keyword '{keyword}'"),
            Self::AtLine { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl Error for ReplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMap(error) => Some(error),
            Self::AtLine { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

fn parse_number<T>(word: Option<&str>, line: &str) -> Result<T, ReplayError>
where
    T: std::str::FromStr,
{
    word.and_then(|word| word.parse::<T>().ok())
        .ok_or_else(|| ReplayError::MalformedLine(line.to_owned()))
}
