use serde::{Deserialize, Deserializer, Serialize};

/// A cell address in world space. The plane is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Move direction chosen by the agent for one step.
///
/// Wire format is the lowercase name. Directions the viewer does not know
/// about are kept verbatim so they still show up in the panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Other(s) => s,
        }
    }

    /// Capitalised form used in the detail dialog ("Up", "Left", ...).
    pub fn label(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for Direction {
    fn from(s: String) -> Self {
        match s.as_str() {
            "up" => Direction::Up,
            "down" => Direction::Down,
            "left" => Direction::Left,
            "right" => Direction::Right,
            _ => Direction::Other(s),
        }
    }
}

impl From<Direction> for String {
    fn from(d: Direction) -> Self {
        d.as_str().to_string()
    }
}

/// One recorded position of the agent, with the transactions that moved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub x: i32,
    pub y: i32,
    pub index: u64,
    pub direction: Direction,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub affected_transactions: Vec<String>,
}

impl HistoryEntry {
    pub fn position(&self) -> GridPoint {
        GridPoint::new(self.x, self.y)
    }

    pub fn is_at_origin(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// A transaction from the recent-inputs feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub signature: String,
    pub from: String,
    /// Lamports. Accepts a JSON number or a decimal string.
    #[serde(deserialize_with = "lamports")]
    pub amount: u64,
    /// Unix seconds; absent while the transaction is pending.
    #[serde(default)]
    pub block_time: Option<i64>,
}

pub const LAMPORTS_PER_SOL: f64 = 1e9;

impl TransactionRecord {
    /// Amount in SOL with two decimals.
    pub fn amount_sol(&self) -> String {
        format_sol(self.amount)
    }
}

fn lamports<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
        Raw::Float(v) => Err(serde::de::Error::custom(format!(
            "invalid lamport amount {v}"
        ))),
        Raw::Text(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<u64>() {
                return Ok(v);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
                _ => Err(serde::de::Error::custom(format!(
                    "invalid lamport amount {s:?}"
                ))),
            }
        }
    }
}

/// Current agent position: the last entry of the history, or the origin
/// before any history has arrived.
pub fn agent_position(history: &[HistoryEntry]) -> GridPoint {
    history
        .last()
        .map(HistoryEntry::position)
        .unwrap_or(GridPoint::ORIGIN)
}

/// How a history entry is presented relative to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The entry sits under the agent.
    Current,
    /// The origin point (world `(0,0)` or sequence index 0).
    Genesis,
    StepsAgo(usize),
}

impl EntryKind {
    /// Classify `entry` against the agent position. Current wins over
    /// genesis so an agent back at the origin still reads as "current".
    pub fn classify(entry: &HistoryEntry, agent: GridPoint, history: &[HistoryEntry]) -> Self {
        if entry.position() == agent {
            return EntryKind::Current;
        }
        if entry.is_at_origin() || entry.index == 0 {
            return EntryKind::Genesis;
        }
        let pos = history
            .iter()
            .position(|h| h.index == entry.index)
            .unwrap_or(0);
        EntryKind::StepsAgo(history.len().saturating_sub(pos))
    }

    pub fn tooltip_title(self) -> String {
        match self {
            EntryKind::Current => "Current Position".to_string(),
            EntryKind::Genesis => "Genesis Position".to_string(),
            EntryKind::StepsAgo(n) => format!("{n} steps ago"),
        }
    }

    pub fn dialog_title(self) -> String {
        match self {
            EntryKind::Current => "Current Worm Position".to_string(),
            EntryKind::Genesis => "GENESIS Position".to_string(),
            EntryKind::StepsAgo(n) => format!("{n} steps ago"),
        }
    }
}

/// `abcd...wxyz` form of a signature or address. Strings of eight
/// characters or fewer are returned unchanged.
pub fn shorten_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() <= 8 {
        return hash.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Coarse relative time: "12s ago", "5m ago", "3h ago".
pub fn time_ago(elapsed_ms: i64) -> String {
    let secs = elapsed_ms.max(0) / 1000;
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = elapsed_ms / 60_000;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    format!("{}h ago", elapsed_ms / 3_600_000)
}

pub fn format_sol(lamports: u64) -> String {
    format!("{:.2}", lamports as f64 / LAMPORTS_PER_SOL)
}

/// Block-explorer link for a transaction signature.
pub fn explorer_url(base: &str, signature: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), signature)
}
