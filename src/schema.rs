use std::fmt;
use std::str::FromStr;

use crate::error::StandingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompetitionMode {
    #[default]
    Decathlon,
    Heptathlon,
}

impl CompetitionMode {
    pub const ALL: [CompetitionMode; 2] = [CompetitionMode::Decathlon, CompetitionMode::Heptathlon];

    /// Wire code used in `?mode=` query strings and request bodies.
    pub fn code(self) -> &'static str {
        match self {
            CompetitionMode::Decathlon => "DEC",
            CompetitionMode::Heptathlon => "HEP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompetitionMode::Decathlon => "Decathlon",
            CompetitionMode::Heptathlon => "Heptathlon",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            CompetitionMode::Decathlon => CompetitionMode::Heptathlon,
            CompetitionMode::Heptathlon => CompetitionMode::Decathlon,
        }
    }
}

impl fmt::Display for CompetitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompetitionMode {
    type Err = StandingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("DEC") || s.eq_ignore_ascii_case("decathlon") {
            return Ok(CompetitionMode::Decathlon);
        }
        if s.eq_ignore_ascii_case("HEP") || s.eq_ignore_ascii_case("heptathlon") {
            return Ok(CompetitionMode::Heptathlon);
        }
        Err(StandingsError::UnknownMode(raw.to_string()))
    }
}

/// One scored discipline. `label` follows the "Name (unit)" convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    pub id: &'static str,
    pub label: &'static str,
}

impl EventDescriptor {
    const fn new(id: &'static str, label: &'static str) -> Self {
        Self { id, label }
    }

    /// Label without the trailing unit annotation, for table headers.
    pub fn header_label(&self) -> &'static str {
        strip_unit(self.label)
    }
}

const DECATHLON_EVENTS: [EventDescriptor; 10] = [
    EventDescriptor::new("100m", "100m (s)"),
    EventDescriptor::new("longJump", "Long Jump (cm)"),
    EventDescriptor::new("shotPut", "Shot Put (m)"),
    EventDescriptor::new("highJump", "High Jump (cm)"),
    EventDescriptor::new("400m", "400m (s)"),
    EventDescriptor::new("110mHurdles", "110m Hurdles (s)"),
    EventDescriptor::new("discus", "Discus (m)"),
    EventDescriptor::new("poleVault", "Pole Vault (cm)"),
    EventDescriptor::new("javelin", "Javelin (m)"),
    EventDescriptor::new("1500m", "1500m (s)"),
];

const HEPTATHLON_EVENTS: [EventDescriptor; 7] = [
    EventDescriptor::new("100mHurdles", "100m Hurdles (s)"),
    EventDescriptor::new("highJump", "High Jump (cm)"),
    EventDescriptor::new("shotPut", "Shot Put (m)"),
    EventDescriptor::new("200m", "200m (s)"),
    EventDescriptor::new("longJump", "Long Jump (cm)"),
    EventDescriptor::new("javelin", "Javelin (m)"),
    EventDescriptor::new("800m", "800m (s)"),
];

/// Ordered event list for one mode. The order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompetitionSchema {
    mode: CompetitionMode,
    events: &'static [EventDescriptor],
}

impl CompetitionSchema {
    pub fn mode(&self) -> CompetitionMode {
        self.mode
    }

    pub fn events(&self) -> &'static [EventDescriptor] {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event(&self, id: &str) -> Option<&'static EventDescriptor> {
        self.events.iter().find(|ev| ev.id == id)
    }
}

pub fn schema_for(mode: CompetitionMode) -> CompetitionSchema {
    let events: &'static [EventDescriptor] = match mode {
        CompetitionMode::Decathlon => &DECATHLON_EVENTS,
        CompetitionMode::Heptathlon => &HEPTATHLON_EVENTS,
    };
    CompetitionSchema { mode, events }
}

/// Registry lookup by wire code or name; anything else is `UnknownMode`.
pub fn schema_for_code(code: &str) -> Result<CompetitionSchema, StandingsError> {
    code.parse::<CompetitionMode>().map(schema_for)
}

/// `(event id, full label)` pairs for the score input picker.
pub fn input_options(schema: &CompetitionSchema) -> Vec<(&'static str, &'static str)> {
    schema.events().iter().map(|ev| (ev.id, ev.label)).collect()
}

fn strip_unit(label: &str) -> &str {
    match label.rfind(" (") {
        Some(idx) if label.ends_with(')') => &label[..idx],
        _ => label,
    }
}
