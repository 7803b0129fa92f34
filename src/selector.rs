use crate::error::StandingsError;
use crate::schema::{CompetitionMode, CompetitionSchema, schema_for};
use crate::standings::PresentationOrdering;

/// Holds what is selected. Reacting to a change (header rebuild, re-fetch)
/// is left to the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSelector {
    mode: CompetitionMode,
    ordering: PresentationOrdering,
    degrade_on_export: bool,
}

impl Default for ModeSelector {
    fn default() -> Self {
        Self::new(CompetitionMode::default())
    }
}

impl ModeSelector {
    pub fn new(mode: CompetitionMode) -> Self {
        Self {
            mode,
            ordering: PresentationOrdering::Ranked,
            degrade_on_export: true,
        }
    }

    /// Whether an export switches ordering to `SourceOrder`.
    pub fn with_degrade_on_export(mut self, enabled: bool) -> Self {
        self.degrade_on_export = enabled;
        self
    }

    pub fn current_mode(&self) -> CompetitionMode {
        self.mode
    }

    pub fn schema(&self) -> CompetitionSchema {
        schema_for(self.mode)
    }

    /// Returns true when the mode actually changed.
    pub fn set_mode(&mut self, mode: CompetitionMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn set_mode_code(&mut self, code: &str) -> Result<bool, StandingsError> {
        let mode = code.parse::<CompetitionMode>()?;
        Ok(self.set_mode(mode))
    }

    pub fn toggle_mode(&mut self) -> CompetitionMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn ordering(&self) -> PresentationOrdering {
        self.ordering
    }

    pub fn set_ordering(&mut self, ordering: PresentationOrdering) {
        self.ordering = ordering;
    }

    pub fn degrades_on_export(&self) -> bool {
        self.degrade_on_export
    }

    /// Export hook: `Ranked -> SourceOrder`, never back. Returns true when the
    /// ordering changed.
    pub fn note_export(&mut self) -> bool {
        if !self.degrade_on_export || self.ordering == PresentationOrdering::SourceOrder {
            return false;
        }
        self.ordering = PresentationOrdering::SourceOrder;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ranked_decathlon() {
        let sel = ModeSelector::default();
        assert_eq!(sel.current_mode(), CompetitionMode::Decathlon);
        assert_eq!(sel.ordering(), PresentationOrdering::Ranked);
        assert_eq!(sel.schema().len(), 10);
    }

    #[test]
    fn export_degrades_once_and_stays_degraded() {
        let mut sel = ModeSelector::default();
        assert!(sel.note_export());
        assert!(!sel.note_export());
        assert_eq!(sel.ordering(), PresentationOrdering::SourceOrder);
        sel.toggle_mode();
        assert_eq!(sel.ordering(), PresentationOrdering::SourceOrder);
    }

    #[test]
    fn export_keeps_ranking_when_opted_out() {
        let mut sel = ModeSelector::default().with_degrade_on_export(false);
        assert!(!sel.degrades_on_export());
        assert!(!sel.note_export());
        assert_eq!(sel.ordering(), PresentationOrdering::Ranked);
    }

    #[test]
    fn set_mode_code_rejects_unknown_and_keeps_mode() {
        let mut sel = ModeSelector::new(CompetitionMode::Heptathlon);
        let err = sel.set_mode_code("XYZ").unwrap_err();
        assert_eq!(err, StandingsError::UnknownMode("XYZ".to_string()));
        assert_eq!(sel.current_mode(), CompetitionMode::Heptathlon);
        assert!(sel.set_mode_code("DEC").unwrap());
        assert!(!sel.set_mode_code("dec").unwrap());
    }
}
