//! Per-construct lifecycle tracking.
//!
//! ```text
//! Matched -> Parsed -> Resolved -> Lowered -> Spliced
//!    \          \          \
//!     +----------+----------+--> Rejected
//! ```

use serde::Serialize;
use tbind_common::span::Span;
use tbind_hir::{ConstructForm, ConstructId};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructState {
    /// The parser produced a construct node.
    Matched,
    /// Marker validated and step list split.
    Parsed,
    /// Synthetic name allocated and every reference resolved.
    Resolved,
    /// Replacement code built.
    Lowered,
    /// Replacement placed in the tree. Terminal.
    Spliced,
    /// A fatal diagnostic was reported. Terminal.
    Rejected,
}

impl ConstructState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConstructState::Spliced | ConstructState::Rejected)
    }

    fn can_advance_to(self, next: ConstructState) -> bool {
        use ConstructState::*;
        matches!(
            (self, next),
            (Matched, Parsed)
                | (Parsed, Resolved)
                | (Resolved, Lowered)
                | (Lowered, Spliced)
                | (Matched | Parsed | Resolved | Lowered, Rejected)
        )
    }
}

/// What the engine did with one construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructReport {
    pub id: ConstructId,
    pub form: ConstructForm,
    pub span: Span,
    /// Surface binding identifier, once the marker is validated.
    pub binding: Option<String>,
    /// Allocated synthetic name, once resolution starts.
    pub synthetic: Option<String>,
    pub state: ConstructState,
}

/// Every construct of a unit, indexed by `ConstructId`.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    reports: Vec<ConstructReport>,
}

impl Ledger {
    /// Register a newly matched construct; ids follow discovery order.
    pub(crate) fn matched(&mut self, form: ConstructForm, span: Span) -> ConstructId {
        let id = ConstructId(self.reports.len() as u32);
        debug!(construct = %id, ?form, start = span.start, "matched");
        self.reports.push(ConstructReport {
            id,
            form,
            span,
            binding: None,
            synthetic: None,
            state: ConstructState::Matched,
        });
        id
    }

    pub(crate) fn advance(&mut self, id: ConstructId, next: ConstructState) {
        let Some(report) = self.reports.get_mut(id.0 as usize) else {
            return;
        };
        debug_assert!(
            report.state.can_advance_to(next),
            "construct {id}: illegal transition {:?} -> {:?}",
            report.state,
            next
        );
        debug!(construct = %id, from = ?report.state, to = ?next, "state");
        report.state = next;
    }

    pub(crate) fn set_binding(&mut self, id: ConstructId, binding: &str) {
        if let Some(report) = self.reports.get_mut(id.0 as usize) {
            report.binding = Some(binding.to_string());
        }
    }

    pub(crate) fn set_synthetic(&mut self, id: ConstructId, synthetic: &str) {
        if let Some(report) = self.reports.get_mut(id.0 as usize) {
            report.synthetic = Some(synthetic.to_string());
        }
    }

    pub(crate) fn into_reports(self) -> Vec<ConstructReport> {
        self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        use ConstructState::*;
        let path = [Matched, Parsed, Resolved, Lowered, Spliced];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert!(Spliced.is_terminal());
    }

    #[test]
    fn terminal_states_do_not_move() {
        use ConstructState::*;
        assert!(!Spliced.can_advance_to(Rejected));
        assert!(!Rejected.can_advance_to(Parsed));
        assert!(!Matched.can_advance_to(Lowered));
    }

    #[test]
    fn ids_follow_discovery_order() {
        let mut ledger = Ledger::default();
        let a = ledger.matched(ConstructForm::Declaration, Span::new(0, 4));
        let b = ledger.matched(ConstructForm::Expression, Span::new(2, 3));
        assert_eq!((a, b), (ConstructId(0), ConstructId(1)));
        ledger.advance(b, ConstructState::Rejected);
        let reports = ledger.into_reports();
        assert_eq!(reports[0].state, ConstructState::Matched);
        assert_eq!(reports[1].state, ConstructState::Rejected);
    }
}
