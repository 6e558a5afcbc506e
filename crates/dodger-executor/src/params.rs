use std::time::Duration;

use dodger_core::{ManeuverKind, ManeuverTable, ManeuverTiming};

/// The live, adaptable maneuver timings.
///
/// Starts from the configured table. Side holds only ever grow, one step at a
/// time, and never past their kind's ceiling. There is no reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManeuverParameters {
    table: ManeuverTable,
}

impl ManeuverParameters {
    pub fn new(table: ManeuverTable) -> Self {
        Self { table }
    }

    pub fn timing(&self, kind: ManeuverKind) -> ManeuverTiming {
        *self.table.get(kind)
    }

    pub fn table(&self) -> &ManeuverTable {
        &self.table
    }

    /// Lengthen the side hold of `kind` by `step`, clamped to its ceiling.
    /// Kinds without a ceiling are left alone. Returns the new side hold if it
    /// changed.
    pub fn lengthen_side(&mut self, kind: ManeuverKind, step: Duration) -> Option<u64> {
        let timing = self.table.get_mut(kind);
        let ceiling = timing.side_ceiling_ms?;
        let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        let lengthened = timing.side_ms.saturating_add(step_ms).min(ceiling);
        if lengthened == timing.side_ms {
            return None;
        }
        timing.side_ms = lengthened;
        Some(lengthened)
    }
}

impl Default for ManeuverParameters {
    fn default() -> Self {
        Self::new(ManeuverTable::default())
    }
}
