// Expansion state - presentational per-session flags
use std::collections::HashSet;

/// Which reports and charts are expanded. An id that is absent is collapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    reports: HashSet<String>,
    charts: HashSet<String>,
}

impl ExpansionState {
    /// Flips a report and returns whether it is now expanded.
    pub fn toggle_report(&mut self, report_id: &str) -> bool {
        toggle(&mut self.reports, report_id)
    }

    pub fn toggle_chart(&mut self, chart_id: &str) -> bool {
        toggle(&mut self.charts, chart_id)
    }

    pub fn is_report_expanded(&self, report_id: &str) -> bool {
        self.reports.contains(report_id)
    }

    pub fn is_chart_expanded(&self, chart_id: &str) -> bool {
        self.charts.contains(chart_id)
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}
