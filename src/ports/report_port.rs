//! Report generation port trait.

use crate::domain::dashboard::Dashboard;
use crate::domain::error::JournalError;

/// Port for writing dashboard reports.
pub trait ReportPort {
    /// Render the dashboard to a string without touching the filesystem.
    fn render(&self, dashboard: &Dashboard) -> Result<String, JournalError>;

    fn write(&self, dashboard: &Dashboard, output_path: &str) -> Result<(), JournalError> {
        let content = self.render(dashboard)?;
        std::fs::write(output_path, content).map_err(|e| JournalError::Report {
            reason: format!("failed to write {output_path}: {e}"),
        })
    }
}
