pub mod backup_links;
pub mod schedule_assist;
pub mod system_note;
pub mod timestamps;

use crate::inject::feature::Feature;

/// Every feature the augmenter ships, in evaluation order.
pub fn all() -> Vec<Box<dyn Feature>> {
    vec![
        Box::new(system_note::SystemBackupNote),
        Box::new(backup_links::BackupLinks),
        Box::new(timestamps::RelativeTimestamps),
        Box::new(schedule_assist::ScheduleAssistant),
    ]
}
