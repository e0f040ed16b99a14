//! Welcome email text

use crate::schedule::Schedule;

/// Body of the one-time welcome email
pub fn welcome_body(schedule: &Schedule) -> String {
    format!(
        "Welcome to the daily reddit questions pipeline!\n\n\
         This pipe will send you a daily list of reddit questions based on your screen data.\n\
         {}",
        schedule.describe()
    )
}
