//! Schedule-expression parsing behind a capability interface.
//!
//! The scheduler never touches the `cron` crate directly; it asks a
//! [`SchedulePlanner`] for a [`FirePlan`] and walks fire instants from there.
//! Substituting a different expression dialect means swapping the planner,
//! nothing else.

use std::str::FromStr;

use chrono::{DateTime, Local, Utc};

use crate::error::{EngineError, Result};

/// A recurring point-in-time plan produced from one schedule expression.
pub trait FirePlan: Send + Sync {
    /// The next instant strictly after `after` at which the plan fires, or
    /// `None` when the plan is exhausted.
    fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Parses schedule expressions into fire plans.
pub trait SchedulePlanner: Send + Sync {
    fn parse(&self, expression: &str) -> Result<Box<dyn FirePlan>>;
}

/// Default planner over standard cron expressions.
///
/// Accepts the classic five-field form (minute hour day-of-month month
/// day-of-week) and the six-field form with a leading seconds field.
/// Expressions are evaluated in local time, matching what an operator
/// writing `0 9 * * *` expects.
pub struct CronPlanner;

impl SchedulePlanner for CronPlanner {
    fn parse(&self, expression: &str) -> Result<Box<dyn FirePlan>> {
        let normalized = match expression.split_whitespace().count() {
            // Standard cron has no seconds field; pin it to zero.
            5 => format!("0 {}", expression.trim()),
            6 => expression.trim().to_string(),
            n => {
                return Err(EngineError::InvalidSchedule(format!(
                    "expected 5 or 6 fields, got {n}"
                )))
            }
        };

        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| EngineError::InvalidSchedule(e.to_string()))?;

        Ok(Box::new(CronPlan { schedule }))
    }
}

struct CronPlan {
    schedule: cron::Schedule,
}

impl FirePlan for CronPlan {
    fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&Local))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }
}
