use crate::models::AuditTotals;

/// Audit amounts split into what was done for others and what was received.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditBreakdown {
    pub ratio: Option<f64>,
    pub total_done: f64,
    pub bonus: f64,
    /// `total_done` without the bonus.
    pub done: f64,
    pub received: f64,
}

pub fn breakdown(totals: &AuditTotals) -> AuditBreakdown {
    let total_done = totals.total_up.unwrap_or(0.0);
    let bonus = totals.total_up_bonus.unwrap_or(0.0);
    AuditBreakdown {
        ratio: totals.audit_ratio,
        total_done,
        bonus,
        done: total_done - bonus,
        received: totals.total_down.unwrap_or(0.0),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditCounts {
    pub succeeded: u64,
    pub failed: u64,
}

impl AuditCounts {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.succeeded as f64 / total as f64 * 100.0),
        }
    }

    /// One decimal place, or `"0"` when no audit has been closed yet.
    pub fn success_rate_label(&self) -> String {
        self.success_rate()
            .map(|rate| format!("{rate:.1}"))
            .unwrap_or_else(|| "0".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_uses_one_decimal() {
        let counts = AuditCounts {
            succeeded: 7,
            failed: 3,
        };
        assert_eq!(counts.total(), 10);
        assert_eq!(counts.success_rate_label(), "70.0");

        let thirds = AuditCounts {
            succeeded: 1,
            failed: 2,
        };
        assert_eq!(thirds.success_rate_label(), "33.3");
    }

    #[test]
    fn zero_audits_render_zero() {
        let counts = AuditCounts::default();
        assert_eq!(counts.success_rate(), None);
        assert_eq!(counts.success_rate_label(), "0");
    }

    #[test]
    fn breakdown_removes_bonus_from_done() {
        let totals = AuditTotals {
            audit_ratio: Some(1.3),
            total_up: Some(1_300_000.0),
            total_down: Some(1_000_000.0),
            total_up_bonus: Some(100_000.0),
        };
        let breakdown = breakdown(&totals);
        assert_eq!(breakdown.done, 1_200_000.0);
        assert_eq!(breakdown.received, 1_000_000.0);
        assert_eq!(breakdown.total_done, 1_300_000.0);
    }

    #[test]
    fn missing_totals_degrade_to_zero() {
        let breakdown = breakdown(&AuditTotals::default());
        assert_eq!(breakdown.ratio, None);
        assert_eq!(breakdown.done, 0.0);
        assert_eq!(breakdown.received, 0.0);
    }
}
