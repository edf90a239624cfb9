//! Transparency score arithmetic. Pure, no I/O.
//!
//! Every organization starts at 50 and moves by a fixed amount per event.
//! The score is clamped to [0, 100] after each step, so replaying the same
//! events in order always yields the same score.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum score required to open a new campaign
pub const CAMPAIGN_CREATION_THRESHOLD: i64 = 40;

pub fn initial_score() -> Decimal {
    Decimal::from(50)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreEvent {
    InitialScore,
    EvidenceApprovedOnTime,
    EvidenceApprovedLate,
    EvidenceApprovedAfterDeadline,
    CampaignCompleted,
    MonthlyConsistencyBonus,
    EvidenceRejected,
    EvidenceDeadlineMissed,
    EvidenceLateUpload,
    CampaignCancelled,
    ReportUpheld,
}

impl ScoreEvent {
    pub fn change_amount(&self) -> Decimal {
        let amount: i64 = match self {
            ScoreEvent::InitialScore => 50,
            ScoreEvent::EvidenceApprovedOnTime => 5,
            ScoreEvent::EvidenceApprovedLate => 3,
            ScoreEvent::EvidenceApprovedAfterDeadline => 2,
            ScoreEvent::CampaignCompleted => 3,
            ScoreEvent::MonthlyConsistencyBonus => 1,
            ScoreEvent::EvidenceRejected => -5,
            ScoreEvent::EvidenceDeadlineMissed => -10,
            ScoreEvent::EvidenceLateUpload => -3,
            ScoreEvent::CampaignCancelled => -2,
            ScoreEvent::ReportUpheld => -15,
        };
        Decimal::from(amount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreEvent::InitialScore => "INITIAL_SCORE",
            ScoreEvent::EvidenceApprovedOnTime => "EVIDENCE_APPROVED_ON_TIME",
            ScoreEvent::EvidenceApprovedLate => "EVIDENCE_APPROVED_LATE",
            ScoreEvent::EvidenceApprovedAfterDeadline => "EVIDENCE_APPROVED_AFTER_DEADLINE",
            ScoreEvent::CampaignCompleted => "CAMPAIGN_COMPLETED",
            ScoreEvent::MonthlyConsistencyBonus => "MONTHLY_CONSISTENCY_BONUS",
            ScoreEvent::EvidenceRejected => "EVIDENCE_REJECTED",
            ScoreEvent::EvidenceDeadlineMissed => "EVIDENCE_DEADLINE_MISSED",
            ScoreEvent::EvidenceLateUpload => "EVIDENCE_LATE_UPLOAD",
            ScoreEvent::CampaignCancelled => "CAMPAIGN_CANCELLED",
            ScoreEvent::ReportUpheld => "REPORT_UPHELD",
        }
    }

    /// Counter deltas this event contributes
    pub fn counter_delta(&self) -> ScoreCounters {
        let mut delta = ScoreCounters::default();
        match self {
            ScoreEvent::EvidenceApprovedOnTime => {
                delta.approved_evidences = 1;
                delta.on_time_reports = 1;
            }
            ScoreEvent::EvidenceApprovedLate | ScoreEvent::EvidenceApprovedAfterDeadline => {
                delta.approved_evidences = 1;
                delta.late_reports = 1;
            }
            ScoreEvent::EvidenceRejected => delta.rejected_evidences = 1,
            ScoreEvent::EvidenceLateUpload | ScoreEvent::EvidenceDeadlineMissed => {
                delta.late_reports = 1
            }
            ScoreEvent::CampaignCompleted => delta.completed_campaigns = 1,
            ScoreEvent::InitialScore
            | ScoreEvent::MonthlyConsistencyBonus
            | ScoreEvent::CampaignCancelled
            | ScoreEvent::ReportUpheld => {}
        }
        delta
    }
}

impl std::fmt::Display for ScoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScoreEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let event = match s {
            "INITIAL_SCORE" => ScoreEvent::InitialScore,
            "EVIDENCE_APPROVED_ON_TIME" => ScoreEvent::EvidenceApprovedOnTime,
            "EVIDENCE_APPROVED_LATE" => ScoreEvent::EvidenceApprovedLate,
            "EVIDENCE_APPROVED_AFTER_DEADLINE" => ScoreEvent::EvidenceApprovedAfterDeadline,
            "CAMPAIGN_COMPLETED" => ScoreEvent::CampaignCompleted,
            "MONTHLY_CONSISTENCY_BONUS" => ScoreEvent::MonthlyConsistencyBonus,
            "EVIDENCE_REJECTED" => ScoreEvent::EvidenceRejected,
            "EVIDENCE_DEADLINE_MISSED" => ScoreEvent::EvidenceDeadlineMissed,
            "EVIDENCE_LATE_UPLOAD" => ScoreEvent::EvidenceLateUpload,
            "CAMPAIGN_CANCELLED" => ScoreEvent::CampaignCancelled,
            "REPORT_UPHELD" => ScoreEvent::ReportUpheld,
            _ => return Err(anyhow::anyhow!("Unknown score event: {}", s)),
        };
        Ok(event)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreCounters {
    pub completed_campaigns: i32,
    pub on_time_reports: i32,
    pub late_reports: i32,
    pub approved_evidences: i32,
    pub rejected_evidences: i32,
}

impl ScoreCounters {
    pub fn add(&mut self, other: ScoreCounters) {
        self.completed_campaigns += other.completed_campaigns;
        self.on_time_reports += other.on_time_reports;
        self.late_reports += other.late_reports;
        self.approved_evidences += other.approved_evidences;
        self.rejected_evidences += other.rejected_evidences;
    }
}

pub fn clamp(score: Decimal) -> Decimal {
    score.max(Decimal::ZERO).min(Decimal::from(100))
}

/// Score after applying one event to `current`.
pub fn apply(current: Decimal, event: ScoreEvent) -> Decimal {
    clamp(current + event.change_amount()).round_dp(2)
}

/// Rebuilds score and counters from an ordered event log. `INITIAL_SCORE`
/// entries are skipped since every replay already starts at 50.
pub fn replay<I>(events: I) -> (Decimal, ScoreCounters)
where
    I: IntoIterator<Item = ScoreEvent>,
{
    let mut score = initial_score();
    let mut counters = ScoreCounters::default();
    for event in events {
        if event == ScoreEvent::InitialScore {
            continue;
        }
        score = apply(score, event);
        counters.add(event.counter_delta());
    }
    (score, counters)
}

/// Turkish display label for a score
pub fn level(score: Decimal) -> &'static str {
    if score >= Decimal::from(80) {
        "Çok Yüksek"
    } else if score >= Decimal::from(60) {
        "Yüksek"
    } else if score >= Decimal::from(40) {
        "Orta"
    } else if score >= Decimal::from(30) {
        "Düşük"
    } else {
        "Çok Düşük"
    }
}

pub fn meets_campaign_threshold(score: Decimal) -> bool {
    score >= Decimal::from(CAMPAIGN_CREATION_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn events_move_the_score_by_their_table_amount() {
        assert_eq!(apply(d(50), ScoreEvent::EvidenceApprovedOnTime), d(55));
        assert_eq!(apply(d(50), ScoreEvent::EvidenceApprovedLate), d(53));
        assert_eq!(apply(d(50), ScoreEvent::EvidenceDeadlineMissed), d(40));
        assert_eq!(apply(d(50), ScoreEvent::ReportUpheld), d(35));
        assert_eq!(apply(d(50), ScoreEvent::CampaignCancelled), d(48));
    }

    #[test]
    fn score_is_clamped_to_bounds() {
        assert_eq!(apply(d(98), ScoreEvent::EvidenceApprovedOnTime), d(100));
        assert_eq!(apply(d(4), ScoreEvent::EvidenceDeadlineMissed), d(0));
    }

    #[test]
    fn replay_clamps_stepwise() {
        // 50 -> 35 -> 20 -> 5 -> 0 -> 5; a plain sum would give -5 -> 0.
        let (score, _) = replay([
            ScoreEvent::ReportUpheld,
            ScoreEvent::ReportUpheld,
            ScoreEvent::ReportUpheld,
            ScoreEvent::EvidenceDeadlineMissed,
            ScoreEvent::EvidenceApprovedOnTime,
        ]);
        assert_eq!(score, d(5));
    }

    #[test]
    fn replay_ignores_initial_score_and_counts_events() {
        let (score, counters) = replay([
            ScoreEvent::InitialScore,
            ScoreEvent::CampaignCompleted,
            ScoreEvent::EvidenceApprovedOnTime,
            ScoreEvent::EvidenceApprovedLate,
            ScoreEvent::EvidenceRejected,
        ]);
        assert_eq!(score, d(56));
        assert_eq!(counters.completed_campaigns, 1);
        assert_eq!(counters.approved_evidences, 2);
        assert_eq!(counters.on_time_reports, 1);
        assert_eq!(counters.late_reports, 1);
        assert_eq!(counters.rejected_evidences, 1);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level(d(80)), "Çok Yüksek");
        assert_eq!(level(d(79)), "Yüksek");
        assert_eq!(level(d(60)), "Yüksek");
        assert_eq!(level(d(40)), "Orta");
        assert_eq!(level(d(30)), "Düşük");
        assert_eq!(level(Decimal::new(2999, 2)), "Çok Düşük");
    }

    #[test]
    fn campaign_threshold_is_forty() {
        assert!(meets_campaign_threshold(d(40)));
        assert!(!meets_campaign_threshold(Decimal::new(3999, 2)));
    }

    #[test]
    fn reason_text_round_trips() {
        for event in [
            ScoreEvent::InitialScore,
            ScoreEvent::EvidenceApprovedAfterDeadline,
            ScoreEvent::MonthlyConsistencyBonus,
            ScoreEvent::ReportUpheld,
        ] {
            assert_eq!(event.as_str().parse::<ScoreEvent>().unwrap(), event);
        }
    }
}
