//! Report view: display-ready data derived from a `RankedReport`.
//!
//! Nothing here re-ranks or re-identifies candidates; it only shapes the
//! aggregator's output for rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::aggregator::RankedReport;
use crate::models::ScoredCandidate;

/// Skills shown on each candidate card.
pub const CARD_SKILL_LIMIT: usize = 30;
/// Skills shown in the report header.
pub const SUMMARY_SKILL_LIMIT: usize = 20;

const CARD_JUSTIFICATION_FALLBACK: &str = "No justification provided.";
const SUMMARY_JUSTIFICATION_FALLBACK: &str = "No AI justification available.";

/// Per-dimension effective scores, all on the 0–10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub overall: f64,
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

impl ScoreBreakdown {
    pub fn of(candidate: &ScoredCandidate) -> Self {
        Self {
            overall: candidate.effective_overall_score(),
            skills: candidate.effective_skills_score(),
            experience: candidate.effective_experience_score(),
            education: candidate.effective_education_score(),
        }
    }

    /// Radar chart axes: technical skills, experience, education, overall.
    pub fn radar_points(&self) -> [f64; 4] {
        [self.skills, self.experience, self.education, self.overall]
    }

    pub fn project_quality(&self) -> f64 {
        (self.experience + self.education) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateCard {
    pub rank: usize,
    pub display_name: String,
    pub contact_line: String,
    pub scores: ScoreBreakdown,
    pub skills: Vec<String>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub justification: String,
}

impl CandidateCard {
    pub fn new(rank: usize, candidate: &ScoredCandidate) -> Self {
        Self {
            rank,
            display_name: display_name(candidate),
            contact_line: format!(
                "{} • {}",
                candidate.email.as_deref().unwrap_or(""),
                candidate.phone.as_deref().unwrap_or("")
            ),
            scores: ScoreBreakdown::of(candidate),
            skills: truncated(&candidate.skills, CARD_SKILL_LIMIT),
            strengths: candidate.strengths.clone(),
            gaps: candidate.gaps.clone(),
            justification: justification_or(candidate, CARD_JUSTIFICATION_FALLBACK),
        }
    }
}

/// Header block describing the top-ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub scores: ScoreBreakdown,
    pub skills: Vec<String>,
    pub justification: String,
}

impl ReportSummary {
    pub fn from_report(report: &RankedReport) -> Option<Self> {
        let top = report.top()?;
        Some(Self {
            candidate_name: non_blank(top.candidate_name.as_deref()),
            email: non_blank(top.email.as_deref()),
            scores: ScoreBreakdown::of(top),
            skills: truncated(&top.skills, SUMMARY_SKILL_LIMIT),
            justification: justification_or(top, SUMMARY_JUSTIFICATION_FALLBACK),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub summary: Option<ReportSummary>,
    pub cards: Vec<CandidateCard>,
}

impl ReportView {
    pub fn build(report: &RankedReport) -> Self {
        Self {
            summary: ReportSummary::from_report(report),
            cards: report
                .iter()
                .enumerate()
                .map(|(i, candidate)| CandidateCard::new(i + 1, candidate))
                .collect(),
        }
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let Some(summary) = &self.summary else {
            out.push_str("No candidates were shortlisted.\n");
            return out;
        };

        let _ = writeln!(out, "Candidate Report");
        let _ = writeln!(
            out,
            "{} • {}    Overall Match {}",
            summary.candidate_name.as_deref().unwrap_or("Candidate Name"),
            summary.email.as_deref().unwrap_or("email@example.com"),
            format_score(summary.scores.overall)
        );
        write_breakdown(&mut out, &summary.scores);
        if !summary.skills.is_empty() {
            let _ = writeln!(out, "Extracted Skills: {}", summary.skills.join(", "));
        }
        let _ = writeln!(out, "AI-Generated Justification: {}", summary.justification);

        for card in &self.cards {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "#{} {}    {}",
                card.rank,
                card.display_name,
                format_score(card.scores.overall)
            );
            let _ = writeln!(out, "  {}", card.contact_line);
            out.push_str("  ");
            write_breakdown(&mut out, &card.scores);
            if !card.skills.is_empty() {
                let _ = writeln!(out, "  Skills: {}", card.skills.join(", "));
            }
            write_list(&mut out, "Key Strengths", &card.strengths);
            write_list(&mut out, "Areas for Growth", &card.gaps);
            let _ = writeln!(out, "  Justification: {}", card.justification);
        }

        out
    }
}

/// Formats a 0–10 score the way the report shows it, e.g. `7.5/10`.
pub fn format_score(score: f64) -> String {
    format!("{score:.1}/10")
}

fn write_breakdown(out: &mut String, scores: &ScoreBreakdown) {
    let _ = writeln!(
        out,
        "Skill Match {} | Experience Fit {} | Education {}",
        format_score(scores.skills),
        format_score(scores.experience),
        format_score(scores.education)
    );
}

fn write_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {title}:");
    for item in items {
        let _ = writeln!(out, "    - {item}");
    }
}

fn display_name(candidate: &ScoredCandidate) -> String {
    non_blank(candidate.candidate_name.as_deref()).unwrap_or_else(|| candidate.filename.clone())
}

fn justification_or(candidate: &ScoredCandidate, fallback: &str) -> String {
    non_blank(candidate.justification.as_deref()).unwrap_or_else(|| fallback.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn truncated(items: &[String], limit: usize) -> Vec<String> {
    items.iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::reduce;

    fn candidate(name: &str, overall: f64) -> ScoredCandidate {
        ScoredCandidate {
            filename: format!("{}.pdf", name.to_lowercase()),
            candidate_name: Some(name.to_string()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            overall_score: Some(overall),
            skills_score: Some(8.0),
            experience_score: Some(6.0),
            education_score: Some(9.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_score_one_decimal() {
        assert_eq!(format_score(7.0), "7.0/10");
        assert_eq!(format_score(8.456), "8.5/10");
        assert_eq!(format_score(0.0), "0.0/10");
    }

    #[test]
    fn test_radar_points_order_and_project_quality() {
        let scores = ScoreBreakdown::of(&candidate("Ada", 7.5));
        assert_eq!(scores.radar_points(), [8.0, 6.0, 9.0, 7.5]);
        assert_eq!(scores.project_quality(), 7.5);
    }

    #[test]
    fn test_missing_scores_render_as_zero() {
        let scores = ScoreBreakdown::of(&ScoredCandidate::default());
        assert_eq!(scores.radar_points(), [0.0; 4]);
    }

    #[test]
    fn test_card_falls_back_to_filename_and_default_justification() {
        let c = ScoredCandidate {
            filename: "resume_17.pdf".to_string(),
            candidate_name: Some(String::new()),
            ..Default::default()
        };
        let card = CandidateCard::new(1, &c);
        assert_eq!(card.display_name, "resume_17.pdf");
        assert_eq!(card.contact_line, " • ");
        assert_eq!(card.justification, "No justification provided.");
    }

    #[test]
    fn test_card_skills_truncated_but_model_untouched() {
        let mut c = candidate("Ada", 7.0);
        c.skills = (0..45).map(|i| format!("skill-{i}")).collect();

        let card = CandidateCard::new(1, &c);
        assert_eq!(card.skills.len(), CARD_SKILL_LIMIT);
        assert_eq!(c.skills.len(), 45);
    }

    #[test]
    fn test_summary_uses_top_ranked_candidate() {
        let mut top = candidate("Grace", 9.1);
        top.skills = (0..25).map(|i| format!("s{i}")).collect();
        let report = reduce(&[candidate("Ada", 7.0), top]);

        let summary = ReportSummary::from_report(&report).unwrap();
        assert_eq!(summary.candidate_name.as_deref(), Some("Grace"));
        assert_eq!(summary.skills.len(), SUMMARY_SKILL_LIMIT);
        assert_eq!(summary.justification, "No AI justification available.");
    }

    #[test]
    fn test_empty_report_has_no_summary() {
        let view = ReportView::build(&reduce(&[]));
        assert!(view.summary.is_none());
        assert!(view.cards.is_empty());
        assert_eq!(view.render_text(), "No candidates were shortlisted.\n");
    }

    #[test]
    fn test_cards_follow_rank_order() {
        let view = ReportView::build(&reduce(&[candidate("Ada", 7.0), candidate("Grace", 9.0)]));
        let ranked: Vec<_> = view
            .cards
            .iter()
            .map(|c| (c.rank, c.display_name.as_str()))
            .collect();
        assert_eq!(ranked, vec![(1, "Grace"), (2, "Ada")]);
    }

    #[test]
    fn test_render_text_mentions_each_candidate() {
        let mut ada = candidate("Ada", 7.0);
        ada.strengths = vec!["Systems design".to_string()];
        ada.gaps = vec!["Kubernetes".to_string()];
        let text = ReportView::build(&reduce(&[ada, candidate("Grace", 9.0)])).render_text();

        assert!(text.starts_with("Candidate Report\n"));
        assert!(text.contains("#1 Grace    9.0/10"));
        assert!(text.contains("#2 Ada    7.0/10"));
        assert!(text.contains("Key Strengths:\n    - Systems design"));
        assert!(text.contains("Areas for Growth:\n    - Kubernetes"));
    }
}
