//! Terminal rendering of a reviewed resume.
//!
//! The layout follows the review page: a summary with the overall gauge and
//! four category cards, the ATS card, then the detailed tips per category.
//! Colours come from [`crate::theme`]; with `color: false` the output is
//! plain text.

use crate::feedback::{Category, Feedback, TipKind};
use crate::record::ResumeRecord;
use crate::theme::{ats_subtitle, ScoreBand, ATS_THRESHOLDS, DETAIL_THRESHOLDS, SUMMARY_THRESHOLDS};
use std::fmt::Write as _;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const BAR_WIDTH: usize = 20;

/// Output options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportStyle {
    pub color: bool,
}

impl ReportStyle {
    fn paint(&self, band: ScoreBand, text: &str) -> String {
        if self.color {
            format!("{}{}{}", band.ansi(), text, RESET)
        } else {
            text.to_string()
        }
    }

    fn wrap(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// `score`% of `width` cells filled.
pub fn progress_bar(score: u32, width: usize) -> String {
    let filled = (score.min(100) as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Full report for one record.
pub fn render_report(record: &ResumeRecord, style: ReportStyle) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style.wrap(BOLD, &format!("{} at {}", record.job_title, record.company_name))
    );
    let _ = writeln!(
        out,
        "{}",
        style.wrap(
            DIM,
            &format!("{} · {}", record.id, record.created_at.format("%Y-%m-%d %H:%M UTC"))
        )
    );
    out.push('\n');

    match record.feedback {
        Some(ref feedback) => {
            render_summary(&mut out, feedback, style);
            render_ats(&mut out, &feedback.ats, style);
            render_details(&mut out, feedback, style);
        }
        None => out.push_str("No feedback yet. The analysis did not finish.\n"),
    }
    out
}

fn render_summary(out: &mut String, feedback: &Feedback, style: ReportStyle) {
    let band = SUMMARY_THRESHOLDS.band(feedback.overall_score);
    let _ = writeln!(
        out,
        "{}  {}  {}",
        style.wrap(BOLD, "Your Resume Score"),
        style.paint(band, &format!("{}/100", feedback.overall_score)),
        style.paint(band, &progress_bar(feedback.overall_score, BAR_WIDTH)),
    );
    let _ = writeln!(
        out,
        "{}",
        style.wrap(
            DIM,
            "This score is calculated based on key performance indicators used by modern ATS systems."
        )
    );
    out.push('\n');

    for (title, category) in feedback.categories() {
        let band = SUMMARY_THRESHOLDS.band(category.score);
        let _ = writeln!(
            out,
            "  {:<14}{:>4}/100  {}",
            title,
            style.paint(band, &category.score.to_string()),
            style.paint(band, &progress_bar(category.score, BAR_WIDTH)),
        );
    }
    out.push('\n');
}

fn render_ats(out: &mut String, ats: &Category, style: ReportStyle) {
    let band = ATS_THRESHOLDS.band(ats.score);
    let _ = writeln!(
        out,
        "{} {}  {}",
        style.wrap(BOLD, "ATS Score"),
        style.paint(band, &format!("{}/100", ats.score)),
        style.paint(band, ats_subtitle(ats.score)),
    );
    let _ = writeln!(
        out,
        "{}",
        style.wrap(
            DIM,
            "How well your resume is likely to pass through Applicant Tracking Systems."
        )
    );
    for tip in &ats.tips {
        let _ = writeln!(out, "  {} {}", tip_marker(tip.kind, style), tip.tip);
    }
    out.push('\n');
}

fn render_details(out: &mut String, feedback: &Feedback, style: ReportStyle) {
    for (title, category) in feedback.categories() {
        let band = DETAIL_THRESHOLDS.band(category.score);
        let _ = writeln!(
            out,
            "{}  {}",
            style.wrap(BOLD, title),
            style.paint(band, &format!("[{}/100]", category.score)),
        );
        for tip in &category.tips {
            let _ = writeln!(out, "  {} {}", tip_marker(tip.kind, style), tip.tip);
            if let Some(ref explanation) = tip.explanation {
                let _ = writeln!(out, "      {}", explanation);
            }
        }
        out.push('\n');
    }
}

fn tip_marker(kind: TipKind, style: ReportStyle) -> String {
    let mark = match kind {
        TipKind::Good => "✔",
        TipKind::Improve => "!",
    };
    style.paint(ScoreBand::for_tip(kind), mark)
}

/// One line per record: id, date, role, score.
pub fn render_list(records: &[ResumeRecord], style: ReportStyle) -> String {
    if records.is_empty() {
        return "No resumes found.\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let score = match record.feedback {
            Some(ref f) => style.paint(
                SUMMARY_THRESHOLDS.band(f.overall_score),
                &format!("{:>3}/100", f.overall_score),
            ),
            None => style.wrap(DIM, "pending"),
        };
        let _ = writeln!(
            out,
            "{}  {}  {} at {}  {}",
            record.id,
            record.created_at.format("%Y-%m-%d"),
            record.job_title,
            record.company_name,
            score
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Tip;
    use crate::record::JobDetails;

    fn category(score: u32, tips: Vec<Tip>) -> Category {
        Category { score, tips }
    }

    fn tip(kind: TipKind, text: &str, explanation: Option<&str>) -> Tip {
        Tip {
            kind,
            tip: text.to_string(),
            explanation: explanation.map(str::to_string),
        }
    }

    fn analysed() -> ResumeRecord {
        let job = JobDetails {
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
            job_description: "Rust".into(),
        };
        let mut record = ResumeRecord::new("files/a.pdf", "files/a.png", &job);
        record.feedback = Some(Feedback {
            overall_score: 78,
            ats: category(
                72,
                vec![
                    tip(TipKind::Good, "Standard headings", None),
                    tip(TipKind::Improve, "Avoid tables", None),
                ],
            ),
            tone_and_style: category(80, vec![]),
            content: category(
                45,
                vec![tip(TipKind::Improve, "Quantify impact", Some("Add numbers."))],
            ),
            structure: category(90, vec![]),
            skills: category(30, vec![]),
        });
        record
    }

    #[test]
    fn bar_fill() {
        assert_eq!(progress_bar(0, 10), "░".repeat(10));
        assert_eq!(progress_bar(100, 10), "█".repeat(10));
        assert_eq!(progress_bar(50, 10).chars().filter(|&c| c == '█').count(), 5);
        assert_eq!(progress_bar(250, 4), "████");
    }

    #[test]
    fn plain_report() {
        let text = render_report(&analysed(), ReportStyle::default());
        assert!(text.contains("Backend Engineer at Acme"));
        assert!(text.contains("Your Resume Score  78/100"));
        assert!(text.contains("ATS Score 72/100  Great Job!"));
        assert!(text.contains("Tone & Style"));
        assert!(text.contains("! Quantify impact"));
        assert!(text.contains("      Add numbers."));
        assert!(text.contains("✔ Standard headings"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn colour_follows_bands() {
        let text = render_report(&analysed(), ReportStyle { color: true });
        // content 45 is weak in the summary, fair in the details
        assert!(text.contains(&format!("{}45{}", ScoreBand::Weak.ansi(), RESET)));
        assert!(text.contains(&format!("{}[45/100]{}", ScoreBand::Fair.ansi(), RESET)));
    }

    #[test]
    fn unanalysed_record() {
        let record = ResumeRecord::new("files/a.pdf", "files/a.png", &JobDetails::default());
        let text = render_report(&record, ReportStyle::default());
        assert!(text.contains("No feedback yet"));
        assert!(render_list(&[record], ReportStyle::default()).contains("pending"));
    }

    #[test]
    fn empty_list() {
        assert_eq!(render_list(&[], ReportStyle::default()), "No resumes found.\n");
    }
}
