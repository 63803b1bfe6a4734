use std::fmt::Write;

use crate::aggregate::{self, TREND_WINDOW};
use crate::models::{Band, ClassAverages, ClassSnapshot, RosterStudent};

pub fn band_label(band: Band) -> &'static str {
    match band {
        Band::OnTrack => "on track",
        Band::Warning => "warning",
        Band::Critical => "critical",
    }
}

pub fn band_notice(band: Band) -> &'static str {
    match band {
        Band::OnTrack => "Your attendance is on track. Great job!",
        Band::Warning => "Your attendance is below 75%. Please attend classes regularly.",
        Band::Critical => {
            "Your attendance is below 50%. Please meet your class faculty as soon as possible."
        }
    }
}

/// Roster paired with averages, lowest attendance first so the students who
/// need follow-up lead the list.
pub fn ranked_students(roster: &[RosterStudent], averages: &ClassAverages) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = roster
        .iter()
        .map(|student| {
            let pct = averages
                .per_student
                .get(&student.student_id)
                .copied()
                .unwrap_or(0.0);
            (student.display_name.clone(), pct)
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

pub fn build_class_report(snapshot: &ClassSnapshot) -> String {
    let trend = aggregate::class_trend(&snapshot.sessions, &snapshot.records, &snapshot.roster);
    let averages =
        aggregate::per_student_averages(&snapshot.sessions, &snapshot.records, &snapshot.roster);
    let ranked = ranked_students(&snapshot.roster, &averages);

    let mut output = String::new();
    let _ = writeln!(output, "# Attendance Report: {}", snapshot.class.class_name);
    let _ = writeln!(output, "Generated from data fetched {}", snapshot.fetched_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "Total sessions: {}", snapshot.sessions.len());
    let _ = writeln!(output, "Total students: {}", snapshot.roster.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance Trend (last {} sessions)", TREND_WINDOW);

    if trend.is_empty() {
        let _ = writeln!(output, "No sessions yet. Start a session to view analytics.");
    } else {
        for point in trend.iter() {
            let _ = writeln!(output, "- {}: {}%", point.label, point.percentage);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Student Averages");

    if ranked.is_empty() {
        let _ = writeln!(output, "No students enrolled yet.");
    } else {
        let _ = writeln!(output, "Class average: {:.2}%", averages.class_average);
        for (name, pct) in ranked.iter() {
            let _ = writeln!(output, "- {}: {:.2}%", name, pct);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if snapshot.sessions.is_empty() {
        let _ = writeln!(output, "No sessions yet.");
    } else {
        for session in snapshot.sessions.iter().rev().take(5) {
            let label = aggregate::session_label(session);
            if session.is_open {
                let _ = writeln!(output, "- {} (open)", label);
            } else {
                let _ = writeln!(output, "- {}", label);
            }
        }
    }

    output
}

pub fn build_student_report(snapshot: &ClassSnapshot, student: &RosterStudent) -> String {
    let attended =
        aggregate::sessions_attended(&snapshot.sessions, &snapshot.records, student.student_id);
    let total = snapshot.sessions.len();
    let progress = aggregate::individual_progress(attended, total);

    let mut output = String::new();
    let _ = writeln!(
        output,
        "# Attendance Report: {} in {}",
        student.display_name, snapshot.class.class_name
    );
    let _ = writeln!(output, "Generated from data fetched {}", snapshot.fetched_on);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "You've attended {} out of {} sessions ({:.1}%).",
        attended, total, progress.percentage
    );
    let _ = writeln!(output, "Status: {}.", band_label(progress.band));
    let _ = writeln!(output, "{}", band_notice(progress.band));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Session History");

    if snapshot.sessions.is_empty() {
        let _ = writeln!(output, "No sessions found for this class.");
    } else {
        for session in snapshot.sessions.iter() {
            let mark = if aggregate::was_present(
                &snapshot.records,
                &session.session_id,
                student.student_id,
            ) {
                "Present"
            } else {
                "Absent"
            };
            let _ = writeln!(output, "- {}: {}", aggregate::session_label(session), mark);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, ClassSnapshot, ClassSubject, Session};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn session(id: &str, class_id: Uuid) -> Session {
        Session {
            session_id: id.to_string(),
            class_id,
            date: None,
            is_open: false,
        }
    }

    fn record(session_id: &str, student_id: Uuid, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            session_id: session_id.to_string(),
            student_id,
            present,
        }
    }

    fn student(id: Uuid, name: &str) -> RosterStudent {
        RosterStudent {
            student_id: id,
            display_name: name.to_string(),
            email: format!("{name}@campus.edu"),
        }
    }

    fn sample_snapshot() -> (ClassSnapshot, Uuid, Uuid) {
        let class_id = Uuid::new_v4();
        let john = Uuid::new_v4();
        let priya = Uuid::new_v4();
        let snapshot = ClassSnapshot {
            class: ClassSubject {
                class_id,
                class_name: "CS-101: Introduction to Programming".to_string(),
            },
            sessions: vec![session("s1", class_id), session("s2", class_id)],
            records: vec![
                record("s1", john, true),
                record("s2", john, true),
                record("s1", priya, true),
            ],
            roster: vec![student(john, "John Doe"), student(priya, "Priya Sharma")],
            fetched_on: NaiveDate::from_ymd_opt(2025, 9, 22).unwrap(),
        };
        (snapshot, john, priya)
    }

    fn empty_snapshot() -> ClassSnapshot {
        ClassSnapshot {
            class: ClassSubject {
                class_id: Uuid::new_v4(),
                class_name: "ENG-103: Literature".to_string(),
            },
            sessions: vec![],
            records: vec![],
            roster: vec![],
            fetched_on: NaiveDate::from_ymd_opt(2025, 9, 22).unwrap(),
        }
    }

    #[test]
    fn class_report_ranks_lowest_average_first() {
        let (snapshot, _, _) = sample_snapshot();
        let report = build_class_report(&snapshot);

        assert!(report.contains("# Attendance Report: CS-101: Introduction to Programming"));
        assert!(report.contains("Total sessions: 2"));
        assert!(report.contains("Total students: 2"));
        assert!(report.contains("Class average: 75.00%"));
        assert!(report.contains("- Priya Sharma: 50.00%"));
        assert!(report.contains("- John Doe: 100.00%"));

        let priya = report.find("- Priya Sharma").unwrap();
        let john = report.find("- John Doe").unwrap();
        assert!(priya < john);
    }

    #[test]
    fn class_report_includes_trend_lines() {
        let (snapshot, _, _) = sample_snapshot();
        let report = build_class_report(&snapshot);

        assert!(report.contains("- Session s1: 100%"));
        assert!(report.contains("- Session s2: 50%"));
    }

    #[test]
    fn class_report_lists_newest_sessions_first() {
        let (mut snapshot, _, _) = sample_snapshot();
        snapshot.sessions[1].is_open = true;
        let report = build_class_report(&snapshot);

        assert!(report.contains("- Session s2 (open)"));
        let recent = report.find("## Recent Sessions").unwrap();
        let newest = report[recent..].find("Session s2").unwrap();
        let oldest = report[recent..].find("Session s1").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn class_report_handles_empty_class() {
        let report = build_class_report(&empty_snapshot());

        assert!(report.contains("No sessions yet. Start a session to view analytics."));
        assert!(report.contains("No students enrolled yet."));
    }

    #[test]
    fn student_report_warns_below_threshold() {
        let (snapshot, _, priya) = sample_snapshot();
        let report = build_student_report(&snapshot, &snapshot.roster[1].clone());

        assert!(snapshot.roster[1].student_id == priya);
        assert!(report.contains("You've attended 1 out of 2 sessions (50.0%)."));
        assert!(report.contains("Status: warning."));
        assert!(report.contains("Please attend classes regularly."));
        assert!(report.contains("- Session s2: Absent"));
    }

    #[test]
    fn student_report_celebrates_full_attendance() {
        let (snapshot, john, _) = sample_snapshot();
        let report = build_student_report(&snapshot, &snapshot.roster[0].clone());

        assert!(snapshot.roster[0].student_id == john);
        assert!(report.contains("You've attended 2 out of 2 sessions (100.0%)."));
        assert!(report.contains("Great job!"));
        assert!(report.contains("- Session s1: Present"));
    }

    #[test]
    fn student_report_without_sessions_stays_calm() {
        let snapshot = empty_snapshot();
        let outsider = student(Uuid::new_v4(), "Sara Kim");
        let report = build_student_report(&snapshot, &outsider);

        assert!(report.contains("You've attended 0 out of 0 sessions (0.0%)."));
        assert!(report.contains("No sessions found for this class."));
    }

    #[test]
    fn ranked_students_breaks_ties_by_name() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let roster = vec![student(b, "Priya Sharma"), student(a, "John Doe")];
        let averages = ClassAverages {
            per_student: [(a, 50.0), (b, 50.0)].into_iter().collect(),
            class_average: 50.0,
        };

        let ranked = ranked_students(&roster, &averages);
        assert_eq!(ranked[0].0, "John Doe");
        assert_eq!(ranked[1].0, "Priya Sharma");
    }

    #[test]
    fn band_labels_cover_every_band() {
        assert_eq!(band_label(Band::OnTrack), "on track");
        assert_eq!(band_label(Band::Warning), "warning");
        assert_eq!(band_label(Band::Critical), "critical");
        assert!(band_notice(Band::Critical).contains("meet your class faculty"));
    }
}
