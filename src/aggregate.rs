use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::models::{
    AttendanceRecord, Band, ClassAverages, ProgressStatus, RosterStudent, Session, TrendPoint,
};

/// Number of most recent sessions charted in the class trend.
pub const TREND_WINDOW: usize = 7;

pub fn class_trend(
    sessions: &[Session],
    records: &[AttendanceRecord],
    roster: &[RosterStudent],
) -> Vec<TrendPoint> {
    // Last N by list position; the session list is not re-sorted by date.
    let start = sessions.len().saturating_sub(TREND_WINDOW);
    let window = &sessions[start..];

    let roster_ids: HashSet<Uuid> = roster.iter().map(|s| s.student_id).collect();
    let mut present: HashMap<&str, HashSet<Uuid>> = HashMap::new();
    for record in records {
        if record.present && roster_ids.contains(&record.student_id) {
            present
                .entry(record.session_id.as_str())
                .or_default()
                .insert(record.student_id);
        }
    }

    let divisor = roster.len().max(1);
    window
        .iter()
        .map(|session| {
            let present_count = present
                .get(session.session_id.as_str())
                .map_or(0, |students| students.len());
            let percentage = (present_count as f64 / divisor as f64 * 100.0).round() as u8;
            TrendPoint {
                label: session_label(session),
                percentage,
            }
        })
        .collect()
}

pub fn per_student_averages(
    sessions: &[Session],
    records: &[AttendanceRecord],
    roster: &[RosterStudent],
) -> ClassAverages {
    let session_ids: HashSet<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();

    // Distinct sessions attended per student. Records naming sessions outside
    // the supplied list are ignored so percentages stay within 0..=100.
    let mut attended: HashMap<Uuid, HashSet<&str>> = HashMap::new();
    for record in records {
        if record.present && session_ids.contains(record.session_id.as_str()) {
            attended
                .entry(record.student_id)
                .or_default()
                .insert(record.session_id.as_str());
        }
    }

    let divisor = sessions.len().max(1);
    let mut per_student = BTreeMap::new();
    for student in roster {
        let count = attended
            .get(&student.student_id)
            .map_or(0, |sessions| sessions.len());
        per_student.insert(
            student.student_id,
            round2(count as f64 / divisor as f64 * 100.0),
        );
    }

    let class_average = if per_student.is_empty() {
        0.0
    } else {
        per_student.values().sum::<f64>() / per_student.len() as f64
    };

    ClassAverages {
        per_student,
        class_average,
    }
}

pub fn individual_progress(attended_count: usize, total_sessions: usize) -> ProgressStatus {
    let percentage = if total_sessions > 0 {
        attended_count as f64 / total_sessions as f64 * 100.0
    } else {
        0.0
    };
    ProgressStatus {
        percentage,
        band: classify(percentage),
    }
}

pub fn classify(percentage: f64) -> Band {
    if percentage >= 75.0 {
        Band::OnTrack
    } else if percentage >= 50.0 {
        Band::Warning
    } else {
        Band::Critical
    }
}

pub fn sessions_attended(
    sessions: &[Session],
    records: &[AttendanceRecord],
    student_id: Uuid,
) -> usize {
    let session_ids: HashSet<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    let attended: HashSet<&str> = records
        .iter()
        .filter(|r| {
            r.student_id == student_id && r.present && session_ids.contains(r.session_id.as_str())
        })
        .map(|r| r.session_id.as_str())
        .collect();
    attended.len()
}

/// A present record wins over any conflicting absent duplicate for the pair.
pub fn was_present(records: &[AttendanceRecord], session_id: &str, student_id: Uuid) -> bool {
    records
        .iter()
        .any(|r| r.session_id == session_id && r.student_id == student_id && r.present)
}

pub fn session_label(session: &Session) -> String {
    match session.date {
        Some(date) => date.to_string(),
        None => format!("Session {}", session.session_id),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
