use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSubject {
    pub class_id: Uuid,
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub class_id: Uuid,
    pub date: Option<NaiveDate>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub student_id: Uuid,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterStudent {
    pub student_id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// One class worth of collections, fetched together so every view is
/// computed from a consistent scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSnapshot {
    pub class: ClassSubject,
    pub sessions: Vec<Session>,
    pub records: Vec<AttendanceRecord>,
    pub roster: Vec<RosterStudent>,
    pub fetched_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    pub label: String,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassAverages {
    pub per_student: BTreeMap<Uuid, f64>,
    pub class_average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    OnTrack,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStatus {
    pub percentage: f64,
    pub band: Band,
}

#[derive(Debug, Clone)]
pub struct Complaint {
    pub id: Uuid,
    pub student_name: String,
    pub class_name: String,
    pub subject: String,
    pub details: String,
    pub status: String,
    pub filed_on: NaiveDate,
}
