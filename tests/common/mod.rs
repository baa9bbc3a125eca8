//! Shared test infrastructure for model layer tests.
//!
//! # Test Database Setup
//! - `setup_test_db()` - temp-file SQLite database with all migrations applied
//!
//! # Fixtures
//! - `create_committee`, `add_user`, `add_member` - committee and roster
//! - `schedule`, `hold_meeting` - meetings run through the real lifecycle

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use quorum::db::{self, DbPool};
use quorum::models::attendance;
use quorum::models::committee;
use quorum::models::meeting::{self, MeetingStatus, NewMeeting, StatusChange};
use quorum::models::membership::{MemberStatus, Role};
use quorum::models::user::{self, NewUser};

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Keeps the temporary directory alive as long as the pool is in use.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

pub async fn setup_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = db::init_pool(&url).await.expect("Failed to open test DB");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    TestDb { _dir: dir, pool }
}

// ============================================================================
// TIME
// ============================================================================

/// 2025-01-`day` at `hour`:00 UTC.
pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
}

// ============================================================================
// FIXTURES
// ============================================================================

pub async fn create_committee(pool: &DbPool, name: &str) -> i64 {
    committee::create(pool, name, None)
        .await
        .expect("Failed to create committee")
        .expect("Committee name already taken")
}

pub async fn add_user(pool: &DbPool, nickname: &str) {
    let new_user = NewUser {
        nickname: nickname.to_string(),
        firstname: None,
        lastname: None,
        is_admin: false,
        password_hash: None,
    };
    assert!(
        user::create(pool, &new_user).await.expect("Failed to create user"),
        "duplicate user {nickname}"
    );
}

/// Create the user and give them the Member role with `status` since day 1.
pub async fn add_member(pool: &DbPool, committee_id: i64, nickname: &str, status: MemberStatus) {
    add_user(pool, nickname).await;
    user::set_membership(pool, nickname, committee_id, &[Role::Member], status, ts(1, 0))
        .await
        .expect("Failed to set membership");
}

/// Schedule a meeting on `day` from 10:00 to 12:00.
pub async fn schedule(pool: &DbPool, committee_id: i64, day: u32, gathering: bool) -> i64 {
    let new_meeting = NewMeeting {
        gathering,
        start_time: ts(day, 10),
        stop_time: ts(day, 12),
        description: None,
    };
    meeting::create(pool, committee_id, &new_meeting)
        .await
        .expect("Failed to schedule meeting")
}

/// Start the meeting, mark `present` as attending and conclude it at its stop time.
pub async fn hold_meeting(
    pool: &DbPool,
    committee_id: i64,
    meeting_id: i64,
    present: &[&str],
) -> StatusChange {
    let m = meeting::find(pool, meeting_id, committee_id)
        .await
        .expect("Failed to load meeting");
    meeting::change_status(pool, meeting_id, committee_id, MeetingStatus::Running, m.start_time)
        .await
        .expect("Failed to start meeting");

    let accept = Utc::now() + Duration::seconds(5);
    for nickname in present {
        attendance::set_attendance(pool, meeting_id, nickname, true, accept)
            .await
            .expect("Failed to mark attendance");
    }

    meeting::change_status(pool, meeting_id, committee_id, MeetingStatus::Concluded, m.stop_time)
        .await
        .expect("Failed to conclude meeting")
}
