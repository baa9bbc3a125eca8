//! Attendance ledger: running-only writes, derived voting flag, stale-write detection.

mod common;

use chrono::{Duration, Utc};
use common::*;
use quorum::errors::AppError;
use quorum::models::attendance::{self, AttendanceOutcome};
use quorum::models::meeting::{self, MeetingStatus};
use quorum::models::membership::{MemberStatus, Role};
use quorum::models::user;

async fn running_meeting(pool: &quorum::db::DbPool, cid: i64) -> i64 {
    let mid = schedule(pool, cid, 5, false).await;
    meeting::change_status(pool, mid, cid, MeetingStatus::Running, ts(5, 10))
        .await
        .unwrap();
    mid
}

// --- Tests ---

#[tokio::test]
async fn voting_flag_follows_live_status() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    add_member(pool, cid, "ben", MemberStatus::Member).await;
    add_member(pool, cid, "cat", MemberStatus::NonVoting).await;
    let mid = running_meeting(pool, cid).await;

    let accept = Utc::now() + Duration::seconds(5);
    for n in ["ann", "ben", "cat"] {
        let outcome = attendance::set_attendance(pool, mid, n, true, accept).await.unwrap();
        assert_eq!(outcome, AttendanceOutcome::Applied);
    }

    let attendees = attendance::attendees(pool, mid).await.unwrap();
    assert_eq!(attendees.voting("ann"), Some(true));
    assert_eq!(attendees.voting("ben"), Some(false));
    assert_eq!(attendees.voting("cat"), Some(false));
}

#[tokio::test]
async fn stale_write_is_superseded() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    let mid = running_meeting(pool, cid).await;

    let rendered = Utc::now() - Duration::minutes(10);
    let fresh = Utc::now() + Duration::seconds(5);
    attendance::set_attendance(pool, mid, "ann", true, fresh).await.unwrap();

    // a form rendered before the last change must not undo it
    let outcome = attendance::set_attendance(pool, mid, "ann", false, rendered)
        .await
        .unwrap();
    assert_eq!(outcome, AttendanceOutcome::Superseded);
    assert!(attendance::attendees(pool, mid).await.unwrap().attended("ann"));

    let outcome = attendance::set_attendance(pool, mid, "ann", false, fresh + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(outcome, AttendanceOutcome::Applied);
    assert!(!attendance::attendees(pool, mid).await.unwrap().attended("ann"));

    // unattending leaves a change time behind, so stale re-attends lose too
    let outcome = attendance::set_attendance(pool, mid, "ann", true, rendered)
        .await
        .unwrap();
    assert_eq!(outcome, AttendanceOutcome::Superseded);
    assert!(!attendance::attendees(pool, mid).await.unwrap().attended("ann"));
}

#[tokio::test]
async fn attendance_requires_a_running_meeting() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    let mid = schedule(pool, cid, 5, false).await;

    let err = attendance::set_attendance(pool, mid, "ann", true, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MeetingNotRunning));

    let err = attendance::set_attendance(pool, 9999, "ann", true, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn only_members_can_attend() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_user(pool, "zed").await;
    add_user(pool, "chair").await;
    user::set_membership(pool, "chair", cid, &[Role::Chair], MemberStatus::Voting, ts(1, 0))
        .await
        .unwrap();
    let mid = running_meeting(pool, cid).await;

    for n in ["zed", "chair"] {
        let err = attendance::set_attendance(pool, mid, n, true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotCommitteeMember(ref who) if who == n));
    }
}

#[tokio::test]
async fn roll_call_applies_in_one_go() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    add_member(pool, cid, "ben", MemberStatus::Member).await;
    add_user(pool, "zed").await;
    let mid = running_meeting(pool, cid).await;

    let accept = Utc::now() + Duration::seconds(5);
    attendance::set_attendance(pool, mid, "ben", true, accept).await.unwrap();

    let outcome = attendance::record_roll_call(
        pool,
        mid,
        &["ann".to_string(), "zed".to_string()],
        &["ben".to_string()],
        accept + Duration::seconds(1),
    )
    .await
    .unwrap();
    assert_eq!(outcome.applied, 2);
    assert_eq!(outcome.superseded, 0);

    let attendees = attendance::attendees(pool, mid).await.unwrap();
    assert!(attendees.attended("ann"));
    assert!(!attendees.attended("ben"));
    assert!(!attendees.attended("zed"));
    assert_eq!(attendees.len(), 1);
}

#[tokio::test]
async fn attended_meetings_lists_newest_first() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &["ann"]).await;
    let m2 = schedule(pool, cid, 12, false).await;
    hold_meeting(pool, cid, m2, &[]).await;
    let m3 = schedule(pool, cid, 19, false).await;
    hold_meeting(pool, cid, m3, &["ann"]).await;

    let ids: Vec<i64> = attendance::attended_meetings(pool, "ann")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![m3, m1]);
}
