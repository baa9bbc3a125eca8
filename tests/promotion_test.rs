//! Promotion/demotion on meeting conclusion, run through the real lifecycle.

mod common;

use common::*;
use quorum::models::absence;
use quorum::models::meeting::{self, MeetingStatus, StatusChange};
use quorum::models::membership::{self, MemberStatus};
use quorum::models::user;

fn plan(change: StatusChange) -> (Vec<String>, Vec<String>) {
    match change {
        StatusChange::Applied(plan) => (plan.promotions, plan.demotions),
        StatusChange::Unchanged => panic!("meeting was already concluded"),
    }
}

// --- Demotion ---

#[tokio::test]
async fn two_consecutive_absences_demote_a_voter() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    for n in ["ann", "ben", "cat", "dan"] {
        add_member(pool, cid, n, MemberStatus::Voting).await;
    }

    let m1 = schedule(pool, cid, 5, false).await;
    let (promoted, demoted) = plan(hold_meeting(pool, cid, m1, &["ann", "ben", "cat"]).await);
    assert!(promoted.is_empty());
    assert!(demoted.is_empty(), "first meeting has no history to judge");

    let m2 = schedule(pool, cid, 12, false).await;
    let (_, demoted) = plan(hold_meeting(pool, cid, m2, &["ann", "ben", "cat"]).await);
    assert_eq!(demoted, vec!["dan".to_string()]);

    assert_eq!(membership::live_status(pool, "dan", cid).await.unwrap(), MemberStatus::Member);
    // the change takes effect at the conclusion of the second meeting
    assert_eq!(membership::status_at(pool, "dan", cid, ts(12, 11)).await.unwrap(), MemberStatus::Voting);
    assert_eq!(membership::status_at(pool, "dan", cid, ts(12, 12)).await.unwrap(), MemberStatus::Member);
}

#[tokio::test]
async fn alternating_absences_are_not_penalized() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    add_member(pool, cid, "ben", MemberStatus::Voting).await;

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &["ann"]).await;
    let m2 = schedule(pool, cid, 12, false).await;
    let (_, demoted) = plan(hold_meeting(pool, cid, m2, &["ben"]).await);
    assert!(demoted.is_empty());
}

#[tokio::test]
async fn excused_absence_is_not_a_strike() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;
    add_member(pool, cid, "ben", MemberStatus::Voting).await;
    absence::excuse(pool, "ben", cid, ts(11, 0), ts(13, 0)).await.unwrap();
    assert!(absence::is_excused(pool, "ben", cid, ts(12, 11)).await.unwrap());

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &["ann"]).await;
    let m2 = schedule(pool, cid, 12, false).await;
    let (_, demoted) = plan(hold_meeting(pool, cid, m2, &["ann"]).await);
    assert!(demoted.is_empty());
    assert_eq!(membership::live_status(pool, "ben", cid).await.unwrap(), MemberStatus::Voting);
}

#[tokio::test]
async fn gatherings_are_skipped() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &[]).await;

    // a gathering never triggers the engine...
    let g = schedule(pool, cid, 8, true).await;
    let (_, demoted) = plan(hold_meeting(pool, cid, g, &[]).await);
    assert!(demoted.is_empty());
    assert_eq!(membership::live_status(pool, "ann", cid).await.unwrap(), MemberStatus::Voting);

    // ...and is not the "previous meeting" of the next regular one
    let m2 = schedule(pool, cid, 12, false).await;
    let (_, demoted) = plan(hold_meeting(pool, cid, m2, &[]).await);
    assert_eq!(demoted, vec!["ann".to_string()]);
}

// --- Promotion ---

#[tokio::test]
async fn two_non_voting_attendances_promote_a_member() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "eve", MemberStatus::Member).await;

    let m1 = schedule(pool, cid, 5, false).await;
    let (promoted, _) = plan(hold_meeting(pool, cid, m1, &["eve"]).await);
    assert!(promoted.is_empty());

    let m2 = schedule(pool, cid, 12, false).await;
    let (promoted, _) = plan(hold_meeting(pool, cid, m2, &["eve"]).await);
    assert_eq!(promoted, vec!["eve".to_string()]);
    assert_eq!(membership::live_status(pool, "eve", cid).await.unwrap(), MemberStatus::Voting);

    // the attendance snapshot keeps the flag from marking time
    let attendees = quorum::models::attendance::attendees(pool, m2).await.unwrap();
    assert_eq!(attendees.voting("eve"), Some(false));
}

#[tokio::test]
async fn member_added_after_previous_meeting_is_not_promoted() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "eve", MemberStatus::NonVoting).await;

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &["eve"]).await;

    // plain member only from day 8 on
    user::set_membership(
        pool,
        "eve",
        cid,
        &[quorum::models::membership::Role::Member],
        MemberStatus::Member,
        ts(8, 0),
    )
    .await
    .unwrap();

    let m2 = schedule(pool, cid, 12, false).await;
    let (promoted, _) = plan(hold_meeting(pool, cid, m2, &["eve"]).await);
    assert!(promoted.is_empty());
}

#[tokio::test]
async fn non_voting_members_never_change() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "gus", MemberStatus::NonVoting).await;
    add_member(pool, cid, "hal", MemberStatus::NonVoting).await;

    for day in [5, 12, 19] {
        let m = schedule(pool, cid, day, false).await;
        let (promoted, demoted) = plan(hold_meeting(pool, cid, m, &["hal"]).await);
        assert!(promoted.is_empty() && demoted.is_empty());
    }
    assert_eq!(membership::live_status(pool, "gus", cid).await.unwrap(), MemberStatus::NonVoting);
    assert_eq!(membership::live_status(pool, "hal", cid).await.unwrap(), MemberStatus::NonVoting);
}

#[tokio::test]
async fn conclusion_inside_the_window_uses_the_current_time() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let cid = create_committee(pool, "Board").await;
    add_member(pool, cid, "ann", MemberStatus::Voting).await;

    let m1 = schedule(pool, cid, 5, false).await;
    hold_meeting(pool, cid, m1, &[]).await;

    let m2 = schedule(pool, cid, 12, false).await;
    let m = meeting::find(pool, m2, cid).await.unwrap();
    let now = ts(12, 11);
    assert_eq!(m.effective_end(now), now);

    meeting::change_status(pool, m2, cid, MeetingStatus::Concluded, m.effective_end(now))
        .await
        .unwrap();
    assert_eq!(membership::status_at(pool, "ann", cid, now).await.unwrap(), MemberStatus::Member);
    assert_eq!(
        meeting::find(pool, m2, cid).await.unwrap().concluded_at,
        Some(now)
    );
}
