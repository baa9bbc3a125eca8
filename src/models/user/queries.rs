use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::models::membership::{MemberStatus, Role};

use super::types::*;

#[derive(sqlx::FromRow)]
struct RosterRow {
    nickname: String,
    firstname: Option<String>,
    lastname: Option<String>,
    roles: String,
    status: Option<i64>,
}

impl RosterRow {
    fn into_member(self) -> CommitteeMember {
        CommitteeMember {
            nickname: self.nickname,
            firstname: self.firstname,
            lastname: self.lastname,
            roles: Role::parse_codes(&self.roles),
            status: live_status(self.status),
        }
    }
}

fn live_status(code: Option<i64>) -> MemberStatus {
    code.and_then(MemberStatus::from_code)
        .unwrap_or(MemberStatus::NoMember)
}

const ROSTER_SELECT: &str = "\
    SELECT u.nickname, u.firstname, u.lastname, \
           GROUP_CONCAT(r.role) AS roles, \
           (SELECT h.status FROM member_history h \
             WHERE h.nickname = u.nickname AND h.committee_id = r.committee_id \
             ORDER BY h.since DESC, h.id DESC LIMIT 1) AS status \
    FROM users u \
    JOIN committee_roles r ON r.nickname = u.nickname \
    WHERE r.committee_id = ?";

/// Insert a user. Returns false when the nickname is taken.
pub async fn create(conn: &mut SqliteConnection, user: &NewUser) -> Result<bool, AppError> {
    let result = sqlx::query(
        "INSERT INTO users (nickname, firstname, lastname, is_admin, password) \
         VALUES (?, ?, ?, ?, ?) ON CONFLICT (nickname) DO NOTHING",
    )
    .bind(&user.nickname)
    .bind(&user.firstname)
    .bind(&user.lastname)
    .bind(user.is_admin)
    .bind(&user.password_hash)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn find(conn: &mut SqliteConnection, nickname: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT nickname, firstname, lastname, is_admin FROM users WHERE nickname = ?",
    )
    .bind(nickname)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user)
}

pub async fn password_hash(
    conn: &mut SqliteConnection,
    nickname: &str,
) -> Result<Option<String>, AppError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT password FROM users WHERE nickname = ?")
            .bind(nickname)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.and_then(|(hash,)| hash))
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

/// All committees the user holds a role in, with live status.
pub async fn memberships(
    conn: &mut SqliteConnection,
    nickname: &str,
) -> Result<Vec<Membership>, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        committee_id: i64,
        committee_name: String,
        roles: String,
        status: Option<i64>,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT c.id AS committee_id, c.name AS committee_name, \
                GROUP_CONCAT(r.role) AS roles, \
                (SELECT h.status FROM member_history h \
                  WHERE h.nickname = r.nickname AND h.committee_id = c.id \
                  ORDER BY h.since DESC, h.id DESC LIMIT 1) AS status \
         FROM committee_roles r \
         JOIN committees c ON c.id = r.committee_id \
         WHERE r.nickname = ? \
         GROUP BY c.id, c.name \
         ORDER BY c.name",
    )
    .bind(nickname)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Membership {
            committee_id: r.committee_id,
            committee_name: r.committee_name,
            roles: Role::parse_codes(&r.roles),
            status: live_status(r.status),
        })
        .collect())
}

/// Every user holding a role in the committee.
pub async fn committee_roster(
    conn: &mut SqliteConnection,
    committee_id: i64,
) -> Result<Vec<CommitteeMember>, AppError> {
    let sql = format!("{ROSTER_SELECT} GROUP BY u.nickname ORDER BY u.nickname");
    let rows = sqlx::query_as::<_, RosterRow>(&sql)
        .bind(committee_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(RosterRow::into_member).collect())
}

pub async fn find_committee_member(
    conn: &mut SqliteConnection,
    committee_id: i64,
    nickname: &str,
) -> Result<Option<CommitteeMember>, AppError> {
    let sql = format!("{ROSTER_SELECT} AND u.nickname = ? GROUP BY u.nickname");
    let row = sqlx::query_as::<_, RosterRow>(&sql)
        .bind(committee_id)
        .bind(nickname)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(RosterRow::into_member))
}

/// Replace the user's roles in the committee.
pub async fn replace_roles(
    conn: &mut SqliteConnection,
    nickname: &str,
    committee_id: i64,
    roles: &[Role],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM committee_roles WHERE nickname = ? AND committee_id = ?")
        .bind(nickname)
        .bind(committee_id)
        .execute(&mut *conn)
        .await?;

    for role in roles {
        sqlx::query(
            "INSERT OR IGNORE INTO committee_roles (nickname, committee_id, role) VALUES (?, ?, ?)",
        )
        .bind(nickname)
        .bind(committee_id)
        .bind(role.code())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
