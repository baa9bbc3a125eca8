use chrono::{DateTime, Utc};

use crate::models::timestamp::to_millis;

use super::types::MeetingStatus;

/// Composable meeting predicate, rendered into a parameterized WHERE fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum MeetingFilter {
    Committee(i64),
    Running,
    /// Meetings sharing at least one instant with [start, stop], except the listed ids.
    Overlap {
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        except: Vec<i64>,
    },
    And(Vec<MeetingFilter>),
}

impl MeetingFilter {
    pub fn and(self, other: MeetingFilter) -> MeetingFilter {
        match self {
            MeetingFilter::And(mut parts) => {
                parts.push(other);
                MeetingFilter::And(parts)
            }
            first => MeetingFilter::And(vec![first, other]),
        }
    }

    /// Returns (sql_fragment, params) with `?` placeholders, in bind order.
    pub fn where_clause(&self) -> (String, Vec<i64>) {
        let mut params = Vec::new();
        let sql = self.render(&mut params);
        (sql, params)
    }

    fn render(&self, params: &mut Vec<i64>) -> String {
        match self {
            MeetingFilter::Committee(id) => {
                params.push(*id);
                "committee_id = ?".to_string()
            }
            MeetingFilter::Running => {
                params.push(MeetingStatus::Running.code());
                "status = ?".to_string()
            }
            MeetingFilter::Overlap { start, stop, except } => {
                params.push(to_millis(*start));
                params.push(to_millis(*stop));
                let mut sql = "NOT (stop_time < ? OR ? < start_time)".to_string();
                if !except.is_empty() {
                    params.extend(except);
                    let marks = vec!["?"; except.len()].join(", ");
                    sql.push_str(&format!(" AND id NOT IN ({marks})"));
                }
                sql
            }
            MeetingFilter::And(parts) if parts.is_empty() => "1=1".to_string(),
            MeetingFilter::And(parts) => parts
                .iter()
                .map(|p| format!("({})", p.render(params)))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn overlap_is_inclusive_at_both_ends() {
        let f = MeetingFilter::Overlap { start: t(12), stop: t(14), except: vec![] };
        let (sql, params) = f.where_clause();
        assert_eq!(sql, "NOT (stop_time < ? OR ? < start_time)");
        assert_eq!(params, vec![to_millis(t(12)), to_millis(t(14))]);
    }

    #[test]
    fn conjunction_wraps_each_part() {
        let (sql, params) = MeetingFilter::Committee(4)
            .and(MeetingFilter::Running)
            .where_clause();
        assert_eq!(sql, "(committee_id = ?) AND (status = ?)");
        assert_eq!(params, vec![4, MeetingStatus::Running.code()]);
    }

    #[test]
    fn and_flattens_chained_parts() {
        let f = MeetingFilter::Committee(1)
            .and(MeetingFilter::Running)
            .and(MeetingFilter::Committee(2));
        match f {
            MeetingFilter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected a conjunction, got {other:?}"),
        }
        assert_eq!(MeetingFilter::And(vec![]).where_clause().0, "1=1");
    }

    #[test]
    fn renders_parameterized_sql() {
        let f = MeetingFilter::Committee(3).and(MeetingFilter::Overlap {
            start: t(10),
            stop: t(12),
            except: vec![5, 6],
        });
        let (sql, params) = f.where_clause();
        assert_eq!(
            sql,
            "(committee_id = ?) AND (NOT (stop_time < ? OR ? < start_time) AND id NOT IN (?, ?))"
        );
        assert_eq!(params, vec![3, to_millis(t(10)), to_millis(t(12)), 5, 6]);
    }
}
