//! Monthly statistics and the "more consistent" verdict.

use std::cmp::Ordering;

use tracker_store::{TrackingData, UserId};

use crate::users::{User, UserRegistry};

/// A ratio kept as integers so comparisons are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rate {
    pub hits: usize,
    pub slots: usize,
}

impl Rate {
    pub fn new(hits: usize, slots: usize) -> Self {
        Self { hits, slots }
    }

    /// Percentage for display. An empty rate is 0%.
    pub fn percent(&self) -> f64 {
        if self.slots == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / self.slots as f64
        }
    }

    fn normalized(&self) -> (u128, u128) {
        if self.slots == 0 {
            (0, 1)
        } else {
            (self.hits as u128, self.slots as u128)
        }
    }
}

impl PartialOrd for Rate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rate {
    /// Compares by value: `1/2` equals `2/4`, and `0/0` equals `0/n`.
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = self.normalized();
        let (c, d) = other.normalized();
        (a * d).cmp(&(c * b))
    }
}

/// Completion of one task over the tracked days.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStat {
    pub task: String,
    pub rate: Rate,
}

/// One user's numbers for a month.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMonthStats {
    pub user_id: UserId,
    pub name: String,
    pub days_tracked: usize,
    /// Days on which every task was done.
    pub perfect_days: usize,
    /// Task slots done over task slots tracked.
    pub completion: Rate,
    /// Perfect days over tracked days.
    pub consistency: Rate,
    /// Per task, in checklist order.
    pub tasks: Vec<TaskStat>,
}

impl UserMonthStats {
    fn compute(data: &TrackingData, user: &User, year: i32, month: u32) -> Self {
        let dates = data.tracked_dates(user.id, year, month);
        let total = user.tasks.len();

        let mut done_slots = 0;
        let mut perfect_days = 0;
        let mut per_task = vec![0usize; total];

        for date in &dates {
            let entry = data.day(*date, user.id);
            let done = user.completed(entry);
            done_slots += done;
            if user.all_done(entry) {
                perfect_days += 1;
            }
            for (i, task) in user.tasks.iter().enumerate() {
                if data.is_done(*date, user.id, task) {
                    per_task[i] += 1;
                }
            }
        }

        let days = dates.len();
        Self {
            user_id: user.id,
            name: user.name.clone(),
            days_tracked: days,
            perfect_days,
            completion: Rate::new(done_slots, days * total),
            consistency: Rate::new(perfect_days, days),
            tasks: user
                .tasks
                .iter()
                .zip(per_task)
                .map(|(task, hits)| TaskStat {
                    task: task.clone(),
                    rate: Rate::new(hits, days),
                })
                .collect(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.days_tracked > 0
    }

    fn rank(&self) -> (Rate, Rate) {
        (self.consistency, self.completion)
    }
}

/// Who came out ahead for the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Winner { user_id: UserId, name: String },
    Tie,
}

/// Report for one calendar month, users in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    /// `YYYY-MM`.
    pub month: String,
    pub users: Vec<UserMonthStats>,
    pub verdict: Verdict,
}

impl MonthlyReport {
    /// Build the report from a snapshot of the tracking document.
    ///
    /// Users with no tracked days count as zero on both rates. The winner has
    /// the higher consistency rate, then the higher completion rate.
    pub fn compute(data: &TrackingData, registry: &UserRegistry, year: i32, month: u32) -> Self {
        let users: Vec<UserMonthStats> = registry
            .iter()
            .map(|user| UserMonthStats::compute(data, user, year, month))
            .collect();
        let verdict = decide(&users);

        Self {
            month: format!("{:04}-{:02}", year, month),
            users,
            verdict,
        }
    }

    pub fn user(&self, id: UserId) -> Option<&UserMonthStats> {
        self.users.iter().find(|u| u.user_id == id)
    }
}

fn decide(users: &[UserMonthStats]) -> Verdict {
    let Some(best) = users.iter().map(UserMonthStats::rank).max() else {
        return Verdict::Tie;
    };
    let mut leaders = users.iter().filter(|u| u.rank() == best);
    match (leaders.next(), leaders.next()) {
        (Some(winner), None) => Verdict::Winner {
            user_id: winner.user_id,
            name: winner.name.clone(),
        },
        _ => Verdict::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn ann() -> (UserId, String, Vec<String>) {
        (1, "Ann".into(), vec!["Run".into(), "Read".into()])
    }

    fn ben() -> (UserId, String, Vec<String>) {
        (2, "Ben".into(), vec!["Maths".into()])
    }

    fn sample() -> TrackingData {
        let mut data = TrackingData::default();
        // Ann: day 1 perfect, day 2 half.
        data.toggle(date(1), 1, "Run");
        data.toggle(date(1), 1, "Read");
        data.toggle(date(2), 1, "Run");
        // Ben: day 1 done, day 2 touched then undone, day 3 done.
        data.toggle(date(1), 2, "Maths");
        data.toggle(date(2), 2, "Maths");
        data.toggle(date(2), 2, "Maths");
        data.toggle(date(3), 2, "Maths");
        // Outside the month.
        data.toggle(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1, "Run");
        data
    }

    #[test]
    fn test_rate_ordering_is_exact() {
        assert_eq!(Rate::new(1, 2).cmp(&Rate::new(2, 4)), Ordering::Equal);
        assert_eq!(Rate::new(0, 0).cmp(&Rate::new(0, 7)), Ordering::Equal);
        assert!(Rate::new(2, 3) > Rate::new(3, 5));
        assert_eq!(Rate::new(0, 0).percent(), 0.0);
        assert_eq!(Rate::new(1, 4).percent(), 25.0);
    }

    #[test]
    fn test_user_stats() {
        let registry = UserRegistry::pair(ann(), ben());
        let report = MonthlyReport::compute(&sample(), &registry, 2024, 5);
        assert_eq!(report.month, "2024-05");

        let a = report.user(1).unwrap();
        assert_eq!(a.days_tracked, 2);
        assert_eq!(a.perfect_days, 1);
        assert_eq!(a.completion, Rate::new(3, 4));
        assert_eq!(a.consistency, Rate::new(1, 2));
        assert_eq!(a.tasks[0].rate, Rate::new(2, 2));
        assert_eq!(a.tasks[1].rate, Rate::new(1, 2));

        let b = report.user(2).unwrap();
        assert_eq!(b.days_tracked, 3);
        assert_eq!(b.perfect_days, 2);
        assert_eq!(b.consistency, Rate::new(2, 3));

        assert_eq!(
            report.verdict,
            Verdict::Winner {
                user_id: 2,
                name: "Ben".into()
            }
        );
    }

    #[test]
    fn test_verdict_independent_of_user_order() {
        let data = sample();
        let forward = MonthlyReport::compute(&data, &UserRegistry::pair(ann(), ben()), 2024, 5);
        let reverse = MonthlyReport::compute(&data, &UserRegistry::pair(ben(), ann()), 2024, 5);
        assert_eq!(forward.verdict, reverse.verdict);
        assert_eq!(forward.user(1), reverse.user(1));
        assert_eq!(forward.user(2), reverse.user(2));
    }

    #[test]
    fn test_deterministic() {
        let registry = UserRegistry::pair(ann(), ben());
        let data = sample();
        assert_eq!(
            MonthlyReport::compute(&data, &registry, 2024, 5),
            MonthlyReport::compute(&data.clone(), &registry, 2024, 5)
        );
    }

    #[test]
    fn test_completion_breaks_consistency_tie() {
        let mut data = TrackingData::default();
        data.toggle(date(1), 1, "Run");
        data.toggle(date(1), 2, "Maths");
        data.toggle(date(1), 2, "Maths");
        let registry = UserRegistry::pair(ann(), ben());
        let report = MonthlyReport::compute(&data, &registry, 2024, 5);
        // Both 0 perfect days; Ann has 1/2 completion, Ben 0/1.
        assert_eq!(
            report.verdict,
            Verdict::Winner {
                user_id: 1,
                name: "Ann".into()
            }
        );
    }

    #[test]
    fn test_empty_month_is_tie() {
        let registry = UserRegistry::pair(ann(), ben());
        let report = MonthlyReport::compute(&TrackingData::default(), &registry, 2024, 5);
        assert!(report.users.iter().all(|u| !u.has_data()));
        assert_eq!(report.verdict, Verdict::Tie);
    }
}
