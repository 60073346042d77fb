use crate::error::AppError;
use crate::model::Task;
use crate::recurrence::utc_day;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const CATEGORY_PREFIX: &str = "category:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// `all`, `completed`, `pending`, `category:<name>` or `category:<name>:<status>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterExpr {
    #[default]
    All,
    Completed,
    Pending,
    Category { name: String, status: StatusFilter },
}

impl FilterExpr {
    pub fn category<N: Into<String>>(name: N) -> Self {
        Self::Category {
            name: name.into(),
            status: StatusFilter::All,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::Category { name, status } => {
                task.category.as_deref() == Some(name.as_str()) && status.matches(task)
            }
        }
    }
}

impl FromStr for FilterExpr {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "all" => return Ok(Self::All),
            "completed" => return Ok(Self::Completed),
            "pending" => return Ok(Self::Pending),
            _ => {}
        }

        let rest = raw
            .strip_prefix(CATEGORY_PREFIX)
            .ok_or_else(|| AppError::validation(format!("unknown filter {raw:?}")))?;

        let (name, status) = match rest.rsplit_once(':') {
            Some((name, status)) => match StatusFilter::parse(status) {
                Some(status) => (name, status),
                None => (rest, StatusFilter::All),
            },
            None => (rest, StatusFilter::All),
        };

        if name.is_empty() {
            return Err(AppError::validation("category filter requires a name"));
        }

        Ok(Self::Category {
            name: name.to_string(),
            status,
        })
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Completed => f.write_str("completed"),
            Self::Pending => f.write_str("pending"),
            Self::Category {
                name,
                status: StatusFilter::All,
            } if !ends_with_status(name) => write!(f, "{CATEGORY_PREFIX}{name}"),
            Self::Category { name, status } => {
                write!(f, "{CATEGORY_PREFIX}{name}:{}", status.as_str())
            }
        }
    }
}

// A bare `category:<name>` whose name ends in `:<status>` would parse as the
// compound form, so such names always carry an explicit status.
fn ends_with_status(name: &str) -> bool {
    name.rsplit_once(':')
        .is_some_and(|(_, last)| StatusFilter::parse(last).is_some())
}

/// Filters then orders: due day ascending in UTC (undated last), priority
/// descending, creation time descending. Ties keep collection order.
pub fn view<'a>(tasks: &'a [Task], filter: &FilterExpr) -> Vec<&'a Task> {
    let mut selected: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    selected.sort_by(|a, b| display_order(a, b));
    selected
}

pub fn display_order(a: &Task, b: &Task) -> Ordering {
    let a_due = a.due_date.map(utc_day);
    let b_due = b.due_date.map(utc_day);

    let by_due = match (a_due, b_due) {
        (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_due
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub fn stats(tasks: &[Task]) -> TaskStats {
    let completed = tasks.iter().filter(|task| task.completed).count();
    TaskStats {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
    }
}
