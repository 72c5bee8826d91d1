//! Per-task outcome tagged with the task's production index

use super::values::Val;

/// `{kind: "task-ok", index, value}` or `{kind: "task-err", index, error}`
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Ok { index: usize, value: Val },
    Err { index: usize, error: Val },
}

impl TaskResult {
    pub fn index(&self) -> usize {
        match self {
            TaskResult::Ok { index, .. } | TaskResult::Err { index, .. } => *index,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TaskResult::Ok { .. })
    }

    pub fn to_val(&self) -> Val {
        match self {
            TaskResult::Ok { index, value } => Val::object([
                ("kind", Val::from("task-ok")),
                ("index", Val::from(*index)),
                ("value", value.clone()),
            ]),
            TaskResult::Err { index, error } => Val::object([
                ("kind", Val::from("task-err")),
                ("index", Val::from(*index)),
                ("error", error.clone()),
            ]),
        }
    }

    pub fn from_val(val: &Val) -> Option<Self> {
        let index = val.get("index")?.as_num()? as usize;
        match val.get("kind")?.as_str()? {
            "task-ok" => Some(TaskResult::Ok {
                index,
                value: val.get("value").cloned().unwrap_or_default(),
            }),
            "task-err" => Some(TaskResult::Err {
                index,
                error: val.get("error").cloned().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

impl From<TaskResult> for Val {
    fn from(result: TaskResult) -> Self {
        result.to_val()
    }
}
