//! Two-variant result carried as an ordinary value

use super::values::Val;

/// `Ok{value}` or `Err{name, error}`
///
/// Converts error effects into return values (`effects::wrap`) and back
/// (`effects::unwrap`).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok { value: Val },
    Err { name: String, error: Val },
}

impl Outcome {
    pub fn ok(value: impl Into<Val>) -> Self {
        Outcome::Ok {
            value: value.into(),
        }
    }

    pub fn err(name: impl Into<String>, error: impl Into<Val>) -> Self {
        Outcome::Err {
            name: name.into(),
            error: error.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    /// `{ok: true, value}` / `{ok: false, name, error}`
    pub fn to_val(&self) -> Val {
        match self {
            Outcome::Ok { value } => {
                Val::object([("ok", Val::Bool(true)), ("value", value.clone())])
            }
            Outcome::Err { name, error } => Val::object([
                ("ok", Val::Bool(false)),
                ("name", Val::from(name.as_str())),
                ("error", error.clone()),
            ]),
        }
    }

    /// Parse the value form; `None` when `val` is not shaped like a Result
    pub fn from_val(val: &Val) -> Option<Self> {
        match val.get("ok")?.as_bool()? {
            true => Some(Outcome::Ok {
                value: val.get("value").cloned().unwrap_or_default(),
            }),
            false => Some(Outcome::Err {
                name: val.get("name")?.as_str()?.to_string(),
                error: val.get("error").cloned().unwrap_or_default(),
            }),
        }
    }
}

impl From<Outcome> for Val {
    fn from(outcome: Outcome) -> Self {
        outcome.to_val()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_value_shape() {
        let val = Outcome::err("TestError", "msg").to_val();
        assert_eq!(val.get("ok"), Some(&Val::Bool(false)));
        assert_eq!(val.get("name"), Some(&Val::from("TestError")));
        assert_eq!(val.get("error"), Some(&Val::from("msg")));
        assert_eq!(Outcome::from_val(&val), Some(Outcome::err("TestError", "msg")));
    }

    #[test]
    fn test_from_val_rejects_other_shapes() {
        assert_eq!(Outcome::from_val(&Val::from(42)), None);
        assert_eq!(
            Outcome::from_val(&Val::object([("ok", Val::from("yes"))])),
            None
        );
    }
}
