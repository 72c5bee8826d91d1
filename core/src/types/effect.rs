//! Effect values yielded by programs

use super::values::Val;
use crate::error::Exception;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Future resolved by the async driver
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Val, Exception>> + Send + 'static>>;

/// Discriminant of an [`Effect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Err,
    Ctx,
    Opt,
    Async,
}

impl EffectKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Err => "err",
            EffectKind::Ctx => "ctx",
            EffectKind::Opt => "opt",
            EffectKind::Async => "async",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something an async effect waits on
pub enum Awaitable {
    /// Plain value; resolved without suspending
    Ready(Val),
    /// Real suspension; only the async driver resolves it
    Pending(BoxFuture),
}

impl Awaitable {
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Val, Exception>> + Send + 'static,
    {
        Awaitable::Pending(Box::pin(future))
    }
}

impl fmt::Debug for Awaitable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Awaitable::Ready(val) => f.debug_tuple("Ready").field(val).finish(),
            Awaitable::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A request a program yields instead of acting directly
#[derive(Debug)]
pub enum Effect {
    /// Named error, resolved by a catch handler
    Err { name: String, error: Val },
    /// Required context value
    Ctx { name: String },
    /// Optional context value; unhandled resolves to `Null`
    Opt { name: String },
    /// Asynchronous value
    Async(Awaitable),
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Err { .. } => EffectKind::Err,
            Effect::Ctx { .. } => EffectKind::Ctx,
            Effect::Opt { .. } => EffectKind::Opt,
            Effect::Async(_) => EffectKind::Async,
        }
    }

    /// Handler-matching name; async effects are anonymous
    pub fn name(&self) -> Option<&str> {
        match self {
            Effect::Err { name, .. } | Effect::Ctx { name } | Effect::Opt { name } => Some(name),
            Effect::Async(_) => None,
        }
    }

    /// Protocol shape of the effect (`{kind, name, error}`)
    ///
    /// Pending async effects have no value form and render as `{kind: "async"}`.
    pub fn to_val(&self) -> Val {
        let mut entries = vec![("kind", Val::from(self.kind().as_str()))];
        match self {
            Effect::Err { name, error } => {
                entries.push(("name", Val::from(name.as_str())));
                entries.push(("error", error.clone()));
            }
            Effect::Ctx { name } | Effect::Opt { name } => {
                entries.push(("name", Val::from(name.as_str())));
            }
            Effect::Async(Awaitable::Ready(val)) => entries.push(("awaitable", val.clone())),
            Effect::Async(Awaitable::Pending(_)) => {}
        }
        Val::object(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_wire_shape() {
        let effect = Effect::Err {
            name: "TestError".to_string(),
            error: Val::from("msg"),
        };
        let val = effect.to_val();
        assert_eq!(val.get("kind"), Some(&Val::from("err")));
        assert_eq!(val.get("name"), Some(&Val::from("TestError")));
        assert_eq!(val.get("error"), Some(&Val::from("msg")));

        let ctx = Effect::Opt { name: "Theme".to_string() }.to_val();
        assert_eq!(ctx.get("kind"), Some(&Val::from("opt")));
        assert_eq!(ctx.get("error"), None);
    }
}
