//! Handler tables
//!
//! A table belongs to exactly one try-scope and is immutable once the scope
//! is entered. Lookups walk tables innermost first and stop at the first
//! table that declares the name for the effect's kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::program::{BoxProgram, Program};
use crate::types::Val;

pub type CatchFn = Arc<dyn Fn(Val) -> Val + Send + Sync>;
pub type CatchAnyFn = Arc<dyn Fn(&str, Val) -> Val + Send + Sync>;
pub type ProviderFn = Arc<dyn Fn() -> BoxProgram + Send + Sync>;

/// Resolution logic registered under one effect name
#[derive(Clone)]
pub enum Handler {
    /// Error effects: the callback's value becomes the try-expression's value
    Catch(CatchFn),
    /// Context/option effects: resume with a literal value
    Value(Val),
    /// Context/option effects: run a fresh program and resume with its value
    Provider(ProviderFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Catch(_) => f.write_str("Catch(..)"),
            Handler::Value(val) => f.debug_tuple("Value").field(val).finish(),
            Handler::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// How a context/option request gets answered
pub(crate) enum Provision {
    Value(Val),
    Program(BoxProgram),
}

/* ===================== Handler Table ===================== */

#[derive(Clone, Default)]
pub struct HandlerTable {
    entries: HashMap<String, Handler>,
    catch_any: Option<CatchAnyFn>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catch the error effect `name`
    pub fn catch<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Val) -> Val + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Handler::Catch(Arc::new(f)));
        self
    }

    /// Catch every error effect; the callback receives the effect name
    pub fn catch_any<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Val) -> Val + Send + Sync + 'static,
    {
        self.catch_any = Some(Arc::new(f));
        self
    }

    /// Answer context/option requests for `name` with a value
    pub fn provide(mut self, name: impl Into<String>, value: impl Into<Val>) -> Self {
        self.entries
            .insert(name.into(), Handler::Value(value.into()));
        self
    }

    /// Answer context/option requests for `name` by running a program
    pub fn provide_with<F, P>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Program + 'static,
    {
        let provider: ProviderFn = Arc::new(move || Box::new(f()) as BoxProgram);
        self.entries.insert(name.into(), Handler::Provider(provider));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.catch_any.is_none()
    }

    /// Whether this table resolves the error effect `name`
    pub fn catches(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Handler::Catch(_))) || self.catch_any.is_some()
    }

    /// Run the catch callback for `name`
    ///
    /// Callers check [`HandlerTable::catches`] first; an unknown name yields
    /// the error payload unchanged.
    pub(crate) fn recover(&self, name: &str, error: Val) -> Val {
        match (self.entries.get(name), &self.catch_any) {
            (Some(Handler::Catch(f)), _) => f(error),
            (_, Some(f)) => f(name, error),
            _ => error,
        }
    }

    pub(crate) fn provision(&self, name: &str) -> Option<Provision> {
        match self.entries.get(name)? {
            Handler::Value(val) => Some(Provision::Value(val.clone())),
            Handler::Provider(f) => Some(Provision::Program(f())),
            Handler::Catch(_) => None,
        }
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("entries", &self.entries)
            .field("catch_any", &self.catch_any.is_some())
            .finish()
    }
}

/* ===================== Handler Chain ===================== */

/// Snapshot of the tables visible at some point, innermost first
///
/// Scheduled tasks inherit the chain of their `concurrent` call site so
/// context and option requests resolve as they would in the caller.
#[derive(Debug, Clone, Default)]
pub struct HandlerChain {
    tables: Vec<Arc<HandlerTable>>,
}

impl HandlerChain {
    pub fn new(tables: Vec<Arc<HandlerTable>>) -> Self {
        HandlerChain { tables }
    }

    pub fn push(&mut self, table: Arc<HandlerTable>) {
        self.tables.push(table);
    }

    pub fn extend(&mut self, outer: &HandlerChain) {
        self.tables.extend(outer.tables.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub(crate) fn provision(&self, name: &str) -> Option<Provision> {
        self.tables.iter().find_map(|table| table.provision(name))
    }
}

impl From<HandlerTable> for HandlerChain {
    fn from(table: HandlerTable) -> Self {
        HandlerChain::new(vec![Arc::new(table)])
    }
}
