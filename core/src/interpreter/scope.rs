//! try / handle / finally composition

use std::sync::Arc;

use super::handlers::HandlerTable;
use crate::program::{BoxProgram, Cx, Program, Resume, Yield};

/// A body program entered together with its handler table and cleanup
///
/// Produced by [`Try`]; the interpreter turns it into a scope frame.
pub struct Scope {
    pub(crate) body: BoxProgram,
    pub(crate) table: Arc<HandlerTable>,
    pub(crate) cleanup: Option<BoxProgram>,
}

impl Scope {
    pub fn new(body: BoxProgram, table: HandlerTable, cleanup: Option<BoxProgram>) -> Self {
        Scope {
            body,
            table: Arc::new(table),
            cleanup,
        }
    }
}

/// `try(program).handle(table).finally(cleanup)`
///
/// The body's effects are resolved by `table` before any enclosing scope.
/// The cleanup runs exactly once when the body leaves the scope, whichever
/// way it leaves, and before any catch callback of `table`. Its own effects
/// are resolved by `table` too.
pub struct Try {
    scope: Option<Scope>,
}

impl Try {
    pub fn new<P: Program + 'static>(body: P) -> Self {
        Try {
            scope: Some(Scope::new(Box::new(body), HandlerTable::new(), None)),
        }
    }

    /// Install the handler table for this scope
    pub fn handle(mut self, table: HandlerTable) -> Self {
        if let Some(scope) = self.scope.as_mut() {
            scope.table = Arc::new(table);
        }
        self
    }

    /// Attach a cleanup program to the body
    pub fn finally<P: Program + 'static>(mut self, cleanup: P) -> Self {
        if let Some(scope) = self.scope.as_mut() {
            scope.cleanup = Some(Box::new(cleanup));
        }
        self
    }
}

impl Program for Try {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match self.scope.take() {
            Some(scope) => Yield::Enter(scope),
            // The scope's outcome comes straight back as our own
            None => input.into_yield(),
        }
    }
}
