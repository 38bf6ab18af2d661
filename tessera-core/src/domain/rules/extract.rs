// tessera-core/src/domain/rules/extract.rs

use crate::domain::context::Context;
use crate::domain::error::DomainError;
use crate::domain::rules::DeclLocation;
use crate::error::TesseraError;
use serde_json::Value;
use std::sync::Arc;

/// The ordered sequence of values one extraction step contributes before
/// merge into the output record.
pub type Accumulator = Vec<Value>;

type ItemFn<I> = Arc<dyn Fn(&I, &mut Accumulator) -> Result<(), TesseraError> + Send + Sync>;
type ContextFn<I> =
    Arc<dyn Fn(&I, &mut Accumulator, &mut Context<I>) -> Result<(), TesseraError> + Send + Sync>;

/// An extraction (or refinement) callable, declared with an explicit
/// capability shape: either `(item, accumulator)` or
/// `(item, accumulator, context)`. The shape is chosen by the author at
/// declaration time, never inferred at call time.
pub enum Extract<I> {
    /// Two-parameter shape: `(item, accumulator)`.
    Item(ItemFn<I>),
    /// Three-parameter shape: `(item, accumulator, context)`.
    Context(ContextFn<I>),
}

impl<I> Clone for Extract<I> {
    fn clone(&self) -> Self {
        match self {
            Extract::Item(f) => Extract::Item(f.clone()),
            Extract::Context(f) => Extract::Context(f.clone()),
        }
    }
}

impl<I> Extract<I> {
    pub fn with_item(
        f: impl Fn(&I, &mut Accumulator) -> Result<(), TesseraError> + Send + Sync + 'static,
    ) -> Self {
        Extract::Item(Arc::new(f))
    }

    pub fn with_context(
        f: impl Fn(&I, &mut Accumulator, &mut Context<I>) -> Result<(), TesseraError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Extract::Context(Arc::new(f))
    }

    /// Declaration path for config shims where the callable's parameter count
    /// arrives as data. Anything other than 2 or 3 parameters is rejected at
    /// declaration time, before any record is read.
    #[track_caller]
    pub fn dynamic(
        params: usize,
        f: impl Fn(&I, &mut Accumulator, &mut Context<I>) -> Result<(), TesseraError>
            + Send
            + Sync
            + 'static,
    ) -> Result<Self, DomainError> {
        let location = DeclLocation::capture();
        match params {
            2 | 3 => Ok(Extract::Context(Arc::new(f))),
            other => Err(DomainError::Arity {
                detail: format!(
                    "extraction callable declares {} positional parameters, needs 2 or 3",
                    other
                ),
                location,
            }),
        }
    }

    pub fn declared_params(&self) -> usize {
        match self {
            Extract::Item(_) => 2,
            Extract::Context(_) => 3,
        }
    }

    pub fn run(
        &self,
        item: &I,
        accumulator: &mut Accumulator,
        context: &mut Context<I>,
    ) -> Result<(), TesseraError> {
        match self {
            Extract::Item(f) => f(item, accumulator),
            Extract::Context(f) => f(item, accumulator, context),
        }
    }
}
