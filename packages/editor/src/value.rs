//! Values supplied to an insert either directly or through a closure that
//! is evaluated once at insertion time.

use slotmark_parser::ComponentDefinition;
use std::fmt;

/// What a computed value gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ValueContext<'a> {
    pub definition: &'a ComponentDefinition,
    pub position: usize,
}

pub type ValueFn<T> = Box<dyn Fn(&ValueContext<'_>) -> anyhow::Result<T>>;

pub enum DynamicValue<T> {
    Literal(T),
    Computed(ValueFn<T>),
}

impl<T> DynamicValue<T> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ValueContext<'_>) -> anyhow::Result<T> + 'static,
    {
        DynamicValue::Computed(Box::new(f))
    }

    /// Evaluate; a failing closure yields `fallback`
    pub fn resolve(self, ctx: &ValueContext<'_>, fallback: T) -> T {
        match self {
            DynamicValue::Literal(value) => value,
            DynamicValue::Computed(f) => match f(ctx) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        component_type = %ctx.definition.component_type,
                        error = %err,
                        "computed value failed, using fallback"
                    );
                    fallback
                }
            },
        }
    }
}

impl<T> From<T> for DynamicValue<T> {
    fn from(value: T) -> Self {
        DynamicValue::Literal(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DynamicValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
