//! Metadata snapshots and request-scoped context
//!
//! This module provides:
//! - `Metadata`: the channel, context and fields attached to one record
//! - `Context`: an immutable, cheaply cloned bag of request-scoped values
//! - `Span`: the tracing capability a context may carry
//! - `ContextFieldsResolver`: derives fields from an attached context

use super::value::Fields;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Channel used until `with_channel` is called.
pub const CHANNEL_DEFAULT: &str = "default";

/// Tracing span that error-class records are reported to.
pub trait Span: Send + Sync {
    fn add_error(&self, err: &(dyn std::error::Error + 'static));
}

/// Derives fields from a request context. Resolvers run in registration
/// order whenever a context is attached; later resolvers win on collisions.
pub type ContextFieldsResolver = Arc<dyn Fn(&Context) -> Fields + Send + Sync>;

/// Immutable request-scoped values.
///
/// Values are keyed by type. `with_value` and `with_span` return a new
/// context and leave the receiver untouched.
///
/// # Example
///
/// ```
/// use chain_logger::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct RequestId(String);
///
/// let ctx = Context::new().with_value(RequestId("req-1".into()));
/// assert_eq!(ctx.get::<RequestId>(), Some(&RequestId("req-1".into())));
/// assert!(Context::new().get::<RequestId>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    span: Option<Arc<dyn Span>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = HashMap::clone(&self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));

        Self {
            values: Arc::new(values),
            span: self.span.clone(),
        }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    #[must_use]
    pub fn with_span(&self, span: Arc<dyn Span>) -> Self {
        Self {
            values: Arc::clone(&self.values),
            span: Some(span),
        }
    }

    /// The current tracing span, if any.
    pub fn span(&self) -> Option<&Arc<dyn Span>> {
        self.span.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .field("span", &self.span.is_some())
            .finish()
    }
}

/// Everything attached to a record besides level, message and error.
///
/// A `Metadata` value is never changed once built; chaining on a logger
/// produces a new one.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub(crate) channel: String,
    pub(crate) context: Option<Context>,
    pub(crate) context_fields: Fields,
    pub(crate) fields: Fields,
    pub(crate) tags: Fields,
}

impl Metadata {
    pub fn new(tags: Fields) -> Self {
        Self {
            channel: CHANNEL_DEFAULT.to_string(),
            context: None,
            context_fields: Fields::new(),
            fields: Fields::new(),
            tags,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn context_fields(&self) -> &Fields {
        &self.context_fields
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn tags(&self) -> &Fields {
        &self.tags
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new(Fields::new())
    }
}
