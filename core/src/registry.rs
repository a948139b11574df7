//! Name-keyed registry of action constructors and type converters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::{
    Action, AppendAction, AppendConstAction, BooleanOptionalAction, CountAction, ExtendAction,
    HelpAction, StoreAction, StoreConstAction, SubParsersAction, VersionAction,
};
use crate::argument::Argument;
use crate::convert::{Converter, builtin_converters};
use crate::error::ConstructionError;

/// Builds an action from a normalized argument specification.
pub type ActionFactory =
    Arc<dyn Fn(&Argument) -> Result<Box<dyn Action>, ConstructionError> + Send + Sync>;

/// Two-scope registry: `action` keys select an [`ActionFactory`], `type`
/// keys select a [`Converter`].
///
/// Registering an existing key replaces the previous entry.
///
/// # Examples
///
/// ```
/// use argkit_core::{Argument, CountAction, Registry};
///
/// let mut registry = Registry::with_builtins();
/// registry.register_action("tally", |argument: &Argument| {
///     Ok(Box::new(CountAction::new(argument)?))
/// });
/// assert!(registry.action("tally").is_some());
/// assert!(registry.converter("int").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    actions: HashMap<String, ActionFactory>,
    types: HashMap<String, Converter>,
}

fn boxed<A, F>(
    build: F,
) -> impl Fn(&Argument) -> Result<Box<dyn Action>, ConstructionError> + Send + Sync + 'static
where
    A: Action + 'static,
    F: Fn(&Argument) -> Result<A, ConstructionError> + Send + Sync + 'static,
{
    move |argument: &Argument| build(argument).map(|action| Box::new(action) as Box<dyn Action>)
}

impl Registry {
    /// Empty registry with no actions or converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard actions and the `str`, `int`,
    /// `float`, and `bool` converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_action("", boxed(StoreAction::new));
        registry.register_action("store", boxed(StoreAction::new));
        registry.register_action("store_const", boxed(StoreConstAction::new));
        registry.register_action("store_true", boxed(StoreConstAction::store_true));
        registry.register_action("store_false", boxed(StoreConstAction::store_false));
        registry.register_action("append", boxed(AppendAction::new));
        registry.register_action("append_const", boxed(AppendConstAction::new));
        registry.register_action("extend", boxed(ExtendAction::new));
        registry.register_action("count", boxed(CountAction::new));
        registry.register_action("help", boxed(HelpAction::new));
        registry.register_action("version", boxed(VersionAction::new));
        registry.register_action("parsers", boxed(SubParsersAction::new));
        registry.register_action("boolean_optional", boxed(BooleanOptionalAction::new));
        for converter in builtin_converters() {
            registry.register_type(converter);
        }
        registry
    }

    pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Argument) -> Result<Box<dyn Action>, ConstructionError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(factory));
    }

    /// Registers `converter` under its own name.
    pub fn register_type(&mut self, converter: Converter) {
        self.types.insert(converter.name().to_string(), converter);
    }

    pub fn action(&self, name: &str) -> Option<&ActionFactory> {
        self.actions.get(name)
    }

    pub fn converter(&self, name: &str) -> Option<&Converter> {
        self.types.get(name)
    }

    /// Registered action keys, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered converter names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("actions", &self.action_names())
            .field("types", &self.type_names())
            .finish()
    }
}
