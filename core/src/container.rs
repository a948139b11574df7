//! Argument bookkeeping shared by parsers and their groups.
//!
//! [`ActionsContainer`] turns [`Argument`] specifications into actions,
//! indexes them by option string, resolves option-string conflicts, tracks
//! argument groups and mutually exclusive groups, and holds the
//! container-level defaults.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, action_name};
use crate::argument::Argument;
use crate::convert::Converter;
use crate::error::ConstructionError;
use crate::group::{ArgumentGroup, ExclusiveGroupMut, GroupMut, MutuallyExclusiveGroup};
use crate::nargs::Nargs;
use crate::registry::Registry;
use crate::value::{DefaultValue, Value};

/// Matches strings that look like negative numbers (`-1`, `-.5`, `-2.0`).
pub(crate) static NEGATIVE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\d+$|^-\d*\.\d+$").expect("static regex must compile")
});

/// Stable handle to an action owned by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(usize);

/// Handle to an argument group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

/// Handle to a mutually exclusive group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExclusiveGroupId(usize);

/// What to do when a new argument reuses an existing option string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictHandler {
    /// Reject the new argument.
    #[default]
    Error,
    /// Strip the reused strings from the older argument, dropping it once it
    /// has none left.
    Resolve,
}

impl FromStr for ConflictHandler {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(ConflictHandler::Error),
            "resolve" => Ok(ConflictHandler::Resolve),
            other => Err(ConstructionError::InvalidConflictHandler(other.to_string())),
        }
    }
}

/// Where a newly added action is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The default positional or optional group, when installed.
    Auto,
    /// No group.
    Container,
    Group(GroupId),
    Exclusive(ExclusiveGroupId),
}

#[derive(Debug, Clone)]
struct Entry {
    id: ActionId,
    action: Box<dyn Action>,
}

#[derive(Debug, Clone, Copy)]
struct DefaultGroups {
    positionals: GroupId,
    optionals: GroupId,
}

/// Owns the actions of a parser together with their groups and defaults.
#[derive(Debug, Clone)]
pub struct ActionsContainer {
    prefix_chars: String,
    argument_default: DefaultValue,
    conflict_handler: ConflictHandler,
    registry: Registry,
    entries: Vec<Entry>,
    option_string_actions: BTreeMap<String, ActionId>,
    groups: Vec<ArgumentGroup>,
    exclusive_groups: Vec<MutuallyExclusiveGroup>,
    defaults: BTreeMap<String, Value>,
    has_negative_number_optionals: bool,
    default_groups: Option<DefaultGroups>,
    next_id: usize,
}

impl ActionsContainer {
    pub fn new(
        prefix_chars: impl Into<String>,
        argument_default: DefaultValue,
        conflict_handler: ConflictHandler,
    ) -> Self {
        Self {
            prefix_chars: prefix_chars.into(),
            argument_default,
            conflict_handler,
            registry: Registry::with_builtins(),
            entries: Vec::new(),
            option_string_actions: BTreeMap::new(),
            groups: Vec::new(),
            exclusive_groups: Vec::new(),
            defaults: BTreeMap::new(),
            has_negative_number_optionals: false,
            default_groups: None,
            next_id: 0,
        }
    }

    /// Creates the titled groups that positionals and optionals land in when
    /// added without an explicit group.
    pub(crate) fn install_default_groups(&mut self, positionals: &str, optionals: &str) {
        let positionals = self.push_group(Some(positionals.to_string()), None);
        let optionals = self.push_group(Some(optionals.to_string()), None);
        self.default_groups = Some(DefaultGroups {
            positionals,
            optionals,
        });
    }

    pub fn prefix_chars(&self) -> &str {
        &self.prefix_chars
    }

    pub fn argument_default(&self) -> &DefaultValue {
        &self.argument_default
    }

    pub fn conflict_handler(&self) -> ConflictHandler {
        self.conflict_handler
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Argument) -> Result<Box<dyn Action>, ConstructionError> + Send + Sync + 'static,
    {
        self.registry.register_action(name, factory);
    }

    pub fn register_type(&mut self, converter: Converter) {
        self.registry.register_type(converter);
    }

    /// Adds an argument, listing it in the default group for its kind.
    pub fn add_argument(&mut self, argument: Argument) -> Result<ActionId, ConstructionError> {
        self.add_argument_to(argument, Placement::Auto)
    }

    pub(crate) fn add_argument_to(
        &mut self,
        argument: Argument,
        placement: Placement,
    ) -> Result<ActionId, ConstructionError> {
        let action = self.build_action(argument)?;
        self.add_action(action, placement)
    }

    /// Normalizes `argument` and constructs its action without adding it.
    pub fn build_action(&self, mut argument: Argument) -> Result<Box<dyn Action>, ConstructionError> {
        let positional = match argument.option_strings.as_slice() {
            [] => true,
            [single] => !single
                .chars()
                .next()
                .is_some_and(|c| self.prefix_chars.contains(c)),
            _ => false,
        };
        if positional {
            self.normalize_positional(&mut argument)?;
        } else {
            self.normalize_optional(&mut argument)?;
        }

        if argument.default.is_unset() {
            let dest = argument.dest.as_deref().unwrap_or_default();
            if let Some(value) = self.defaults.get(dest) {
                argument.default = DefaultValue::Value(value.clone());
            } else if !self.argument_default.is_unset() {
                argument.default = self.argument_default.clone();
            }
        }

        if argument.converter.is_none() {
            if let Some(name) = &argument.type_name {
                let converter = self
                    .registry
                    .converter(name)
                    .ok_or_else(|| ConstructionError::UnknownType(name.clone()))?;
                argument.converter = Some(converter.clone());
            }
        }

        let factory = self
            .registry
            .action(&argument.action)
            .ok_or_else(|| ConstructionError::UnknownAction(argument.action.clone()))?;
        let action = factory(&argument)?;

        let core = action.core();
        if core.is_positional() && core.takes_no_values() {
            return Err(ConstructionError::ZeroNargsPositional(
                action.kind().to_string(),
            ));
        }
        if let Some(metavar) = &core.metavar {
            metavar.check_arity(core.nargs)?;
        }
        Ok(action)
    }

    fn normalize_positional(&self, argument: &mut Argument) -> Result<(), ConstructionError> {
        let dest = match (argument.option_strings.pop(), argument.dest.take()) {
            (Some(token), Some(_)) => return Err(ConstructionError::DestSuppliedTwice(token)),
            (Some(token), None) => token,
            (None, Some(dest)) => dest,
            (None, None) => return Err(ConstructionError::MissingDest(String::new())),
        };
        if dest.is_empty() {
            return Err(ConstructionError::MissingDest(dest));
        }
        if argument.required.is_some() {
            return Err(ConstructionError::RequiredOnPositional);
        }
        argument.required = Some(!matches!(
            argument.nargs,
            Some(Nargs::Optional | Nargs::ZeroOrMore | Nargs::Remainder | Nargs::Suppress)
        ));
        argument.dest = Some(dest);
        Ok(())
    }

    fn normalize_optional(&self, argument: &mut Argument) -> Result<(), ConstructionError> {
        let prefix = &self.prefix_chars;
        let mut long_option = None;
        for option in &argument.option_strings {
            let mut chars = option.chars();
            if !chars.next().is_some_and(|c| prefix.contains(c)) {
                return Err(ConstructionError::InvalidOptionString {
                    option: option.clone(),
                    prefix_chars: prefix.clone(),
                });
            }
            if long_option.is_none() && chars.next().is_some_and(|c| prefix.contains(c)) {
                long_option = Some(option.as_str());
            }
        }

        if argument.dest.is_none() {
            let source = long_option.unwrap_or(argument.option_strings[0].as_str());
            let dest = source.trim_start_matches(|c| prefix.contains(c));
            if dest.is_empty() {
                return Err(ConstructionError::MissingDest(source.to_string()));
            }
            argument.dest = Some(dest.replace('-', "_"));
            argument.dest_inferred = true;
        }
        Ok(())
    }

    pub(crate) fn add_action(
        &mut self,
        action: Box<dyn Action>,
        placement: Placement,
    ) -> Result<ActionId, ConstructionError> {
        if matches!(placement, Placement::Exclusive(_)) && action.core().required {
            return Err(ConstructionError::RequiredInExclusiveGroup);
        }
        self.check_conflict(action.as_ref())?;

        let id = ActionId(self.next_id);
        self.next_id += 1;
        for option in &action.core().option_strings {
            self.option_string_actions.insert(option.clone(), id);
            if NEGATIVE_NUMBER.is_match(option) {
                self.has_negative_number_optionals = true;
            }
        }
        debug!(
            dest = %action.core().dest,
            kind = action.kind(),
            options = ?action.core().option_strings,
            "registered argument"
        );

        let positional = action.core().is_positional();
        self.entries.push(Entry { id, action });
        match placement {
            Placement::Container => {}
            Placement::Auto => self.list_in_default_group(id, positional),
            Placement::Group(group) => self.list_in_group(id, group),
            Placement::Exclusive(exclusive) => {
                let group = self
                    .exclusive_groups
                    .get(exclusive.0)
                    .and_then(|g| g.group);
                match group {
                    Some(group) => self.list_in_group(id, group),
                    None => self.list_in_default_group(id, positional),
                }
                if let Some(exclusive) = self.exclusive_groups.get_mut(exclusive.0) {
                    exclusive.actions.push(id);
                }
            }
        }
        Ok(id)
    }

    fn list_in_default_group(&mut self, id: ActionId, positional: bool) {
        if let Some(defaults) = self.default_groups {
            let group = if positional {
                defaults.positionals
            } else {
                defaults.optionals
            };
            self.list_in_group(id, group);
        }
    }

    fn list_in_group(&mut self, id: ActionId, group: GroupId) {
        if let Some(group) = self.groups.get_mut(group.0) {
            group.actions.push(id);
        }
    }

    fn check_conflict(&mut self, action: &dyn Action) -> Result<(), ConstructionError> {
        let conflicts: Vec<(String, ActionId)> = action
            .core()
            .option_strings
            .iter()
            .filter_map(|option| {
                self.option_string_actions
                    .get(option)
                    .map(|id| (option.clone(), *id))
            })
            .collect();
        if conflicts.is_empty() {
            return Ok(());
        }

        match self.conflict_handler {
            ConflictHandler::Error => Err(ConstructionError::ConflictingOptionStrings {
                argument: action_name(action.core()).unwrap_or_default(),
                options: conflicts.into_iter().map(|(option, _)| option).collect(),
            }),
            ConflictHandler::Resolve => {
                for (option, id) in conflicts {
                    self.option_string_actions.remove(&option);
                    let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
                        continue;
                    };
                    let core = entry.action.core_mut();
                    core.option_strings.retain(|o| o != &option);
                    debug!(option = %option, dest = %core.dest, "resolved option string conflict");
                    if core.option_strings.is_empty() {
                        self.remove_action(id);
                    }
                }
                Ok(())
            }
        }
    }

    /// Removes an action from the container and from every group.
    pub fn remove_action(&mut self, id: ActionId) -> Option<Box<dyn Action>> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(index);
        self.option_string_actions.retain(|_, owner| *owner != id);
        for group in &mut self.groups {
            group.actions.retain(|a| *a != id);
        }
        for group in &mut self.exclusive_groups {
            group.actions.retain(|a| *a != id);
        }
        Some(entry.action)
    }

    /// Sets container-level defaults and overrides the default of every
    /// action with a matching destination.
    pub fn set_defaults<I, K, V>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (dest, value) in defaults {
            let dest = dest.into();
            let value = value.into();
            for entry in &mut self.entries {
                if entry.action.core().dest == dest {
                    entry.action.core_mut().default = DefaultValue::Value(value.clone());
                }
            }
            self.defaults.insert(dest, value);
        }
    }

    /// Adds entries to the container-level defaults map only; action
    /// defaults are left as declared.
    pub(crate) fn merge_defaults(&mut self, defaults: &BTreeMap<String, Value>) {
        self.defaults
            .extend(defaults.iter().map(|(dest, value)| (dest.clone(), value.clone())));
    }

    /// Default for `dest`, preferring a non-null action default over the
    /// container-level map.
    pub fn get_default(&self, dest: &str) -> Option<Value> {
        let from_action = self.entries.iter().find_map(|entry| {
            let core = entry.action.core();
            match &core.default {
                DefaultValue::Value(value) if core.dest == dest && !value.is_null() => {
                    Some(value.clone())
                }
                _ => None,
            }
        });
        from_action.or_else(|| self.defaults.get(dest).cloned())
    }

    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    pub fn add_argument_group(
        &mut self,
        title: Option<&str>,
        description: Option<&str>,
    ) -> GroupMut<'_> {
        let id = self.push_group(title.map(str::to_string), description.map(str::to_string));
        GroupMut::new(self, id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<GroupMut<'_>> {
        if id.0 < self.groups.len() {
            Some(GroupMut::new(self, id))
        } else {
            None
        }
    }

    pub fn add_mutually_exclusive_group(&mut self, required: bool) -> ExclusiveGroupMut<'_> {
        let id = self.push_exclusive_group(required, None);
        ExclusiveGroupMut::new(self, id)
    }

    pub fn exclusive_group_mut(&mut self, id: ExclusiveGroupId) -> Option<ExclusiveGroupMut<'_>> {
        if id.0 < self.exclusive_groups.len() {
            Some(ExclusiveGroupMut::new(self, id))
        } else {
            None
        }
    }

    fn push_group(&mut self, title: Option<String>, description: Option<String>) -> GroupId {
        self.groups.push(ArgumentGroup {
            title,
            description,
            actions: Vec::new(),
        });
        GroupId(self.groups.len() - 1)
    }

    pub(crate) fn push_exclusive_group(
        &mut self,
        required: bool,
        group: Option<GroupId>,
    ) -> ExclusiveGroupId {
        self.exclusive_groups.push(MutuallyExclusiveGroup {
            required,
            actions: Vec::new(),
            group,
        });
        ExclusiveGroupId(self.exclusive_groups.len() - 1)
    }

    /// Copies every action and group of `other` into this container.
    ///
    /// Groups are matched by title; untitled groups are always copied as new
    /// groups. Actions go through the normal conflict check. On error this
    /// container is left unchanged.
    pub fn add_container_actions(&mut self, other: &ActionsContainer) -> Result<(), ConstructionError> {
        let mut merged = self.clone();
        merged.merge_container_actions(other)?;
        *self = merged;
        Ok(())
    }

    fn merge_container_actions(&mut self, other: &ActionsContainer) -> Result<(), ConstructionError> {
        let mut by_title: HashMap<String, GroupId> = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            if let Some(title) = &group.title {
                if by_title.insert(title.clone(), GroupId(index)).is_some() {
                    return Err(ConstructionError::DuplicateGroupTitle(title.clone()));
                }
            }
        }

        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
        let mut placements: HashMap<ActionId, Placement> = HashMap::new();
        for (index, group) in other.groups.iter().enumerate() {
            let existing = group.title.as_ref().and_then(|t| by_title.get(t).copied());
            let target = match existing {
                Some(target) => target,
                None => {
                    let target = self.push_group(group.title.clone(), group.description.clone());
                    if let Some(title) = &group.title {
                        by_title.insert(title.clone(), target);
                    }
                    target
                }
            };
            group_map.insert(GroupId(index), target);
            for action in &group.actions {
                placements.insert(*action, Placement::Group(target));
            }
        }

        for exclusive in &other.exclusive_groups {
            let group = exclusive.group.and_then(|g| group_map.get(&g).copied());
            let target = self.push_exclusive_group(exclusive.required, group);
            for action in &exclusive.actions {
                placements.insert(*action, Placement::Exclusive(target));
            }
        }

        for entry in &other.entries {
            let placement = placements
                .get(&entry.id)
                .copied()
                .unwrap_or(Placement::Container);
            self.add_action(entry.action.clone(), placement)?;
        }
        Ok(())
    }

    /// Actions in registration order.
    pub fn actions(&self) -> impl Iterator<Item = (ActionId, &dyn Action)> {
        self.entries.iter().map(|e| (e.id, e.action.as_ref()))
    }

    pub fn action(&self, id: ActionId) -> Option<&dyn Action> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.action.as_ref())
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut (dyn Action + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.action.as_mut())
    }

    /// Action registered under an exact option string.
    pub fn option_action(&self, option: &str) -> Option<(ActionId, &dyn Action)> {
        let id = *self.option_string_actions.get(option)?;
        self.action(id).map(|action| (id, action))
    }

    /// Every registered option string with its action, sorted by string.
    pub fn option_strings(&self) -> impl Iterator<Item = (&str, ActionId)> {
        self.option_string_actions
            .iter()
            .map(|(option, id)| (option.as_str(), *id))
    }

    pub fn positionals(&self) -> Vec<(ActionId, &dyn Action)> {
        self.actions()
            .filter(|(_, action)| action.core().is_positional())
            .collect()
    }

    pub fn optionals(&self) -> Vec<(ActionId, &dyn Action)> {
        self.actions()
            .filter(|(_, action)| !action.core().is_positional())
            .collect()
    }

    pub fn groups(&self) -> &[ArgumentGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&ArgumentGroup> {
        self.groups.get(id.0)
    }

    pub fn exclusive_groups(&self) -> &[MutuallyExclusiveGroup] {
        &self.exclusive_groups
    }

    pub fn has_negative_number_optionals(&self) -> bool {
        self.has_negative_number_optionals
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
