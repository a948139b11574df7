//! Argument groups and mutually exclusive groups.
//!
//! Groups hold [`ActionId`]s into their container; the container owns the
//! actions and shares its registry, defaults, and conflict handling with
//! every group. [`GroupMut`] and [`ExclusiveGroupMut`] are short-lived
//! views for adding arguments to a group.

use crate::argument::Argument;
use crate::container::{ActionId, ActionsContainer, ExclusiveGroupId, GroupId, Placement};
use crate::error::ConstructionError;

/// Titled section of arguments, rendered as its own block in help output.
#[derive(Debug, Clone, Default)]
pub struct ArgumentGroup {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) actions: Vec<ActionId>,
}

impl ArgumentGroup {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn action_ids(&self) -> &[ActionId] {
        &self.actions
    }
}

/// Set of optionals of which at most one may be given (exactly one when
/// `required`).
#[derive(Debug, Clone, Default)]
pub struct MutuallyExclusiveGroup {
    pub(crate) required: bool,
    pub(crate) actions: Vec<ActionId>,
    /// Argument group the members are listed under in help.
    pub(crate) group: Option<GroupId>,
}

impl MutuallyExclusiveGroup {
    pub fn required(&self) -> bool {
        self.required
    }

    pub fn action_ids(&self) -> &[ActionId] {
        &self.actions
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }
}

/// Mutable view of one argument group.
#[derive(Debug)]
pub struct GroupMut<'a> {
    container: &'a mut ActionsContainer,
    id: GroupId,
}

impl<'a> GroupMut<'a> {
    pub(crate) fn new(container: &'a mut ActionsContainer, id: GroupId) -> Self {
        Self { container, id }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Adds an argument to the owning container and lists it in this group.
    pub fn add_argument(&mut self, argument: Argument) -> Result<ActionId, ConstructionError> {
        self.container
            .add_argument_to(argument, Placement::Group(self.id))
    }

    /// Creates a mutually exclusive group whose members are listed in this
    /// group.
    pub fn add_mutually_exclusive_group(&mut self, required: bool) -> ExclusiveGroupMut<'_> {
        let id = self
            .container
            .push_exclusive_group(required, Some(self.id));
        ExclusiveGroupMut::new(self.container, id)
    }
}

/// Mutable view of one mutually exclusive group.
#[derive(Debug)]
pub struct ExclusiveGroupMut<'a> {
    container: &'a mut ActionsContainer,
    id: ExclusiveGroupId,
}

impl<'a> ExclusiveGroupMut<'a> {
    pub(crate) fn new(container: &'a mut ActionsContainer, id: ExclusiveGroupId) -> Self {
        Self { container, id }
    }

    pub fn id(&self) -> ExclusiveGroupId {
        self.id
    }

    /// Adds an optional argument to the group. Required arguments are
    /// rejected.
    pub fn add_argument(&mut self, argument: Argument) -> Result<ActionId, ConstructionError> {
        self.container
            .add_argument_to(argument, Placement::Exclusive(self.id))
    }
}
