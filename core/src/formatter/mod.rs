//! Help and usage rendering.
//!
//! [`HelpFormatter`] accumulates a tree of sections holding text blocks,
//! usage requests, and action entries, then renders the whole tree in one
//! pass with [`HelpFormatter::format_help`]. Layout is controlled by
//! [`FormatterSettings`]; the [`HelpStyle`] flags select between wrapped and
//! raw text, default annotations, and type-derived metavars.

mod text;
mod usage;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionCore, choices_label};
use crate::argument::Metavar;
use crate::nargs::Nargs;
use crate::value::{DefaultValue, SUPPRESS, Value};

pub use text::{expand_placeholders, wrap};
pub use usage::UsageGroup;

use text::{display_width, fill, indent_lines, join_parts, normalize_whitespace};

/// Terminal width assumed when none is configured.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// How description, epilog, and help text are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Whitespace is collapsed and everything is re-wrapped.
    #[default]
    Wrapped,
    /// Description and epilog keep their line breaks; help is wrapped.
    RawDescription,
    /// Description, epilog, and help all keep their line breaks.
    RawText,
}

/// Optional presentation tweaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpStyle {
    pub text: TextMode,
    /// Append ` (default: ...)` to help lines.
    pub show_defaults: bool,
    /// Use the converter name instead of the destination as the default
    /// metavar.
    pub metavar_from_type: bool,
}

/// Layout settings for a [`HelpFormatter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterSettings {
    /// Total width; defaults to [`DEFAULT_TERMINAL_WIDTH`] minus 2.
    pub width: Option<usize>,
    pub indent_increment: usize,
    pub max_help_position: usize,
    pub style: HelpStyle,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            width: None,
            indent_increment: 2,
            max_help_position: 24,
            style: HelpStyle::default(),
        }
    }
}

struct Section<'a> {
    parent: Option<usize>,
    heading: Option<String>,
    items: Vec<Item<'a>>,
}

#[derive(Clone)]
enum Item<'a> {
    Section(usize),
    Text(String),
    Usage(UsageRequest<'a>),
    Action(&'a dyn Action),
}

#[derive(Clone)]
struct UsageRequest<'a> {
    usage: Option<String>,
    actions: Vec<&'a dyn Action>,
    groups: Vec<UsageGroup<'a>>,
    prefix: Option<String>,
}

/// Builds help text from sections, text blocks, usage, and actions.
///
/// # Examples
///
/// ```
/// use argkit_core::{FormatterSettings, HelpFormatter};
///
/// let mut formatter = HelpFormatter::new("tool", &FormatterSettings::default());
/// formatter.add_usage(None, Vec::new(), Vec::new(), None);
/// formatter.start_section(Some("notes"));
/// formatter.add_text(Some("%(prog)s has no arguments."));
/// formatter.end_section();
/// assert_eq!(
///     formatter.format_help(),
///     "usage: tool\n\nnotes:\n  tool has no arguments.\n"
/// );
/// ```
pub struct HelpFormatter<'a> {
    prog: String,
    indent_increment: usize,
    max_help_position: usize,
    width: usize,
    style: HelpStyle,
    current_indent: usize,
    level: usize,
    action_max_length: usize,
    sections: Vec<Section<'a>>,
    current: usize,
}

impl<'a> HelpFormatter<'a> {
    pub fn new(prog: impl Into<String>, settings: &FormatterSettings) -> Self {
        let width = settings
            .width
            .unwrap_or(DEFAULT_TERMINAL_WIDTH.saturating_sub(2));
        let max_help_position = settings.max_help_position.min(
            width
                .saturating_sub(20)
                .max(settings.indent_increment * 2),
        );
        Self {
            prog: prog.into(),
            indent_increment: settings.indent_increment,
            max_help_position,
            width,
            style: settings.style,
            current_indent: 0,
            level: 0,
            action_max_length: 0,
            sections: vec![Section {
                parent: None,
                heading: None,
                items: Vec::new(),
            }],
            current: 0,
        }
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn max_help_position(&self) -> usize {
        self.max_help_position
    }

    pub fn current_indent(&self) -> usize {
        self.current_indent
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn indent(&mut self) {
        self.current_indent += self.indent_increment;
        self.level += 1;
    }

    /// # Panics
    ///
    /// Panics when the indent would drop below zero.
    pub fn dedent(&mut self) {
        match self.current_indent.checked_sub(self.indent_increment) {
            Some(indent) => self.current_indent = indent,
            None => panic!("indent decreased below 0"),
        }
        self.level = self.level.saturating_sub(1);
    }

    pub fn start_section(&mut self, heading: Option<&str>) {
        self.indent();
        self.sections.push(Section {
            parent: Some(self.current),
            heading: heading.map(str::to_string),
            items: Vec::new(),
        });
        let index = self.sections.len() - 1;
        self.push_item(Item::Section(index));
        self.current = index;
    }

    pub fn end_section(&mut self) {
        if let Some(parent) = self.sections[self.current].parent {
            self.current = parent;
        }
        self.dedent();
    }

    pub fn add_text(&mut self, text: Option<&str>) {
        if let Some(text) = text.filter(|t| *t != SUPPRESS) {
            self.push_item(Item::Text(text.to_string()));
        }
    }

    pub fn add_usage(
        &mut self,
        usage: Option<&str>,
        actions: Vec<&'a dyn Action>,
        groups: Vec<UsageGroup<'a>>,
        prefix: Option<&str>,
    ) {
        if usage == Some(SUPPRESS) {
            return;
        }
        self.push_item(Item::Usage(UsageRequest {
            usage: usage.map(str::to_string),
            actions,
            groups,
            prefix: prefix.map(str::to_string),
        }));
    }

    pub fn add_argument(&mut self, action: &'a dyn Action) {
        if action.core().is_help_suppressed() {
            return;
        }
        let invocation_width = std::iter::once(action)
            .chain(action.subactions())
            .map(|a| display_width(&self.format_action_invocation(a)))
            .max()
            .unwrap_or(0);
        self.action_max_length = self
            .action_max_length
            .max(invocation_width + self.current_indent);
        self.push_item(Item::Action(action));
    }

    pub fn add_arguments<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = &'a dyn Action>,
    {
        for action in actions {
            self.add_argument(action);
        }
    }

    fn push_item(&mut self, item: Item<'a>) {
        self.sections[self.current].items.push(item);
    }

    /// Renders everything added so far.
    pub fn format_help(&mut self) -> String {
        let rendered = self.render_section(0);
        let collapsed = collapse_blank_runs(&rendered);
        let trimmed = collapsed.trim_matches('\n');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        }
    }

    fn render_section(&mut self, index: usize) -> String {
        let parent = self.sections[index].parent;
        if parent.is_some() {
            self.indent();
        }
        let items = self.sections[index].items.clone();
        let parts: Vec<String> = items.iter().map(|item| self.render_item(item)).collect();
        let item_help = join_parts(&parts);
        if parent.is_some() {
            self.dedent();
        }

        if item_help.is_empty() {
            return String::new();
        }
        let heading = match (&self.sections[index].heading, parent) {
            (Some(heading), Some(_)) if heading != SUPPRESS => {
                format!("{:width$}{heading}:\n", "", width = self.current_indent)
            }
            _ => String::new(),
        };
        join_parts(&["\n".to_string(), heading, item_help, "\n".to_string()])
    }

    fn render_item(&mut self, item: &Item<'a>) -> String {
        match item {
            Item::Section(index) => self.render_section(*index),
            Item::Text(text) => self.format_text(text),
            Item::Usage(request) => self.format_usage(
                request.usage.as_deref(),
                &request.actions,
                &request.groups,
                request.prefix.as_deref(),
            ),
            Item::Action(action) => self.format_action(*action),
        }
    }

    fn format_text(&self, text: &str) -> String {
        let text = if text.contains("%(prog)") {
            expand_placeholders(text, |key| (key == "prog").then(|| self.prog.clone()))
        } else {
            text.to_string()
        };
        let text_width = self.width.saturating_sub(self.current_indent).max(11);
        let indent = " ".repeat(self.current_indent);
        format!("{}\n\n", self.fill_text(&text, text_width, &indent))
    }

    fn format_action(&mut self, action: &'a dyn Action) -> String {
        let core = action.core();
        let help_position = (self.action_max_length + 2).min(self.max_help_position);
        let help_width = self.width.saturating_sub(help_position).max(11);
        let action_width = help_position
            .saturating_sub(self.current_indent)
            .saturating_sub(2);
        let header = self.format_action_invocation(action);
        let indent = " ".repeat(self.current_indent);

        let has_help = core.help.as_deref().is_some_and(|h| !h.is_empty());
        let header_width = display_width(&header);
        let (action_header, indent_first) = if !has_help {
            (format!("{indent}{header}\n"), 0)
        } else if header_width <= action_width {
            let padding = " ".repeat(action_width - header_width);
            (format!("{indent}{header}{padding}  "), 0)
        } else {
            (format!("{indent}{header}\n"), help_position)
        };

        let mut parts = vec![action_header.clone()];
        let help_lines = if core.help.as_deref().is_some_and(|h| !h.trim().is_empty()) {
            let help_text = self.expand_help(action);
            self.split_lines(&help_text, help_width)
        } else {
            Vec::new()
        };
        if let Some((first, rest)) = help_lines.split_first() {
            parts.push(format!("{:indent_first$}{first}\n", ""));
            for line in rest {
                parts.push(format!("{:help_position$}{line}\n", ""));
            }
        } else if !action_header.ends_with('\n') {
            parts.push("\n".to_string());
        }

        let subactions = action.subactions();
        if !subactions.is_empty() {
            self.indent();
            for subaction in subactions {
                let rendered = self.format_action(subaction);
                parts.push(rendered);
            }
            self.dedent();
        }
        join_parts(&parts)
    }

    /// Option strings and metavars as shown at the start of a help entry:
    /// `-f, --foo FOO` for optionals, the metavar for positionals.
    pub fn format_action_invocation(&self, action: &dyn Action) -> String {
        let core = action.core();
        if core.is_positional() {
            let default = self.default_metavar_for_positional(core);
            self.metavar_parts(core, &default, 1).join(" ")
        } else if core.takes_no_values() {
            core.option_strings.join(", ")
        } else {
            let default = self.default_metavar_for_optional(core);
            format!(
                "{} {}",
                core.option_strings.join(", "),
                self.format_args(core, &default)
            )
        }
    }

    fn metavar_parts(&self, core: &ActionCore, default: &str, size: usize) -> Vec<String> {
        match (&core.metavar, &core.choices) {
            (Some(metavar), _) => metavar.parts(size),
            (None, Some(choices)) => vec![choices_label(choices); size],
            (None, None) => vec![default.to_string(); size],
        }
    }

    /// Renders the values an action consumes, e.g. `[FOO ...]` or `X Y`.
    pub fn format_args(&self, core: &ActionCore, default_metavar: &str) -> String {
        let single = |size| self.metavar_parts(core, default_metavar, size);
        match core.nargs {
            None => single(1).join(" "),
            Some(Nargs::Optional) => format!("[{}]", single(1).join(" ")),
            Some(Nargs::ZeroOrMore) => match single(1).as_slice() {
                [first, second] => format!("[{first} [{second} ...]]"),
                parts => format!("[{} ...]", parts.join(" ")),
            },
            Some(Nargs::OneOrMore) => match single(1).as_slice() {
                [first, second] => format!("{first} [{second} ...]"),
                parts => format!("[{} ...]", parts.join(" ")),
            },
            Some(Nargs::Remainder) => "...".to_string(),
            Some(Nargs::Parser) => format!("{} ...", single(1).join(" ")),
            Some(Nargs::Suppress) => String::new(),
            Some(Nargs::Exact(n)) => single(n).join(" "),
        }
    }

    fn default_metavar_for_optional(&self, core: &ActionCore) -> String {
        if self.style.metavar_from_type {
            self.type_metavar(core)
        } else {
            core.dest.to_uppercase()
        }
    }

    fn default_metavar_for_positional(&self, core: &ActionCore) -> String {
        if self.style.metavar_from_type {
            self.type_metavar(core)
        } else {
            core.dest.clone()
        }
    }

    fn type_metavar(&self, core: &ActionCore) -> String {
        core.converter
            .as_ref()
            .map_or_else(|| "str".to_string(), |c| c.name().to_string())
    }

    fn help_string(&self, core: &ActionCore) -> String {
        let mut help = core.help.clone().unwrap_or_default();
        if self.style.show_defaults
            && !help.contains("%(default)")
            && !core.default.is_suppress()
            && (!core.is_positional()
                || matches!(core.nargs, Some(Nargs::Optional | Nargs::ZeroOrMore)))
        {
            help.push_str(" (default: %(default)s)");
        }
        help
    }

    fn expand_help(&self, action: &dyn Action) -> String {
        let core = action.core();
        let none = || Some("None".to_string());
        let help = self.help_string(core);
        expand_placeholders(&help, |key| match key {
            "prog" => Some(self.prog.clone()),
            "dest" if !core.is_dest_suppressed() => Some(core.dest.clone()),
            "default" => match &core.default {
                DefaultValue::Suppress => None,
                other => Some(other.to_string()),
            },
            "const" => core
                .const_value
                .as_ref()
                .map(ToString::to_string)
                .or_else(none),
            "nargs" => match core.nargs {
                Some(Nargs::Suppress) => None,
                Some(nargs) => Some(nargs.to_string()),
                None => none(),
            },
            "choices" => core
                .choices
                .as_ref()
                .map(|choices| {
                    choices
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .or_else(none),
            "metavar" => match &core.metavar {
                Some(metavar) if metavar.is_suppressed() => None,
                Some(Metavar::Name(name)) => Some(name.clone()),
                Some(Metavar::Tuple(names)) => Some(format!("({})", names.join(", "))),
                None => none(),
            },
            "type" => core
                .converter
                .as_ref()
                .map(|c| c.name().to_string())
                .or_else(none),
            "required" => Some(Value::Bool(core.required).to_string()),
            "option_strings" => Some(
                Value::List(
                    core.option_strings
                        .iter()
                        .map(|o| Value::Str(o.clone()))
                        .collect(),
                )
                .to_string(),
            ),
            "help" => core.help.clone(),
            _ => None,
        })
    }

    fn split_lines(&self, text: &str, width: usize) -> Vec<String> {
        match self.style.text {
            TextMode::RawText => text.lines().map(str::to_string).collect(),
            TextMode::Wrapped | TextMode::RawDescription => wrap(&normalize_whitespace(text), width),
        }
    }

    fn fill_text(&self, text: &str, width: usize, indent: &str) -> String {
        match self.style.text {
            TextMode::Wrapped => fill(&normalize_whitespace(text), width, indent),
            TextMode::RawDescription | TextMode::RawText => indent_lines(text, indent),
        }
    }
}

/// Collapses three or more consecutive newlines into two.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::StoreAction;
    use crate::argument::Argument;

    fn formatter<'a>() -> HelpFormatter<'a> {
        HelpFormatter::new("prog", &FormatterSettings::default())
    }

    fn optional(option_strings: &[&str], dest: &str) -> StoreAction {
        StoreAction::new(&Argument::new(option_strings.iter().copied()).with_dest(dest)).unwrap()
    }

    #[test]
    fn test_indent_dedent_balance() {
        let mut f = formatter();
        f.indent();
        f.indent();
        assert_eq!(f.current_indent(), 4);
        assert_eq!(f.level(), 2);
        f.dedent();
        f.dedent();
        assert_eq!(f.current_indent(), 0);
        assert_eq!(f.level(), 0);
    }

    #[test]
    #[should_panic(expected = "indent decreased below 0")]
    fn test_dedent_below_zero_panics() {
        formatter().dedent();
    }

    #[test]
    fn test_max_help_position_is_clamped_to_width() {
        let settings = FormatterSettings {
            width: Some(30),
            ..FormatterSettings::default()
        };
        let f = HelpFormatter::new("prog", &settings);
        assert_eq!(f.max_help_position(), 10);
        assert_eq!(formatter().width(), 78);
        assert_eq!(formatter().max_help_position(), 24);
    }

    #[test]
    fn test_invocation_lists_options_then_metavar() {
        let action = optional(&["-f", "--foo"], "foo");
        assert_eq!(formatter().format_action_invocation(&action), "-f, --foo FOO");
    }

    #[test]
    fn test_format_args_by_arity() {
        let f = formatter();
        let mut core = ActionCore {
            dest: "x".to_string(),
            ..ActionCore::default()
        };
        let cases = [
            (None, "X"),
            (Some(Nargs::Optional), "[X]"),
            (Some(Nargs::ZeroOrMore), "[X ...]"),
            (Some(Nargs::OneOrMore), "[X ...]"),
            (Some(Nargs::Remainder), "..."),
            (Some(Nargs::Parser), "X ..."),
            (Some(Nargs::Suppress), ""),
            (Some(Nargs::Exact(2)), "X X"),
        ];
        for (nargs, expected) in cases {
            core.nargs = nargs;
            assert_eq!(f.format_args(&core, "X"), expected, "nargs {nargs:?}");
        }

        core.metavar = Some(Metavar::tuple(["A", "B"]));
        core.nargs = Some(Nargs::ZeroOrMore);
        assert_eq!(f.format_args(&core, "X"), "[A [B ...]]");
    }

    #[test]
    fn test_choices_used_as_metavar() {
        let core = ActionCore {
            dest: "mode".to_string(),
            choices: Some(vec![Value::from("fast"), Value::from("slow")]),
            ..ActionCore::default()
        };
        assert_eq!(formatter().format_args(&core, "MODE"), "{fast,slow}");
    }

    #[test]
    fn test_help_entry_alignment() {
        let action = StoreAction::new(
            &Argument::new(["-f", "--foo"])
                .with_dest("foo")
                .with_help("foo the bars"),
        )
        .unwrap();
        let mut f = formatter();
        f.start_section(Some("options"));
        f.add_argument(&action);
        f.end_section();
        assert_eq!(f.format_help(), "options:\n  -f, --foo FOO  foo the bars\n");
    }

    #[test]
    fn test_show_defaults_appends_default() {
        let action = StoreAction::new(
            &Argument::new(["--level"])
                .with_dest("level")
                .with_default(3)
                .with_help("verbosity"),
        )
        .unwrap();
        let settings = FormatterSettings {
            style: HelpStyle {
                show_defaults: true,
                ..HelpStyle::default()
            },
            ..FormatterSettings::default()
        };
        let mut f = HelpFormatter::new("prog", &settings);
        f.add_argument(&action);
        assert_eq!(f.format_help(), "--level LEVEL  verbosity (default: 3)\n");
    }

    #[test]
    fn test_raw_text_keeps_line_breaks() {
        let settings = FormatterSettings {
            style: HelpStyle {
                text: TextMode::RawText,
                ..HelpStyle::default()
            },
            ..FormatterSettings::default()
        };
        let mut f = HelpFormatter::new("prog", &settings);
        f.add_text(Some("first line\n  second   line"));
        assert_eq!(f.format_help(), "first line\n  second   line\n");
    }

    #[test]
    fn test_collapse_blank_runs() {
        assert_eq!(collapse_blank_runs("a\n\n\n\nb\n"), "a\n\nb\n");
    }
}
