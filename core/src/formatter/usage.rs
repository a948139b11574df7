use std::collections::{BTreeMap, HashSet};

use crate::action::Action;

use super::HelpFormatter;
use super::text::{display_width, expand_placeholders};

/// Mutually exclusive group as seen by the usage renderer.
#[derive(Debug, Clone)]
pub struct UsageGroup<'a> {
    pub required: bool,
    pub actions: Vec<&'a dyn Action>,
}

fn same_action(a: &dyn Action, b: &dyn Action) -> bool {
    std::ptr::addr_eq(a as *const dyn Action, b as *const dyn Action)
}

impl<'a> HelpFormatter<'a> {
    pub(super) fn format_usage(
        &self,
        usage: Option<&str>,
        actions: &[&'a dyn Action],
        groups: &[UsageGroup<'a>],
        prefix: Option<&str>,
    ) -> String {
        let prefix = prefix.unwrap_or("usage: ");
        let body = match usage {
            Some(usage) => {
                expand_placeholders(usage, |key| (key == "prog").then(|| self.prog.clone()))
            }
            None if actions.is_empty() => self.prog.clone(),
            None => self.compose_usage(prefix, actions, groups),
        };
        format!("{prefix}{body}\n\n")
    }

    fn compose_usage(
        &self,
        prefix: &str,
        actions: &[&'a dyn Action],
        groups: &[UsageGroup<'a>],
    ) -> String {
        let (positionals, optionals): (Vec<&'a dyn Action>, Vec<&'a dyn Action>) = actions
            .iter()
            .copied()
            .partition(|action| action.core().is_positional());
        let ordered: Vec<&'a dyn Action> = optionals.iter().chain(&positionals).copied().collect();
        let action_usage = self.actions_usage_parts(&ordered, groups).join(" ");
        let usage = if action_usage.is_empty() {
            self.prog.clone()
        } else {
            format!("{} {action_usage}", self.prog)
        };

        let text_width = self.width.saturating_sub(self.current_indent);
        let prefix_width = display_width(prefix);
        if prefix_width + display_width(&usage) <= text_width {
            return usage;
        }

        let opt_parts = self.actions_usage_parts(&optionals, groups);
        let pos_parts = self.actions_usage_parts(&positionals, groups);
        let prog_width = display_width(&self.prog);

        let lines = if (prefix_width + prog_width) as f64 <= 0.75 * text_width as f64 {
            let indent = " ".repeat(prefix_width + prog_width + 1);
            if !opt_parts.is_empty() {
                let first: Vec<String> = std::iter::once(self.prog.clone())
                    .chain(opt_parts)
                    .collect();
                let mut lines = wrap_usage_parts(&first, &indent, Some(prefix), text_width);
                lines.extend(wrap_usage_parts(&pos_parts, &indent, None, text_width));
                lines
            } else if !pos_parts.is_empty() {
                let first: Vec<String> = std::iter::once(self.prog.clone())
                    .chain(pos_parts)
                    .collect();
                wrap_usage_parts(&first, &indent, Some(prefix), text_width)
            } else {
                vec![self.prog.clone()]
            }
        } else {
            let indent = " ".repeat(prefix_width);
            let parts: Vec<String> = opt_parts.iter().chain(&pos_parts).cloned().collect();
            let mut lines = wrap_usage_parts(&parts, &indent, None, text_width);
            if lines.len() > 1 {
                lines = wrap_usage_parts(&opt_parts, &indent, None, text_width);
                lines.extend(wrap_usage_parts(&pos_parts, &indent, None, text_width));
            }
            lines.insert(0, self.prog.clone());
            lines
        };
        lines.join("\n")
    }

    /// Usage fragments for `actions`, with mutually exclusive groups
    /// bracketed and separated by `|`.
    fn actions_usage_parts(&self, actions: &[&'a dyn Action], groups: &[UsageGroup<'a>]) -> Vec<String> {
        let mut grouped = vec![false; actions.len()];
        let mut spans: BTreeMap<usize, (usize, &UsageGroup<'a>)> = BTreeMap::new();
        for group in groups {
            if group.actions.is_empty()
                || group
                    .actions
                    .iter()
                    .all(|action| action.core().is_help_suppressed())
            {
                continue;
            }
            let positions: Option<Vec<usize>> = group
                .actions
                .iter()
                .map(|member| actions.iter().position(|a| same_action(*a, *member)))
                .collect();
            let Some(positions) = positions else {
                continue;
            };
            let Some(&start) = positions.iter().min() else {
                continue;
            };
            let end = start + group.actions.len();
            if end <= actions.len() && (start..end).all(|i| positions.contains(&i)) {
                grouped[start..end].iter_mut().for_each(|g| *g = true);
                spans.insert(start, (end, group));
            }
        }

        let mut parts: Vec<Option<String>> = actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                let core = action.core();
                if core.is_help_suppressed() {
                    return None;
                }
                if core.is_positional() {
                    let default = self.default_metavar_for_positional(core);
                    let part = self.format_args(core, &default);
                    let bracketed = part.len() >= 2 && part.starts_with('[') && part.ends_with(']');
                    if grouped[index] && bracketed {
                        Some(part[1..part.len() - 1].to_string())
                    } else {
                        Some(part)
                    }
                } else {
                    let part = if core.takes_no_values() {
                        action.format_usage()
                    } else {
                        let default = self.default_metavar_for_optional(core);
                        format!(
                            "{} {}",
                            core.option_strings[0],
                            self.format_args(core, &default)
                        )
                    };
                    if !core.required && !grouped[index] {
                        Some(format!("[{part}]"))
                    } else {
                        Some(part)
                    }
                }
            })
            .collect();

        let mut separated: HashSet<usize> = HashSet::new();
        for (&start, &(end, group)) in spans.iter().rev() {
            let mut group_parts: Vec<String> = parts[start..end].iter().flatten().cloned().collect();
            let Some(last_index) = group_parts.len().checked_sub(1) else {
                continue;
            };
            let (open, close) = match (group.required, group_parts.len() > 1) {
                (true, true) => ("(", ")"),
                (true, false) => ("", ""),
                (false, _) => ("[", "]"),
            };
            group_parts[0].insert_str(0, open);
            group_parts[last_index].push_str(close);
            for (offset, part) in group_parts[..last_index].iter_mut().enumerate() {
                if separated.insert(start + offset) {
                    part.push_str(" |");
                }
            }
            parts.splice(start..end, group_parts.into_iter().map(Some));
        }

        parts
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect()
    }
}

/// Packs usage fragments into lines no wider than `text_width`.
///
/// Continuation lines start with `indent`. When `prefix` is given, the first
/// line is measured as if it followed the prefix and is returned without
/// the indent.
pub(crate) fn wrap_usage_parts(
    parts: &[String],
    indent: &str,
    prefix: Option<&str>,
    text_width: usize,
) -> Vec<String> {
    let indent_width = display_width(indent) as isize;
    let text_width = text_width as isize;
    let mut lines = Vec::new();
    let mut line: Vec<&str> = Vec::new();
    let mut line_width = match prefix {
        Some(prefix) => display_width(prefix) as isize - 1,
        None => indent_width - 1,
    };
    for part in parts {
        let part_width = display_width(part) as isize;
        if line_width + 1 + part_width > text_width && !line.is_empty() {
            lines.push(format!("{indent}{}", line.join(" ")));
            line.clear();
            line_width = indent_width - 1;
        }
        line.push(part);
        line_width += part_width + 1;
    }
    if !line.is_empty() {
        lines.push(format!("{indent}{}", line.join(" ")));
    }
    if prefix.is_some() {
        if let Some(first) = lines.first_mut() {
            *first = first[indent.len()..].to_string();
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{StoreAction, StoreConstAction};
    use crate::argument::Argument;
    use crate::formatter::FormatterSettings;

    fn store(option_strings: &[&str], dest: &str) -> StoreAction {
        StoreAction::new(&Argument::new(option_strings.iter().copied()).with_dest(dest)).unwrap()
    }

    fn flag(option: &str, dest: &str) -> StoreConstAction {
        StoreConstAction::store_true(&Argument::new([option]).with_dest(dest)).unwrap()
    }

    #[test]
    fn test_wrap_usage_parts_never_exceeds_width() {
        let parts: Vec<String> = (0..12).map(|i| format!("[--opt{i} X]")).collect();
        let lines = wrap_usage_parts(&parts, "           ", Some("usage: "), 40);
        assert!(lines.len() > 1);
        assert!(display_width(&format!("usage: {}", lines[0])) <= 40);
        for line in &lines[1..] {
            assert!(display_width(line) <= 40, "line too wide: {line:?}");
            assert!(line.starts_with("           ["));
        }
    }

    #[test]
    fn test_mutex_group_rendering() {
        let a = flag("--a", "a");
        let b = flag("--b", "b");
        let f = HelpFormatter::new("prog", &FormatterSettings::default());
        let actions: Vec<&dyn Action> = vec![&a, &b];

        let optional_group = [UsageGroup {
            required: false,
            actions: actions.clone(),
        }];
        assert_eq!(f.actions_usage_parts(&actions, &optional_group), vec!["[--a |", "--b]"]);

        let required_group = [UsageGroup {
            required: true,
            actions: actions.clone(),
        }];
        assert_eq!(f.actions_usage_parts(&actions, &required_group), vec!["(--a |", "--b)"]);
    }

    #[test]
    fn test_usage_puts_optionals_before_positionals() {
        let file = StoreAction::new(&Argument::new(Vec::<String>::new()).with_dest("file")).unwrap();
        let out = store(&["-o", "--out"], "out");
        let f = HelpFormatter::new("prog", &FormatterSettings::default());
        let actions: Vec<&dyn Action> = vec![&file, &out];
        assert_eq!(
            f.format_usage(None, &actions, &[], None),
            "usage: prog [-o OUT] file\n\n"
        );
    }

    #[test]
    fn test_long_usage_wraps_with_prog_first() {
        let settings = FormatterSettings {
            width: Some(40),
            ..FormatterSettings::default()
        };
        let f = HelpFormatter::new("prog", &settings);
        let owned: Vec<StoreAction> = (0..8)
            .map(|i| store(&[format!("--option{i}").as_str()], &format!("option{i}")))
            .collect();
        let actions: Vec<&dyn Action> = owned.iter().map(|a| a as &dyn Action).collect();
        let usage = f.format_usage(None, &actions, &[], None);
        let lines: Vec<&str> = usage.trim_end().lines().collect();
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("usage: prog [--option0"));
        assert!(lines.iter().all(|line| display_width(line) <= 40));
    }

    #[test]
    fn test_long_prog_gets_its_own_line() {
        let settings = FormatterSettings {
            width: Some(60),
            ..FormatterSettings::default()
        };
        let prog = "x".repeat(50);
        let f = HelpFormatter::new(prog.clone(), &settings);
        let mut owned: Vec<StoreAction> = (0..6)
            .map(|i| store(&[format!("--option{i}").as_str()], &format!("option{i}")))
            .collect();
        owned.push(StoreAction::new(&Argument::new(Vec::<String>::new()).with_dest("target")).unwrap());
        let actions: Vec<&dyn Action> = owned.iter().map(|a| a as &dyn Action).collect();

        let usage = f.format_usage(None, &actions, &[], None);
        let lines: Vec<&str> = usage.trim_end().lines().collect();
        assert_eq!(
            lines,
            vec![
                format!("usage: {prog}").as_str(),
                "       [--option0 OPTION0] [--option1 OPTION1]",
                "       [--option2 OPTION2] [--option3 OPTION3]",
                "       [--option4 OPTION4] [--option5 OPTION5]",
                "       target",
            ]
        );
        assert!(lines[1..].iter().all(|line| display_width(line) <= 60));
    }
}
