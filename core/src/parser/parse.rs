//! The parse loop.
//!
//! Command-line strings are first classified into a pattern string with one
//! character per token: `O` for something that looks like an option, `A` for
//! an argument, and `-` for the `--` terminator. Arity matching then runs
//! regular expressions built from each action's [`Nargs`] against slices of
//! that pattern, alternating between runs of positionals and single
//! optionals until the command line is exhausted.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use crate::action::{Action, action_name};
use crate::container::{ActionId, NEGATIVE_NUMBER};
use crate::error::{ArgumentError, ArgumentTypeError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::value::{DefaultValue, UNRECOGNIZED_ARGS_ATTR, Value};

use super::ArgumentParser;

impl ArgumentParser {
    /// Parses `args`, rejecting any string no argument consumed.
    pub fn parse_args<I, S>(&self, args: I) -> Result<Namespace, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (namespace, extras) = self.parse_known_args(args, None)?;
        if extras.is_empty() {
            return Ok(namespace);
        }
        let message = format!("unrecognized arguments: {}", extras.join(" "));
        Err(self.fail(ArgumentError::bare(message)))
    }

    /// Parses `args` into `namespace` (or a fresh one), returning the
    /// strings no argument consumed alongside the result.
    pub fn parse_known_args<I, S>(
        &self,
        args: I,
        namespace: Option<Namespace>,
    ) -> Result<(Namespace, Vec<String>), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut namespace = namespace.unwrap_or_default();

        for (_, action) in self.container.actions() {
            let core = action.core();
            if core.is_dest_suppressed() || namespace.contains(&core.dest) {
                continue;
            }
            if let Some(value) = core.default.seed() {
                namespace.set(core.dest.clone(), value);
            }
        }
        for (dest, value) in self.container.defaults() {
            if !namespace.contains(dest) {
                namespace.set(dest.clone(), value.clone());
            }
        }

        debug!(prog = %self.prog, args = args.len(), "parsing arguments");
        let mut extras = match ParseRun::new(self, args).and_then(|run| run.run(&mut namespace)) {
            Ok(extras) => extras,
            Err(ParseError::Argument(err)) => return Err(self.fail(err)),
            Err(other) => return Err(other),
        };

        if let Some(unrecognized) = namespace.remove(UNRECOGNIZED_ARGS_ATTR) {
            match unrecognized {
                Value::List(items) => extras.extend(items.iter().map(ToString::to_string)),
                other => extras.push(other.to_string()),
            }
        }
        Ok((namespace, extras))
    }

    fn fail(&self, err: ArgumentError) -> ParseError {
        if self.settings.exit_on_error {
            ParseError::Exit(self.error(&err.to_string()))
        } else {
            ParseError::Argument(err)
        }
    }
}

/// Option-like token resolved against the parser's option strings.
#[derive(Debug, Clone)]
struct OptionMatch<'p> {
    /// `None` when the token looks like an option but matches nothing.
    action: Option<(ActionId, &'p dyn Action)>,
    option_string: String,
    explicit_arg: Option<String>,
    /// The explicit argument followed `=`.
    equals: bool,
}

/// Values produced for one action.
struct ActionValues {
    /// `None` when the action should not be invoked.
    value: Option<Value>,
    from_default: bool,
}

struct ParseRun<'p> {
    parser: &'p ArgumentParser,
    args: Vec<String>,
    pattern: String,
    option_indices: BTreeMap<usize, OptionMatch<'p>>,
    positionals: Vec<(ActionId, &'p dyn Action)>,
    conflicts: HashMap<ActionId, Vec<ActionId>>,
    seen: HashSet<ActionId>,
    seen_non_default: HashSet<ActionId>,
    warned: HashSet<String>,
    extras: Vec<String>,
    /// Arity regexes compiled during this run, keyed by source pattern.
    regexes: RefCell<HashMap<String, Regex>>,
}

impl<'p> ParseRun<'p> {
    fn new(parser: &'p ArgumentParser, args: Vec<String>) -> Result<Self, ParseError> {
        let container = &parser.container;
        let mut conflicts: HashMap<ActionId, Vec<ActionId>> = HashMap::new();
        for group in container.exclusive_groups() {
            let members = group.action_ids();
            for (index, id) in members.iter().enumerate() {
                conflicts.entry(*id).or_default().extend(
                    members
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, other)| *other),
                );
            }
        }

        let mut run = Self {
            parser,
            args,
            pattern: String::new(),
            option_indices: BTreeMap::new(),
            positionals: container.positionals(),
            conflicts,
            seen: HashSet::new(),
            seen_non_default: HashSet::new(),
            warned: HashSet::new(),
            extras: Vec::new(),
            regexes: RefCell::new(HashMap::new()),
        };
        run.classify()?;
        Ok(run)
    }

    fn classify(&mut self) -> Result<(), ArgumentError> {
        let mut pattern = String::with_capacity(self.args.len());
        let mut option_indices = BTreeMap::new();
        let mut tokens = self.args.iter().enumerate();
        while let Some((index, arg)) = tokens.next() {
            if arg == "--" {
                pattern.push('-');
                for _ in tokens.by_ref() {
                    pattern.push('A');
                }
                break;
            }
            match self.parse_optional(arg)? {
                Some(matched) => {
                    option_indices.insert(index, matched);
                    pattern.push('O');
                }
                None => pattern.push('A'),
            }
        }
        self.pattern = pattern;
        self.option_indices = option_indices;
        Ok(())
    }

    /// Resolves an option-like token, or returns `None` for a plain
    /// argument.
    fn parse_optional(&self, arg: &str) -> Result<Option<OptionMatch<'p>>, ArgumentError> {
        let container = &self.parser.container;
        let prefix = container.prefix_chars();
        let Some(first) = arg.chars().next() else {
            return Ok(None);
        };
        if !prefix.contains(first) {
            return Ok(None);
        }
        if let Some(found) = container.option_action(arg) {
            return Ok(Some(OptionMatch {
                action: Some(found),
                option_string: arg.to_string(),
                explicit_arg: None,
                equals: false,
            }));
        }
        if arg.chars().count() == 1 {
            return Ok(None);
        }
        if let Some((option, explicit)) = arg.split_once('=') {
            if let Some(found) = container.option_action(option) {
                return Ok(Some(OptionMatch {
                    action: Some(found),
                    option_string: option.to_string(),
                    explicit_arg: Some(explicit.to_string()),
                    equals: true,
                }));
            }
        }

        let mut candidates = self.option_candidates(arg);
        if candidates.len() > 1 {
            let matches: Vec<&str> = candidates
                .iter()
                .map(|candidate| candidate.option_string.as_str())
                .collect();
            return Err(ArgumentError::bare(format!(
                "ambiguous option: {arg} could match {}",
                matches.join(", ")
            )));
        }
        if let Some(candidate) = candidates.pop() {
            return Ok(Some(candidate));
        }

        if NEGATIVE_NUMBER.is_match(arg) && !container.has_negative_number_optionals() {
            return Ok(None);
        }
        if arg.contains(' ') {
            return Ok(None);
        }
        Ok(Some(OptionMatch {
            action: None,
            option_string: arg.to_string(),
            explicit_arg: None,
            equals: false,
        }))
    }

    /// Options `arg` could refer to by abbreviation or as a short option
    /// with an attached value.
    fn option_candidates(&self, arg: &str) -> Vec<OptionMatch<'p>> {
        let container = &self.parser.container;
        let prefix = container.prefix_chars();
        let allow_abbrev = self.parser.settings.allow_abbrev;
        let mut chars = arg.chars();
        let first = chars.next().map_or(0, char::len_utf8);
        let second = chars.next();
        let mut candidates = Vec::new();

        if second.is_some_and(|c| prefix.contains(c)) {
            if !allow_abbrev {
                return candidates;
            }
            let (option_prefix, explicit) = match arg.split_once('=') {
                Some((option, explicit)) => (option, Some(explicit)),
                None => (arg, None),
            };
            for (option, id) in container.option_strings() {
                if !option.starts_with(option_prefix) {
                    continue;
                }
                if let Some(action) = container.action(id) {
                    candidates.push(OptionMatch {
                        action: Some((id, action)),
                        option_string: option.to_string(),
                        explicit_arg: explicit.map(str::to_string),
                        equals: explicit.is_some(),
                    });
                }
            }
        } else {
            let split = first + second.map_or(0, char::len_utf8);
            let (short_option, short_explicit) = arg.split_at(split);
            for (option, id) in container.option_strings() {
                let Some(action) = container.action(id) else {
                    continue;
                };
                if option == short_option {
                    candidates.push(OptionMatch {
                        action: Some((id, action)),
                        option_string: option.to_string(),
                        explicit_arg: Some(short_explicit.to_string()),
                        equals: false,
                    });
                } else if allow_abbrev && option.starts_with(arg) {
                    candidates.push(OptionMatch {
                        action: Some((id, action)),
                        option_string: option.to_string(),
                        explicit_arg: None,
                        equals: false,
                    });
                }
            }
        }
        candidates
    }

    /// Consumes the whole command line, returning the strings left over.
    fn run(mut self, namespace: &mut Namespace) -> Result<Vec<String>, ParseError> {
        let mut start = 0;
        if let Some(&max_option_index) = self.option_indices.keys().next_back() {
            while start <= max_option_index {
                let next_option = self
                    .option_indices
                    .range(start..)
                    .next()
                    .map_or(max_option_index, |(index, _)| *index);

                if start != next_option {
                    let end = self.consume_positionals(start, namespace)?;
                    if end > start {
                        start = end;
                        continue;
                    }
                    start = end;
                }

                if !self.option_indices.contains_key(&start) {
                    self.extras
                        .extend(self.args[start..next_option].iter().cloned());
                    start = next_option;
                }
                start = self.consume_optional(start, namespace)?;
            }
        }

        let stop = self.consume_positionals(start, namespace)?;
        self.extras.extend(self.args[stop..].iter().cloned());

        self.finish(namespace)?;
        Ok(self.extras)
    }

    fn consume_optional(
        &mut self,
        start: usize,
        namespace: &mut Namespace,
    ) -> Result<usize, ParseError> {
        let Some(matched) = self.option_indices.get(&start).cloned() else {
            return Ok(start + 1);
        };
        let OptionMatch {
            mut action,
            mut option_string,
            mut explicit_arg,
            mut equals,
        } = matched;
        let prefix = self.parser.container.prefix_chars();
        let mut queue: Vec<((ActionId, &'p dyn Action), Vec<String>, String)> = Vec::new();

        let stop = loop {
            let Some(current) = action else {
                self.extras.push(self.args[start].clone());
                return Ok(start + 1);
            };

            let Some(arg) = explicit_arg.take() else {
                let begin = start + 1;
                let count = self.match_argument(current.1, &self.pattern[begin..])?;
                let stop = begin + count;
                queue.push((current, self.args[begin..stop].to_vec(), option_string));
                break stop;
            };

            let count = self.match_argument(current.1, "A")?;
            let short = !option_string
                .chars()
                .nth(1)
                .is_some_and(|c| prefix.contains(c));
            let leading = arg.chars().next();
            match leading {
                Some(next_char) if count == 0 && short => {
                    if equals || prefix.contains(next_char) {
                        return Err(ignored_explicit_argument(current.1, &arg).into());
                    }
                    let lead = option_string.chars().next().unwrap_or('-');
                    queue.push((current, Vec::new(), option_string));
                    let next_option = format!("{lead}{next_char}");
                    let rest = &arg[next_char.len_utf8()..];
                    match self.parser.container.option_action(&next_option) {
                        Some(found) => {
                            action = Some(found);
                            option_string = next_option;
                            if rest.is_empty() {
                                explicit_arg = None;
                                equals = false;
                            } else if let Some(value) = rest.strip_prefix('=') {
                                explicit_arg = Some(value.to_string());
                                equals = true;
                            } else {
                                explicit_arg = Some(rest.to_string());
                                equals = false;
                            }
                        }
                        None => {
                            self.extras.push(format!("{lead}{arg}"));
                            break start + 1;
                        }
                    }
                }
                _ if count == 1 => {
                    queue.push((current, vec![arg], option_string));
                    break start + 1;
                }
                _ => return Err(ignored_explicit_argument(current.1, &arg).into()),
            }
        };

        for (action, args, option_string) in queue {
            if action.1.core().deprecated && self.warned.insert(option_string.clone()) {
                self.parser
                    .warning(&format!("option '{option_string}' is deprecated"));
            }
            self.take_action(action, args, Some(&option_string), namespace)?;
        }
        Ok(stop)
    }

    fn consume_positionals(
        &mut self,
        start: usize,
        namespace: &mut Namespace,
    ) -> Result<usize, ParseError> {
        let counts = self.match_arguments_partial(&self.positionals, &self.pattern[start..])?;
        let matched: Vec<(ActionId, &'p dyn Action)> = self.positionals.drain(..counts.len()).collect();

        let mut index = start;
        for (action, count) in matched.into_iter().zip(counts) {
            let mut args = self.args[index..index + count].to_vec();
            let segment = &self.pattern[index..index + count];
            match action.1.core().nargs {
                Some(Nargs::Parser) => {
                    if segment.starts_with('-') {
                        args.remove(0);
                    }
                }
                Some(Nargs::Remainder) => {}
                _ => {
                    if let Some(position) = segment.find('-') {
                        args.remove(position);
                    }
                }
            }
            index += count;

            let core = action.1.core();
            if !args.is_empty() && core.deprecated && self.warned.insert(core.dest.clone()) {
                self.parser
                    .warning(&format!("argument '{}' is deprecated", core.dest));
            }
            self.take_action(action, args, None, namespace)?;
        }
        Ok(index)
    }

    fn take_action(
        &mut self,
        (id, action): (ActionId, &'p dyn Action),
        args: Vec<String>,
        option_string: Option<&str>,
        namespace: &mut Namespace,
    ) -> Result<(), ParseError> {
        self.seen.insert(id);
        let values = self.get_values(action, args)?;

        if !values.from_default {
            self.seen_non_default.insert(id);
            let conflicting = self
                .conflicts
                .get(&id)
                .and_then(|others| others.iter().find(|other| self.seen_non_default.contains(*other)));
            if let Some(other) = conflicting {
                let name = self
                    .parser
                    .container
                    .action(*other)
                    .and_then(|other| action_name(other.core()))
                    .unwrap_or_default();
                return Err(ArgumentError::for_action(
                    action.core(),
                    format!("not allowed with argument {name}"),
                )
                .into());
            }
        }

        match values.value {
            Some(value) => action.invoke(self.parser, namespace, value, option_string),
            None => Ok(()),
        }
    }

    fn get_values(&self, action: &dyn Action, args: Vec<String>) -> Result<ActionValues, ArgumentError> {
        let core = action.core();
        let values = match core.nargs {
            Some(Nargs::Optional) if args.is_empty() => {
                let (fallback, from_default) = if core.is_positional() {
                    (core.default.seed(), true)
                } else {
                    (Some(core.const_value.clone().unwrap_or(Value::Null)), false)
                };
                let value = match fallback {
                    Some(Value::Str(raw)) => {
                        let value = self.get_value(action, &raw)?;
                        self.check_value(action, &value)?;
                        Some(value)
                    }
                    other => other,
                };
                ActionValues {
                    value,
                    from_default,
                }
            }
            Some(Nargs::ZeroOrMore) if args.is_empty() && core.is_positional() => {
                match &core.default {
                    DefaultValue::Value(value) if !value.is_null() => ActionValues {
                        value: Some(value.clone()),
                        from_default: true,
                    },
                    DefaultValue::Suppress => ActionValues {
                        value: None,
                        from_default: true,
                    },
                    _ => ActionValues {
                        value: Some(Value::List(Vec::new())),
                        from_default: false,
                    },
                }
            }
            None | Some(Nargs::Optional) if args.len() == 1 => {
                let value = self.get_value(action, &args[0])?;
                self.check_value(action, &value)?;
                ActionValues {
                    value: Some(value),
                    from_default: false,
                }
            }
            Some(Nargs::Suppress) => ActionValues {
                value: None,
                from_default: core.default.is_suppress(),
            },
            nargs => {
                let items = args
                    .iter()
                    .map(|raw| self.get_value(action, raw))
                    .collect::<Result<Vec<_>, _>>()?;
                match nargs {
                    Some(Nargs::Remainder) => {}
                    Some(Nargs::Parser) => {
                        if let Some(first) = items.first() {
                            self.check_value(action, first)?;
                        }
                    }
                    _ => {
                        for item in &items {
                            self.check_value(action, item)?;
                        }
                    }
                }
                ActionValues {
                    value: Some(Value::List(items)),
                    from_default: false,
                }
            }
        };
        Ok(values)
    }

    fn get_value(&self, action: &dyn Action, raw: &str) -> Result<Value, ArgumentError> {
        let core = action.core();
        let Some(converter) = &core.converter else {
            return Ok(Value::Str(raw.to_string()));
        };
        converter.convert(raw).map_err(|err| match err {
            ArgumentTypeError::Message(message) => ArgumentError::for_action(core, message),
            ArgumentTypeError::Invalid => ArgumentError::for_action(
                core,
                format!("invalid {} value: {}", converter.name(), Value::from(raw).repr()),
            ),
        })
    }

    fn check_value(&self, action: &dyn Action, value: &Value) -> Result<(), ArgumentError> {
        let core = action.core();
        let Some(choices) = &core.choices else {
            return Ok(());
        };
        if choices.contains(value) {
            return Ok(());
        }
        let listed: Vec<String> = choices.iter().map(ToString::to_string).collect();
        Err(ArgumentError::for_action(
            core,
            format!(
                "invalid choice: {} (choose from {})",
                Value::Str(value.to_string()).repr(),
                listed.join(", ")
            ),
        ))
    }

    fn regex(&self, pattern: String) -> Result<Regex, ArgumentError> {
        if let Some(regex) = self.regexes.borrow().get(&pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&pattern).map_err(|err| ArgumentError::bare(err.to_string()))?;
        self.regexes.borrow_mut().insert(pattern, regex.clone());
        Ok(regex)
    }

    /// Number of pattern characters `action` consumes from the start of
    /// `pattern`.
    fn match_argument(&self, action: &dyn Action, pattern: &str) -> Result<usize, ArgumentError> {
        let core = action.core();
        let regex = self.regex(format!("^{}", nargs_pattern(action)))?;
        match regex.captures(pattern).and_then(|caps| caps.get(1)) {
            Some(group) => Ok(group.as_str().len()),
            None => {
                let message = match core.nargs {
                    None => "expected one argument".to_string(),
                    Some(Nargs::Optional) => "expected at most one argument".to_string(),
                    Some(Nargs::OneOrMore) => "expected at least one argument".to_string(),
                    Some(Nargs::Exact(1)) => "expected 1 argument".to_string(),
                    Some(Nargs::Exact(n)) => format!("expected {n} arguments"),
                    Some(other) => format!("expected {other} arguments"),
                };
                Err(ArgumentError::for_action(core, message))
            }
        }
    }

    /// Matches as many leading `actions` as possible against `pattern`,
    /// dropping actions from the end until the combined pattern matches.
    fn match_arguments_partial(
        &self,
        actions: &[(ActionId, &'p dyn Action)],
        pattern: &str,
    ) -> Result<Vec<usize>, ArgumentError> {
        for len in (1..=actions.len()).rev() {
            let combined: String = actions[..len]
                .iter()
                .map(|(_, action)| nargs_pattern(*action))
                .collect();
            let regex = self.regex(format!("^{combined}"))?;
            let Some(caps) = regex.captures(pattern) else {
                continue;
            };
            let mut counts: Vec<usize> = caps
                .iter()
                .skip(1)
                .map(|group| group.map_or(0, |m| m.as_str().len()))
                .collect();
            let end = caps.get(0).map_or(0, |m| m.end());
            // Positionals that matched nothing wait for strings after the
            // next option.
            if pattern[end..].starts_with('O') {
                while counts.last() == Some(&0) {
                    counts.pop();
                }
            }
            return Ok(counts);
        }
        Ok(Vec::new())
    }

    fn finish(&self, namespace: &mut Namespace) -> Result<(), ParseError> {
        let mut required = Vec::new();
        for (id, action) in self.parser.container.actions() {
            if self.seen.contains(&id) {
                continue;
            }
            let core = action.core();
            if core.required {
                required.push(action_name(core).unwrap_or_default());
                continue;
            }
            if let (DefaultValue::Value(Value::Str(raw)), Some(_)) = (&core.default, &core.converter) {
                let untouched = namespace
                    .get(&core.dest)
                    .is_some_and(|current| current.as_str() == Some(raw.as_str()));
                if untouched {
                    let converted = self.get_value(action, raw)?;
                    namespace.set(core.dest.clone(), converted);
                }
            }
        }
        if !required.is_empty() {
            return Err(ArgumentError::bare(format!(
                "the following arguments are required: {}",
                required.join(", ")
            ))
            .into());
        }

        for group in self.parser.container.exclusive_groups() {
            if !group.required() {
                continue;
            }
            if group
                .action_ids()
                .iter()
                .any(|id| self.seen_non_default.contains(id))
            {
                continue;
            }
            let names: Vec<String> = group
                .action_ids()
                .iter()
                .filter_map(|id| self.parser.container.action(*id))
                .filter(|action| !action.core().is_help_suppressed())
                .filter_map(|action| action_name(action.core()))
                .collect();
            return Err(ArgumentError::bare(format!(
                "one of the arguments {} is required",
                names.join(" ")
            ))
            .into());
        }
        Ok(())
    }
}

/// Regex fragment describing how many pattern characters an action takes.
/// Optionals never consume `-` and only a parser or remainder consumes `O`.
fn nargs_pattern(action: &dyn Action) -> String {
    let core = action.core();
    let pattern = match core.nargs {
        None => "(-*A-*)".to_string(),
        Some(Nargs::Optional) => "(-*A?-*)".to_string(),
        Some(Nargs::ZeroOrMore) => "(-*[A-]*)".to_string(),
        Some(Nargs::OneOrMore) => "(-*A[A-]*)".to_string(),
        Some(Nargs::Remainder) => "([-AO]*)".to_string(),
        Some(Nargs::Parser) => "(-*A[-AO]*)".to_string(),
        Some(Nargs::Suppress) => "(-*-*)".to_string(),
        Some(Nargs::Exact(n)) => format!("(-*{}-*)", vec!["A"; n].join("-*")),
    };
    if core.is_positional() {
        pattern
    } else {
        pattern.replace("-*", "").replace('-', "")
    }
}

fn ignored_explicit_argument(action: &dyn Action, arg: &str) -> ArgumentError {
    ArgumentError::for_action(
        action.core(),
        format!("ignored explicit argument {}", Value::from(arg).repr()),
    )
}
