//! Stylesheets parsed from CSS text
//!
//! Rules select widgets by type tag, `.class` and `#name`, optionally
//! narrowed by state pseudo-classes:
//!
//! ```css
//! /* every button */
//! button { padding: 4dp 8dp; }
//! button.primary:hover { background: #3366ff; }
//! #save, #open { min-width: 80dp; }
//! ```
//!
//! # Error Handling
//!
//! Parsing never aborts. Every problem is collected into
//! [`CssParseResult::errors`] with its line and column, the offending rule or
//! declaration is skipped, and parsing resumes at the next rule. Diagnostics
//! are logged through `tracing` at DEBUG level by [`CssParseResult::log_diagnostics`].

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace1},
    combinator::{opt, value},
    error::{context, ContextError, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    Finish, IResult,
};
use tracing::debug;

use crate::flags::StateFlags;
use crate::style::{Applied, Style};

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

// ============================================================================
// Diagnostics
// ============================================================================

/// Severity level for parse diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A rule could not be parsed and was dropped
    Error,
    /// A declaration was ignored
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One diagnostic with its location in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub severity: Severity,
    pub message: String,
    /// 1-indexed
    pub line: usize,
    /// 1-indexed
    pub column: usize,
    /// Source text near the problem
    pub fragment: String,
    /// Context stack from nom
    pub contexts: Vec<String>,
    pub property: Option<String>,
    pub value: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CSS {}: line {}, column {}: {}",
            self.severity, self.line, self.column, self.message
        )?;
        if !self.contexts.is_empty() {
            write!(f, " (in {})", self.contexts.join(" > "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn unknown_property(property: &str, line: usize, column: usize) -> Self {
        Self {
            severity: Severity::Warning,
            message: format!("unknown property '{property}' (ignored)"),
            line,
            column,
            fragment: String::new(),
            contexts: vec!["property".to_string()],
            property: Some(property.to_string()),
            value: None,
        }
    }

    pub fn invalid_value(property: &str, value: &str, line: usize, column: usize) -> Self {
        Self {
            severity: Severity::Warning,
            message: format!("invalid value for '{property}': '{value}'"),
            line,
            column,
            fragment: String::new(),
            contexts: vec!["property value".to_string()],
            property: Some(property.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn from_verbose(original: &str, err: &VerboseError<&str>) -> Self {
        let (line, column, fragment) = match err.errors.first() {
            Some((frag, _)) => calculate_position(original, frag),
            None => (1, 1, String::new()),
        };
        let contexts: Vec<String> = err
            .errors
            .iter()
            .filter_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some((*ctx).to_string()),
                _ => None,
            })
            .collect();
        let message = match err.errors.iter().find_map(|(_, kind)| match kind {
            VerboseErrorKind::Char(c) => Some(*c),
            _ => None,
        }) {
            Some(c) => format!("expected '{c}'"),
            None => "malformed rule".to_string(),
        };
        Self {
            severity: Severity::Error,
            message,
            line,
            column,
            fragment,
            contexts,
            property: None,
            value: None,
        }
    }
}

/// A parsed stylesheet with every diagnostic collected on the way
#[derive(Debug, Clone, Default)]
pub struct CssParseResult {
    pub stylesheet: StyleSheet,
    pub errors: Vec<ParseError>,
}

impl CssParseResult {
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Warning)
    }

    pub fn log_diagnostics(&self) {
        for err in &self.errors {
            debug!(
                severity = %err.severity,
                line = err.line,
                column = err.column,
                fragment = %err.fragment,
                "{}",
                err.message
            );
        }
    }
}

// ============================================================================
// Selectors and rules
// ============================================================================

/// A compound selector: `tag.class1.class2#name:state`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub name: Option<String>,
    /// Every listed state must be active
    pub states: StateFlags,
}

impl Selector {
    /// (names, classes + states, tags), compared lexicographically
    pub fn specificity(&self) -> (u8, u8, u8) {
        (
            u8::from(self.name.is_some()),
            (self.classes.len() + self.states.bits().count_ones() as usize).min(255) as u8,
            u8::from(self.tag.is_some()),
        )
    }

    pub fn matches(&self, target: &SelectorTarget<'_>) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(target.tag) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if name != target.name {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|c| target.class.split_whitespace().any(|t| t == c))
            && target.state.contains(self.states)
    }
}

/// Identity of a widget as seen by selectors
#[derive(Debug, Clone, Copy)]
pub struct SelectorTarget<'a> {
    pub tag: &'a str,
    pub name: &'a str,
    /// Whitespace separated class list
    pub class: &'a str,
    pub state: StateFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// An ordered set of rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CSS text, keeping every rule that could be read
    pub fn parse_with_errors(css: &str) -> CssParseResult {
        let mut errors = Vec::new();
        let mut rules = Vec::new();
        let mut input = css;

        loop {
            let rest = match ws::<VerboseError<&str>>(input) {
                Ok((rest, _)) => rest,
                Err(_) => input,
            };
            if rest.is_empty() {
                break;
            }
            match rule(rest).finish() {
                Ok((after, (selectors, decls))) => {
                    let declarations = validate(css, decls, &mut errors);
                    rules.push(Rule {
                        selectors,
                        declarations,
                    });
                    input = after;
                }
                Err(e) => {
                    errors.push(ParseError::from_verbose(css, &e));
                    // Resume after the end of the broken rule
                    match rest.find('}') {
                        Some(end) => input = &rest[end + 1..],
                        None => break,
                    }
                }
            }
        }

        CssParseResult {
            stylesheet: StyleSheet { rules },
            errors,
        }
    }

    /// Parse CSS text, logging diagnostics and keeping what parsed
    pub fn parse(css: &str) -> Self {
        let result = Self::parse_with_errors(css);
        result.log_diagnostics();
        result.stylesheet
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append another sheet's rules after this one's
    pub fn extend(&mut self, other: &StyleSheet) {
        self.rules.extend(other.rules.iter().cloned());
    }

    /// Declarations matching `target`, in cascade order (least specific first,
    /// source order breaking ties)
    pub fn matching<'s>(&'s self, target: &SelectorTarget<'_>) -> Vec<&'s Declaration> {
        let mut hits: Vec<((u8, u8, u8), usize, &Rule)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(order, rule)| {
                rule.selectors
                    .iter()
                    .filter(|s| s.matches(target))
                    .map(Selector::specificity)
                    .max()
                    .map(|specificity| (specificity, order, rule))
            })
            .collect();
        hits.sort_by_key(|(specificity, order, _)| (*specificity, *order));
        hits.into_iter()
            .flat_map(|(_, _, rule)| rule.declarations.iter())
            .collect()
    }

    /// Apply matching declarations to `style`.
    ///
    /// Declarations are validated at parse time, so failures here only come
    /// from sheets built by hand; they are logged and skipped.
    pub fn apply(&self, target: &SelectorTarget<'_>, style: &mut Style) {
        for decl in self.matching(target) {
            if let Err(err) = style.apply_property(&decl.property, &decl.value) {
                tracing::warn!(line = decl.line, "{err}");
            }
        }
    }
}

fn validate(
    css: &str,
    decls: Vec<(&str, &str)>,
    errors: &mut Vec<ParseError>,
) -> Vec<Declaration> {
    let mut out = Vec::with_capacity(decls.len());
    for (property, value) in decls {
        let (line, column, _) = calculate_position(css, property);
        let mut scratch = Style::default();
        match scratch.apply_property(property, value) {
            Ok(Applied::Yes) => out.push(Declaration {
                property: property.to_string(),
                value: value.to_string(),
                line,
            }),
            Ok(Applied::UnknownProperty) => {
                errors.push(ParseError::unknown_property(property, line, column))
            }
            Err(_) => errors.push(ParseError::invalid_value(property, value, line, column)),
        }
    }
    out
}

// ============================================================================
// Nom parsers
// ============================================================================

/// Line and column of `fragment`, a slice of `original`
fn calculate_position(original: &str, fragment: &str) -> (usize, usize, String) {
    let start = original.as_ptr() as usize;
    let at = fragment.as_ptr() as usize;
    let offset = if at >= start && at <= start + original.len() {
        at - start
    } else {
        original.len().saturating_sub(fragment.len())
    };
    let consumed = &original[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rfind('\n')
        .map(|pos| offset - pos)
        .unwrap_or(offset + 1);
    let preview: String = fragment.chars().take(30).collect();
    (line, column, preview)
}

/// Whitespace and comments
fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), many0(alt((value((), multispace1), value((), comment)))))(input)
}

fn comment<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

fn state_flag(name: &str) -> Option<StateFlags> {
    Some(match name {
        "hover" => StateFlags::HOVERED,
        "focus" => StateFlags::FOCUSED,
        "active" => StateFlags::ACTIVE,
        "disabled" => StateFlags::DISABLED,
        "checked" => StateFlags::CHECKED,
        "selected" => StateFlags::SELECTED,
        _ => return None,
    })
}

enum SelectorPart<'a> {
    Class(&'a str),
    Name(&'a str),
    State(&'a str),
}

fn selector_part(input: &str) -> ParseResult<'_, SelectorPart<'_>> {
    alt((
        |i| {
            let (i, c) = preceded(char('.'), identifier)(i)?;
            Ok((i, SelectorPart::Class(c)))
        },
        |i| {
            let (i, n) = preceded(char('#'), identifier)(i)?;
            Ok((i, SelectorPart::Name(n)))
        },
        |i| {
            let (i, s) = preceded(char(':'), identifier)(i)?;
            Ok((i, SelectorPart::State(s)))
        },
    ))(input)
}

fn selector(input: &str) -> ParseResult<'_, Selector> {
    context("selector", |input| {
        let (input, tag_name) = opt(alt((identifier, tag("*"))))(input)?;
        let (rest, parts) = many0(selector_part)(input)?;
        if tag_name.is_none() && parts.is_empty() {
            return Err(nom::Err::Error(VerboseError::from_error_kind(
                input,
                nom::error::ErrorKind::Verify,
            )));
        }
        let mut sel = Selector {
            tag: tag_name.filter(|t| *t != "*").map(str::to_string),
            ..Selector::default()
        };
        for part in parts {
            match part {
                SelectorPart::Class(c) => sel.classes.push(c.to_string()),
                SelectorPart::Name(n) => sel.name = Some(n.to_string()),
                SelectorPart::State(s) => match state_flag(s) {
                    Some(flag) => sel.states |= flag,
                    None => {
                        return Err(nom::Err::Failure(VerboseError::add_context(
                            s,
                            "pseudo-class",
                            VerboseError::from_error_kind(s, nom::error::ErrorKind::Tag),
                        )))
                    }
                },
            }
        }
        Ok((rest, sel))
    })(input)
}

fn selector_list(input: &str) -> ParseResult<'_, Vec<Selector>> {
    separated_list1(delimited(ws, char(','), ws), selector)(input)
}

fn property_value(input: &str) -> ParseResult<'_, &str> {
    let (input, value) = context(
        "property value",
        take_while1(|c: char| c != ';' && c != '}'),
    )(input)?;
    Ok((input, value.trim()))
}

/// `name: value;`
fn property_declaration(input: &str) -> ParseResult<'_, (&str, &str)> {
    let (input, _) = ws(input)?;
    let (input, name) = context("property name", identifier)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = context("colon after property name", char(':'))(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = property_value(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(';'))(input)?;
    Ok((input, (name, value)))
}

/// `{ property: value; ... }`
fn rule_block(input: &str) -> ParseResult<'_, Vec<(&str, &str)>> {
    let (input, _) = ws(input)?;
    let (input, _) = context("opening brace", char('{'))(input)?;
    let (input, properties) = many0(property_declaration)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = context("closing brace", char('}'))(input)?;
    Ok((input, properties))
}

#[allow(clippy::type_complexity)]
fn rule(input: &str) -> ParseResult<'_, (Vec<Selector>, Vec<(&str, &str)>)> {
    context("rule", |input| {
        let (input, selectors) = selector_list(input)?;
        let (input, block) = rule_block(input)?;
        Ok((input, (selectors, block)))
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target<'a>(tag: &'a str, name: &'a str, class: &'a str, state: StateFlags) -> SelectorTarget<'a> {
        SelectorTarget {
            tag,
            name,
            class,
            state,
        }
    }

    #[test]
    fn parses_compound_selectors() {
        let result = StyleSheet::parse_with_errors(
            "/* buttons */\nbutton.primary:hover, #ok { opacity: 0.5; }\n",
        );
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let rule = &result.stylesheet.rules()[0];
        assert_eq!(rule.selectors.len(), 2);
        assert_eq!(rule.selectors[0].tag.as_deref(), Some("button"));
        assert_eq!(rule.selectors[0].classes, vec!["primary".to_string()]);
        assert_eq!(rule.selectors[0].states, StateFlags::HOVERED);
        assert_eq!(rule.selectors[1].name.as_deref(), Some("ok"));
    }

    #[test]
    fn specificity_then_source_order() {
        let sheet = StyleSheet::parse(
            "#go { opacity: 0.3; }\n.big { opacity: 0.2; }\nbutton { opacity: 0.1; }\n",
        );
        let mut s = Style::default();
        sheet.apply(&target("Button", "go", "big", StateFlags::empty()), &mut s);
        assert_eq!(s.opacity, 0.3);

        let mut s = Style::default();
        sheet.apply(&target("button", "other", "big", StateFlags::empty()), &mut s);
        assert_eq!(s.opacity, 0.2);
    }

    #[test]
    fn state_selectors_require_state() {
        let sheet = StyleSheet::parse("frame:hover { opacity: 0.5; }");
        let mut s = Style::default();
        sheet.apply(&target("frame", "", "", StateFlags::empty()), &mut s);
        assert_eq!(s.opacity, 1.0);
        sheet.apply(&target("frame", "", "", StateFlags::HOVERED), &mut s);
        assert_eq!(s.opacity, 0.5);
    }

    #[test]
    fn errors_are_collected_and_parsing_resumes() {
        let css = "a { colr: red; display: sideways; opacity: 0.5; }\nb:wobble { opacity: 1; }\nc { opacity: 0.25; }";
        let result = StyleSheet::parse_with_errors(css);
        assert_eq!(result.stylesheet.len(), 2);
        assert_eq!(result.stylesheet.rules()[0].declarations.len(), 1);

        let unknown = &result.errors[0];
        assert_eq!(unknown.property.as_deref(), Some("colr"));
        assert_eq!(unknown.severity, Severity::Warning);
        assert_eq!(result.errors[1].value.as_deref(), Some("sideways"));

        let broken = &result.errors[2];
        assert_eq!(broken.severity, Severity::Error);
        assert_eq!(broken.line, 2);
        assert!(result.has_errors());
    }
}
