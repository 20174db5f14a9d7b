//! Recursive template expansion
//!
//! Walks the preprocessor node tree and emits literal wikitext. Templates
//! resolve through a caller-supplied [`TemplateResolver`]; a template the
//! resolver declines passes through verbatim, matching wiki behavior for
//! missing templates. Expansion is recursive - a resolved body is re-run
//! through the preprocessor grammar with a frame built from the call's
//! arguments - and bounded by a configurable depth limit.
//!
//! Parser functions (`#if`, `#ifeq`, `#switch`) and the case magic words
//! (`uc`, `lc`, `ucfirst`, `lcfirst`) are evaluated here; unknown `#`
//! functions pass through like missing templates.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mw::ast::span::Position;
use crate::mw::grammar::engine::{self, ParseError};

use super::grammar;
use super::nodes::{IncludeKind, PreBuilder, PreNode, PreParameter, PreTemplate};

/// Default bound on template recursion.
pub const DEFAULT_MAX_DEPTH: usize = 40;

/// Characters a resolvable template name may not contain.
static TEMPLATE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^#<>\[\]|{}\r\n]+$").expect("template name pattern is valid"));

/// Resolution failure reported by a [`TemplateResolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverError {
    pub message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolver error: {}", self.message)
    }
}

impl std::error::Error for ResolverError {}

/// Arguments of one template call, fully expanded.
///
/// Positional arguments count from 1; named arguments may shadow them
/// (`{{t|1=x}}` binds parameter 1). The same type serves as the frame a
/// template body is expanded in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateArgs {
    positional: Vec<String>,
    named: HashMap<String, String>,
}

impl TemplateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: String) {
        self.positional.push(value);
    }

    pub fn insert(&mut self, name: String, value: String) {
        self.named.insert(name, value);
    }

    /// Positional argument by 1-based index.
    pub fn positional(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.positional.get(index - 1).map(String::as_str)
    }

    /// Look up a parameter: named bindings first, then numeric names
    /// against the positional list.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.named.get(name) {
            return Some(value);
        }
        name.parse::<usize>().ok().and_then(|n| self.positional(n))
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Capability for turning a template name and arguments into a body.
///
/// Returning `Ok(None)` means "not found"; the original `{{...}}` text
/// then passes through unchanged. Errors abort the whole expansion.
pub trait TemplateResolver {
    fn resolve(&self, name: &str, args: &TemplateArgs) -> Result<Option<String>, ResolverError>;
}

/// Resolver that finds nothing; every transclusion passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl TemplateResolver for NullResolver {
    fn resolve(&self, _name: &str, _args: &TemplateArgs) -> Result<Option<String>, ResolverError> {
        Ok(None)
    }
}

/// In-memory resolver backed by a name-to-body map.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    templates: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(name.into(), body.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }
}

impl TemplateResolver for MapResolver {
    fn resolve(&self, name: &str, _args: &TemplateArgs) -> Result<Option<String>, ResolverError> {
        Ok(self.templates.get(name).cloned())
    }
}

/// Failure of one expansion run.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessorError {
    /// A `{{` or `}}` with no counterpart.
    Unbalanced { marker: String, position: Position },
    /// The preprocessor grammar itself failed to match.
    Syntax(ParseError),
    /// Template nesting exceeded the configured bound.
    RecursionLimit { limit: usize },
    /// The resolver reported an error for a template.
    Resolver { template: String, message: String },
}

impl fmt::Display for PreprocessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessorError::Unbalanced { marker, position } => {
                write!(f, "unbalanced {} at {}", marker, position)
            }
            PreprocessorError::Syntax(err) => write!(f, "preprocessor syntax error: {}", err),
            PreprocessorError::RecursionLimit { limit } => {
                write!(f, "template recursion limit of {} exceeded", limit)
            }
            PreprocessorError::Resolver { template, message } => {
                write!(f, "template {:?} failed to resolve: {}", template, message)
            }
        }
    }
}

impl std::error::Error for PreprocessorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreprocessorError::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

/// Where expanded text is headed; controls the inclusion-tag sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Rendering the page itself.
    Page,
    /// Inside a transcluded template body.
    Transclusion,
}

/// Parse raw wikitext into preprocessor nodes.
pub(crate) fn parse_wikitext(source: &str) -> Result<Vec<PreNode>, PreprocessorError> {
    let grammar = grammar::grammar();
    let mut builder = PreBuilder::new(grammar);
    let (value, _) = engine::parse(grammar, "wikitext", source, &mut builder)
        .map_err(PreprocessorError::Syntax)?;
    Ok(value.into_items())
}

/// The expansion stage: raw wikitext in, literal wikitext out.
pub struct Preprocessor<'r> {
    resolver: &'r dyn TemplateResolver,
    max_depth: usize,
}

impl<'r> Preprocessor<'r> {
    pub fn new(resolver: &'r dyn TemplateResolver) -> Self {
        Self {
            resolver,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand `source` fully. The output contains no unresolved markers
    /// except transclusions the resolver declined.
    pub fn expand(&self, source: &str) -> Result<String, PreprocessorError> {
        // fast path: nothing that could open a construct
        if !source.chars().any(|c| matches!(c, '{' | '}' | '<')) {
            return Ok(source.to_string());
        }
        let nodes = parse_wikitext(source)?;
        let frame = TemplateArgs::new();
        let mut out = String::new();
        self.expand_nodes(&nodes, &frame, 0, Placement::Page, &mut out)?;
        Ok(out)
    }

    fn expand_nodes(
        &self,
        nodes: &[PreNode],
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
        out: &mut String,
    ) -> Result<(), PreprocessorError> {
        if depth > self.max_depth {
            return Err(PreprocessorError::RecursionLimit {
                limit: self.max_depth,
            });
        }
        for node in nodes {
            match node {
                PreNode::Text(text) => out.push_str(text),
                PreNode::Fragment(inner) => {
                    self.expand_nodes(inner, frame, depth, placement, out)?
                }
                PreNode::Comment(_) => {}
                PreNode::Include(inc) => {
                    let included = match (placement, inc.kind) {
                        (Placement::Page, IncludeKind::NoInclude) => true,
                        (Placement::Page, IncludeKind::IncludeOnly) => false,
                        (Placement::Page, IncludeKind::OnlyInclude) => true,
                        (Placement::Transclusion, IncludeKind::NoInclude) => false,
                        (Placement::Transclusion, IncludeKind::IncludeOnly) => true,
                        (Placement::Transclusion, IncludeKind::OnlyInclude) => true,
                    };
                    if included {
                        self.expand_nodes(&inc.content, frame, depth, placement, out)?;
                    }
                }
                PreNode::Parameter(p) => self.expand_parameter(p, frame, depth, placement, out)?,
                PreNode::Template(t) => self.expand_template(t, frame, depth, placement, out)?,
                PreNode::StrayOpen(position) => {
                    return Err(PreprocessorError::Unbalanced {
                        marker: "{{".to_string(),
                        position: *position,
                    })
                }
                PreNode::StrayClose(position) => {
                    return Err(PreprocessorError::Unbalanced {
                        marker: "}}".to_string(),
                        position: *position,
                    })
                }
            }
        }
        Ok(())
    }

    fn expand_parameter(
        &self,
        param: &PreParameter,
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
        out: &mut String,
    ) -> Result<(), PreprocessorError> {
        let name_raw = self.expand_to_string(&param.name, frame, depth + 1, placement)?;
        let name = name_raw.trim();
        if let Some(value) = frame.get(name) {
            out.push_str(value);
        } else if let Some(default) = &param.default {
            self.expand_nodes(default, frame, depth + 1, placement, out)?;
        } else {
            out.push_str(&param.raw);
        }
        Ok(())
    }

    fn expand_template(
        &self,
        template: &PreTemplate,
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
        out: &mut String,
    ) -> Result<(), PreprocessorError> {
        let name_raw = self.expand_to_string(&template.name, frame, depth + 1, placement)?;
        let name = name_raw.trim();
        if let Some(result) =
            self.try_parser_function(name, &template.args, frame, depth, placement)?
        {
            out.push_str(&result);
            return Ok(());
        }
        if name.is_empty() || !TEMPLATE_NAME.is_match(name) {
            debug!("invalid template name {:?}, keeping source", name);
            out.push_str(&template.raw);
            return Ok(());
        }
        let args = self.build_args(&template.args, frame, depth, placement)?;
        match self.resolver.resolve(name, &args) {
            Err(err) => Err(PreprocessorError::Resolver {
                template: name.to_string(),
                message: err.message,
            }),
            Ok(None) => {
                debug!("template {:?} not found, keeping source", name);
                out.push_str(&template.raw);
                Ok(())
            }
            Ok(Some(body)) => {
                debug!("expanding template {:?} at depth {}", name, depth);
                let body_nodes = restrict_to_onlyinclude(parse_wikitext(&body)?);
                self.expand_nodes(&body_nodes, &args, depth + 1, Placement::Transclusion, out)
            }
        }
    }

    /// Evaluate `name` as a parser function or magic word, if it is one.
    /// Branch arguments are expanded lazily - only the chosen branch runs.
    fn try_parser_function(
        &self,
        name: &str,
        args: &[Vec<PreNode>],
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
    ) -> Result<Option<String>, PreprocessorError> {
        let (func, rest) = match name.split_once(':') {
            Some(parts) => parts,
            None => return Ok(None),
        };
        match func.trim().to_ascii_lowercase().as_str() {
            "#if" => {
                let chosen = if rest.trim().is_empty() {
                    args.get(1)
                } else {
                    args.first()
                };
                self.expand_branch(chosen, frame, depth, placement).map(Some)
            }
            "#ifeq" => {
                let right = match args.first() {
                    Some(nodes) => self.expand_to_string(nodes, frame, depth + 1, placement)?,
                    None => String::new(),
                };
                let chosen = if rest.trim() == right.trim() {
                    args.get(1)
                } else {
                    args.get(2)
                };
                self.expand_branch(chosen, frame, depth, placement).map(Some)
            }
            "#switch" => self
                .eval_switch(rest, args, frame, depth, placement)
                .map(Some),
            "uc" => Ok(Some(rest.trim().to_uppercase())),
            "lc" => Ok(Some(rest.trim().to_lowercase())),
            "ucfirst" => Ok(Some(map_first(rest.trim(), char::to_uppercase))),
            "lcfirst" => Ok(Some(map_first(rest.trim(), char::to_lowercase))),
            _ => Ok(None),
        }
    }

    fn expand_branch(
        &self,
        branch: Option<&Vec<PreNode>>,
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
    ) -> Result<String, PreprocessorError> {
        match branch {
            Some(nodes) => {
                let text = self.expand_to_string(nodes, frame, depth + 1, placement)?;
                Ok(text.trim().to_string())
            }
            None => Ok(String::new()),
        }
    }

    fn eval_switch(
        &self,
        value_raw: &str,
        args: &[Vec<PreNode>],
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
    ) -> Result<String, PreprocessorError> {
        let value = value_raw.trim();
        let mut fell_through = false;
        let mut default: Option<Vec<PreNode>> = None;
        for (i, arg) in args.iter().enumerate() {
            match split_named(arg) {
                Some((key_nodes, result_nodes)) => {
                    let key_raw = self.expand_to_string(&key_nodes, frame, depth + 1, placement)?;
                    let key = key_raw.trim();
                    if fell_through || key == value {
                        return self.expand_branch(Some(&result_nodes), frame, depth, placement);
                    }
                    if key == "#default" {
                        default = Some(result_nodes);
                    }
                }
                None => {
                    let key_raw = self.expand_to_string(arg, frame, depth + 1, placement)?;
                    let key = key_raw.trim();
                    if key == value {
                        fell_through = true;
                    } else if i == args.len() - 1 && !fell_through {
                        // a trailing bare argument is the default result
                        return Ok(key.to_string());
                    }
                }
            }
        }
        match default {
            Some(nodes) => self.expand_branch(Some(&nodes), frame, depth, placement),
            None => Ok(String::new()),
        }
    }

    fn build_args(
        &self,
        args: &[Vec<PreNode>],
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
    ) -> Result<TemplateArgs, PreprocessorError> {
        let mut out = TemplateArgs::new();
        for arg in args {
            match split_named(arg) {
                Some((name_nodes, value_nodes)) => {
                    let name = self.expand_to_string(&name_nodes, frame, depth + 1, placement)?;
                    let value = self.expand_to_string(&value_nodes, frame, depth + 1, placement)?;
                    // named argument names and values are trimmed; positional
                    // ones keep their whitespace
                    out.insert(name.trim().to_string(), value.trim().to_string());
                }
                None => out.push(self.expand_to_string(arg, frame, depth + 1, placement)?),
            }
        }
        Ok(out)
    }

    fn expand_to_string(
        &self,
        nodes: &[PreNode],
        frame: &TemplateArgs,
        depth: usize,
        placement: Placement,
    ) -> Result<String, PreprocessorError> {
        let mut out = String::new();
        self.expand_nodes(nodes, frame, depth, placement, &mut out)?;
        Ok(out)
    }
}

/// Split an argument at the first top-level `=` into name and value.
fn split_named(arg: &[PreNode]) -> Option<(Vec<PreNode>, Vec<PreNode>)> {
    for (i, node) in arg.iter().enumerate() {
        if let PreNode::Text(text) = node {
            if let Some(eq) = text.find('=') {
                let mut name: Vec<PreNode> = arg[..i].to_vec();
                if eq > 0 {
                    name.push(PreNode::Text(text[..eq].to_string()));
                }
                let mut value = Vec::new();
                if eq + 1 < text.len() {
                    value.push(PreNode::Text(text[eq + 1..].to_string()));
                }
                value.extend(arg[i + 1..].iter().cloned());
                return Some((name, value));
            }
        }
    }
    None
}

/// If a template body has `<onlyinclude>` sections, transclusion sees
/// only those sections.
fn restrict_to_onlyinclude(nodes: Vec<PreNode>) -> Vec<PreNode> {
    let has_onlyinclude = nodes.iter().any(|node| {
        matches!(node, PreNode::Include(inc) if inc.kind == IncludeKind::OnlyInclude)
    });
    if !has_onlyinclude {
        return nodes;
    }
    nodes
        .into_iter()
        .filter(|node| matches!(node, PreNode::Include(inc) if inc.kind == IncludeKind::OnlyInclude))
        .collect()
}

fn map_first<I: Iterator<Item = char>>(text: &str, f: impl Fn(char) -> I) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => f(first).chain(chars).collect(),
        None => String::new(),
    }
}
