//! Line-oriented definition files for security sets and models.
//!
//! ```text
//! # Security Set: Core Equity
//! # Description: Large-cap sleeve
//!
//! # Ticker  Lower%  Target%  Upper%
//! VTI       40      50       60
//!   = ITOT
//! VXUS      20%     25%      30%
//! ```
//!
//! Model files use `# Model: <name>` and component lines whose last three
//! tokens are the bounds; everything before them is the component name.
//!
//! Parsing is lenient: blank lines, comments and malformed data lines are
//! skipped. The only fatal condition is a missing name header.

use std::fmt;
use std::fmt::Write as _;

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::FormatError;
use crate::percent::{format_percent, parse_percent};
use crate::tolerance::Band;

/// Which grammar a definition file follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DefinitionKind {
    SecuritySet,
    Model,
}

impl DefinitionKind {
    /// Label used in the `# <label>: <name>` header.
    pub fn header_label(self) -> &'static str {
        match self {
            DefinitionKind::SecuritySet => "Security Set",
            DefinitionKind::Model => "Model",
        }
    }

    fn column_header(self) -> &'static str {
        match self {
            DefinitionKind::SecuritySet => "Ticker",
            DefinitionKind::Model => "Component",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::SecuritySet => write!(f, "security set"),
            DefinitionKind::Model => write!(f, "model"),
        }
    }
}

/// One security line of a security-set file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecurityEntry {
    pub ticker: String,
    pub lower_bound: f64,
    pub target: f64,
    pub upper_bound: f64,
    /// Interchangeable tickers from the `=` lines under this entry.
    pub equivalents: Vec<String>,
    /// 0-based position among the data lines.
    pub rank: u32,
}

/// One component line of a model file. `name` refers to a security set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelComponent {
    pub name: String,
    pub lower_bound: f64,
    pub target: f64,
    pub upper_bound: f64,
    pub rank: u32,
}

/// Result of parsing one definition file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedDefinition<E> {
    pub name: String,
    pub description: Option<String>,
    pub entries: Vec<E>,
}

pub type SecuritySetDefinition = ParsedDefinition<SecurityEntry>;
pub type ModelDefinition = ParsedDefinition<ModelComponent>;

/// A parsed file of either kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    SecuritySet(SecuritySetDefinition),
    Model(ModelDefinition),
}

impl Definition {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Definition::SecuritySet(_) => DefinitionKind::SecuritySet,
            Definition::Model(_) => DefinitionKind::Model,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Definition::SecuritySet(d) => &d.name,
            Definition::Model(d) => &d.name,
        }
    }
}

/// Common view over security entries and model components.
pub trait Entry {
    /// Ticker or component name, as written.
    fn key(&self) -> &str;
    fn band(&self) -> Band;
    fn rank(&self) -> u32;
    fn equivalents(&self) -> &[String] {
        &[]
    }
}

impl SecurityEntry {
    pub fn new(ticker: &str, lower_bound: f64, target: f64, upper_bound: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            lower_bound,
            target,
            upper_bound,
            equivalents: Vec::new(),
            rank: 0,
        }
    }

    pub fn with_equivalents(mut self, tickers: &[&str]) -> Self {
        self.equivalents = tickers.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}

impl ModelComponent {
    pub fn new(name: &str, lower_bound: f64, target: f64, upper_bound: f64) -> Self {
        Self {
            name: name.to_string(),
            lower_bound,
            target,
            upper_bound,
            rank: 0,
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}

impl Entry for SecurityEntry {
    fn key(&self) -> &str {
        &self.ticker
    }
    fn band(&self) -> Band {
        Band::new(self.lower_bound, self.target, self.upper_bound)
    }
    fn rank(&self) -> u32 {
        self.rank
    }
    fn equivalents(&self) -> &[String] {
        &self.equivalents
    }
}

impl Entry for ModelComponent {
    fn key(&self) -> &str {
        &self.name
    }
    fn band(&self) -> Band {
        Band::new(self.lower_bound, self.target, self.upper_bound)
    }
    fn rank(&self) -> u32 {
        self.rank
    }
}

impl<E: Entry> ParsedDefinition<E> {
    /// Keys that appear more than once (case-insensitive), in file order.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut reported = FxHashSet::default();
        let mut dups = Vec::new();
        for entry in &self.entries {
            let key = entry.key().to_lowercase();
            if !seen.insert(key.clone()) && reported.insert(key) {
                dups.push(entry.key().to_string());
            }
        }
        dups
    }
}

// === Parsing ===

/// Per-kind data-line grammar.
trait ParseEntry: Entry + Sized {
    const KIND: DefinitionKind;

    fn from_tokens(tokens: &[&str], rank: u32) -> Option<Self>;

    fn push_equivalent(&mut self, _ticker: &str) {}
}

impl ParseEntry for SecurityEntry {
    const KIND: DefinitionKind = DefinitionKind::SecuritySet;

    fn from_tokens(tokens: &[&str], rank: u32) -> Option<Self> {
        let [ticker, lower, target, upper] = tokens else {
            return None;
        };
        Some(SecurityEntry {
            ticker: ticker.to_string(),
            lower_bound: parse_percent(lower)?,
            target: parse_percent(target)?,
            upper_bound: parse_percent(upper)?,
            equivalents: Vec::new(),
            rank,
        })
    }

    fn push_equivalent(&mut self, ticker: &str) {
        self.equivalents.push(ticker.to_string());
    }
}

impl ParseEntry for ModelComponent {
    const KIND: DefinitionKind = DefinitionKind::Model;

    fn from_tokens(tokens: &[&str], rank: u32) -> Option<Self> {
        if tokens.len() < 4 {
            return None;
        }
        let (name, bounds) = tokens.split_at(tokens.len() - 3);
        Some(ModelComponent {
            name: name.join(" "),
            lower_bound: parse_percent(bounds[0])?,
            target: parse_percent(bounds[1])?,
            upper_bound: parse_percent(bounds[2])?,
            rank,
        })
    }
}

enum Line<'a> {
    Blank,
    Comment,
    Name(DefinitionKind, &'a str),
    Description(&'a str),
    Equivalent(&'a str),
    Data(Vec<&'a str>),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix('#') {
        let Some((label, value)) = rest.split_once(':') else {
            return Line::Comment;
        };
        let value = value.trim();
        return match label.trim().to_lowercase().as_str() {
            "security set" => Line::Name(DefinitionKind::SecuritySet, value),
            "model" => Line::Name(DefinitionKind::Model, value),
            "description" => Line::Description(value),
            _ => Line::Comment,
        };
    }
    if let Some(rest) = trimmed.strip_prefix('=') {
        return Line::Equivalent(rest.trim());
    }
    Line::Data(trimmed.split_whitespace().collect())
}

fn parse_definition<E: ParseEntry>(text: &str) -> Result<ParsedDefinition<E>, FormatError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut entries: Vec<E> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        match classify(line) {
            Line::Blank | Line::Comment => {}
            Line::Name(kind, value) if kind == E::KIND => {
                name = (!value.is_empty()).then(|| value.to_string());
            }
            Line::Name(..) => {}
            Line::Description(value) => {
                description = (!value.is_empty()).then(|| value.to_string());
            }
            Line::Equivalent(ticker) => match entries.last_mut() {
                Some(entry) if !ticker.is_empty() => entry.push_equivalent(ticker),
                _ => debug!("line {}: equivalent with no entry to attach to", line_no + 1),
            },
            Line::Data(tokens) => {
                let rank = entries.len() as u32;
                match E::from_tokens(&tokens, rank) {
                    Some(entry) => entries.push(entry),
                    None => debug!("line {}: skipping malformed data line", line_no + 1),
                }
            }
        }
    }

    let name = name.ok_or(FormatError::MissingName { kind: E::KIND })?;
    Ok(ParsedDefinition {
        name,
        description,
        entries,
    })
}

/// Parse a security-set file.
pub fn parse_security_set(text: &str) -> Result<SecuritySetDefinition, FormatError> {
    parse_definition(text)
}

/// Parse a model file.
pub fn parse_model(text: &str) -> Result<ModelDefinition, FormatError> {
    parse_definition(text)
}

/// Parse text with an explicit grammar.
pub fn parse(kind: DefinitionKind, text: &str) -> Result<Definition, FormatError> {
    match kind {
        DefinitionKind::SecuritySet => parse_security_set(text).map(Definition::SecuritySet),
        DefinitionKind::Model => parse_model(text).map(Definition::Model),
    }
}

/// Kind of the first non-empty name header in the text.
pub fn detect_kind(text: &str) -> Option<DefinitionKind> {
    text.lines().find_map(|line| match classify(line) {
        Line::Name(kind, value) if !value.is_empty() => Some(kind),
        _ => None,
    })
}

/// Parse text whose kind is given by its own name header.
pub fn parse_any(text: &str) -> Result<Definition, FormatError> {
    let kind = detect_kind(text).ok_or(FormatError::UnknownKind)?;
    parse(kind, text)
}

// === Rendering ===

fn render_with<E: Entry>(kind: DefinitionKind, def: &ParsedDefinition<E>) -> String {
    let width = def
        .entries
        .iter()
        .map(|e| e.key().len())
        .chain(std::iter::once(kind.column_header().len() + 2))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "# {}: {}", kind.header_label(), def.name);
    if let Some(desc) = &def.description {
        let _ = writeln!(out, "# Description: {desc}");
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "{:<width$}  {:>8}  {:>8}  {:>8}",
        format!("# {}", kind.column_header()),
        "Lower%",
        "Target%",
        "Upper%",
    );

    for entry in &def.entries {
        let band = entry.band();
        let _ = writeln!(
            out,
            "{:<width$}  {:>8}  {:>8}  {:>8}",
            entry.key(),
            format_percent(band.lower_bound),
            format_percent(band.target),
            format_percent(band.upper_bound),
        );
        for eq in entry.equivalents() {
            let _ = writeln!(out, "  = {eq}");
        }
    }
    out
}

/// Canonical text for a security set; parses back to the same definition.
pub fn render_security_set(def: &SecuritySetDefinition) -> String {
    render_with(DefinitionKind::SecuritySet, def)
}

/// Canonical text for a model.
pub fn render_model(def: &ModelDefinition) -> String {
    render_with(DefinitionKind::Model, def)
}

pub fn render(def: &Definition) -> String {
    match def {
        Definition::SecuritySet(d) => render_security_set(d),
        Definition::Model(d) => render_model(d),
    }
}
