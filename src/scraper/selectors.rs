//! Selector table for the tracker profile page
//!
//! The page's generated class names (e.g. `svelte-kej2cd`) change between
//! upstream deployments, so each field carries an ordered list of strategies
//! instead of a single selector. The table is plain data and can be
//! overridden from a TOML file without touching code.

use indexmap::IndexMap;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ScraperError;

/// One way of locating a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorStrategy {
    pub selector: String,
    /// Which match to use when the selector hits several elements
    #[serde(default)]
    pub index: usize,
}

impl SelectorStrategy {
    pub fn new(selector: &str, index: usize) -> Self {
        Self {
            selector: selector.to_string(),
            index,
        }
    }
}

/// Stat fields extracted from the profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Rank,
    Wins,
    Losses,
    Goals,
    Passes,
    Steals,
    Saves,
    Assists,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Rank,
        ProfileField::Wins,
        ProfileField::Losses,
        ProfileField::Goals,
        ProfileField::Passes,
        ProfileField::Steals,
        ProfileField::Saves,
        ProfileField::Assists,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProfileField::Rank => "rank",
            ProfileField::Wins => "wins",
            ProfileField::Losses => "losses",
            ProfileField::Goals => "goals",
            ProfileField::Passes => "passes",
            ProfileField::Steals => "steals",
            ProfileField::Saves => "saves",
            ProfileField::Assists => "assists",
        }
    }
}

/// Per-field strategy lists plus page-level selectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorTable {
    /// Element whose presence means the page finished rendering
    pub anchor: String,
    /// Profile display name
    pub heading: Vec<SelectorStrategy>,
    pub rank: Vec<SelectorStrategy>,
    pub wins: Vec<SelectorStrategy>,
    pub losses: Vec<SelectorStrategy>,
    pub goals: Vec<SelectorStrategy>,
    pub passes: Vec<SelectorStrategy>,
    pub steals: Vec<SelectorStrategy>,
    pub saves: Vec<SelectorStrategy>,
    #[serde(default)]
    pub assists: Vec<SelectorStrategy>,
    /// Game-mode name -> elements to click, in order, before capture.
    /// Empty by default; the profile page is scraped in its default view
    /// unless a table loaded from TOML names the filter controls.
    #[serde(default)]
    pub mode_filters: IndexMap<String, Vec<String>>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        // Hashed class first, then the same utility classes without the hash
        let tiered = |tag: &str, classes: &str| {
            vec![
                SelectorStrategy::new(&format!("{}.{}.svelte-kej2cd", tag, classes), 0),
                SelectorStrategy::new(&format!("{}.{}", tag, classes), 0),
            ]
        };

        Self {
            anchor: "h1".to_string(),
            heading: vec![SelectorStrategy::new("h1", 0)],
            rank: vec![
                SelectorStrategy::new("div.text-lg.font-bold.text-white", 0),
                SelectorStrategy::new("div.font-bold.text-white", 0),
            ],
            wins: tiered("div", "text-lg.font-bold.text-green-400"),
            losses: tiered("div", "text-lg.font-bold.text-red-400"),
            goals: tiered("span", "font-bold.text-purple-400"),
            passes: tiered("span", "font-bold.text-blue-400"),
            steals: tiered("span", "font-bold.text-pink-400"),
            saves: tiered("span", "font-bold.text-red-400"),
            assists: tiered("span", "font-bold.text-yellow-400"),
            mode_filters: IndexMap::new(),
        }
    }
}

impl SelectorTable {
    pub fn from_toml_str(content: &str) -> Result<Self, ScraperError> {
        toml::from_str(content).map_err(|e| ScraperError::InvalidSelector(e.to_string()))
    }

    /// Load a table from a TOML file
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::InvalidSelector(format!("cannot read {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn strategies(&self, field: ProfileField) -> &[SelectorStrategy] {
        match field {
            ProfileField::Rank => &self.rank,
            ProfileField::Wins => &self.wins,
            ProfileField::Losses => &self.losses,
            ProfileField::Goals => &self.goals,
            ProfileField::Passes => &self.passes,
            ProfileField::Steals => &self.steals,
            ProfileField::Saves => &self.saves,
            ProfileField::Assists => &self.assists,
        }
    }

    /// Parse every selector once, rejecting the table if any is invalid
    pub fn compile(&self) -> Result<CompiledSelectors, ScraperError> {
        let fields = ProfileField::ALL
            .iter()
            .map(|&field| Ok((field, compile_all(self.strategies(field))?)))
            .collect::<Result<Vec<_>, ScraperError>>()?;

        for steps in self.mode_filters.values() {
            for step in steps {
                parse_selector(step)?;
            }
        }
        parse_selector(&self.anchor)?;

        Ok(CompiledSelectors {
            anchor: self.anchor.clone(),
            heading: compile_all(&self.heading)?,
            fields,
            mode_filters: self.mode_filters.clone(),
        })
    }
}

/// A strategy with its selector parsed
#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    pub source: String,
    pub selector: Selector,
    pub index: usize,
}

/// Ready-to-use selector table
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub anchor: String,
    pub heading: Vec<CompiledStrategy>,
    pub fields: Vec<(ProfileField, Vec<CompiledStrategy>)>,
    pub mode_filters: IndexMap<String, Vec<String>>,
}

impl CompiledSelectors {
    /// Click sequence for a game mode, matched case-insensitively
    pub fn mode_filter(&self, mode: &str) -> Option<&[String]> {
        let mode = mode.trim().to_lowercase();
        self.mode_filters
            .iter()
            .find(|(name, _)| name.to_lowercase() == mode)
            .map(|(_, steps)| steps.as_slice())
    }
}

fn parse_selector(source: &str) -> Result<Selector, ScraperError> {
    Selector::parse(source)
        .map_err(|e| ScraperError::InvalidSelector(format!("'{}': {}", source, e)))
}

fn compile_all(strategies: &[SelectorStrategy]) -> Result<Vec<CompiledStrategy>, ScraperError> {
    strategies
        .iter()
        .map(|strategy| {
            Ok(CompiledStrategy {
                source: strategy.selector.clone(),
                selector: parse_selector(&strategy.selector)?,
                index: strategy.index,
            })
        })
        .collect()
}
