//! Core data model types for typewise.
//!
//! The four dichotomies are a closed enumeration; items, banks and the
//! per-dimension container are plain serde types shared by every crate.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One of the four independent trait dichotomies.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Extraversion / Introversion.
    EI,
    /// Sensing / Intuition.
    SN,
    /// Thinking / Feeling.
    TF,
    /// Judging / Perceiving.
    JP,
}

impl Dimension {
    /// All dimensions in type-string order.
    pub const ALL: [Dimension; 4] = [Dimension::EI, Dimension::SN, Dimension::TF, Dimension::JP];

    /// Position of this dimension in the four-letter type string.
    pub fn index(self) -> usize {
        match self {
            Dimension::EI => 0,
            Dimension::SN => 1,
            Dimension::TF => 2,
            Dimension::JP => 3,
        }
    }

    /// The pole favoured by positive theta (the "A" pole of the 2PL model).
    pub fn first_pole(self) -> Pole {
        match self {
            Dimension::EI => Pole::E,
            Dimension::SN => Pole::S,
            Dimension::TF => Pole::T,
            Dimension::JP => Pole::J,
        }
    }

    /// The pole favoured by negative theta.
    pub fn second_pole(self) -> Pole {
        self.first_pole().opposite()
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::EI => "Extraversion / Introversion",
            Dimension::SN => "Sensing / Intuition",
            Dimension::TF => "Thinking / Feeling",
            Dimension::JP => "Judging / Perceiving",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::EI => write!(f, "EI"),
            Dimension::SN => write!(f, "SN"),
            Dimension::TF => write!(f, "TF"),
            Dimension::JP => write!(f, "JP"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EI" | "E/I" | "IE" => Ok(Dimension::EI),
            "SN" | "S/N" | "NS" => Ok(Dimension::SN),
            "TF" | "T/F" | "FT" => Ok(Dimension::TF),
            "JP" | "J/P" | "PJ" => Ok(Dimension::JP),
            other => Err(format!("unknown dimension: {other}")),
        }
    }
}

/// One end of a dichotomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pole {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Pole {
    /// The dimension this pole belongs to.
    pub fn dimension(self) -> Dimension {
        match self {
            Pole::E | Pole::I => Dimension::EI,
            Pole::S | Pole::N => Dimension::SN,
            Pole::T | Pole::F => Dimension::TF,
            Pole::J | Pole::P => Dimension::JP,
        }
    }

    /// The other end of the same dichotomy.
    pub fn opposite(self) -> Pole {
        match self {
            Pole::E => Pole::I,
            Pole::I => Pole::E,
            Pole::S => Pole::N,
            Pole::N => Pole::S,
            Pole::T => Pole::F,
            Pole::F => Pole::T,
            Pole::J => Pole::P,
            Pole::P => Pole::J,
        }
    }

    /// Whether positive theta points toward this pole.
    pub fn is_first(self) -> bool {
        self.dimension().first_pole() == self
    }

    pub fn letter(self) -> char {
        match self {
            Pole::E => 'E',
            Pole::I => 'I',
            Pole::S => 'S',
            Pole::N => 'N',
            Pole::T => 'T',
            Pole::F => 'F',
            Pole::J => 'J',
            Pole::P => 'P',
        }
    }
}

impl fmt::Display for Pole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Pole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "E" => Ok(Pole::E),
            "I" => Ok(Pole::I),
            "S" => Ok(Pole::S),
            "N" => Ok(Pole::N),
            "T" => Ok(Pole::T),
            "F" => Ok(Pole::F),
            "J" => Ok(Pole::J),
            "P" => Ok(Pole::P),
            other => Err(format!("unknown pole: {other}")),
        }
    }
}

/// Which of the two forced-choice options the respondent picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseChoice {
    A,
    B,
}

impl fmt::Display for ResponseChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseChoice::A => write!(f, "A"),
            ResponseChoice::B => write!(f, "B"),
        }
    }
}

impl FromStr for ResponseChoice {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" | "1" => Ok(ResponseChoice::A),
            "B" | "2" => Ok(ResponseChoice::B),
            _ => Err(EngineError::InvalidResponse(s.to_string())),
        }
    }
}

/// A calibrated forced-choice item. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychometricItem {
    /// Unique identifier within the bank.
    pub id: String,
    /// The dichotomy this item measures.
    pub dimension: Dimension,
    /// 2PL discrimination parameter `a`.
    pub discrimination: f64,
    /// 2PL location parameter `b`.
    pub difficulty: f64,
    /// Text of the first option.
    pub option_a: String,
    /// Text of the second option.
    pub option_b: String,
    /// Pole endorsed by choosing option A. Option B endorses the opposite pole.
    pub option_a_pole: Pole,
    /// Socially favoured pole, for items tagged as desirability-sensitive.
    #[serde(default)]
    pub desirable_pole: Option<Pole>,
}

impl PsychometricItem {
    /// Pole endorsed by choosing option B.
    pub fn option_b_pole(&self) -> Pole {
        self.option_a_pole.opposite()
    }

    /// Pole endorsed by the given choice.
    pub fn pole_for(&self, choice: ResponseChoice) -> Pole {
        match choice {
            ResponseChoice::A => self.option_a_pole,
            ResponseChoice::B => self.option_b_pole(),
        }
    }

    /// Whether the choice endorses the dimension's first pole, i.e. counts as
    /// a "pole-A" response for the probability model.
    pub fn endorses_first_pole(&self, choice: ResponseChoice) -> bool {
        self.pole_for(choice).is_first()
    }

    pub fn text_for(&self, choice: ResponseChoice) -> &str {
        match choice {
            ResponseChoice::A => &self.option_a,
            ResponseChoice::B => &self.option_b,
        }
    }
}

/// A read-only catalogue of items across all four dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// All items, in file order.
    #[serde(default)]
    pub items: Vec<PsychometricItem>,
}

impl ItemBank {
    /// Look up an item by id.
    pub fn get(&self, item_id: &str) -> Option<&PsychometricItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Items measuring the given dimension.
    pub fn items_for(&self, dimension: Dimension) -> impl Iterator<Item = &PsychometricItem> {
        self.items
            .iter()
            .filter(move |item| item.dimension == dimension)
    }

    pub fn count_for(&self, dimension: Dimension) -> usize {
        self.items_for(dimension).count()
    }

    /// Number of items in `dimension` not yet in `administered`.
    pub fn remaining_for(&self, dimension: Dimension, administered: &HashSet<String>) -> usize {
        self.items_for(dimension)
            .filter(|item| !administered.contains(&item.id))
            .count()
    }
}

/// A fixed four-slot container keyed by [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionMap<T> {
    pub ei: T,
    pub sn: T,
    pub tf: T,
    pub jp: T,
}

impl<T> DimensionMap<T> {
    /// Build a map by evaluating `f` for each dimension in type-string order.
    pub fn from_fn(mut f: impl FnMut(Dimension) -> T) -> Self {
        Self {
            ei: f(Dimension::EI),
            sn: f(Dimension::SN),
            tf: f(Dimension::TF),
            jp: f(Dimension::JP),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &T {
        match dimension {
            Dimension::EI => &self.ei,
            Dimension::SN => &self.sn,
            Dimension::TF => &self.tf,
            Dimension::JP => &self.jp,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut T {
        match dimension {
            Dimension::EI => &mut self.ei,
            Dimension::SN => &mut self.sn,
            Dimension::TF => &mut self.tf,
            Dimension::JP => &mut self.jp,
        }
    }

    /// Iterate `(dimension, value)` pairs in type-string order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &T)> {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}
