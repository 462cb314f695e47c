//! Fixed type → cognitive-function stack lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the eight attitude-qualified cognitive functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveFunction {
    Ni,
    Ne,
    Si,
    Se,
    Ti,
    Te,
    Fi,
    Fe,
}

impl CognitiveFunction {
    pub fn label(self) -> &'static str {
        match self {
            CognitiveFunction::Ni => "Introverted Intuition",
            CognitiveFunction::Ne => "Extraverted Intuition",
            CognitiveFunction::Si => "Introverted Sensing",
            CognitiveFunction::Se => "Extraverted Sensing",
            CognitiveFunction::Ti => "Introverted Thinking",
            CognitiveFunction::Te => "Extraverted Thinking",
            CognitiveFunction::Fi => "Introverted Feeling",
            CognitiveFunction::Fe => "Extraverted Feeling",
        }
    }
}

impl fmt::Display for CognitiveFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CognitiveFunction::Ni => "Ni",
            CognitiveFunction::Ne => "Ne",
            CognitiveFunction::Si => "Si",
            CognitiveFunction::Se => "Se",
            CognitiveFunction::Ti => "Ti",
            CognitiveFunction::Te => "Te",
            CognitiveFunction::Fi => "Fi",
            CognitiveFunction::Fe => "Fe",
        };
        write!(f, "{code}")
    }
}

/// Position within a four-function stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRole {
    Dominant,
    Auxiliary,
    Tertiary,
    Inferior,
}

impl StackRole {
    pub const ALL: [StackRole; 4] = [
        StackRole::Dominant,
        StackRole::Auxiliary,
        StackRole::Tertiary,
        StackRole::Inferior,
    ];

    /// Contribution of a function in this position to its strength score.
    pub fn weight(self) -> f64 {
        match self {
            StackRole::Dominant => 1.0,
            StackRole::Auxiliary => 0.75,
            StackRole::Tertiary => 0.5,
            StackRole::Inferior => 0.25,
        }
    }
}

impl fmt::Display for StackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackRole::Dominant => write!(f, "dominant"),
            StackRole::Auxiliary => write!(f, "auxiliary"),
            StackRole::Tertiary => write!(f, "tertiary"),
            StackRole::Inferior => write!(f, "inferior"),
        }
    }
}

use CognitiveFunction::{Fe, Fi, Ne, Ni, Se, Si, Te, Ti};

/// Dominant, auxiliary, tertiary and inferior function for each of the 16 types.
pub static COGNITIVE_STACKS: [(&str, [CognitiveFunction; 4]); 16] = [
    ("ISTJ", [Si, Te, Fi, Ne]),
    ("ISFJ", [Si, Fe, Ti, Ne]),
    ("INFJ", [Ni, Fe, Ti, Se]),
    ("INTJ", [Ni, Te, Fi, Se]),
    ("ISTP", [Ti, Se, Ni, Fe]),
    ("ISFP", [Fi, Se, Ni, Te]),
    ("INFP", [Fi, Ne, Si, Te]),
    ("INTP", [Ti, Ne, Si, Fe]),
    ("ESTP", [Se, Ti, Fe, Ni]),
    ("ESFP", [Se, Fi, Te, Ni]),
    ("ENFP", [Ne, Fi, Te, Si]),
    ("ENTP", [Ne, Ti, Fe, Si]),
    ("ESTJ", [Te, Si, Ne, Fi]),
    ("ESFJ", [Fe, Si, Ne, Ti]),
    ("ENFJ", [Fe, Ni, Se, Ti]),
    ("ENTJ", [Te, Ni, Se, Fi]),
];

/// The stack for a four-letter type code, case-insensitive.
pub fn stack_for(type_code: &str) -> Option<[CognitiveFunction; 4]> {
    let code = type_code.to_uppercase();
    COGNITIVE_STACKS
        .iter()
        .find(|(t, _)| *t == code)
        .map(|(_, stack)| *stack)
}

/// All 16 type codes in table order.
pub fn all_types() -> impl Iterator<Item = &'static str> {
    COGNITIVE_STACKS.iter().map(|(t, _)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn intj_stack() {
        assert_eq!(stack_for("INTJ"), Some([Ni, Te, Fi, Se]));
        assert_eq!(stack_for("intj"), Some([Ni, Te, Fi, Se]));
    }

    #[test]
    fn unknown_type_has_no_stack() {
        assert!(stack_for("XXXX").is_none());
    }

    #[test]
    fn table_covers_sixteen_distinct_types() {
        let types: HashSet<_> = all_types().collect();
        assert_eq!(types.len(), 16);
    }

    #[test]
    fn every_stack_alternates_attitude_and_pairs_judging_with_perceiving() {
        let introverted = |f: CognitiveFunction| matches!(f, Ni | Si | Ti | Fi);
        let perceiving = |f: CognitiveFunction| matches!(f, Ni | Ne | Si | Se);
        for (code, [dom, aux, tert, inf]) in COGNITIVE_STACKS.iter() {
            assert_ne!(introverted(*dom), introverted(*aux), "{code}");
            assert_ne!(perceiving(*dom), perceiving(*aux), "{code}");
            assert_eq!(introverted(*dom), code.starts_with('I'), "{code}");
            assert_eq!(perceiving(*tert), perceiving(*aux), "{code}");
            assert_eq!(perceiving(*inf), perceiving(*dom), "{code}");
        }
    }
}
