use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BallisticsError;

/// Drag model enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DragModel {
    #[default]
    G1,
    G7,
    Custom,
}

impl DragModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DragModel::G1 => "G1",
            DragModel::G7 => "G7",
            DragModel::Custom => "Custom",
        }
    }
}

impl FromStr for DragModel {
    type Err = BallisticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "G1" => Ok(DragModel::G1),
            "G7" => Ok(DragModel::G7),
            "CUSTOM" => Ok(DragModel::Custom),
            _ => Err(BallisticsError::configuration(format!(
                "unsupported drag model '{s}' (expected G1, G7 or Custom)"
            ))),
        }
    }
}

impl fmt::Display for DragModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_model_from_str() {
        assert_eq!("G1".parse::<DragModel>().unwrap(), DragModel::G1);
        assert_eq!("G7".parse::<DragModel>().unwrap(), DragModel::G7);
        assert_eq!("Custom".parse::<DragModel>().unwrap(), DragModel::Custom);
    }

    #[test]
    fn test_drag_model_from_str_case_insensitive() {
        assert_eq!("g1".parse::<DragModel>().unwrap(), DragModel::G1);
        assert_eq!("g7".parse::<DragModel>().unwrap(), DragModel::G7);
        assert_eq!("CUSTOM".parse::<DragModel>().unwrap(), DragModel::Custom);
        assert_eq!(" custom ".parse::<DragModel>().unwrap(), DragModel::Custom);
    }

    #[test]
    fn test_drag_model_from_str_invalid() {
        for bad in ["G2", "G9", "", "invalid", "123"] {
            let err = bad.parse::<DragModel>().unwrap_err();
            assert!(matches!(err, BallisticsError::Configuration(_)), "{bad}");
        }
    }

    #[test]
    fn test_drag_model_display() {
        assert_eq!(format!("{}", DragModel::G1), "G1");
        assert_eq!(format!("{}", DragModel::G7), "G7");
        assert_eq!(format!("{}", DragModel::Custom), "Custom");
    }

    #[test]
    fn test_drag_model_serde_names() {
        assert_eq!(serde_json::to_string(&DragModel::G7).unwrap(), "\"G7\"");
        assert_eq!(
            serde_json::from_str::<DragModel>("\"Custom\"").unwrap(),
            DragModel::Custom
        );
        assert!(serde_json::from_str::<DragModel>("\"G5\"").is_err());
    }
}
