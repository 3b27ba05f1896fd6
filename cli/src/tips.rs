use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Number of tips shown in the compact view.
pub const COMPACT_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipCategory {
    Charging,
    Temperature,
    Usage,
    Storage,
}

impl TipCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TipCategory::Charging => "Charging",
            TipCategory::Temperature => "Temperature",
            TipCategory::Usage => "Usage",
            TipCategory::Storage => "Storage",
        }
    }
}

impl fmt::Display for TipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TipCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "charging" => Ok(TipCategory::Charging),
            "temperature" => Ok(TipCategory::Temperature),
            "usage" => Ok(TipCategory::Usage),
            "storage" => Ok(TipCategory::Storage),
            other => Err(format!(
                "unknown category '{}' (expected charging, temperature, usage or storage)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthTip {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: TipCategory,
}

pub const HEALTH_TIPS: [HealthTip; 8] = [
    HealthTip {
        id: "1",
        title: "Avoid Extreme Temperatures",
        description: "Keep your device between 20°C and 35°C. Extreme heat damages battery cells permanently.",
        icon: "thermometer",
        category: TipCategory::Temperature,
    },
    HealthTip {
        id: "2",
        title: "Optimal Charging Range",
        description: "Keep battery between 20-80% for longest lifespan. Avoid full 0-100% cycles regularly.",
        icon: "battery-charging",
        category: TipCategory::Charging,
    },
    HealthTip {
        id: "3",
        title: "Use Original Charger",
        description: "Original or certified chargers ensure proper voltage and current for safe charging.",
        icon: "zap",
        category: TipCategory::Charging,
    },
    HealthTip {
        id: "4",
        title: "Avoid Overnight Charging",
        description: "Modern phones handle this, but unplugging at 80-90% extends battery longevity.",
        icon: "moon",
        category: TipCategory::Charging,
    },
    HealthTip {
        id: "5",
        title: "Reduce Screen Brightness",
        description: "Display is the biggest power consumer. Use auto-brightness or keep it moderate.",
        icon: "sun",
        category: TipCategory::Usage,
    },
    HealthTip {
        id: "6",
        title: "Close Background Apps",
        description: "Apps running in background drain battery. Regularly close unused applications.",
        icon: "x-circle",
        category: TipCategory::Usage,
    },
    HealthTip {
        id: "7",
        title: "Store at 50% Charge",
        description: "If storing device long-term, keep battery at 50% in a cool, dry place.",
        icon: "archive",
        category: TipCategory::Storage,
    },
    HealthTip {
        id: "8",
        title: "Enable Battery Saver",
        description: "Use battery saver mode when below 20% to extend usage time significantly.",
        icon: "shield",
        category: TipCategory::Usage,
    },
];

/// Tips to show, in catalogue order.
///
/// The compact view takes the first few tips before any category filter.
pub fn select(compact: bool, category: Option<TipCategory>) -> Vec<&'static HealthTip> {
    let limit = if compact {
        COMPACT_COUNT
    } else {
        HEALTH_TIPS.len()
    };

    HEALTH_TIPS
        .iter()
        .take(limit)
        .filter(|tip| category.is_none_or(|c| tip.category == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalogue_ids_are_unique() {
        let ids: HashSet<_> = HEALTH_TIPS.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), HEALTH_TIPS.len());
    }

    #[test]
    fn test_compact_takes_first_four() {
        let tips = select(true, None);
        let ids: Vec<_> = tips.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_category_filter() {
        let usage = select(false, Some(TipCategory::Usage));
        let ids: Vec<_> = usage.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["5", "6", "8"]);

        assert!(select(true, Some(TipCategory::Storage)).is_empty());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Charging".parse::<TipCategory>(), Ok(TipCategory::Charging));
        assert_eq!(" storage ".parse::<TipCategory>(), Ok(TipCategory::Storage));
        assert!("battery".parse::<TipCategory>().is_err());
    }

    #[test]
    fn test_tip_serializes_lowercase_category() {
        let json = serde_json::to_value(HEALTH_TIPS[0]).unwrap();
        assert_eq!(json["category"], "temperature");
        assert_eq!(json["icon"], "thermometer");
    }
}
