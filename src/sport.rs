//! Canonical sport catalog and device sport-name mapping.
//!
//! Trace files record sport names the way the device firmware spells them
//! ("running", "trail_running", sometimes "Run"). The catalog below defines
//! the canonical sports seeded into the store and the device spellings that
//! map onto each of them. Unmapped spellings resolve to no sport; such
//! activities are excluded from awards.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One canonical sport definition.
#[derive(Debug, Clone, Copy)]
pub struct SportDef {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub category: &'static str,
    pub has_distance: bool,
    pub evaluates_for_awards: bool,
    /// Device spellings (FIT sport enum names, GPX track types) that map to
    /// this sport.
    pub device_names: &'static [&'static str],
}

/// Canonical sports seeded into every store.
pub static SPORT_CATALOG: &[SportDef] = &[
    SportDef {
        name: "Running",
        icon: "fa-running",
        color: "#FF6B6B",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["running", "run", "virtual_run", "treadmill_running"],
    },
    SportDef {
        name: "Trail Running",
        icon: "fa-mountain",
        color: "#8B4513",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["trail_running", "trail run"],
    },
    SportDef {
        name: "Cycling",
        icon: "fa-bicycle",
        color: "#4ECDC4",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["cycling", "biking", "ride", "road_biking", "virtual_ride"],
    },
    SportDef {
        name: "Mountain Biking",
        icon: "fa-mountain",
        color: "#8B4513",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["mountain_biking", "mountain biking", "mtb"],
    },
    SportDef {
        name: "Walking",
        icon: "fa-walking",
        color: "#98D8C8",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["walking", "walk", "casual_walking"],
    },
    SportDef {
        name: "Hiking",
        icon: "fa-hiking",
        color: "#67B26F",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["hiking", "hike"],
    },
    SportDef {
        name: "Swimming",
        icon: "fa-swimmer",
        color: "#0077BE",
        category: "Water",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["swimming", "swim", "lap_swimming", "open_water_swimming"],
    },
    SportDef {
        name: "Rowing",
        icon: "fa-ship",
        color: "#A23B72",
        category: "Water",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["rowing", "row", "indoor_rowing"],
    },
    SportDef {
        name: "Kayaking",
        icon: "fa-ship",
        color: "#2E86AB",
        category: "Water",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["kayaking", "canoeing", "paddling"],
    },
    SportDef {
        name: "Skiing",
        icon: "fa-skiing",
        color: "#E8F4F8",
        category: "Winter",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["alpine_skiing", "backcountry_skiing", "skiing"],
    },
    SportDef {
        name: "Cross Country Skiing",
        icon: "fa-skiing-nordic",
        color: "#B8860B",
        category: "Winter",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["cross_country_skiing", "nordic_skiing"],
    },
    SportDef {
        name: "Snowboarding",
        icon: "fa-snowboarding",
        color: "#FFD23F",
        category: "Winter",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["snowboarding", "snowboard"],
    },
    SportDef {
        name: "Inline Skating",
        icon: "fa-skating",
        color: "#87CEEB",
        category: "Cardio",
        has_distance: true,
        evaluates_for_awards: true,
        device_names: &["inline_skating", "ice_skating", "skating"],
    },
    SportDef {
        name: "Strength Training",
        icon: "fa-dumbbell",
        color: "#D64545",
        category: "Strength",
        has_distance: false,
        evaluates_for_awards: false,
        device_names: &["training", "strength_training", "weight_training", "fitness_equipment"],
    },
    SportDef {
        name: "Yoga",
        icon: "fa-leaf",
        color: "#7209B7",
        category: "Flexibility",
        has_distance: false,
        evaluates_for_awards: false,
        device_names: &["yoga"],
    },
    SportDef {
        name: "Other",
        icon: "fa-question-circle",
        color: "#9E9E9E",
        category: "Other",
        has_distance: false,
        evaluates_for_awards: false,
        device_names: &["generic", "other", "workout", "multisport"],
    },
];

static DEVICE_NAME_INDEX: Lazy<HashMap<&'static str, &'static SportDef>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for sport in SPORT_CATALOG {
        for device_name in sport.device_names {
            index.insert(*device_name, sport);
        }
    }
    index
});

/// Resolve a device sport string to its catalog entry.
pub fn lookup(device_name: &str) -> Option<&'static SportDef> {
    let normalized = device_name.trim().to_lowercase();
    DEVICE_NAME_INDEX.get(normalized.as_str()).copied()
}

/// URL-friendly identifier: lowercase, spaces to dashes.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '_'], "-")
}

/// Stable lookup key matching FIT's enum spelling: lowercase with
/// underscores.
pub fn mapping_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_fit_spellings() {
        assert_eq!(lookup("running").unwrap().name, "Running");
        assert_eq!(lookup("trail_running").unwrap().name, "Trail Running");
        assert_eq!(lookup("cycling").unwrap().name, "Cycling");
        assert_eq!(lookup("alpine_skiing").unwrap().name, "Skiing");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("Running").unwrap().name, "Running");
        assert_eq!(lookup(" RIDE ").unwrap().name, "Cycling");
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("underwater_basket_weaving").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_slug_and_mapping_name() {
        assert_eq!(slugify("Trail Running"), "trail-running");
        assert_eq!(mapping_name("Trail Running"), "trail_running");
        assert_eq!(slugify("Yoga"), "yoga");
    }

    #[test]
    fn test_catalog_device_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for sport in SPORT_CATALOG {
            for device_name in sport.device_names {
                assert!(seen.insert(*device_name), "duplicate mapping: {device_name}");
            }
        }
    }
}
