/// A selectable city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub name: &'static str,
    pub country: &'static str,
    pub icon: &'static str,
}

/// Cities offered for selection.
pub const CITIES: &[City] = &[
    City { name: "New York", country: "USA", icon: "🗽" },
    City { name: "London", country: "UK", icon: "🇬🇧" },
    City { name: "Tokyo", country: "Japan", icon: "🗼" },
    City { name: "Paris", country: "France", icon: "🗼" },
    City { name: "Dubai", country: "UAE", icon: "🏙️" },
    City { name: "Singapore", country: "Singapore", icon: "🦁" },
    City { name: "Mumbai", country: "India", icon: "🇮🇳" },
    City { name: "Sydney", country: "Australia", icon: "🦘" },
    City { name: "Berlin", country: "Germany", icon: "🇩🇪" },
    City { name: "Toronto", country: "Canada", icon: "🍁" },
    City { name: "Barcelona", country: "Spain", icon: "🇪🇸" },
    City { name: "Seoul", country: "South Korea", icon: "🇰🇷" },
];

/// Look up a catalog city by name, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Option<&'static City> {
    let name = name.trim();
    CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("new york").map(|c| c.name), Some("New York"));
        assert_eq!(find("  SEOUL ").map(|c| c.country), Some("South Korea"));
        assert!(find("Atlantis").is_none());
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = CITIES.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CITIES.len());
    }
}
