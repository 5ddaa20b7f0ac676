// src/models/geo.rs

/// Static continent to country reference data.
pub const COUNTRIES_BY_CONTINENT: &[(&str, &[&str])] = &[
    (
        "Europe",
        &[
            "France",
            "Germany",
            "Spain",
            "Italy",
            "United Kingdom",
            "Netherlands",
            "Poland",
        ],
    ),
    ("North America", &["United States", "Canada", "Mexico"]),
    ("Asia", &["China", "Japan", "India", "South Korea", "Thailand"]),
    ("Africa", &["Nigeria", "South Africa", "Egypt", "Kenya"]),
    ("South America", &["Brazil", "Argentina", "Chile", "Peru"]),
    ("Oceania", &["Australia", "New Zealand", "Fiji"]),
];

pub fn continents() -> Vec<&'static str> {
    COUNTRIES_BY_CONTINENT.iter().map(|(c, _)| *c).collect()
}

/// Countries of `continent`, or every country when the continent is unknown or absent.
pub fn countries(continent: Option<&str>) -> Vec<&'static str> {
    let matched = continent.and_then(|name| {
        COUNTRIES_BY_CONTINENT
            .iter()
            .find(|(c, _)| *c == name)
            .map(|(_, countries)| countries.to_vec())
    });

    matched.unwrap_or_else(|| {
        COUNTRIES_BY_CONTINENT
            .iter()
            .flat_map(|(_, countries)| countries.iter().copied())
            .collect()
    })
}

pub fn is_continent(name: &str) -> bool {
    COUNTRIES_BY_CONTINENT.iter().any(|(c, _)| *c == name)
}

pub fn continent_of(country: &str) -> Option<&'static str> {
    COUNTRIES_BY_CONTINENT
        .iter()
        .find(|(_, countries)| countries.contains(&country))
        .map(|(c, _)| *c)
}
