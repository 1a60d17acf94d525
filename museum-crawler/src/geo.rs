//! Country inference from listing page titles.

/// Reference list of country names. Matching is case-insensitive and returns
/// the spelling used here.
pub const COUNTRIES: &[&str] = &[
    "Afghanistan", "Albania", "Algeria", "Andorra", "Angola", "Antigua and Barbuda", "Argentina",
    "Armenia", "Australia", "Austria", "Azerbaijan",
    "Bahamas", "Bahrain", "Bangladesh", "Barbados", "Belarus", "Belgium", "Belize", "Benin",
    "Bhutan", "Bolivia", "Bosnia and Herzegovina", "Botswana", "Brazil", "Brunei", "Bulgaria",
    "Burkina Faso", "Burundi",
    "Cambodia", "Cameroon", "Canada", "Cape Verde", "Central African Republic", "Chad", "Chile",
    "China", "Colombia", "Comoros", "Costa Rica", "Croatia", "Cuba", "Cyprus", "Czech Republic",
    "Democratic Republic of the Congo", "Republic of the Congo",
    "Denmark", "Djibouti", "Dominica", "Dominican Republic",
    "East Timor", "Ecuador", "Egypt", "El Salvador", "Equatorial Guinea", "Eritrea", "Estonia",
    "Eswatini", "Ethiopia",
    "Fiji", "Finland", "France",
    "Gabon", "Gambia", "Georgia", "Germany", "Ghana", "Greece", "Grenada", "Guatemala", "Guinea",
    "Guinea-Bissau", "Guyana",
    "Haiti", "Honduras", "Hungary",
    "Iceland", "India", "Indonesia", "Iran", "Iraq", "Ireland", "Israel", "Italy", "Ivory Coast",
    "Jamaica", "Japan", "Jordan",
    "Kazakhstan", "Kenya", "Kiribati", "North Korea", "South Korea", "Kosovo", "Kuwait",
    "Kyrgyzstan",
    "Laos", "Latvia", "Lebanon", "Lesotho", "Liberia", "Libya", "Liechtenstein", "Lithuania",
    "Luxembourg",
    "Madagascar", "Malawi", "Malaysia", "Maldives", "Mali", "Malta", "Marshall Islands",
    "Mauritania", "Mauritius", "Mexico", "Micronesia", "Moldova", "Monaco", "Mongolia",
    "Montenegro", "Morocco", "Mozambique", "Myanmar",
    "Namibia", "Nauru", "Nepal", "Netherlands", "New Zealand", "Nicaragua", "Niger", "Nigeria",
    "North Macedonia", "Norway",
    "Oman",
    "Pakistan", "Palau", "Palestine", "Panama", "Papua New Guinea", "Paraguay", "Peru",
    "Philippines", "Poland", "Portugal",
    "Qatar",
    "Romania", "Russia", "Rwanda",
    "Saint Kitts and Nevis", "Saint Lucia", "Saint Vincent and the Grenadines", "Samoa",
    "San Marino", "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Serbia", "Seychelles",
    "Sierra Leone", "Singapore", "Slovakia", "Slovenia", "Solomon Islands", "Somalia",
    "South Africa", "South Sudan", "Spain", "Sri Lanka", "Sudan", "Suriname", "Sweden",
    "Switzerland", "Syria",
    "Taiwan", "Tajikistan", "Tanzania", "Thailand", "Togo", "Tonga", "Trinidad and Tobago",
    "Tunisia", "Turkey", "Turkmenistan", "Tuvalu", "the Federated States of Micronesia",
    "Uganda", "Ukraine", "United Arab Emirates", "United Kingdom", "United States", "Uruguay",
    "Uzbekistan",
    "Vanuatu", "Vatican City", "Venezuela", "Vietnam",
    "Yemen",
    "Zambia", "Zimbabwe",
];

/// Prepositions introducing the place in a title, in priority order.
const PREPOSITIONS: &[&str] = &[" in ", " at "];

/// Coarse classification of a place name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    Country,
    City,
}

fn canonical_country(place: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .copied()
        .find(|country| country.eq_ignore_ascii_case(place))
}

/// Returns `true` if `place` names a country of the reference list.
pub fn is_country(place: &str) -> bool {
    canonical_country(place).is_some()
}

/// Classify a place: a known country, otherwise assumed to be a city.
pub fn identify_place(place: &str) -> PlaceKind {
    if is_country(place) {
        PlaceKind::Country
    } else {
        PlaceKind::City
    }
}

/// Infer the country a listing page is about from its title.
///
/// The text after the last ` in ` (or, failing that, the last ` at `) is the
/// candidate. A known country is returned in its canonical spelling, anything
/// else verbatim after trimming. Titles without either preposition yield an
/// empty string.
pub fn extract_country(title: &str) -> String {
    let title = title.trim();
    // ASCII lowering keeps byte offsets aligned with `title`.
    let lowered = title.to_ascii_lowercase();

    let candidate = PREPOSITIONS.iter().find_map(|prep| {
        lowered
            .rfind(prep)
            .map(|idx| title[idx + prep.len()..].trim())
    });

    match candidate {
        None | Some("") => String::new(),
        Some(candidate) => canonical_country(candidate)
            .unwrap_or(candidate)
            .to_string(),
    }
}
