//! Static country alias table.
//!
//! Model output and boundary datasets disagree on country names ("USA" vs
//! "United States of America", "Ivory Coast" vs "Côte d'Ivoire"). Every name
//! is uppercased first and then looked up here exactly once; the table is
//! never chained, so `USA -> UNITED STATES` and `UNITED STATES -> USA` can
//! both live in it.

use std::collections::HashMap;
use std::sync::LazyLock;

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("UNITED STATES", "USA"),
    ("UNITED STATES OF AMERICA", "USA"),
    ("UNITED KINGDOM", "UK"),
    ("GREAT BRITAIN", "UK"),
    ("RUSSIA", "RUSSIAN FEDERATION"),
    ("SOUTH KOREA", "KOREA, REPUBLIC OF"),
    ("NORTH KOREA", "KOREA, DEMOCRATIC PEOPLE'S REPUBLIC OF"),
    ("UAE", "UNITED ARAB EMIRATES"),
    ("USA", "UNITED STATES"),
    ("UK", "UNITED KINGDOM"),
    ("IVORY COAST", "CÔTE D'IVOIRE"),
    ("COTE D'IVOIRE", "CÔTE D'IVOIRE"),
    ("MYANMAR", "BURMA"),
    ("ESWATINI", "SWAZILAND"),
    ("CZECHIA", "CZECH REPUBLIC"),
    (
        "DEMOCRATIC REPUBLIC OF THE CONGO",
        "CONGO, THE DEMOCRATIC REPUBLIC OF THE",
    ),
    ("REPUBLIC OF THE CONGO", "CONGO"),
    ("DR CONGO", "CONGO, THE DEMOCRATIC REPUBLIC OF THE"),
    ("CONGO-BRAZZAVILLE", "CONGO"),
    ("CONGO-KINSHASA", "CONGO, THE DEMOCRATIC REPUBLIC OF THE"),
    ("EAST TIMOR", "TIMOR-LESTE"),
    ("VATICAN CITY", "HOLY SEE (VATICAN CITY STATE)"),
    ("PALESTINE", "PALESTINIAN TERRITORY, OCCUPIED"),
    ("TAIWAN", "TAIWAN, PROVINCE OF CHINA"),
    (
        "NORTH MACEDONIA",
        "MACEDONIA, THE FORMER YUGOSLAV REPUBLIC OF",
    ),
    ("MACEDONIA", "MACEDONIA, THE FORMER YUGOSLAV REPUBLIC OF"),
];

static ALIASES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| COUNTRY_ALIASES.iter().copied().collect());

/// Uppercased form of `name`, the key space every lookup works in.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Canonical key for `name`: the alias target when one exists, otherwise
/// the uppercased input.
///
/// One hop only, so `resolve("USA")` is `"UNITED STATES"`, not the
/// dataset's `"USA"`. Map matching goes through
/// [`CountryIndex::lookup`](crate::CountryIndex::lookup), which tries the
/// direct key before the alias; `resolve` alone does not match features.
///
/// ```
/// use worldthink_geo::aliases::resolve;
///
/// assert_eq!(resolve("United States of America"), "USA");
/// assert_eq!(resolve("Atlantis"), "ATLANTIS");
/// ```
pub fn resolve(name: &str) -> String {
    let key = normalize_key(name);
    match ALIASES.get(key.as_str()) {
        Some(alias) => (*alias).to_string(),
        None => key,
    }
}

/// Alias target for an already-uppercased key, if the table has one.
pub fn alias_of(key: &str) -> Option<&'static str> {
    ALIASES.get(key).copied()
}
