//! Country code and continent lookups.

/// Resolves ISO country codes. Both lookups accept alpha-2 or alpha-3 codes.
pub trait CountryResolver: Send + Sync {
    fn two_letter_code(&self, country_code: &str) -> Option<String>;

    /// Continent code such as "EU", "NA" or "AS"
    fn continent(&self, country_code: &str) -> Option<String>;
}

/// (alpha-3, alpha-2, continent)
const COUNTRIES: &[(&str, &str, &str)] = &[
    // Europe
    ("AUT", "AT", "EU"),
    ("BEL", "BE", "EU"),
    ("BGR", "BG", "EU"),
    ("CHE", "CH", "EU"),
    ("CYP", "CY", "EU"),
    ("CZE", "CZ", "EU"),
    ("DEU", "DE", "EU"),
    ("DNK", "DK", "EU"),
    ("ESP", "ES", "EU"),
    ("EST", "EE", "EU"),
    ("FIN", "FI", "EU"),
    ("FRA", "FR", "EU"),
    ("GBR", "GB", "EU"),
    ("GRC", "GR", "EU"),
    ("HRV", "HR", "EU"),
    ("HUN", "HU", "EU"),
    ("IRL", "IE", "EU"),
    ("ISL", "IS", "EU"),
    ("ITA", "IT", "EU"),
    ("LTU", "LT", "EU"),
    ("LUX", "LU", "EU"),
    ("LVA", "LV", "EU"),
    ("MLT", "MT", "EU"),
    ("NLD", "NL", "EU"),
    ("NOR", "NO", "EU"),
    ("POL", "PL", "EU"),
    ("PRT", "PT", "EU"),
    ("ROU", "RO", "EU"),
    ("SVK", "SK", "EU"),
    ("SVN", "SI", "EU"),
    ("SWE", "SE", "EU"),
    // North America
    ("CAN", "CA", "NA"),
    ("MEX", "MX", "NA"),
    ("USA", "US", "NA"),
    // South America
    ("ARG", "AR", "SA"),
    ("BRA", "BR", "SA"),
    ("CHL", "CL", "SA"),
    // Oceania
    ("AUS", "AU", "OC"),
    ("NZL", "NZ", "OC"),
    // Asia
    ("CHN", "CN", "AS"),
    ("IND", "IN", "AS"),
    ("JPN", "JP", "AS"),
    ("SGP", "SG", "AS"),
    // Africa
    ("ZAF", "ZA", "AF"),
];

/// Table-driven resolver covering the markets Klarna operates in
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCountryResolver;

impl StaticCountryResolver {
    pub fn new() -> Self {
        Self
    }

    fn find(country_code: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
        let code = country_code.trim();
        COUNTRIES.iter().find(|(alpha3, alpha2, _)| {
            code.eq_ignore_ascii_case(alpha3) || code.eq_ignore_ascii_case(alpha2)
        })
    }
}

impl CountryResolver for StaticCountryResolver {
    fn two_letter_code(&self, country_code: &str) -> Option<String> {
        Self::find(country_code).map(|(_, alpha2, _)| (*alpha2).to_string())
    }

    fn continent(&self, country_code: &str) -> Option<String> {
        Self::find(country_code).map(|(_, _, continent)| (*continent).to_string())
    }
}
