use crate::{constants::PII_RESTRICTED_CONTINENT, geo::CountryResolver};

/// Customer data may not be sent for purchases in European countries.
/// Countries the resolver does not know are allowed.
pub fn can_send_personal_information(countries: &dyn CountryResolver, country_code: &str) -> bool {
    match countries.continent(country_code) {
        Some(continent) => !continent.eq_ignore_ascii_case(PII_RESTRICTED_CONTINENT),
        None => true,
    }
}
