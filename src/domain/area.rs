//! Bidding-zone catalog.
//!
//! The upstream API addresses grid regions by EIC code (`10YAT-APG------L`).
//! Users usually think in country aliases (`AT`), so both are accepted.

/// A known bidding zone / control area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub alias: &'static str,
    pub code: &'static str,
    pub name: &'static str,
}

/// Austria (APG), used when neither the caller nor the configuration names an area.
pub const DEFAULT_AREA_CODE: &str = "10YAT-APG------L";

pub const KNOWN_AREAS: [Area; 13] = [
    Area { alias: "AT", code: "10YAT-APG------L", name: "Austria" },
    Area { alias: "DE", code: "10YDE-VE-------2", name: "Germany" },
    Area { alias: "CZ", code: "10YCZ-CEPS-----N", name: "Czech Republic" },
    Area { alias: "SK", code: "10YSK-SEPS-----K", name: "Slovakia" },
    Area { alias: "HU", code: "10YHU-MAVIR----U", name: "Hungary" },
    Area { alias: "SI", code: "10YSI-ELES-----O", name: "Slovenia" },
    Area { alias: "CH", code: "10YCH-SWISSGRIDZ", name: "Switzerland" },
    Area { alias: "IT", code: "10YIT-GRTN-----B", name: "Italy" },
    Area { alias: "FR", code: "10YFR-RTE------C", name: "France" },
    Area { alias: "NL", code: "10YNL----------L", name: "Netherlands" },
    Area { alias: "BE", code: "10YBE----------2", name: "Belgium" },
    Area { alias: "ES", code: "10YES-REE------0", name: "Spain" },
    Area { alias: "PL", code: "10YPL-AREA-----S", name: "Poland" },
];

/// Look up an area by alias (case-insensitive) or EIC code.
pub fn find_area(input: &str) -> Option<&'static Area> {
    let input = input.trim();
    KNOWN_AREAS
        .iter()
        .find(|a| a.alias.eq_ignore_ascii_case(input) || a.code == input)
}

/// Resolve an alias to its EIC code; unknown inputs pass through trimmed.
pub fn normalize_area_code(input: &str) -> String {
    match find_area(input) {
        Some(area) => area.code.to_string(),
        None => input.trim().to_string(),
    }
}

/// Human label for an area code, falling back to the code itself.
pub fn area_label(code: &str) -> String {
    find_area(code)
        .map(|a| a.name.to_string())
        .unwrap_or_else(|| code.trim().to_string())
}

/// Next/previous known area, for cycling in the TUI.
pub fn cycle_area(code: &str, forward: bool) -> &'static Area {
    let n = KNOWN_AREAS.len();
    let idx = KNOWN_AREAS.iter().position(|a| a.code == code).unwrap_or(0);
    let next = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
    &KNOWN_AREAS[next]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_eic_codes() {
        assert_eq!(normalize_area_code("de"), "10YDE-VE-------2");
        assert_eq!(normalize_area_code(" AT "), "10YAT-APG------L");
        assert_eq!(normalize_area_code("10YCZ-CEPS-----N"), "10YCZ-CEPS-----N");
    }

    #[test]
    fn unknown_areas_pass_through() {
        assert_eq!(normalize_area_code("10Y1001A1001A82H"), "10Y1001A1001A82H");
        assert_eq!(area_label("10Y1001A1001A82H"), "10Y1001A1001A82H");
        assert_eq!(area_label("10YFR-RTE------C"), "France");
    }

    #[test]
    fn cycling_wraps_around() {
        assert_eq!(cycle_area("10YPL-AREA-----S", true).alias, "AT");
        assert_eq!(cycle_area("10YAT-APG------L", false).alias, "PL");
    }
}
