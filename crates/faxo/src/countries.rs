//! Static country catalog for fax number assignment and display.

/// A country supported for fax numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    pub name: &'static str,
    /// International dialing prefix, with leading plus.
    pub dial_code: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country {
        code: "US",
        name: "United States",
        dial_code: "+1",
    },
    Country {
        code: "CA",
        name: "Canada",
        dial_code: "+1",
    },
    Country {
        code: "GB",
        name: "United Kingdom",
        dial_code: "+44",
    },
    Country {
        code: "AU",
        name: "Australia",
        dial_code: "+61",
    },
    Country {
        code: "DE",
        name: "Germany",
        dial_code: "+49",
    },
    Country {
        code: "FR",
        name: "France",
        dial_code: "+33",
    },
    Country {
        code: "JP",
        name: "Japan",
        dial_code: "+81",
    },
    Country {
        code: "IN",
        name: "India",
        dial_code: "+91",
    },
    Country {
        code: "BR",
        name: "Brazil",
        dial_code: "+55",
    },
    Country {
        code: "CN",
        name: "China",
        dial_code: "+86",
    },
];

/// Looks up a country by its alpha-2 code, case-insensitively.
pub fn find(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Formats a local number with the country dial code. Numbers already in
/// international form and unknown countries pass through unchanged.
pub fn format_number(code: &str, number: &str) -> String {
    if number.starts_with('+') {
        return number.to_string();
    }
    match find(code) {
        Some(country) => format!("{} {}", country.dial_code, number),
        None => number.to_string(),
    }
}
