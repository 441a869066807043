use crate::enrichment::UaLabels;
use woothee::parser::Parser;

const UNKNOWN: &str = "Unknown";

/// Browser/OS/device classification backed by woothee.
pub struct UaClassifier {
    parser: Parser,
}

impl UaClassifier {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn classify(&self, ua: &str) -> UaLabels {
        let Some(result) = self.parser.parse(ua) else {
            return UaLabels {
                browser: UNKNOWN.to_string(),
                os: UNKNOWN.to_string(),
                device: "unknown".to_string(),
            };
        };

        let device = match result.category {
            "pc" => "desktop",
            "smartphone" => "mobile",
            "mobilephone" => "mobile",
            "appliance" => "tablet",
            "crawler" => "bot",
            _ => "unknown",
        };

        UaLabels {
            browser: non_empty_or(result.name, UNKNOWN),
            os: non_empty_or(result.os, UNKNOWN),
            device: device.to_string(),
        }
    }
}

impl Default for UaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() || value == "UNKNOWN" {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
