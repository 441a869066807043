use crate::enrichment::GeoLabels;
use maxminddb::PathElement;
use std::net::IpAddr;
use std::path::Path;

/// Country/subdivision lookups against a MaxMind city database.
///
/// The database is optional: without one, every lookup yields empty labels
/// and records are still ingested.
pub struct GeoReader {
    reader: Option<maxminddb::Reader<maxminddb::Mmap>>,
    home_country: Option<String>,
}

impl GeoReader {
    pub fn open(city_db: Option<&Path>, home_country: Option<&str>) -> anyhow::Result<Self> {
        // Safety note on the memory-mapped GeoIP file:
        // - File is opened read-only
        // - Lifetime is bound to GeoReader
        // - Webtrail does not mutate the mmdb file
        let reader = match city_db {
            Some(path) => Some(unsafe { maxminddb::Reader::open_mmap(path)? }),
            None => None,
        };

        Ok(Self {
            reader,
            home_country: home_country.map(str::to_owned),
        })
    }

    pub fn locate(&self, ip: &str) -> GeoLabels {
        let Ok(addr) = ip.parse::<IpAddr>() else {
            return GeoLabels::default();
        };

        let Some(lookup) = self.reader.as_ref().and_then(|r| r.lookup(addr).ok()) else {
            return GeoLabels::default();
        };

        let country_code = lookup
            .decode_path::<String>(&[PathElement::Key("country"), PathElement::Key("iso_code")])
            .ok()
            .flatten();

        let country_name = lookup
            .decode_path::<String>(&[
                PathElement::Key("country"),
                PathElement::Key("names"),
                PathElement::Key("en"),
            ])
            .ok()
            .flatten();

        let subdivision = lookup
            .decode_path::<String>(&[
                PathElement::Key("subdivisions"),
                PathElement::Index(0),
                PathElement::Key("names"),
                PathElement::Key("en"),
            ])
            .ok()
            .flatten();

        let domestic = match (&self.home_country, &country_code) {
            (Some(home), Some(code)) if home.eq_ignore_ascii_case(code) => {
                subdivision.unwrap_or_default()
            }
            _ => String::new(),
        };

        GeoLabels {
            domestic,
            global: country_name.unwrap_or_default(),
        }
    }
}
