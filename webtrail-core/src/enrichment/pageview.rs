use ipnet::IpNet;
use std::net::IpAddr;

/// Extensions that never count toward visit analytics.
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "map", "json", "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif",
    "woff", "woff2", "ttf", "otf", "eot", "txt", "xml",
];

/// Decides whether a request counts as a pageview: successful HTML-ish
/// responses from addresses outside the excluded networks.
pub struct PageviewPolicy {
    exclude_networks: Vec<IpNet>,
}

impl PageviewPolicy {
    pub fn new(networks: &[String]) -> Result<Self, ipnet::AddrParseError> {
        let exclude_networks = networks
            .iter()
            .map(|s| s.parse::<IpNet>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exclude_networks })
    }

    pub fn is_pageview(&self, status: u16, path: &str, ip: &str) -> bool {
        if status != 200 {
            return false;
        }

        let path = path.split('?').next().unwrap_or(path);
        if let Some((_, ext)) = path.rsplit_once('.') {
            let ext = ext.to_ascii_lowercase();
            if STATIC_ASSET_EXTENSIONS.contains(&ext.as_str()) {
                return false;
            }
        }

        if let Ok(addr) = ip.parse::<IpAddr>() {
            if self.exclude_networks.iter().any(|net| net.contains(&addr)) {
                return false;
            }
        }

        true
    }
}
