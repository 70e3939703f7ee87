//! VPN flavor detection and branding
//!
//! The gateway reports whether it runs OpenVPN or WireGuard. The flavor only
//! selects static presentation data: a display name, a logo and the official
//! client downloads for each platform.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The VPN technology behind the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VpnFlavor {
    #[default]
    #[serde(rename = "OpenVPN")]
    OpenVpn,
    #[serde(rename = "WireGuard")]
    WireGuard,
}

/// Client platform for download links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
}

impl Platform {
    /// Label shown in the navigation bar
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows Client",
            Platform::MacOs => "MacOS Client",
            Platform::Linux => "Linux Client",
            Platform::Android => "Android Client",
            Platform::Ios => "iOS Client",
        }
    }
}

/// A client download link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientLink {
    pub platform: Platform,
    pub url: &'static str,
}

/// Static branding data for a flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branding {
    pub name: &'static str,
    pub logo_url: &'static str,
    pub links: &'static [ClientLink],
}

const OPENVPN_LINKS: &[ClientLink] = &[
    ClientLink {
        platform: Platform::Windows,
        url: "https://openvpn.net/downloads/openvpn-connect-v3-windows.msi",
    },
    ClientLink {
        platform: Platform::MacOs,
        url: "https://openvpn.net/downloads/openvpn-connect-v3-macos.dmg",
    },
    ClientLink {
        platform: Platform::Linux,
        url: "https://openvpn.net/cloud-docs/owner/connectors/connector-user-guides/openvpn-3-client-for-linux.html",
    },
    ClientLink {
        platform: Platform::Android,
        url: "https://play.google.com/store/apps/details?id=net.openvpn.openvpn",
    },
    ClientLink {
        platform: Platform::Ios,
        url: "https://apps.apple.com/us/app/openvpn-connect/id590379981",
    },
];

const WIREGUARD_LINKS: &[ClientLink] = &[
    ClientLink {
        platform: Platform::Windows,
        url: "https://download.wireguard.com/windows-client/wireguard-installer.exe",
    },
    ClientLink {
        platform: Platform::MacOs,
        url: "https://apps.apple.com/us/app/wireguard/id1451685025",
    },
    ClientLink {
        platform: Platform::Linux,
        url: "https://www.wireguard.com/install/",
    },
    ClientLink {
        platform: Platform::Android,
        url: "https://play.google.com/store/apps/details?id=com.wireguard.android",
    },
    ClientLink {
        platform: Platform::Ios,
        url: "https://apps.apple.com/us/app/wireguard/id1441195209",
    },
];

const OPENVPN_BRANDING: Branding = Branding {
    name: "OpenVPN",
    logo_url: "https://i.imgur.com/rvMXsbm.png",
    links: OPENVPN_LINKS,
};

const WIREGUARD_BRANDING: Branding = Branding {
    name: "WireGuard",
    logo_url: "https://www.wireguard.com/img/wireguard.svg",
    links: WIREGUARD_LINKS,
};

impl VpnFlavor {
    /// Branding table for this flavor
    pub fn branding(&self) -> &'static Branding {
        match self {
            VpnFlavor::OpenVpn => &OPENVPN_BRANDING,
            VpnFlavor::WireGuard => &WIREGUARD_BRANDING,
        }
    }

    /// Display name ("OpenVPN" / "WireGuard")
    pub fn name(&self) -> &'static str {
        self.branding().name
    }

    /// File extension of client configs served by the gateway
    pub fn config_extension(&self) -> &'static str {
        match self {
            VpnFlavor::OpenVpn => "ovpn",
            VpnFlavor::WireGuard => "conf",
        }
    }

    /// Download file name for a user's client config
    pub fn config_file_name(&self, user: &str) -> String {
        format!("{}.{}", user, self.config_extension())
    }
}

impl std::fmt::Display for VpnFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VpnFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OpenVPN" => Ok(VpnFlavor::OpenVpn),
            "WireGuard" => Ok(VpnFlavor::WireGuard),
            other => Err(format!("unknown VPN type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let flavor: VpnFlavor = serde_json::from_str("\"WireGuard\"").unwrap();
        assert_eq!(flavor, VpnFlavor::WireGuard);
        assert_eq!(serde_json::to_string(&VpnFlavor::OpenVpn).unwrap(), "\"OpenVPN\"");
        assert!(serde_json::from_str::<VpnFlavor>("\"IPsec\"").is_err());
    }

    #[test]
    fn test_default_is_openvpn() {
        assert_eq!(VpnFlavor::default(), VpnFlavor::OpenVpn);
    }

    #[test]
    fn test_branding_covers_every_platform() {
        for flavor in [VpnFlavor::OpenVpn, VpnFlavor::WireGuard] {
            let branding = flavor.branding();
            assert_eq!(branding.name, flavor.to_string());
            assert_eq!(branding.links.len(), 5);
            assert!(branding.links.iter().all(|l| l.url.starts_with("https://")));
        }
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(VpnFlavor::OpenVpn.config_file_name("alice"), "alice.ovpn");
        assert_eq!(VpnFlavor::WireGuard.config_file_name("bob"), "bob.conf");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("OpenVPN".parse::<VpnFlavor>(), Ok(VpnFlavor::OpenVpn));
        assert!("openvpn".parse::<VpnFlavor>().is_err());
    }
}
