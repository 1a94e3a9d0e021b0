// Region table for the Blueair AWS cloud.
//
// The cloud is deployed per sales region: each region pairs a Gigya
// identity-provider tenant with an AWS execute-api gateway. The table is
// closed -- an unrecognized region string is a configuration error raised
// before any network call.

use std::str::FromStr;

use url::Url;

use crate::error::Error;

/// A Blueair cloud region.
///
/// Determines the Gigya tenant, the gateway hostname, and the API key used
/// for the account-login leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Americas deployment (`us1` Gigya tenant, `us-east-2` gateway).
    Us,
    /// Europe deployment (`eu1` Gigya tenant, `eu-west-1` gateway).
    Eu,
}

impl Region {
    /// The Gigya identity-provider region code.
    pub fn identity_region(&self) -> &'static str {
        match self {
            Self::Us => "us1",
            Self::Eu => "eu1",
        }
    }

    /// The AWS API-gateway REST API id.
    pub fn gateway_id(&self) -> &'static str {
        match self {
            Self::Us => "on1keymlmh",
            Self::Eu => "hkgmr8v960",
        }
    }

    /// The AWS region hosting the gateway.
    pub fn gateway_region(&self) -> &'static str {
        match self {
            Self::Us => "us-east-2",
            Self::Eu => "eu-west-1",
        }
    }

    /// The Gigya API key for the account-login leg.
    pub fn api_key(&self) -> &'static str {
        match self {
            Self::Us => {
                "3_-xUbbrIY8QCbHDWQs1tLXE-CZBQ50SGElcOY5hF1euE11wCoIlNbjMGAFQ6UwhMY"
            }
            Self::Eu => {
                "3_qRseYzrUJl1VyxvSJANalu_kNgQ83swB1B9uzgms58--5w1ClVNmrFdsDnWVQQCl"
            }
        }
    }

    /// Resolve this region into concrete endpoint URLs.
    pub fn endpoints(&self) -> RegionEndpoints {
        let accounts = format!("https://accounts.{}.gigya.com", self.identity_region());
        let gateway = format!(
            "https://{}.execute-api.{}.amazonaws.com",
            self.gateway_id(),
            self.gateway_region()
        );

        RegionEndpoints {
            // Static hostnames assembled from static parts; cannot fail.
            accounts_url: Url::parse(&accounts).expect("static accounts URL"),
            gateway_url: Url::parse(&gateway).expect("static gateway URL"),
            api_key: self.api_key().to_owned(),
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(Error::UnknownRegion(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Us => f.write_str("us"),
            Self::Eu => f.write_str("eu"),
        }
    }
}

/// Resolved endpoints for one region.
///
/// Normally produced by [`Region::endpoints`]; tests construct it directly
/// to point both hosts at a mock server.
#[derive(Debug, Clone)]
pub struct RegionEndpoints {
    /// Gigya accounts base URL (legs 1 and 2 of the identity exchange).
    pub accounts_url: Url,
    /// Execute-api gateway base URL (leg 3 and all device endpoints).
    pub gateway_url: Url,
    /// Gigya API key sent with the account-login form.
    pub api_key: String,
}
