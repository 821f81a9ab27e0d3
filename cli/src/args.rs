use std::time::Duration;

use clap::Parser;
use ups_address::Address;

/// Validate a postal address against the UPS address validation API.
#[derive(Debug, Parser)]
#[command(name = "ups-validate", version)]
pub struct Args {
    /// API username
    #[arg(long)]
    pub username: String,

    /// API password
    #[arg(long)]
    pub password: String,

    /// Access license number
    #[arg(long)]
    pub access_key: String,

    /// Use the customer integration (sandbox) host
    #[arg(long)]
    pub sandbox: bool,

    /// Log full requests and responses, credentials included
    #[arg(long)]
    pub debug: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Maximum number of candidates to ask for (clamped to 50)
    #[arg(long, default_value_t = 10)]
    pub max_candidates: u32,

    /// Validation mode path segment understood by the service
    #[arg(long, default_value_t = 3)]
    pub request_option: u8,

    #[command(flatten)]
    pub address: AddressArgs,
}

#[derive(Debug, clap::Args)]
pub struct AddressArgs {
    /// Address line; repeat for up to three lines
    #[arg(long = "line", num_args = 1, action = clap::ArgAction::Append)]
    pub lines: Vec<String>,

    #[arg(long, default_value = "")]
    pub city: String,

    /// State or province code
    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub postal_code: String,

    #[arg(long, default_value = "")]
    pub postal_code_extended: String,

    #[arg(long, default_value = "US")]
    pub country: String,
}

impl Args {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl AddressArgs {
    pub fn to_address(&self) -> Address {
        let line = |i: usize| self.lines.get(i).cloned().unwrap_or_default();
        Address {
            address_line1: line(0),
            address_line2: line(1),
            address_line3: line(2),
            city: self.city.clone(),
            state_prov: self.state.clone(),
            postal_code: self.postal_code.clone(),
            postal_code_extended: self.postal_code_extended.clone(),
            country_code: self.country.clone(),
            ..Address::default()
        }
    }
}
