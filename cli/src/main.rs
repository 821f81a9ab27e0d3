mod args;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use ups_address::AddressClient;

use crate::args::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut client = AddressClient::new(&args.username, &args.password, &args.access_key);
    client.set_debug(args.debug);
    client.set_sandbox(args.sandbox);
    client.set_timeout(args.timeout());
    client.set_maximum_candidate_size(args.max_candidates);
    client.set_request_option(args.request_option);

    if args.debug {
        log::warn!("debug mode logs credentials; do not use it in production");
    }

    let address = args.address.to_address();
    let outcome = client
        .validate_address(&address)
        .context("address validation failed")?;

    let report = json!({
        "Address": outcome.address(),
        "Response": outcome.response(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
