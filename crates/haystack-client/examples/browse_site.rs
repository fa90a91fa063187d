//! Browse a small in-memory site: list its equipment, resolve keys the
//! different ways, and walk a `siteRef` back up.
//!
//! Run with `cargo run --example browse_site` (set `RUST_LOG=debug` to
//! watch the cache population).

use std::collections::BTreeMap;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use haystack_client::{ClientConfig, HaystackSession, Lookup, MemorySession};
use haystack_types::{Ref, TagValue};

fn tags(pairs: &[(&str, TagValue)]) -> BTreeMap<String, TagValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session = MemorySession::new(ClientConfig::from_env());
    session.insert(
        Ref::new("site-hq"),
        tags(&[
            ("site", TagValue::Marker),
            ("dis", TagValue::str("Headquarters")),
            ("area", TagValue::number_with_unit(42000.0, "ft²")),
        ]),
    );
    session.insert(
        Ref::new("ahu-1"),
        tags(&[
            ("equip", TagValue::Marker),
            ("siteRef", TagValue::make_ref("site-hq")),
            ("dis", TagValue::str("AHU 1")),
        ]),
    );
    session.insert(
        Ref::new("boiler-1"),
        tags(&[
            ("equip", TagValue::Marker),
            ("siteRef", TagValue::make_ref("site-hq")),
            ("dis", TagValue::str("Boiler 1")),
        ]),
    );
    session.insert(
        Ref::new("temp-1"),
        tags(&[
            ("point", TagValue::Marker),
            ("equipRef", TagValue::make_ref("ahu-1")),
            ("siteRef", TagValue::make_ref("site-hq")),
            ("dis", TagValue::str("Discharge Temp")),
        ]),
    );

    let site = session
        .get_entity(&Ref::new("site-hq"))
        .await?
        .into_site()?;

    println!("Site {}", site.entity());
    for equip in site.equipments().await? {
        println!("  equip {equip}");
    }

    // Key resolution: tag, equipment id, display name, remote fallback.
    for key in ["area", "ahu-1", "Boiler 1", "point"] {
        match site.lookup(key).await? {
            Lookup::Tag(value) => println!("{key:>10} -> tag {value}"),
            Lookup::Equipment(equip) => println!("{key:>10} -> equip {equip}"),
            Lookup::Matches(rows) => println!("{key:>10} -> {} remote match(es)", rows.len()),
        }
    }

    // And back up the reference: point -> equip -> site.
    let point = session.get_entity(&Ref::new("temp-1")).await?;
    println!("{} belongs to {}", point, point.get_site().await?);

    Ok(())
}
