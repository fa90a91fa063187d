//! Browsing a site's equipment through the convenience layer, end to end
//! over the in-memory session.

use std::collections::BTreeMap;
use std::sync::Arc;

use haystack_client::{
    ClientConfig, Error, HaystackSession, Lookup, MemorySession, Resolved, Site,
};
use haystack_types::{Ref, TagValue};

fn tags(pairs: &[(&str, TagValue)]) -> BTreeMap<String, TagValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// One site, two AHUs, one point under the first AHU.
fn demo_session() -> Arc<MemorySession> {
    let session = MemorySession::new(ClientConfig::default());
    session.insert(
        Ref::new("site-1"),
        tags(&[
            ("site", TagValue::Marker),
            ("dis", TagValue::str("HQ")),
            ("tz", TagValue::str("Montreal")),
        ]),
    );
    session.insert(
        Ref::new("ahu-1"),
        tags(&[
            ("equip", TagValue::Marker),
            ("siteRef", TagValue::make_ref("site-1")),
            ("dis", TagValue::str("AHU 1")),
            ("navName", TagValue::str("Ahu1")),
        ]),
    );
    session.insert(
        Ref::new("ahu-2"),
        tags(&[
            ("equip", TagValue::Marker),
            ("siteRef", TagValue::make_ref("site-1")),
            ("dis", TagValue::str("AHU 2")),
        ]),
    );
    session.insert(
        Ref::new("temp-1"),
        tags(&[
            ("point", TagValue::Marker),
            ("equipRef", TagValue::make_ref("ahu-1")),
            ("siteRef", TagValue::make_ref("site-1")),
            ("dis", TagValue::str("Discharge Temp")),
        ]),
    );
    session
}

async fn demo_site(session: &Arc<MemorySession>) -> Site {
    session
        .get_entity(&Ref::new("site-1"))
        .await
        .unwrap()
        .into_site()
        .unwrap()
}

#[tokio::test]
async fn resolves_equipment_by_id_in_any_access_order() {
    for keys in [["ahu-1", "ahu-2"], ["ahu-2", "ahu-1"]] {
        let session = demo_session();
        let site = demo_site(&session).await;
        for key in keys {
            match site.resolve(key).await.unwrap() {
                Resolved::Equipment(equip) => assert_eq!(equip.id().id, key),
                other => panic!("expected equipment for {key}, got {other:?}"),
            }
        }
    }

    // The @ sigil is ignored on the key.
    let session = demo_session();
    let site = demo_site(&session).await;
    match site.resolve("@ahu-2").await.unwrap() {
        Resolved::Equipment(equip) => assert_eq!(equip.id().id, "ahu-2"),
        other => panic!("expected equipment, got {other:?}"),
    }
}

#[tokio::test]
async fn resolves_equipment_by_display_name() {
    let session = demo_session();
    let site = demo_site(&session).await;

    match site.resolve("AHU 1").await.unwrap() {
        Resolved::Equipment(equip) => assert_eq!(equip.id().id, "ahu-1"),
        other => panic!("expected equipment, got {other:?}"),
    }
    // navName works too.
    match site.resolve("Ahu1").await.unwrap() {
        Resolved::Equipment(equip) => assert_eq!(equip.id().id, "ahu-1"),
        other => panic!("expected equipment, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_display_names_resolve_to_first_in_cache_order() {
    let session = demo_session();
    session.insert(
        Ref::new("ahu-3"),
        tags(&[
            ("equip", TagValue::Marker),
            ("siteRef", TagValue::make_ref("site-1")),
            ("dis", TagValue::str("AHU 2")),
        ]),
    );
    let site = demo_site(&session).await;

    // ahu-2 was inserted before ahu-3; first match wins silently.
    match site.resolve("AHU 2").await.unwrap() {
        Resolved::Equipment(equip) => assert_eq!(equip.id().id, "ahu-2"),
        other => panic!("expected equipment, got {other:?}"),
    }
}

#[tokio::test]
async fn tag_match_takes_priority_over_equipment_match() {
    let session = demo_session();
    let site = demo_site(&session).await;

    match site.resolve("tz").await.unwrap() {
        Resolved::Tag(TagValue::Str(s)) => assert_eq!(s, "Montreal"),
        other => panic!("expected tag value, got {other:?}"),
    }
    // A marker tag on the site itself is still a tag match.
    assert_eq!(
        site.resolve("site").await.unwrap(),
        Resolved::Tag(TagValue::Marker)
    );
}

#[tokio::test]
async fn equipments_is_memoized_and_refresh_rebuilds() {
    let session = demo_session();
    let site = demo_site(&session).await;
    let equip_query = "(siteRef==@site-1) and (equip)";
    let equip_queries =
        |s: &MemorySession| s.queries().iter().filter(|q| *q == equip_query).count();

    let first = site.equipments().await.unwrap();
    let second = site.equipments().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(equip_queries(&session), 1);

    // Refresh issues exactly one new query and drops the stale row.
    session.remove("ahu-2");
    site.refresh().await.unwrap();
    assert_eq!(equip_queries(&session), 2);

    let after = site.equipments().await.unwrap();
    assert_eq!(equip_queries(&session), 2);
    let ids: Vec<_> = after.iter().map(|e| e.id().id.clone()).collect();
    assert_eq!(ids, ["ahu-1"]);
}

#[tokio::test]
async fn invalidate_defers_the_reload_to_next_access() {
    let session = demo_session();
    let site = demo_site(&session).await;
    let equip_query = "(siteRef==@site-1) and (equip)";
    let equip_queries =
        |s: &MemorySession| s.queries().iter().filter(|q| *q == equip_query).count();

    site.equipments().await.unwrap();
    site.invalidate();
    assert_eq!(equip_queries(&session), 1);

    site.equipments().await.unwrap();
    assert_eq!(equip_queries(&session), 2);
}

#[tokio::test]
async fn scoped_filters_are_built_exactly() {
    let session = demo_session();
    let site = demo_site(&session).await;

    let rows = site.find_entities(None, None).await.unwrap();
    assert_eq!(rows.len(), 3); // both AHUs and the point carry siteRef

    // The caller's filter is conjoined verbatim; the in-memory session
    // rejects the comparison, but the query it was handed is exact.
    let result = site.find_entities(Some("power > 10"), None).await;
    assert!(matches!(result, Err(Error::Filter(_))));

    assert_eq!(
        session.queries(),
        [
            "siteRef==@site-1",
            "(siteRef==@site-1) and (power > 10)",
        ]
    );
}

#[tokio::test]
async fn lookup_falls_back_to_a_scoped_remote_query() {
    let session = demo_session();
    let site = demo_site(&session).await;

    match site.lookup("point").await.unwrap() {
        Lookup::Matches(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id().id, "temp-1");
        }
        other => panic!("expected remote matches, got {other:?}"),
    }

    // A key that is not a well-formed filter fails however the session
    // fails, not with a local not-found.
    assert!(matches!(
        site.lookup("No Such Equip").await,
        Err(Error::Filter(_))
    ));
}

#[tokio::test]
async fn get_site_resolves_by_id_equality() {
    let session = demo_session();

    let equip = session.get_entity(&Ref::new("ahu-1")).await.unwrap();
    let site = equip.get_site().await.unwrap();
    assert_eq!(site.id().id, "site-1");
    assert!(site.has_marker("site"));

    // Missing siteRef is a local error, not a query.
    let orphan = {
        session.insert(Ref::new("lone-1"), tags(&[("equip", TagValue::Marker)]));
        session.get_entity(&Ref::new("lone-1")).await.unwrap()
    };
    assert!(matches!(
        orphan.get_site().await,
        Err(Error::MissingTag { tag, .. }) if tag == "siteRef"
    ));
}

#[tokio::test]
async fn empty_site_iterates_zero_equipment() {
    let session = MemorySession::new(ClientConfig::default());
    session.insert(Ref::new("site-9"), tags(&[("site", TagValue::Marker)]));
    let site = session
        .get_entity(&Ref::new("site-9"))
        .await
        .unwrap()
        .into_site()
        .unwrap();

    let equips = site.equipments().await.unwrap();
    assert!(equips.is_empty());
    assert_eq!(site.resolve("anything").await.unwrap(), Resolved::NotFound);
}

#[tokio::test]
async fn equipment_points_browse_one_level_down() {
    let session = demo_session();

    let ahu = session
        .get_entity(&Ref::new("ahu-1"))
        .await
        .unwrap()
        .into_equip()
        .unwrap();

    let points = ahu.points().await.unwrap();
    let ids: Vec<_> = points.iter().map(|e| e.id().id.clone()).collect();
    assert_eq!(ids, ["temp-1"]);
    assert!(
        session
            .queries()
            .contains(&"(equipRef==@ahu-1) and (point)".to_string())
    );

    let site = ahu.get_site().await.unwrap();
    assert_eq!(site.id().id, "site-1");
}

#[tokio::test]
async fn marker_checks_gate_the_conversions() {
    let session = demo_session();

    let point = session.get_entity(&Ref::new("temp-1")).await.unwrap();
    assert!(matches!(
        point.clone().into_site(),
        Err(Error::MissingTag { tag, .. }) if tag == "site"
    ));
    assert!(matches!(
        point.into_equip(),
        Err(Error::MissingTag { tag, .. }) if tag == "equip"
    ));
}
