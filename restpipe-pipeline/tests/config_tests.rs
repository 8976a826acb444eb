use pretty_assertions::assert_eq;
use restpipe_http::Url;
use restpipe_pipeline::{DEFAULT_TIMEOUT_MS, PipeConfig, PipeType, ReadFilter, simple_type_name};
use restpipe_types::IdentityPart;
use serde_json::json;
use std::time::Duration;

struct Widget;
#[allow(dead_code)]
struct Envelope<T>(T);

fn base() -> Url {
    Url::parse("http://example.org/").unwrap()
}

// ── Naming ──────────────────────────────────────────────────────

#[test]
fn simple_type_name_strips_path_and_generics() {
    assert_eq!(simple_type_name::<Widget>(), "widget");
    assert_eq!(simple_type_name::<Envelope<Widget>>(), "envelope");
    assert_eq!(simple_type_name::<String>(), "string");
}

#[test]
fn for_type_defaults_name_and_endpoint() {
    let config = PipeConfig::for_type::<Widget>(base());
    assert_eq!(config.name, "widget");
    assert_eq!(config.endpoint, "widget");
    assert_eq!(config.pipe_type, PipeType::Rest);
    assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
}

#[test]
fn name_and_endpoint_can_diverge() {
    let mut config = PipeConfig::new(base(), "widgets");
    config.endpoint = "v2/widgets".to_string();
    config.name = "gadgets".to_string();
    assert_eq!(config.resource_url().unwrap().as_str(), "http://example.org/v2/widgets");
    assert_eq!(config.name, "gadgets");
}

#[test]
fn base_url_is_mutable() {
    let mut config = PipeConfig::new(base(), "widgets");
    config.base_url = Url::parse("https://other.example.org/api/").unwrap();
    assert_eq!(
        config.resource_url().unwrap().as_str(),
        "https://other.example.org/api/widgets"
    );
}

#[test]
fn timeout_round_trips_through_duration() {
    let config = PipeConfig::new(base(), "widgets").with_timeout(Duration::from_secs(3));
    assert_eq!(config.timeout_ms, 3000);
    assert_eq!(config.timeout(), Duration::from_secs(3));
}

#[test]
fn config_from_json_fills_defaults() {
    let config: PipeConfig = serde_json::from_value(json!({
        "base_url": "http://example.org/",
        "name": "widgets",
        "endpoint": "widgets"
    }))
    .unwrap();
    assert_eq!(config.pipe_type, PipeType::Rest);
    assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
}

#[test]
fn pipe_type_display() {
    assert_eq!(PipeType::Rest.to_string(), "REST");
    assert_eq!(serde_json::to_string(&PipeType::Rest).unwrap(), r#""rest""#);
}

// ── ReadFilter ──────────────────────────────────────────────────

#[test]
fn empty_filter_adds_no_query() {
    let mut url = Url::parse("http://example.org/widgets").unwrap();
    ReadFilter::new().apply_to(&mut url);
    assert_eq!(url.as_str(), "http://example.org/widgets");
}

#[test]
fn filter_query_order_is_stable() {
    let filter = ReadFilter::new()
        .where_eq("zeta", true)
        .where_eq("alpha", "x y")
        .offset(4)
        .limit(2);
    assert_eq!(
        filter.query_pairs(),
        vec![
            ("limit".to_string(), "2".to_string()),
            ("offset".to_string(), "4".to_string()),
            ("alpha".to_string(), "x y".to_string()),
            ("zeta".to_string(), "true".to_string()),
        ]
    );

    let mut url = Url::parse("http://example.org/widgets").unwrap();
    filter.apply_to(&mut url);
    assert_eq!(
        url.as_str(),
        "http://example.org/widgets?limit=2&offset=4&alpha=x+y&zeta=true"
    );
}

#[test]
fn filter_identity_is_structural() {
    let a = ReadFilter::new().limit(1).where_eq("k", json!([1, 2]));
    let b = ReadFilter::new().limit(1).where_eq("k", json!([1, 2]));
    let c = ReadFilter::new().limit(1).where_eq("k", json!([2, 1]));
    assert_eq!(IdentityPart::from(&a), IdentityPart::from(&b));
    assert_ne!(IdentityPart::from(&a), IdentityPart::from(&c));
}

#[test]
fn filter_serializes_where_key() {
    let filter = ReadFilter::new().where_eq("color", "red");
    let value = serde_json::to_value(&filter).unwrap();
    assert_eq!(value, json!({"where": {"color": "red"}}));
}
