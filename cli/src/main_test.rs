use super::*;

fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn parse_criteria_keeps_scalar_types() {
    let criteria = parse_criteria(&strings(&["andar=3", "ativo=true", "status=aberta"])).unwrap();
    assert_eq!(criteria["andar"], json!(3));
    assert_eq!(criteria["ativo"], json!(true));
    assert_eq!(criteria["status"], json!("aberta"));
}

#[test]
fn parse_criteria_empty_value_is_empty_string() {
    let criteria = parse_criteria(&strings(&["bloco="])).unwrap();
    assert_eq!(criteria["bloco"], json!(""));
}

#[test]
fn parse_criteria_keeps_json_objects_as_text() {
    let criteria = parse_criteria(&strings(&["meta={\"a\":1}"])).unwrap();
    assert_eq!(criteria["meta"], json!("{\"a\":1}"));
}

#[test]
fn parse_criteria_splits_on_first_equals() {
    let criteria = parse_criteria(&strings(&["obs=a=b"])).unwrap();
    assert_eq!(criteria["obs"], json!("a=b"));
}

#[test]
fn parse_criteria_rejects_missing_equals_or_key() {
    assert!(matches!(
        parse_criteria(&strings(&["status"])),
        Err(CliError::InvalidCriterion(_))
    ));
    assert!(matches!(
        parse_criteria(&strings(&["=x"])),
        Err(CliError::InvalidCriterion(_))
    ));
}

#[test]
fn render_auth_state_labels_trust_level() {
    let rendered = render_auth_state(&AuthState::Anonymous).unwrap();
    assert_eq!(rendered["trust"], "anonymous");
    assert!(rendered["user"].is_null());
}

#[test]
fn cli_parses_entity_filter() {
    let cli = Cli::try_parse_from([
        "fitout-cli",
        "entity",
        "unidades",
        "filter",
        "--where",
        "bloco=A",
        "--where",
        "andar=2",
        "--order",
        "numero",
    ])
    .unwrap();
    let Command::Entity(entity) = cli.command else {
        panic!("expected entity command");
    };
    assert_eq!(entity.resource, "unidades");
    let EntitySubcommand::Filter { criteria, order } = entity.command else {
        panic!("expected filter");
    };
    assert_eq!(criteria, vec!["bloco=A", "andar=2"]);
    assert_eq!(order.as_deref(), Some("numero"));
}

#[test]
fn cli_api_url_flag_is_optional() {
    let cli = Cli::try_parse_from(["fitout-cli", "--api-url", "http://h:1", "url", "/api/x"]).unwrap();
    assert_eq!(cli.api_url.as_deref(), Some("http://h:1"));
}

#[test]
fn parse_payload_accepts_json_objects() {
    assert_eq!(parse_payload(r#"{"nome": "Torre A"}"#).unwrap(), json!({"nome": "Torre A"}));
}

#[test]
fn malformed_payload_reports_input_error() {
    let err = parse_payload("{nome").unwrap_err();
    assert!(matches!(err, CliError::InvalidJson(_)));
    assert!(err.to_string().starts_with("invalid JSON payload"));
}

#[test]
fn serialization_errors_report_output_failure() {
    let source = serde_json::from_str::<Value>("{").unwrap_err();
    let err = CliError::from(source);
    assert!(matches!(err, CliError::Output(_)));
    assert!(err.to_string().starts_with("failed to render output"));
}
