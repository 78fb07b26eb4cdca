use super::*;

#[test]
fn test_fixed_run_id_is_deterministic() {
    let uuid = Uuid::parse_str("0b5c3a2e-9d41-4f7e-8a60-1c2d3e4f5a6b").unwrap();
    let run_id = RunId::from(uuid);

    assert_eq!(run_id.to_string(), "0b5c3a2e-9d41-4f7e-8a60-1c2d3e4f5a6b");
    assert_eq!(run_id.short(), "0b5c3a2e");
    assert_eq!(run_id.label_selector(), "e2e-run=0b5c3a2e-9d41-4f7e-8a60-1c2d3e4f5a6b");
}

#[test]
fn test_generated_run_ids_differ() {
    assert_ne!(RunId::generate(), RunId::generate());
}
