use super::*;

fn layout_json() -> String {
    serde_json::to_string(&Layout::new()).unwrap()
}

#[test]
fn export_produces_gltf() {
    let gltf = export_layout(&layout_json()).unwrap();
    let doc: Value = serde_json::from_str(&gltf).unwrap();
    assert_eq!(doc["asset"]["version"], "2.0");
}

#[test]
fn export_accepts_saved_project_body() {
    let layout = Layout::new();
    let project = serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000000",
        "user_id": "ada",
        "name": "Cabin",
        "rooms": layout.rooms,
        "roofs": [],
        "environment": "city",
        "created_at": "2026-01-01T00:00:00Z"
    });
    assert!(export_layout(&project.to_string()).is_ok());
}

#[test]
fn export_rejects_empty_layout() {
    let err = export_layout(r#"{"rooms": []}"#).unwrap_err();
    assert!(matches!(err, CliError::Layout(scene::SceneError::EmptyLayout)));
}

#[test]
fn export_and_save_reject_non_positive_feature_size() {
    let mut layout: Value = serde_json::from_str(&layout_json()).unwrap();
    layout["rooms"][0]["features"] = serde_json::json!([{
        "kind": "door",
        "wall": "front",
        "position": [0.0, 0.0, 0.0],
        "dimensions": { "width": -4.0, "height": 0.0 }
    }]);
    let text = layout.to_string();
    assert!(matches!(
        export_layout(&text),
        Err(CliError::Layout(scene::SceneError::InvalidMeasure { field: "feature width", .. }))
    ));
    assert!(matches!(save_body("Cabin", &text), Err(CliError::Layout(_))));
}

#[test]
fn export_rejects_garbage() {
    assert!(matches!(export_layout("nope"), Err(CliError::InvalidJson(_))));
}

#[test]
fn save_body_carries_name_and_rooms() {
    let body = save_body("Cabin", &layout_json()).unwrap();
    assert_eq!(body["name"], "Cabin");
    assert_eq!(body["rooms"].as_array().unwrap().len(), 1);
    assert_eq!(body["environment"], "forest");
    assert!(body.get("wall_thickness").is_none());
}

#[test]
fn user_paths() {
    assert_eq!(user_path("ada", "projects"), "/api/users/ada/projects");
    assert_eq!(user_path("ada", "subscription/upgrade"), "/api/users/ada/subscription/upgrade");
}

#[test]
fn user_path_encodes_reserved_characters() {
    assert_eq!(user_path("team/ada?x=1", "projects"), "/api/users/team%2Fada%3Fx%3D1/projects");
    assert_eq!(user_path("ada lovelace", "subscription"), "/api/users/ada%20lovelace/subscription");
}

#[test]
fn missing_user_is_an_error() {
    let ctx = CliContext { base_url: "http://x".into(), user: Some("  ".into()) };
    assert!(matches!(ctx.user(), Err(CliError::MissingUser)));
    let ctx = CliContext { base_url: "http://x".into(), user: Some("ada".into()) };
    assert_eq!(ctx.user().unwrap(), "ada");
}

#[test]
fn server_error_message_prefers_message_field() {
    let body = serde_json::json!({ "message": "Project not found" });
    assert_eq!(error_message(&body), "Project not found");
    assert_eq!(error_message(&Value::Null), "null");
}

#[test]
fn cli_parses_generate_words() {
    let cli = Cli::try_parse_from(["roomcraft", "generate", "small", "barn"]).unwrap();
    assert!(matches!(cli.command, Command::Generate { ref prompt } if prompt.join(" ") == "small barn"));
}
