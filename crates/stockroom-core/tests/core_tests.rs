use stockroom_core::{
    DEFAULT_EXTENSIONS, FileNode, FolderNode, InventoryNode, ScanConfig, ScanError, ScanWarning,
    WarningKind, normalize_extension,
};

fn sample_tree() -> FolderNode {
    let mut rares = FolderNode::new("Rares");
    rares.push(FileNode::new("Singles/Rares/Charizard_$40.jpg", "Charizard_$40"));

    let mut singles = FolderNode::new("Singles");
    singles.push(rares);
    singles.push(FileNode::new("Singles/Pikachu_$2.png", "Pikachu_$2"));

    let mut home = FolderNode::new("Home");
    home.push(singles);
    home.push(FileNode::new("banner.jpg", "banner"));
    home
}

#[test]
fn test_folder_serializes_with_storefront_keys() {
    let json = serde_json::to_value(sample_tree()).unwrap();

    assert_eq!(json["type"], "folder");
    assert_eq!(json["name"], "Home");
    assert_eq!(json["totalFiles"], 3);
    assert_eq!(json["totalFolders"], 2);

    let contents = json["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0]["type"], "folder");
    assert_eq!(contents[0]["name"], "Singles");
    assert_eq!(contents[0]["totalFiles"], 2);
    assert_eq!(contents[0]["totalFolders"], 1);
}

#[test]
fn test_file_serializes_path_as_name() {
    let json = serde_json::to_value(FileNode::new("Singles/Pikachu_$2.png", "Pikachu_$2")).unwrap();

    assert_eq!(json["type"], "file");
    assert_eq!(json["name"], "Singles/Pikachu_$2.png");
    assert_eq!(json["title"], "Pikachu_$2");
    assert!(json.get("relative_path").is_none());
}

#[test]
fn test_tree_deserializes_back_into_variants() {
    let original = sample_tree();
    let text = serde_json::to_string(&original).unwrap();
    let parsed: FolderNode = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed, original);
    assert!(parsed.children[0].is_folder());
    assert!(parsed.children[1].is_file());
}

#[test]
fn test_counts_are_recursive() {
    let home = sample_tree();
    let singles = home.folder("Singles").unwrap();
    let rares = singles.folder("Rares").unwrap();

    assert_eq!(rares.total_files, 1);
    assert_eq!(rares.total_folders, 0);
    assert_eq!(singles.total_files, 2);
    assert_eq!(singles.total_folders, 1);
    assert_eq!(home.total_files, 3);
    assert_eq!(home.total_folders, 2);
    assert_eq!(home.files().count() as u64, home.total_files);
}

#[test]
fn test_node_enum_counts() {
    let folder: InventoryNode = sample_tree().into();
    assert_eq!(folder.file_count(), 3);
    assert_eq!(folder.folder_count(), 2);
}

#[test]
fn test_default_policy() {
    let config = ScanConfig::default();
    for ext in DEFAULT_EXTENSIONS {
        assert!(config.allowed_extensions.contains(*ext));
    }
    for name in [".git", "index.html", "node_modules", "__pycache__", ".DS_Store"] {
        assert!(config.should_ignore(name), "{name} should be ignored");
    }
}

#[test]
fn test_normalize_extension() {
    assert_eq!(normalize_extension(".JPG"), "jpg");
    assert_eq!(normalize_extension("png"), "png");
    assert_eq!(normalize_extension("  .WebP "), "webp");
}

#[test]
fn test_config_deserializes_and_normalizes() {
    let json = r#"{ "root": "/srv/shop", "allowed_extensions": [".JPG", "Png"] }"#;
    let config: ScanConfig = serde_json::from_str(json).unwrap();

    assert!(config.allowed_extensions.contains("jpg"));
    assert!(config.allowed_extensions.contains("png"));
    assert_eq!(config.allowed_extensions.len(), 2);
    assert_eq!(config.root_name, "Home");
    assert!(config.include_hidden);
}

#[test]
fn test_error_display() {
    let err = ScanError::NotADirectory {
        path: "/srv/shop/index.html".into(),
    };
    assert!(err.to_string().contains("not a directory"));

    let warning = ScanWarning::symlink_loop("/srv/shop/loop");
    assert_eq!(warning.kind, WarningKind::SymlinkLoop);
}
