use std::fs;
use std::path::Path;

use git2::Repository;
use stockroom_publish::{
    GitOptions, PageUpdate, PublishError, PublishOutcome, RenameOptions, SiteConfig, publish,
    normalize_filenames, update_page,
};
use stockroom_scan::{FolderNode, InventoryScanner};
use tempfile::TempDir;

const PAGE: &str = "<!DOCTYPE html>\n<script>\nconst inventoryDB = {};\n</script>\n";

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"img").unwrap();
}

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.html"), PAGE).unwrap();
    touch(temp.path(), "Singles/Pikachu_$2.jpg");
    touch(temp.path(), "Sealed/Booster_Box_$120.png");
    touch(temp.path(), "Sealed/receipt.pdf");
    temp
}

fn scan(root: &Path) -> FolderNode {
    let config = SiteConfig::load(root).unwrap().scan_config(root).unwrap();
    InventoryScanner::new().scan(&config).unwrap().root
}

fn embedded_inventory(page: &str) -> FolderNode {
    let start = page.find("const inventoryDB = ").unwrap() + "const inventoryDB = ".len();
    let end = page[start..].find("};").unwrap() + start + 1;
    serde_json::from_str(&page[start..end]).unwrap()
}

#[test]
fn test_update_page_embeds_scan() {
    let temp = site();
    let root = scan(temp.path());
    let page = temp.path().join("index.html");

    let update = update_page(&page, &root).unwrap();
    assert!(matches!(update, PageUpdate::Written { .. }));

    let written = fs::read_to_string(&page).unwrap();
    assert!(written.starts_with("<!DOCTYPE html>\n<script>\nconst inventoryDB = {\n"));
    assert!(written.ends_with("};\n</script>\n"));

    let embedded = embedded_inventory(&written);
    assert_eq!(embedded, root);
    assert_eq!(embedded.total_files, 2);
    assert_eq!(embedded.total_folders, 2);
}

#[test]
fn test_update_page_twice_is_unchanged() {
    let temp = site();
    let page = temp.path().join("index.html");

    update_page(&page, &scan(temp.path())).unwrap();
    let first = fs::read_to_string(&page).unwrap();

    let update = update_page(&page, &scan(temp.path())).unwrap();
    assert_eq!(update, PageUpdate::Unchanged);
    assert_eq!(fs::read_to_string(&page).unwrap(), first);
}

#[test]
fn test_page_is_not_scanned_into_inventory() {
    let temp = site();
    let root = scan(temp.path());
    assert!(root.files().all(|f| !f.relative_path.ends_with(".html")));
}

#[test]
fn test_missing_marker_leaves_page_untouched() {
    let temp = site();
    let page = temp.path().join("index.html");
    fs::write(&page, "<html>no inventory here</html>").unwrap();

    let result = update_page(&page, &scan(temp.path()));
    assert!(matches!(result, Err(PublishError::MarkerNotFound { .. })));
    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        "<html>no inventory here</html>"
    );
}

#[test]
fn test_missing_page() {
    let temp = site();
    let result = update_page(&temp.path().join("shop.html"), &FolderNode::new("Home"));
    assert!(matches!(result, Err(PublishError::PageNotFound { .. })));
}

#[test]
fn test_site_config_file_is_honored() {
    let temp = site();
    fs::write(
        temp.path().join("stockroom.toml"),
        "root_name = \"Catalog\"\nextensions = [\"png\"]\n",
    )
    .unwrap();

    let root = scan(temp.path());
    assert_eq!(root.name, "Catalog");
    assert_eq!(root.total_files, 1);
    assert!(root.folder("Singles").is_none());
}

#[test]
fn test_malformed_site_config() {
    let temp = site();
    fs::write(temp.path().join("stockroom.toml"), "root_name = [").unwrap();

    let result = SiteConfig::load(temp.path());
    assert!(matches!(result, Err(PublishError::Config { .. })));
}

#[test]
fn test_normalize_filenames_renames_images_with_spaces() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "Sealed/Booster Box $120.jpg");
    touch(temp.path(), "Sealed/price list.txt");
    touch(temp.path(), "node_modules/some pkg.png");
    touch(temp.path(), "fine.png");

    let report = normalize_filenames(temp.path(), &RenameOptions::default()).unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert!(report.failed.is_empty());
    assert!(temp.path().join("Sealed/Booster_Box_$120.jpg").exists());
    assert!(!temp.path().join("Sealed/Booster Box $120.jpg").exists());
    assert!(temp.path().join("Sealed/price list.txt").exists());
    assert!(temp.path().join("node_modules/some pkg.png").exists());

    let again = normalize_filenames(temp.path(), &RenameOptions::default()).unwrap();
    assert!(again.is_clean());
}

#[test]
fn test_normalize_filenames_reports_collisions() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "a b.jpg");
    touch(temp.path(), "a_b.jpg");

    let report = normalize_filenames(temp.path(), &RenameOptions::default()).unwrap();

    assert!(report.renamed.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].message.contains("already exists"));
    assert!(temp.path().join("a b.jpg").exists());
}

#[test]
fn test_dry_run_matches_real_run_when_names_converge() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "a b_c.jpg");
    touch(temp.path(), "a_b c.jpg");

    let planned = normalize_filenames(temp.path(), &RenameOptions::default().with_dry_run(true))
        .unwrap();
    assert_eq!(planned.renamed.len(), 1);
    assert_eq!(planned.failed.len(), 1);
    assert!(planned.failed[0].message.contains("already exists"));

    let done = normalize_filenames(temp.path(), &RenameOptions::default()).unwrap();
    assert_eq!(done.renamed, planned.renamed);
    assert_eq!(done.failed.len(), planned.failed.len());
    assert!(temp.path().join("a_b_c.jpg").exists());
}

#[test]
fn test_normalize_filenames_dry_run() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "Holo Rare.webp");

    let options = RenameOptions::default().with_dry_run(true);
    let report = normalize_filenames(temp.path(), &options).unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.renamed[0].to, temp.path().join("Holo_Rare.webp"));
    assert!(temp.path().join("Holo Rare.webp").exists());
    assert!(!temp.path().join("Holo_Rare.webp").exists());
}

fn init_site_repo(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let remote_path = temp.path().join("remote.git");
    Repository::init_bare(&remote_path).unwrap();

    let site_path = temp.path().join("site");
    fs::create_dir(&site_path).unwrap();
    let repo = Repository::init(&site_path).unwrap();
    repo.remote("origin", remote_path.to_str().unwrap()).unwrap();

    fs::write(site_path.join("index.html"), PAGE).unwrap();
    touch(&site_path, "Singles/Pikachu_$2.jpg");
    (site_path, remote_path)
}

#[test]
fn test_publish_commits_on_unborn_branch_without_push() {
    let temp = TempDir::new().unwrap();
    let (site_path, _) = init_site_repo(&temp);

    let options = GitOptions {
        push: false,
        ..GitOptions::default()
    };
    let outcome = publish(&site_path, &options).unwrap();

    let PublishOutcome::Committed { commit_id, .. } = &outcome else {
        panic!("expected a commit, got {outcome:?}");
    };
    let repo = Repository::open(&site_path).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(&head.id().to_string(), commit_id);
    assert_eq!(head.message(), Some("Auto-update inventory"));
    assert!(head.tree().unwrap().get_path(Path::new("Singles/Pikachu_$2.jpg")).is_ok());

    let again = publish(&site_path, &options).unwrap();
    assert_eq!(again, PublishOutcome::NothingToCommit);
}

#[test]
fn test_publish_pushes_to_remote() {
    let temp = TempDir::new().unwrap();
    let (site_path, remote_path) = init_site_repo(&temp);

    let outcome = publish(&site_path, &GitOptions::default()).unwrap();
    let PublishOutcome::Pushed {
        commit_id, branch, ..
    } = &outcome
    else {
        panic!("expected a push, got {outcome:?}");
    };

    let remote = Repository::open_bare(&remote_path).unwrap();
    let pushed = remote
        .find_reference(&format!("refs/heads/{branch}"))
        .unwrap()
        .target()
        .unwrap();
    assert_eq!(&pushed.to_string(), commit_id);

    // Page regenerated with new content: a second commit lands on top.
    let root = scan(&site_path);
    update_page(&site_path.join("index.html"), &root).unwrap();
    let second = publish(&site_path, &GitOptions::default()).unwrap();
    assert_ne!(second.commit_id(), outcome.commit_id());
    assert!(second.commit_id().is_some());
}

#[test]
fn test_publish_stages_deletions() {
    let temp = TempDir::new().unwrap();
    let (site_path, _) = init_site_repo(&temp);
    let options = GitOptions {
        push: false,
        ..GitOptions::default()
    };
    publish(&site_path, &options).unwrap();

    fs::remove_file(site_path.join("Singles/Pikachu_$2.jpg")).unwrap();
    publish(&site_path, &options).unwrap();

    let repo = Repository::open(&site_path).unwrap();
    let tree = repo.head().unwrap().peel_to_tree().unwrap();
    assert!(tree.get_path(Path::new("Singles/Pikachu_$2.jpg")).is_err());
    assert!(tree.get_path(Path::new("index.html")).is_ok());
}

#[test]
fn test_publish_outside_repository() {
    let temp = TempDir::new().unwrap();
    let result = publish(temp.path(), &GitOptions::default());
    assert!(matches!(result, Err(PublishError::Git(_))));
}
