//! Tests for the browse module
//!
//! Covers path sandboxing, listing construction, ordering and random media
//! selection.

use super::*;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture() -> (TempDir, ServedRoot) {
    let dir = TempDir::new().unwrap();
    let root = ServedRoot::new(dir.path()).unwrap();
    (dir, root)
}

fn entry(name: &str, size: u64, age_secs: i64, is_dir: bool) -> Entry {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let prefix = if is_dir { BROWSE_PREFIX } else { FILES_PREFIX };
    Entry {
        name: name.to_string(),
        size,
        permissions: "-rw-r--r--".to_string(),
        modified_at: base - Duration::seconds(age_secs),
        is_dir,
        link_path: format!("{}{}", prefix, escape_path(name)),
    }
}

fn names(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

// ============================================================================
// Path sandboxing
// ============================================================================

mod resolver_tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_to_root() {
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize(".").unwrap(), "");
        assert_eq!(normalize("/").unwrap(), "");
        assert_eq!(normalize("./a//./b/").unwrap(), "a/b");
    }

    #[test]
    fn test_normalize_rejects_parent_segments() {
        for input in ["..", "../etc", "a/../../b", "a/b/..", "/.."] {
            assert!(
                matches!(normalize(input), Err(PathError::Traversal(_))),
                "expected traversal error for {input:?}"
            );
        }
    }

    #[test]
    fn test_normalize_allows_dots_inside_names() {
        assert_eq!(normalize("a..b/...").unwrap(), "a..b/...");
    }

    #[test]
    fn test_is_within_is_boundary_aware() {
        let root = Path::new("/data");
        assert!(is_within(root, Path::new("/data")));
        assert!(is_within(root, Path::new("/data/a/b")));
        assert!(!is_within(root, Path::new("/data-other")));
        assert!(!is_within(root, Path::new("/data-other/file")));
        assert!(!is_within(root, Path::new("/dat")));
        assert!(!is_within(root, Path::new("/")));
    }

    #[test]
    fn test_resolve_inside_root() {
        let (_dir, root) = fixture();
        fs::create_dir(root.path().join("sub")).unwrap();

        let resolved = root.resolve("sub").unwrap();
        assert_eq!(resolved.relative, "sub");
        assert_eq!(resolved.absolute, root.path().join("sub"));

        let resolved = root.resolve("").unwrap();
        assert_eq!(resolved.absolute, root.path());
    }

    #[test]
    fn test_resolve_nonexistent_stays_lexical() {
        let (_dir, root) = fixture();
        let resolved = root.resolve("missing/file.txt").unwrap();
        assert_eq!(resolved.absolute, root.path().join("missing/file.txt"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, root) = fixture();
        assert!(matches!(
            root.resolve("../outside"),
            Err(PathError::Traversal(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let outside = TempDir::new().unwrap();
        let (_dir, root) = fixture();
        std::os::unix::fs::symlink(outside.path(), root.path().join("escape")).unwrap();

        assert!(matches!(
            root.resolve("escape"),
            Err(PathError::OutsideRoot(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_sibling_prefix_symlink() {
        let parent = TempDir::new().unwrap();
        let data = parent.path().join("data");
        let sibling = parent.path().join("data-other");
        fs::create_dir(&data).unwrap();
        fs::create_dir(&sibling).unwrap();
        std::os::unix::fs::symlink(&sibling, data.join("link")).unwrap();

        let root = ServedRoot::new(&data).unwrap();
        assert!(matches!(
            root.resolve("link"),
            Err(PathError::OutsideRoot(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Any path with a `..` segment is rejected before resolution
        #[test]
        fn parent_segment_always_rejected(
            before in proptest::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..4),
            after in proptest::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..4),
        ) {
            let mut segments: Vec<String> = before;
            segments.push("..".to_string());
            segments.extend(after);
            let path = segments.join("/");
            prop_assert!(matches!(normalize(&path), Err(PathError::Traversal(_))));
        }

        /// Normalized paths never start or end with a separator and
        /// contain no empty or `.` segments
        #[test]
        fn normalized_form_is_clean(
            segments in proptest::collection::vec(
                prop_oneof!["[a-z]{1,6}", Just(".".to_string()), Just(String::new())],
                0..8,
            )
        ) {
            let path = segments.join("/");
            let normalized = normalize(&path).unwrap();
            prop_assert!(!normalized.starts_with('/'));
            prop_assert!(!normalized.ends_with('/'));
            if !normalized.is_empty() {
                for segment in normalized.split('/') {
                    prop_assert!(!segment.is_empty());
                    prop_assert_ne!(segment, ".");
                }
            }
        }

        /// Resolved paths always stay under the root
        #[test]
        fn resolved_paths_stay_inside(
            segments in proptest::collection::vec("[a-z]{1,6}", 0..5)
        ) {
            let (_dir, root) = fixture();
            let resolved = root.resolve(&segments.join("/")).unwrap();
            prop_assert!(is_within(root.path(), &resolved.absolute));
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

mod listing_tests {
    use super::*;

    #[test]
    fn test_root_listing_with_file_and_directory() {
        let (_dir, root) = fixture();
        fs::write(root.path().join("a.txt"), b"0123456789").unwrap();
        fs::create_dir(root.path().join("b")).unwrap();

        let listing = list(&root, "").unwrap();
        assert_eq!(listing.entries.len(), 2);
        assert!(!listing.has_parent);
        assert_eq!(listing.current_path, "");
        assert_eq!(listing.parent_path, "");

        let file = listing.entries.iter().find(|e| e.name == "a.txt").unwrap();
        assert_eq!(file.size, 10);
        assert!(!file.is_dir);
        assert_eq!(file.link_path, "/files/a.txt");

        let sub = listing.entries.iter().find(|e| e.name == "b").unwrap();
        assert!(sub.is_dir);
        assert_eq!(sub.link_path, "/browse/b");
    }

    #[test]
    fn test_empty_subdirectory_has_parent() {
        let (_dir, root) = fixture();
        fs::create_dir(root.path().join("b")).unwrap();

        let listing = list(&root, "b").unwrap();
        assert!(listing.entries.is_empty());
        assert!(listing.has_parent);
        assert_eq!(listing.current_path, "b");
        assert_eq!(listing.parent_path, "/browse/");
    }

    #[test]
    fn test_nested_links_escape_each_segment() {
        let (_dir, root) = fixture();
        let nested = root.path().join("my docs").join("q&a #1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("50% off.mp3"), b"x").unwrap();
        fs::create_dir(nested.join("inner")).unwrap();

        let listing = list(&root, "my docs/q&a #1").unwrap();
        assert_eq!(listing.parent_path, "/browse/my%20docs");

        let file = listing.entries.iter().find(|e| !e.is_dir).unwrap();
        assert_eq!(file.link_path, "/files/my%20docs/q&a%20%231/50%25%20off.mp3");
        let dir = listing.entries.iter().find(|e| e.is_dir).unwrap();
        assert_eq!(dir.link_path, "/browse/my%20docs/q&a%20%231/inner");
    }

    #[test]
    fn test_every_entry_gets_a_prefixed_link() {
        let (_dir, root) = fixture();
        for i in 0..5 {
            fs::write(root.path().join(format!("f{i}.bin")), vec![0u8; i]).unwrap();
            fs::create_dir(root.path().join(format!("d{i}"))).unwrap();
        }

        let listing = list(&root, ".").unwrap();
        assert_eq!(listing.entries.len(), 10);
        for entry in &listing.entries {
            let prefix = if entry.is_dir { "/browse/" } else { "/files/" };
            assert!(entry.link_path.starts_with(prefix));
            assert!(entry.link_path.len() > prefix.len());
        }
    }

    #[test]
    fn test_listing_is_single_level() {
        let (_dir, root) = fixture();
        fs::create_dir_all(root.path().join("a/b/c")).unwrap();
        fs::write(root.path().join("a/b/deep.txt"), b"x").unwrap();

        let listing = list(&root, "").unwrap();
        assert_eq!(names(&listing.entries), vec!["a".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_string() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, root) = fixture();
        let file = root.path().join("script.sh");
        fs::write(&file, b"#!/bin/sh").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o754)).unwrap();

        let listing = list(&root, "").unwrap();
        assert_eq!(listing.entries[0].permissions, "-rwxr-xr--");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let (_dir, root) = fixture();
        let err = list(&root, "nope").unwrap_err();
        assert!(matches!(err, BrowseError::Io { .. }));
        assert!(!err.is_forbidden());
    }

    #[test]
    fn test_traversal_is_forbidden() {
        let (_dir, root) = fixture();
        let err = list(&root, "../").unwrap_err();
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_listing_serializes_wire_names() {
        let (_dir, root) = fixture();
        fs::write(root.path().join("a.txt"), b"0123456789").unwrap();

        let listing = list(&root, "").unwrap();
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["currentPath"], "");
        assert_eq!(json["parentPath"], "");
        assert_eq!(json["hasParent"], false);
        let file = &json["files"][0];
        assert_eq!(file["name"], "a.txt");
        assert_eq!(file["size"], 10);
        assert_eq!(file["isDir"], false);
        assert_eq!(file["path"], "/files/a.txt");
        assert!(file["mode"].is_string());
        assert!(file["modTime"].is_string());
    }
}

// ============================================================================
// Ordering
// ============================================================================

mod sort_tests {
    use super::*;

    fn sample() -> Vec<Entry> {
        vec![
            entry("charlie", 300, 10, false),
            entry("alpha", 100, 30, false),
            entry("Bravo", 200, 20, true),
            entry("delta", 50, 40, false),
        ]
    }

    #[test]
    fn test_parse() {
        assert_eq!(SortField::parse("name"), Some(SortField::Name));
        assert_eq!(SortField::parse("size"), Some(SortField::Size));
        assert_eq!(SortField::parse("date"), Some(SortField::Date));
        assert_eq!(SortField::parse("Name"), None);
        assert_eq!(SortField::parse(""), None);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("DESC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Asc);
    }

    #[test]
    fn test_sort_by_name_is_bytewise() {
        let mut entries = sample();
        sort_entries(&mut entries, Some(SortField::Name), SortOrder::Asc);
        assert_eq!(names(&entries), vec!["Bravo", "alpha", "charlie", "delta"]);
    }

    #[test]
    fn test_size_desc_is_reverse_of_asc() {
        let mut asc = sample();
        let mut desc = sample();
        sort_entries(&mut desc, Some(SortField::Size), SortOrder::Desc);
        sort_entries(&mut asc, Some(SortField::Size), SortOrder::Asc);

        let mut reversed = names(&desc);
        reversed.reverse();
        assert_eq!(names(&asc), reversed);
        assert_eq!(names(&asc), vec!["delta", "alpha", "Bravo", "charlie"]);
    }

    #[test]
    fn test_sort_by_date() {
        let mut entries = sample();
        sort_entries(&mut entries, Some(SortField::Date), SortOrder::Asc);
        assert_eq!(names(&entries), vec!["delta", "alpha", "Bravo", "charlie"]);

        sort_entries(&mut entries, Some(SortField::Date), SortOrder::Desc);
        assert_eq!(names(&entries), vec!["charlie", "Bravo", "alpha", "delta"]);
    }

    #[test]
    fn test_unknown_field_is_noop() {
        let mut entries = sample();
        let before = names(&entries);
        sort_entries(&mut entries, SortField::parse("colour"), SortOrder::Desc);
        assert_eq!(names(&entries), before);
    }
}

// ============================================================================
// Random media
// ============================================================================

mod media_tests {
    use super::*;

    #[test]
    fn test_is_media_file() {
        for name in ["song.mp3", "CLIP.MP4", "photo.JpEg", "icon.svg", "scan.tiff", "x.m4v"] {
            assert!(is_media_file(name), "{name} should be media");
        }
        for name in ["notes.txt", "archive.zip", "mp3", "video.mp4.part", "noext"] {
            assert!(!is_media_file(name), "{name} should not be media");
        }
    }

    #[test]
    fn test_no_media_is_not_found() {
        let (_dir, root) = fixture();
        fs::write(root.path().join("readme.txt"), b"hi").unwrap();
        fs::create_dir(root.path().join("photos.jpg")).unwrap();

        let err = pick_random_media(&root, "").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_single_media_file_always_chosen() {
        let (_dir, root) = fixture();
        fs::write(root.path().join("readme.txt"), b"hi").unwrap();
        fs::write(root.path().join("track.flac"), b"x").unwrap();

        for _ in 0..50 {
            assert_eq!(pick_random_media(&root, "").unwrap(), "/files/track.flac");
        }
    }

    #[test]
    fn test_media_in_subdirectory_links_include_path() {
        let (_dir, root) = fixture();
        fs::create_dir(root.path().join("pics")).unwrap();
        fs::write(root.path().join("pics/cat.png"), b"x").unwrap();

        assert_eq!(pick_random_media(&root, "pics").unwrap(), "/files/pics/cat.png");
    }

    #[test]
    fn test_selection_is_roughly_uniform() {
        let entries = vec![
            entry("a.mp3", 1, 0, false),
            entry("b.webm", 1, 0, false),
            entry("c.txt", 1, 0, false),
            entry("d.png", 1, 0, true),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            match pick_media_link(&entries, &mut rng).unwrap().as_str() {
                "/files/a.mp3" => counts[0] += 1,
                "/files/b.webm" => counts[1] += 1,
                other => panic!("non-media link returned: {other}"),
            }
        }
        for count in counts {
            assert!((4_500..=5_500).contains(&count), "skewed counts: {counts:?}");
        }
    }

    #[test]
    fn test_os_rng_selection_covers_both_files() {
        let (_dir, root) = fixture();
        fs::write(root.path().join("one.ogg"), b"x").unwrap();
        fs::write(root.path().join("two.gif"), b"x").unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            seen.insert(pick_random_media(&root, "").unwrap());
        }
        let expected: std::collections::HashSet<String> =
            ["/files/one.ogg", "/files/two.gif"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }
}

#[test]
fn test_served_root_is_canonical() {
    let dir = TempDir::new().unwrap();
    let with_dot: PathBuf = dir.path().join(".");
    let root = ServedRoot::new(&with_dot).unwrap();
    assert_eq!(root.path(), fs::canonicalize(dir.path()).unwrap());
}
