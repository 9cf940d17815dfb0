// tests/incremental_filter.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use assetwatch::freshness::{output_path, stale};
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::fs::FileSystem;
use assetwatch::source::{glob_base, SourceSet};
use assetwatch_test_utils::init_tracing;

const ROOT: &str = "/site";

fn relatives(set: &SourceSet) -> Vec<String> {
    set.iter()
        .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
        .collect()
}

fn images(fs: &MockFileSystem) -> SourceSet {
    SourceSet::expand(fs, Path::new(ROOT), "src/img/**/*").unwrap()
}

fn dest() -> PathBuf {
    Path::new(ROOT).join("dist/img")
}

#[test]
fn glob_base_is_the_literal_prefix() {
    assert_eq!(glob_base("src/img/**/*"), PathBuf::from("src/img"));
    assert_eq!(glob_base("src/sass/*.*"), PathBuf::from("src/sass"));
    assert_eq!(glob_base("./src/views/*.html"), PathBuf::from("src/views"));
    assert_eq!(glob_base("dist/js/application.js"), PathBuf::from("dist/js"));
}

#[test]
fn source_set_is_lexical_regardless_of_listing_order() {
    init_tracing();
    let fs = MockFileSystem::new();
    // Listed by the mock in insertion order: c, a, b.
    fs.add_file("/site/src/js/c.js", "c");
    fs.add_file("/site/src/js/a.js", "a");
    fs.add_file("/site/src/js/lib/z.js", "z");
    fs.add_file("/site/src/js/b.js", "b");

    let set = SourceSet::expand(&fs, Path::new(ROOT), "src/js/**/*").unwrap();
    assert_eq!(relatives(&set), vec!["a.js", "b.js", "c.js", "lib/z.js"]);
}

#[test]
fn single_star_stays_in_one_directory() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/views/index.html", "");
    fs.add_file("/site/src/views/layouts/base.html", "");

    let set = SourceSet::expand(&fs, Path::new(ROOT), "src/views/*.html").unwrap();
    assert_eq!(relatives(&set), vec!["index.html"]);
}

#[test]
fn symlinked_directories_are_not_followed() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/img/a.png", "png");
    // A loop back to the base directory.
    fs.add_dir_symlink("/site/src/img/loop", "/site/src/img");

    let set = images(&fs);
    assert_eq!(relatives(&set), vec!["a.png"]);
}

#[test]
fn missing_glob_base_gives_empty_set() {
    let fs = MockFileSystem::new();
    let set = images(&fs);
    assert!(set.is_empty());
}

#[test]
fn missing_destination_makes_everything_stale() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/img/a.png", "a");
    fs.add_file("/site/src/img/b.png", "b");

    let sources = images(&fs);
    assert_eq!(stale(&fs, &sources, &dest()).len(), 2);
}

#[test]
fn unreadable_destination_makes_everything_stale() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/img/a.png", "a");
    fs.add_file("/site/dist/img/a.png", "a-out");
    fs.deny("/site/dist/img");

    let sources = images(&fs);
    assert_eq!(relatives(&stale(&fs, &sources, &dest())), vec!["a.png"]);
}

#[test]
fn each_source_is_judged_on_its_own_output() {
    let fs = MockFileSystem::new();
    let t = |secs| UNIX_EPOCH + Duration::from_secs(secs);

    fs.add_file_at("/site/src/img/fresh.png", "f", t(10));
    fs.add_file_at("/site/dist/img/fresh.png", "f-out", t(20));

    fs.add_file_at("/site/src/img/older-output.png", "o", t(30));
    fs.add_file_at("/site/dist/img/older-output.png", "o-out", t(20));

    fs.add_file_at("/site/src/img/same-time.png", "s", t(40));
    fs.add_file_at("/site/dist/img/same-time.png", "s-out", t(40));

    fs.add_file_at("/site/src/img/icons/new.svg", "<svg/>", t(50));

    let sources = images(&fs);
    let stale_set = stale(&fs, &sources, &dest());
    assert_eq!(relatives(&stale_set), vec!["icons/new.svg", "older-output.png"]);
}

#[test]
fn filter_is_stable_without_writes() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/img/a.png", "a");
    fs.add_file("/site/dist/img/a.png", "a-out");
    fs.add_file("/site/src/img/b.png", "b");

    let sources = images(&fs);
    let first = relatives(&stale(&fs, &sources, &dest()));
    let second = relatives(&stale(&fs, &sources, &dest()));
    assert_eq!(first, vec!["b.png"]);
    assert_eq!(first, second);
}

#[test]
fn writing_the_output_clears_staleness() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/img/a.png", "a");
    fs.add_dir("/site/dist/img");

    let sources = images(&fs);
    let pending = stale(&fs, &sources, &dest());
    assert_eq!(pending.len(), 1);

    let out = output_path(&dest(), &pending.files()[0]);
    fs.write(&out, b"optimized").unwrap();
    assert!(stale(&fs, &sources, &dest()).is_empty());

    // Touching the source makes it stale again.
    fs.add_file("/site/src/img/a.png", "a2");
    let sources = images(&fs);
    assert_eq!(stale(&fs, &sources, &dest()).len(), 1);
}
