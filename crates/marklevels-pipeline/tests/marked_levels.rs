//! Integration tests: write synthetic charts to disk and run the
//! file-based pipeline end to end.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use marklevels_pipeline::{
    LevelOrder, LevelsConfig, LevelsOutcome, get_marked_levels, get_marked_levels_with,
};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const MARK: Rgb<u8> = Rgb([20, 40, 200]);

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
struct Mark {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl Mark {
    fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }

    fn center_x(&self) -> f64 {
        f64::from(self.x0 + self.x1 - 1) / 2.0
    }
}

fn write_chart(dir: &Path, name: &str, width: u32, height: u32, marks: &[Mark]) -> PathBuf {
    write_colored_chart(dir, name, width, height, marks, MARK)
}

fn write_colored_chart(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    marks: &[Mark],
    color: Rgb<u8>,
) -> PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if marks.iter().any(|m| m.contains(x, y)) {
            color
        } else {
            WHITE
        }
    });
    let path = dir.join(name);
    img.save(&path).expect("failed to write chart");
    path
}

fn three_marks() -> Vec<Mark> {
    vec![
        Mark { x0: 150, x1: 180, y0: 15, y1: 45 },
        Mark { x0: 30, x1: 60, y0: 70, y1: 100 },
        Mark { x0: 90, x1: 120, y0: 120, y1: 150 },
    ]
}

fn levels(outcome: &LevelsOutcome) -> &[f64] {
    outcome
        .levels()
        .unwrap_or_else(|| panic!("expected levels, got {outcome:?}"))
}

#[test]
fn one_level_per_marked_region() {
    let dir = tempfile::tempdir().unwrap();
    let marks = three_marks();
    let path = write_chart(dir.path(), "chart.png", 220, 170, &marks);

    let outcome = get_marked_levels(&path);
    let found = levels(&outcome);
    assert_eq!(found.len(), marks.len(), "{found:?}");

    // Discovery order follows the top edge of each region.
    for (level, mark) in found.iter().zip(&marks) {
        assert!(
            (level - mark.center_x()).abs() <= 1.5,
            "level {level} not near {}",
            mark.center_x()
        );
    }
}

#[test]
fn horizontal_bars_are_detected() {
    let dir = tempfile::tempdir().unwrap();
    let marks = vec![
        Mark { x0: 20, x1: 120, y0: 20, y1: 28 },
        Mark { x0: 20, x1: 120, y0: 60, y1: 68 },
    ];
    let path = write_chart(dir.path(), "bars.png", 140, 90, &marks);

    let outcome = get_marked_levels(&path);
    let found = levels(&outcome);
    assert_eq!(found.len(), 2, "{found:?}");
    for level in found {
        assert!((level - 69.5).abs() <= 1.5, "{found:?}");
    }
}

#[test]
fn mid_contrast_marks_are_detected() {
    // Contrast 60, 80 and 100 against white: Sobel strengths 240, 320
    // and 400, all above the high threshold.
    let dir = tempfile::tempdir().unwrap();
    let mark = Mark { x0: 30, x1: 50, y0: 30, y1: 50 };
    for gray in [195, 175, 155] {
        let path = write_colored_chart(
            dir.path(),
            &format!("gray_{gray}.png"),
            80,
            80,
            std::slice::from_ref(&mark),
            Rgb([gray, gray, gray]),
        );
        let outcome = get_marked_levels(&path);
        let found = levels(&outcome);
        assert_eq!(found.len(), 1, "mark {gray}: {found:?}");
        assert!((found[0] - mark.center_x()).abs() <= 1.5, "mark {gray}: {found:?}");
    }
}

#[test]
fn yellow_mark_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let mark = Mark { x0: 30, x1: 50, y0: 30, y1: 50 };
    let path = write_colored_chart(
        dir.path(),
        "yellow.png",
        80,
        80,
        std::slice::from_ref(&mark),
        Rgb([255, 255, 0]),
    );
    let outcome = get_marked_levels(&path);
    assert_eq!(levels(&outcome).len(), 1, "{outcome:?}");
}

#[test]
fn ascending_order_is_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chart(dir.path(), "chart.png", 220, 170, &three_marks());
    let config = LevelsConfig {
        level_order: LevelOrder::Ascending,
        ..LevelsConfig::default()
    };

    let outcome = get_marked_levels_with(&path, &config);
    let found = levels(&outcome);
    assert_eq!(found.len(), 3);
    assert!(found.windows(2).all(|w| w[0] <= w[1]), "{found:?}");
}

#[test]
fn repeated_calls_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chart(dir.path(), "chart.png", 220, 170, &three_marks());
    assert_eq!(get_marked_levels(&path), get_marked_levels(&path));
}

#[test]
fn blank_white_chart_has_no_levels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chart(dir.path(), "blank.png", 100, 100, &[]);
    assert_eq!(
        get_marked_levels(&path),
        LevelsOutcome::MarkedLevels(Vec::new())
    );
}

#[test]
fn missing_image_reports_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = get_marked_levels(dir.path().join("nonexistent_image.png"));
    let message = outcome.error().expect("expected an error");
    assert!(message.starts_with("Error reading image:"), "{message}");
}

#[test]
fn non_image_bytes_report_read_or_processing_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt_image.png");
    std::fs::write(&path, b"Invalid image data").unwrap();

    let outcome = get_marked_levels(&path);
    let message = outcome.error().expect("expected an error");
    assert!(
        message.starts_with("Error reading image:")
            || message.starts_with("Error processing image:"),
        "{message}"
    );
}

#[test]
fn outcome_json_has_exactly_one_key() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_chart(dir.path(), "chart.png", 220, 170, &three_marks());
    let bad = dir.path().join("nonexistent_image.png");

    let ok = serde_json::to_value(get_marked_levels(&good)).unwrap();
    let ok = ok.as_object().unwrap();
    assert_eq!(ok.len(), 1);
    assert_eq!(ok["marked_levels"].as_array().unwrap().len(), 3);

    let err = serde_json::to_value(get_marked_levels(&bad)).unwrap();
    let err = err.as_object().unwrap();
    assert_eq!(err.len(), 1);
    assert!(err["error"].as_str().unwrap().starts_with("Error reading image:"));
}
