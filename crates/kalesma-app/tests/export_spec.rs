use std::fs;

use tempfile::TempDir;

use kalesma_app::export::{PRESENTATION_FILE_NAME, export_presentation};
use kalesma_app::invitation::{Presentation, Slide};

fn sample_deck() -> Presentation {
    Presentation {
        slides: vec![
            Slide {
                title: "A Journey Well Retired".to_string(),
                content: vec![
                    "Celebrating Ramesh Kumar".to_string(),
                    "30 years of service".to_string(),
                ],
            },
            Slide {
                title: "You Are Invited".to_string(),
                content: vec!["Join us for the felicitation ceremony".to_string()],
            },
        ],
    }
}

#[test]
fn export_writes_pretty_json_under_the_fixed_name() {
    let temp = TempDir::new().expect("temp dir");
    let deck = sample_deck();

    let path = export_presentation(temp.path(), &deck).expect("export succeeds");
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some(PRESENTATION_FILE_NAME)
    );

    let written = fs::read_to_string(&path).expect("read exported file");
    assert!(written.starts_with("{\n"), "output must be pretty-printed");
    assert!(written.contains("  \"slides\""));

    let round_trip: Presentation = serde_json::from_str(&written).expect("parse exported file");
    assert_eq!(round_trip, deck);
}

#[test]
fn export_creates_the_target_directory() {
    let temp = TempDir::new().expect("temp dir");
    let nested = temp.path().join("out").join("decks");

    let path = export_presentation(&nested, &sample_deck()).expect("export succeeds");
    assert!(path.exists());
    assert!(path.starts_with(&nested));
}

#[test]
fn export_overwrites_a_previous_deck() {
    let temp = TempDir::new().expect("temp dir");
    let first = sample_deck();
    export_presentation(temp.path(), &first).expect("first export");

    let second = Presentation {
        slides: vec![Slide {
            title: "Replacement".to_string(),
            content: vec![],
        }],
    };
    let path = export_presentation(temp.path(), &second).expect("second export");

    let written: Presentation =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
    assert_eq!(written, second);
}
