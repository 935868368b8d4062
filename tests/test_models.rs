mod common;

use common::*;
use featurecam::config::{AppConfig, CascadePaths, MouthPlacement};
use featurecam::models::Contour;
use imageproc::point::Point;

#[test]
fn test_category_table_order() {
    let names: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        vec![
            "T-shirt/top",
            "Trouser",
            "Pullover",
            "Dress",
            "Coat",
            "Sandal",
            "Shirt",
            "Sneaker",
            "Bag",
            "Ankle boot"
        ]
    );
    for (i, category) in Category::ALL.iter().enumerate() {
        assert_eq!(category.index(), i);
        assert_eq!(Category::from_index(i), Some(*category));
    }
}

#[test]
fn test_category_out_of_range_is_none() {
    assert_eq!(Category::from_index(10), None);
    assert_eq!(Category::from_index(usize::MAX), None);
}

#[test]
fn test_display_labels() {
    assert_eq!(Category::TShirtTop.display_label(), "Camiseta/Top");
    assert_eq!(Category::Trouser.display_label(), "Pantalón");
    assert_eq!(Category::AnkleBoot.display_label(), "Bota");
}

#[test]
fn test_feature_kind_names_round_trip() {
    for kind in FeatureKind::ALL {
        assert_eq!(FeatureKind::from_name(kind.name()), Some(kind));
        assert_eq!(kind.to_string(), kind.name());
    }
    assert_eq!(FeatureKind::from_name("face"), None);
}

#[test]
fn test_feature_colors_are_distinct() {
    let colors: Vec<_> = FeatureKind::ALL.iter().map(|k| k.color()).collect();
    for i in 0..colors.len() {
        for j in (i + 1)..colors.len() {
            assert_ne!(colors[i], colors[j]);
        }
    }
}

#[test]
fn test_bounding_box_geometry() {
    let outer = BoundingBox::new(10, 10, 50, 40);
    let inner = BoundingBox::new(5, 5, 10, 10).translate(10, 10);
    assert_eq!(inner, BoundingBox::new(15, 15, 10, 10));
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert_eq!(outer.right(), 60);
    assert_eq!(outer.bottom(), 50);
    assert_eq!(outer.area(), 2000);
    assert!(outer.fits_within(60, 50));
    assert!(!outer.fits_within(59, 50));
    assert!(!BoundingBox::new(0, 0, 0, 5).fits_within(10, 10));
}

#[test]
fn test_contour_bounding_rect_and_area() {
    let square = Contour::new(vec![
        Point::new(2, 3),
        Point::new(2, 7),
        Point::new(6, 7),
        Point::new(6, 3),
    ]);
    assert_eq!(square.bounding_rect(), Some(BoundingBox::new(2, 3, 5, 5)));
    assert!((square.area.abs() - 16.0).abs() < 1e-9);
    assert_eq!(Contour::new(Vec::new()).bounding_rect(), None);
}

#[test]
fn test_cascade_paths_from_dir() {
    let paths = CascadePaths::from_dir("/assets");
    assert!(paths.face.ends_with("haarcascade_frontalcatface.xml"));
    assert!(paths.eye.ends_with("haarcascade_eye.xml"));
    assert!(paths.nose.ends_with("haarcascade_mcs_nose.xml"));
    assert!(paths.mouth.ends_with("haarcascade_mcs_mouth.xml"));
}

#[test]
fn test_app_config_from_json() -> anyhow::Result<()> {
    let file = write_temp(
        r#"{
            "cascades": { "face": "f.xml", "eye": "e.xml", "nose": "n.xml", "mouth": "m.xml" },
            "model_path": "model.json",
            "mouth_placement": "lower-half"
        }"#,
        ".json",
    );
    let config = AppConfig::load(file.path())?;
    assert_eq!(config.cascades, Some(CascadePaths::new("f.xml", "e.xml", "n.xml", "m.xml")));
    assert_eq!(config.model_path, Some("model.json".into()));
    assert_eq!(config.font_path, None);
    assert_eq!(config.mouth_placement, MouthPlacement::LowerHalf);
    Ok(())
}

#[test]
fn test_app_config_defaults() -> anyhow::Result<()> {
    let file = write_temp("{}", ".json");
    let config = AppConfig::load(file.path())?;
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.mouth_placement, MouthPlacement::Raw);
    Ok(())
}
