mod common;

use common::*;
use featurecam::detection::classifier::{select_class, Activation, MlpModel, Scale};
use featurecam::detection::descriptor::{compute_descriptor, descriptor_length};
use featurecam::detection::garment::load_model;
use featurecam::error::ModelError;
use featurecam::{ClassifierModel, GarmentClassificationPipeline};

#[test]
fn test_descriptor_length_is_constant() -> anyhow::Result<()> {
    assert_eq!(descriptor_length(), 324);
    for seed in 0..4 {
        assert_eq!(compute_descriptor(&noise_image(28, 28, seed))?.len(), 324);
    }
    let flat = image::GrayImage::new(28, 28);
    let descriptor = compute_descriptor(&flat)?;
    assert_eq!(descriptor.len(), 324);
    assert!(descriptor.iter().all(|v| *v == 0.0));
    Ok(())
}

#[test]
fn test_descriptor_rejects_other_sizes() {
    let err = compute_descriptor(&noise_image(32, 28, 0)).unwrap_err();
    assert!(matches!(err, PipelineError::Descriptor(_)));
}

#[test]
fn test_select_class_ties_take_first() {
    assert_eq!(select_class(&[0.1, 0.7, 0.7, 0.2]), Some(1));
    assert_eq!(select_class(&[0.5; 10]), Some(0));
    assert_eq!(select_class(&[-3.0, -1.0, -2.0]), Some(1));
    assert_eq!(select_class(&[f32::NAN, 0.2, 0.1]), Some(1));
    assert_eq!(select_class(&[]), None);
}

#[test]
fn test_identity_mlp_forward_pass() -> anyhow::Result<()> {
    let model = MlpModel::from_json_str(
        r#"{
            "layer_sizes": [2, 2],
            "activation": { "kind": "identity" },
            "weights": [[1.0, 0.0, 0.0, 2.0, 0.5, -1.0]]
        }"#,
    )?;
    assert_eq!(model.input_size(), 2);
    assert_eq!(model.predict(&[3.0, 5.0]), vec![3.5, 9.0]);
    Ok(())
}

#[test]
fn test_scaling_and_sigmoid() -> anyhow::Result<()> {
    let model = MlpModel {
        layer_sizes: vec![1, 1],
        activation: Activation::SigmoidSym { alpha: 1.0, beta: 1.0 },
        input_scale: Some(vec![Scale { scale: 2.0, shift: -4.0 }]),
        output_scale: Some(vec![Scale { scale: 10.0, shift: 1.0 }]),
        weights: vec![vec![1.0, 0.0]],
    };
    model.validate()?;
    // 2 * 2 - 4 = 0, sigmoid(0) = 0, 0 * 10 + 1 = 1
    let out = model.predict(&[2.0]);
    assert!((out[0] - 1.0).abs() < 1e-6);
    let high = model.predict(&[100.0]);
    assert!(high[0] > 10.0 && high[0] <= 11.0);
    Ok(())
}

#[test]
fn test_sigmoid_defaults() -> anyhow::Result<()> {
    let model = MlpModel::from_json_str(
        r#"{ "layer_sizes": [1, 1], "activation": { "kind": "sigmoid_sym" }, "weights": [[1.0, 0.0]] }"#,
    )?;
    assert_eq!(model.activation, Activation::SigmoidSym { alpha: 2.0 / 3.0, beta: 1.7159 });
    Ok(())
}

#[test]
fn test_malformed_models_are_rejected() {
    let wrong_matrix = r#"{ "layer_sizes": [2, 2], "activation": { "kind": "relu" }, "weights": [[1.0]] }"#;
    assert!(matches!(MlpModel::from_json_str(wrong_matrix), Err(ModelError::Invalid(_))));
    let one_layer = r#"{ "layer_sizes": [2], "activation": { "kind": "relu" }, "weights": [] }"#;
    assert!(matches!(MlpModel::from_json_str(one_layer), Err(ModelError::Invalid(_))));
    assert!(matches!(MlpModel::from_json_str("not json"), Err(ModelError::Deserialization(_))));
}

#[test]
fn test_missing_model_maps_to_load_sentinel() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let err = load_model(dir.path().join("model.json")).unwrap_err();
    assert!(matches!(err, PipelineError::ModelLoad { .. }));
    assert_eq!(err.sentinel(), "Error loading model");
}

#[test]
fn test_classify_with_loaded_model() -> anyhow::Result<()> {
    let file = write_temp(&model_json(324, 7), ".json");
    let model = load_model(file.path())?;
    let analysis = GarmentClassificationPipeline::new().classify(&garment_image(), &model)?;
    assert_eq!(analysis.category, Category::Sneaker);
    assert_eq!(analysis.bounds, Some(BoundingBox::new(60, 50, 80, 100)));
    Ok(())
}

#[test]
fn test_classify_draws_bounds() -> anyhow::Result<()> {
    let model = ScriptedModel::picking(324, 3);
    let analysis = GarmentClassificationPipeline::new().classify(&garment_image(), &model)?;
    assert_eq!(analysis.category, Category::Dress);
    assert_eq!(analysis.image.get_pixel(60, 100).0, [0, 255, 0, 255]);
    assert_eq!(analysis.image.get_pixel(100, 100).0, [30, 30, 90, 255]);
    Ok(())
}

#[test]
fn test_descriptor_mismatch_short_circuits() {
    let model = ScriptedModel::picking(100, 0);
    let err = GarmentClassificationPipeline::new()
        .classify(&garment_image(), &model)
        .err()
        .expect("mismatch expected");
    assert!(matches!(
        err,
        PipelineError::DescriptorSizeMismatch {
            descriptor: 324,
            model: 100
        }
    ));
    assert_eq!(err.sentinel(), "Error: HOG descriptor size mismatch");
}

#[test]
fn test_out_of_table_index_is_an_error() {
    let model = ScriptedModel {
        input: 324,
        scores: (0..12).map(|i| i as f32).collect(),
    };
    let err = GarmentClassificationPipeline::new()
        .predict(&garment_image(), &model)
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownCategory { index: 11 }));
}

#[test]
fn test_no_contour_still_returns_label() -> anyhow::Result<()> {
    let model = ScriptedModel::picking(324, 8);
    let blank = blank_image(64, 64);
    let analysis = GarmentClassificationPipeline::new().classify(&blank, &model)?;
    assert_eq!(analysis.category, Category::Bag);
    assert_eq!(analysis.bounds, None);
    assert_eq!(analysis.image, blank.to_rgba8());
    Ok(())
}

#[test]
fn test_predicted_category_always_in_table() -> anyhow::Result<()> {
    let pipeline = GarmentClassificationPipeline::new();
    for winner in 0..10 {
        let model = ScriptedModel::picking(324, winner);
        let category = pipeline.predict(&garment_image(), &model)?;
        assert_eq!(category.index(), winner);
    }
    Ok(())
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "feature vector length")]
fn test_mlp_rejects_wrong_feature_length() {
    let model = MlpModel::from_json_str(&model_json(4, 0)).expect("valid model");
    model.predict(&[1.0, 2.0]);
}
