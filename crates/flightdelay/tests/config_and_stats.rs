use flightdelay::config::{ClassifierConfig, FeatureSet};
use flightdelay::stats::{roc_auc, ClassificationReport};

#[test]
fn test_partial_config_keeps_defaults() {
    let config: ClassifierConfig =
        serde_json::from_str(r#"{ "num_boost_round": 250, "max_depth": 4 }"#).unwrap();
    assert_eq!(config.num_boost_round, 250);
    assert_eq!(config.max_depth, 4);
    assert_eq!(config.learning_rate, 0.01);
    assert_eq!(config.seed, 1);
    assert_eq!(config.loss_type, "LogLikelyhood");
}

#[test]
fn test_feature_set_names() {
    assert_eq!("top-ten".parse::<FeatureSet>().unwrap(), FeatureSet::TopTen);
    assert_eq!("Extended".parse::<FeatureSet>().unwrap(), FeatureSet::Extended);
    assert!("everything".parse::<FeatureSet>().is_err());

    let json = serde_json::to_string(&FeatureSet::Extended).unwrap();
    assert_eq!(json, "\"extended\"");
    assert_eq!(FeatureSet::default(), FeatureSet::TopTen);
}

#[test]
fn test_report_on_perfect_predictions() {
    let y = [0, 0, 0, 1, 1];
    let report = ClassificationReport::compute(&y, &y);
    assert_eq!(report.accuracy, 1.0);
    assert_eq!(report.delayed.f1, 1.0);
    assert_eq!(report.on_time.support, 3);
    assert_eq!(roc_auc(&[0.1, 0.2, 0.3, 0.8, 0.9], &y), Some(1.0));
}
