use flightdelay::config::FeatureSet;
use flightdelay::data_handling::{FlightRecord, FlightType};
use flightdelay::error::FeatureError;
use flightdelay::preprocessing::{
    derive_labels, preprocess, preprocess_with_labels, FeatureSchema,
};

const TOP_TEN: [&str; 10] = [
    "OPERA_Latin American Wings",
    "MES_7",
    "MES_10",
    "OPERA_Grupo LATAM",
    "MES_12",
    "TIPOVUELO_I",
    "MES_4",
    "MES_11",
    "OPERA_Sky Airline",
    "OPERA_Copa Air",
];

fn full_record(airline: &str, scheduled: &str, actual: &str) -> FlightRecord {
    FlightRecord::new(airline, FlightType::Domestic, 1)
        .with_schedule(scheduled, actual)
        .with_calendar(1, "Domingo")
        .with_destination("Lima")
}

#[test]
fn test_top_ten_columns_are_pinned_regardless_of_input() {
    // None of these categories appear in the whitelist.
    let records = vec![
        FlightRecord::new("Aerolineas Argentinas", FlightType::Domestic, 3),
        FlightRecord::new("American Airlines", FlightType::Domestic, 5),
    ];
    let table = preprocess(&records, FeatureSchema::top_ten()).unwrap();

    assert_eq!(table.columns(), TOP_TEN.map(String::from).as_slice());
    assert_eq!(table.nrows(), 2);
    assert!(table.values().as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn test_grupo_latam_international_july() {
    let records = vec![FlightRecord::new("Grupo LATAM", FlightType::International, 7)];
    let table = preprocess(&records, FeatureSchema::top_ten()).unwrap();

    for column in TOP_TEN {
        let expected = match column {
            "OPERA_Grupo LATAM" | "TIPOVUELO_I" | "MES_7" => 1.0,
            _ => 0.0,
        };
        assert_eq!(table.get(0, column), Some(expected), "{column}");
    }
}

#[test]
fn test_preprocess_is_deterministic() {
    let records: Vec<FlightRecord> = (1..=12)
        .map(|month| {
            let mut record = full_record("Sky Airline", "2017-03-05 10:15:00", "2017-03-05 10:40:00");
            record.month = month;
            record
        })
        .collect();
    let schema = FeatureSchema::for_set(FeatureSet::Extended);
    let a = preprocess(&records, schema).unwrap();
    let b = preprocess(&records, schema).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.ncols(), schema.len());
}

#[test]
fn test_extended_schema_cyclical_values() {
    let records = vec![full_record("Copa Air", "2017-01-01 06:00:00", "2017-01-01 06:05:00")];
    let table = preprocess(&records, FeatureSchema::extended()).unwrap();

    // 06:00 is a quarter of the day.
    assert!((table.get(0, "MINUTO_sin").unwrap() - 1.0).abs() < 1e-6);
    assert!(table.get(0, "MINUTO_cos").unwrap().abs() < 1e-6);
    assert_eq!(table.get(0, "DIANOM_Domingo"), Some(1.0));
    assert_eq!(table.get(0, "DIANOM_Viernes"), Some(0.0));
    assert_eq!(table.get(0, "SIGLADES_Lima"), Some(1.0));
    assert_eq!(table.get(0, "OPERA_Copa Air"), Some(1.0));
}

#[test]
fn test_extended_schema_requires_full_records() {
    let records = vec![FlightRecord::new("Grupo LATAM", FlightType::International, 7)];
    let err = preprocess(&records, FeatureSchema::extended()).unwrap_err();
    assert!(matches!(err, FeatureError::MissingField { row: 0, .. }));
}

#[test]
fn test_month_out_of_range_is_rejected() {
    let records = vec![
        FlightRecord::new("Grupo LATAM", FlightType::International, 7),
        FlightRecord::new("Grupo LATAM", FlightType::International, 13),
    ];
    let err = preprocess(&records, FeatureSchema::top_ten()).unwrap_err();
    assert!(matches!(
        err,
        FeatureError::InvalidValue { row: 1, field: "MES", .. }
    ));
}

#[test]
fn test_labels_use_strict_fifteen_minute_threshold() {
    let records = vec![
        full_record("Grupo LATAM", "2017-01-01 10:00:00", "2017-01-01 10:15:00"),
        full_record("Grupo LATAM", "2017-01-01 10:00:00", "2017-01-01 10:15:01"),
        full_record("Grupo LATAM", "2017-01-01 10:00:00", "2017-01-01 09:40:00"),
        full_record("Grupo LATAM", "2017-01-01 23:50:00", "2017-01-02 00:30:00"),
    ];
    assert_eq!(derive_labels(&records).unwrap(), vec![0, 1, 0, 1]);
}

#[test]
fn test_labels_require_both_timestamps_in_exact_layout() {
    let bad_layout = vec![full_record("Grupo LATAM", "2017/01/01 10:00:00", "2017-01-01 10:30:00")];
    assert!(matches!(
        derive_labels(&bad_layout).unwrap_err(),
        FeatureError::Parse { row: 0, field: "Fecha-I", .. }
    ));

    let missing = vec![FlightRecord::new("Grupo LATAM", FlightType::International, 7)];
    assert!(matches!(
        derive_labels(&missing).unwrap_err(),
        FeatureError::MissingField { row: 0, field: "Fecha-I", .. }
    ));
}

#[test]
fn test_preprocess_with_labels_is_row_aligned() {
    let records = vec![
        full_record("Grupo LATAM", "2017-01-01 10:00:00", "2017-01-01 11:00:00"),
        full_record("Sky Airline", "2017-01-01 10:00:00", "2017-01-01 10:00:00"),
    ];
    let (table, labels) = preprocess_with_labels(&records, FeatureSchema::top_ten()).unwrap();
    assert_eq!(table.nrows(), labels.len());
    assert_eq!(labels, vec![1, 0]);
    assert_eq!(table.get(0, "OPERA_Grupo LATAM"), Some(1.0));
    assert_eq!(table.get(1, "OPERA_Sky Airline"), Some(1.0));
}
