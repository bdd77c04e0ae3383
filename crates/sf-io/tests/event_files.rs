use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use approx::assert_relative_eq;
use arrow::array::{ArrayRef, Float32Array, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use sf_io::{
    DEFAULT_PT_KEY, DEFAULT_SCORE_KEY, EventIoError, EventReader, EventWriter, ProcessOptions,
    WEIGHT_COLUMNS, dataset_path, output_schema, process_dataset, process_file, write_parquet,
};
use sf_lookup::{InputRange, ScaleFactorLookup, WeightConvention, WeightOptions, compute_weights};

fn repo_root() -> PathBuf {
    // crates/sf-io -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn lookup() -> ScaleFactorLookup {
    ScaleFactorLookup::from_json_dir(&repo_root().join("tests/fixtures/jsons")).unwrap()
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("sf_io_{}_{}_{}", std::process::id(), nanos, name));
    std::fs::create_dir_all(&p).unwrap();
    p
}

const SCORES: [f64; 10] = [0.1, 0.85, 0.92, 0.97, 0.99, 0.5, 0.951, 0.8, 1.3, -0.2];
const PTS: [f32; 10] = [250.0, 310.0, 460.0, 500.0, 220.0, 150.0, 1200.0, 300.0, 280.0, 800.0];

fn event_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Int64, false),
        Field::new(DEFAULT_PT_KEY, DataType::Float32, false),
        Field::new(DEFAULT_SCORE_KEY, DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(0..SCORES.len() as i64)),
        Arc::new(Float32Array::from(PTS.to_vec())),
        Arc::new(Float64Array::from(SCORES.to_vec())),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

fn write_events(path: &Path) {
    write_parquet(path, &[event_batch()]).unwrap();
}

fn pts_f64() -> Vec<f64> {
    PTS.iter().map(|&p| p as f64).collect()
}

#[test]
fn reader_exposes_columns_and_slices() {
    let dir = tmp_dir("reader");
    let path = dir.join("events.parquet");
    write_events(&path);

    let reader = EventReader::open(&path).unwrap();
    assert_eq!(reader.num_entries(), 10);
    assert_eq!(reader.column_names(), vec!["run", DEFAULT_PT_KEY, DEFAULT_SCORE_KEY]);

    assert_eq!(reader.read_column(DEFAULT_SCORE_KEY, ..).unwrap(), SCORES.to_vec());
    assert_eq!(reader.read_column(DEFAULT_SCORE_KEY, 2..5).unwrap(), SCORES[2..5].to_vec());
    assert_eq!(reader.read_column("run", 8..).unwrap(), vec![8.0, 9.0]);
    assert_eq!(reader.read_column(DEFAULT_PT_KEY, 9..=20).unwrap(), vec![800.0]);
    assert!(reader.read_column("run", 12..15).unwrap().is_empty());

    match reader.read_column("nope", ..) {
        Err(EventIoError::MissingColumn(c)) => assert_eq!(c, "nope"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn null_values_read_as_nan() {
    let dir = tmp_dir("nulls");
    let path = dir.join("events.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0)])) as ArrayRef],
    )
    .unwrap();
    write_parquet(&path, &[batch]).unwrap();

    let values = EventReader::open(&path).unwrap().read_column("x", ..).unwrap();
    assert_eq!(values[0], 1.0);
    assert!(values[1].is_nan());
    assert_eq!(values[2], 3.0);
}

#[test]
fn weights_match_direct_computation() {
    let dir = tmp_dir("weights");
    let input = dir.join("in.parquet");
    let output = dir.join("out/out.parquet");
    write_events(&input);

    let lookup = lookup();
    let summary =
        process_file(&input, &output, Some(&lookup), &ProcessOptions::default()).unwrap();
    assert_eq!(summary.entries, 10);
    assert_eq!(summary.batches, 1);

    let expected =
        compute_weights(&lookup, &SCORES, &pts_f64(), &WeightOptions::default()).unwrap();
    let reader = EventReader::open(&output).unwrap();
    assert_eq!(reader.read_column("SF_TXbb", ..).unwrap(), expected.nominal);
    assert_eq!(reader.read_column("SF_TXbb_up", ..).unwrap(), expected.up);
    assert_eq!(reader.read_column("SF_TXbb_down", ..).unwrap(), expected.down);

    // score 0.97 -> WP4, pt 500 -> pt450to100000
    let sf = reader.read_column("SF_TXbb", 3..4).unwrap()[0];
    assert_relative_eq!(sf, 0.83, epsilon = 1e-12);
}

#[test]
fn input_columns_are_preserved() {
    let dir = tmp_dir("preserve");
    let input = dir.join("in.parquet");
    let output = dir.join("out.parquet");
    write_events(&input);

    process_file(&input, &output, Some(&lookup()), &ProcessOptions::default()).unwrap();

    let reader = EventReader::open(&output).unwrap();
    assert_eq!(
        reader.column_names(),
        vec!["run", DEFAULT_PT_KEY, DEFAULT_SCORE_KEY, "SF_TXbb", "SF_TXbb_up", "SF_TXbb_down"]
    );
    assert_eq!(reader.schema().field(1).data_type(), &DataType::Float32);
    assert_eq!(reader.read_column(DEFAULT_SCORE_KEY, ..).unwrap(), SCORES.to_vec());
    assert_eq!(reader.read_column(DEFAULT_PT_KEY, ..).unwrap(), pts_f64());
    let runs: Vec<f64> = (0..10).map(|i| i as f64).collect();
    assert_eq!(reader.read_column("run", ..).unwrap(), runs);
}

#[test]
fn chunked_and_whole_file_outputs_agree() {
    let dir = tmp_dir("chunks");
    let input = dir.join("in.parquet");
    write_events(&input);
    let lookup = lookup();

    let whole = dir.join("whole.parquet");
    let chunked = dir.join("chunked.parquet");
    let options = ProcessOptions {
        weights: WeightOptions {
            score_range: Some(InputRange::new(0.0, 1.0)),
            pt_range: Some(InputRange::new(200.0, 1000.0)),
            convention: WeightConvention::Stacked,
        },
        ..Default::default()
    };
    let a = process_file(&input, &whole, Some(&lookup), &options).unwrap();
    let b = process_file(
        &input,
        &chunked,
        Some(&lookup),
        &ProcessOptions { chunk_size: Some(3), ..options.clone() },
    )
    .unwrap();
    assert_eq!(a.entries, b.entries);
    assert_eq!(a.batches, 1);
    assert_eq!(b.batches, 4);

    let whole = EventReader::open(&whole).unwrap();
    let chunked = EventReader::open(&chunked).unwrap();
    for col in WEIGHT_COLUMNS {
        assert_eq!(whole.read_column(col, ..).unwrap(), chunked.read_column(col, ..).unwrap());
    }

    // score 1.3, score -0.2, pt 150 and pt 1200 fall outside the ranges
    let sf = whole.read_column("SF_TXbb", ..).unwrap();
    for i in [5, 6, 8, 9] {
        assert_eq!(sf[i], 1.0, "event {i}");
    }
}

#[test]
fn data_mode_needs_no_tagger_columns() {
    let dir = tmp_dir("data");
    let input = dir.join("in.parquet");
    let output = dir.join("out.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new("run", DataType::Int64, false)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from(vec![1, 2, 3, 4])) as ArrayRef],
    )
    .unwrap();
    write_parquet(&input, &[batch]).unwrap();

    let options = ProcessOptions { is_data: true, chunk_size: Some(3), ..Default::default() };
    let summary = process_file(&input, &output, None, &options).unwrap();
    assert_eq!(summary.entries, 4);

    let reader = EventReader::open(&output).unwrap();
    for col in WEIGHT_COLUMNS {
        assert_eq!(reader.read_column(col, ..).unwrap(), vec![1.0; 4]);
    }
}

#[test]
fn missing_column_leaves_no_output() {
    let dir = tmp_dir("missing");
    let input = dir.join("in.parquet");
    let output = dir.join("out.parquet");
    write_events(&input);

    let options = ProcessOptions { score_key: "fj_1_score".into(), ..Default::default() };
    match process_file(&input, &output, Some(&lookup()), &options) {
        Err(EventIoError::MissingColumn(c)) => assert_eq!(c, "fj_1_score"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
    assert!(!output.exists());
    assert!(!dir.join("out.parquet.partial").exists());

    // simulation without a table
    let err = process_file(&input, &output, None, &ProcessOptions::default()).unwrap_err();
    assert!(matches!(err, EventIoError::NoLookup), "got {err:?}");
}

#[test]
fn existing_weight_column_is_replaced() {
    let dir = tmp_dir("replace");
    let input = dir.join("in.parquet");
    let output = dir.join("out.parquet");

    let base = event_batch();
    let mut fields: Vec<Field> =
        base.schema().fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.insert(1, Field::new("SF_TXbb", DataType::Float32, true));
    let mut columns = base.columns().to_vec();
    columns.insert(1, Arc::new(Float32Array::from(vec![-7.0f32; 10])) as ArrayRef);
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();
    write_parquet(&input, &[batch]).unwrap();

    process_file(&input, &output, Some(&lookup()), &ProcessOptions::default()).unwrap();

    let reader = EventReader::open(&output).unwrap();
    assert_eq!(reader.column_names()[1], "SF_TXbb");
    assert_eq!(reader.column_names().len(), 6);
    assert_eq!(reader.schema().field(1).data_type(), &DataType::Float64);
    let sf = reader.read_column("SF_TXbb", ..).unwrap();
    assert!(sf.iter().all(|&v| v > 0.0));
}

#[test]
fn dropped_writer_discards_partial_file() {
    let dir = tmp_dir("drop");
    let path = dir.join("out.parquet");
    let batch = event_batch();
    {
        let mut writer = EventWriter::create(&path, output_schema(&batch.schema())).unwrap();
        assert!(dir.join("out.parquet.partial").exists());
        assert_eq!(writer.rows(), 0);
        // schema lacks the weight columns
        assert!(matches!(writer.write_batch(&batch), Err(EventIoError::SchemaMismatch(_))));
    }
    assert!(!path.exists());
    assert!(!dir.join("out.parquet.partial").exists());
}

#[test]
fn datasets_map_to_file_names() {
    let input_dir = tmp_dir("ds_in");
    let output_dir = tmp_dir("ds_out").join("nested");
    write_events(&dataset_path(&input_dir, "ggF"));

    let lookup = lookup();
    let options = ProcessOptions::default();
    let summary =
        process_dataset(&input_dir, &output_dir, "ggF", Some(&lookup), &options).unwrap();
    assert_eq!(summary.entries, 10);
    assert!(output_dir.join("ggF.parquet").exists());

    let err =
        process_dataset(&input_dir, &output_dir, "VBF", Some(&lookup), &options).unwrap_err();
    assert!(matches!(err, EventIoError::Io(_)), "got {err:?}");
    assert!(!output_dir.join("VBF.parquet").exists());
}

#[test]
fn null_tagger_values_get_no_correction_when_ranges_are_set() {
    let dir = tmp_dir("null_pt");
    let input = dir.join("in.parquet");
    let output = dir.join("out.parquet");
    let schema = Arc::new(Schema::new(vec![
        Field::new(DEFAULT_PT_KEY, DataType::Float64, true),
        Field::new(DEFAULT_SCORE_KEY, DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![None, Some(500.0), Some(500.0)])) as ArrayRef,
            Arc::new(Float64Array::from(vec![Some(0.97), None, Some(0.97)])),
        ],
    )
    .unwrap();
    write_parquet(&input, &[batch]).unwrap();

    let options = ProcessOptions {
        weights: WeightOptions {
            score_range: Some(InputRange::new(0.0, 1.0)),
            pt_range: Some(InputRange::new(200.0, 1000.0)),
            convention: WeightConvention::Delta,
        },
        ..Default::default()
    };
    process_file(&input, &output, Some(&lookup()), &options).unwrap();

    let reader = EventReader::open(&output).unwrap();
    let sf = reader.read_column("SF_TXbb", ..).unwrap();
    assert_eq!(&sf[..2], &[1.0, 1.0]);
    assert_relative_eq!(sf[2], 0.83, epsilon = 1e-12);
    assert_eq!(&reader.read_column("SF_TXbb_up", ..).unwrap()[..2], &[1.0, 1.0]);
    assert_eq!(&reader.read_column("SF_TXbb_down", ..).unwrap()[..2], &[1.0, 1.0]);
}
