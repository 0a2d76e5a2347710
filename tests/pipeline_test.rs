//! End-to-end tests: CSV tables through features, labels and training monitors.

use std::fs;
use tempfile::tempdir;
use zonetrack::core::geo::{ZONE_X_MAX, ZONE_X_MIN, ZONE_Y_MAX};
use zonetrack::data::{read_data, read_records, write_labeled, Mode};
use zonetrack::training::metrics::f1_score;
use zonetrack::{
    extract, fit, make_label, summarize, AccuracyStopper, EpochLogs, F1Stopper, Predictor,
    Trainable, ValidationSet,
};

const TRAIN: &str = "\
,hash,trajectory_id,time_entry,time_exit,vmax,vmin,vmean,x_entry,y_entry,x_exit,y_exit,tid_0
0,d1,t1,08:00:00,08:10:00,,,,3740000.0,-19238905.6133,3745000.0,-19238905.6133,a
1,d2,t2,09:00:00,09:00:00,,,,3760901.5068,-19238905.6133,3761000.0,-19238000.0,b
2,d3,t3,10:00:00,10:05:00,,,,3780000.0,-19200000.0,3775000.0,-19205000.0,c
";

const LAST: &str = "\
hash,time_entry,time_exit,x_entry,y_entry,x_exit,y_exit
d1,15:00:00,15:05:00,3745000.0,-19238905.6133,3755000.0,-19238905.6133
d2,15:00:00,15:05:00,3761000.0,-19238000.0,3790000.0,-19238000.0
d3,15:00:00,15:05:00,3775000.0,-19205000.0,3770901.5068,-19208905.6133
";

#[test]
fn test_load_extract_label_write() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data_train.csv"), TRAIN).unwrap();

    let records = read_data(dir.path(), Mode::Train).unwrap();
    let rows = extract(&records, false).unwrap();
    assert_eq!(rows.len(), 3);

    // west of the zone, y aligned
    assert_eq!(rows[0].entry_inside, 0);
    assert!((rows[0].distance_2 - (ZONE_X_MIN - 3740000.0)).abs() < 1e-6);
    let trip = rows[0].trip.unwrap();
    assert!((trip.travelled_dist - 5000.0).abs() < 1e-6);
    assert!((trip.vmean.unwrap() - 5000.0 / 600.0).abs() < 1e-9);

    // exactly at the centroid, zero elapsed time
    assert_eq!(rows[1].entry_inside, 1);
    assert_eq!(rows[1].distance_from_center, 0.0);
    assert_eq!(rows[1].distance_2, 0.0);
    assert_eq!(rows[1].bearing_center, 0.0);
    assert_eq!(rows[1].trip.unwrap().vmean, Some(0.0));

    // north-east corner region
    assert_eq!(rows[2].entry_inside, 0);
    let corner = ((3780000.0 - ZONE_X_MAX).powi(2) + (-19200000.0 - ZONE_Y_MAX).powi(2)).sqrt();
    assert!((rows[2].distance_2 - corner).abs() < 1e-6);
    assert!(rows[2].distance_2 <= rows[2].distance_from_center);

    for row in &rows {
        let trip = row.trip.unwrap();
        assert!((0.0..360.0).contains(&row.bearing_center));
        assert!((0.0..360.0).contains(&trip.bearing));
        assert!((-180.0..=180.0).contains(&trip.bearing_diff));
    }

    let last = read_records(LAST.as_bytes()).unwrap();
    let (labeled, labels) = make_label(rows, &last).unwrap();
    assert_eq!(labels, vec![1, 0, 1]);

    let out_path = dir.path().join("labeled.csv");
    write_labeled(fs::File::create(&out_path).unwrap(), &labeled).unwrap();
    let text = fs::read_to_string(&out_path).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("hash,trajectory_id,time_entry,time_exit,vmax,vmin,x_entry"));
    assert!(header.ends_with("vmean,travelled-dist,train_label"));
    assert!(!header.contains("tid_0"));
    assert_eq!(text.lines().count(), 4);

    let summary = summarize(&labeled.iter().map(|l| l.features.clone()).collect::<Vec<_>>());
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.entries_inside, 1);
}

#[test]
fn test_single_mode_on_prediction_rows() {
    let csv = "\
hash,time_entry,time_exit,x_entry,y_entry,x_exit,y_exit
p1,15:00:00,15:20:00,3760000.0,-19250000.0,,
";
    let records = read_records(csv.as_bytes()).unwrap();
    assert!(extract(&records, false).is_err());

    let rows = extract(&records, true).unwrap();
    assert_eq!(rows[0].entry_inside, 1);
    assert_eq!(rows[0].total_time, Some(1200.0));
    assert!(rows[0].trip.is_none());
}

/// Model whose predictions improve each epoch by revealing one more label.
struct RevealingModel {
    labels: Vec<u8>,
    revealed: usize,
}

impl Predictor for RevealingModel {
    fn predict(&self, features: &[Vec<f64>]) -> Vec<f64> {
        features
            .iter()
            .enumerate()
            .map(|(i, _)| {
                if i < self.revealed {
                    f64::from(self.labels[i])
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Trainable for RevealingModel {
    fn train_epoch(&mut self, _epoch: usize) -> EpochLogs {
        self.revealed += 1;
        EpochLogs::new().with("acc", 0.5)
    }
}

#[test]
fn test_f1_stopper_drives_training_loop() {
    let labels: Vec<u8> = vec![1; 10];
    let features = labels.iter().map(|&l| vec![f64::from(l)]).collect();
    let validation = ValidationSet::new(features, labels.clone()).unwrap();

    let mut model = RevealingModel {
        labels: labels.clone(),
        revealed: 0,
    };
    let mut f1_stopper = F1Stopper::new(validation);
    let mut acc_stopper = AccuracyStopper::new();

    let summary = fit(&mut model, 20, &mut [&mut f1_stopper, &mut acc_stopper]).unwrap();

    // recall after epoch k is k/10 with perfect precision; F1 = 2k/(10+k)
    // first k with F1 >= 0.892 is k = 9 (0.947); k = 8 gives 0.888
    assert!(summary.stopped_early);
    assert_eq!(summary.epochs_run, 9);

    let history = f1_stopper.history();
    assert_eq!(history.len(), 9);
    for (epoch, f1) in history.f1s.iter().enumerate() {
        let p = history.precisions[epoch];
        let r = history.recalls[epoch];
        let harmonic = if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) };
        assert!((f1 - harmonic).abs() < 1e-12);
        assert_eq!(*f1 >= 0.892, epoch == 8);
    }

    let final_predictions: Vec<u8> = vec![1; 9].into_iter().chain([0]).collect();
    assert!((history.f1s[8] - f1_score(&labels, &final_predictions)).abs() < 1e-12);
}
