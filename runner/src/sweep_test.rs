use crate::{
    config::{ExecutorConfig, Scalar, SweepConfig},
    executors::{Executors, Submission},
    job::{self, INPUT_FILE, SCRIPT_FILE},
    sweep::{combinations, run, Combination},
};
use serde_json::{json, Value};
use std::{collections::BTreeSet, fs, path::Path};

const SWEEP: &str = "
parameters:
  num_nodes: [600, 800]
  time_step: [0.1, 0.05, 0.02]
  x_max: [500, 750]
  lmax: [30, 40]
executor:
  name: dry-run
";

fn template() -> Value {
    json!({
        "basis": {
            "order": 7,
            "node_sequence": "linear_parabolic",
            "num_nodes": 100,
            "x_min": 0.0,
            "x_max": 100.0,
            "lmax": 10,
            "mmax": 0
        },
        "time_step": 0.1,
        "laser": { "frequency": 0.057, "cycles": 10 }
    })
}

fn setup(root: &Path) -> SweepConfig {
    fs::write(root.join("base_input.json"), template().to_string()).unwrap();
    fs::write(root.join("yukawa.h5"), b"\x89HDF\r\n").unwrap();

    let mut config = SweepConfig::from_yaml(SWEEP).unwrap();
    config.working_directory = root.to_path_buf();
    config
}

fn names(combinations: &[Combination]) -> Vec<String> {
    combinations
        .iter()
        .map(|combination| {
            combination
                .directory
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
pub fn product_has_one_unique_directory_per_combination() {
    let config = setup(tempfile::tempdir().unwrap().path());
    let combinations = combinations(&config);

    assert_eq!(combinations.len(), 2 * 3 * 2 * 2);
    let unique: BTreeSet<_> = names(&combinations).into_iter().collect();
    assert_eq!(unique.len(), combinations.len());
}

#[test]
pub fn product_iterates_radius_outermost_and_grid_innermost() {
    let config = setup(tempfile::tempdir().unwrap().path());
    let names = names(&combinations(&config));

    assert_eq!(names[0], "n_600_dt_0.1_bs_500_l_30");
    assert_eq!(names[1], "n_800_dt_0.1_bs_500_l_30");
    assert_eq!(names[2], "n_600_dt_0.05_bs_500_l_30");
    assert_eq!(names[6], "n_600_dt_0.1_bs_500_l_40");
    assert_eq!(names[12], "n_600_dt_0.1_bs_750_l_30");
    assert_eq!(names[23], "n_800_dt_0.02_bs_750_l_40");
}

#[test]
pub fn alternate_reverses_order_only() {
    let mut config = setup(tempfile::tempdir().unwrap().path());
    let forward = combinations(&config);
    config.alternate = true;
    let backward = combinations(&config);

    let mut reversed = names(&backward);
    reversed.reverse();
    assert_eq!(names(&forward), reversed);

    // indices follow submission order
    assert!(backward
        .iter()
        .enumerate()
        .all(|(index, combination)| combination.index == index));
    assert_eq!(backward[0].num_nodes, forward[23].num_nodes);
    assert_eq!(backward[0].job_name("Ar_conv_ip"), "Ar_conv_ip_0.000");
}

#[test]
pub fn run_materializes_every_job() {
    let root = tempfile::tempdir().unwrap();
    let config = setup(root.path());
    let mut executor = Executors::load(&config.executor);

    let submitted = run(&config, &mut executor).unwrap();
    assert_eq!(submitted.len(), 24);
    assert!(submitted
        .iter()
        .all(|submitted| submitted.submission == Submission::Skipped));

    let template = template();
    for submitted in submitted.iter() {
        let combination = &submitted.combination;
        let directory = &combination.directory;

        let document: Value =
            serde_json::from_str(&fs::read_to_string(directory.join(INPUT_FILE)).unwrap())
                .unwrap();
        assert_eq!(document["time_step"], Value::from(combination.time_step));
        assert_eq!(document["basis"]["num_nodes"], json!(combination.num_nodes));
        assert_eq!(document["basis"]["x_max"], Value::from(combination.x_max));
        assert_eq!(document["basis"]["lmax"], json!(combination.lmax));
        assert_eq!(document["laser"], template["laser"]);
        assert_eq!(document["basis"]["mmax"], template["basis"]["mmax"]);

        assert_eq!(
            fs::read(directory.join("yukawa.h5")).unwrap(),
            b"\x89HDF\r\n"
        );

        let script = fs::read_to_string(directory.join(SCRIPT_FILE)).unwrap();
        assert!(script.starts_with("#!/usr/bin/bash\n"));
        assert!(script.contains(&format!(
            "#SBATCH --job-name Ar_conv_ip_{}.000\n",
            combination.index
        )));
        assert!(script.contains("#SBATCH --partition=jila\n"));
    }
}

#[test]
pub fn run_with_alternate_keeps_directory_contents() {
    let forward_root = tempfile::tempdir().unwrap();
    let backward_root = tempfile::tempdir().unwrap();
    let forward = setup(forward_root.path());
    let mut backward = setup(backward_root.path());
    backward.alternate = true;

    run(&forward, &mut Executors::load(&forward.executor)).unwrap();
    run(&backward, &mut Executors::load(&backward.executor)).unwrap();

    for combination in combinations(&forward) {
        let name = combination.directory.file_name().unwrap();
        assert_eq!(
            fs::read_to_string(forward_root.path().join(name).join(INPUT_FILE)).unwrap(),
            fs::read_to_string(backward_root.path().join(name).join(INPUT_FILE)).unwrap()
        );
    }

    let script = fs::read_to_string(
        backward_root
            .path()
            .join("n_800_dt_0.02_bs_750_l_40")
            .join(SCRIPT_FILE),
    )
    .unwrap();
    assert!(script.contains("#SBATCH --job-name Ar_conv_ip_0.000\n"));
    assert!(script.contains("#SBATCH --partition=compute --qos=normal\n"));
}

#[test]
pub fn rerun_replaces_stale_directories() {
    let root = tempfile::tempdir().unwrap();
    let mut config = setup(root.path());
    config.parameters.num_nodes = vec![600];
    config.parameters.time_step = vec![Scalar::Real(0.1)];
    config.parameters.x_max = vec![Scalar::Integer(500)];
    config.parameters.lmax = vec![30];

    let directory = root.path().join("n_600_dt_0.1_bs_500_l_30");
    fs::create_dir(&directory).unwrap();
    fs::write(directory.join("stale.txt"), "left over").unwrap();
    fs::write(directory.join("results.log"), "old run").unwrap();

    run(&config, &mut Executors::load(&config.executor)).unwrap();

    assert!(!directory.join("stale.txt").exists());
    assert!(!directory.join("results.log").exists());
    assert!(directory.join(INPUT_FILE).is_file());
}

#[test]
pub fn removing_missing_path_is_not_an_error() {
    let root = tempfile::tempdir().unwrap();

    assert!(job::remove_existing(&root.path().join("does_not_exist")).is_ok());

    let file = root.path().join("plain_file");
    fs::write(&file, "x").unwrap();
    job::remove_existing(&file).unwrap();
    assert!(!file.exists());
}

#[test]
pub fn missing_data_file_aborts_the_sweep() {
    let root = tempfile::tempdir().unwrap();
    let config = setup(root.path());
    fs::remove_file(root.path().join("yukawa.h5")).unwrap();

    assert!(run(&config, &mut Executors::load(&ExecutorConfig::DryRun)).is_err());
    // the first directory was started and is left behind
    assert!(root.path().join("n_600_dt_0.1_bs_500_l_30").is_dir());
}
