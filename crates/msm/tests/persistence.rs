use std::fs;

use mdmsm_msm::{Method, Msm, MsmConfig, MsmError, SaveOptions};

fn toy_chain() -> Vec<Vec<usize>> {
    vec![
        vec![0, 1, 2, 3, 2, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 1],
        vec![3, 2, 2, 1, 0, 1, 2, 3, 3, 2],
    ]
}

fn fitted(method: Method) -> Msm {
    let config = MsmConfig::new(1).with_trim(true).with_method(method);
    let mut msm = Msm::new(config).unwrap();
    msm.fit(&toy_chain()).unwrap();
    msm
}

#[test]
fn round_trip_four_state_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let msm = fitted(Method::MaximumLikelihood);
    assert_eq!(msm.n_states(), Some(4));

    msm.save(&path, &SaveOptions::new()).unwrap();
    for name in [
        "manifest.json",
        "config.toml",
        "tcounts.mtx",
        "tprobs.mtx",
        "mapping.csv",
        "eq-probs.dat",
    ] {
        assert!(path.join(name).is_file(), "missing {name}");
    }

    let loaded = Msm::load(&path).unwrap();
    assert_eq!(loaded, msm);
    assert_eq!(loaded.tcounts(), msm.tcounts());
    assert_eq!(loaded.mapping(), msm.mapping());
}

#[test]
fn round_trip_every_method() {
    for method in Method::ALL {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(method.name());
        let msm = fitted(method);
        msm.save(&path, &SaveOptions::new()).unwrap();
        assert_eq!(Msm::load(&path).unwrap(), msm, "{method}");
    }
}

#[test]
fn unfit_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unfit");
    let msm = Msm::new(MsmConfig::new(3).with_sliding_window(false)).unwrap();
    msm.save(&path, &SaveOptions::new()).unwrap();
    assert!(!path.join("tcounts.mtx").exists());
    let loaded = Msm::load(&path).unwrap();
    assert!(!loaded.is_fit());
    assert_eq!(loaded, msm);
}

#[test]
fn custom_filenames_go_through_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let msm = fitted(Method::Transpose);
    let options = SaveOptions::new()
        .with_filename("tprobs", "probabilities.mtx")
        .with_filename("mapping", "states.csv");
    msm.save(&path, &options).unwrap();
    assert!(path.join("probabilities.mtx").is_file());
    assert!(!path.join("tprobs.mtx").exists());
    assert_eq!(Msm::load(&path).unwrap(), msm);
}

#[test]
fn existing_path_needs_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    fitted(Method::MaximumLikelihood)
        .save(&path, &SaveOptions::new())
        .unwrap();

    let other = fitted(Method::Transpose);
    let result = other.save(&path, &SaveOptions::new());
    assert!(matches!(result, Err(MsmError::AlreadyExists { .. })));
    assert_ne!(Msm::load(&path).unwrap(), other);

    other
        .save(&path, &SaveOptions::new().with_force(true))
        .unwrap();
    assert_eq!(Msm::load(&path).unwrap(), other);
}

#[test]
fn no_staging_directory_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    fitted(Method::MaximumLikelihood)
        .save(dir.path().join("model"), &SaveOptions::new())
        .unwrap();
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn archive_mode_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.zip");
    let result = fitted(Method::MaximumLikelihood)
        .save(&path, &SaveOptions::new().with_archive(true));
    assert!(matches!(result, Err(MsmError::Unsupported { .. })));
    assert!(!path.exists());
}

#[test]
fn load_rejects_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.zip");
    fs::write(&path, b"PK").unwrap();
    assert!(matches!(
        Msm::load(&path),
        Err(MsmError::NotADirectory { .. })
    ));
}

#[test]
fn load_rejects_partial_fit_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    fitted(Method::MaximumLikelihood)
        .save(&path, &SaveOptions::new())
        .unwrap();
    let manifest = r#"{ "config": "config.toml", "tcounts": "tcounts.mtx" }"#;
    fs::write(path.join("manifest.json"), manifest).unwrap();
    assert!(matches!(
        Msm::load(&path),
        Err(MsmError::InconsistentArtifacts { .. })
    ));
}

#[test]
fn load_with_renamed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model");
    let msm = fitted(Method::ReversibleMle);
    msm.save(&path, &SaveOptions::new()).unwrap();
    fs::rename(path.join("manifest.json"), path.join("index.json")).unwrap();
    assert!(Msm::load(&path).is_err());
    assert_eq!(Msm::load_with_manifest(&path, "index.json").unwrap(), msm);
}
