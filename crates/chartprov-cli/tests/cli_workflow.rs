//! Sign, verify and inspect through the subcommand handlers.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use chartprov_cli::config::CliContext;
use chartprov_cli::inspect::inspect_text;
use chartprov_cli::signing::{run_sign, SignArgs};
use chartprov_cli::verify::{run_verify, VerifyArgs};
use chartprov_crypto::sum_archive;

fn write_archive(path: &Path) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let chart = "apiVersion: v2\nname: hello\nversion: 0.1.0\ndescription: A greeting\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(chart.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "hello/Chart.yaml", chart.as_bytes())
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

/// A home directory whose default keyring is a GnuPG secret key export and
/// whose config file selects one of its identities.
fn home_with_keyring(dir: &Path) -> PathBuf {
    let home = dir.join("home");
    std::fs::create_dir(&home).unwrap();
    std::fs::copy(data("secring.gpg"), home.join("keyring.gpg")).unwrap();
    std::fs::write(home.join("config.yaml"), "key: Chart Signer\n").unwrap();
    home
}

fn sign_args(archive: &Path) -> SignArgs {
    SignArgs {
        archive: archive.to_path_buf(),
        key: None,
        key_file: None,
        keyring: None,
        passphrase_file: None,
        output: None,
    }
}

fn verify_args(archive: &Path, json: bool) -> VerifyArgs {
    VerifyArgs {
        archive: archive.to_path_buf(),
        prov: None,
        keyring: None,
        json,
    }
}

#[test]
fn sign_then_verify_with_home_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CliContext::load(home_with_keyring(dir.path()), None).unwrap();
    let archive = dir.path().join("hello-0.1.0.tgz");
    write_archive(&archive);

    assert_eq!(run_sign(&sign_args(&archive), &ctx).unwrap(), 0);
    let prov = dir.path().join("hello-0.1.0.tgz.prov");
    assert!(prov.is_file());

    assert_eq!(run_verify(&verify_args(&archive, false), &ctx).unwrap(), 0);
    assert_eq!(run_verify(&verify_args(&archive, true), &ctx).unwrap(), 0);
}

#[test]
fn inspect_reports_signed_contents() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CliContext::load(home_with_keyring(dir.path()), None).unwrap();
    let archive = dir.path().join("hello-0.1.0.tgz");
    write_archive(&archive);
    run_sign(&sign_args(&archive), &ctx).unwrap();

    let text = std::fs::read_to_string(dir.path().join("hello-0.1.0.tgz.prov")).unwrap();
    let inspection = inspect_text(&text).unwrap();
    assert_eq!(inspection.metadata.name, "hello");
    assert_eq!(inspection.metadata.description, "A greeting");
    assert_eq!(
        inspection.sums.files.get("hello-0.1.0.tgz"),
        Some(&sum_archive(&archive).unwrap().to_string())
    );
    assert_eq!(inspection.signature.hash, "SHA512");
    assert_eq!(inspection.signature.key_id.len(), 16);
}

#[test]
fn verify_after_tampering_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CliContext::load(home_with_keyring(dir.path()), None).unwrap();
    let archive = dir.path().join("hello-0.1.0.tgz");
    write_archive(&archive);
    run_sign(&sign_args(&archive), &ctx).unwrap();

    let mut bytes = std::fs::read(&archive).unwrap();
    bytes.push(0);
    std::fs::write(&archive, bytes).unwrap();

    let err = run_verify(&verify_args(&archive, false), &ctx).unwrap_err();
    assert!(format!("{err:#}").contains("sha256 sum does not match"));
    assert_eq!(run_verify(&verify_args(&archive, true), &ctx).unwrap(), 1);
}

#[test]
fn explicit_output_and_unknown_key_name() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CliContext::load(home_with_keyring(dir.path()), None).unwrap();
    let archive = dir.path().join("hello-0.1.0.tgz");
    write_archive(&archive);

    let out = dir.path().join("custom.prov");
    let mut args = sign_args(&archive);
    args.output = Some(out.clone());
    run_sign(&args, &ctx).unwrap();
    assert!(out.is_file());

    let mut args = sign_args(&archive);
    args.key = Some("nobody".to_string());
    let err = run_sign(&args, &ctx).unwrap_err();
    assert!(err.to_string().contains("nobody"));
}

#[test]
fn verify_gpg_signed_archive_against_public_keyring() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = CliContext::load(dir.path().to_path_buf(), None).unwrap();
    let archive = dir.path().join("hello-0.1.0.tgz");
    std::fs::copy(data("hello-0.1.0.tgz"), &archive).unwrap();
    std::fs::copy(data("hello-0.1.0.tgz.prov"), dir.path().join("hello-0.1.0.tgz.prov")).unwrap();

    let mut args = verify_args(&archive, true);
    args.keyring = Some(data("pubring.gpg"));
    assert_eq!(run_verify(&args, &ctx).unwrap(), 0);
}
