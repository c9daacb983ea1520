#[path = "common/mod.rs"]
mod common;

use common::{full_credentials, CountingSource, FakeAuth};
use datalake_utils::{
    create_client_with, ClientOptions, ConfigSource, Credentials, DatalakeError, EnvFileSource, FileMode,
    MemoryFileSystem, StorageClient,
};
use std::io::{Read, Write};
use std::sync::Arc;

/// With all four credentials given explicitly, the config source is never consulted.
#[test]
fn explicit_credentials_skip_config_source() {
    let source = CountingSource::new(Credentials::default());
    let auth = FakeAuth::accepting("s3cret");
    let opts = ClientOptions::default()
        .with_store_name("store")
        .with_tenant_id("tenant")
        .with_client_id("client")
        .with_client_secret("s3cret");

    let client = create_client_with(&opts, &source, &auth).unwrap();

    assert_eq!(source.calls(), 0);
    assert_eq!(client.store_name(), "store");
    assert_eq!(auth.seen.lock().len(), 1);
}

/// Missing fields come from the source; explicit fields win over it.
#[test]
fn partial_credentials_merge_with_defaults() {
    let source = CountingSource::new(full_credentials());
    let auth = FakeAuth::accepting("secret");
    let opts = ClientOptions::default().with_store_name("override");

    let client = create_client_with(&opts, &source, &auth).unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(client.store_name(), "override");
    let seen = auth.seen.lock();
    assert_eq!(seen[0].tenant_id, "tenant");
    assert_eq!(seen[0].client_id, "client");
}

#[test]
fn social_preset_names_the_social_store() {
    let source = CountingSource::new(full_credentials());
    let auth = FakeAuth::accepting("secret");
    let client = create_client_with(&ClientOptions::social(), &source, &auth).unwrap();
    assert_eq!(client.store_name(), "sociallake");
    assert_eq!(ClientOptions::social().env_file.to_str(), Some("/social_datalake.env"));
}

#[test]
fn still_missing_credentials_are_a_configuration_error() {
    let source = CountingSource::new(Credentials { tenant_id: Some("t".into()), ..Default::default() });
    let auth = FakeAuth::accepting("secret");

    let err = create_client_with(&ClientOptions::default(), &source, &auth).unwrap_err();
    match err {
        DatalakeError::Configuration(msg) => {
            assert!(msg.contains("STORE_NAME"), "{msg}");
            assert!(msg.contains("CLIENT_SECRET"), "{msg}");
            assert!(!msg.contains("TENANT_ID"), "{msg}");
        }
        other => panic!("expected Configuration, got {other:?}"),
    }
    assert!(auth.seen.lock().is_empty(), "no authentication attempted");
}

/// Blank values count as missing.
#[test]
fn blank_values_are_treated_as_missing() {
    let source = CountingSource::new(full_credentials());
    let auth = FakeAuth::accepting("secret");
    let opts = ClientOptions::default().with_credentials(Credentials {
        store_name: Some("   ".into()),
        ..full_credentials()
    });

    let client = create_client_with(&opts, &source, &auth).unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(client.store_name(), "sociallake");
}

#[test]
fn rejected_authentication_is_a_configuration_error() {
    let source = CountingSource::new(Credentials::default());
    let auth = FakeAuth::accepting("right");
    let opts = ClientOptions::default().with_credentials(full_credentials());

    let err = create_client_with(&opts, &source, &auth).unwrap_err();
    assert!(matches!(err, DatalakeError::Configuration(_)), "got {err:?}");
}

/// The env file is parsed without touching the process environment.
#[test]
fn env_file_source_reads_key_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datalake.env");
    std::fs::write(
        &path,
        "# credentials\nDATALAKE_TEST_UNUSED=1\nSTORE_NAME=filestore\nTENANT_ID=file-tenant\nCLIENT_ID=file-client\nCLIENT_SECRET=\"file secret\"\n",
    )
    .unwrap();

    let creds = EnvFileSource::new(&path).load().unwrap();
    assert_eq!(creds.tenant_id.as_deref(), Some("file-tenant"));
    assert_eq!(creds.client_secret.as_deref(), Some("file secret"));
    assert!(std::env::var("DATALAKE_TEST_UNUSED").is_err());
}

#[test]
fn missing_env_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = EnvFileSource::new(dir.path().join("absent.env"));
    assert!(source.load().is_ok());
}

#[test]
fn file_modes_must_be_binary() {
    assert_eq!("rb".parse::<FileMode>().unwrap(), FileMode::Read);
    assert_eq!("wb".parse::<FileMode>().unwrap(), FileMode::Write);
    assert_eq!("ab".parse::<FileMode>().unwrap(), FileMode::Append);
    let err = "r".parse::<FileMode>().unwrap_err();
    assert!(matches!(err, DatalakeError::InvalidArgument(_)), "got {err:?}");

    let client = StorageClient::from_filesystem("mem", Arc::new(MemoryFileSystem::new()));
    assert!(matches!(client.open_mode("x.txt", "w"), Err(DatalakeError::InvalidArgument(_))));
}

/// Write, append, then read back through file handles.
#[test]
fn file_handles_write_append_read() {
    let fs = Arc::new(MemoryFileSystem::new());
    let client = StorageClient::from_filesystem("mem", fs.clone());

    let mut f = client.open_mode("path/on/datalake/remote_file.txt", "wb").unwrap();
    f.write_all(b"So incredibly").unwrap();
    f.close().unwrap();

    let mut f = client.open_append("path/on/datalake/remote_file.txt").unwrap();
    f.write_all(b" helpful").unwrap();
    drop(f);

    let mut text = String::new();
    client.open_read("path/on/datalake/remote_file.txt").unwrap().read_to_string(&mut text).unwrap();
    assert_eq!(text, "So incredibly helpful");

    // Re-opening for write truncates.
    let mut f = client.open_write("path/on/datalake/remote_file.txt").unwrap();
    f.write_all(b"fresh").unwrap();
    f.flush().unwrap();
    f.write_all(b" start").unwrap();
    f.close().unwrap();
    assert_eq!(fs.get("path/on/datalake/remote_file.txt").unwrap(), b"fresh start");

    assert_eq!(client.list("path/on/datalake").unwrap(), vec!["path/on/datalake/remote_file.txt"]);
}

#[test]
fn reading_a_missing_file_is_not_found() {
    let client = StorageClient::from_filesystem("mem", Arc::new(MemoryFileSystem::new()));
    assert!(matches!(client.open_read("nope.txt"), Err(DatalakeError::NotFound(_))));
}
