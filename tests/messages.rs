//! Config and general message round trips through the exchange folders.

use std::fs;

use edgelink::context::EdgeContext;
use edgelink::lb::{Config, General, Param, ParamId, ParamValue};

fn exchange_root() -> (tempfile::TempDir, EdgeContext) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("devinfo")).unwrap();
    fs::write(dir.path().join("devinfo/devnuid.txt"), "8861245090\n").unwrap();
    let context = EdgeContext::new(dir.path()).unwrap();
    (dir, context)
}

#[test]
fn config_round_trip_preserves_pairs_in_order() {
    let (dir, context) = exchange_root();

    let mut config = Config::new();
    config.push_param(Param::new("enabled", ParamValue::Bool(true)));
    config.push_param(Param::new("count", ParamValue::Int64(-7)));
    config.push_param(Param::new("gain", ParamValue::Float64(2.5)));
    config.push_param(Param::new("mode", ParamValue::Str("survey".to_string())));
    fs::write(dir.path().join("lb/cfg/session.json"), config.to_json()).unwrap();

    let imported = context.import_config("session.json").unwrap();
    assert_eq!(imported.params(), config.params());
}

#[test]
fn byte_array_round_trip_through_general_messages() {
    let (dir, mut context) = exchange_root();

    let mut message = General::new();
    message.set_payload(44u32, ParamValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    context.export_general(&message).unwrap();

    // Downlink the exported file back to the device side.
    fs::copy(
        dir.path().join("lb/do-msg/general_do_0.json"),
        dir.path().join("lb/dt-msg/reply.json"),
    )
    .unwrap();

    let imported = context.import_general("reply.json").unwrap();
    let param = imported.payload().unwrap();
    assert_eq!(param.id, Some(ParamId::Num(44)));
    assert_eq!(
        param.value,
        Some(ParamValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]))
    );
}

#[test]
fn import_all_config_counts_only_json_files() {
    let (dir, context) = exchange_root();
    let cfg_dir = dir.path().join("lb/cfg");

    for name in ["a.json", "b.json", "c.json"] {
        let mut config = Config::new();
        config.push_param(Param::new("file", ParamValue::Str(name.to_string())));
        fs::write(cfg_dir.join(name), config.to_json()).unwrap();
    }
    fs::write(cfg_dir.join("notes.txt"), "not a config").unwrap();
    fs::write(cfg_dir.join("blob.dat"), [0u8, 1, 2]).unwrap();

    let configs = context.import_all_config().unwrap();
    assert_eq!(configs.len(), 3);
    for config in &configs {
        assert_eq!(config.params().len(), 1);
        assert!(config.has_params());
    }
}

#[test]
fn import_all_general_reads_downlinked_messages() {
    let (dir, context) = exchange_root();
    let dt_dir = dir.path().join("lb/dt-msg");

    fs::write(
        dt_dir.join("msg_0.json"),
        "{\n\t\"identifier\":\"cmd\",\n\t\"value\":\"halt\"\n}",
    )
    .unwrap();
    fs::write(
        dt_dir.join("msg_1.json"),
        "{\n\t\"identifier\":12,\n\t\"value\":3.5\n}",
    )
    .unwrap();

    let messages = context.import_all_general().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0].payload().unwrap().value,
        Some(ParamValue::Str("halt".to_string()))
    );
    assert_eq!(
        messages[1].payload().unwrap().value,
        Some(ParamValue::Float64(3.5))
    );
}

#[test]
fn import_all_config_propagates_the_first_failure() {
    let (dir, context) = exchange_root();
    let cfg_dir = dir.path().join("lb/cfg");

    let mut config = Config::new();
    config.push_param(Param::new("ok", ParamValue::Bool(true)));
    fs::write(cfg_dir.join("good.json"), config.to_json()).unwrap();
    fs::write(cfg_dir.join("bad.json"), "{\"params\": [ truncated").unwrap();

    assert!(context.import_all_config().is_err());
}
